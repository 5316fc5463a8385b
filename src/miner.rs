//! The search engine: setup, seeding, recursion, pruning, reporting.
//!
//! The miner owns the database and drives a depth-first enumeration of
//! canonical-form-restricted extensions. Children of a fragment are
//! collected in a signature-sorted array (merging the embeddings of equal
//! candidates), run through the pruning pipeline, and recursed into in
//! code-word order; fragments are reported post-order, so every descendant
//! precedes its ancestor in the output.

use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};
use std::sync::Arc;

use indexmap::IndexSet;
use tracing::{debug, info, warn};

use crate::canon::{self, form_for, Canonicity, ExtOpts};
use crate::config::{Config, Mode};
use crate::db::Database;
use crate::embed::{contains, embed, Embedding};
use crate::error::{ConfigError, Error};
use crate::fragment::{cmp_by_word, FragFlags, Fragment};
use crate::graph::Graph;
use crate::index::ExtensionIndex;
use crate::repo::Repository;
use crate::report::{describe, FragmentReport, Reporter};
use crate::support::{self, SupportKind};
use crate::types::{base, Recoder, TypeRegistry};

/// Search statistics, returned by [`Miner::mine`].
#[derive(Clone, Copy, Debug, Default)]
pub struct Stats {
    /// Fragments created (including pruned ones).
    pub fragments: usize,
    /// Embeddings created.
    pub embeddings: usize,
    /// Fragments reported.
    pub reported: usize,
    pub pruned_support: usize,
    pub pruned_chain: usize,
    pub pruned_unclosable: usize,
    pub pruned_perfect: usize,
    pub pruned_equiv: usize,
    pub pruned_ring_order: usize,
    pub pruned_canonic: usize,
    pub pruned_duplicate: usize,
    /// Whether the search was canceled before completion.
    pub aborted: bool,
}

/// The substructure miner.
pub struct Miner {
    config: Config,
    db: Database,
    node_names: Option<TypeRegistry>,
    edge_names: Option<TypeRegistry>,
    recoder: Option<Recoder>,
    index: Option<ExtensionIndex>,
    repo: Option<Repository>,
    /// Excluded node types, by recoded base code; grows as seeds finish.
    excluded: Vec<bool>,
    /// Recoded chain `(node, edge)` base types.
    chain: (u32, u32),
    s_min: usize,
    focus_size: usize,
    compl_size: usize,
    stop: Arc<AtomicBool>,
    stats: Stats,
    next_id: usize,
}

impl Miner {
    /// Create a miner; the configuration is validated up front.
    pub fn new(mut config: Config) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Miner {
            config,
            db: Database::new(),
            node_names: None,
            edge_names: None,
            recoder: None,
            index: None,
            repo: None,
            excluded: Vec::new(),
            chain: (u32::MAX, u32::MAX),
            s_min: 1,
            focus_size: 0,
            compl_size: 0,
            stop: Arc::new(AtomicBool::new(false)),
            stats: Stats::default(),
            next_id: 0,
        })
    }

    /// Register type registries used to resolve names in reports.
    pub fn set_registries(&mut self, nodes: TypeRegistry, edges: TypeRegistry) {
        self.node_names = Some(nodes);
        self.edge_names = Some(edges);
    }

    /// Add a host graph; the threshold on `value` decides its group.
    pub fn add_graph(&mut self, name: impl Into<String>, value: f64, graph: Graph) {
        self.db.add(
            name.into(),
            value,
            self.config.threshold,
            self.config.invert,
            graph,
        );
    }

    /// The cooperative stop flag; set it from another thread to abort.
    pub fn stop_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop)
    }

    #[inline]
    fn stopped(&self) -> bool {
        self.stop.load(AtomicOrdering::Relaxed)
    }

    /// The database (after mining: with recoded types).
    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Run the search, reporting fragments through `reporter`.
    ///
    /// On cancellation the partial statistics are returned with
    /// `aborted = true`; IO failures of the reporter are fatal.
    pub fn mine(&mut self, reporter: &mut dyn Reporter) -> Result<Stats, Error> {
        self.setup()?;
        match self.run_seeds(reporter) {
            Ok(()) => {}
            Err(Error::Canceled) => {
                self.stats.aborted = true;
                info!("search canceled");
            }
            Err(e) => return Err(e),
        }
        let s = &self.stats;
        info!(
            fragments = s.fragments,
            embeddings = s.embeddings,
            reported = s.reported,
            support = s.pruned_support,
            canonic = s.pruned_canonic,
            duplicate = s.pruned_duplicate,
            perfect = s.pruned_perfect,
            equivalent = s.pruned_equiv,
            "search finished"
        );
        Ok(self.stats)
    }

    fn setup(&mut self) -> Result<(), Error> {
        self.focus_size = self.db.group_size(crate::embed::Group::Focus);
        self.compl_size = self.db.group_size(crate::embed::Group::Compl);
        self.s_min = self.config.abs_s_min(self.focus_size);
        if self.s_min > self.focus_size {
            return Err(ConfigError::UnreachableSupport {
                s_min: self.s_min,
                focus: self.focus_size,
            }
            .into());
        }

        let mode = self.config.mode;
        let (rgmin, rgmax) = (self.config.rgmin, self.config.rgmax);
        let needs_bridges = self.config.needs_bridges();
        let pseudo = mode.contains(Mode::RING)
            && mode.contains(Mode::PR_CANONIC)
            && mode.contains(Mode::CLOSERINGS);
        for (gid, entry) in self.db.iter_mut().enumerate() {
            let g = &mut entry.graph;
            if needs_bridges {
                g.mark_bridges();
            }
            if mode.contains(Mode::RING) {
                if let Err(e) = g.mark_rings(rgmin, rgmax) {
                    warn!(graph = gid, name = %entry.name, "{e}; mining without ring marks");
                } else if pseudo {
                    if let Err(e) = g.mark_pseudo_rings(rgmin) {
                        warn!(graph = gid, name = %entry.name, "{e}");
                    }
                }
                g.flag_ring_edges();
            }
            if let Some((n, e, rn, re)) = self.config.masks {
                g.mask_types(n, e, rn, re);
            }
        }

        // type recoding: frequent focus types get small codes
        let mut max_base = 0usize;
        for entry in self.db.iter() {
            for node in entry.graph.nodes() {
                max_base = max_base.max(base(node.typ()) as usize);
            }
        }
        let mut counts = vec![0usize; max_base + 1];
        for entry in self.db.iter() {
            if entry.group == crate::embed::Group::Focus {
                entry.graph.count_types_once(&mut counts);
            }
        }
        let recoder = Recoder::new(
            &counts,
            &self.config.excluded,
            &self.config.seed_excluded,
        );
        for entry in self.db.iter_mut() {
            entry.graph.recode_with(|t| recoder.encode(t));
            entry.graph.prepare();
        }
        self.excluded = vec![false; recoder.len()];
        for &t in &self.config.excluded {
            if (t as usize) < recoder.len() {
                self.excluded[base(recoder.encode(t)) as usize] = true;
            }
        }
        if let Some((cnode, cedge)) = self.config.chain {
            self.chain = (base(recoder.encode(cnode)), cedge);
        }
        self.recoder = Some(recoder);

        if self.config.emblvl > 0 {
            self.index = Some(ExtensionIndex::build(&self.db));
        }
        if !mode.contains(Mode::PR_CANONIC) {
            self.repo = Some(Repository::new());
        }
        debug!(
            focus = self.focus_size,
            compl = self.compl_size,
            s_min = self.s_min,
            cf = form_for(self.config.cf).describe(),
            "setup complete"
        );
        Ok(())
    }

    fn run_seeds(&mut self, reporter: &mut dyn Reporter) -> Result<(), Error> {
        if let Some(seed) = self.config.seed.clone() {
            let mut sub = seed;
            let recoder = self.recoder.as_ref().expect("setup ran");
            sub.recode_with(|t| recoder.encode(t));
            form_for(self.config.cf).make_canonic(&mut sub, -1);
            let mut frag = Fragment::with_subgraph(sub);
            self.populate(&mut frag);
            if frag.support().0 >= self.s_min {
                self.recurse(&mut frag, reporter)?;
            }
            return Ok(());
        }
        let seeds: Vec<u32> = {
            let recoder = self.recoder.as_ref().expect("setup ran");
            recoder.seeds(self.s_min).collect()
        };
        for typ in seeds {
            if self.stopped() {
                return Err(Error::Canceled);
            }
            let mut frag = Fragment::seed(typ);
            self.populate(&mut frag);
            if frag.support().0 >= self.s_min {
                self.stats.fragments += 1;
                self.recurse(&mut frag, reporter)?;
            }
            // later roots must not rediscover fragments with this type
            self.excluded[base(typ) as usize] = true;
        }
        Ok(())
    }

    /// Fill a fresh fragment with embeddings, or only a cover when the
    /// search starts above the embedding level.
    fn populate(&self, frag: &mut Fragment) {
        if self.config.emblvl == 0 || frag.size() >= self.config.emblvl {
            for (gid, entry) in self.db.iter().enumerate() {
                for e in embed(&entry.graph, gid, entry.group, &frag.sub) {
                    frag.add_embedding(e, 0, gid);
                }
            }
        } else {
            let cover: IndexSet<usize> = self
                .db
                .iter()
                .enumerate()
                .filter(|(_, entry)| contains(&entry.graph, &frag.sub))
                .map(|(gid, _)| gid)
                .collect();
            frag.set_cover(cover, &self.db);
        }
    }

    fn recurse(&mut self, frag: &mut Fragment, reporter: &mut dyn Reporter) -> Result<(), Error> {
        if self.stopped() {
            return Err(Error::Canceled);
        }
        if self.config.emblvl == 0 || frag.size() >= self.config.emblvl {
            if frag.has_cover() {
                frag.reembed(&self.db);
            }
            self.rec_embed(frag, reporter)
        } else {
            self.rec_plain(frag, reporter)
        }
    }

    /// Recursion with live embeddings.
    fn rec_embed(&mut self, frag: &mut Fragment, reporter: &mut dyn Reporter) -> Result<(), Error> {
        frag.unpack(&self.db);
        let mut children = self.generate_children(frag);
        self.prune_children(frag, &mut children);
        for (_, mut child) in children.drain(..) {
            if child.has_cover() {
                child.reembed(&self.db);
            }
            self.recurse(&mut child, reporter)?;
        }
        self.output(frag, reporter)
    }

    /// Generate and merge the extension candidates of every embedding.
    fn generate_children(&mut self, frag: &Fragment) -> Vec<(Vec<u64>, Fragment)> {
        let opts = ExtOpts {
            edge: self.config.mode.contains(Mode::EDGE),
            ring: self.config.mode.contains(Mode::RING),
            chain: self.config.mode.contains(Mode::CHAIN),
            allexts: self.config.mode.contains(Mode::ALLEXTS)
                || self.config.mode.contains(Mode::CLASSES),
            orbits: self.config.mode.contains(Mode::ORBITS)
                && frag.flags.contains(FragFlags::ORBITS),
            eqvars: self.config.mode.contains(Mode::EQVARS),
            rgmin: self.config.rgmin,
            rgmax: self.config.rgmax,
            cnode: self.chain.0,
            cedge: self.chain.1,
            max_nodes: self.config.max_size,
            idx: frag.ext.idx,
        };
        let mut children: Vec<(Vec<u64>, Fragment)> = Vec::new();
        let mut cands = Vec::new();
        for ei in 0..frag.embs.len() {
            let emb = frag.embs[ei].clone();
            debug_assert!(!emb.is_packed());
            let host = &self.db.graph(emb.graph).graph;
            cands.clear();
            canon::extensions(self.config.cf, &frag.sub, host, &emb, &opts, &mut cands);
            for cand in &cands {
                if cand
                    .node_typs
                    .iter()
                    .any(|&t| self.excluded.get(base(t) as usize) == Some(&true))
                {
                    continue;
                }
                let sig = cand.sig();
                let at = match children.binary_search_by(|(s, _)| s.cmp(&sig)) {
                    Ok(i) => i,
                    Err(i) => {
                        children.insert(i, (sig, Fragment::child_of(frag, cand)));
                        self.stats.fragments += 1;
                        i
                    }
                };
                let child = &mut children[at].1;
                let inherited = frag.chain_lens.get(ei).copied().unwrap_or(0);
                if cand.size < 0 {
                    // one embedding per chain prefix
                    for p in 1..=cand.host_nodes.len() {
                        let mut nodes = emb.nodes.clone();
                        nodes.push(cand.host_nodes[p - 1]);
                        let mut edges = emb.edges.clone();
                        edges.push(cand.host_edges[0]);
                        child.add_embedding(
                            Embedding {
                                graph: emb.graph,
                                group: emb.group,
                                nodes,
                                edges,
                            },
                            p as u16,
                            ei,
                        );
                        self.stats.embeddings += 1;
                    }
                } else {
                    let mut nodes = emb.nodes.clone();
                    nodes.extend(cand.host_nodes.iter().copied());
                    let mut edges = emb.edges.clone();
                    edges.extend(cand.host_edges.iter().copied());
                    child.add_embedding(
                        Embedding {
                            graph: emb.graph,
                            group: emb.group,
                            nodes,
                            edges,
                        },
                        inherited,
                        ei,
                    );
                    self.stats.embeddings += 1;
                }
            }
        }
        children
    }

    /// The pruning pipeline, in its fixed order.
    fn prune_children(&mut self, frag: &mut Fragment, children: &mut Vec<(Vec<u64>, Fragment)>) {
        let mode = self.config.mode;

        // alternative support measures
        if self.config.support != SupportKind::Graphs {
            for (_, c) in children.iter_mut() {
                support::compute(c, &self.db, self.config.support, self.config.maxepg);
            }
        }

        // support pruning; a child with the parent's support opens it
        let parent_supp = frag.support();
        let s_min = self.s_min;
        children.retain(|(_, c)| {
            if c.support() == parent_supp {
                frag.flags -= FragFlags::CLOSED;
            }
            if c.support().0 < s_min {
                self.stats.pruned_support += 1;
                false
            } else {
                true
            }
        });

        // chain pruning
        if mode.contains(Mode::CHAIN) {
            children.retain(|(_, c)| {
                if c.ext.size < 0 && c.min_chain_len() > 1 {
                    self.stats.pruned_chain += 1;
                    false
                } else {
                    true
                }
            });
        }

        // merge ring extensions sharing their first edge
        if mode.contains(Mode::MERGERINGS) {
            self.merge_rings(children);
        }

        // unclosable rings
        if mode.contains(Mode::PR_UNCLOSE) {
            let kind = self.config.cf;
            children.retain(|(_, c)| {
                if c.has_unclosable_rings(kind) {
                    self.stats.pruned_unclosable += 1;
                    false
                } else {
                    true
                }
            });
        }

        // perfect-extension pruning
        let mut reverted = false;
        if mode.intersects(Mode::PR_PARTIAL | Mode::PR_PERFECT) {
            let parent_embcnt = frag.embedding_count();
            let perfect = children
                .iter()
                .position(|(_, c)| c.is_perfect(parent_embcnt, &self.db));
            if let Some(i) = perfect {
                children[i].1.flags |= FragFlags::PERFECT;
                if mode.contains(Mode::PR_PARTIAL) {
                    self.stats.pruned_perfect += children.len() - i - 1;
                    children.truncate(i + 1);
                } else {
                    self.stats.pruned_perfect += children.len() - 1;
                    let keep = children.swap_remove(i);
                    children.clear();
                    children.push(keep);
                    reverted = true;
                }
            }
        }

        // equivalent siblings: keep the smaller code word
        if mode.contains(Mode::PR_EQUIV) && children.len() > 1 {
            let kind = self.config.cf;
            let ring_canonic = mode.contains(Mode::RING) && mode.contains(Mode::PR_CANONIC);
            let mut dead = vec![false; children.len()];
            for i in 0..children.len() {
                if dead[i] {
                    continue;
                }
                for j in i + 1..children.len() {
                    if dead[j] {
                        continue;
                    }
                    let (a, b) = (&children[i].1, &children[j].1);
                    // with rings under canonical pruning the word compare is
                    // only sound once adaptation is settled; skip otherwise
                    if ring_canonic
                        && (a.vars.is_some() && !a.flags.contains(FragFlags::ADAPTED)
                            || b.vars.is_some() && !b.flags.contains(FragFlags::ADAPTED))
                    {
                        continue;
                    }
                    if a.equivalent(b) {
                        let drop_j = cmp_by_word(kind, a, b) != std::cmp::Ordering::Greater;
                        dead[if drop_j { j } else { i }] = true;
                        self.stats.pruned_equiv += 1;
                    }
                }
            }
            let mut k = 0;
            children.retain(|_| {
                let d = dead[k];
                k += 1;
                !d
            });
        }

        // ring adaptation and ring-order pruning
        if mode.contains(Mode::RING) {
            let check = mode.contains(Mode::PR_CANONIC);
            let (rgmin, rgmax) = (self.config.rgmin, self.config.rgmax);
            let cf = form_for(self.config.cf);
            children.retain_mut(|(_, c)| {
                if c.ext.size <= 0 {
                    return true;
                }
                if c.adapt(cf.as_ref(), rgmin, rgmax, check) < 0 {
                    self.stats.pruned_ring_order += 1;
                    false
                } else {
                    true
                }
            });
        }

        // canonical-form pruning, or repository deduplication
        if mode.contains(Mode::PR_CANONIC) {
            let cf = form_for(self.config.cf);
            children.retain_mut(|(_, c)| match cf.is_canonic(&mut c.sub, c.fixed) {
                Canonicity::Canonic => {
                    c.flags |= FragFlags::ORBITS;
                    true
                }
                Canonicity::NonCanonic if c.ext.size > 0 => {
                    // ring descendants may still be canonical; search on,
                    // but never report this fragment
                    c.flags -= FragFlags::VALID;
                    true
                }
                _ => {
                    self.stats.pruned_canonic += 1;
                    false
                }
            });
        } else if let Some(repo) = &mut self.repo {
            children.retain(|(_, c)| {
                if repo.insert(&c.sub) {
                    true
                } else {
                    self.stats.pruned_duplicate += 1;
                    false
                }
            });
        }

        // after full perfect pruning the survivor stands in for the parent
        if reverted {
            if let Some((_, c)) = children.first_mut() {
                c.revert();
            }
        }

        // per-host embedding cap
        if self.config.maxepg > 0 {
            for (_, c) in children.iter_mut() {
                c.pack(self.config.maxepg);
            }
        }

        // memory relief: strip embeddings of siblings awaiting recursion
        if mode.contains(Mode::UNEMBED) && children.len() > 1 {
            for (_, c) in children.iter_mut().skip(1) {
                c.unembed(&self.db);
            }
        }
    }

    /// Collapse ring children sharing their first extension edge.
    fn merge_rings(&mut self, children: &mut Vec<(Vec<u64>, Fragment)>) {
        let mut i = 0;
        while i < children.len() {
            if children[i].1.ext.size <= 0 {
                i += 1;
                continue;
            }
            let key = {
                let c = &children[i].1;
                let e = c.sub.edge(c.ext.idx);
                (c.ext.src, e.typ(), c.sub.node(e.dst()).typ())
            };
            let mut j = i + 1;
            while j < children.len() {
                let same = {
                    let c = &children[j].1;
                    c.ext.size > 0 && {
                        let e = c.sub.edge(c.ext.idx);
                        (c.ext.src, e.typ(), c.sub.node(e.dst()).typ()) == key
                    }
                };
                if same {
                    let (_, other) = children.remove(j);
                    children[i].1.absorb(other);
                } else {
                    j += 1;
                }
            }
            i += 1;
        }
    }

    /// Recursion above the embedding level: covers only, extensions from
    /// the pre-aggregated edge index, occurrence tested by containment.
    fn rec_plain(&mut self, frag: &mut Fragment, reporter: &mut dyn Reporter) -> Result<(), Error> {
        let kind = self.config.cf;
        let opts = ExtOpts {
            edge: true,
            ring: false,
            chain: false,
            allexts: self.config.mode.contains(Mode::ALLEXTS),
            orbits: false,
            eqvars: false,
            rgmin: self.config.rgmin,
            rgmax: self.config.rgmax,
            cnode: u32::MAX,
            cedge: u32::MAX,
            max_nodes: self.config.max_size,
            idx: frag.ext.idx,
        };
        let mut children: Vec<(Vec<u64>, Fragment)> = Vec::new();
        let sources = canon::allowed_sources(kind, &frag.sub, &opts);
        for src in sources {
            let styp = frag.sub.node(src).typ();
            let degree = frag.sub.node(src).degree();
            let triples: Vec<crate::index::Triple> = self
                .index
                .as_ref()
                .expect("index built for embedding-free levels")
                .for_source(styp)
                .to_vec();
            for t in triples {
                if degree >= t.max_degree {
                    continue;
                }
                if self.excluded.get(base(t.dst_typ) as usize) == Some(&true) {
                    continue;
                }
                if frag.size() >= self.config.max_size {
                    continue;
                }
                let sig = vec![
                    src as u64,
                    0,
                    0,
                    t.etyp as u64,
                    t.dst_typ as u64,
                ];
                if children.binary_search_by(|(s, _)| s.cmp(&sig)).is_ok() {
                    continue;
                }
                let mut sub = frag.sub.clone();
                sub.clear_marks();
                let dst = sub.add_node(t.dst_typ);
                sub.add_edge(src, dst, t.etyp);
                let mut child = Fragment::with_subgraph(sub);
                child.ext = crate::fragment::ExtInfo {
                    idx: frag.sub.edge_count(),
                    src,
                    dst: -1,
                    size: 0,
                };
                child.fixed = frag.ext.idx;
                child.set_cover(
                    frag.graphs().into_iter().collect(),
                    &self.db,
                );
                self.stats.fragments += 1;
                if !child.rebuild_cover(&self.db, self.s_min) || child.support().0 < self.s_min {
                    self.stats.pruned_support += 1;
                    continue;
                }
                if child.support() == frag.support() {
                    frag.flags -= FragFlags::CLOSED;
                }
                let pos = children
                    .binary_search_by(|(s, _)| s.cmp(&sig))
                    .unwrap_err();
                children.insert(pos, (sig, child));
            }
        }

        // canonical or repository pruning, as in the embedding recursion
        if self.config.mode.contains(Mode::PR_CANONIC) {
            let cf = form_for(kind);
            children.retain_mut(|(_, c)| match cf.is_canonic(&mut c.sub, c.fixed) {
                Canonicity::Canonic => {
                    c.flags |= FragFlags::ORBITS;
                    true
                }
                _ => {
                    self.stats.pruned_canonic += 1;
                    false
                }
            });
        } else if let Some(repo) = &mut self.repo {
            children.retain(|(_, c)| {
                if repo.insert(&c.sub) {
                    true
                } else {
                    self.stats.pruned_duplicate += 1;
                    false
                }
            });
        }

        for (_, mut child) in children.drain(..) {
            self.recurse(&mut child, reporter)?;
        }
        self.output(frag, reporter)
    }

    /// Post-order reporting with the output filter.
    fn output(&mut self, frag: &mut Fragment, reporter: &mut dyn Reporter) -> Result<(), Error> {
        if !frag.flags.contains(FragFlags::VALID) {
            return Ok(());
        }
        if frag.size() < self.config.min_size || frag.size() > self.config.max_size {
            return Ok(());
        }
        let (sf, sc) = frag.support();
        if sf < self.s_min || sc > self.config.s_max {
            return Ok(());
        }
        if self.config.mode.contains(Mode::CLOSED) {
            if !frag.flags.contains(FragFlags::CLOSED) {
                return Ok(());
            }
            if frag.has_cover() {
                frag.reembed(&self.db);
            } else {
                frag.unpack(&self.db);
            }
            let chain = self
                .config
                .mode
                .contains(Mode::CHAIN)
                .then_some(self.chain);
            if !frag.is_closed(&self.db, chain) {
                return Ok(());
            }
        }
        if self.config.mode.contains(Mode::CLOSERINGS)
            && frag.has_open_rings(self.config.rgmin, self.config.rgmax)
        {
            return Ok(());
        }
        if self.config.mode.contains(Mode::CHAIN) && !frag.chains_valid() {
            return Ok(());
        }

        let sub = if self.config.mode.contains(Mode::NORMFORM) {
            let mut copy = frag.sub.clone();
            copy.clear_marks();
            form_for(self.config.norm_cf).make_canonic(&mut copy, -1);
            copy
        } else {
            frag.sub.clone()
        };
        let description = describe(
            &sub,
            self.node_names.as_ref(),
            self.edge_names.as_ref(),
            self.recoder.as_ref(),
        );
        let hosts: Vec<String> = frag
            .graphs()
            .iter()
            .map(|&g| self.db.graph(g).name.clone())
            .collect();
        self.next_id += 1;
        let rel = |supp: usize, size: usize| {
            if size == 0 {
                0.0
            } else {
                100.0 * supp as f64 / size as f64
            }
        };
        let report = FragmentReport {
            id: self.next_id,
            description,
            nodes: frag.sub.node_count(),
            edges: frag.sub.edge_count(),
            supp_focus: sf,
            rel_focus: rel(sf, self.focus_size),
            supp_compl: sc,
            rel_compl: rel(sc, self.compl_size),
            hosts,
            chain: frag.flags.contains(FragFlags::CHAIN),
        };
        reporter.fragment(&report).map_err(Error::Io)?;
        self.stats.reported += 1;
        Ok(())
    }
}
