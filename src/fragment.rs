//! Fragments: connected subgraphs together with their occurrences.
//!
//! A fragment owns its subgraph (edge array in canonical-form order), and
//! either a list of embeddings (grouped by host graph, possibly packed) or a
//! *cover* of host graph ids when the search runs embedding-free. Support
//! counters, state flags and the extension provenance of the creating step
//! ride along.

use bitflags::bitflags;
use indexmap::IndexSet;

use crate::canon::{cmp_tuple, current_seq, CanonicalForm, CfKind, ExtCand, RingVars};
use crate::db::Database;
use crate::embed::{contains, embed, Embedding, Group};
use crate::graph::Graph;
use crate::types::EDGE_RING;

bitflags! {
    /// Fragment state flags.
    #[derive(Clone, Copy, Debug, Eq, PartialEq)]
    pub struct FragFlags: u32 {
        /// Eligible for reporting (cleared by canonical-form pruning).
        const VALID = 1 << 0;
        /// No extension with identical support seen so far.
        const CLOSED = 1 << 1;
        /// Carries a variable-length chain.
        const CHAIN = 1 << 2;
        /// The extension edge could start a chain.
        const CHAIN_START = 1 << 3;
        /// Equivalent siblings are possible (ring extension ties).
        const SIBLING = 1 << 4;
        /// A perfect extension of its parent.
        const PERFECT = 1 << 5;
        /// Extension provenance was reverted to the parent's.
        const REVERTED = 1 << 6;
        /// The edge array was adapted after a ring extension.
        const ADAPTED = 1 << 7;
        /// Node orbits are up to date.
        const ORBITS = 1 << 8;
        /// Some host's embeddings are packed.
        const PACKED = 1 << 9;
    }
}

/// Extension provenance: how a fragment was derived from its parent.
#[derive(Clone, Copy, Debug)]
pub struct ExtInfo {
    /// Index of the first edge added by the extension.
    pub idx: usize,
    /// Source role of the extension edge.
    pub src: usize,
    /// Destination role; −1 for extensions towards a new node.
    pub dst: isize,
    /// 0 = single edge, `+k` = ring of `k` nodes, `-k` = chain.
    pub size: i32,
}

/// A connected subgraph with its occurrences in the database.
#[derive(Clone, Debug)]
pub struct Fragment {
    pub(crate) sub: Graph,
    /// Embeddings, grouped contiguously by host graph id.
    pub(crate) embs: Vec<Embedding>,
    /// Host graph ids, when mining without embeddings.
    pub(crate) cover: Option<IndexSet<usize>>,
    /// Matched chain length per embedding (0 = not a chain embedding).
    pub(crate) chain_lens: Vec<u16>,
    /// Extension provenance of this fragment.
    pub(crate) ext: ExtInfo,
    /// Extension provenance of the parent (for `revert`).
    parent_ext: ExtInfo,
    /// First movable edge index (the parent's `idx`).
    pub(crate) fixed: usize,
    /// `[focus graphs, compl graphs, focus embeddings, compl embeddings,
    /// extended parent embeddings]`
    pub(crate) supp: [usize; 5],
    pub(crate) flags: FragFlags,
    /// Ring-variant insertion positions, for ring extensions.
    pub(crate) vars: Option<RingVars>,
    /// Index of the last parent embedding that produced an embedding here.
    last_parent_emb: usize,
}

impl Fragment {
    /// A seed fragment: a single node of the given type, no occurrences yet.
    pub fn seed(typ: u32) -> Self {
        Fragment {
            sub: Graph::single(typ),
            embs: Vec::new(),
            cover: None,
            chain_lens: Vec::new(),
            ext: ExtInfo {
                idx: 0,
                src: 0,
                dst: -1,
                size: 0,
            },
            parent_ext: ExtInfo {
                idx: 0,
                src: 0,
                dst: -1,
                size: 0,
            },
            fixed: 0,
            supp: [0; 5],
            flags: FragFlags::VALID | FragFlags::CLOSED,
            vars: None,
            last_parent_emb: usize::MAX,
        }
    }

    /// A fragment around a given seed subgraph.
    pub fn with_subgraph(sub: Graph) -> Self {
        let mut f = Fragment::seed(0);
        f.sub = sub;
        f
    }

    /// Child skeleton for an extension candidate of `parent`.
    ///
    /// The subgraph is the parent's with the candidate's nodes and edges
    /// appended; embeddings are added afterwards with
    /// [`Fragment::add_embedding`].
    pub fn child_of(parent: &Fragment, cand: &ExtCand) -> Self {
        let mut sub = parent.sub.clone();
        sub.clear_marks();
        for &t in &cand.node_typs {
            sub.add_node(t);
        }
        for (k, &(a, b)) in cand.edge_roles.iter().enumerate() {
            sub.add_edge(a as usize, b as usize, cand.edge_typs[k]);
        }
        let mut flags = FragFlags::VALID | FragFlags::CLOSED;
        if cand.size < 0 || parent.flags.contains(FragFlags::CHAIN) {
            flags |= FragFlags::CHAIN;
        }
        if cand.chain_start {
            flags |= FragFlags::CHAIN_START;
        }
        Fragment {
            sub,
            embs: Vec::new(),
            cover: None,
            chain_lens: Vec::new(),
            ext: ExtInfo {
                idx: parent.sub.edge_count(),
                src: cand.src,
                dst: cand.dst.map_or(-1, |d| d as isize),
                size: cand.size,
            },
            parent_ext: parent.ext,
            fixed: parent.ext.idx,
            supp: [0; 5],
            flags,
            vars: cand.vars,
            last_parent_emb: usize::MAX,
        }
    }

    /// The fragment's size in nodes.
    #[inline]
    pub fn size(&self) -> usize {
        self.sub.node_count()
    }

    /// The subgraph.
    #[inline]
    pub fn subgraph(&self) -> &Graph {
        &self.sub
    }

    /// The support pair `(focus, complement)` in host graphs.
    #[inline]
    pub fn support(&self) -> (usize, usize) {
        (self.supp[0], self.supp[1])
    }

    /// Total number of embeddings over both groups.
    #[inline]
    pub fn embedding_count(&self) -> usize {
        self.supp[2] + self.supp[3]
    }

    /// Whether the fragment currently holds only a cover.
    #[inline]
    pub fn has_cover(&self) -> bool {
        self.cover.is_some()
    }

    /// Host graph ids containing this fragment, in order.
    pub fn graphs(&self) -> Vec<usize> {
        match &self.cover {
            Some(cover) => cover.iter().copied().collect(),
            None => {
                let mut out = Vec::new();
                for e in &self.embs {
                    if out.last() != Some(&e.graph) {
                        out.push(e.graph);
                    }
                }
                out
            }
        }
    }

    /// Append an embedding derived from `parent_emb_idx`-th parent
    /// embedding, keeping the host grouping and all counters in step.
    pub fn add_embedding(&mut self, emb: Embedding, chain_len: u16, parent_emb_idx: usize) {
        debug_assert!(
            self.embs.last().map_or(true, |last| last.graph <= emb.graph),
            "embeddings must arrive grouped by host"
        );
        let group = emb.group.index();
        if self.embs.last().map_or(true, |last| last.graph != emb.graph) {
            self.supp[group] += 1;
        }
        self.supp[2 + group] += 1;
        if parent_emb_idx != self.last_parent_emb {
            self.supp[4] += 1;
            self.last_parent_emb = parent_emb_idx;
        }
        self.embs.push(emb);
        self.chain_lens.push(chain_len);
    }

    /// Initialize the fragment as a cover-only fragment.
    pub fn set_cover(&mut self, cover: IndexSet<usize>, db: &Database) {
        self.supp = [0; 5];
        for &g in &cover {
            self.supp[db.graph(g).group.index()] += 1;
        }
        self.cover = Some(cover);
    }

    /// Pack embeddings: hosts (beyond the first) whose embedding count
    /// exceeds `maxepg` keep a single placeholder. `maxepg == 0` packs
    /// every eligible host.
    ///
    /// The first host graph's embeddings are never packed; regeneration
    /// starts from them.
    pub fn pack(&mut self, maxepg: usize) {
        if self.flags.contains(FragFlags::CHAIN) || self.embs.is_empty() {
            return;
        }
        let first_graph = self.embs[0].graph;
        let mut out: Vec<Embedding> = Vec::with_capacity(self.embs.len());
        let mut lens: Vec<u16> = Vec::with_capacity(self.embs.len());
        let mut i = 0;
        let embs = std::mem::take(&mut self.embs);
        let old_lens = std::mem::take(&mut self.chain_lens);
        while i < embs.len() {
            let g = embs[i].graph;
            let mut j = i;
            while j < embs.len() && embs[j].graph == g {
                j += 1;
            }
            let count = j - i;
            if g != first_graph && (maxepg == 0 || count > maxepg) {
                out.push(Embedding::packed(g, embs[i].group));
                lens.push(0);
                self.flags |= FragFlags::PACKED;
            } else {
                out.extend_from_slice(&embs[i..j]);
                lens.extend_from_slice(&old_lens[i..j]);
            }
            i = j;
        }
        self.embs = out;
        self.chain_lens = lens;
    }

    /// Regenerate all packed embeddings by re-embedding the subgraph.
    pub fn unpack(&mut self, db: &Database) {
        if !self.flags.contains(FragFlags::PACKED) {
            return;
        }
        let embs = std::mem::take(&mut self.embs);
        let mut out = Vec::with_capacity(embs.len());
        let mut lens = Vec::with_capacity(embs.len());
        let old_lens = std::mem::take(&mut self.chain_lens);
        for (k, e) in embs.into_iter().enumerate() {
            if e.is_packed() {
                let host = db.graph(e.graph);
                let found = embed(&host.graph, e.graph, host.group, &self.sub);
                debug_assert!(!found.is_empty(), "packed host lost its embeddings");
                lens.extend(std::iter::repeat(0).take(found.len()));
                out.extend(found);
            } else {
                lens.push(old_lens[k]);
                out.push(e);
            }
        }
        self.embs = out;
        self.chain_lens = lens;
        self.flags -= FragFlags::PACKED;
        // embedding counters must be rebuilt after regeneration
        self.recount();
    }

    /// Rebuild `supp[0..4]` from the embedding list.
    pub(crate) fn recount(&mut self) {
        let supp4 = self.supp[4];
        self.supp = [0, 0, 0, 0, supp4];
        let mut last = usize::MAX;
        for e in &self.embs {
            let group = e.group.index();
            if e.graph != last {
                self.supp[group] += 1;
                last = e.graph;
            }
            self.supp[2 + group] += 1;
        }
    }

    /// Drop all embeddings, keeping only the cover. The inverse of
    /// [`Fragment::reembed`].
    pub fn unembed(&mut self, db: &Database) {
        if self.cover.is_none() {
            let cover: IndexSet<usize> = self.graphs().into_iter().collect();
            self.set_cover(cover, db);
        }
        self.embs.clear();
        self.chain_lens.clear();
        self.flags -= FragFlags::PACKED;
    }

    /// Regenerate the embedding list by embedding the subgraph into every
    /// covered host.
    pub fn reembed(&mut self, db: &Database) {
        let hosts = self.graphs();
        self.embs.clear();
        self.chain_lens.clear();
        for g in hosts {
            let host = db.graph(g);
            let found = embed(&host.graph, g, host.group, &self.sub);
            self.chain_lens
                .extend(std::iter::repeat(0).take(found.len()));
            self.embs.extend(found);
        }
        self.cover = None;
        self.recount();
    }

    /// Whether this extension is *perfect*: every parent embedding extends
    /// along it, and the extension edge is a bridge in every host or closes
    /// a ring in every host. Chain fragments and potential chain starts are
    /// never perfect.
    pub fn is_perfect(&self, parent_embcnt: usize, db: &Database) -> bool {
        if self
            .flags
            .intersects(FragFlags::CHAIN | FragFlags::CHAIN_START)
        {
            return false;
        }
        if self.ext.size != 0 || self.supp[4] != parent_embcnt {
            return false;
        }
        if self.ext.dst >= 0 {
            // ring-closing in every host by construction
            return true;
        }
        self.embs.iter().all(|e| {
            e.is_packed() || db.graph(e.graph).graph.edge(e.edges[self.ext.idx]).is_bridge()
        })
    }

    /// Whether some embedding of `self` and some embedding of `other`
    /// occupy exactly the same host nodes and edges.
    pub fn equivalent(&self, other: &Fragment) -> bool {
        for a in &self.embs {
            if a.is_packed() {
                continue;
            }
            let mut an: Vec<usize> = a.nodes.clone();
            let mut ae: Vec<usize> = a.edges.clone();
            an.sort_unstable();
            ae.sort_unstable();
            for b in &other.embs {
                if b.graph != a.graph || b.is_packed() {
                    continue;
                }
                let mut bn: Vec<usize> = b.nodes.clone();
                let mut be: Vec<usize> = b.edges.clone();
                bn.sort_unstable();
                be.sort_unstable();
                if an == bn && ae == be {
                    return true;
                }
            }
        }
        false
    }

    /// Explicit closed-fragment test: collect the one-edge extension
    /// signatures occurring in the first host, intersect with every further
    /// host; the fragment is closed iff the intersection is empty.
    ///
    /// `chain` carries the (recoded) chain node/edge base types; edges that
    /// would merely continue a chain run are not extensions.
    pub fn is_closed(&self, db: &Database, chain: Option<(u32, u32)>) -> bool {
        if !self.flags.contains(FragFlags::CLOSED) {
            return false;
        }
        let mut common: Option<Vec<(usize, isize, u32, u32)>> = None;
        let mut i = 0;
        while i < self.embs.len() {
            let g = self.embs[i].graph;
            let mut j = i;
            let mut sigs: Vec<(usize, isize, u32, u32)> = Vec::new();
            while j < self.embs.len() && self.embs[j].graph == g {
                let emb = &self.embs[j];
                j += 1;
                if emb.is_packed() {
                    continue;
                }
                let host = &db.graph(g).graph;
                for (role, &hn) in emb.nodes.iter().enumerate() {
                    for &he in host.incident(hn) {
                        if emb.edges.contains(&he) {
                            continue;
                        }
                        let edge = host.edge(he);
                        let far = edge.other(hn);
                        if let Some((cnode, cedge)) = chain {
                            if crate::types::is_special(self.sub.node(role).typ())
                                && crate::types::base(edge.typ()) == cedge
                                && crate::types::base(host.node(far).typ()) == cnode
                            {
                                continue;
                            }
                        }
                        let sig = match emb.nodes.iter().position(|&n| n == far) {
                            Some(d) => {
                                if d < role {
                                    continue;
                                }
                                (role, d as isize, edge.typ(), 0)
                            }
                            None => (role, -1, edge.typ(), host.node(far).typ()),
                        };
                        if !sigs.contains(&sig) {
                            sigs.push(sig);
                        }
                    }
                }
            }
            common = Some(match common {
                None => sigs,
                Some(prev) => prev.into_iter().filter(|s| sigs.contains(s)).collect(),
            });
            if common.as_ref().map_or(false, |c| c.is_empty()) {
                return true;
            }
            i = j;
        }
        common.map_or(true, |c| c.is_empty())
    }

    /// Whether the subgraph contains a ring-flagged edge that lies on no
    /// complete ring of a marked size within the subgraph.
    pub fn has_open_rings(&self, rgmin: usize, rgmax: usize) -> bool {
        let flagged: Vec<usize> = (0..self.sub.edge_count())
            .filter(|&e| self.sub.edge(e).typ() & EDGE_RING != 0)
            .collect();
        if flagged.is_empty() {
            return false;
        }
        let cycles = match self.sub.collect_cycles(rgmin, rgmax, Some(&|g: &Graph, e: usize| {
            g.edge(e).typ() & EDGE_RING != 0
        })) {
            Ok(c) => c,
            Err(_) => return false,
        };
        flagged
            .iter()
            .any(|e| !cycles.iter().any(|c| c.contains(e)))
    }

    /// Whether a node that the canonical form can no longer extend has
    /// exactly one incident ring edge; such a ring can never be closed.
    pub fn has_unclosable_rings(&self, kind: CfKind) -> bool {
        let extendable: Vec<bool> = match kind {
            CfKind::Breadth1 | CfKind::Breadth2 => {
                let max_src = if self.sub.edge_count() == 0 {
                    0
                } else {
                    self.sub.edge(self.sub.edge_count() - 1).src()
                };
                (0..self.sub.node_count()).map(|v| v >= max_src).collect()
            }
            CfKind::Depth => {
                let path = crate::canon::rmpath_of(&current_seq(&self.sub));
                (0..self.sub.node_count())
                    .map(|v| path.contains(&v))
                    .collect()
            }
        };
        for v in 0..self.sub.node_count() {
            if extendable[v] {
                continue;
            }
            let ring_edges = self
                .sub
                .incident(v)
                .iter()
                .filter(|&&e| self.sub.edge(e).typ() & EDGE_RING != 0)
                .count();
            if ring_edges == 1 {
                return true;
            }
        }
        false
    }

    /// Whether the chain lengths observed across embeddings make this a
    /// genuine variable-length chain (at least two distinct lengths).
    pub fn chains_valid(&self) -> bool {
        if !self.flags.contains(FragFlags::CHAIN) {
            return true;
        }
        let mut first = 0u16;
        for &l in &self.chain_lens {
            if l == 0 {
                continue;
            }
            if first == 0 {
                first = l;
            } else if l != first {
                return true;
            }
        }
        false
    }

    /// The smallest chain length over all chain embeddings (0 when none).
    pub fn min_chain_len(&self) -> u16 {
        self.chain_lens
            .iter()
            .copied()
            .filter(|&l| l != 0)
            .min()
            .unwrap_or(0)
    }

    /// Restore the extension provenance to the parent's (after full
    /// perfect-extension pruning skipped the intermediate step).
    pub fn revert(&mut self) {
        self.ext = self.parent_ext;
        self.flags |= FragFlags::REVERTED;
    }

    /// Adapt the edge array after a ring extension: reorder the movable
    /// suffix (everything from the parent's own extension edge on) into the
    /// canonical-prefix-compatible order and remap the embeddings along.
    ///
    /// Returns `+1` when nothing changed, `0` when the array was reordered,
    /// `−1` when no compatible order exists (*ring-order pruning*). With
    /// `check`, additionally verifies that the new ring is a ring key: if
    /// its last edge is redundant for covering every older ring edge, the
    /// rings were added in the wrong order.
    pub fn adapt(&mut self, cf: &dyn CanonicalForm, rgmin: usize, rgmax: usize, check: bool) -> i32 {
        if self.flags.contains(FragFlags::ADAPTED) {
            return 1;
        }
        let ecnt = self.sub.edge_count();
        if self.ext.idx >= ecnt {
            return 1;
        }
        if check && !self.ring_key_ok(rgmin, rgmax) {
            return -1;
        }
        self.flags |= FragFlags::ADAPTED;
        let maps = cf.make_canonic(&mut self.sub, self.fixed as isize);
        // the breadth forms demand a globally non-decreasing word; if the
        // minimized suffix still falls below the fixed prefix, no valid
        // insertion order exists
        if cf.kind().is_breadth() && self.fixed > 0 && self.fixed < ecnt {
            let seq = current_seq(&self.sub);
            if cmp_tuple(cf.kind(), &seq[self.fixed], &seq[self.fixed - 1])
                == std::cmp::Ordering::Less
            {
                return -1;
            }
        }
        let Some((node_map, edge_map)) = maps else {
            return 1;
        };
        for emb in &mut self.embs {
            if emb.is_packed() {
                continue;
            }
            let nodes = emb.nodes.clone();
            for (v, &host) in nodes.iter().enumerate() {
                emb.nodes[node_map[v]] = host;
            }
            let edges = emb.edges.clone();
            for (e, &host) in edges.iter().enumerate() {
                emb.edges[edge_map[e]] = host;
            }
        }
        0
    }

    /// Ring-key check: the ring added last must contribute an edge that no
    /// complete older ring covers; otherwise rings were added out of order.
    fn ring_key_ok(&self, rgmin: usize, rgmax: usize) -> bool {
        if self.ext.size <= 0 {
            return true;
        }
        let ecnt = self.sub.edge_count();
        let last_new = ecnt - 1;
        let cycles = match self.sub.collect_cycles(rgmin, rgmax, Some(&|g: &Graph, e: usize| {
            g.edge(e).typ() & EDGE_RING != 0
        })) {
            Ok(c) => c,
            Err(_) => return true,
        };
        // old ring edges still covered by cycles avoiding the last edge?
        for e in 0..self.ext.idx {
            if self.sub.edge(e).typ() & EDGE_RING == 0 {
                continue;
            }
            let covered_without = cycles
                .iter()
                .any(|c| c.contains(&e) && !c.contains(&last_new));
            let covered_at_all = cycles.iter().any(|c| c.contains(&e));
            if covered_at_all && !covered_without {
                // the new ring is essential for an old edge: fine
                return true;
            }
        }
        // the new ring must itself be the only cover for one of its edges
        for e in self.ext.idx..ecnt {
            let covers: Vec<&Vec<usize>> = cycles.iter().filter(|c| c.contains(&e)).collect();
            if covers.len() == 1 {
                return true;
            }
        }
        false
    }

    /// Merge another (equal-signature or ring-merged) sibling's embeddings
    /// into this fragment.
    pub fn absorb(&mut self, other: Fragment) {
        for (emb, len) in other.embs.into_iter().zip(other.chain_lens) {
            let pos = self
                .embs
                .iter()
                .position(|e| e.graph > emb.graph)
                .unwrap_or(self.embs.len());
            if !self.embs.contains(&emb) {
                self.embs.insert(pos, emb);
                self.chain_lens.insert(pos, len);
            }
        }
        self.recount();
    }

    /// Whether every covered host still contains the subgraph; rebuilds the
    /// cover, aborting early once fewer than `s_min` focus hosts remain
    /// reachable.
    pub fn rebuild_cover(&mut self, db: &Database, s_min: usize) -> bool {
        let Some(old) = self.cover.take() else {
            return true;
        };
        let mut cover = IndexSet::new();
        let mut focus = 0usize;
        let mut remaining_focus = old
            .iter()
            .filter(|&&g| db.graph(g).group == Group::Focus)
            .count();
        for &g in &old {
            let host = db.graph(g);
            let is_focus = host.group == Group::Focus;
            if contains(&host.graph, &self.sub) {
                if is_focus {
                    focus += 1;
                }
                cover.insert(g);
            }
            if is_focus {
                remaining_focus -= 1;
                if focus + remaining_focus < s_min {
                    // unreachable support; the caller drops the fragment
                    self.set_cover(cover, db);
                    return false;
                }
            }
        }
        self.set_cover(cover, db);
        true
    }
}

/// Compare two fragments by their code word under `kind`, used for
/// equivalent-sibling selection (ties break towards the smaller extension
/// edge index).
pub(crate) fn cmp_by_word(kind: CfKind, a: &Fragment, b: &Fragment) -> std::cmp::Ordering {
    let wa = current_seq(&a.sub);
    let wb = current_seq(&b.sub);
    let root = a
        .sub
        .node(0)
        .typ()
        .cmp(&b.sub.node(0).typ());
    if root != std::cmp::Ordering::Equal {
        return root;
    }
    for (x, y) in wa.iter().zip(wb.iter()) {
        match cmp_tuple(kind, x, y) {
            std::cmp::Ordering::Equal => {}
            ord => return ord,
        }
    }
    wa.len()
        .cmp(&wb.len())
        .then(a.ext.idx.cmp(&b.ext.idx))
}
