//! Canonical forms and the restricted extension generator.
//!
//! A canonical form assigns every graph a *code word*: the root node's type
//! followed by one `(src, edge type, dst type, dst)` tuple per edge, taken
//! in a CF-specific order. The canonical word is the lexicographically
//! smallest word over all re-rootings and edge orders the CF admits; a graph
//! is *canonic* iff its current node/edge order already spells that word.
//!
//! Two families are implemented:
//!
//! * **breadth** (maximum source): edges sorted by `(src, type, dst type,
//!   dst)` (variant 1) or `(src, type, dst, dst type)` (variant 2); a new
//!   edge may never leave a node with an index below the largest source seen
//!   so far, and ring closures must lead forward (`dst > src`).
//! * **depth** (rightmost path): edges follow a depth-first traversal; only
//!   nodes on the rightmost path may be extended, closures leave the
//!   rightmost node towards an ancestor.
//!
//! The same backtracking engine serves the canonicity test, `make_canonic`
//! and orbit computation: it builds the minimal word step by step, choosing
//! the smallest admissible edge tuple and branching only on exact ties.

mod extend;

pub use extend::{ChainWalk, ExtCand, ExtOpts, RingVars, RingWalk};
pub(crate) use extend::{allowed_sources, extensions};

use std::cmp::Ordering;

use fixedbitset::FixedBitSet;

use crate::graph::Graph;

/// The concrete canonical form in use.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CfKind {
    /// Maximum source, edge tuples `(src, type, dst type, dst)`.
    Breadth1,
    /// Maximum source, destination index promoted: `(src, type, dst, dst type)`.
    Breadth2,
    /// Rightmost path (depth-first) form.
    Depth,
}

impl CfKind {
    /// Whether this is one of the maximum-source (breadth) forms.
    #[inline]
    pub fn is_breadth(self) -> bool {
        !matches!(self, CfKind::Depth)
    }
}

/// Result of a canonicity test.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Canonicity {
    /// The current order spells the canonical word; orbits were filled in.
    Canonic,
    /// Not canonical, but the divergence lies beyond the fixed prefix.
    NonCanonic,
    /// Not canonical and the divergence lies within the first `fixed`
    /// edges, so the whole subtree can be pruned.
    PrunableAt,
}

/// One edge of a code word.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct EdgeTuple {
    /// Source position (node index in word order).
    pub src: usize,
    /// Destination position.
    pub dst: usize,
    /// Edge type.
    pub etyp: u32,
    /// Destination node type.
    pub dtyp: u32,
    /// Whether the destination is fresh (first touched by this edge).
    pub forward: bool,
}

/// Compare two edge tuples in the order of the given canonical form.
pub fn cmp_tuple(kind: CfKind, a: &EdgeTuple, b: &EdgeTuple) -> Ordering {
    match kind {
        CfKind::Breadth1 => a
            .src
            .cmp(&b.src)
            .then(a.etyp.cmp(&b.etyp))
            .then(a.dtyp.cmp(&b.dtyp))
            .then(a.dst.cmp(&b.dst)),
        CfKind::Breadth2 => a
            .src
            .cmp(&b.src)
            .then(a.etyp.cmp(&b.etyp))
            .then(a.dst.cmp(&b.dst))
            .then(a.dtyp.cmp(&b.dtyp)),
        CfKind::Depth => match (a.forward, b.forward) {
            // closures from the rightmost node come before fresh extensions
            (false, true) => Ordering::Less,
            (true, false) => Ordering::Greater,
            (false, false) => a
                .dst
                .cmp(&b.dst)
                .then(a.etyp.cmp(&b.etyp))
                .then(a.src.cmp(&b.src)),
            // deeper sources first on the rightmost path
            (true, true) => b
                .src
                .cmp(&a.src)
                .then(a.etyp.cmp(&b.etyp))
                .then(a.dtyp.cmp(&b.dtyp))
                .then(a.dst.cmp(&b.dst)),
        },
    }
}

/// The edge-tuple sequence spelled by the graph's current node/edge order.
pub(crate) fn current_seq(g: &Graph) -> Vec<EdgeTuple> {
    let mut seen = vec![false; g.node_count()];
    if !seen.is_empty() {
        seen[0] = true;
    }
    g.edges()
        .map(|e| {
            let forward = !seen[e.dst()];
            seen[e.src()] = true;
            seen[e.dst()] = true;
            EdgeTuple {
                src: e.src(),
                dst: e.dst(),
                etyp: e.typ(),
                dtyp: g.node(e.dst()).typ(),
                forward,
            }
        })
        .collect()
}

/// The full code word (`4·E + 1` characters) of the current order.
pub fn make_word(g: &Graph, kind: CfKind) -> Vec<u32> {
    let mut word = Vec::with_capacity(4 * g.edge_count() + 1);
    word.push(if g.node_count() == 0 {
        0
    } else {
        g.node(0).typ()
    });
    for t in current_seq(g) {
        match kind {
            CfKind::Breadth1 | CfKind::Depth => {
                word.extend([t.src as u32, t.etyp, t.dtyp, t.dst as u32])
            }
            CfKind::Breadth2 => word.extend([t.src as u32, t.etyp, t.dst as u32, t.dtyp]),
        }
    }
    word
}

/// Minimal-word search state.
struct Builder<'a> {
    g: &'a Graph,
    kind: CfKind,
    /// graph node -> word position (usize::MAX unmapped)
    map: Vec<usize>,
    /// word position -> graph node
    inv: Vec<usize>,
    used: FixedBitSet,
    seq: Vec<EdgeTuple>,
    eseq: Vec<usize>,
    /// rightmost path as word positions (depth form only)
    rmpath: Vec<usize>,
    /// best word found so far
    best: Vec<EdgeTuple>,
    best_root: u32,
    /// node orderings that spell the best word (for orbits)
    best_orders: Vec<Vec<usize>>,
    best_edges: Vec<usize>,
    complete: bool,
}

impl<'a> Builder<'a> {
    fn new(g: &'a Graph, kind: CfKind) -> Self {
        Builder {
            g,
            kind,
            map: vec![usize::MAX; g.node_count()],
            inv: Vec::with_capacity(g.node_count()),
            used: FixedBitSet::with_capacity(g.edge_count()),
            seq: Vec::with_capacity(g.edge_count()),
            eseq: Vec::with_capacity(g.edge_count()),
            rmpath: Vec::new(),
            best: Vec::new(),
            best_root: u32::MAX,
            best_orders: Vec::new(),
            best_edges: Vec::new(),
            complete: false,
        }
    }

    fn map_node(&mut self, v: usize) -> usize {
        let pos = self.inv.len();
        self.map[v] = pos;
        self.inv.push(v);
        pos
    }

    fn unmap_node(&mut self, v: usize) {
        self.map[v] = usize::MAX;
        self.inv.pop();
    }

    /// Collect all admissible next edges with their tuples.
    fn candidates(&self, out: &mut Vec<(usize, EdgeTuple)>) {
        out.clear();
        match self.kind {
            CfKind::Breadth1 | CfKind::Breadth2 => {
                for (pos, &v) in self.inv.iter().enumerate() {
                    for &e in self.g.incident(v) {
                        if self.used.contains(e) {
                            continue;
                        }
                        let edge = self.g.edge(e);
                        let w = edge.other(v);
                        let wpos = self.map[w];
                        let t = if wpos == usize::MAX {
                            EdgeTuple {
                                src: pos,
                                dst: self.inv.len(),
                                etyp: edge.typ(),
                                dtyp: self.g.node(w).typ(),
                                forward: true,
                            }
                        } else {
                            // closures lead forward; list them from the
                            // smaller endpoint only
                            if wpos < pos {
                                continue;
                            }
                            EdgeTuple {
                                src: pos,
                                dst: wpos,
                                etyp: edge.typ(),
                                dtyp: self.g.node(w).typ(),
                                forward: false,
                            }
                        };
                        out.push((e, t));
                    }
                }
            }
            CfKind::Depth => {
                let right = match self.rmpath.last() {
                    Some(&p) => p,
                    None => return,
                };
                for &p in &self.rmpath {
                    let v = self.inv[p];
                    for &e in self.g.incident(v) {
                        if self.used.contains(e) {
                            continue;
                        }
                        let edge = self.g.edge(e);
                        let w = edge.other(v);
                        let wpos = self.map[w];
                        if wpos == usize::MAX {
                            out.push((
                                e,
                                EdgeTuple {
                                    src: p,
                                    dst: self.inv.len(),
                                    etyp: edge.typ(),
                                    dtyp: self.g.node(w).typ(),
                                    forward: true,
                                },
                            ));
                        } else if p == right && self.rmpath.contains(&wpos) {
                            out.push((
                                e,
                                EdgeTuple {
                                    src: p,
                                    dst: wpos,
                                    etyp: edge.typ(),
                                    dtyp: self.g.node(w).typ(),
                                    forward: false,
                                },
                            ));
                        }
                    }
                }
            }
        }
    }

    /// Extend the current prefix recursively, tracking the best word.
    ///
    /// The prefix is only ever extended by a minimal candidate tuple, so any
    /// completed sequence is a candidate minimum; ties branch.
    fn search(&mut self, depth: usize) {
        if self.seq.len() == self.g.edge_count() {
            // complete ordering
            match seq_cmp(self.kind, &self.seq, &self.best) {
                Ordering::Less => {
                    self.best = self.seq.clone();
                    self.best_edges = self.eseq.clone();
                    self.best_orders.clear();
                    self.best_orders.push(self.inv.clone());
                }
                Ordering::Equal => {
                    self.best_orders.push(self.inv.clone());
                }
                Ordering::Greater => {}
            }
            self.complete = true;
            return;
        }
        let mut cands = Vec::new();
        self.candidates(&mut cands);
        if cands.is_empty() {
            // disconnected remainder cannot happen for fragments
            return;
        }
        let mut min = cands[0].1;
        for &(_, t) in &cands[1..] {
            if cmp_tuple(self.kind, &t, &min) == Ordering::Less {
                min = t;
            }
        }
        // bound against the best word found so far
        if self.complete {
            let k = self.seq.len();
            match cmp_tuple(self.kind, &min, &self.best[k]) {
                Ordering::Greater => return,
                _ => {}
            }
        }
        let ties: Vec<usize> = cands
            .iter()
            .enumerate()
            .filter(|(_, (_, t))| cmp_tuple(self.kind, t, &min) == Ordering::Equal)
            .map(|(i, _)| i)
            .collect();
        for ci in ties {
            let (e, t) = cands[ci];
            self.push_edge(e, t);
            self.search(depth + 1);
            self.pop_edge(e, t);
        }
    }

    fn push_edge(&mut self, e: usize, t: EdgeTuple) {
        self.used.insert(e);
        self.seq.push(t);
        self.eseq.push(e);
        if t.forward {
            let edge = self.g.edge(e);
            let far = if self.map[edge.src()] == usize::MAX {
                edge.src()
            } else {
                edge.dst()
            };
            let pos = self.map_node(far);
            debug_assert_eq!(pos, t.dst);
            if self.kind == CfKind::Depth {
                while self.rmpath.last() != Some(&t.src) {
                    self.rmpath.pop();
                }
                self.rmpath.push(pos);
            }
        }
    }

    fn pop_edge(&mut self, e: usize, t: EdgeTuple) {
        self.used.set(e, false);
        self.seq.pop();
        self.eseq.pop();
        if t.forward {
            let v = self.inv[t.dst];
            self.unmap_node(v);
            if self.kind == CfKind::Depth {
                // rebuild the rightmost path from the remaining sequence
                self.rmpath = rmpath_of(&self.seq);
            }
        }
    }

    /// Run a search over all admissible roots.
    fn run_all_roots(&mut self) {
        let min_typ = self
            .g
            .nodes()
            .map(|n| n.typ())
            .min()
            .unwrap_or(0);
        self.best_root = min_typ;
        if self.g.node_count() == 0 {
            return;
        }
        if self.g.edge_count() == 0 {
            // single node: all minimal-type nodes are automorphic roots
            for (v, node) in self.g.nodes().enumerate() {
                if node.typ() == min_typ {
                    self.best_orders.push(vec![v]);
                }
            }
            self.complete = true;
            return;
        }
        for v in 0..self.g.node_count() {
            if self.g.node(v).typ() != min_typ {
                continue;
            }
            let pos = self.map_node(v);
            if self.kind == CfKind::Depth {
                self.rmpath.push(pos);
            }
            self.search(0);
            if self.kind == CfKind::Depth {
                self.rmpath.clear();
            }
            self.unmap_node(v);
        }
    }

    /// Run a search with the first `keep` edges of the current order (and
    /// the root) forced.
    fn run_fixed_prefix(&mut self, keep: usize) {
        let pos = self.map_node(0);
        if self.kind == CfKind::Depth {
            self.rmpath.push(pos);
        }
        self.best_root = self.g.node(0).typ();
        let prefix: Vec<EdgeTuple> = current_seq(self.g).into_iter().take(keep).collect();
        for (i, t) in prefix.iter().enumerate() {
            debug_assert!(self.map[t.src] != usize::MAX);
            self.push_edge(i, *t);
        }
        self.search(keep);
    }
}

/// Rightmost path (as word positions) of a tuple sequence.
pub(crate) fn rmpath_of(seq: &[EdgeTuple]) -> Vec<usize> {
    let mut path = vec![0];
    for t in seq {
        if t.forward {
            while path.last() != Some(&t.src) {
                path.pop();
            }
            path.push(t.dst);
        }
    }
    path
}

fn seq_cmp(kind: CfKind, a: &[EdgeTuple], b: &[EdgeTuple]) -> Ordering {
    if b.is_empty() && !a.is_empty() {
        return Ordering::Less;
    }
    for (x, y) in a.iter().zip(b.iter()) {
        match cmp_tuple(kind, x, y) {
            Ordering::Equal => {}
            ord => return ord,
        }
    }
    a.len().cmp(&b.len())
}

/// A canonical form, selectable at run time.
///
/// The trait is a thin capability layer over the shared search engine; the
/// two implementations differ only in their [`CfKind`].
pub trait CanonicalForm {
    /// The concrete form.
    fn kind(&self) -> CfKind;

    /// A short name for diagnostics.
    fn describe(&self) -> &'static str;

    /// Test whether the graph's current order is canonical.
    ///
    /// Returns [`Canonicity::Canonic`] and fills every node's orbit with the
    /// smallest position it takes over all automorphisms of the canonical
    /// word; [`Canonicity::PrunableAt`] signals that the divergence from the
    /// canonical word lies within the first `fixed` edges.
    fn is_canonic(&self, g: &mut Graph, fixed: usize) -> Canonicity {
        let kind = self.kind();
        let mut b = Builder::new(g, kind);
        b.run_all_roots();
        let cur_root = if g.node_count() == 0 {
            0
        } else {
            g.node(0).typ()
        };
        if cur_root != b.best_root {
            return if fixed > 0 {
                Canonicity::PrunableAt
            } else {
                Canonicity::NonCanonic
            };
        }
        let cur = current_seq(g);
        let mut diff = None;
        for (i, (x, y)) in cur.iter().zip(b.best.iter()).enumerate() {
            if cmp_tuple(kind, x, y) != Ordering::Equal {
                diff = Some(i);
                break;
            }
        }
        match diff {
            None => {
                let orders = std::mem::take(&mut b.best_orders);
                drop(b);
                // record automorphism orbits: the smallest position each
                // node reaches over all orderings that spell the word
                for node in 0..g.node_count() {
                    g.nodes[node].orbit = node;
                }
                for order in &orders {
                    for (pos, &v) in order.iter().enumerate() {
                        if pos < g.nodes[v].orbit {
                            g.nodes[v].orbit = pos;
                        }
                    }
                }
                Canonicity::Canonic
            }
            Some(i) if i < fixed => Canonicity::PrunableAt,
            Some(_) => Canonicity::NonCanonic,
        }
    }

    /// Reorder the movable suffix of the graph into canonical order,
    /// keeping the first `keep` edges fixed (`keep < 0` frees everything,
    /// including the root).
    ///
    /// Returns the `(node_map, edge_map)` permutations (`map[old] = new`)
    /// when the graph changed, `None` when it was already in order.
    fn make_canonic(&self, g: &mut Graph, keep: isize) -> Option<(Vec<usize>, Vec<usize>)> {
        let kind = self.kind();
        let mut b = Builder::new(g, kind);
        if keep < 0 {
            b.run_all_roots();
        } else {
            b.run_fixed_prefix(keep as usize);
        }
        if b.best_orders.is_empty() {
            return None;
        }
        let order = b.best_orders[0].clone();
        let eorder = b.best_edges.clone();
        let best = b.best.clone();
        drop(b);
        if g.edge_count() == 0 {
            // single node graphs are trivially in order
            return None;
        }
        let identity = order.iter().enumerate().all(|(pos, &v)| pos == v)
            && eorder.iter().enumerate().all(|(pos, &e)| pos == e);
        if identity {
            // still normalize edge orientations to the word
            orient_edges(g, &best, &eorder);
            return None;
        }
        let mut node_map = vec![0usize; g.node_count()];
        for (pos, &v) in order.iter().enumerate() {
            node_map[v] = pos;
        }
        let mut edge_map = vec![0usize; g.edge_count()];
        for (pos, &e) in eorder.iter().enumerate() {
            edge_map[e] = pos;
        }
        g.permute(&node_map, &edge_map);
        orient_edges_inplace(g, &best);
        Some((node_map, edge_map))
    }
}

/// Set every edge's `(src, dst)` to the word tuple, given the edge order
/// `eorder[pos] = old edge id` while the graph still has its old order.
fn orient_edges(g: &mut Graph, best: &[EdgeTuple], eorder: &[usize]) {
    for (pos, &e) in eorder.iter().enumerate() {
        let t = best[pos];
        g.edges[e].src = t.src;
        g.edges[e].dst = t.dst;
    }
}

/// Same, but after the permutation was applied (edge `i` holds tuple `i`).
fn orient_edges_inplace(g: &mut Graph, best: &[EdgeTuple]) {
    for (i, t) in best.iter().enumerate() {
        g.edges[i].src = t.src;
        g.edges[i].dst = t.dst;
    }
}

/// Maximum-source (breadth-first) canonical form.
#[derive(Clone, Copy, Debug, Default)]
pub struct BreadthCf {
    /// Use the variant with the destination index promoted before the
    /// destination type.
    pub promote_dst: bool,
}

impl CanonicalForm for BreadthCf {
    fn kind(&self) -> CfKind {
        if self.promote_dst {
            CfKind::Breadth2
        } else {
            CfKind::Breadth1
        }
    }

    fn describe(&self) -> &'static str {
        if self.promote_dst {
            "breadth/max-source (dst promoted)"
        } else {
            "breadth/max-source"
        }
    }
}

/// Rightmost-path (depth-first) canonical form.
#[derive(Clone, Copy, Debug, Default)]
pub struct DepthCf;

impl CanonicalForm for DepthCf {
    fn kind(&self) -> CfKind {
        CfKind::Depth
    }

    fn describe(&self) -> &'static str {
        "depth/rightmost-path"
    }
}

/// Construct the canonical form for a kind.
pub fn form_for(kind: CfKind) -> Box<dyn CanonicalForm> {
    match kind {
        CfKind::Breadth1 => Box::new(BreadthCf { promote_dst: false }),
        CfKind::Breadth2 => Box::new(BreadthCf { promote_dst: true }),
        CfKind::Depth => Box::new(DepthCf),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labeled_path(types: &[u32]) -> Graph {
        let mut g = Graph::new();
        let n: Vec<usize> = types.iter().map(|&t| g.add_node(t)).collect();
        for w in n.windows(2) {
            g.add_edge(w[0], w[1], 0);
        }
        g
    }

    #[test]
    fn path_rooted_at_min_type_is_canonic() {
        // 0-1-2 rooted at the type-0 end is the canonical order
        let mut g = labeled_path(&[0, 1, 2]);
        let cf = BreadthCf::default();
        assert_eq!(cf.is_canonic(&mut g, 0), Canonicity::Canonic);
    }

    #[test]
    fn path_rooted_at_max_type_is_not_canonic() {
        let mut g = labeled_path(&[2, 1, 0]);
        let cf = BreadthCf::default();
        assert_ne!(cf.is_canonic(&mut g, 0), Canonicity::Canonic);
    }

    #[test]
    fn make_canonic_fixes_bad_root() {
        let mut g = labeled_path(&[2, 1, 0]);
        let cf = BreadthCf::default();
        let maps = cf.make_canonic(&mut g, -1);
        assert!(maps.is_some());
        assert_eq!(cf.is_canonic(&mut g, 0), Canonicity::Canonic);
        assert_eq!(g.node(0).typ(), 0);
    }

    #[test]
    fn symmetric_path_has_orbits() {
        let mut g = labeled_path(&[0, 1, 0]);
        // canonical order roots at an end node
        let cf = BreadthCf::default();
        cf.make_canonic(&mut g, -1);
        assert_eq!(cf.is_canonic(&mut g, 0), Canonicity::Canonic);
        // both type-0 end nodes lie in one orbit
        let ends: Vec<usize> = (0..3).filter(|&v| g.node(v).typ() == 0).collect();
        assert_eq!(ends.len(), 2);
        let o0 = g.node(ends[0]).orbit();
        let o1 = g.node(ends[1]).orbit();
        assert_eq!(o0, o1.min(o0));
        assert_eq!(g.node(ends[1]).orbit(), g.node(ends[0]).orbit());
    }

    #[test]
    fn triangle_all_orbits_equal() {
        let mut g = Graph::new();
        let n: Vec<usize> = (0..3).map(|_| g.add_node(0)).collect();
        g.add_edge(n[0], n[1], 0);
        g.add_edge(n[0], n[2], 0);
        g.add_edge(n[1], n[2], 0);
        let cf = BreadthCf::default();
        assert_eq!(cf.is_canonic(&mut g, 0), Canonicity::Canonic);
        assert!((0..3).all(|v| g.node(v).orbit() == 0));
    }

    #[test]
    fn breadth_variants_agree_on_canonic_path() {
        let mut g = labeled_path(&[0, 0, 1]);
        let b1 = BreadthCf { promote_dst: false };
        let b2 = BreadthCf { promote_dst: true };
        b1.make_canonic(&mut g, -1);
        assert_eq!(b1.is_canonic(&mut g, 0), Canonicity::Canonic);
        let mut g2 = labeled_path(&[0, 0, 1]);
        b2.make_canonic(&mut g2, -1);
        assert_eq!(b2.is_canonic(&mut g2, 0), Canonicity::Canonic);
    }

    #[test]
    fn depth_form_canonic_path() {
        let mut g = labeled_path(&[0, 1, 2]);
        let cf = DepthCf;
        assert_eq!(cf.is_canonic(&mut g, 0), Canonicity::Canonic);
        let mut g2 = labeled_path(&[2, 1, 0]);
        assert_ne!(cf.is_canonic(&mut g2, 0), Canonicity::Canonic);
        assert!(cf.make_canonic(&mut g2, -1).is_some());
        assert_eq!(cf.is_canonic(&mut g2, 0), Canonicity::Canonic);
    }

    #[test]
    fn fixed_prefix_divergence_is_prunable() {
        // order the path from the wrong end; the divergence is at the root
        // resp. the first edge, inside any fixed prefix
        let mut g = labeled_path(&[2, 1, 0]);
        let cf = BreadthCf::default();
        assert_eq!(cf.is_canonic(&mut g, 2), Canonicity::PrunableAt);
    }

    #[test]
    fn word_layout() {
        let g = labeled_path(&[5, 7]);
        let w = make_word(&g, CfKind::Breadth1);
        assert_eq!(w, vec![5, 0, 0, 7, 1]);
    }
}
