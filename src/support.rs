//! Support measures.
//!
//! Beyond plain graph counting, a fragment's support can be computed from
//! its embeddings: the minimum per-role image size (MIN_IMAGE), or the size
//! of a maximum independent set on per-host *overlap graphs* whose nodes are
//! embeddings and whose edges join embeddings sharing host nodes (MIS_OLAP),
//! or sharing host nodes under different roles (MIS_HARM). All of these are
//! anti-monotone, unlike raw embedding counts.

use fixedbitset::FixedBitSet;

use crate::db::Database;
use crate::embed::Embedding;
use crate::fragment::Fragment;

/// How a fragment's support is measured.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SupportKind {
    /// Number of distinct host graphs (maintained incrementally).
    Graphs,
    /// Minimum over roles of the number of distinct host nodes per group.
    MinImage,
    /// Sum over hosts of the MIS size of the node-overlap graph.
    MisOlap {
        /// Exact branch-and-bound instead of the greedy lower bound.
        exact: bool,
    },
    /// Like `MisOlap`, but only *harmful* overlaps (same host node under
    /// different roles) count.
    MisHarm {
        /// Exact branch-and-bound instead of the greedy lower bound.
        exact: bool,
    },
}

/// Fill `frag.supp[0..2]` according to `kind`.
///
/// `MinImage` and the MIS kinds need concrete embeddings; packed hosts are
/// unpacked first and repacked afterwards with the given `maxepg`.
pub fn compute(frag: &mut Fragment, db: &Database, kind: SupportKind, maxepg: usize) {
    match kind {
        SupportKind::Graphs => {}
        SupportKind::MinImage => {
            let was_packed = frag.flags.contains(crate::fragment::FragFlags::PACKED);
            frag.unpack(db);
            let (focus, compl) = min_image(&frag.embs, frag.subgraph().node_count());
            frag.supp[0] = focus;
            frag.supp[1] = compl;
            if was_packed {
                frag.pack(maxepg);
            }
        }
        SupportKind::MisOlap { exact } | SupportKind::MisHarm { exact } => {
            let harmful = matches!(kind, SupportKind::MisHarm { .. });
            let was_packed = frag.flags.contains(crate::fragment::FragFlags::PACKED);
            frag.unpack(db);
            let (focus, compl) = mis_support(&frag.embs, harmful, exact);
            frag.supp[0] = focus;
            frag.supp[1] = compl;
            if was_packed {
                frag.pack(maxepg);
            }
        }
    }
}

/// Minimum image support per group.
fn min_image(embs: &[Embedding], roles: usize) -> (usize, usize) {
    let mut out = [usize::MAX; 2];
    for group in 0..2 {
        for role in 0..roles {
            let mut images: Vec<(usize, usize)> = embs
                .iter()
                .filter(|e| e.group.index() == group && !e.is_packed())
                .map(|e| (e.graph, e.nodes[role]))
                .collect();
            images.sort_unstable();
            images.dedup();
            out[group] = out[group].min(images.len());
        }
        if out[group] == usize::MAX {
            out[group] = 0;
        }
    }
    (out[0], out[1])
}

/// Sum of per-host MIS sizes, per group.
fn mis_support(embs: &[Embedding], harmful: bool, exact: bool) -> (usize, usize) {
    let mut out = [0usize; 2];
    let mut i = 0;
    while i < embs.len() {
        let g = embs[i].graph;
        let mut j = i;
        while j < embs.len() && embs[j].graph == g {
            j += 1;
        }
        let host_embs = &embs[i..j];
        let olap = OverlapGraph::build(host_embs, harmful);
        let size = if exact {
            olap.exact_mis()
        } else {
            olap.greedy_mis()
        };
        out[embs[i].group.index()] += size;
        i = j;
    }
    (out[0], out[1])
}

/// The overlap graph of one host's embeddings.
pub(crate) struct OverlapGraph {
    n: usize,
    adj: Vec<FixedBitSet>,
}

impl OverlapGraph {
    /// Build from the embeddings of a single host graph.
    pub(crate) fn build(embs: &[Embedding], harmful: bool) -> Self {
        let n = embs.len();
        let mut adj = vec![FixedBitSet::with_capacity(n); n];
        for a in 0..n {
            for b in a + 1..n {
                if overlaps(&embs[a], &embs[b], harmful) {
                    adj[a].insert(b);
                    adj[b].insert(a);
                }
            }
        }
        OverlapGraph { n, adj }
    }

    #[cfg(test)]
    pub(crate) fn from_edges(n: usize, edges: &[(usize, usize)]) -> Self {
        let mut adj = vec![FixedBitSet::with_capacity(n); n];
        for &(a, b) in edges {
            adj[a].insert(b);
            adj[b].insert(a);
        }
        OverlapGraph { n, adj }
    }

    fn degree(&self, v: usize, alive: &FixedBitSet) -> usize {
        self.adj[v].ones().filter(|&w| alive.contains(w)).count()
    }

    /// Select isolated nodes and leaves as forced MIS members, removing
    /// them (and leaf neighbors) until neither remains. Returns the number
    /// of nodes selected.
    fn reduce(&self, alive: &mut FixedBitSet) -> usize {
        let mut selected = 0;
        loop {
            let mut changed = false;
            for v in 0..self.n {
                if !alive.contains(v) {
                    continue;
                }
                match self.degree(v, alive) {
                    0 => {
                        alive.set(v, false);
                        selected += 1;
                        changed = true;
                    }
                    1 => {
                        let w = self
                            .adj[v]
                            .ones()
                            .find(|&w| alive.contains(w))
                            .expect("leaf has a neighbor");
                        alive.set(v, false);
                        alive.set(w, false);
                        selected += 1;
                        changed = true;
                    }
                    _ => {}
                }
            }
            if !changed {
                return selected;
            }
        }
    }

    /// Greedy MIS lower bound: safe reductions, then repeatedly take a
    /// minimum-degree node and drop its neighborhood.
    pub(crate) fn greedy_mis(&self) -> usize {
        let mut alive = FixedBitSet::with_capacity(self.n);
        alive.insert_range(..);
        let mut selected = self.reduce(&mut alive);
        loop {
            let mut pick = None;
            let mut best = usize::MAX;
            for v in alive.ones() {
                let d = self.degree(v, &alive);
                if d < best {
                    best = d;
                    pick = Some(v);
                }
            }
            let Some(v) = pick else {
                return selected;
            };
            selected += 1;
            let neighbors: Vec<usize> =
                self.adj[v].ones().filter(|&w| alive.contains(w)).collect();
            alive.set(v, false);
            for w in neighbors {
                alive.set(w, false);
            }
            selected += self.reduce(&mut alive);
        }
    }

    /// Exact MIS by branch and bound on a maximum-degree node.
    pub(crate) fn exact_mis(&self) -> usize {
        let mut alive = FixedBitSet::with_capacity(self.n);
        alive.insert_range(..);
        let mut best = self.greedy_mis();
        self.branch(alive, 0, &mut best);
        best
    }

    fn branch(&self, mut alive: FixedBitSet, have: usize, best: &mut usize) {
        let have = have + self.reduce(&mut alive);
        let remaining = alive.count_ones(..);
        if remaining == 0 {
            if have > *best {
                *best = have;
            }
            return;
        }
        if have + remaining <= *best {
            return;
        }
        // branch on a maximum-degree node: select it, or exclude it
        let v = alive
            .ones()
            .max_by_key(|&v| self.degree(v, &alive))
            .expect("nonempty");
        let mut selected = alive.clone();
        selected.set(v, false);
        for w in self.adj[v].ones() {
            selected.set(w, false);
        }
        self.branch(selected, have + 1, best);
        alive.set(v, false);
        self.branch(alive, have, best);
    }
}

/// Whether two embeddings overlap (share a host node), or harmfully overlap
/// (share a host node playing different roles).
fn overlaps(a: &Embedding, b: &Embedding, harmful: bool) -> bool {
    for (ra, &na) in a.nodes.iter().enumerate() {
        for (rb, &nb) in b.nodes.iter().enumerate() {
            if na == nb && (!harmful || ra != rb) {
                return true;
            }
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embed::embed;
    use crate::graph::Graph;

    fn path(types: &[u32]) -> Graph {
        let mut g = Graph::new();
        let n: Vec<usize> = types.iter().map(|&t| g.add_node(t)).collect();
        for w in n.windows(2) {
            g.add_edge(w[0], w[1], 0);
        }
        g.prepare();
        g
    }

    #[test]
    fn greedy_on_path_graph() {
        // path of 5 overlap nodes: MIS = 3
        let g = OverlapGraph::from_edges(5, &[(0, 1), (1, 2), (2, 3), (3, 4)]);
        assert_eq!(g.greedy_mis(), 3);
        assert_eq!(g.exact_mis(), 3);
    }

    #[test]
    fn exact_beats_greedy_never_smaller() {
        use rand::rngs::StdRng;
        use rand::{Rng, SeedableRng};
        let mut rng = StdRng::seed_from_u64(0x5eed);
        for _ in 0..50 {
            let n = rng.gen_range(2..10);
            let mut edges = Vec::new();
            for a in 0..n {
                for b in a + 1..n {
                    if rng.gen_bool(0.3) {
                        edges.push((a, b));
                    }
                }
            }
            let g = OverlapGraph::from_edges(n, &edges);
            let greedy = g.greedy_mis();
            let exact = g.exact_mis();
            assert!(exact >= greedy, "exact {exact} < greedy {greedy}");
            assert!(exact <= n);
        }
    }

    #[test]
    fn empty_overlap_graph_selects_all() {
        let g = OverlapGraph::from_edges(4, &[]);
        assert_eq!(g.greedy_mis(), 4);
        assert_eq!(g.exact_mis(), 4);
    }

    #[test]
    fn support_kinds_relate() {
        // one host 0-1-0-1 path; fragment 0-1 has three embeddings
        // (0,1), (2,1), (2,3) that overlap in a chain
        let mut db = Database::new();
        db.add("g".into(), 0.0, 0.5, false, path(&[0, 1, 0, 1]));
        let sub = path(&[0, 1]);
        let mut f = Fragment::with_subgraph(sub);
        let host = db.graph(0);
        for e in embed(&host.graph, 0, host.group, &f.sub) {
            f.add_embedding(e, 0, usize::MAX - 1);
        }
        assert_eq!(f.support().0, 1);
        compute(&mut f, &db, SupportKind::MisOlap { exact: true }, 0);
        let olap = f.support().0;
        assert_eq!(olap, 2);
        // every shared node is played by the same role here, so no overlap
        // is harmful and all three embeddings coexist
        compute(&mut f, &db, SupportKind::MisHarm { exact: true }, 0);
        let harm = f.support().0;
        assert_eq!(harm, 3);
        assert!(harm >= olap);
        compute(&mut f, &db, SupportKind::MinImage, 0);
        assert_eq!(f.support().0, 2);
    }

    #[test]
    fn min_image_counts_distinct_nodes_per_role() {
        let mut db = Database::new();
        db.add("g".into(), 0.0, 0.5, false, path(&[0, 1, 0]));
        let sub = path(&[0, 1]);
        let mut f = Fragment::with_subgraph(sub);
        let host = db.graph(0);
        for e in embed(&host.graph, 0, host.group, &f.sub) {
            f.add_embedding(e, 0, usize::MAX - 1);
        }
        // role 0 has images {0, 2}, role 1 only {1}
        compute(&mut f, &db, SupportKind::MinImage, 0);
        assert_eq!(f.support().0, 1);
    }
}
