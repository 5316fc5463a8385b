//! Embeddings: concrete occurrences of a subgraph in a host graph.
//!
//! An embedding maps every node and edge *role* of a fragment's subgraph to
//! a node and edge of the host. The matcher is a VF-style backtracking
//! search over the subgraph's edges in order; since a fragment's edge array
//! is kept in canonical-form order, every edge finds at least one mapped
//! endpoint when it is processed.

use fixedbitset::FixedBitSet;

use crate::graph::Graph;
use crate::types::{edge_matches, node_matches};

/// The database group a host graph belongs to.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Group {
    /// Graphs whose fragments are sought.
    Focus = 0,
    /// Graphs whose fragments are to be avoided.
    Compl = 1,
}

impl Group {
    /// The group's support-array index.
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }
}

/// One occurrence of a subgraph in a host graph.
///
/// `nodes[i]` is the host node playing role `i`, `edges[j]` the host edge
/// playing role `j`. A *packed* embedding drops the role arrays and only
/// records that the host contains at least one occurrence; the concrete
/// occurrences can be regenerated with [`embed`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Embedding {
    /// Index of the host graph in the database.
    pub graph: usize,
    /// Group tag of the host graph.
    pub group: Group,
    /// Host node per subgraph node role; empty when packed.
    pub nodes: Vec<usize>,
    /// Host edge per subgraph edge role; empty when packed.
    pub edges: Vec<usize>,
}

impl Embedding {
    /// A packed placeholder embedding for `graph`.
    pub fn packed(graph: usize, group: Group) -> Self {
        Embedding {
            graph,
            group,
            nodes: Vec::new(),
            edges: Vec::new(),
        }
    }

    /// Whether this is a packed placeholder.
    #[inline]
    pub fn is_packed(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }
}

/// Backtracking state of the subgraph matcher.
struct Matcher<'a> {
    host: &'a Graph,
    sub: &'a Graph,
    /// subgraph node role -> host node (usize::MAX = unmapped)
    node_map: Vec<usize>,
    /// subgraph edge role -> host edge
    edge_map: Vec<usize>,
    used_node: FixedBitSet,
    used_edge: FixedBitSet,
}

impl<'a> Matcher<'a> {
    fn new(host: &'a Graph, sub: &'a Graph) -> Self {
        Matcher {
            host,
            sub,
            node_map: vec![usize::MAX; sub.node_count()],
            edge_map: vec![usize::MAX; sub.edge_count()],
            used_node: FixedBitSet::with_capacity(host.node_count()),
            used_edge: FixedBitSet::with_capacity(host.edge_count()),
        }
    }

    /// Match subgraph edges `at..`, calling `found` for every complete
    /// mapping. `found` returns `false` to stop the search (existence test).
    fn match_edges<F>(&mut self, at: usize, found: &mut F) -> bool
    where
        F: FnMut(&[usize], &[usize]) -> bool,
    {
        if at == self.sub.edge_count() {
            return found(&self.node_map, &self.edge_map);
        }
        let se = self.sub.edge(at);
        let (s_role, d_role, styp) = (se.src(), se.dst(), se.typ());
        let s_host = self.node_map[s_role];
        let d_host = self.node_map[d_role];
        debug_assert!(
            s_host != usize::MAX || d_host != usize::MAX,
            "edge order must keep the subgraph prefix connected"
        );
        // anchor at a mapped endpoint; the other endpoint is free or closes
        let (far_role, anchor_host) = if s_host != usize::MAX {
            (d_role, s_host)
        } else {
            (s_role, d_host)
        };
        let far_host = self.node_map[far_role];
        let far_typ = self.sub.node(far_role).typ();

        for &he in self.host.incident(anchor_host) {
            let edge = self.host.edge(he);
            // incident lists are sorted by edge type; past it nothing fits
            if edge.typ() > styp {
                break;
            }
            if self.used_edge.contains(he) || !edge_matches(styp, edge.typ()) {
                continue;
            }
            let w = edge.other(anchor_host);
            if far_host != usize::MAX {
                // ring closure within the mapped prefix
                if w != far_host {
                    continue;
                }
                self.used_edge.insert(he);
                self.edge_map[at] = he;
                let go_on = self.match_edges(at + 1, found);
                self.edge_map[at] = usize::MAX;
                self.used_edge.set(he, false);
                if !go_on {
                    return false;
                }
            } else {
                if self.used_node.contains(w) || !node_matches(far_typ, self.host.node(w).typ()) {
                    continue;
                }
                self.used_node.insert(w);
                self.used_edge.insert(he);
                self.node_map[far_role] = w;
                self.edge_map[at] = he;
                let go_on = self.match_edges(at + 1, found);
                self.edge_map[at] = usize::MAX;
                self.node_map[far_role] = usize::MAX;
                self.used_edge.set(he, false);
                self.used_node.set(w, false);
                if !go_on {
                    return false;
                }
            }
        }
        true
    }

    /// Run the full search, trying every host node for root role 0.
    fn run<F>(&mut self, mut found: F)
    where
        F: FnMut(&[usize], &[usize]) -> bool,
    {
        let root_typ = self.sub.node(0).typ();
        for v in 0..self.host.node_count() {
            if !node_matches(root_typ, self.host.node(v).typ()) {
                continue;
            }
            self.node_map[0] = v;
            self.used_node.insert(v);
            let go_on = self.match_edges(0, &mut found);
            self.used_node.set(v, false);
            self.node_map[0] = usize::MAX;
            if !go_on {
                return;
            }
        }
    }
}

/// All embeddings of `sub` into the host graph `graph` (database index
/// `graph_id`, group `group`).
pub fn embed(host: &Graph, graph_id: usize, group: Group, sub: &Graph) -> Vec<Embedding> {
    let mut out = Vec::new();
    Matcher::new(host, sub).run(|nodes, edges| {
        out.push(Embedding {
            graph: graph_id,
            group,
            nodes: nodes.to_vec(),
            edges: edges.to_vec(),
        });
        true
    });
    out
}

/// Whether `host` contains at least one embedding of `sub`.
pub fn contains(host: &Graph, sub: &Graph) -> bool {
    let mut hit = false;
    Matcher::new(host, sub).run(|_, _| {
        hit = true;
        false
    });
    hit
}

/// All one-edge extensions of `emb` matching the given signature.
///
/// `dst_role` is `None` for a new-node extension of type `node_type`;
/// otherwise a ring-closing host edge towards the host node of `dst_role`
/// is sought. Returns `(host_edge, new_host_node)` pairs.
pub fn extend(
    host: &Graph,
    emb: &Embedding,
    src_role: usize,
    dst_role: Option<usize>,
    edge_type: u32,
    node_type: u32,
) -> Vec<(usize, Option<usize>)> {
    debug_assert!(!emb.is_packed());
    let mut out = Vec::new();
    let anchor = emb.nodes[src_role];
    for &he in host.incident(anchor) {
        let edge = host.edge(he);
        if edge.typ() > edge_type {
            break;
        }
        if !edge_matches(edge_type, edge.typ()) || emb.edges.contains(&he) {
            continue;
        }
        let w = edge.other(anchor);
        match dst_role {
            Some(d) => {
                if emb.nodes[d] == w {
                    out.push((he, None));
                }
            }
            None => {
                if !emb.nodes.contains(&w) && node_matches(node_type, host.node(w).typ()) {
                    out.push((he, Some(w)));
                }
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

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
    fn single_node_embeddings() {
        let host = path(&[0, 1, 0]);
        let sub = Graph::single(0);
        let embs = embed(&host, 0, Group::Focus, &sub);
        assert_eq!(embs.len(), 2);
        assert_eq!(embs[0].nodes, vec![0]);
        assert_eq!(embs[1].nodes, vec![2]);
    }

    #[test]
    fn path_into_path() {
        let host = path(&[0, 1, 0]);
        let mut sub = Graph::new();
        let a = sub.add_node(0);
        let b = sub.add_node(1);
        sub.add_edge(a, b, 0);
        sub.prepare();
        let embs = embed(&host, 0, Group::Focus, &sub);
        // 0-1 and 2-1
        assert_eq!(embs.len(), 2);
        assert!(contains(&host, &sub));
    }

    #[test]
    fn symmetric_path_has_two_embeddings() {
        let host = path(&[0, 0, 0]);
        let sub = path(&[0, 0, 0]);
        let embs = embed(&host, 0, Group::Focus, &sub);
        // the path maps onto itself in both directions
        assert_eq!(embs.len(), 2);
    }

    #[test]
    fn triangle_into_triangle() {
        let mut host = Graph::new();
        let n: Vec<usize> = (0..3).map(|_| host.add_node(0)).collect();
        host.add_edge(n[0], n[1], 0);
        host.add_edge(n[1], n[2], 0);
        host.add_edge(n[0], n[2], 0);
        host.prepare();
        // subgraph in canonical-ish edge order: 0-1, 0-2, 1-2 (closure last)
        let mut sub = Graph::new();
        let m: Vec<usize> = (0..3).map(|_| sub.add_node(0)).collect();
        sub.add_edge(m[0], m[1], 0);
        sub.add_edge(m[0], m[2], 0);
        sub.add_edge(m[1], m[2], 0);
        sub.prepare();
        let embs = embed(&host, 0, Group::Focus, &sub);
        // 6 automorphisms of the triangle
        assert_eq!(embs.len(), 6);
    }

    #[test]
    fn no_embedding_on_type_mismatch() {
        let host = path(&[0, 1, 0]);
        let sub = path(&[1, 1]);
        assert!(!contains(&host, &sub));
        assert!(embed(&host, 0, Group::Focus, &sub).is_empty());
    }

    #[test]
    fn wildcard_node_matches_all() {
        use crate::types::WILDCARD;
        let host = path(&[0, 1, 2]);
        let mut sub = Graph::new();
        let a = sub.add_node(1);
        let b = sub.add_node(WILDCARD);
        sub.add_edge(a, b, 0);
        sub.prepare();
        let embs = embed(&host, 0, Group::Focus, &sub);
        // the wildcard end matches both neighbors of the middle node
        assert_eq!(embs.len(), 2);
    }

    #[test]
    fn extend_finds_new_node_and_closure() {
        let mut host = Graph::new();
        let n: Vec<usize> = (0..3).map(|_| host.add_node(0)).collect();
        host.add_edge(n[0], n[1], 0);
        host.add_edge(n[1], n[2], 0);
        host.add_edge(n[0], n[2], 0);
        host.prepare();
        let emb = Embedding {
            graph: 0,
            group: Group::Focus,
            nodes: vec![0, 1],
            edges: vec![0],
        };
        let fresh = extend(&host, &emb, 1, None, 0, 0);
        assert_eq!(fresh, vec![(1, Some(2))]);
        let emb2 = Embedding {
            graph: 0,
            group: Group::Focus,
            nodes: vec![0, 1, 2],
            edges: vec![0, 1],
        };
        let closing = extend(&host, &emb2, 0, Some(2), 0, 0);
        assert_eq!(closing, vec![(2, None)]);
    }
}
