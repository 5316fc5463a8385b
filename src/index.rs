//! Extension-edge index for embedding-free search.
//!
//! When the search runs above the embedding level it cannot enumerate
//! extensions from concrete embeddings. Instead it consults this index of
//! all `(source type, edge type, destination type)` triples occurring in the
//! database, each with the maximum degree any source node of that type
//! reaches; a fragment node already at that degree cannot take the edge.

use crate::db::Database;

/// One aggregated extension triple.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Triple {
    pub src_typ: u32,
    pub etyp: u32,
    pub dst_typ: u32,
    /// Largest degree of any source node of `src_typ` incident to such an
    /// edge.
    pub max_degree: usize,
}

/// Sorted triple index over the whole database.
#[derive(Clone, Debug, Default)]
pub struct ExtensionIndex {
    triples: Vec<Triple>,
}

impl ExtensionIndex {
    /// Aggregate all edges of all database graphs, both directions.
    pub fn build(db: &Database) -> Self {
        let mut triples: Vec<Triple> = Vec::new();
        for entry in db.iter() {
            let g = &entry.graph;
            for e in g.edges() {
                for (a, b) in [(e.src(), e.dst()), (e.dst(), e.src())] {
                    let t = Triple {
                        src_typ: g.node(a).typ(),
                        etyp: e.typ(),
                        dst_typ: g.node(b).typ(),
                        max_degree: g.node(a).degree(),
                    };
                    match triples.iter_mut().find(|x| {
                        x.src_typ == t.src_typ && x.etyp == t.etyp && x.dst_typ == t.dst_typ
                    }) {
                        Some(x) => x.max_degree = x.max_degree.max(t.max_degree),
                        None => triples.push(t),
                    }
                }
            }
        }
        triples.sort_by_key(|t| (t.src_typ, t.etyp, t.dst_typ));
        ExtensionIndex { triples }
    }

    /// Number of distinct triples.
    pub fn len(&self) -> usize {
        self.triples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triples.is_empty()
    }

    /// All triples whose source type is `src_typ`.
    pub fn for_source(&self, src_typ: u32) -> &[Triple] {
        let lo = self.triples.partition_point(|t| t.src_typ < src_typ);
        let hi = self.triples.partition_point(|t| t.src_typ <= src_typ);
        &self.triples[lo..hi]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Graph;

    #[test]
    fn aggregates_triples_with_max_degree() {
        let mut db = Database::new();
        let mut g = Graph::new();
        let a = g.add_node(0);
        let b = g.add_node(1);
        let c = g.add_node(1);
        g.add_edge(a, b, 5);
        g.add_edge(a, c, 5);
        db.add("g".into(), 0.0, 0.5, false, g);
        let ix = ExtensionIndex::build(&db);
        // (0,5,1) and (1,5,0)
        assert_eq!(ix.len(), 2);
        let from_a = ix.for_source(0);
        assert_eq!(from_a.len(), 1);
        assert_eq!(from_a[0].dst_typ, 1);
        assert_eq!(from_a[0].max_degree, 2);
        let from_b = ix.for_source(1);
        assert_eq!(from_b[0].max_degree, 1);
        assert!(ix.for_source(7).is_empty());
    }
}
