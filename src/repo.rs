//! Repository of already-seen fragments.
//!
//! When canonical-form pruning is disabled, duplicate search-tree branches
//! are cut by remembering every processed subgraph in a hash table keyed by
//! a cheap structural hash; collisions are resolved by a mutual containment
//! test, which for equal sizes amounts to isomorphism.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use hashbrown::HashMap;

use crate::embed::contains;
use crate::graph::Graph;

/// Hash table of processed subgraphs.
#[derive(Default)]
pub struct Repository {
    table: HashMap<u64, Vec<Graph>>,
}

impl Repository {
    pub fn new() -> Self {
        Repository::default()
    }

    /// Number of stored fragments.
    pub fn len(&self) -> usize {
        self.table.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Record `sub`; returns `false` when an isomorphic subgraph was
    /// already present (a duplicate).
    pub fn insert(&mut self, sub: &Graph) -> bool {
        let key = structural_hash(sub);
        let bucket = self.table.entry(key).or_default();
        for old in bucket.iter() {
            if isomorphic(old, sub) {
                return false;
            }
        }
        let mut copy = sub.clone();
        copy.clear_marks();
        copy.prepare();
        bucket.push(copy);
        true
    }

    /// Whether an isomorphic subgraph was recorded.
    pub fn contains(&self, sub: &Graph) -> bool {
        match self.table.get(&structural_hash(sub)) {
            Some(bucket) => bucket.iter().any(|old| isomorphic(old, sub)),
            None => false,
        }
    }
}

/// Order-independent hash over node/edge counts, type multisets and the
/// degree sequence.
fn structural_hash(g: &Graph) -> u64 {
    let mut ntyps: Vec<u32> = g.nodes().map(|n| n.typ()).collect();
    ntyps.sort_unstable();
    let mut etyps: Vec<(u32, u32, u32)> = g
        .edges()
        .map(|e| {
            let (a, b) = (g.node(e.src()).typ(), g.node(e.dst()).typ());
            (a.min(b), e.typ(), a.max(b))
        })
        .collect();
    etyps.sort_unstable();
    let mut degs: Vec<usize> = g.nodes().map(|n| n.degree()).collect();
    degs.sort_unstable();

    let mut h = DefaultHasher::new();
    g.node_count().hash(&mut h);
    g.edge_count().hash(&mut h);
    ntyps.hash(&mut h);
    etyps.hash(&mut h);
    degs.hash(&mut h);
    h.finish()
}

/// Equal-size mutual containment, i.e. isomorphism.
fn isomorphic(a: &Graph, b: &Graph) -> bool {
    a.node_count() == b.node_count()
        && a.edge_count() == b.edge_count()
        && contains(a, b)
}
