#![allow(dead_code)]

use submine::config::Config;
use submine::graph::Graph;
use submine::miner::{Miner, Stats};
use submine::report::{CollectReporter, FragmentReport};
use submine::types::TypeRegistry;

/// A path graph with the given node types, all edges of type 0.
pub fn path(types: &[u32]) -> Graph {
    let mut g = Graph::new();
    let nodes: Vec<usize> = types.iter().map(|&t| g.add_node(t)).collect();
    for w in nodes.windows(2) {
        g.add_edge(w[0], w[1], 0);
    }
    g
}

/// A cycle of `len` nodes of one type, edges of one type.
pub fn cycle(len: usize, node_typ: u32, edge_typ: u32) -> Graph {
    let mut g = Graph::new();
    let nodes: Vec<usize> = (0..len).map(|_| g.add_node(node_typ)).collect();
    for i in 0..len {
        g.add_edge(nodes[i], nodes[(i + 1) % len], edge_typ);
    }
    g
}

/// Run a full mining pass over focus graphs (value 0.0) and complement
/// graphs (value 1.0), with names resolved through `names`.
pub fn mine_named(
    config: Config,
    names: &[&str],
    focus: Vec<Graph>,
    compl: Vec<Graph>,
) -> (Stats, Vec<FragmentReport>) {
    let mut miner = Miner::new(config).expect("valid configuration");
    miner.set_registries(TypeRegistry::fixed(names.iter().copied()), TypeRegistry::new());
    for (i, g) in focus.into_iter().enumerate() {
        miner.add_graph(format!("f{i}"), 0.0, g);
    }
    for (i, g) in compl.into_iter().enumerate() {
        miner.add_graph(format!("c{i}"), 1.0, g);
    }
    let mut out = CollectReporter::new();
    let stats = miner.mine(&mut out).expect("mining succeeds");
    (stats, out.fragments)
}

/// The reported descriptions, sorted for set comparison.
pub fn descriptions(frags: &[FragmentReport]) -> Vec<String> {
    let mut out: Vec<String> = frags.iter().map(|f| f.description.clone()).collect();
    out.sort();
    out
}
