//! Ring extension mining.

mod common;

use common::{cycle, mine_named};
use submine::config::{Config, Mode};

#[test]
fn benzene_reports_one_ring_fragment() {
    // two six-rings of one node type with uniform ring bonds; with ring
    // extensions the ring is found whole, never as partial paths
    let config = Config {
        mode: Mode::EDGE | Mode::RING | Mode::PR_CANONIC,
        s_min: 2.0,
        min_size: 6,
        rgmin: 5,
        rgmax: 6,
        ..Config::default()
    };
    let (stats, frags) = mine_named(
        config,
        &["C"],
        vec![cycle(6, 0, 1), cycle(6, 0, 1)],
        vec![],
    );
    assert_eq!(frags.len(), 1, "{:?}", frags);
    let ring = &frags[0];
    assert_eq!(ring.nodes, 6);
    assert_eq!(ring.edges, 6);
    assert_eq!(ring.supp_focus, 2);
    assert_eq!(ring.supp_compl, 0);
    assert_eq!(stats.reported, 1);
}

#[test]
fn ring_below_min_size_not_reported() {
    let config = Config {
        mode: Mode::EDGE | Mode::RING | Mode::PR_CANONIC,
        s_min: 2.0,
        min_size: 6,
        rgmin: 5,
        rgmax: 6,
        ..Config::default()
    };
    // squares are outside the marked ring window, so their edges are plain;
    // everything stays below the minimum size
    let (_, frags) = mine_named(config, &["C"], vec![cycle(4, 0, 1), cycle(4, 0, 1)], vec![]);
    assert!(frags.is_empty(), "{:?}", frags);
}

#[test]
fn close_rings_suppresses_open_ring_fragments() {
    // a ring with a pendant node: the pendant-plus-partial-ring fragments
    // carry open ring edges and are suppressed
    let make = || {
        let mut g = cycle(6, 0, 1);
        let v = g.add_node(1);
        g.add_edge(0, v, 0);
        g
    };
    let config = Config {
        mode: Mode::EDGE | Mode::RING | Mode::PR_CANONIC | Mode::CLOSERINGS,
        s_min: 2.0,
        min_size: 7,
        rgmin: 5,
        rgmax: 6,
        ..Config::default()
    };
    let (_, frags) = mine_named(config, &["C", "N"], vec![make(), make()], vec![]);
    // only the full ring with the pendant attached survives the filters
    assert_eq!(frags.len(), 1, "{:?}", frags);
    assert_eq!(frags[0].nodes, 7);
    assert_eq!(frags[0].edges, 7);
}

#[test]
fn ring_marking_within_window_only() {
    use submine::graph::Graph;

    let mut g = Graph::new();
    let n: Vec<usize> = (0..6).map(|_| g.add_node(0)).collect();
    for i in 0..6 {
        g.add_edge(n[i], n[(i + 1) % 6], 0);
    }
    assert_eq!(g.mark_rings(3, 4).unwrap(), 0);
    assert_eq!(g.mark_rings(6, 6).unwrap(), 1);
    assert!(g.edges().all(|e| e.rings() == 1));
}
