//! The reported fragment set does not depend on the canonical form.

mod common;

use common::{descriptions, mine_named, path};
use submine::canon::CfKind;
use submine::config::{Config, Mode};
use submine::graph::Graph;

fn hosts() -> Vec<Graph> {
    // a branched host mined twice
    let make = || {
        let mut g = path(&[0, 1, 2]);
        let d = g.add_node(3);
        g.add_edge(1, d, 0);
        g
    };
    vec![make(), make()]
}

fn with_cf(cf: CfKind) -> Config {
    Config {
        mode: Mode::EDGE | Mode::PR_CANONIC | Mode::NORMFORM,
        cf,
        norm_cf: CfKind::Breadth1,
        s_min: 2.0,
        ..Config::default()
    }
}

#[test]
fn breadth_variants_agree() {
    let names = &["A", "B", "C", "D"];
    let (_, a) = mine_named(with_cf(CfKind::Breadth1), names, hosts(), vec![]);
    let (_, b) = mine_named(with_cf(CfKind::Breadth2), names, hosts(), vec![]);
    assert_eq!(descriptions(&a), descriptions(&b));
}

#[test]
fn depth_agrees_with_breadth() {
    let names = &["A", "B", "C", "D"];
    let (_, a) = mine_named(with_cf(CfKind::Breadth1), names, hosts(), vec![]);
    let (_, d) = mine_named(with_cf(CfKind::Depth), names, hosts(), vec![]);
    assert_eq!(descriptions(&a), descriptions(&d));
}

#[test]
fn every_fragment_reported_once_per_form() {
    for cf in [CfKind::Breadth1, CfKind::Breadth2, CfKind::Depth] {
        let (_, frags) = mine_named(with_cf(cf), &["A", "B", "C", "D"], hosts(), vec![]);
        let mut seen = descriptions(&frags);
        let n = seen.len();
        seen.dedup();
        assert_eq!(seen.len(), n, "{cf:?} reported a fragment twice");
    }
}

#[test]
fn normalized_output_is_stable() {
    // with NORMFORM the description of a fragment is the same however the
    // search found it
    let names = &["A", "B", "C", "D"];
    let (_, a) = mine_named(with_cf(CfKind::Depth), names, hosts(), vec![]);
    let star = a
        .iter()
        .find(|f| f.nodes == 4)
        .expect("full star reported");
    assert_eq!(star.description, "A-B(-C)-D");
}
