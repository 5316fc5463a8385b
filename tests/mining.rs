//! End-to-end mining over small hand-built databases.

mod common;

use common::{descriptions, mine_named, path};
use submine::config::{Config, Mode};
use submine::graph::Graph;

fn edge_only() -> Config {
    Config {
        mode: Mode::EDGE | Mode::PR_CANONIC,
        s_min: 2.0,
        ..Config::default()
    }
}

#[test]
fn two_identical_paths_report_all_subpaths() {
    // two focus graphs A-B-C, s_min = 2
    let (stats, frags) = mine_named(
        edge_only(),
        &["A", "B", "C"],
        vec![path(&[0, 1, 2]), path(&[0, 1, 2])],
        vec![],
    );
    assert_eq!(
        descriptions(&frags),
        vec!["A", "A-B", "A-B-C", "B", "B-C", "C"]
    );
    assert!(frags.iter().all(|f| f.supp_focus == 2 && f.supp_compl == 0));
    assert_eq!(stats.reported, 6);
}

#[test]
fn closed_filter_keeps_only_maximal_path() {
    let mut config = edge_only();
    config.mode |= Mode::CLOSED;
    let (_, frags) = mine_named(
        config,
        &["A", "B", "C"],
        vec![path(&[0, 1, 2]), path(&[0, 1, 2])],
        vec![],
    );
    assert_eq!(descriptions(&frags), vec!["A-B-C"]);
    assert_eq!(frags[0].supp_focus, 2);
}

#[test]
fn seeded_search_with_growing_hosts() {
    // A-B-C, A-B-C-D, A-B-C-D with s_min = 3, seeded at A
    let mut config = edge_only();
    config.s_min = 3.0;
    config.seed = Some(Graph::single(0));
    let hosts = || {
        vec![
            path(&[0, 1, 2]),
            path(&[0, 1, 2, 3]),
            path(&[0, 1, 2, 3]),
        ]
    };
    let (_, frags) = mine_named(config.clone(), &["A", "B", "C", "D"], hosts(), vec![]);
    assert_eq!(descriptions(&frags), vec!["A", "A-B", "A-B-C"]);
    assert!(frags.iter().all(|f| f.supp_focus == 3));

    config.mode |= Mode::CLOSED;
    let (_, frags) = mine_named(config, &["A", "B", "C", "D"], hosts(), vec![]);
    assert_eq!(descriptions(&frags), vec!["A-B-C"]);
}

#[test]
fn complement_support_filters_reports() {
    // three A-B in the focus, three A-C in the complement, s_max = 0:
    // A itself occurs in the complement and must not be reported
    let mut config = edge_only();
    config.s_min = 3.0;
    config.s_max = 0;
    let (_, frags) = mine_named(
        config,
        &["A", "B", "C"],
        vec![path(&[0, 1]), path(&[0, 1]), path(&[0, 1])],
        vec![path(&[0, 2]), path(&[0, 2]), path(&[0, 2])],
    );
    assert_eq!(descriptions(&frags), vec!["A-B", "B"]);
    for f in &frags {
        assert_eq!(f.supp_focus, 3);
        assert_eq!(f.supp_compl, 0);
        assert!((f.rel_focus - 100.0).abs() < 1e-9);
    }
}

#[test]
fn embedding_free_levels_report_the_same_set() {
    let base = edge_only();
    let hosts = || vec![path(&[0, 1, 2]), path(&[0, 1, 2])];
    let (_, direct) = mine_named(base.clone(), &["A", "B", "C"], hosts(), vec![]);
    let lifted = Config {
        emblvl: 2,
        ..base
    };
    let (_, via_cover) = mine_named(lifted, &["A", "B", "C"], hosts(), vec![]);
    assert_eq!(descriptions(&direct), descriptions(&via_cover));
}

#[test]
fn size_bounds_limit_reports() {
    let config = Config {
        min_size: 2,
        max_size: 2,
        ..edge_only()
    };
    let (_, frags) = mine_named(
        config,
        &["A", "B", "C"],
        vec![path(&[0, 1, 2]), path(&[0, 1, 2])],
        vec![],
    );
    assert_eq!(descriptions(&frags), vec!["A-B", "B-C"]);
    assert!(frags.iter().all(|f| f.nodes == 2));
}

#[test]
fn reports_carry_host_names() {
    let (_, frags) = mine_named(
        edge_only(),
        &["A", "B"],
        vec![path(&[0, 1]), path(&[0, 1])],
        vec![],
    );
    let ab = frags.iter().find(|f| f.description == "A-B").unwrap();
    assert_eq!(ab.hosts, vec!["f0", "f1"]);
    assert!(ab.id >= 1);
}

#[test]
fn cancellation_aborts_cleanly() {
    use submine::miner::Miner;
    use submine::report::CollectReporter;

    let mut miner = Miner::new(edge_only()).unwrap();
    miner.add_graph("a", 0.0, path(&[0, 1]));
    miner.add_graph("b", 0.0, path(&[0, 1]));
    miner.stop_flag().store(true, std::sync::atomic::Ordering::Relaxed);
    let mut out = CollectReporter::new();
    let stats = miner.mine(&mut out).unwrap();
    assert!(stats.aborted);
    assert_eq!(out.fragments.len(), 0);
}
