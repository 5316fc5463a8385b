//! Pruning soundness: perfect extensions, canonical form vs repository,
//! duplicate freedom.

mod common;

use common::{descriptions, mine_named, path};
use submine::config::{Config, Mode};

fn base() -> Config {
    Config {
        mode: Mode::EDGE | Mode::PR_CANONIC,
        s_min: 2.0,
        ..Config::default()
    }
}

#[test]
fn perfect_extension_pruning_keeps_only_closed_whole() {
    // three identical X-Y-Z hosts: with full perfect-extension pruning and
    // closed filtering only the whole path remains
    let config = Config {
        mode: Mode::EDGE | Mode::PR_CANONIC | Mode::PR_PERFECT | Mode::CLOSED,
        s_min: 3.0,
        ..Config::default()
    };
    let hosts = vec![path(&[0, 1, 2]), path(&[0, 1, 2]), path(&[0, 1, 2])];
    let (stats, frags) = mine_named(config, &["X", "Y", "Z"], hosts, vec![]);
    assert_eq!(descriptions(&frags), vec!["X-Y-Z"]);
    assert!(stats.pruned_perfect > 0 || stats.fragments <= 6);
}

#[test]
fn perfect_pruning_preserves_closed_result_set() {
    // the closed result set must not depend on perfect-extension pruning
    let hosts = || {
        vec![
            path(&[0, 1, 2]),
            path(&[0, 1, 2, 1]),
            path(&[0, 1, 2]),
        ]
    };
    let names = &["X", "Y", "Z"];
    let with = Config {
        mode: Mode::EDGE | Mode::PR_CANONIC | Mode::PR_PERFECT | Mode::CLOSED,
        s_min: 2.0,
        ..Config::default()
    };
    let without = Config {
        mode: Mode::EDGE | Mode::PR_CANONIC | Mode::CLOSED,
        s_min: 2.0,
        ..Config::default()
    };
    let (_, a) = mine_named(with, names, hosts(), vec![]);
    let (_, b) = mine_named(without, names, hosts(), vec![]);
    assert_eq!(descriptions(&a), descriptions(&b));
}

#[test]
fn partial_perfect_pruning_matches_full_set_when_closed() {
    let hosts = || vec![path(&[0, 1, 2, 3]), path(&[0, 1, 2, 3])];
    let names = &["A", "B", "C", "D"];
    let partial = Config {
        mode: Mode::EDGE | Mode::PR_CANONIC | Mode::PR_PARTIAL | Mode::CLOSED,
        s_min: 2.0,
        ..Config::default()
    };
    let plain = Config {
        mode: Mode::EDGE | Mode::PR_CANONIC | Mode::CLOSED,
        s_min: 2.0,
        ..Config::default()
    };
    let (_, a) = mine_named(partial, names, hosts(), vec![]);
    let (_, b) = mine_named(plain, names, hosts(), vec![]);
    assert_eq!(descriptions(&a), descriptions(&b));
}

#[test]
fn repository_mode_matches_canonical_mode() {
    // branched hosts: a center with three typed leaves, twice
    let star = || {
        let mut g = path(&[1, 0]);
        let c = g.add_node(2);
        let d = g.add_node(3);
        g.add_edge(1, c, 0);
        g.add_edge(1, d, 0);
        g
    };
    let names = &["A", "B", "C", "D"];
    let canonic = base();
    let repo = Config {
        mode: Mode::EDGE,
        s_min: 2.0,
        ..Config::default()
    };
    let (_, a) = mine_named(canonic, names, vec![star(), star()], vec![]);
    let (stats_b, b) = mine_named(repo, names, vec![star(), star()], vec![]);
    assert_eq!(descriptions(&a), descriptions(&b));
    assert!(stats_b.pruned_duplicate > 0 || stats_b.pruned_canonic == 0);
}

#[test]
fn no_fragment_reported_twice() {
    let star = || {
        let mut g = path(&[0, 0]);
        let c = g.add_node(0);
        g.add_edge(0, c, 0);
        g
    };
    let (_, frags) = mine_named(base(), &["A"], vec![star(), star()], vec![]);
    let mut seen = descriptions(&frags);
    let before = seen.len();
    seen.dedup();
    assert_eq!(seen.len(), before, "duplicate fragment reported");
}

#[test]
fn orbit_pruning_keeps_result_set() {
    // symmetric host: orbits suppress equivalent extensions but must not
    // change the reported set
    let hosts = || vec![path(&[0, 1, 0]), path(&[0, 1, 0])];
    let with = Config {
        mode: Mode::EDGE | Mode::PR_CANONIC | Mode::ORBITS,
        s_min: 2.0,
        ..Config::default()
    };
    let (_, a) = mine_named(with, &["A", "B"], hosts(), vec![]);
    let (_, b) = mine_named(base(), &["A", "B"], hosts(), vec![]);
    assert_eq!(descriptions(&a), descriptions(&b));
}

#[test]
fn equivalent_sibling_pruning_keeps_result_set() {
    let hosts = || vec![path(&[0, 1, 0]), path(&[0, 1, 0])];
    let with = Config {
        mode: Mode::EDGE | Mode::PR_CANONIC | Mode::PR_EQUIV,
        s_min: 2.0,
        ..Config::default()
    };
    let (_, a) = mine_named(with, &["A", "B"], hosts(), vec![]);
    let (_, b) = mine_named(base(), &["A", "B"], hosts(), vec![]);
    assert_eq!(descriptions(&a), descriptions(&b));
}
