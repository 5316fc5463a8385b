//! Miner configuration.

use bitflags::bitflags;

use crate::canon::CfKind;
use crate::error::ConfigError;
use crate::graph::Graph;
use crate::support::SupportKind;

bitflags! {
    /// Search mode flags.
    #[derive(Clone, Copy, Debug, Eq, PartialEq)]
    pub struct Mode: u32 {
        /// Single-edge extensions (default).
        const EDGE = 1 << 0;
        /// Ring extensions (requires ring marking).
        const RING = 1 << 1;
        /// Variable-length chain extensions (requires bridge marking).
        const CHAIN = 1 << 2;
        /// Equivalent ring variants.
        const EQVARS = 1 << 3;
        /// Use node orbits to suppress equivalent extensions.
        const ORBITS = 1 << 4;
        /// Node equivalence classes for the canonical extension test.
        const CLASSES = 1 << 5;
        /// Generate all extensions, disabling the CF restriction.
        const ALLEXTS = 1 << 6;
        /// Report only closed fragments.
        const CLOSED = 1 << 7;
        /// Suppress fragments containing open rings of marked sizes.
        const CLOSERINGS = 1 << 8;
        /// Merge ring extensions sharing their first edge.
        const MERGERINGS = 1 << 9;
        /// Prune fragments with unclosable rings.
        const PR_UNCLOSE = 1 << 10;
        /// Partial perfect-extension pruning (drop right siblings).
        const PR_PARTIAL = 1 << 11;
        /// Full perfect-extension pruning (follow only the perfect branch).
        const PR_PERFECT = 1 << 12;
        /// Equivalent-sibling pruning.
        const PR_EQUIV = 1 << 13;
        /// Canonical-form pruning (otherwise repository deduplication).
        const PR_CANONIC = 1 << 14;
        /// Unembed not-yet-recursed siblings to save memory.
        const UNEMBED = 1 << 15;
        /// Re-canonicalize output under a fixed normalization form.
        const NORMFORM = 1 << 16;
    }
}

impl Default for Mode {
    fn default() -> Self {
        Mode::EDGE | Mode::PR_CANONIC | Mode::PR_PERFECT | Mode::PR_EQUIV
    }
}

/// All parameters of a mining run.
#[derive(Clone, Debug)]
pub struct Config {
    pub mode: Mode,
    /// Canonical form steering the search.
    pub cf: CfKind,
    /// Canonical form used to normalize output descriptions (`NORMFORM`).
    pub norm_cf: CfKind,
    pub support: SupportKind,
    /// Minimum fragment size in nodes.
    pub min_size: usize,
    /// Maximum fragment size in nodes (`usize::MAX` = unbounded).
    pub max_size: usize,
    /// Ring size window for ring marking and ring extensions.
    pub rgmin: usize,
    pub rgmax: usize,
    /// Fragment size (in nodes) at which the search switches from covers to
    /// embeddings; 0 = embeddings from the start.
    pub emblvl: usize,
    /// Per-host embedding cap before packing; 0 = unlimited.
    pub maxepg: usize,
    /// Minimum focus support; values below 1 are a fraction of the focus
    /// group size.
    pub s_min: f64,
    /// Maximum complement support (absolute).
    pub s_max: usize,
    /// Group threshold on the graph value.
    pub threshold: f64,
    /// Swap the groups' sides of the threshold.
    pub invert: bool,
    /// Chain node and edge type (original base codes), for `CHAIN`.
    pub chain: Option<(u32, u32)>,
    /// Node types (original base codes) excluded from all fragments.
    pub excluded: Vec<u32>,
    /// Node types excluded as search seeds only.
    pub seed_excluded: Vec<u32>,
    /// Type masks `(node, edge, ring node, ring edge)` applied at setup.
    pub masks: Option<(u32, u32, u32, u32)>,
    /// Explicit seed subgraph instead of single-node seeds.
    pub seed: Option<Graph>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            mode: Mode::default(),
            cf: CfKind::Breadth1,
            norm_cf: CfKind::Breadth1,
            support: SupportKind::Graphs,
            min_size: 1,
            max_size: usize::MAX,
            rgmin: 3,
            rgmax: 8,
            emblvl: 0,
            maxepg: 0,
            s_min: 2.0,
            s_max: usize::MAX,
            threshold: 0.5,
            invert: false,
            chain: None,
            excluded: Vec::new(),
            seed_excluded: Vec::new(),
            masks: None,
            seed: None,
        }
    }
}

impl Config {
    /// Normalize the flag set and reject contradictory settings.
    pub fn validate(&mut self) -> Result<(), ConfigError> {
        if !self
            .mode
            .intersects(Mode::EDGE | Mode::RING | Mode::CHAIN)
        {
            return Err(ConfigError::BadFlags("no extension kind enabled"));
        }
        if self.min_size > self.max_size {
            return Err(ConfigError::BadSizes {
                min: self.min_size,
                max: self.max_size,
            });
        }
        if self.mode.contains(Mode::RING) && (self.rgmin < 3 || self.rgmin > self.rgmax) {
            return Err(ConfigError::BadRingSizes {
                rgmin: self.rgmin,
                rgmax: self.rgmax,
            });
        }
        if self.mode.contains(Mode::PR_PARTIAL) && self.mode.contains(Mode::PR_PERFECT) {
            return Err(ConfigError::BadFlags(
                "partial and full perfect-extension pruning are mutually exclusive",
            ));
        }
        if self.mode.contains(Mode::CHAIN) && self.chain.is_none() {
            return Err(ConfigError::BadFlags("chain mode without chain types"));
        }
        if self.mode.contains(Mode::CLASSES) {
            if !self.mode.contains(Mode::PR_CANONIC) {
                return Err(ConfigError::BadFlags(
                    "equivalence classes require canonical-form pruning",
                ));
            }
            // classes force equivalent-sibling pruning over all extensions
            // and rule out perfect-extension pruning
            self.mode |= Mode::PR_EQUIV | Mode::ALLEXTS;
            self.mode -= Mode::PR_PARTIAL | Mode::PR_PERFECT;
        }
        if self.mode.contains(Mode::RING)
            && self.mode.contains(Mode::PR_CANONIC)
            && !self.mode.contains(Mode::MERGERINGS)
        {
            self.mode |= Mode::EQVARS;
        }
        if self.mode.contains(Mode::CHAIN) {
            // chains need live embeddings throughout
            self.emblvl = 0;
        }
        if self.emblvl > 0 && self.mode.intersects(Mode::RING | Mode::CHAIN) {
            return Err(ConfigError::BadFlags(
                "embedding-free levels support single-edge extensions only",
            ));
        }
        Ok(())
    }

    /// Resolve the minimum focus support against the focus group size.
    pub fn abs_s_min(&self, focus: usize) -> usize {
        if self.s_min < 1.0 {
            (self.s_min * focus as f64).ceil() as usize
        } else {
            self.s_min.round() as usize
        }
        .max(1)
    }

    /// Whether bridges must be marked at setup.
    pub fn needs_bridges(&self) -> bool {
        self.mode
            .intersects(Mode::CHAIN | Mode::PR_PARTIAL | Mode::PR_PERFECT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_validates() {
        let mut c = Config::default();
        assert!(c.validate().is_ok());
    }

    #[test]
    fn perfect_modes_exclusive() {
        let mut c = Config::default();
        c.mode |= Mode::PR_PARTIAL | Mode::PR_PERFECT;
        assert!(c.validate().is_err());
    }

    #[test]
    fn classes_disable_perfect_pruning() {
        let mut c = Config::default();
        c.mode |= Mode::CLASSES;
        c.validate().unwrap();
        assert!(c.mode.contains(Mode::PR_EQUIV));
        assert!(c.mode.contains(Mode::ALLEXTS));
        assert!(!c.mode.contains(Mode::PR_PERFECT));
    }

    #[test]
    fn ring_canonic_forces_eqvars() {
        let mut c = Config::default();
        c.mode |= Mode::RING;
        c.mode -= Mode::PR_PERFECT;
        c.validate().unwrap();
        assert!(c.mode.contains(Mode::EQVARS));
        c.mode |= Mode::MERGERINGS;
        c.mode -= Mode::EQVARS;
        c.validate().unwrap();
        assert!(!c.mode.contains(Mode::EQVARS));
    }

    #[test]
    fn fractional_support_resolves() {
        let c = Config {
            s_min: 0.5,
            ..Config::default()
        };
        assert_eq!(c.abs_s_min(10), 5);
        assert_eq!(c.abs_s_min(3), 2);
        let c = Config {
            s_min: 3.0,
            ..Config::default()
        };
        assert_eq!(c.abs_s_min(10), 3);
    }
}
