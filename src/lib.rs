//! **submine** mines frequent connected substructures from a database of
//! attributed, undirected graphs.
//!
//! Every input graph carries typed nodes and typed edges and belongs to a
//! *focus* or *complement* group, decided by a threshold on a numeric value.
//! The [`Miner`](miner::Miner) enumerates every connected subgraph occurring
//! in at least `s_min` focus graphs and at most `s_max` complement graphs,
//! each exactly once, by extending fragments only in ways a canonical form
//! admits. Ring and variable-length chain extensions, several support
//! measures (graph count, minimum image, overlap-graph independent sets)
//! and a pipeline of pruning rules (support, perfect extension, equivalent
//! siblings, canonical form or repository, closedness) are built in.
//!
//! ```
//! use submine::config::Config;
//! use submine::graph::Graph;
//! use submine::miner::Miner;
//! use submine::report::CollectReporter;
//!
//! // two identical two-node graphs
//! let make = || {
//!     let mut g = Graph::new();
//!     let a = g.add_node(0);
//!     let b = g.add_node(1);
//!     g.add_edge(a, b, 0);
//!     g
//! };
//! let mut miner = Miner::new(Config::default()).unwrap();
//! miner.add_graph("first", 0.0, make());
//! miner.add_graph("second", 0.0, make());
//! let mut out = CollectReporter::new();
//! let stats = miner.mine(&mut out).unwrap();
//! assert_eq!(stats.reported, out.fragments.len());
//! ```

pub mod canon;
pub mod config;
pub mod db;
pub mod embed;
pub mod error;
pub mod fragment;
pub mod graph;
pub mod index;
pub mod miner;
pub mod repo;
pub mod report;
pub mod support;
pub mod types;

pub use canon::{BreadthCf, CanonicalForm, Canonicity, CfKind, DepthCf};
pub use config::{Config, Mode};
pub use db::Database;
pub use embed::{Embedding, Group};
pub use error::{CapacityError, ConfigError, Error, ParseError};
pub use fragment::{FragFlags, Fragment};
pub use graph::{Edge, Graph, Node};
pub use miner::{Miner, Stats};
pub use report::{CollectReporter, FragmentReport, Reporter, WriteReporter};
pub use support::SupportKind;
pub use types::TypeRegistry;
