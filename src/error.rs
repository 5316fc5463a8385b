use std::io;

use thiserror::Error;

/// Recoverable error for a single input record.
///
/// A malformed record is reported together with its position in the input
/// stream and skipped; the remaining records are still processed.
#[derive(Debug, Error)]
pub enum ParseError {
    /// A type name was looked up in a fixed registry that does not know it.
    #[error("record {record}: unknown type name `{name}`")]
    UnknownType { record: usize, name: String },
    /// The record could not be decomposed into `(name, value, description)`.
    #[error("record {record}: malformed record: {reason}")]
    Malformed { record: usize, reason: String },
}

/// Invalid miner configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid option combination: {0}")]
    BadFlags(&'static str),
    /// The requested minimum support can never be met by the input.
    #[error("minimum focus support {s_min} exceeds the focus size {focus}")]
    UnreachableSupport { s_min: usize, focus: usize },
    #[error("invalid size bounds: min {min} > max {max}")]
    BadSizes { min: usize, max: usize },
    #[error("invalid ring size bounds: {rgmin}..={rgmax}")]
    BadRingSizes { rgmin: usize, rgmax: usize },
}

/// A graph exceeded a hard capacity limit.
///
/// Ring marking supports at most 64 rings per graph (one bit each). A graph
/// beyond that limit is mined without ring marking; the condition is reported
/// as a warning, not a fatal error.
#[derive(Debug, Error)]
pub enum CapacityError {
    #[error("graph has more than {max} rings in the requested size range")]
    TooManyRings { max: usize },
}

/// Fatal error of a mining run.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Io(#[from] io::Error),
    /// The stop flag was raised; the search unwound cooperatively.
    #[error("search canceled")]
    Canceled,
}
