//! Error types for boostline.
//!
//! Errors are strongly typed with thiserror so callers can tell a broken
//! configuration from a broken report or a fatal simulation defect.

use crate::core::item::Item;
use thiserror::Error;

/// Failures raised while a run is simulating.
#[derive(Debug, Error)]
pub enum SimError {
    /// A purchase left a line with negative currency. Always a logic or
    /// configuration defect; never retried.
    #[error("line {line} has negative currency {currency} after buying {item}")]
    InvariantViolation { line: usize, item: Item, currency: f64 },

    /// A tracked value left the representable range during a tick.
    #[error("numeric overflow during tick {tick}")]
    NumericOverflow { tick: u64 },
}

/// Invalid scenario or ruleset, reported before any simulation work.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("no reference tables for {galaxies} galaxies")]
    UnsupportedGalaxies { galaxies: u8 },

    #[error("{boosts} boosts is past the last boost ({last}) for {galaxies} galaxies")]
    BoostsOutOfRange { boosts: u8, galaxies: u8, last: u8 },

    #[error("tier count {tiers} is outside 4..=8")]
    TierCount { tiers: usize },

    #[error("table '{table}' has {actual} entries, expected {expected}")]
    TableLength {
        table: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("'{field}' must be positive and finite, got {value}")]
    NonPositive { field: &'static str, value: f64 },

    #[error("win threshold must be at least one top tier purchase")]
    UnreachableWin,

    #[error("sacrifice step {step} must be in (0, 49)")]
    InvalidSacrificeStep { step: f64 },

    #[error("iteration cap {max_iterations} leaves no room for the two initial runs")]
    IterationCap { max_iterations: usize },
}

/// Malformed or incomplete report text.
#[derive(Debug, Error)]
pub enum ReportParseError {
    #[error("section '{section}' is missing")]
    MissingSection { section: &'static str },

    #[error("section '{section}' has a malformed line: {line}")]
    MalformedLine { section: &'static str, line: String },

    #[error("section '{section}' is not valid JSON: {source}")]
    InvalidJson {
        section: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid report pattern: {0}")]
    Pattern(#[from] regex::Error),
}

/// Umbrella error for library entry points.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Sim(#[from] SimError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    ReportParse(#[from] ReportParseError),

    #[error("failed to serialize report section: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias for boostline operations.
pub type Result<T> = std::result::Result<T, Error>;
