//! Error types for reel math

use thiserror::Error;

/// Game configuration validation errors
///
/// Raised once, before any search iteration runs. None of these are retried.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Symbol alphabet is empty")]
    EmptyAlphabet,

    #[error("Alphabet has {symbols} symbols but {kinds} symbol kinds")]
    KindCount { symbols: usize, kinds: usize },

    #[error("Invalid grid: {0}")]
    InvalidGrid(&'static str),

    #[error("Variant {variant} does not support {feature}")]
    VariantMismatch {
        variant: &'static str,
        feature: &'static str,
    },

    #[error("No paylines defined")]
    EmptyPaylines,

    #[error("Payline {index} has {actual} positions, expected {expected} (one per column)")]
    PaylineLength {
        index: usize,
        expected: usize,
        actual: usize,
    },

    #[error("Payline {index} uses row {row} at column {column}, rows are 0..{rows}")]
    PaylineRow {
        index: usize,
        column: usize,
        row: u8,
        rows: u8,
    },

    #[error("Paytable has {actual} rows, expected {expected} (columns + 1)")]
    PaytableRows { expected: usize, actual: usize },

    #[error("Paytable row {row} has {actual} entries, expected {expected} (one per symbol)")]
    PaytableColumns {
        row: usize,
        expected: usize,
        actual: usize,
    },

    #[error("Wild bonus table has {actual} entries, expected {expected} (columns + 1)")]
    WildBonusLength { expected: usize, actual: usize },

    #[error("Bonus tiers require a bonus symbol in the alphabet")]
    MissingBonusSymbol,

    #[error("Bonus tier counts must be non-zero and strictly increasing")]
    BonusTierOrder,

    #[error("{targets} targets but the outcome vector has only {outcome_len} components")]
    TargetLength { targets: usize, outcome_len: usize },

    #[error("Target {index} has invalid tolerance {tolerance}")]
    TargetTolerance { index: usize, tolerance: f64 },

    #[error("{reel_length}^{columns} stop combinations overflow u64")]
    CombinationOverflow { reel_length: u16, columns: u8 },

    #[error("JSON error: {0}")]
    Json(String),
}

/// Reel math error type
#[derive(Error, Debug)]
pub enum ReelError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Malformed candidate: {0}")]
    MalformedCandidate(String),

    #[error("{combinations} stop combinations exceed the materialization limit of {limit}")]
    EnumerationTooLarge { combinations: u64, limit: u64 },
}

impl From<serde_json::Error> for ReelError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Result type alias
pub type ReelResult<T> = Result<T, ReelError>;
