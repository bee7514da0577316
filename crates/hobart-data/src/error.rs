//! Error types for data operations.

use chrono::NaiveDate;
use thiserror::Error;

/// Result type for data operations.
pub type Result<T> = std::result::Result<T, DataError>;

/// Errors that can occur during data operations.
#[derive(Debug, Error)]
pub enum DataError {
    /// Network error
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// A batch write was rolled back.
    #[error("Batch for {symbol} failed at {period:?} ({committed} rows committed): {source}")]
    BatchFailed {
        /// Symbol of the batch
        symbol: String,
        /// Period being written when the failure happened, if any
        period: Option<NaiveDate>,
        /// Rows that remain committed after the failure
        committed: usize,
        /// Underlying database error
        #[source]
        source: rusqlite::Error,
    },

    /// Data parsing error
    #[error("Data parsing error: {0}")]
    Parse(String),

    /// Missing data
    #[error("Missing data for {symbol}: {reason}")]
    MissingData {
        /// Symbol that was queried
        symbol: String,
        /// Reason for missing data
        reason: String,
    },

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Rate limit error
    #[error("Rate limit exceeded, please retry after {retry_after_ms}ms")]
    RateLimit {
        /// Milliseconds to wait before retrying
        retry_after_ms: u64,
    },

    /// Finnhub API error
    #[error("Finnhub API error: {0}")]
    Api(String),

    /// No API key configured
    #[error("Finnhub API key is not configured")]
    MissingApiKey,

    /// Invalid symbol
    #[error("Invalid symbol: {0}")]
    InvalidSymbol(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl DataError {
    /// Whether the error means the store itself is unusable rather than one record being bad.
    pub const fn is_persistence(&self) -> bool {
        matches!(self, Self::Database(_) | Self::BatchFailed { .. })
    }
}
