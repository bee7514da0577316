//! Error types for feature derivation.

use chrono::NaiveDate;
use thiserror::Error;

/// Result type for feature operations.
pub type Result<T> = std::result::Result<T, FeatureError>;

/// Errors that can occur while building series or deriving features.
#[derive(Debug, Error)]
pub enum FeatureError {
    /// Periods are not strictly ascending
    #[error("Period at index {index} ({current}) does not follow {previous}")]
    Unordered {
        /// Position of the offending row
        index: usize,
        /// Period of the preceding row
        previous: NaiveDate,
        /// Period of the offending row
        current: NaiveDate,
    },

    /// The same period appears twice
    #[error("Duplicate period {0}")]
    DuplicatePeriod(NaiveDate),

    /// Rows belong to different symbols or cadences
    #[error("Series mixes {expected} with {found}")]
    MixedSeries {
        /// Symbol and cadence of the first row
        expected: String,
        /// Symbol and cadence of the offending row
        found: String,
    },

    /// Invalid configuration
    #[error("Invalid feature configuration: {0}")]
    InvalidConfig(String),

    /// Invalid split fraction
    #[error("Invalid train fraction: {0} (must be between 0 and 1)")]
    InvalidFraction(f64),

    /// DataFrame error
    #[error("DataFrame error: {0}")]
    Frame(#[from] polars::prelude::PolarsError),

    /// CSV error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
