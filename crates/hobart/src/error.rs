//! Pipeline errors.

use hobart_data::DataError;
use hobart_features::FeatureError;
use thiserror::Error;

/// Result type for pipeline operations.
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Errors that stop a pipeline operation.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The store could not be opened or created
    #[error("Failed to open store at {location}: {source}")]
    StoreOpen {
        /// Where the store was expected
        location: String,
        /// Underlying error
        #[source]
        source: DataError,
    },

    /// Data error
    #[error(transparent)]
    Data(#[from] DataError),

    /// Feature derivation error
    #[error(transparent)]
    Feature(#[from] FeatureError),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Config(String),
}
