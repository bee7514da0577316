#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/hobart/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod config;
pub mod error;
pub mod features;
pub mod pipeline;
pub mod summary;

// Re-export main types from sub-crates
pub use hobart_data as data;
pub use hobart_features as derivation;

pub use config::{DEFAULT_SYMBOLS, PipelineConfig, StoreLocation, parse_symbols};
pub use error::{PipelineError, Result};
pub use features::{features_for, features_for_all};
pub use pipeline::Pipeline;
pub use summary::{RunSummary, SymbolSummary};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
