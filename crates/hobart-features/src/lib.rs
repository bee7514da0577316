#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/hobart/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod dataset;
pub mod deriver;
pub mod error;
pub mod export;
pub mod frame;
pub mod series;
pub mod window;

pub use dataset::{TimeSplit, complete, labeled};
pub use deriver::{FeatureConfig, FeatureDeriver};
pub use error::{FeatureError, Result};
pub use export::write_csv;
pub use frame::{FEATURE_COLUMNS, feature_frame};
pub use series::PeriodSeries;
