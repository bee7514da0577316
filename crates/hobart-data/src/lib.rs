#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/hobart/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod error;
pub mod extract;
pub mod finnhub;
pub mod store;
pub mod types;

pub use error::{DataError, Result};
pub use extract::{ExtractedSeries, ExtractorConfig, MetricExtractor};
pub use finnhub::{
    ApiKey, FinancialSource, FinnhubClient, ProfileData, RawObservation, SeriesPayload,
};
pub use store::{
    CompanyPolicy, CompanyRecord, CompanyUpsert, ExistingPeriodPolicy, SqliteStore, StoreStats,
    UpsertReport,
};
pub use types::{
    Cadence, CompanyProfile, FEATURE_METRICS, FeatureRow, Metric, MetricValues, PeriodMetric,
    PeriodRecord,
};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
