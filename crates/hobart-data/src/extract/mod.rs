//! Extraction of per-period records from the nested series payload.
//!
//! Extraction runs in two steps. [`MetricExtractor::extract_observations`] flattens the payload
//! into `(period, metric, value)` observations and collects the canonical period set from the
//! anchor metrics. [`pivot`] then folds those observations into one [`PeriodRecord`] per period.
//!
//! [`PeriodRecord`]: crate::types::PeriodRecord

pub mod observations;
pub mod pivot;

pub use observations::{
    Extraction, ExtractedSeries, ExtractorConfig, MalformedRecord, MetricExtractor, Observation,
};
pub use pivot::{flatten, pivot};
