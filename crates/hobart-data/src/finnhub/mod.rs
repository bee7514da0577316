//! Finnhub data fetching.
//!
//! This module provides access to the two Finnhub endpoints the pipeline needs:
//! - `/stock/profile2` for the company profile
//! - `/stock/metric?metric=all` for the per-metric quarterly and annual series
//!
//! # Example
//!
//! ```no_run
//! use hobart_data::finnhub::{FinancialSource, FinnhubClient};
//! use hobart_data::types::Cadence;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = FinnhubClient::from_env()?;
//!     let profile = client.fetch_profile("MSFT").await?;
//!     println!("{:?}", profile.name);
//!
//!     let series = client.fetch_financial_series("MSFT").await?;
//!     println!("{:?}", series.metric_keys(Cadence::Quarterly));
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod payload;

use crate::error::Result;
use std::future::Future;

pub use client::{ApiKey, FinnhubClient, RetryPolicy};
pub use payload::{ProfileData, RawObservation, SeriesPayload};

/// Upstream source of company profiles and financial series.
///
/// Implementations are expected to have absorbed transient failures such as HTTP 429 before
/// returning. Any error returned is treated as fatal for that symbol only.
pub trait FinancialSource {
    /// Fetch the company profile for a symbol.
    fn fetch_profile(&self, symbol: &str) -> impl Future<Output = Result<ProfileData>> + Send;

    /// Fetch the per-metric time series for a symbol.
    fn fetch_financial_series(
        &self,
        symbol: &str,
    ) -> impl Future<Output = Result<SeriesPayload>> + Send;
}
