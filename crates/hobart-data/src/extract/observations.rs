//! Flattening of the per-metric series into observations.

use super::pivot::pivot;
use crate::finnhub::{RawObservation, SeriesPayload};
use crate::types::{Cadence, FEATURE_METRICS, Metric, PeriodRecord};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Date format used by the upstream series.
const PERIOD_FORMAT: &str = "%Y-%m-%d";

/// A single `(period, metric, value)` data point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// Period end date
    pub period: NaiveDate,
    /// Metric the value belongs to
    pub metric: Metric,
    /// Reported value, absent when upstream sent null
    pub value: Option<f64>,
}

/// An observation dropped because its period or value could not be read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MalformedRecord {
    /// Metric the observation belonged to
    pub metric: Metric,
    /// Period string as received
    pub raw_period: String,
    /// Parse failure
    pub reason: String,
}

/// Which metrics to extract and which of them define the period set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractorConfig {
    metrics: Vec<Metric>,
    anchors: Vec<Metric>,
}

impl ExtractorConfig {
    /// Build a config. Anchors are always extracted, so they are added to `metrics` when missing.
    pub fn new(metrics: impl IntoIterator<Item = Metric>, anchors: impl IntoIterator<Item = Metric>) -> Self {
        let mut metrics: Vec<Metric> = metrics.into_iter().collect();
        let mut seen: BTreeSet<Metric> = BTreeSet::new();
        metrics.retain(|m| seen.insert(*m));

        let mut anchors: Vec<Metric> = anchors.into_iter().collect();
        let mut seen_anchor: BTreeSet<Metric> = BTreeSet::new();
        anchors.retain(|m| seen_anchor.insert(*m));
        for anchor in &anchors {
            if seen.insert(*anchor) {
                metrics.push(*anchor);
            }
        }

        Self { metrics, anchors }
    }

    /// Extracted metrics.
    pub fn metrics(&self) -> &[Metric] {
        &self.metrics
    }

    /// Anchor metrics.
    pub fn anchors(&self) -> &[Metric] {
        &self.anchors
    }
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self::new(Metric::ALL, FEATURE_METRICS.iter().copied())
    }
}

/// Flattened observations of one cadence.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Extraction {
    /// Observations in payload order (metric by metric, source order within a metric)
    pub observations: Vec<Observation>,
    /// Union of the periods reported by the anchor metrics
    pub periods: BTreeSet<NaiveDate>,
    /// Observations dropped for a malformed period or value
    pub dropped: Vec<MalformedRecord>,
}

/// Pivoted rows of one cadence.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractedSeries {
    /// Cadence the rows belong to
    pub cadence: Option<Cadence>,
    /// One record per period, ascending
    pub rows: Vec<PeriodRecord>,
    /// Observations dropped for a malformed period
    pub dropped: Vec<MalformedRecord>,
}

/// Turns a [`SeriesPayload`] into per-period records.
#[derive(Debug, Clone, Default)]
pub struct MetricExtractor {
    config: ExtractorConfig,
}

impl MetricExtractor {
    /// Create an extractor.
    pub const fn new(config: ExtractorConfig) -> Self {
        Self { config }
    }

    /// Active configuration.
    pub const fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    /// Flatten one cadence of the payload.
    ///
    /// A missing cadence yields an empty extraction. Observations with an unparseable period or a
    /// non-numeric value are dropped, logged, and reported in [`Extraction::dropped`].
    pub fn extract_observations(&self, payload: &SeriesPayload, cadence: Cadence) -> Extraction {
        let mut extraction = Extraction::default();
        let Some(series) = payload.cadence(cadence) else {
            return extraction;
        };

        for metric in self.config.metrics() {
            let Some(entries) = series.get(metric.series_key()) else {
                continue;
            };
            let is_anchor = self.config.anchors().contains(metric);

            for entry in entries {
                match parse_entry(entry) {
                    Ok((period, value)) => {
                        if is_anchor {
                            extraction.periods.insert(period);
                        }
                        extraction.observations.push(Observation {
                            period,
                            metric: *metric,
                            value,
                        });
                    }
                    Err(reason) => {
                        let raw_period = entry.raw_period();
                        tracing::warn!(
                            metric = %metric,
                            period = %raw_period,
                            %cadence,
                            "dropping malformed observation: {}",
                            reason
                        );
                        extraction.dropped.push(MalformedRecord {
                            metric: *metric,
                            raw_period,
                            reason,
                        });
                    }
                }
            }
        }

        extraction
    }

    /// Extract and pivot one cadence into ascending per-period records.
    pub fn extract(&self, payload: &SeriesPayload, cadence: Cadence) -> ExtractedSeries {
        let extraction = self.extract_observations(payload, cadence);
        ExtractedSeries {
            cadence: Some(cadence),
            rows: pivot(&extraction.observations, &extraction.periods),
            dropped: extraction.dropped,
        }
    }
}

/// Parse the period and value of one entry, or explain why it is unusable.
fn parse_entry(entry: &RawObservation) -> Result<(NaiveDate, Option<f64>), String> {
    let text = entry
        .period_str()
        .ok_or_else(|| format!("period is not a string: {}", entry.raw_period()))?;
    let period = NaiveDate::parse_from_str(text.trim(), PERIOD_FORMAT).map_err(|e| e.to_string())?;
    let value = entry
        .value()
        .map_err(|raw| format!("value is not a number: {raw}"))?;
    Ok((period, value))
}
