//! Fold observations into one row per period.

use super::observations::Observation;
use crate::types::{Metric, PeriodRecord};
use chrono::NaiveDate;
use std::collections::{BTreeMap, BTreeSet};

/// Pivot observations into one record per canonical period, ascending.
///
/// Every period in `periods` yields exactly one record even when no observation carries a value
/// for it. Observations outside `periods` are ignored. When the same `(period, metric)` pair
/// appears more than once the last one in `observations` wins.
pub fn pivot(observations: &[Observation], periods: &BTreeSet<NaiveDate>) -> Vec<PeriodRecord> {
    let mut rows: BTreeMap<NaiveDate, PeriodRecord> = periods
        .iter()
        .map(|period| (*period, PeriodRecord::new(*period)))
        .collect();

    for observation in observations {
        if let Some(row) = rows.get_mut(&observation.period) {
            row.values.set(observation.metric, observation.value);
        }
    }

    rows.into_values().collect()
}

/// Flatten records back into observations, one per metric per row.
pub fn flatten(rows: &[PeriodRecord]) -> Vec<Observation> {
    rows.iter()
        .flat_map(|row| {
            Metric::ALL.into_iter().map(move |metric| Observation {
                period: row.period,
                metric,
                value: row.values.get(metric),
            })
        })
        .collect()
}
