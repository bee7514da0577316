//! Ordered per-symbol period series.

use crate::error::{FeatureError, Result};
use hobart_data::{Cadence, PeriodMetric};

/// Rows of one symbol and one cadence, strictly ascending by period.
///
/// Windowed features index rows by position, so the ordering is checked once here rather than
/// assumed by every computation.
#[derive(Debug, Clone, PartialEq)]
pub struct PeriodSeries {
    rows: Vec<PeriodMetric>,
}

impl PeriodSeries {
    /// Build a series from rows that are already in order.
    ///
    /// # Errors
    /// [`FeatureError::Unordered`] if a period does not follow its predecessor,
    /// [`FeatureError::DuplicatePeriod`] if a period repeats, and
    /// [`FeatureError::MixedSeries`] if rows disagree on symbol or cadence.
    pub fn new(rows: Vec<PeriodMetric>) -> Result<Self> {
        check_homogeneous(&rows)?;

        for (index, pair) in rows.windows(2).enumerate() {
            let (previous, current) = (pair[0].period, pair[1].period);
            if current == previous {
                return Err(FeatureError::DuplicatePeriod(current));
            }
            if current < previous {
                return Err(FeatureError::Unordered {
                    index: index + 1,
                    previous,
                    current,
                });
            }
        }

        Ok(Self { rows })
    }

    /// Sort rows by period, then build the series. Duplicate periods are still rejected.
    pub fn sorted(mut rows: Vec<PeriodMetric>) -> Result<Self> {
        rows.sort_by_key(|r| r.period);
        Self::new(rows)
    }

    /// Symbol of the series, `None` when empty.
    pub fn symbol(&self) -> Option<&str> {
        self.rows.first().map(|r| r.symbol.as_str())
    }

    /// Cadence of the series, `None` when empty.
    pub fn cadence(&self) -> Option<Cadence> {
        self.rows.first().map(|r| r.period_type)
    }

    /// Rows in period order.
    pub fn rows(&self) -> &[PeriodMetric] {
        &self.rows
    }

    /// Number of periods.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the series has no periods.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

fn check_homogeneous(rows: &[PeriodMetric]) -> Result<()> {
    let Some(first) = rows.first() else {
        return Ok(());
    };
    for row in &rows[1..] {
        if row.symbol != first.symbol || row.period_type != first.period_type {
            return Err(FeatureError::MixedSeries {
                expected: format!("{}/{}", first.symbol, first.period_type),
                found: format!("{}/{}", row.symbol, row.period_type),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use hobart_data::MetricValues;

    fn row(symbol: &str, month: u32, cadence: Cadence) -> PeriodMetric {
        PeriodMetric {
            symbol: symbol.to_string(),
            period: NaiveDate::from_ymd_opt(2023, month, 28).unwrap(),
            period_type: cadence,
            values: MetricValues::default(),
        }
    }

    #[test]
    fn test_new_accepts_ascending() {
        let series = PeriodSeries::new(vec![
            row("X", 3, Cadence::Quarterly),
            row("X", 6, Cadence::Quarterly),
        ])
        .unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series.symbol(), Some("X"));
        assert_eq!(series.cadence(), Some(Cadence::Quarterly));
    }

    #[test]
    fn test_new_rejects_unordered() {
        let err = PeriodSeries::new(vec![
            row("X", 6, Cadence::Quarterly),
            row("X", 3, Cadence::Quarterly),
        ])
        .unwrap_err();
        assert!(matches!(err, FeatureError::Unordered { index: 1, .. }));
    }

    #[test]
    fn test_sorted_reorders_but_rejects_duplicates() {
        let series = PeriodSeries::sorted(vec![
            row("X", 9, Cadence::Quarterly),
            row("X", 3, Cadence::Quarterly),
        ])
        .unwrap();
        assert_eq!(series.rows()[0].period.to_string(), "2023-03-28");

        let err = PeriodSeries::sorted(vec![
            row("X", 3, Cadence::Quarterly),
            row("X", 3, Cadence::Quarterly),
        ])
        .unwrap_err();
        assert!(matches!(err, FeatureError::DuplicatePeriod(_)));
    }

    #[test]
    fn test_mixed_series_rejected() {
        let err = PeriodSeries::new(vec![
            row("X", 3, Cadence::Quarterly),
            row("Y", 6, Cadence::Quarterly),
        ])
        .unwrap_err();
        assert!(matches!(err, FeatureError::MixedSeries { .. }));

        let err = PeriodSeries::new(vec![
            row("X", 3, Cadence::Quarterly),
            row("X", 6, Cadence::Annual),
        ])
        .unwrap_err();
        assert!(matches!(err, FeatureError::MixedSeries { .. }));
    }

    #[test]
    fn test_empty_series() {
        let series = PeriodSeries::new(Vec::new()).unwrap();
        assert!(series.is_empty());
        assert_eq!(series.symbol(), None);
    }
}
