//! Feature derivation over a [`PeriodSeries`].

use crate::error::{FeatureError, Result};
use crate::series::PeriodSeries;
use crate::window::{growth, lead, pct_change, trailing_mean};
use hobart_data::{Cadence, FeatureRow, Metric};
use polars::prelude::*;
use serde::{Deserialize, Serialize};

const EPS: &str = "eps";
const SALES: &str = "sales_per_share";

/// Window sizes used by [`FeatureDeriver`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureConfig {
    /// Moving-average window in periods (default: 4)
    pub window: usize,
    /// Year-over-year lag in periods (default: periods per year of the cadence)
    pub yoy_lag: usize,
    /// Target horizon in periods (default: 1)
    pub horizon: usize,
}

impl FeatureConfig {
    /// Defaults for a cadence: four-period average, one-year lag, next-period target.
    pub const fn for_cadence(cadence: Cadence) -> Self {
        Self {
            window: 4,
            yoy_lag: cadence.periods_per_year(),
            horizon: 1,
        }
    }

    /// Replace the moving-average window.
    #[must_use]
    pub const fn with_window(mut self, window: usize) -> Self {
        self.window = window;
        self
    }

    /// Check that every window is at least one period.
    pub fn validate(&self) -> Result<()> {
        if self.window == 0 {
            return Err(FeatureError::InvalidConfig(
                "window must be at least 1".to_string(),
            ));
        }
        if self.yoy_lag == 0 {
            return Err(FeatureError::InvalidConfig(
                "yoy_lag must be at least 1".to_string(),
            ));
        }
        if self.horizon == 0 {
            return Err(FeatureError::InvalidConfig(
                "horizon must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self::for_cadence(Cadence::Quarterly)
    }
}

/// Computes [`FeatureRow`]s from an ordered series.
///
/// Row `i` only reads rows `<= i` for features and row `i + horizon` for targets.
#[derive(Debug, Clone, Default)]
pub struct FeatureDeriver {
    config: FeatureConfig,
}

impl FeatureDeriver {
    /// Create a deriver with the given configuration.
    pub fn new(config: FeatureConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Active configuration.
    pub const fn config(&self) -> &FeatureConfig {
        &self.config
    }

    /// One feature row per period of the series, in period order.
    pub fn derive(&self, series: &PeriodSeries) -> Result<Vec<FeatureRow>> {
        let rows = series.rows();
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let column = |metric: Metric| -> Vec<Option<f64>> {
            rows.iter().map(|r| r.values.get(metric)).collect()
        };
        let base = DataFrame::new(vec![
            Column::from(Series::new(EPS.into(), column(Metric::Eps))),
            Column::from(Series::new(SALES.into(), column(Metric::SalesPerShare))),
        ])?;

        let lag = self.config.yoy_lag;
        let frame = base
            .lazy()
            .with_columns([
                trailing_mean(EPS, self.config.window).alias("eps_ma"),
                pct_change(SALES, lag).alias("sales_growth_yoy"),
                pct_change(EPS, lag).alias("eps_growth_yoy"),
                pct_change(SALES, 1).alias("sales_momentum_qoq"),
                pct_change(EPS, 1).alias("eps_momentum_qoq"),
                lead(EPS, self.config.horizon).alias("target_next_eps"),
            ])
            .with_columns([
                growth(col(EPS), col("target_next_eps")).alias("target_eps_growth"),
                col("target_next_eps").gt(col(EPS)).alias("target_direction"),
            ])
            .collect()?;

        let floats = |name: &str| -> Result<Vec<Option<f64>>> {
            Ok(frame.column(name)?.f64()?.into_iter().collect())
        };
        let eps_ma = floats("eps_ma")?;
        let sales_yoy = floats("sales_growth_yoy")?;
        let eps_yoy = floats("eps_growth_yoy")?;
        let sales_qoq = floats("sales_momentum_qoq")?;
        let eps_qoq = floats("eps_momentum_qoq")?;
        let next_eps = floats("target_next_eps")?;
        let next_growth = floats("target_eps_growth")?;
        let direction: Vec<Option<bool>> =
            frame.column("target_direction")?.bool()?.into_iter().collect();

        let features: Vec<FeatureRow> = rows
            .iter()
            .enumerate()
            .map(|(i, row)| FeatureRow {
                symbol: row.symbol.clone(),
                period: row.period,
                values: row.values,
                eps_ma: eps_ma[i],
                sales_growth_yoy: sales_yoy[i],
                eps_growth_yoy: eps_yoy[i],
                sales_momentum_qoq: sales_qoq[i],
                eps_momentum_qoq: eps_qoq[i],
                target_next_eps: next_eps[i],
                target_eps_growth: next_growth[i],
                target_direction: direction[i],
            })
            .collect();

        tracing::debug!(
            symbol = series.symbol().unwrap_or_default(),
            rows = features.len(),
            labeled = features.iter().filter(|f| f.has_target()).count(),
            "derived features"
        );

        Ok(features)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;
    use hobart_data::{MetricValues, PeriodMetric};
    use rstest::rstest;

    fn quarter(y: i32, q: u32, eps: Option<f64>, sales: Option<f64>) -> PeriodMetric {
        let (m, d) = match q {
            1 => (3, 31),
            2 => (6, 30),
            3 => (9, 30),
            _ => (12, 31),
        };
        PeriodMetric {
            symbol: "X".to_string(),
            period: NaiveDate::from_ymd_opt(y, m, d).unwrap(),
            period_type: Cadence::Quarterly,
            values: MetricValues {
                eps,
                sales_per_share: sales,
                ..Default::default()
            },
        }
    }

    fn two_years() -> PeriodSeries {
        PeriodSeries::new(vec![
            quarter(2022, 1, Some(1.0), Some(10.0)),
            quarter(2022, 2, Some(1.2), Some(11.0)),
            quarter(2022, 3, Some(0.8), Some(10.5)),
            quarter(2022, 4, Some(1.0), Some(12.0)),
            quarter(2023, 1, Some(1.5), Some(12.5)),
            quarter(2023, 2, None, Some(0.0)),
            quarter(2023, 3, Some(1.6), Some(13.0)),
            quarter(2023, 4, Some(2.0), Some(14.0)),
        ])
        .unwrap()
    }

    #[rstest]
    #[case(Cadence::Quarterly, 4)]
    #[case(Cadence::Annual, 1)]
    fn test_config_for_cadence(#[case] cadence: Cadence, #[case] lag: usize) {
        let config = FeatureConfig::for_cadence(cadence);
        assert_eq!(config.window, 4);
        assert_eq!(config.yoy_lag, lag);
        assert_eq!(config.horizon, 1);
    }

    #[test]
    fn test_invalid_config() {
        let config = FeatureConfig::default().with_window(0);
        assert!(FeatureDeriver::new(config).is_err());
        let config = FeatureConfig {
            horizon: 0,
            ..Default::default()
        };
        assert!(FeatureDeriver::new(config).is_err());
    }

    #[test]
    fn test_moving_average() {
        let rows = FeatureDeriver::default().derive(&two_years()).unwrap();
        assert!(rows[..3].iter().all(|r| r.eps_ma.is_none()));
        assert_relative_eq!(rows[3].eps_ma.unwrap(), 1.0, epsilon = 1e-12);
        assert_relative_eq!(rows[4].eps_ma.unwrap(), 1.125, epsilon = 1e-12);
        // 2023Q2 EPS is null, so every window containing it is null.
        assert!(rows[5..].iter().all(|r| r.eps_ma.is_none()));
    }

    #[test]
    fn test_year_over_year() {
        let rows = FeatureDeriver::default().derive(&two_years()).unwrap();
        assert!(rows[..4].iter().all(|r| r.eps_growth_yoy.is_none()));
        assert_relative_eq!(rows[4].eps_growth_yoy.unwrap(), 0.5);
        assert_relative_eq!(rows[4].sales_growth_yoy.unwrap(), 0.25);
        assert_eq!(rows[5].eps_growth_yoy, None);
        assert_relative_eq!(rows[7].eps_growth_yoy.unwrap(), 1.0);
    }

    #[test]
    fn test_momentum_zero_and_null_priors() {
        let rows = FeatureDeriver::default().derive(&two_years()).unwrap();
        assert_eq!(rows[0].eps_momentum_qoq, None);
        assert_relative_eq!(rows[1].eps_momentum_qoq.unwrap(), 0.2, epsilon = 1e-12);
        // Prior EPS null.
        assert_eq!(rows[6].eps_momentum_qoq, None);
        // Prior sales zero.
        assert_eq!(rows[6].sales_momentum_qoq, None);
        assert_relative_eq!(rows[5].sales_momentum_qoq.unwrap(), -1.0);
    }

    #[test]
    fn test_targets_do_not_leak() {
        let rows = FeatureDeriver::default().derive(&two_years()).unwrap();
        assert_eq!(rows[0].target_next_eps, Some(1.2));
        assert_eq!(rows[0].target_direction, Some(true));
        assert_eq!(rows[1].target_direction, Some(false));
        assert_relative_eq!(rows[3].target_eps_growth.unwrap(), 0.5);

        // Current EPS null: next EPS still known, growth and direction are not.
        assert_eq!(rows[5].target_next_eps, Some(1.6));
        assert_eq!(rows[5].target_eps_growth, None);
        assert_eq!(rows[5].target_direction, None);

        let last = rows.last().unwrap();
        assert_eq!(last.target_next_eps, None);
        assert_eq!(last.target_direction, None);
    }

    #[test]
    fn test_longer_horizon_nulls_tail() {
        let config = FeatureConfig {
            horizon: 2,
            ..Default::default()
        };
        let rows = FeatureDeriver::new(config).unwrap().derive(&two_years()).unwrap();
        assert_eq!(rows[0].target_next_eps, Some(0.8));
        assert!(rows[6..].iter().all(|r| r.target_next_eps.is_none()));
    }

    #[test]
    fn test_empty_series() {
        let series = PeriodSeries::new(Vec::new()).unwrap();
        assert!(FeatureDeriver::default().derive(&series).unwrap().is_empty());
    }
}
