//! Core row types shared by extraction, storage and feature derivation.
//!
//! The set of metrics is declared once here. The extractor, the store schema and the feature
//! deriver all read from [`Metric::ALL`] and [`FEATURE_METRICS`] instead of agreeing on column
//! names by convention.

use crate::error::{DataError, Result};
use chrono::NaiveDate;
use derive_more::Display;
use serde::{Deserialize, Serialize};

/// Reporting frequency of a metric series.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Cadence {
    /// Quarterly series
    #[display("quarterly")]
    Quarterly,
    /// Annual series
    #[display("annual")]
    Annual,
}

impl Cadence {
    /// Key used both in the API payload and in the `period_type` column.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Quarterly => "quarterly",
            Self::Annual => "annual",
        }
    }

    /// Parse from the payload / database representation.
    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "quarterly" => Ok(Self::Quarterly),
            "annual" => Ok(Self::Annual),
            _ => Err(DataError::Parse(format!("Invalid period type: {}", s))),
        }
    }

    /// Number of periods that make up one year at this cadence.
    pub const fn periods_per_year(&self) -> usize {
        match self {
            Self::Quarterly => 4,
            Self::Annual => 1,
        }
    }
}

/// A financial metric tracked per reporting period.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Metric {
    /// Sales per share, used as the revenue proxy
    #[display("sales_per_share")]
    SalesPerShare,
    /// Earnings per share
    #[display("eps")]
    Eps,
    /// Net margin
    #[display("net_margin")]
    NetMargin,
    /// Gross margin
    #[display("gross_margin")]
    GrossMargin,
    /// Total debt to equity
    #[display("total_debt_to_equity")]
    TotalDebtToEquity,
    /// Current ratio
    #[display("current_ratio")]
    CurrentRatio,
}

/// Metrics the feature deriver reads. Extractor anchors default to this set so every period a
/// feature could be computed for gets a row.
pub const FEATURE_METRICS: &[Metric] = &[Metric::Eps, Metric::SalesPerShare];

impl Metric {
    /// Every stored metric, in column order.
    pub const ALL: [Self; 6] = [
        Self::SalesPerShare,
        Self::Eps,
        Self::NetMargin,
        Self::GrossMargin,
        Self::TotalDebtToEquity,
        Self::CurrentRatio,
    ];

    /// Series name in the Finnhub `series` payload.
    pub const fn series_key(&self) -> &'static str {
        match self {
            Self::SalesPerShare => "salesPerShare",
            Self::Eps => "eps",
            Self::NetMargin => "netMargin",
            Self::GrossMargin => "grossMargin",
            Self::TotalDebtToEquity => "totalDebtToEquity",
            Self::CurrentRatio => "currentRatio",
        }
    }

    /// Column name in `financial_metrics` and `model_features`.
    pub const fn column(&self) -> &'static str {
        match self {
            Self::SalesPerShare => "sales_per_share",
            Self::Eps => "eps",
            Self::NetMargin => "net_margin",
            Self::GrossMargin => "gross_margin",
            Self::TotalDebtToEquity => "total_debt_to_equity",
            Self::CurrentRatio => "current_ratio",
        }
    }

    /// Look up a metric by its payload series name.
    pub fn from_series_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.series_key() == key)
    }
}

/// One value per declared metric, each independently nullable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricValues {
    /// Sales per share
    pub sales_per_share: Option<f64>,
    /// Earnings per share
    pub eps: Option<f64>,
    /// Net margin
    pub net_margin: Option<f64>,
    /// Gross margin
    pub gross_margin: Option<f64>,
    /// Total debt to equity
    pub total_debt_to_equity: Option<f64>,
    /// Current ratio
    pub current_ratio: Option<f64>,
}

impl MetricValues {
    /// Value of a metric.
    pub const fn get(&self, metric: Metric) -> Option<f64> {
        match metric {
            Metric::SalesPerShare => self.sales_per_share,
            Metric::Eps => self.eps,
            Metric::NetMargin => self.net_margin,
            Metric::GrossMargin => self.gross_margin,
            Metric::TotalDebtToEquity => self.total_debt_to_equity,
            Metric::CurrentRatio => self.current_ratio,
        }
    }

    /// Set the value of a metric.
    pub const fn set(&mut self, metric: Metric, value: Option<f64>) {
        let slot = match metric {
            Metric::SalesPerShare => &mut self.sales_per_share,
            Metric::Eps => &mut self.eps,
            Metric::NetMargin => &mut self.net_margin,
            Metric::GrossMargin => &mut self.gross_margin,
            Metric::TotalDebtToEquity => &mut self.total_debt_to_equity,
            Metric::CurrentRatio => &mut self.current_ratio,
        };
        *slot = value;
    }

    /// True when no metric has a value.
    pub fn is_empty(&self) -> bool {
        Metric::ALL.iter().all(|m| self.get(*m).is_none())
    }
}

/// One pivoted reporting period, before it is attached to a symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodRecord {
    /// Period end date
    pub period: NaiveDate,
    /// Metric values for the period
    pub values: MetricValues,
}

impl PeriodRecord {
    /// Create an empty record for a period.
    pub fn new(period: NaiveDate) -> Self {
        Self {
            period,
            values: MetricValues::default(),
        }
    }

    /// Attach the record to a symbol and cadence.
    pub fn into_period_metric(self, symbol: &str, period_type: Cadence) -> PeriodMetric {
        PeriodMetric {
            symbol: symbol.to_string(),
            period: self.period,
            period_type,
            values: self.values,
        }
    }
}

/// A stored per-period metric row, unique by `(symbol, period, period_type)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodMetric {
    /// Stock symbol
    pub symbol: String,
    /// Period end date
    pub period: NaiveDate,
    /// Cadence the period belongs to
    pub period_type: Cadence,
    /// Metric values
    pub values: MetricValues,
}

/// Company profile as written to the `companies` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanyProfile {
    /// Stock symbol
    pub symbol: String,
    /// Display name
    pub name: String,
    /// Sector classification
    pub sector: Option<String>,
    /// Industry classification
    pub industry: Option<String>,
    /// Market capitalization (millions, as reported upstream)
    pub market_cap: Option<f64>,
}

/// Feature row for one `(symbol, period)`: the base metrics plus temporally derived columns.
///
/// Every derived column is either a number or absent. Rows are never stored; they are computed
/// from the base table whenever they are read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureRow {
    /// Stock symbol
    pub symbol: String,
    /// Period end date
    pub period: NaiveDate,
    /// Base metric values
    pub values: MetricValues,
    /// Trailing moving average of EPS
    pub eps_ma: Option<f64>,
    /// Year-over-year growth of sales per share
    pub sales_growth_yoy: Option<f64>,
    /// Year-over-year growth of EPS
    pub eps_growth_yoy: Option<f64>,
    /// Period-over-period momentum of sales per share
    pub sales_momentum_qoq: Option<f64>,
    /// Period-over-period momentum of EPS
    pub eps_momentum_qoq: Option<f64>,
    /// EPS of the period `horizon` steps ahead
    pub target_next_eps: Option<f64>,
    /// Growth from this period's EPS to the target EPS
    pub target_eps_growth: Option<f64>,
    /// Whether the target EPS is above this period's EPS
    pub target_direction: Option<bool>,
}

impl FeatureRow {
    /// Derived feature columns in a fixed order.
    pub const fn features(&self) -> [Option<f64>; 5] {
        [
            self.eps_ma,
            self.sales_growth_yoy,
            self.eps_growth_yoy,
            self.sales_momentum_qoq,
            self.eps_momentum_qoq,
        ]
    }

    /// Whether the forward target is known.
    pub const fn has_target(&self) -> bool {
        self.target_next_eps.is_some()
    }

    /// Whether every derived feature and the target are present.
    pub fn is_complete(&self) -> bool {
        self.has_target() && self.features().iter().all(Option::is_some)
    }
}
