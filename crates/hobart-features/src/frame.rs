//! Polars materialization of feature rows.

use crate::error::Result;
use chrono::NaiveDate;
use hobart_data::{FeatureRow, Metric};
use polars::prelude::*;

/// Derived column names, in the order of [`FeatureRow::features`].
pub const FEATURE_COLUMNS: [&str; 5] = [
    "eps_ma",
    "sales_growth_yoy",
    "eps_growth_yoy",
    "sales_momentum_qoq",
    "eps_momentum_qoq",
];

/// Build a `DataFrame` with one row per feature row, sorted by symbol and period.
///
/// Columns: `symbol`, `period` (`Date`), the base metrics, [`FEATURE_COLUMNS`], and the targets
/// `target_next_eps`, `target_eps_growth` and `target_direction`. Missing values are nulls.
pub fn feature_frame(rows: &[FeatureRow]) -> Result<DataFrame> {
    // NaiveDate::default() is the Unix epoch, day zero of polars' Date.
    let epoch = NaiveDate::default();
    let days: Vec<i32> = rows
        .iter()
        .map(|r| (r.period - epoch).num_days() as i32)
        .collect();

    let mut columns: Vec<Column> =
        Vec::with_capacity(2 + Metric::ALL.len() + FEATURE_COLUMNS.len() + 3);
    columns.push(Column::from(Series::new(
        "symbol".into(),
        rows.iter().map(|r| r.symbol.as_str()).collect::<Vec<_>>(),
    )));
    columns.push(Column::from(
        Series::new("period".into(), days).cast(&DataType::Date)?,
    ));

    for metric in Metric::ALL {
        let values: Vec<Option<f64>> = rows.iter().map(|r| r.values.get(metric)).collect();
        columns.push(Column::from(Series::new(metric.column().into(), values)));
    }

    for (i, name) in FEATURE_COLUMNS.iter().enumerate() {
        let values: Vec<Option<f64>> = rows.iter().map(|r| r.features()[i]).collect();
        columns.push(Column::from(Series::new((*name).into(), values)));
    }

    columns.push(Column::from(Series::new(
        "target_next_eps".into(),
        rows.iter().map(|r| r.target_next_eps).collect::<Vec<_>>(),
    )));
    columns.push(Column::from(Series::new(
        "target_eps_growth".into(),
        rows.iter().map(|r| r.target_eps_growth).collect::<Vec<_>>(),
    )));
    columns.push(Column::from(Series::new(
        "target_direction".into(),
        rows.iter().map(|r| r.target_direction).collect::<Vec<_>>(),
    )));

    let df = DataFrame::new(columns)?
        .lazy()
        .sort(["symbol", "period"], Default::default())
        .collect()?;

    Ok(df)
}
