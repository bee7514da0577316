//! CSV export of feature rows.

use crate::error::Result;
use chrono::NaiveDate;
use hobart_data::FeatureRow;
use serde::Serialize;
use std::io::Write;

/// Flat CSV record. Empty cells are nulls.
#[derive(Debug, Serialize)]
struct FeatureRecord<'a> {
    symbol: &'a str,
    period: NaiveDate,
    sales_per_share: Option<f64>,
    eps: Option<f64>,
    net_margin: Option<f64>,
    gross_margin: Option<f64>,
    total_debt_to_equity: Option<f64>,
    current_ratio: Option<f64>,
    eps_ma: Option<f64>,
    sales_growth_yoy: Option<f64>,
    eps_growth_yoy: Option<f64>,
    sales_momentum_qoq: Option<f64>,
    eps_momentum_qoq: Option<f64>,
    target_next_eps: Option<f64>,
    target_eps_growth: Option<f64>,
    target_direction: Option<bool>,
}

impl<'a> From<&'a FeatureRow> for FeatureRecord<'a> {
    fn from(row: &'a FeatureRow) -> Self {
        let v = &row.values;
        Self {
            symbol: &row.symbol,
            period: row.period,
            sales_per_share: v.sales_per_share,
            eps: v.eps,
            net_margin: v.net_margin,
            gross_margin: v.gross_margin,
            total_debt_to_equity: v.total_debt_to_equity,
            current_ratio: v.current_ratio,
            eps_ma: row.eps_ma,
            sales_growth_yoy: row.sales_growth_yoy,
            eps_growth_yoy: row.eps_growth_yoy,
            sales_momentum_qoq: row.sales_momentum_qoq,
            eps_momentum_qoq: row.eps_momentum_qoq,
            target_next_eps: row.target_next_eps,
            target_eps_growth: row.target_eps_growth,
            target_direction: row.target_direction,
        }
    }
}

/// Write rows as CSV with a header line. Returns the number of data rows written.
pub fn write_csv<W: Write>(rows: &[FeatureRow], writer: W) -> Result<usize> {
    let mut wtr = csv::Writer::from_writer(writer);
    for row in rows {
        wtr.serialize(FeatureRecord::from(row))?;
    }
    wtr.flush()?;
    Ok(rows.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use hobart_data::MetricValues;

    #[test]
    fn test_write_csv() {
        let row = FeatureRow {
            symbol: "MSFT".to_string(),
            period: NaiveDate::from_ymd_opt(2023, 12, 31).unwrap(),
            values: MetricValues {
                eps: Some(2.93),
                ..Default::default()
            },
            eps_ma: Some(2.7),
            sales_growth_yoy: None,
            eps_growth_yoy: None,
            sales_momentum_qoq: None,
            eps_momentum_qoq: None,
            target_next_eps: None,
            target_eps_growth: None,
            target_direction: None,
        };

        let mut buf = Vec::new();
        assert_eq!(write_csv(&[row], &mut buf).unwrap(), 1);
        let text = String::from_utf8(buf).unwrap();
        let mut lines = text.lines();

        let header = lines.next().unwrap();
        assert!(header.starts_with("symbol,period,sales_per_share,eps,"));
        assert!(header.ends_with(",target_direction"));
        assert_eq!(lines.next().unwrap(), "MSFT,2023-12-31,,2.93,,,,,2.7,,,,,,,");
        assert!(lines.next().is_none());
    }

    #[test]
    fn test_empty_export_writes_nothing() {
        let mut buf = Vec::new();
        assert_eq!(write_csv(&[], &mut buf).unwrap(), 0);
        assert!(buf.is_empty());
    }
}
