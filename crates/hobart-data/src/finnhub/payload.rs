//! Finnhub response payloads.

use crate::types::{Cadence, CompanyProfile};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Response of `/stock/profile2`.
///
/// Unknown symbols come back as an empty object, so every field is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileData {
    /// Ticker
    #[serde(default)]
    pub ticker: Option<String>,
    /// Company name
    #[serde(default)]
    pub name: Option<String>,
    /// Finnhub industry classification
    #[serde(default)]
    pub finnhub_industry: Option<String>,
    /// Market capitalization in millions
    #[serde(default)]
    pub market_capitalization: Option<f64>,
    /// Shares outstanding in millions
    #[serde(default)]
    pub share_outstanding: Option<f64>,
    /// Listing exchange
    #[serde(default)]
    pub exchange: Option<String>,
    /// Country of domicile
    #[serde(default)]
    pub country: Option<String>,
    /// Reporting currency
    #[serde(default)]
    pub currency: Option<String>,
    /// IPO date
    #[serde(default)]
    pub ipo: Option<String>,
}

impl ProfileData {
    /// Convert into a storable profile. Returns `None` when the payload carries no name, which is
    /// how the API answers for symbols it does not know.
    ///
    /// Finnhub only exposes one classification, so it fills both sector and industry.
    pub fn into_company(self, symbol: &str) -> Option<CompanyProfile> {
        let name = self.name.filter(|n| !n.trim().is_empty())?;
        Some(CompanyProfile {
            symbol: symbol.to_string(),
            name,
            sector: self.finnhub_industry.clone(),
            industry: self.finnhub_industry,
            market_cap: self.market_capitalization,
        })
    }
}

/// One `{period, v}` entry of a metric series.
///
/// Both fields are kept as raw JSON so a single bad entry cannot fail the whole response. The
/// extractor decides what is usable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawObservation {
    /// Period end date as sent upstream, normally a `YYYY-MM-DD` string
    #[serde(default)]
    pub period: Value,
    /// Reported value, normally a number or null
    #[serde(default)]
    pub v: Value,
}

impl RawObservation {
    /// Create an observation.
    pub fn new(period: impl Into<String>, v: Option<f64>) -> Self {
        Self {
            period: Value::String(period.into()),
            v: v.map_or(Value::Null, Value::from),
        }
    }

    /// Period text, if upstream sent a string.
    pub fn period_str(&self) -> Option<&str> {
        self.period.as_str()
    }

    /// Period as received, for diagnostics. Non-string periods are rendered as JSON.
    pub fn raw_period(&self) -> String {
        match &self.period {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }

    /// Numeric value. `Ok(None)` for null, `Err` with the offending JSON for anything that is
    /// not a number.
    pub fn value(&self) -> std::result::Result<Option<f64>, String> {
        match &self.v {
            Value::Null => Ok(None),
            Value::Number(n) => n.as_f64().map(Some).ok_or_else(|| n.to_string()),
            other => Err(other.to_string()),
        }
    }
}

/// Response of `/stock/metric?metric=all`, reduced to the part the pipeline reads.
///
/// Layout is cadence -> metric series name -> observations. Series are independently sparse and
/// are not aligned on periods.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SeriesPayload {
    /// Symbol echoed by the API
    #[serde(default)]
    pub symbol: Option<String>,
    /// Series keyed by cadence, then by metric name
    #[serde(default)]
    pub series: HashMap<String, HashMap<String, Vec<RawObservation>>>,
}

impl SeriesPayload {
    /// Series of one cadence, if present.
    pub fn cadence(&self, cadence: Cadence) -> Option<&HashMap<String, Vec<RawObservation>>> {
        self.series.get(cadence.as_str())
    }

    /// Sorted metric names available for a cadence.
    pub fn metric_keys(&self, cadence: Cadence) -> Vec<String> {
        let mut keys: Vec<String> = self
            .cadence(cadence)
            .map(|series| series.keys().cloned().collect())
            .unwrap_or_default();
        keys.sort();
        keys
    }

    /// Add a series. Mostly useful to build fixtures.
    pub fn insert(
        &mut self,
        cadence: Cadence,
        metric: impl Into<String>,
        observations: Vec<RawObservation>,
    ) {
        self.series
            .entry(cadence.as_str().to_string())
            .or_default()
            .insert(metric.into(), observations);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_series_payload() {
        let json = r#"{
            "metric": {"52WeekHigh": 468.35, "peTTM": 35.1},
            "metricType": "all",
            "series": {
                "annual": {
                    "eps": [{"period": "2023-06-30", "v": 9.68}]
                },
                "quarterly": {
                    "eps": [
                        {"period": "2023-12-31", "v": 2.93},
                        {"period": "2023-09-30", "v": 2.99}
                    ],
                    "salesPerShare": [{"period": "2023-12-31", "v": 8.3}],
                    "netMargin": [{"period": "2023-12-31", "v": null}]
                }
            },
            "symbol": "MSFT"
        }"#;

        let payload: SeriesPayload = serde_json::from_str(json).unwrap();
        assert_eq!(payload.symbol.as_deref(), Some("MSFT"));
        assert_eq!(
            payload.metric_keys(Cadence::Quarterly),
            vec!["eps", "netMargin", "salesPerShare"]
        );

        let quarterly = payload.cadence(Cadence::Quarterly).unwrap();
        assert_eq!(quarterly["eps"].len(), 2);
        assert_eq!(quarterly["netMargin"][0].value(), Ok(None));
        assert_eq!(payload.metric_keys(Cadence::Annual), vec!["eps"]);
    }

    #[test]
    fn test_parse_empty_series() {
        let payload: SeriesPayload = serde_json::from_str(r#"{"metric": {}}"#).unwrap();
        assert!(payload.cadence(Cadence::Quarterly).is_none());
        assert!(payload.metric_keys(Cadence::Quarterly).is_empty());
    }

    #[test]
    fn test_profile_into_company() {
        let json = r#"{
            "country": "US",
            "currency": "USD",
            "exchange": "NASDAQ NMS - GLOBAL MARKET",
            "finnhubIndustry": "Technology",
            "ipo": "1986-03-13",
            "marketCapitalization": 3112345.5,
            "name": "Microsoft Corp",
            "shareOutstanding": 7432.31,
            "ticker": "MSFT"
        }"#;

        let profile: ProfileData = serde_json::from_str(json).unwrap();
        let company = profile.into_company("MSFT").unwrap();
        assert_eq!(company.name, "Microsoft Corp");
        assert_eq!(company.sector.as_deref(), Some("Technology"));
        assert_eq!(company.industry.as_deref(), Some("Technology"));
        assert_eq!(company.market_cap, Some(3112345.5));
    }

    #[test]
    fn test_unknown_symbol_profile() {
        let profile: ProfileData = serde_json::from_str("{}").unwrap();
        assert!(profile.into_company("NOPE").is_none());
    }

    #[test]
    fn test_bad_entries_do_not_reject_payload() {
        let json = r#"{
            "series": {
                "quarterly": {
                    "eps": [
                        {"period": "2023-03-31", "v": 1.0},
                        {"period": null, "v": 2.0},
                        {"v": 2.5},
                        {"period": 20230630, "v": 3.0},
                        {"period": "2023-06-30", "v": "n/a"},
                        {"period": "2023-09-30"}
                    ]
                }
            }
        }"#;

        let payload: SeriesPayload = serde_json::from_str(json).unwrap();
        let eps = &payload.cadence(Cadence::Quarterly).unwrap()["eps"];
        assert_eq!(eps.len(), 6);

        assert_eq!(eps[0].period_str(), Some("2023-03-31"));
        assert_eq!(eps[0].value(), Ok(Some(1.0)));
        assert_eq!(eps[1].period_str(), None);
        assert_eq!(eps[1].raw_period(), "null");
        assert_eq!(eps[2].raw_period(), "null");
        assert_eq!(eps[3].raw_period(), "20230630");
        assert_eq!(eps[4].value(), Err("\"n/a\"".to_string()));
        assert_eq!(eps[5].value(), Ok(None));
    }
}
