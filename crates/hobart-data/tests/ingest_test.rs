//! Integration tests for payload extraction into the SQLite store

use approx::assert_relative_eq;
use chrono::{Datelike, NaiveDate};
use hobart_data::{
    Cadence, CompanyUpsert, DataError, MetricExtractor, ProfileData, SeriesPayload, SqliteStore,
};

const PROFILE: &str = r#"{
    "country": "US",
    "currency": "USD",
    "exchange": "NASDAQ NMS - GLOBAL MARKET",
    "finnhubIndustry": "Technology",
    "ipo": "1986-03-13",
    "marketCapitalization": 3083467.5,
    "name": "Microsoft Corp",
    "shareOutstanding": 7433.04,
    "ticker": "MSFT"
}"#;

const METRICS: &str = r#"{
    "metric": {"52WeekHigh": 468.35},
    "metricType": "all",
    "series": {
        "quarterly": {
            "eps": [
                {"period": "2023-12-31", "v": 1.3},
                {"period": "2023-06-30", "v": 1.1},
                {"period": "2023-03-31", "v": 1.0}
            ],
            "salesPerShare": [
                {"period": "2023-12-31", "v": 8.2},
                {"period": "2023-09-30", "v": 7.9},
                {"period": "2023-06-30", "v": 7.5},
                {"period": "2023-03-31", "v": 7.0},
                {"period": "not-a-date", "v": 1.0}
            ],
            "netMargin": [
                {"period": "2023-12-31", "v": 0.35},
                {"period": "2022-12-31", "v": 0.33}
            ],
            "peTTM": [
                {"period": "2023-12-31", "v": 36.1}
            ]
        },
        "annual": {
            "eps": [
                {"period": "2023-06-30", "v": 9.68},
                {"period": "2022-06-30", "v": 9.65}
            ]
        }
    },
    "symbol": "MSFT"
}"#;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn seeded_store() -> SqliteStore {
    let store = SqliteStore::in_memory().unwrap();
    let profile: ProfileData = serde_json::from_str(PROFILE).unwrap();
    let company = profile.into_company("MSFT").unwrap();
    assert_eq!(store.upsert_company(&company).unwrap(), CompanyUpsert::Inserted);
    store
}

#[test]
fn test_payload_to_store_quarterly() {
    let payload: SeriesPayload = serde_json::from_str(METRICS).unwrap();
    let extracted = MetricExtractor::default().extract(&payload, Cadence::Quarterly);

    // The Q3 period comes from sales per share even though EPS skipped it.
    assert_eq!(extracted.rows.len(), 4);
    assert_eq!(extracted.dropped.len(), 1);
    assert_eq!(extracted.dropped[0].raw_period, "not-a-date");

    let store = seeded_store();
    let report = store
        .upsert_period_metrics("MSFT", Cadence::Quarterly, &extracted.rows)
        .unwrap();
    assert_eq!(report.inserted, 4);

    let stored = store.period_metrics("MSFT", Cadence::Quarterly).unwrap();
    let periods: Vec<NaiveDate> = stored.iter().map(|r| r.period).collect();
    assert_eq!(
        periods,
        vec![
            date(2023, 3, 31),
            date(2023, 6, 30),
            date(2023, 9, 30),
            date(2023, 12, 31)
        ]
    );
    assert_eq!(stored[2].values.eps, None);
    assert_eq!(stored[2].values.sales_per_share, Some(7.9));
    assert_eq!(stored[3].values.net_margin, Some(0.35));
    // 2022-12-31 is not an anchor period.
    assert!(stored.iter().all(|r| r.period.year() == 2023));
}

#[test]
fn test_second_ingest_is_a_no_op() {
    let payload: SeriesPayload = serde_json::from_str(METRICS).unwrap();
    let extractor = MetricExtractor::default();
    let store = seeded_store();

    for cadence in [Cadence::Quarterly, Cadence::Annual] {
        let rows = extractor.extract(&payload, cadence).rows;
        store.upsert_period_metrics("MSFT", cadence, &rows).unwrap();
    }
    let before = store.stats().unwrap();

    for cadence in [Cadence::Quarterly, Cadence::Annual] {
        let rows = extractor.extract(&payload, cadence).rows;
        let report = store.upsert_period_metrics("MSFT", cadence, &rows).unwrap();
        assert_eq!(report.inserted, 0);
        assert_eq!(report.skipped, rows.len());
    }

    let after = store.stats().unwrap();
    assert_eq!(before, after);
    assert_eq!(after.quarterly_rows, 4);
    assert_eq!(after.annual_rows, 2);
}

#[test]
fn test_model_features_view_edges() {
    let payload: SeriesPayload = serde_json::from_str(METRICS).unwrap();
    let rows = MetricExtractor::default()
        .extract(&payload, Cadence::Quarterly)
        .rows;
    let store = seeded_store();
    store
        .upsert_period_metrics("MSFT", Cadence::Quarterly, &rows)
        .unwrap();

    let features = store.model_features("MSFT").unwrap();
    assert_eq!(features.len(), 4);

    // Only four periods, one with null EPS: no full moving-average window.
    assert!(features.iter().all(|f| f.eps_ma.is_none()));
    // No prior year in range.
    assert!(features.iter().all(|f| f.sales_growth_yoy.is_none()));

    assert_relative_eq!(features[1].eps_momentum_qoq.unwrap(), 0.1, epsilon = 1e-9);
    assert_relative_eq!(
        features[1].sales_momentum_qoq.unwrap(),
        7.5 / 7.0 - 1.0,
        epsilon = 1e-9
    );
    // Prior quarter EPS is null.
    assert_eq!(features[3].eps_momentum_qoq, None);

    assert_eq!(features[0].target_next_eps, Some(1.1));
    assert_eq!(features[0].target_direction, Some(true));
    assert_eq!(features[1].target_next_eps, None);
    assert_eq!(features[1].target_direction, None);
    assert_eq!(features[3].target_next_eps, None);
}

#[test]
fn test_profile_without_name_is_rejected() {
    let profile: ProfileData = serde_json::from_str(r#"{"ticker": "ZZZZ"}"#).unwrap();
    assert!(profile.into_company("ZZZZ").is_none());
}

#[test]
fn test_batch_for_unknown_company_fails() {
    let store = SqliteStore::in_memory().unwrap();
    let payload: SeriesPayload = serde_json::from_str(METRICS).unwrap();
    let rows = MetricExtractor::default()
        .extract(&payload, Cadence::Annual)
        .rows;

    let err = store
        .upsert_period_metrics("MSFT", Cadence::Annual, &rows)
        .unwrap_err();
    assert!(err.is_persistence());
    assert!(matches!(err, DataError::BatchFailed { committed: 0, .. }));
}
