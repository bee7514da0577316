//! Feature reads from the store.

use crate::error::Result;
use hobart_data::{Cadence, FeatureRow, SqliteStore};
use hobart_features::{FeatureConfig, FeatureDeriver, PeriodSeries};

/// Derive features for a symbol from its stored periods.
///
/// The store returns periods ascending, so the series is built without re-sorting.
pub fn features_for(
    store: &SqliteStore,
    symbol: &str,
    cadence: Cadence,
    config: FeatureConfig,
) -> Result<Vec<FeatureRow>> {
    let rows = store.period_metrics(symbol, cadence)?;
    let series = PeriodSeries::new(rows)?;
    let deriver = FeatureDeriver::new(config)?;
    Ok(deriver.derive(&series)?)
}

/// Features for every stored symbol, concatenated in symbol order.
pub fn features_for_all(
    store: &SqliteStore,
    cadence: Cadence,
    config: FeatureConfig,
) -> Result<Vec<FeatureRow>> {
    let mut rows = Vec::new();
    for symbol in store.symbols()? {
        rows.extend(features_for(store, &symbol, cadence, config)?);
    }
    Ok(rows)
}
