//! Training-set helpers over derived feature rows.

use crate::error::{FeatureError, Result};
use hobart_data::FeatureRow;

/// Rows whose forward target is known.
pub fn labeled(rows: &[FeatureRow]) -> Vec<FeatureRow> {
    rows.iter().filter(|r| r.has_target()).cloned().collect()
}

/// Rows where every derived feature and the target are present.
pub fn complete(rows: &[FeatureRow]) -> Vec<FeatureRow> {
    rows.iter().filter(|r| r.is_complete()).cloned().collect()
}

/// Time-ordered train/test split.
///
/// Labeled rows are sorted by period and cut at `floor(n * train_fraction)`; nothing is shuffled,
/// so every test row is later than or concurrent with every train row. Rows without a target go
/// to `frontier` untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TimeSplit {
    /// Earliest labeled rows
    pub train: Vec<FeatureRow>,
    /// Latest labeled rows
    pub test: Vec<FeatureRow>,
    /// Rows with no target yet (the periods a model would predict)
    pub frontier: Vec<FeatureRow>,
}

impl TimeSplit {
    /// Split rows in time order.
    ///
    /// # Errors
    /// [`FeatureError::InvalidFraction`] unless `0 <= train_fraction <= 1`.
    pub fn new(rows: &[FeatureRow], train_fraction: f64) -> Result<Self> {
        if !(0.0..=1.0).contains(&train_fraction) {
            return Err(FeatureError::InvalidFraction(train_fraction));
        }

        let (mut with_target, frontier): (Vec<FeatureRow>, Vec<FeatureRow>) =
            rows.iter().cloned().partition(FeatureRow::has_target);
        with_target.sort_by(|a, b| a.period.cmp(&b.period).then_with(|| a.symbol.cmp(&b.symbol)));

        let cut = (with_target.len() as f64 * train_fraction).floor() as usize;
        let test = with_target.split_off(cut.min(with_target.len()));

        Ok(Self {
            train: with_target,
            test,
            frontier,
        })
    }
}
