//! Windowed expressions over an ordered column of optional values.
//!
//! Each function builds a polars [`Expr`] that yields one output per input row. A missing input
//! never gets filled in: any computation that touches a null yields null.

use polars::prelude::*;

/// Trailing mean over `window` rows ending at each row.
///
/// Null for the first `window - 1` rows and for any window containing a null.
pub fn trailing_mean(column: &str, window: usize) -> Expr {
    col(column).rolling_mean(RollingOptionsFixedWindow {
        window_size: window,
        min_periods: window,
        ..Default::default()
    })
}

/// Relative change between a value and the one `lag` rows earlier.
///
/// Null when the earlier row does not exist, either value is missing, or the earlier value is
/// zero.
pub fn pct_change(column: &str, lag: usize) -> Expr {
    growth(col(column).shift(lit(lag as i64)), col(column))
}

/// Value `horizon` rows ahead, null past the end of the column.
pub fn lead(column: &str, horizon: usize) -> Expr {
    col(column).shift(lit(-(horizon as i64)))
}

/// `(current - prior) / prior`, or null if either side is missing or `prior` is zero.
pub fn growth(prior: Expr, current: Expr) -> Expr {
    when(prior.clone().neq(lit(0.0)))
        .then((current - prior.clone()) / prior)
        .otherwise(lit(NULL))
}
