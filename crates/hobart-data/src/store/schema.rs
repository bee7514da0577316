//! SQL schema for the store.
//!
//! `model_features` recomputes the feature columns with window functions over quarterly rows
//! (4-period moving average, 4-period year-over-year lag, 1-period lead). Nulls propagate: the
//! average needs four non-null values, and a null or zero denominator yields null.

/// Tables and indices. Every statement is idempotent.
pub const TABLES: &str = "
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS companies (
    symbol TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    sector TEXT,
    industry TEXT,
    market_cap REAL,
    updated_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS financial_metrics (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    symbol TEXT NOT NULL REFERENCES companies(symbol),
    period TEXT NOT NULL,
    period_type TEXT NOT NULL CHECK (period_type IN ('quarterly', 'annual')),

    sales_per_share REAL,
    eps REAL,
    net_margin REAL,
    gross_margin REAL,
    total_debt_to_equity REAL,
    current_ratio REAL,

    ingested_at TEXT NOT NULL,
    UNIQUE (symbol, period, period_type)
);

CREATE INDEX IF NOT EXISTS idx_metrics_symbol_period
    ON financial_metrics(symbol, period_type, period);
";

/// Feature view over quarterly rows.
pub const MODEL_FEATURES_VIEW: &str = "
CREATE VIEW IF NOT EXISTS model_features AS
WITH ordered AS (
    SELECT
        symbol,
        period,
        sales_per_share,
        eps,
        net_margin,
        gross_margin,
        total_debt_to_equity,
        current_ratio,
        COUNT(eps) OVER trailing AS eps_window_count,
        AVG(eps) OVER trailing AS eps_window_avg,
        LAG(sales_per_share, 4) OVER by_period AS sales_prior_year,
        LAG(eps, 4) OVER by_period AS eps_prior_year,
        LAG(sales_per_share, 1) OVER by_period AS sales_prior_quarter,
        LAG(eps, 1) OVER by_period AS eps_prior_quarter,
        LEAD(eps, 1) OVER by_period AS eps_next
    FROM financial_metrics
    WHERE period_type = 'quarterly'
    WINDOW
        by_period AS (PARTITION BY symbol ORDER BY period),
        trailing AS (PARTITION BY symbol ORDER BY period ROWS BETWEEN 3 PRECEDING AND CURRENT ROW)
)
SELECT
    symbol,
    period,
    sales_per_share,
    eps,
    net_margin,
    gross_margin,
    total_debt_to_equity,
    current_ratio,
    CASE WHEN eps_window_count = 4 THEN eps_window_avg END AS eps_ma_4q,
    CASE WHEN sales_prior_year <> 0
        THEN (sales_per_share - sales_prior_year) / sales_prior_year END AS sales_growth_yoy,
    CASE WHEN eps_prior_year <> 0
        THEN (eps - eps_prior_year) / eps_prior_year END AS eps_growth_yoy,
    CASE WHEN sales_prior_quarter <> 0
        THEN (sales_per_share - sales_prior_quarter) / sales_prior_quarter END AS sales_momentum_qoq,
    CASE WHEN eps_prior_quarter <> 0
        THEN (eps - eps_prior_quarter) / eps_prior_quarter END AS eps_momentum_qoq,
    eps_next AS target_next_eps,
    CASE WHEN eps <> 0 THEN (eps_next - eps) / eps END AS target_eps_growth,
    CASE
        WHEN eps_next IS NULL OR eps IS NULL THEN NULL
        WHEN eps_next > eps THEN 1
        ELSE 0
    END AS target_direction
FROM ordered;
";
