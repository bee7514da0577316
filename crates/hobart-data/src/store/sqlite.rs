//! SQLite store for company profiles and per-period metrics.

use super::schema::{MODEL_FEATURES_VIEW, TABLES};
use crate::error::{DataError, Result};
use crate::types::{
    Cadence, CompanyProfile, FeatureRow, Metric, MetricValues, PeriodMetric, PeriodRecord,
};
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{Connection, OpenFlags, OptionalExtension, Row, Transaction, params};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// What `upsert_company` does when the symbol already exists.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompanyPolicy {
    /// Keep the first stored profile untouched
    InsertOnly,
    /// Overwrite with the freshly fetched non-null fields and bump `updated_at`
    #[default]
    Merge,
}

/// What `upsert_period_metrics` does when a period is already stored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExistingPeriodPolicy {
    /// Leave the stored row as is and count it as skipped
    #[default]
    Skip,
    /// Replace the stored values (for upstream restatements)
    Overwrite,
}

/// Outcome of `upsert_company`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompanyUpsert {
    /// The symbol was new
    Inserted,
    /// The stored profile was refreshed
    Updated,
    /// The symbol existed and was left as is
    Unchanged,
}

/// Counts from one `upsert_period_metrics` batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpsertReport {
    /// Rows inserted
    pub inserted: usize,
    /// Rows already present and left untouched
    pub skipped: usize,
    /// Rows already present and overwritten
    pub updated: usize,
}

impl UpsertReport {
    /// Rows written by the batch.
    pub const fn committed(&self) -> usize {
        self.inserted + self.updated
    }

    /// Rows the batch looked at.
    pub const fn total(&self) -> usize {
        self.inserted + self.skipped + self.updated
    }

    /// Add another report's counts to this one.
    pub const fn merge(&mut self, other: Self) {
        self.inserted += other.inserted;
        self.skipped += other.skipped;
        self.updated += other.updated;
    }
}

/// A stored company with its last write time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanyRecord {
    /// Profile fields
    pub profile: CompanyProfile,
    /// When the row was last written
    pub updated_at: DateTime<Utc>,
}

/// Store statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreStats {
    /// Number of companies
    pub companies: usize,
    /// Number of period rows across all cadences
    pub period_rows: usize,
    /// Number of quarterly period rows
    pub quarterly_rows: usize,
    /// Number of annual period rows
    pub annual_rows: usize,
}

enum RowOutcome {
    Inserted,
    Skipped,
    Updated,
}

/// SQLite store.
///
/// All writes go through [`upsert_company`](Self::upsert_company) and
/// [`upsert_period_metrics`](Self::upsert_period_metrics). Rows in `financial_metrics` are unique
/// by `(symbol, period, period_type)`.
#[derive(Debug)]
pub struct SqliteStore {
    conn: Connection,
    company_policy: CompanyPolicy,
    period_policy: ExistingPeriodPolicy,
}

impl SqliteStore {
    /// Open (or create) a store.
    ///
    /// # Arguments
    /// * `path` - Path to the SQLite database file
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        Self::from_connection(conn)
    }

    /// Open an existing store for reading only.
    ///
    /// Fails when the file does not exist instead of creating an empty database. Writes through
    /// the returned store fail with [`DataError::Database`].
    pub fn open_read_only<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        Ok(Self {
            conn,
            company_policy: CompanyPolicy::default(),
            period_policy: ExistingPeriodPolicy::default(),
        })
    }

    /// Create an in-memory store (useful for testing).
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        let store = Self {
            conn,
            company_policy: CompanyPolicy::default(),
            period_policy: ExistingPeriodPolicy::default(),
        };
        store.initialize_schema()?;
        Ok(store)
    }

    /// Set the policy for existing companies.
    #[must_use]
    pub const fn with_company_policy(mut self, policy: CompanyPolicy) -> Self {
        self.company_policy = policy;
        self
    }

    /// Set the policy for periods that are already stored.
    #[must_use]
    pub const fn with_period_policy(mut self, policy: ExistingPeriodPolicy) -> Self {
        self.period_policy = policy;
        self
    }

    /// Initialize tables and the feature view.
    fn initialize_schema(&self) -> Result<()> {
        self.conn.execute_batch(TABLES)?;
        self.conn.execute_batch(MODEL_FEATURES_VIEW)?;
        Ok(())
    }

    /// Insert a company, or handle an existing one according to the [`CompanyPolicy`].
    pub fn upsert_company(&self, profile: &CompanyProfile) -> Result<CompanyUpsert> {
        let updated_at = Utc::now().to_rfc3339();

        match self.company_policy {
            CompanyPolicy::InsertOnly => {
                let changed = self.conn.execute(
                    "INSERT INTO companies (symbol, name, sector, industry, market_cap, updated_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                     ON CONFLICT(symbol) DO NOTHING",
                    params![
                        profile.symbol,
                        profile.name,
                        profile.sector,
                        profile.industry,
                        profile.market_cap,
                        updated_at
                    ],
                )?;
                Ok(if changed == 1 {
                    CompanyUpsert::Inserted
                } else {
                    CompanyUpsert::Unchanged
                })
            }
            CompanyPolicy::Merge => {
                let tx = self.conn.unchecked_transaction()?;
                let existed = company_exists(&tx, &profile.symbol)?;
                tx.execute(
                    "INSERT INTO companies (symbol, name, sector, industry, market_cap, updated_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                     ON CONFLICT(symbol) DO UPDATE SET
                        name = excluded.name,
                        sector = COALESCE(excluded.sector, companies.sector),
                        industry = COALESCE(excluded.industry, companies.industry),
                        market_cap = COALESCE(excluded.market_cap, companies.market_cap),
                        updated_at = excluded.updated_at",
                    params![
                        profile.symbol,
                        profile.name,
                        profile.sector,
                        profile.industry,
                        profile.market_cap,
                        updated_at
                    ],
                )?;
                tx.commit()?;
                Ok(if existed {
                    CompanyUpsert::Updated
                } else {
                    CompanyUpsert::Inserted
                })
            }
        }
    }

    /// Write a symbol's period batch in one transaction.
    ///
    /// Each row is inserted only if `(symbol, period, period_type)` is absent; existing rows are
    /// skipped or overwritten according to the [`ExistingPeriodPolicy`]. If any row fails, the
    /// whole batch is rolled back and [`DataError::BatchFailed`] reports `committed = 0`.
    pub fn upsert_period_metrics(
        &self,
        symbol: &str,
        period_type: Cadence,
        rows: &[PeriodRecord],
    ) -> Result<UpsertReport> {
        let ingested_at = Utc::now().to_rfc3339();
        let batch_failed = |period: Option<NaiveDate>, source: rusqlite::Error| {
            DataError::BatchFailed {
                symbol: symbol.to_string(),
                period,
                committed: 0,
                source,
            }
        };

        let tx = self
            .conn
            .unchecked_transaction()
            .map_err(|e| batch_failed(None, e))?;
        let mut report = UpsertReport::default();

        for row in rows {
            // Dropping `tx` on the error path rolls back everything written so far.
            let outcome = self
                .write_period(&tx, symbol, period_type, row, &ingested_at)
                .map_err(|e| batch_failed(Some(row.period), e))?;
            match outcome {
                RowOutcome::Inserted => report.inserted += 1,
                RowOutcome::Skipped => report.skipped += 1,
                RowOutcome::Updated => report.updated += 1,
            }
        }

        tx.commit().map_err(|e| batch_failed(None, e))?;
        Ok(report)
    }

    fn write_period(
        &self,
        tx: &Transaction<'_>,
        symbol: &str,
        period_type: Cadence,
        row: &PeriodRecord,
        ingested_at: &str,
    ) -> rusqlite::Result<RowOutcome> {
        let period = row.period.to_string();
        let v = &row.values;

        match self.period_policy {
            ExistingPeriodPolicy::Skip => {
                let changed = tx.prepare_cached(
                    "INSERT INTO financial_metrics (
                        symbol, period, period_type,
                        sales_per_share, eps, net_margin, gross_margin,
                        total_debt_to_equity, current_ratio, ingested_at
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
                    ON CONFLICT(symbol, period, period_type) DO NOTHING",
                )?
                .execute(params![
                    symbol,
                    period,
                    period_type.as_str(),
                    v.sales_per_share,
                    v.eps,
                    v.net_margin,
                    v.gross_margin,
                    v.total_debt_to_equity,
                    v.current_ratio,
                    ingested_at,
                ])?;
                Ok(if changed == 1 {
                    RowOutcome::Inserted
                } else {
                    RowOutcome::Skipped
                })
            }
            ExistingPeriodPolicy::Overwrite => {
                let existed: bool = tx.query_row(
                    "SELECT EXISTS(SELECT 1 FROM financial_metrics
                     WHERE symbol = ?1 AND period = ?2 AND period_type = ?3)",
                    params![symbol, period, period_type.as_str()],
                    |r| r.get(0),
                )?;
                tx.prepare_cached(
                    "INSERT INTO financial_metrics (
                        symbol, period, period_type,
                        sales_per_share, eps, net_margin, gross_margin,
                        total_debt_to_equity, current_ratio, ingested_at
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
                    ON CONFLICT(symbol, period, period_type) DO UPDATE SET
                        sales_per_share = excluded.sales_per_share,
                        eps = excluded.eps,
                        net_margin = excluded.net_margin,
                        gross_margin = excluded.gross_margin,
                        total_debt_to_equity = excluded.total_debt_to_equity,
                        current_ratio = excluded.current_ratio,
                        ingested_at = excluded.ingested_at",
                )?
                .execute(params![
                    symbol,
                    period,
                    period_type.as_str(),
                    v.sales_per_share,
                    v.eps,
                    v.net_margin,
                    v.gross_margin,
                    v.total_debt_to_equity,
                    v.current_ratio,
                    ingested_at,
                ])?;
                Ok(if existed {
                    RowOutcome::Updated
                } else {
                    RowOutcome::Inserted
                })
            }
        }
    }

    /// Get a stored company.
    pub fn company(&self, symbol: &str) -> Result<Option<CompanyRecord>> {
        let result = self
            .conn
            .query_row(
                "SELECT symbol, name, sector, industry, market_cap, updated_at
                 FROM companies WHERE symbol = ?1",
                params![symbol],
                |row| {
                    Ok(CompanyRecord {
                        profile: CompanyProfile {
                            symbol: row.get(0)?,
                            name: row.get(1)?,
                            sector: row.get(2)?,
                            industry: row.get(3)?,
                            market_cap: row.get(4)?,
                        },
                        updated_at: DateTime::parse_from_rfc3339(&row.get::<_, String>(5)?)
                            .map_err(|e| conversion_error(5, e))?
                            .with_timezone(&Utc),
                    })
                },
            )
            .optional()?;

        Ok(result)
    }

    /// All stored company symbols.
    pub fn symbols(&self) -> Result<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT symbol FROM companies ORDER BY symbol")?;

        let symbols = stmt
            .query_map([], |row| row.get(0))?
            .collect::<std::result::Result<Vec<String>, _>>()?;

        Ok(symbols)
    }

    /// Stored periods of one symbol and cadence, ascending by period.
    pub fn period_metrics(&self, symbol: &str, period_type: Cadence) -> Result<Vec<PeriodMetric>> {
        let mut stmt = self.conn.prepare(
            "SELECT symbol, period, period_type,
                    sales_per_share, eps, net_margin, gross_margin,
                    total_debt_to_equity, current_ratio
             FROM financial_metrics
             WHERE symbol = ?1 AND period_type = ?2
             ORDER BY period ASC",
        )?;

        let rows = stmt.query_map(params![symbol, period_type.as_str()], |row| {
            Ok(PeriodMetric {
                symbol: row.get(0)?,
                period: parse_period(row, 1)?,
                period_type: Cadence::parse(&row.get::<_, String>(2)?)
                    .map_err(|e| conversion_error(2, e))?,
                values: read_values(row, 3)?,
            })
        })?;

        let mut metrics = Vec::new();
        for row in rows {
            metrics.push(row?);
        }

        Ok(metrics)
    }

    /// Number of stored period rows for a symbol and cadence.
    pub fn count_periods(&self, symbol: &str, period_type: Cadence) -> Result<usize> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM financial_metrics WHERE symbol = ?1 AND period_type = ?2",
            params![symbol, period_type.as_str()],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    /// Read the `model_features` view for a symbol, ascending by period.
    pub fn model_features(&self, symbol: &str) -> Result<Vec<FeatureRow>> {
        let mut stmt = self.conn.prepare(
            "SELECT symbol, period,
                    sales_per_share, eps, net_margin, gross_margin,
                    total_debt_to_equity, current_ratio,
                    eps_ma_4q, sales_growth_yoy, eps_growth_yoy,
                    sales_momentum_qoq, eps_momentum_qoq,
                    target_next_eps, target_eps_growth, target_direction
             FROM model_features
             WHERE symbol = ?1
             ORDER BY period ASC",
        )?;

        let rows = stmt.query_map(params![symbol], |row| {
            Ok(FeatureRow {
                symbol: row.get(0)?,
                period: parse_period(row, 1)?,
                values: read_values(row, 2)?,
                eps_ma: row.get(8)?,
                sales_growth_yoy: row.get(9)?,
                eps_growth_yoy: row.get(10)?,
                sales_momentum_qoq: row.get(11)?,
                eps_momentum_qoq: row.get(12)?,
                target_next_eps: row.get(13)?,
                target_eps_growth: row.get(14)?,
                target_direction: row.get(15)?,
            })
        })?;

        let mut features = Vec::new();
        for row in rows {
            features.push(row?);
        }

        Ok(features)
    }

    /// Get store statistics.
    pub fn stats(&self) -> Result<StoreStats> {
        let companies: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM companies", [], |row| row.get(0))?;

        let (quarterly, annual): (i64, i64) = self.conn.query_row(
            "SELECT
                COALESCE(SUM(period_type = 'quarterly'), 0),
                COALESCE(SUM(period_type = 'annual'), 0)
             FROM financial_metrics",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;

        Ok(StoreStats {
            companies: companies as usize,
            period_rows: (quarterly + annual) as usize,
            quarterly_rows: quarterly as usize,
            annual_rows: annual as usize,
        })
    }
}

fn company_exists(tx: &Transaction<'_>, symbol: &str) -> rusqlite::Result<bool> {
    tx.query_row(
        "SELECT EXISTS(SELECT 1 FROM companies WHERE symbol = ?1)",
        params![symbol],
        |row| row.get(0),
    )
}

fn conversion_error<E>(column: usize, e: E) -> rusqlite::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    rusqlite::Error::FromSqlConversionFailure(column, rusqlite::types::Type::Text, Box::new(e))
}

fn parse_period(row: &Row<'_>, idx: usize) -> rusqlite::Result<NaiveDate> {
    NaiveDate::parse_from_str(&row.get::<_, String>(idx)?, "%Y-%m-%d")
        .map_err(|e| conversion_error(idx, e))
}

/// Read the metric columns starting at `offset`, in [`Metric::ALL`] order.
fn read_values(row: &Row<'_>, offset: usize) -> rusqlite::Result<MetricValues> {
    let mut values = MetricValues::default();
    for (i, metric) in Metric::ALL.into_iter().enumerate() {
        values.set(metric, row.get(offset + i)?);
    }
    Ok(values)
}
