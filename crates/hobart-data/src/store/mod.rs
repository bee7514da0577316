//! Relational store for companies and per-period metrics.

pub mod schema;
pub mod sqlite;

pub use sqlite::{
    CompanyPolicy, CompanyRecord, CompanyUpsert, ExistingPeriodPolicy, SqliteStore, StoreStats,
    UpsertReport,
};
