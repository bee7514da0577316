//! Pipeline configuration.

use crate::error::{PipelineError, Result};
use hobart_data::{
    ApiKey, Cadence, CompanyPolicy, DataError, ExistingPeriodPolicy, SqliteStore,
};
use std::fmt;
use std::path::PathBuf;

/// Symbols ingested when none are configured.
pub const DEFAULT_SYMBOLS: &[&str] = &["MSFT"];

/// Environment variable with a comma-separated symbol list.
pub const SYMBOLS_ENV: &str = "HOBART_SYMBOLS";

/// Environment variable with the store path.
pub const STORE_ENV: &str = "HOBART_STORE";

/// Where the SQLite store lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreLocation {
    /// Database file
    Path(PathBuf),
    /// Private in-memory database, gone when the pipeline is dropped
    InMemory,
}

impl StoreLocation {
    /// Open the store, creating the parent directory of a file store if needed.
    pub fn open(&self) -> Result<SqliteStore> {
        let opened = match self {
            Self::Path(path) => {
                if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                    std::fs::create_dir_all(parent).map_err(DataError::from).map_err(|source| {
                        PipelineError::StoreOpen {
                            location: self.to_string(),
                            source,
                        }
                    })?;
                }
                SqliteStore::new(path)
            }
            Self::InMemory => SqliteStore::in_memory(),
        };

        opened.map_err(|source| PipelineError::StoreOpen {
            location: self.to_string(),
            source,
        })
    }

    /// Open an existing store for reading. Never creates a file or directory.
    pub fn open_read_only(&self) -> Result<SqliteStore> {
        let opened = match self {
            Self::Path(path) => SqliteStore::open_read_only(path),
            Self::InMemory => SqliteStore::in_memory(),
        };

        opened.map_err(|source| PipelineError::StoreOpen {
            location: self.to_string(),
            source,
        })
    }
}

impl fmt::Display for StoreLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Path(path) => write!(f, "{}", path.display()),
            Self::InMemory => f.write_str(":memory:"),
        }
    }
}

/// Everything a run needs to know.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Symbols to ingest, in order
    pub symbols: Vec<String>,
    /// Finnhub API token
    pub api_key: ApiKey,
    /// Store location
    pub store_location: StoreLocation,
    /// Cadences to ingest
    pub cadences: Vec<Cadence>,
    /// Handling of companies that are already stored
    pub company_policy: CompanyPolicy,
    /// Handling of periods that are already stored
    pub existing_period_policy: ExistingPeriodPolicy,
}

impl PipelineConfig {
    /// Config for the given symbols with default policies and quarterly cadence.
    pub fn new(symbols: impl IntoIterator<Item = impl AsRef<str>>, api_key: ApiKey) -> Self {
        Self {
            symbols: normalize_symbols(symbols),
            api_key,
            store_location: StoreLocation::InMemory,
            cadences: vec![Cadence::Quarterly],
            company_policy: CompanyPolicy::default(),
            existing_period_policy: ExistingPeriodPolicy::default(),
        }
    }

    /// Set the store location.
    #[must_use]
    pub fn with_store(mut self, location: StoreLocation) -> Self {
        self.store_location = location;
        self
    }

    /// Set the cadences to ingest.
    #[must_use]
    pub fn with_cadences(mut self, cadences: impl IntoIterator<Item = Cadence>) -> Self {
        self.cadences = cadences.into_iter().collect();
        self.cadences.sort();
        self.cadences.dedup();
        self
    }

    /// Set the company policy.
    #[must_use]
    pub const fn with_company_policy(mut self, policy: CompanyPolicy) -> Self {
        self.company_policy = policy;
        self
    }

    /// Set the existing-period policy.
    #[must_use]
    pub const fn with_period_policy(mut self, policy: ExistingPeriodPolicy) -> Self {
        self.existing_period_policy = policy;
        self
    }

    /// Check that there is something to do.
    pub fn validate(&self) -> Result<()> {
        if self.symbols.is_empty() {
            return Err(PipelineError::Config("no symbols configured".to_string()));
        }
        if self.cadences.is_empty() {
            return Err(PipelineError::Config("no cadences configured".to_string()));
        }
        Ok(())
    }

    /// Open the configured store with the configured policies.
    pub fn open_store(&self) -> Result<SqliteStore> {
        Ok(self
            .store_location
            .open()?
            .with_company_policy(self.company_policy)
            .with_period_policy(self.existing_period_policy))
    }
}

/// Parse a comma-separated symbol list.
pub fn parse_symbols(list: &str) -> Vec<String> {
    normalize_symbols(list.split(','))
}

/// Trim, uppercase and de-duplicate symbols, keeping first occurrence order.
fn normalize_symbols(symbols: impl IntoIterator<Item = impl AsRef<str>>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for symbol in symbols {
        let symbol = symbol.as_ref().trim().to_uppercase();
        if !symbol.is_empty() && !out.contains(&symbol) {
            out.push(symbol);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_symbols() {
        assert_eq!(
            parse_symbols(" msft, AAPL,,msft ,nvda"),
            vec!["MSFT", "AAPL", "NVDA"]
        );
        assert!(parse_symbols(" , ").is_empty());
    }

    #[test]
    fn test_defaults() {
        let config = PipelineConfig::new(DEFAULT_SYMBOLS, ApiKey::new("k"));
        assert_eq!(config.symbols, vec!["MSFT"]);
        assert_eq!(config.cadences, vec![Cadence::Quarterly]);
        assert_eq!(config.company_policy, CompanyPolicy::Merge);
        assert_eq!(config.existing_period_policy, ExistingPeriodPolicy::Skip);
        assert_eq!(config.store_location, StoreLocation::InMemory);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate() {
        let config = PipelineConfig::new(Vec::<String>::new(), ApiKey::new("k"));
        assert!(config.validate().is_err());

        let config = PipelineConfig::new(["X"], ApiKey::new("k")).with_cadences([]);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_cadences_are_deduplicated() {
        let config = PipelineConfig::new(["X"], ApiKey::new("k")).with_cadences([
            Cadence::Annual,
            Cadence::Quarterly,
            Cadence::Annual,
        ]);
        assert_eq!(config.cadences, vec![Cadence::Quarterly, Cadence::Annual]);
    }

    #[test]
    fn test_store_location_display() {
        assert_eq!(StoreLocation::InMemory.to_string(), ":memory:");
        assert_eq!(
            StoreLocation::Path(PathBuf::from("data/hobart.db")).to_string(),
            "data/hobart.db"
        );
    }

    #[test]
    fn test_open_store_creates_parent_dir() {
        let dir = std::env::temp_dir().join(format!("hobart-config-{}", std::process::id()));
        let path = dir.join("nested").join("hobart.db");
        let config = PipelineConfig::new(["X"], ApiKey::new("k"))
            .with_store(StoreLocation::Path(path.clone()));

        let store = config.open_store().unwrap();
        assert_eq!(store.stats().unwrap().companies, 0);
        assert!(path.exists());

        drop(store);
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_read_only_open_does_not_create_store() {
        let dir = std::env::temp_dir().join(format!("hobart-ro-config-{}", std::process::id()));
        let location = StoreLocation::Path(dir.join("hobart.db"));

        let err = location.open_read_only().unwrap_err();
        assert!(matches!(err, PipelineError::StoreOpen { .. }));
        assert!(!dir.exists());
    }

    #[test]
    fn test_store_under_a_file_fails_to_open() {
        let blocker = std::env::temp_dir().join(format!("hobart-blocker-{}", std::process::id()));
        std::fs::write(&blocker, b"not a directory").unwrap();
        let location = StoreLocation::Path(blocker.join("hobart.db"));

        let err = location.open().unwrap_err();
        match err {
            PipelineError::StoreOpen { location: shown, .. } => {
                assert_eq!(shown, location.to_string());
            }
            other => panic!("expected StoreOpen, got {other:?}"),
        }

        std::fs::remove_file(&blocker).unwrap();
    }
}
