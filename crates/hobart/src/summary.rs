//! Per-symbol and per-run summaries.

use hobart_data::{CompanyUpsert, UpsertReport};
use serde::Serialize;
use std::fmt;

/// Outcome of one symbol.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SymbolSummary {
    /// Stock symbol
    pub symbol: String,
    /// What happened to the company row, if the profile got that far
    pub company: Option<CompanyUpsert>,
    /// Period rows produced by extraction, across cadences
    pub fetched: usize,
    /// Period row counts from the store
    pub report: UpsertReport,
    /// Observations dropped for a malformed period
    pub dropped: usize,
    /// Error that stopped the symbol
    pub error: Option<String>,
}

impl SymbolSummary {
    /// Empty summary for a symbol.
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            company: None,
            fetched: 0,
            report: UpsertReport::default(),
            dropped: 0,
            error: None,
        }
    }

    /// Whether the symbol completed.
    pub const fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Outcome of a whole run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunSummary {
    /// Symbol summaries in processing order
    pub symbols: Vec<SymbolSummary>,
}

impl RunSummary {
    /// Number of symbols that completed.
    pub fn succeeded(&self) -> usize {
        self.symbols.iter().filter(|s| s.is_ok()).count()
    }

    /// Number of symbols that failed.
    pub fn failed(&self) -> usize {
        self.symbols.len() - self.succeeded()
    }

    /// Row counts summed over all symbols.
    pub fn totals(&self) -> UpsertReport {
        let mut total = UpsertReport::default();
        for s in &self.symbols {
            total.merge(s.report);
        }
        total
    }

    /// Observations dropped over all symbols.
    pub fn dropped(&self) -> usize {
        self.symbols.iter().map(|s| s.dropped).sum()
    }

    /// Render as a fixed-width table.
    pub fn to_ascii_table(&self) -> String {
        let mut output = String::new();

        output.push_str(&format!(
            "\nIngestion Summary: {} symbols, {} ok, {} failed\n",
            self.symbols.len(),
            self.succeeded(),
            self.failed()
        ));
        output.push_str(&"=".repeat(80));
        output.push('\n');

        output.push_str(&format!(
            "{:<10} {:>9} {:>9} {:>9} {:>9} {:>9}  {}\n",
            "Symbol", "Fetched", "Inserted", "Updated", "Skipped", "Dropped", "Status"
        ));
        output.push_str(&"-".repeat(80));
        output.push('\n');

        for s in &self.symbols {
            output.push_str(&format!(
                "{:<10} {:>9} {:>9} {:>9} {:>9} {:>9}  {}\n",
                s.symbol,
                s.fetched,
                s.report.inserted,
                s.report.updated,
                s.report.skipped,
                s.dropped,
                s.error.as_deref().unwrap_or("ok")
            ));
        }

        output.push_str(&"-".repeat(80));
        output.push('\n');

        let totals = self.totals();
        output.push_str(&format!(
            "{:<10} {:>9} {:>9} {:>9} {:>9} {:>9}\n",
            "Total",
            self.symbols.iter().map(|s| s.fetched).sum::<usize>(),
            totals.inserted,
            totals.updated,
            totals.skipped,
            self.dropped()
        ));

        output
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_ascii_table())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary() -> RunSummary {
        let mut ok = SymbolSummary::new("MSFT");
        ok.company = Some(CompanyUpsert::Inserted);
        ok.fetched = 4;
        ok.report = UpsertReport {
            inserted: 3,
            skipped: 1,
            updated: 0,
        };
        ok.dropped = 2;

        let mut failed = SymbolSummary::new("ZZZZ");
        failed.error = Some("no profile".to_string());

        RunSummary {
            symbols: vec![ok, failed],
        }
    }

    #[test]
    fn test_counts() {
        let summary = summary();
        assert_eq!(summary.succeeded(), 1);
        assert_eq!(summary.failed(), 1);
        assert_eq!(summary.totals().inserted, 3);
        assert_eq!(summary.totals().skipped, 1);
        assert_eq!(summary.dropped(), 2);
    }

    #[test]
    fn test_ascii_table() {
        let table = summary().to_string();
        assert!(table.contains("2 symbols, 1 ok, 1 failed"));
        assert!(table.contains("MSFT"));
        assert!(table.contains("no profile"));
        assert!(table.contains("Total"));
    }
}
