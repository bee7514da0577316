//! Fetch, extract and store, one symbol at a time.

use crate::config::PipelineConfig;
use crate::error::Result;
use crate::summary::{RunSummary, SymbolSummary};
use hobart_data::{DataError, FinancialSource, MetricExtractor, SqliteStore};

/// Ingestion pipeline over a [`FinancialSource`].
#[derive(Debug)]
pub struct Pipeline<S> {
    config: PipelineConfig,
    source: S,
    store: SqliteStore,
    extractor: MetricExtractor,
}

impl<S: FinancialSource> Pipeline<S> {
    /// Validate the config and open its store.
    ///
    /// # Errors
    /// [`PipelineError::StoreOpen`](crate::PipelineError::StoreOpen) when the store cannot be
    /// opened; this is the only error that prevents a run.
    pub fn open(config: PipelineConfig, source: S) -> Result<Self> {
        config.validate()?;
        let store = config.open_store()?;
        Ok(Self::with_store(config, source, store))
    }

    /// Use an already opened store.
    pub fn with_store(config: PipelineConfig, source: S, store: SqliteStore) -> Self {
        Self {
            config,
            source,
            store,
            extractor: MetricExtractor::default(),
        }
    }

    /// Replace the extractor.
    #[must_use]
    pub fn with_extractor(mut self, extractor: MetricExtractor) -> Self {
        self.extractor = extractor;
        self
    }

    /// The store the pipeline writes to.
    pub const fn store(&self) -> &SqliteStore {
        &self.store
    }

    /// Active configuration.
    pub const fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Ingest every configured symbol in order.
    ///
    /// A failing symbol is logged and recorded in its summary; later symbols still run.
    /// `on_symbol` is called after each symbol finishes.
    pub async fn run<F>(&self, mut on_symbol: F) -> RunSummary
    where
        F: FnMut(&SymbolSummary),
    {
        let mut summary = RunSummary::default();

        for symbol in &self.config.symbols {
            let outcome = self.ingest_symbol(symbol).await;
            on_symbol(&outcome);
            summary.symbols.push(outcome);
        }

        tracing::info!(
            symbols = summary.symbols.len(),
            succeeded = summary.succeeded(),
            failed = summary.failed(),
            "run complete"
        );
        summary
    }

    /// Fetch, extract and store one symbol.
    ///
    /// Errors are caught, logged and returned in [`SymbolSummary::error`] together with whatever
    /// was written before the failure. The company row is written before the periods; a failing
    /// period batch is rolled back while earlier cadences of the symbol stay committed.
    pub async fn ingest_symbol(&self, symbol: &str) -> SymbolSummary {
        let mut summary = SymbolSummary::new(symbol);
        if let Err(e) = self.ingest_into(symbol, &mut summary).await {
            tracing::warn!(%symbol, error = %e, "skipping symbol");
            summary.error = Some(e.to_string());
        }
        summary
    }

    async fn ingest_into(
        &self,
        symbol: &str,
        summary: &mut SymbolSummary,
    ) -> std::result::Result<(), DataError> {
        let profile = self.source.fetch_profile(symbol).await?;
        let company = profile
            .into_company(symbol)
            .ok_or_else(|| DataError::MissingData {
                symbol: symbol.to_string(),
                reason: "profile has no company name".to_string(),
            })?;
        summary.company = Some(self.store.upsert_company(&company)?);

        let payload = self.source.fetch_financial_series(symbol).await?;

        for cadence in &self.config.cadences {
            let extracted = self.extractor.extract(&payload, *cadence);
            summary.fetched += extracted.rows.len();
            summary.dropped += extracted.dropped.len();

            if extracted.rows.is_empty() {
                tracing::warn!(%symbol, %cadence, "no periods in payload");
                continue;
            }

            let report = self
                .store
                .upsert_period_metrics(symbol, *cadence, &extracted.rows)?;
            summary.report.merge(report);
        }

        tracing::info!(
            %symbol,
            fetched = summary.fetched,
            inserted = summary.report.inserted,
            updated = summary.report.updated,
            skipped = summary.report.skipped,
            dropped = summary.dropped,
            "symbol ingested"
        );

        Ok(())
    }
}
