//! Hobart CLI binary.
//!
//! Ingests quarterly fundamentals into the local store and derives model features from it.

mod store_path;

use clap::{Parser, Subcommand};
use hobart::config::{STORE_ENV, SYMBOLS_ENV};
use hobart::{DEFAULT_SYMBOLS, Pipeline, PipelineConfig, parse_symbols};
use hobart_data::{ApiKey, Cadence, CompanyPolicy, ExistingPeriodPolicy, FinnhubClient};
use hobart_features::{FeatureConfig, feature_frame, write_csv};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::process;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "hobart")]
#[command(about = "Hobart: quarterly fundamentals ingestion and feature derivation", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch fundamentals for the configured symbols and store them
    Run {
        /// Comma-separated symbols (default: MSFT)
        #[arg(long, env = SYMBOLS_ENV)]
        symbols: Option<String>,

        /// Store path
        #[arg(long, env = STORE_ENV)]
        store: Option<PathBuf>,

        /// Also ingest annual series
        #[arg(long)]
        annual: bool,

        /// Never update a company that is already stored
        #[arg(long)]
        insert_only: bool,

        /// Overwrite stored periods with freshly fetched values
        #[arg(long)]
        overwrite: bool,
    },

    /// Derive features for a stored symbol
    Features {
        /// Stock symbol
        #[arg(long)]
        symbol: String,

        /// Store path
        #[arg(long, env = STORE_ENV)]
        store: Option<PathBuf>,

        /// Moving-average window in periods
        #[arg(long, default_value = "4")]
        window: usize,

        /// Write CSV to this file instead of printing a table
        #[arg(long)]
        output: Option<PathBuf>,

        /// Derive from annual periods instead of quarterly
        #[arg(long, conflicts_with = "from_view")]
        annual: bool,

        /// Read the store's model_features view instead of deriving in process
        #[arg(long)]
        from_view: bool,
    },

    /// List the metric series Finnhub reports for a symbol
    Keys {
        /// Stock symbol
        #[arg(long)]
        symbol: String,

        /// List annual series instead of quarterly
        #[arg(long)]
        annual: bool,
    },

    /// Show store statistics
    Stats {
        /// Store path
        #[arg(long, env = STORE_ENV)]
        store: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    init_tracing();

    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn init_tracing() {
    let filter = || {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"))
    };
    let json_logging = std::env::var("RUST_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json_logging {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter())
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter())
            .with_writer(std::io::stderr)
            .init();
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            symbols,
            store,
            annual,
            insert_only,
            overwrite,
        } => {
            let symbols = symbols
                .map(|s| parse_symbols(&s))
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| DEFAULT_SYMBOLS.iter().map(|s| s.to_string()).collect());

            let api_key = ApiKey::from_env().unwrap_or_else(|_| {
                tracing::warn!("FINNHUB_API_KEY is not set, every fetch will fail");
                ApiKey::new("")
            });

            let mut cadences = vec![Cadence::Quarterly];
            if annual {
                cadences.push(Cadence::Annual);
            }

            let config = PipelineConfig::new(symbols, api_key)
                .with_store(store_path::resolve(store))
                .with_cadences(cadences)
                .with_company_policy(if insert_only {
                    CompanyPolicy::InsertOnly
                } else {
                    CompanyPolicy::Merge
                })
                .with_period_policy(if overwrite {
                    ExistingPeriodPolicy::Overwrite
                } else {
                    ExistingPeriodPolicy::Skip
                });

            ingest(config).await?;
        }
        Commands::Features {
            symbol,
            store,
            window,
            output,
            annual,
            from_view,
        } => {
            let cadence = if annual {
                Cadence::Annual
            } else {
                Cadence::Quarterly
            };
            show_features(&symbol.to_uppercase(), store, cadence, window, output, from_view)?;
        }
        Commands::Keys { symbol, annual } => {
            let cadence = if annual {
                Cadence::Annual
            } else {
                Cadence::Quarterly
            };
            list_keys(&symbol, cadence).await?;
        }
        Commands::Stats { store } => {
            show_stats(store)?;
        }
    }

    Ok(())
}

async fn ingest(config: PipelineConfig) -> Result<(), Box<dyn std::error::Error>> {
    println!("Store: {}", config.store_location);
    println!("Symbols: {}", config.symbols.join(", "));

    let client = FinnhubClient::new(config.api_key.clone())?;
    let pipeline = Pipeline::open(config, client)?;

    let pb = ProgressBar::new(pipeline.config().symbols.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("█▓░"),
    );
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_message("Fetching fundamentals...");

    let summary = pipeline
        .run(|s| {
            pb.set_message(s.symbol.clone());
            pb.inc(1);
        })
        .await;

    pb.finish_with_message(format!(
        "{} ok, {} failed",
        summary.succeeded(),
        summary.failed()
    ));
    println!("{}", summary);

    Ok(())
}

fn show_features(
    symbol: &str,
    store: Option<PathBuf>,
    cadence: Cadence,
    window: usize,
    output: Option<PathBuf>,
    from_view: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let store = store_path::resolve(store).open_read_only()?;

    let rows = if from_view {
        store.model_features(symbol)?
    } else {
        let config = FeatureConfig::for_cadence(cadence).with_window(window);
        hobart::features_for(&store, symbol, cadence, config)?
    };

    if rows.is_empty() {
        println!("No stored {} periods for {}", cadence, symbol);
        return Ok(());
    }

    match output {
        Some(path) => {
            let file = std::fs::File::create(&path)?;
            let written = write_csv(&rows, file)?;
            println!("Wrote {} rows to {}", written, path.display());
        }
        None => {
            let df = feature_frame(&rows)?;
            println!("{}", df);
        }
    }

    Ok(())
}

async fn list_keys(symbol: &str, cadence: Cadence) -> Result<(), Box<dyn std::error::Error>> {
    let client = FinnhubClient::from_env()?;
    let keys = client.metric_keys(symbol, cadence).await?;

    println!("{} {} series ({}):", symbol.to_uppercase(), cadence, keys.len());
    for key in keys {
        println!("  {}", key);
    }

    Ok(())
}

fn show_stats(store: Option<PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
    let location = store_path::resolve(store);
    let store = location.open_read_only()?;
    let stats = store.stats()?;

    println!("\nStore: {}", location);
    println!("{}", "=".repeat(40));
    println!("{:<24} {:>12}", "Companies", stats.companies);
    println!("{:<24} {:>12}", "Period rows", stats.period_rows);
    println!("{:<24} {:>12}", "  quarterly", stats.quarterly_rows);
    println!("{:<24} {:>12}", "  annual", stats.annual_rows);

    Ok(())
}
