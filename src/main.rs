use clap::{Parser, Subcommand, ValueEnum};
use std::sync::Arc;
use tracing::{error, warn};

use disclosure_scraper::apis::house_trading::HouseTradingApi;
use disclosure_scraper::apis::senate_trading::SenateTradingApi;
use disclosure_scraper::apis::DisclosureSource;
use disclosure_scraper::config::Config;
use disclosure_scraper::dedup::DedupStore;
use disclosure_scraper::error::Result;
use disclosure_scraper::logging;
use disclosure_scraper::pipeline::Pipeline;
use disclosure_scraper::storage::TransactionStore;

#[derive(Parser)]
#[command(name = "disclosure_scraper")]
#[command(about = "Congressional financial disclosure transaction scraper")]
#[command(version = "0.1.0")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum Source {
    Senate,
    House,
}

#[derive(Subcommand)]
enum Commands {
    /// Ingest disclosures from a trading feed into the store
    Ingest {
        /// Which disclosure feed to ingest
        #[arg(long, value_enum, default_value = "senate")]
        source: Source,
    },
    /// Fetch one filing and print every extracted section as JSON
    ParseFiling {
        /// Report id from the filing's view URL
        report_id: String,
        #[arg(long, value_enum, default_value = "senate")]
        source: Source,
    },
    /// Remove duplicate transactions already in the store
    Reconcile,
    /// Rewrite legacy transaction-type spellings to buy/sell
    FixTypes,
    /// Run ingest followed by reconcile
    Run {
        #[arg(long, value_enum, default_value = "senate")]
        source: Source,
    },
}

fn create_source(source: Source, config: &Config) -> Box<dyn DisclosureSource> {
    match source {
        Source::Senate => Box::new(SenateTradingApi::new(
            config.ingest.timeout_seconds,
            config.ingest.lookback_days,
        )),
        Source::House => Box::new(HouseTradingApi::new(config.ingest.timeout_seconds)),
    }
}

#[cfg(feature = "db")]
async fn create_store() -> Result<Arc<dyn TransactionStore>> {
    let store = disclosure_scraper::storage::LibsqlStore::new().await?;
    store.run_migrations().await?;
    Ok(Arc::new(store))
}

#[cfg(not(feature = "db"))]
async fn create_store() -> Result<Arc<dyn TransactionStore>> {
    warn!("Built without the `db` feature; using in-memory store (data is not persisted)");
    Ok(Arc::new(disclosure_scraper::storage::InMemoryStore::new()))
}

async fn run_ingest(source: Source, config: &Config, dedup: DedupStore) -> Result<()> {
    let pipeline = Pipeline::new(
        create_source(source, config),
        dedup,
        config.ingest.batch_length,
        config.ingest.delay_ms,
    );

    let result = pipeline.run().await?;
    println!("\n📊 Pipeline Results for {}:", result.source_name);
    println!("   Disclosures seen: {}", result.disclosures_seen);
    println!("   Disclosures skipped: {}", result.disclosures_skipped);
    println!("   Transactions found: {}", result.transactions_found);
    println!("   Transactions saved: {}", result.transactions_saved);
    println!("   Duplicates skipped: {}", result.duplicates_skipped);
    println!("   Rejected: {}", result.rejected);
    println!("   Errors: {}", result.errors.len());

    if !result.errors.is_empty() {
        warn!("{} errors encountered during pipeline run", result.errors.len());
        println!("\n⚠️  Errors encountered:");
        for error in &result.errors {
            println!("   - {error}");
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();
    logging::init_logging();

    let cli = Cli::parse();

    let config = Config::load().unwrap_or_else(|e| {
        warn!("Could not load config.toml ({}); using defaults", e);
        Config::default()
    });

    let store = create_store().await?;

    match cli.command {
        Commands::Ingest { source } => {
            println!("🔄 Running ingest pipeline...");
            let dedup = DedupStore::new(store.clone(), config.store.page_size);
            run_ingest(source, &config, dedup).await?;
        }
        Commands::ParseFiling { report_id, source } => {
            let feed = create_source(source, &config);
            match feed.fetch_filing(&report_id).await? {
                Some(html) => {
                    let filing = disclosure_scraper::parser::parse(&html);
                    println!("{}", serde_json::to_string_pretty(&filing)?);
                }
                None => {
                    println!("❌ No filing available for report {report_id}");
                }
            }
        }
        Commands::Reconcile => {
            println!("🧹 Removing duplicate transactions...");
            let dedup = DedupStore::new(store.clone(), config.store.page_size);
            match dedup.reconcile().await {
                Ok(report) => {
                    println!("✅ Reconcile completed");
                    println!("   Rows scanned: {}", report.rows_scanned);
                    println!("   Duplicate groups: {}", report.duplicate_groups);
                    println!("   Rows removed: {}", report.rows_removed);
                }
                Err(e) => {
                    error!("Reconcile failed: {}", e);
                    println!("❌ Reconcile failed: {e}");
                }
            }
        }
        Commands::FixTypes => {
            println!("🔧 Rewriting legacy transaction types...");
            let dedup = DedupStore::new(store.clone(), config.store.page_size);
            match dedup.fix_types().await {
                Ok(report) => {
                    println!("✅ Fix-types completed");
                    println!("   Rows scanned: {}", report.rows_scanned);
                    println!("   Rows updated: {}", report.rows_updated);
                }
                Err(e) => {
                    error!("Fix-types failed: {}", e);
                    println!("❌ Fix-types failed: {e}");
                }
            }
        }
        Commands::Run { source } => {
            println!("🚀 Running full pipeline (ingest + reconcile)...");
            let dedup = DedupStore::new(store.clone(), config.store.page_size);
            run_ingest(source, &config, dedup).await?;

            let dedup = DedupStore::new(store.clone(), config.store.page_size);
            match dedup.reconcile().await {
                Ok(report) => {
                    println!("✅ Full pipeline completed ({} duplicates removed)", report.rows_removed);
                }
                Err(e) => {
                    error!("Reconcile failed: {}", e);
                    println!("❌ Reconcile failed: {e}");
                }
            }
        }
    }
    Ok(())
}
