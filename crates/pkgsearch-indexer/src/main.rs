//! Package search indexer entry point.

use std::sync::Arc;

use clap::Parser;
use log::info;
use pkgsearch_indexer::config::IndexerConfig;
use pkgsearch_indexer::lock::PgLocker;
use pkgsearch_indexer::runner::{Indexer, IndexerOptions, RunOutcome, Selection};
use pkgsearch_indexer::signals::RedisSignals;
use pkgsearch_indexer::store::PgPackageStore;
use pkgsearch_solr::client::SolrClient;

#[derive(Parser)]
#[command(name = "pkgsearch-indexer", about = "Indexes packages in the search engine")]
struct Cli {
    /// Force a re-indexing of all packages, clearing the index first
    #[arg(long)]
    force: bool,
    /// Index all packages without clearing the index first
    #[arg(long)]
    all: bool,
    /// Log progress for every package
    #[arg(short, long)]
    verbose: bool,
    /// Package name to index
    package: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let default_filter = if cli.verbose { "info,pkgsearch_indexer=debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    let config = IndexerConfig::from_env()?;
    let pool = sqlx::PgPool::connect(&config.database_url).await?;
    let engine = SolrClient::new(&config.solr)?;
    let signals = RedisSignals::connect(&config.redis_url).await?;

    let indexer = Indexer::new(
        Arc::new(PgPackageStore::new(pool.clone())),
        Arc::new(engine),
        Arc::new(signals),
        Arc::new(PgLocker::new(pool)),
        IndexerOptions::from(&config),
    );

    let selection = Selection::from_flags(cli.package, cli.force, cli.all);
    match indexer.run(&selection).await? {
        RunOutcome::Skipped(reason) => info!("nothing indexed: {reason}"),
        RunOutcome::Completed(report) => {
            info!("done: {} of {} packages indexed", report.indexed, report.total);
        }
    }
    Ok(())
}
