// Bulk backfill binary: a one-shot scanner meant to be run by hand
// (or from cron) against an archive directory, picking up any extractions
// the receiver wrote to disk but never got into the catalog.

use anyhow::{Context, Result};
use clap::Parser;
use qbank_archive::{ArchiveWriter, MediaRelocator};
use qbank_catalog::Repository;
use qbank_common::Config;
use qbank_ingest::Orchestrator;
use sqlx::postgres::PgPoolOptions;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "qbank-backfill")]
struct Cli {
    /// Archive directory to scan. Defaults to the configured archive root.
    #[arg(long)]
    archive_root: Option<std::path::PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt().with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("qbank=info"))).init();

    let cli = Cli::parse();
    let config = Config::from_env().context("failed to load configuration")?;

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await
        .context("failed to connect to catalog database")?;

    let repo = Repository::new(pool);
    repo.migrate().await.context("failed to run catalog migrations")?;

    let archive_root = cli.archive_root.unwrap_or_else(|| config.archive_root.clone());

    // The archiver and relocator are still wired into the orchestrator even
    // though `ingest_archived` never calls the archiver; media still needs
    // relocating out of the archive directory into the media root exactly
    // as a live receiver would.
    let archiver = ArchiveWriter::new(archive_root.clone());
    let relocator = MediaRelocator::new(config.media_root.clone());
    let orchestrator = Orchestrator::new(repo, archiver, relocator);

    info!(archive_root = %archive_root.display(), "starting backfill scan");
    let report = qbank_backfill::run_backfill(&archive_root, &orchestrator).await;

    info!("{}", report.to_summary());
    for error in &report.errors {
        tracing::warn!("{error}");
    }

    if report.skipped > 0 {
        std::process::exit(1);
    }
    Ok(())
}
