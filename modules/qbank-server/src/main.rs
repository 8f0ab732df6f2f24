use std::sync::atomic::Ordering;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use qbank_archive::{ArchiveWriter, MediaRelocator};
use qbank_catalog::Repository;
use qbank_common::Config;
use qbank_ingest::Orchestrator;
use qbank_notes::NoteServerSupervisor;
use qbank_preflight::HostMode;
use qbank_server::{build_router, AppState, PersistentLogLayer};
use sqlx::postgres::PgPoolOptions;
use tracing::{error, info};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Ingestion receiver for scraped question-bank extractions. Flags mirror
/// the recognized environment variables (`clap`'s `env` attribute lets
/// either set the same knob) on top of `Config::from_env()`.
#[derive(Parser, Debug)]
#[command(name = "qbank-server")]
struct Cli {
    /// Bypass the preflight validator entirely (also via SKIP_PREFLIGHT=1).
    #[arg(long, env = "SKIP_PREFLIGHT")]
    skip_preflight: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = Config::from_env().context("failed to load configuration")?;

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url)
        .await
        .context("failed to connect to catalog database")?;

    let repo = Repository::new(pool);
    repo.migrate().await.context("failed to run catalog migrations")?;

    init_tracing(&config, Arc::new(repo.clone()));

    info!(http_host = %config.http_host, http_port = config.http_port, "starting qbank-server");
    config.log_redacted();

    let archiver = ArchiveWriter::new(config.archive_root.clone());
    let relocator = MediaRelocator::new(config.media_root.clone());
    let orchestrator = Orchestrator::new(repo.clone(), archiver, relocator);

    let supervisor = Arc::new(NoteServerSupervisor::new(config.note_server_port, config.notes_dir.clone()));

    let state = Arc::new(AppState::new(orchestrator, repo.clone(), Arc::clone(&supervisor), config.clone()));

    if cli.skip_preflight || config.skip_preflight {
        info!("preflight skipped via --skip-preflight/SKIP_PREFLIGHT");
        state.preflight_passed.store(true, Ordering::Relaxed);
    } else {
        let report = qbank_preflight::run(&config, Some(&repo), Some(&supervisor), HostMode::Headless).await;
        for line in report.to_summary().lines() {
            info!("{line}");
        }
        if report.has_fatal() {
            error!("preflight reported one or more FATAL checks; refusing to start");
            std::process::exit(report.exit_code());
        }
        state.preflight_passed.store(true, Ordering::Relaxed);
    }

    let app = build_router(state);

    let addr = format!("{}:{}", config.http_host, config.http_port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(addr, "qbank-server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    supervisor.stop().await;
    info!("qbank-server shut down cleanly");
    Ok(())
}

fn init_tracing(config: &Config, repo: Arc<Repository>) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("qbank=info"));
    let persistent = PersistentLogLayer::new(repo, tracing::Level::WARN);

    let registry = tracing_subscriber::registry().with(env_filter).with(persistent);

    match config.log_format {
        qbank_common::config::LogFormat::Json => {
            registry.with(tracing_subscriber::fmt::layer().json()).init();
        }
        qbank_common::config::LogFormat::Compact => {
            registry.with(tracing_subscriber::fmt::layer().compact()).init();
        }
    }
}

/// Waits for Ctrl+C or SIGTERM, matching the graceful-shutdown idiom used
/// for the note-server subprocess itself.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c().await.expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("shutdown signal received");
}
