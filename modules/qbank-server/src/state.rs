use std::sync::atomic::{AtomicBool, AtomicU64};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use qbank_catalog::Repository;
use qbank_common::Config;
use qbank_ingest::Orchestrator;
use qbank_notes::NoteServerSupervisor;

/// Shared state for every `/extract`/`/status`/`/healthz` handler. One
/// instance per process, behind an `Arc`, bundling the repository,
/// orchestrator, note-server supervisor, and config at startup.
pub struct AppState {
    pub orchestrator: Orchestrator,
    pub repo: Repository,
    pub supervisor: Arc<NoteServerSupervisor>,
    pub config: Config,
    pub started_at: DateTime<Utc>,
    pub total_received: AtomicU64,
    pub preflight_passed: AtomicBool,
}

impl AppState {
    pub fn new(
        orchestrator: Orchestrator,
        repo: Repository,
        supervisor: Arc<NoteServerSupervisor>,
        config: Config,
    ) -> Self {
        Self {
            orchestrator,
            repo,
            supervisor,
            config,
            started_at: Utc::now(),
            total_received: AtomicU64::new(0),
            preflight_passed: AtomicBool::new(false),
        }
    }
}
