//! Preflight validator: a fixed, ordered sequence of environment,
//! config, and dependency checks run once at process start, reported as a
//! structured, severity-graded list so every check result is both loggable
//! and machine-readable.

pub mod checks;
pub mod report;

pub use report::{CheckResult, HostMode, PreflightReport, Severity};

use std::path::Path;
use std::time::Duration;

use qbank_catalog::Repository;
use qbank_common::Config;
use qbank_notes::NoteServerSupervisor;

/// Required runtime capability: reqwest must be able to build a client (TLS
/// backend initializes) — recorded here rather than by a build script, since
/// this core is not compiled in this exercise.
const MIN_SUPPORTED_RUST_VERSION: &str = "1.75.0";

const FLASHCARD_TIMEOUT: Duration = Duration::from_secs(2);

/// Run every preflight check in order against a loaded `Config`. `repo` and
/// `supervisor` are optional so this can run standalone (e.g. a `--preflight`
/// CLI mode) without a live database or note-server.
pub async fn run(
    config: &Config,
    repo: Option<&Repository>,
    supervisor: Option<&NoteServerSupervisor>,
    host_mode: HostMode,
) -> PreflightReport {
    let mut results = Vec::new();

    results.push(checks::runtime_version(MIN_SUPPORTED_RUST_VERSION, &config.min_rust_version));
    results.push(checks::runtime_capabilities());
    results.push(checks::log_directory_writable(&config.log_dir).await);
    results.push(checks::config_schema_complete(config));
    results.push(checks::essential_directories_writable(&config.archive_root, &config.media_root).await);
    results.push(checks::notes_directory_writable(&config.notes_dir).await);

    if let Some(repo) = repo {
        results.push(checks::catalog_reachable(repo).await);
    } else {
        results.push(CheckResult::new(
            "catalog_reachable",
            Severity::Fatal,
            "no repository supplied to preflight",
        ));
    }

    results.push(checks::flashcard_backend_reachable(config.flashcard_backend_url.as_deref(), FLASHCARD_TIMEOUT).await);

    if let Some(supervisor) = supervisor {
        results.push(checks::note_server_ready(supervisor).await);
    } else {
        results.push(CheckResult::new(
            "note_server_ready",
            Severity::Warn,
            "no note-server supervisor supplied to preflight",
        ));
    }

    results.push(checks::ui_toolkit_imports(host_mode));

    PreflightReport::new(results)
}

pub(crate) fn path_writable(dir: &Path) -> std::io::Result<()> {
    std::fs::create_dir_all(dir)?;
    let probe = dir.join(".qbank-preflight-write-probe");
    std::fs::write(&probe, b"ok")?;
    std::fs::remove_file(&probe)
}
