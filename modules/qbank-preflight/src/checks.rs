use std::path::Path;
use std::time::Duration;

use qbank_catalog::Repository;
use qbank_common::Config;
use qbank_notes::NoteServerSupervisor;

use crate::report::{CheckResult, HostMode, Severity};
use crate::path_writable;

const EXPECTED_TABLES: [&str; 4] = ["sources", "questions", "media", "logs"];

/// Check 1: the Rust toolchain the binary was compiled with must meet the
/// configured minimum. `compiled` and `minimum` are dotted version strings
/// (`"1.80.0"`); compared component-wise, not lexicographically.
pub fn runtime_version(compiled: &str, minimum: &str) -> CheckResult {
    match (parse_version(compiled), parse_version(minimum)) {
        (Some(c), Some(m)) if c >= m => {
            CheckResult::new("runtime_version", Severity::Info, format!("compiled with {compiled} (>= {minimum})"))
        }
        (Some(_), Some(_)) => CheckResult::new(
            "runtime_version",
            Severity::Fatal,
            format!("compiled with {compiled}, below configured minimum {minimum}"),
        ),
        _ => CheckResult::new(
            "runtime_version",
            Severity::Fatal,
            format!("could not parse version strings: compiled={compiled:?} minimum={minimum:?}"),
        ),
    }
}

fn parse_version(s: &str) -> Option<(u32, u32, u32)> {
    let mut parts = s.trim().split('.');
    let major = parts.next()?.parse().ok()?;
    let minor = parts.next().unwrap_or("0").parse().ok()?;
    let patch = parts.next().unwrap_or("0").parse().ok()?;
    Some((major, minor, patch))
}

/// Check 2: required runtime capabilities are present. The only one load-
/// bearing enough to check here is that the TLS backend reqwest needs
/// actually initializes.
pub fn runtime_capabilities() -> CheckResult {
    match reqwest::Client::builder().build() {
        Ok(_) => CheckResult::new("runtime_capabilities", Severity::Info, "HTTP client backend initialized"),
        Err(e) => CheckResult::new(
            "runtime_capabilities",
            Severity::Fatal,
            format!("HTTP client backend failed to initialize: {e}"),
        ),
    }
}

/// Check 3: log directory writable.
pub async fn log_directory_writable(log_dir: &Path) -> CheckResult {
    let path = log_dir.to_path_buf();
    match tokio::task::spawn_blocking(move || path_writable(&path)).await {
        Ok(Ok(())) => CheckResult::new("log_directory_writable", Severity::Info, "log directory is writable"),
        Ok(Err(e)) => CheckResult::new(
            "log_directory_writable",
            Severity::Fatal,
            format!("log directory {} is not writable: {e}", log_dir.display()),
        ),
        Err(e) => CheckResult::new("log_directory_writable", Severity::Fatal, format!("join error: {e}")),
    }
}

/// Check 4: config loadable and schema-complete. Every field on `Config` is
/// mandatory Rust-side once `from_env()` has returned, so the meaningful
/// runtime check left is that `database_url` parses as a Postgres
/// connection string.
pub fn config_schema_complete(config: &Config) -> CheckResult {
    if config.database_url.starts_with("postgres://") || config.database_url.starts_with("postgresql://") {
        CheckResult::new("config_schema_complete", Severity::Info, "configuration loaded and DATABASE_URL is well-formed")
    } else {
        CheckResult::new(
            "config_schema_complete",
            Severity::Fatal,
            format!("DATABASE_URL {:?} is not a postgres connection string", config.database_url),
        )
    }
}

/// Check 5: archive root and media root exist and are writable.
pub async fn essential_directories_writable(archive_root: &Path, media_root: &Path) -> CheckResult {
    let archive = archive_root.to_path_buf();
    let media = media_root.to_path_buf();
    let result = tokio::task::spawn_blocking(move || {
        path_writable(&archive).and_then(|()| path_writable(&media))
    })
    .await;

    match result {
        Ok(Ok(())) => CheckResult::new(
            "essential_directories_writable",
            Severity::Info,
            "archive root and media root are writable",
        ),
        Ok(Err(e)) => CheckResult::new(
            "essential_directories_writable",
            Severity::Fatal,
            format!("archive root {} or media root {} is not writable: {e}", archive_root.display(), media_root.display()),
        ),
        Err(e) => CheckResult::new("essential_directories_writable", Severity::Fatal, format!("join error: {e}")),
    }
}

/// Check 6: notes directory exists and is writable. WARN only — the
/// note-server feature degrades without it, nothing else does.
pub async fn notes_directory_writable(notes_dir: &Path) -> CheckResult {
    let path = notes_dir.to_path_buf();
    match tokio::task::spawn_blocking(move || path_writable(&path)).await {
        Ok(Ok(())) => CheckResult::new("notes_directory_writable", Severity::Info, "notes directory is writable"),
        Ok(Err(e)) => CheckResult::new(
            "notes_directory_writable",
            Severity::Warn,
            format!("notes directory {} is not writable, note-server feature will degrade: {e}", notes_dir.display()),
        ),
        Err(e) => CheckResult::new("notes_directory_writable", Severity::Warn, format!("join error: {e}")),
    }
}

/// Check 7: catalog reachable, migrations up to date, schema contains the
/// expected tables.
pub async fn catalog_reachable(repo: &Repository) -> CheckResult {
    if let Err(e) = sqlx::query("SELECT 1").execute(repo.pool()).await {
        return CheckResult::new("catalog_reachable", Severity::Fatal, format!("database unreachable: {e}"));
    }

    let rows: Vec<(String,)> = match sqlx::query_as(
        "SELECT table_name FROM information_schema.tables WHERE table_schema = 'public'",
    )
    .fetch_all(repo.pool())
    .await
    {
        Ok(rows) => rows,
        Err(e) => {
            return CheckResult::new("catalog_reachable", Severity::Fatal, format!("could not read schema: {e}"));
        }
    };

    let present: Vec<&str> = rows.iter().map(|(name,)| name.as_str()).collect();
    let missing: Vec<&str> = EXPECTED_TABLES
        .iter()
        .filter(|t| !present.contains(t))
        .copied()
        .collect();

    if missing.is_empty() {
        CheckResult::new("catalog_reachable", Severity::Info, "catalog reachable with expected schema")
    } else {
        CheckResult::new(
            "catalog_reachable",
            Severity::Fatal,
            format!("catalog reachable but missing tables: {}", missing.join(", ")),
        )
        .with_details(serde_json::json!({ "missing_tables": missing }))
    }
}

/// Check 8: external flashcard backend reachable within a hard timeout.
/// Degraded mode, not fatal — the core never depends on it for ingestion.
pub async fn flashcard_backend_reachable(url: Option<&str>, timeout: Duration) -> CheckResult {
    let Some(url) = url else {
        return CheckResult::new(
            "flashcard_backend_reachable",
            Severity::Warn,
            "FLASHCARD_BACKEND_URL not configured; flashcard sync disabled",
        );
    };

    let client = reqwest::Client::new();
    match tokio::time::timeout(timeout, client.get(url).send()).await {
        Ok(Ok(response)) if response.status().is_success() => {
            CheckResult::new("flashcard_backend_reachable", Severity::Info, "flashcard backend reachable")
        }
        Ok(Ok(response)) => CheckResult::new(
            "flashcard_backend_reachable",
            Severity::Warn,
            format!("flashcard backend returned {}", response.status()),
        ),
        Ok(Err(e)) => CheckResult::new(
            "flashcard_backend_reachable",
            Severity::Warn,
            format!("flashcard backend unreachable: {e}"),
        ),
        Err(_) => CheckResult::new(
            "flashcard_backend_reachable",
            Severity::Warn,
            format!("flashcard backend did not respond within {timeout:?}"),
        ),
    }
}

/// Check 9: note-server readiness, delegated to the supervisor.
pub async fn note_server_ready(supervisor: &NoteServerSupervisor) -> CheckResult {
    match supervisor.start().await {
        Ok(_) => CheckResult::new("note_server_ready", Severity::Info, "note-server running"),
        Err(e) => CheckResult::new("note_server_ready", Severity::Warn, format!("note-server not ready: {e}")),
    }
}

/// Check 10: UI toolkit imports. The desktop GUI is out of scope for this
/// core; this check is a named stub that always reports WARN, noting that
/// the desktop shell is responsible for validating its own toolkit.
pub fn ui_toolkit_imports(host_mode: HostMode) -> CheckResult {
    let mode = match host_mode {
        HostMode::Gui => "gui",
        HostMode::Headless => "headless",
    };
    CheckResult::new(
        "ui_toolkit_imports",
        Severity::Warn,
        format!("host_mode={mode}: UI toolkit validation is owned by the desktop shell, not this core"),
    )
}
