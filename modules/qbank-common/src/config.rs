use std::env;
use std::path::PathBuf;

use crate::error::ConfigError;

/// Application configuration loaded from environment variables.
///
/// Mirrors the `from_env` idiom used across every entrypoint: required
/// variables produce a clear `ConfigError` rather than a panic, so preflight
/// can run this and report a FATAL without taking the process down first.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub archive_root: PathBuf,
    pub media_root: PathBuf,
    pub notes_dir: PathBuf,
    pub note_server_port: u16,
    pub flashcard_backend_url: Option<String>,
    pub flashcard_backend_version: Option<String>,
    pub log_dir: PathBuf,
    pub skip_preflight: bool,
    pub http_host: String,
    pub http_port: u16,
    pub cors_origins: Vec<String>,
    pub min_rust_version: String,
    pub log_format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Compact,
    Json,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Only `DATABASE_URL` is required in production; everywhere else we fall
    /// back to a documented default so a bare `cargo run` works against a
    /// local Postgres with zero setup.
    pub fn from_env() -> Result<Self, ConfigError> {
        let database_url = env::var("DATABASE_URL")
            .unwrap_or_else(|_| "postgres://localhost/qbank".to_string());

        let note_server_port = parse_env("NOTE_SERVER_PORT", 8_081)?;
        let http_port = parse_env("HTTP_PORT", 4_000)?;

        let cors_origins: Vec<String> = env::var("CORS_ORIGINS")
            .unwrap_or_default()
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let log_format = match env::var("LOG_FORMAT").as_deref() {
            Ok("json") => LogFormat::Json,
            _ => LogFormat::Compact,
        };

        Ok(Self {
            database_url,
            archive_root: env_path("ARCHIVE_ROOT", "./data/archive"),
            media_root: env_path("MEDIA_ROOT", "./data/media"),
            notes_dir: env_path("NOTES_DIR", "./data/notes"),
            note_server_port,
            flashcard_backend_url: env::var("FLASHCARD_BACKEND_URL").ok(),
            flashcard_backend_version: env::var("FLASHCARD_BACKEND_VERSION").ok(),
            log_dir: env_path("LOG_DIR", "./data/logs"),
            skip_preflight: env::var("SKIP_PREFLIGHT")
                .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
                .unwrap_or(false),
            http_host: env::var("HTTP_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            http_port,
            cors_origins,
            min_rust_version: env::var("MIN_RUST_VERSION")
                .unwrap_or_else(|_| "1.75.0".to_string()),
            log_format,
        })
    }

    /// Log variable *presence* and length for sensitive values, never values.
    pub fn log_redacted(&self) {
        tracing::info!(
            database_url.len = self.database_url.len(),
            archive_root = %self.archive_root.display(),
            media_root = %self.media_root.display(),
            notes_dir = %self.notes_dir.display(),
            note_server_port = self.note_server_port,
            http_host = %self.http_host,
            http_port = self.http_port,
            flashcard_backend_configured = self.flashcard_backend_url.is_some(),
            "loaded configuration",
        );
    }
}

fn env_path(key: &str, default: &str) -> PathBuf {
    env::var(key).map(PathBuf::from).unwrap_or_else(|_| PathBuf::from(default))
}

fn parse_env(key: &'static str, default: u16) -> Result<u16, ConfigError> {
    match env::var(key) {
        Ok(raw) => raw.parse().map_err(|_| ConfigError::InvalidVar {
            name: key,
            message: format!("{raw:?} is not a valid port"),
        }),
        Err(_) => Ok(default),
    }
}
