use thiserror::Error;

/// Caller-supplied data violates a documented contract. Never retried.
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    #[error("empty source name")]
    EmptySourceName,

    #[error("invalid metadata JSON: {0}")]
    InvalidMetadata(String),

    #[error("unknown question status: {0}")]
    UnknownStatus(String),
}

/// The catalog engine refused the operation.
#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// A filesystem write for the archive or media root failed.
#[derive(Error, Debug)]
pub enum ArchiveError {
    #[error("archive io error at {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("no archived content for target: {0}")]
    NotFound(String),
}

/// The note-server subprocess failed to reach a running state.
#[derive(Error, Debug)]
pub enum SupervisorError {
    #[error("note-server executable not found on PATH")]
    ExecutableNotFound,

    #[error("port {0} is already bound by an unresponsive process")]
    PortInUse(u16),

    #[error("note-server exited before becoming healthy (code: {0:?})")]
    ExitedEarly(Option<i32>),

    #[error("health check budget exhausted after {0} attempts")]
    HealthCheckTimeout(u32),

    #[error("io error spawning note-server: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration is missing or malformed.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("required environment variable {0} is not set")]
    MissingVar(&'static str),

    #[error("environment variable {name} could not be parsed: {message}")]
    InvalidVar { name: &'static str, message: String },
}

/// Top-level error composing every layer the ingestion orchestrator touches.
#[derive(Error, Debug)]
pub enum IngestError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Archive(#[from] ArchiveError),

    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
