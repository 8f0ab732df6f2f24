use std::path::PathBuf;

use qbank_common::types::MediaBlob;
use uuid::Uuid;

/// What a receiver (HTTP, backfill, or a future ingestion source) hands to
/// `ingest_one`. Carries no server-owned fields — those are assigned inside
/// the orchestrator.
#[derive(Debug, Clone)]
pub struct ExtractionPayload {
    pub origin_url: String,
    pub site_hint: String,
    pub raw_html: String,
    pub metadata_json: serde_json::Value,
    pub media: Vec<MediaBlob>,
}

/// Result of one `ingest_one` call. The filesystem archive succeeding is
/// unconditional (an archive failure aborts the call with `Err`); the catalog
/// side is best-effort and reported back via `catalog_persisted`/`catalog_error`
/// so a caller can surface a partial-success response instead of a 500.
#[derive(Debug, Clone)]
pub struct IngestionOutcome {
    pub archive_html_path: PathBuf,
    pub archive_json_path: PathBuf,
    pub media_paths: Vec<PathBuf>,
    pub catalog_persisted: bool,
    pub catalog_error: Option<String>,
    pub question_id: Option<Uuid>,
}
