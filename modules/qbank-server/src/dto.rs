//! Wire types for `POST /extract` and `GET /status`. Kept separate from
//! `qbank_ingest::ExtractionPayload` so the HTTP contract (base64 images,
//! snake_case JSON) can evolve independently of the orchestrator's input.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct ExtractRequest {
    pub url: String,
    pub site: String,
    pub html: String,
    #[serde(default = "default_metadata")]
    pub metadata: serde_json::Value,
    #[serde(default)]
    pub images: Vec<ImageDto>,
}

fn default_metadata() -> serde_json::Value {
    serde_json::Value::Object(Default::default())
}

#[derive(Debug, Deserialize)]
pub struct ImageDto {
    pub filename: String,
    pub mime_type: String,
    pub data_base64: String,
}

#[derive(Debug, Serialize)]
pub struct ExtractResponse {
    pub status: &'static str,
    pub extraction_count: u64,
    pub files: FilesDto,
    pub database: DatabaseDto,
}

#[derive(Debug, Serialize)]
pub struct FilesDto {
    pub html: String,
    pub json: String,
    pub images: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct DatabaseDto {
    pub persisted: bool,
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub total_received: u64,
    pub started_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub status: &'static str,
    pub message: String,
}
