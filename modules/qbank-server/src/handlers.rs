// HTTP receiver: the only entry point the userscript talks to. Every
// handler runs the orchestrator against its own pooled connection — no
// handler-level serialization.

use std::sync::atomic::Ordering;
use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use qbank_common::error::IngestError;
use qbank_common::types::MediaBlob;
use qbank_ingest::ExtractionPayload;
use tracing::{error, warn};

use crate::dto::{DatabaseDto, ErrorResponse, ExtractRequest, ExtractResponse, FilesDto, StatusResponse};
use crate::state::AppState;

pub async fn extract(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ExtractRequest>,
) -> impl IntoResponse {
    let mut media = Vec::with_capacity(body.images.len());
    for image in &body.images {
        let bytes = match BASE64.decode(&image.data_base64) {
            Ok(bytes) => bytes,
            Err(e) => {
                return error_response(
                    StatusCode::BAD_REQUEST,
                    format!("image {:?} has invalid base64 data: {e}", image.filename),
                );
            }
        };
        media.push(MediaBlob {
            bytes,
            suggested_filename: image.filename.clone(),
            mime_type: image.mime_type.clone(),
        });
    }

    let payload = ExtractionPayload {
        origin_url: body.url,
        site_hint: body.site,
        raw_html: body.html,
        metadata_json: body.metadata,
        media,
    };

    match state.orchestrator.ingest_one(payload).await {
        Ok(outcome) => {
            let extraction_count = state.total_received.fetch_add(1, Ordering::Relaxed) + 1;

            if !outcome.catalog_persisted {
                warn!(
                    error = outcome.catalog_error.as_deref().unwrap_or("unknown"),
                    "catalog persistence failed; archive copy retained"
                );
            }

            let response = ExtractResponse {
                status: "success",
                extraction_count,
                files: FilesDto {
                    html: outcome.archive_html_path.display().to_string(),
                    json: outcome.archive_json_path.display().to_string(),
                    images: outcome.media_paths.iter().map(|p| p.display().to_string()).collect(),
                },
                database: DatabaseDto {
                    persisted: outcome.catalog_persisted,
                    error: outcome.catalog_error,
                },
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(IngestError::Validation(e)) => error_response(StatusCode::BAD_REQUEST, e.to_string()),
        Err(e) => {
            error!(error = %e, "ingestion failed");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "extraction failed".to_string())
        }
    }
}

pub async fn status(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(StatusResponse {
        total_received: state.total_received.load(Ordering::Relaxed),
        started_at: state.started_at,
    })
}

/// Liveness endpoint for load balancers and process supervisors. Reports
/// healthy only once preflight has passed; independent of note-server/
/// flashcard health, which are both allowed to be degraded.
pub async fn healthz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    if state.preflight_passed.load(Ordering::Relaxed) {
        (StatusCode::OK, Json(serde_json::json!({ "status": "ok" }))).into_response()
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, Json(serde_json::json!({ "status": "starting" }))).into_response()
    }
}

fn error_response(status: StatusCode, message: String) -> axum::response::Response {
    (status, Json(ErrorResponse { status: "error", message })).into_response()
}
