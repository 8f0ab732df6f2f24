//! Row types returned directly by `sqlx::query_as!`. Kept separate from the
//! public `qbank_common::types` structs (which have no sqlx dependency) and
//! converted at the repository boundary.

use chrono::{DateTime, Utc};
use qbank_common::types::{Media, Question, Source};
use uuid::Uuid;

#[derive(Debug, Clone, sqlx::FromRow)]
pub(crate) struct SourceRow {
    pub source_id: Uuid,
    pub name: String,
    pub description: Option<String>,
}

impl From<SourceRow> for Source {
    fn from(row: SourceRow) -> Self {
        Source {
            source_id: row.source_id,
            name: row.name,
            description: row.description,
        }
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub(crate) struct QuestionRow {
    pub question_id: Uuid,
    pub source_id: Uuid,
    pub source_question_key: String,
    pub raw_html: String,
    pub raw_metadata_json: serde_json::Value,
    pub status: String,
    pub extraction_path: String,
    pub parent_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<QuestionRow> for Question {
    fn from(row: QuestionRow) -> Self {
        Question {
            question_id: row.question_id,
            source_id: row.source_id,
            source_question_key: row.source_question_key,
            raw_html: row.raw_html,
            raw_metadata_json: row.raw_metadata_json,
            status: row.status,
            extraction_path: row.extraction_path,
            parent_id: row.parent_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub(crate) struct MediaRow {
    pub media_id: Uuid,
    pub question_id: Uuid,
    pub media_role: String,
    pub media_type: String,
    pub mime_type: String,
    pub relative_path: String,
}

impl From<MediaRow> for Media {
    fn from(row: MediaRow) -> Self {
        Media {
            media_id: row.media_id,
            question_id: row.question_id,
            media_role: row.media_role,
            media_type: row.media_type,
            mime_type: row.mime_type,
            relative_path: row.relative_path,
        }
    }
}
