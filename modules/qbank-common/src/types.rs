use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ValidationError;

/// A study platform a question was scraped from. Created on first observation
/// of a name; never deleted while referenced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Source {
    pub source_id: Uuid,
    pub name: String,
    pub description: Option<String>,
}

/// Lifecycle status of a `Question`, from raw extraction to reviewed content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionStatus {
    Extracted,
    Parsed,
    Reviewed,
    Archived,
}

impl std::fmt::Display for QuestionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QuestionStatus::Extracted => write!(f, "extracted"),
            QuestionStatus::Parsed => write!(f, "parsed"),
            QuestionStatus::Reviewed => write!(f, "reviewed"),
            QuestionStatus::Archived => write!(f, "archived"),
        }
    }
}

impl std::str::FromStr for QuestionStatus {
    type Err = ValidationError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "extracted" => Ok(Self::Extracted),
            "parsed" => Ok(Self::Parsed),
            "reviewed" => Ok(Self::Reviewed),
            "archived" => Ok(Self::Archived),
            other => Err(ValidationError::UnknownStatus(other.to_string())),
        }
    }
}

/// A single extracted question. Identified by the business key
/// `(source_id, source_question_key)`, not by `question_id` alone.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
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

impl Question {
    pub fn status(&self) -> QuestionStatus {
        self.status.parse().unwrap_or(QuestionStatus::Extracted)
    }
}

/// Input to `Repository::add_question`. Deliberately separate from `Question`
/// so callers can't set server-owned fields like `question_id`/`created_at`.
#[derive(Debug, Clone)]
pub struct NewQuestion {
    pub source_id: Uuid,
    pub source_question_key: String,
    pub raw_html: String,
    pub raw_metadata_json: serde_json::Value,
    pub status: QuestionStatus,
    pub extraction_path: String,
}

/// A media asset (image, pdf, ...) attached to a `Question`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Media {
    pub media_id: Uuid,
    pub question_id: Uuid,
    pub media_role: String,
    pub media_type: String,
    pub mime_type: String,
    pub relative_path: String,
}

#[derive(Debug, Clone)]
pub struct NewMedia {
    pub media_role: String,
    pub media_type: String,
    pub mime_type: String,
    pub relative_path: String,
}

/// An append-only log line persisted by the `tracing` catalog sink.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogRecord {
    pub log_id: Uuid,
    pub level: String,
    pub logger_name: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewLogRecord {
    pub level: String,
    pub logger_name: String,
    pub message: String,
}

/// A single media blob attached to an extraction payload, before it has been
/// written anywhere. `suggested_filename` is advisory only — the archiver
/// and relocator both derive their own deterministic names.
#[derive(Debug, Clone)]
pub struct MediaBlob {
    pub bytes: Vec<u8>,
    pub suggested_filename: String,
    pub mime_type: String,
}
