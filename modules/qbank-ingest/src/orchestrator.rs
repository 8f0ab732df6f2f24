// Ingestion orchestrator: the single entry point every receiver
// (HTTP, backfill) funnels extraction payloads through.

use qbank_archive::{ArchiveWriter, MediaRelocator};
use qbank_common::error::IngestError;
use qbank_common::naming::{derive_source_question_key, normalize_source_name};
use qbank_common::types::NewMedia;
use qbank_common::types::{NewQuestion, QuestionStatus};
use qbank_catalog::Repository;

use crate::grouping::group;
use crate::payload::{ExtractionPayload, IngestionOutcome};

pub struct Orchestrator {
    repo: Repository,
    archiver: ArchiveWriter,
    relocator: MediaRelocator,
}

impl Orchestrator {
    pub fn new(repo: Repository, archiver: ArchiveWriter, relocator: MediaRelocator) -> Self {
        Self {
            repo,
            archiver,
            relocator,
        }
    }

    /// Run the full ingestion algorithm for one payload.
    ///
    /// The filesystem archive is durable ground truth: if writing it fails,
    /// this call aborts with `Err` and nothing is recorded anywhere. Once the
    /// archive is written, catalog persistence is best-effort — a failure
    /// there is folded into the returned outcome rather than propagated, so
    /// the archive copy still lets a later backfill pick up the slack.
    pub async fn ingest_one(&self, payload: ExtractionPayload) -> Result<IngestionOutcome, IngestError> {
        let source_name = normalize_source_name(&payload.site_hint);
        let source_question_key =
            derive_source_question_key(&payload.origin_url, &payload.raw_html);

        let archived = self
            .archiver
            .archive(
                &source_name,
                &payload.raw_html,
                &payload.metadata_json,
                &payload.media,
            )
            .await?;

        match self
            .persist_to_catalog(&source_name, &source_question_key, &payload, &archived)
            .await
        {
            Ok(question_id) => Ok(IngestionOutcome {
                archive_html_path: archived.html_path,
                archive_json_path: archived.json_path,
                media_paths: archived.media_paths,
                catalog_persisted: true,
                catalog_error: None,
                question_id: Some(question_id),
            }),
            Err(e) => {
                tracing::warn!(error = %e, "catalog persistence failed; archive copy retained");
                Ok(IngestionOutcome {
                    archive_html_path: archived.html_path,
                    archive_json_path: archived.json_path,
                    media_paths: archived.media_paths,
                    catalog_persisted: false,
                    catalog_error: Some(e.to_string()),
                    question_id: None,
                })
            }
        }
    }

    /// Degenerate ingestion path for the backfill scanner: the files
    /// are already sitting in the archive directory from a prior run, so
    /// this skips the archive write entirely and goes straight to
    /// catalog persistence using the caller-supplied paths. Idempotency
    /// still applies through `add_question`'s upsert, so re-running a
    /// backfill over the same archive directory is safe.
    #[allow(clippy::too_many_arguments)]
    pub async fn ingest_archived(
        &self,
        source_name: &str,
        source_question_key: &str,
        raw_html: String,
        metadata_json: serde_json::Value,
        html_path: std::path::PathBuf,
        json_path: std::path::PathBuf,
        archived_media_paths: Vec<std::path::PathBuf>,
        media: &[qbank_common::types::MediaBlob],
    ) -> Result<IngestionOutcome, IngestError> {
        let payload = ExtractionPayload {
            origin_url: String::new(),
            site_hint: source_name.to_string(),
            raw_html,
            metadata_json,
            media: media.to_vec(),
        };

        let archived = qbank_archive::ArchivedFiles {
            html_path,
            json_path,
            media_paths: archived_media_paths,
        };

        match self
            .persist_to_catalog(source_name, source_question_key, &payload, &archived)
            .await
        {
            Ok(question_id) => Ok(IngestionOutcome {
                archive_html_path: archived.html_path,
                archive_json_path: archived.json_path,
                media_paths: archived.media_paths,
                catalog_persisted: true,
                catalog_error: None,
                question_id: Some(question_id),
            }),
            Err(e) => {
                tracing::warn!(error = %e, "backfill catalog persistence failed");
                Ok(IngestionOutcome {
                    archive_html_path: archived.html_path,
                    archive_json_path: archived.json_path,
                    media_paths: archived.media_paths,
                    catalog_persisted: false,
                    catalog_error: Some(e.to_string()),
                    question_id: None,
                })
            }
        }
    }

    /// Everything after the archive write. Folds both catalog errors and
    /// media-relocation I/O errors into `IngestError` so the caller has one
    /// error type to report as `catalog_error` regardless of which step
    /// failed.
    ///
    /// The question insert, its media rows, and its parent linkage all run
    /// on one transaction and commit together — a failure partway through
    /// rolls the whole catalog write back rather than leaving a question
    /// row with partial media. Media attachment and auto-grouping only run
    /// when the question was freshly inserted: a re-ingest of an existing
    /// business key must not append duplicate media rows or re-run the
    /// grouping heuristic against the current clock.
    async fn persist_to_catalog(
        &self,
        source_name: &str,
        source_question_key: &str,
        payload: &ExtractionPayload,
        archived: &qbank_archive::ArchivedFiles,
    ) -> Result<uuid::Uuid, IngestError> {
        let extraction_path = archived
            .html_path
            .strip_prefix(self.archiver.root())
            .unwrap_or(archived.html_path.as_path())
            .display()
            .to_string();

        let mut tx = self.repo.begin().await.map_err(catalog_error)?;

        let source = self
            .repo
            .get_or_create_source_tx(&mut tx, source_name, None)
            .await
            .map_err(catalog_error)?;

        let (question, fresh) = self
            .repo
            .add_question_tx(
                &mut tx,
                NewQuestion {
                    source_id: source.source_id,
                    source_question_key: source_question_key.to_string(),
                    raw_html: payload.raw_html.clone(),
                    raw_metadata_json: payload.metadata_json.clone(),
                    status: QuestionStatus::Extracted,
                    extraction_path,
                },
            )
            .await
            .map_err(catalog_error)?;

        if fresh {
            for (i, blob) in payload.media.iter().enumerate() {
                let relative_path = self
                    .relocator
                    .relocate(
                        source_name,
                        source_question_key,
                        i,
                        &blob.bytes,
                        &blob.mime_type,
                    )
                    .await?;

                self.repo
                    .add_media_to_question_tx(
                        &mut tx,
                        question.question_id,
                        NewMedia {
                            media_role: "image".to_string(),
                            media_type: "image".to_string(),
                            mime_type: blob.mime_type.clone(),
                            relative_path: relative_path.display().to_string(),
                        },
                    )
                    .await
                    .map_err(catalog_error)?;
            }

            group(&self.repo, &mut tx, &question).await.map_err(catalog_error)?;
        }

        tx.commit()
            .await
            .map_err(|e| catalog_error(qbank_catalog::CatalogError::from(e)))?;

        Ok(question.question_id)
    }
}

/// `CatalogError` has no natural home in `IngestError` without creating a
/// dependency cycle (`qbank-catalog` already depends on `qbank-common`), so
/// it's unpacked here into the two variants it can actually hold.
fn catalog_error(e: qbank_catalog::CatalogError) -> IngestError {
    match e {
        qbank_catalog::CatalogError::Validation(v) => IngestError::Validation(v),
        qbank_catalog::CatalogError::Persistence(p) => IngestError::Persistence(p),
    }
}
