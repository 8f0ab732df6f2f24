//! Integration tests exercising the full ingestion path against a real
//! Postgres container plus a temp-directory archive and media root.

use qbank_archive::{ArchiveWriter, MediaRelocator};
use qbank_catalog::testutil::postgres_pool;
use qbank_catalog::Repository;
use qbank_common::types::MediaBlob;
use qbank_ingest::{ExtractionPayload, Orchestrator};
use serde_json::json;

async fn test_orchestrator() -> (
    testcontainers::ContainerAsync<testcontainers_modules::postgres::Postgres>,
    tempfile::TempDir,
    tempfile::TempDir,
    Orchestrator,
    Repository,
) {
    let (container, pool) = postgres_pool().await;
    let repo = Repository::new(pool);
    repo.migrate().await.expect("migrations failed");

    let archive_dir = tempfile::tempdir().unwrap();
    let media_dir = tempfile::tempdir().unwrap();

    let archiver = ArchiveWriter::new(archive_dir.path());
    let relocator = MediaRelocator::new(media_dir.path());

    let orchestrator = Orchestrator::new(repo.clone(), archiver, relocator);
    (container, archive_dir, media_dir, orchestrator, repo)
}

fn sample_payload(origin_url: &str) -> ExtractionPayload {
    ExtractionPayload {
        origin_url: origin_url.to_string(),
        site_hint: "Question Bank Pro".to_string(),
        raw_html: "<html>q008</html>".to_string(),
        metadata_json: json!({"title": "sample"}),
        media: vec![MediaBlob {
            bytes: b"fake-image-bytes".to_vec(),
            suggested_filename: "figure.jpg".to_string(),
            mime_type: "image/jpeg".to_string(),
        }],
    }
}

#[tokio::test]
async fn ingest_one_persists_archive_and_catalog() {
    let (_container, _archive_dir, _media_dir, orchestrator, repo) = test_orchestrator().await;

    let outcome = orchestrator
        .ingest_one(sample_payload("https://bank.example/questions/q008"))
        .await
        .unwrap();

    assert!(outcome.catalog_persisted);
    assert!(outcome.catalog_error.is_none());
    assert!(outcome.archive_html_path.exists());
    assert!(outcome.archive_json_path.exists());
    assert_eq!(outcome.media_paths.len(), 1);

    let source = repo
        .get_or_create_source("question-bank-pro", None)
        .await
        .unwrap();
    let question = repo
        .get_question_by_source_key(source.source_id, "q008")
        .await
        .unwrap()
        .expect("question should be persisted");
    assert_eq!(question.question_id, outcome.question_id.unwrap());

    let media = repo.get_media_for_question(question.question_id).await.unwrap();
    assert_eq!(media.len(), 1);
    assert!(media[0].relative_path.contains("q008_img0"));
}

#[tokio::test]
async fn ingest_one_is_idempotent_on_business_key() {
    let (_container, _archive_dir, _media_dir, orchestrator, repo) = test_orchestrator().await;

    let first = orchestrator
        .ingest_one(sample_payload("https://bank.example/questions/q008"))
        .await
        .unwrap();
    let second = orchestrator
        .ingest_one(sample_payload("https://bank.example/questions/q008"))
        .await
        .unwrap();

    assert_eq!(first.question_id, second.question_id);

    let source = repo
        .get_or_create_source("question-bank-pro", None)
        .await
        .unwrap();
    let all = repo.get_all_questions(Some(source.source_id)).await.unwrap();
    assert_eq!(all.len(), 1, "re-ingesting the same business key must not duplicate the question");
}

#[tokio::test]
async fn ingest_one_auto_groups_within_window() {
    let (_container, _archive_dir, _media_dir, orchestrator, repo) = test_orchestrator().await;

    let first = orchestrator
        .ingest_one(sample_payload("https://bank.example/questions/q100"))
        .await
        .unwrap();
    let second = orchestrator
        .ingest_one(sample_payload("https://bank.example/questions/q101"))
        .await
        .unwrap();

    let source = repo
        .get_or_create_source("question-bank-pro", None)
        .await
        .unwrap();
    let child = repo
        .get_question_by_source_key(source.source_id, "q101")
        .await
        .unwrap()
        .unwrap();

    assert_eq!(child.parent_id, first.question_id);
    assert_ne!(first.question_id, second.question_id);
}
