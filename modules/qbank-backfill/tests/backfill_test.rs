//! Integration tests for the backfill scanner, run against a real archive
//! directory (written through `ArchiveWriter` itself, so the test exercises
//! the exact naming convention the scanner has to parse) and a real Postgres
//! container.

use qbank_archive::{ArchiveWriter, MediaRelocator};
use qbank_catalog::testutil::postgres_pool;
use qbank_catalog::Repository;
use qbank_common::types::MediaBlob;
use qbank_ingest::Orchestrator;
use serde_json::json;

async fn seed_archive(archive_dir: &std::path::Path, source: &str, html: &str) {
    let writer = ArchiveWriter::new(archive_dir);
    writer
        .archive(
            source,
            html,
            &json!({"title": "seeded"}),
            &[MediaBlob {
                bytes: b"fake-image-bytes".to_vec(),
                suggested_filename: "figure.jpg".to_string(),
                mime_type: "image/jpeg".to_string(),
            }],
        )
        .await
        .unwrap();
}

#[tokio::test]
async fn backfill_ingests_well_formed_triples() {
    let (_container, pool) = postgres_pool().await;
    let repo = Repository::new(pool);
    repo.migrate().await.unwrap();

    let archive_dir = tempfile::tempdir().unwrap();
    let media_dir = tempfile::tempdir().unwrap();
    seed_archive(archive_dir.path(), "sourcea", "<html>backfilled</html>").await;

    let orchestrator = Orchestrator::new(
        repo.clone(),
        ArchiveWriter::new(archive_dir.path()),
        MediaRelocator::new(media_dir.path()),
    );

    let report = qbank_backfill::run_backfill(archive_dir.path(), &orchestrator).await;

    assert_eq!(report.scanned, 1);
    assert_eq!(report.ingested, 1);
    assert_eq!(report.skipped, 0);
    assert!(report.errors.is_empty());

    let source = repo.get_or_create_source("sourcea", None).await.unwrap();
    let all = repo.get_all_questions(Some(source.source_id)).await.unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].raw_html, "<html>backfilled</html>");
}

#[tokio::test]
async fn backfill_is_idempotent_across_runs() {
    let (_container, pool) = postgres_pool().await;
    let repo = Repository::new(pool);
    repo.migrate().await.unwrap();

    let archive_dir = tempfile::tempdir().unwrap();
    let media_dir = tempfile::tempdir().unwrap();
    seed_archive(archive_dir.path(), "sourceb", "<html>same-content</html>").await;

    let orchestrator = Orchestrator::new(
        repo.clone(),
        ArchiveWriter::new(archive_dir.path()),
        MediaRelocator::new(media_dir.path()),
    );

    let first = qbank_backfill::run_backfill(archive_dir.path(), &orchestrator).await;
    let second = qbank_backfill::run_backfill(archive_dir.path(), &orchestrator).await;

    assert_eq!(first.ingested, 1);
    assert_eq!(second.ingested, 1, "re-scanning the same archive directory should not error");

    let source = repo.get_or_create_source("sourceb", None).await.unwrap();
    let all = repo.get_all_questions(Some(source.source_id)).await.unwrap();
    assert_eq!(all.len(), 1, "idempotent business key must not duplicate the question");

    let media = repo.get_media_for_question(all[0].question_id).await.unwrap();
    assert_eq!(media.len(), 1, "re-scanning an existing question must not duplicate its media rows");
}

#[tokio::test]
async fn backfill_skips_triple_missing_json_sidecar() {
    let (_container, pool) = postgres_pool().await;
    let repo = Repository::new(pool);
    repo.migrate().await.unwrap();

    let archive_dir = tempfile::tempdir().unwrap();
    let media_dir = tempfile::tempdir().unwrap();

    // Write only an HTML file, matching the archive's naming convention,
    // without its JSON sidecar -- simulating a crash mid-write.
    tokio::fs::write(
        archive_dir.path().join("20260101_120000_sourcec_0_ab12cd.html"),
        "<html>partial</html>",
    )
    .await
    .unwrap();

    let orchestrator = Orchestrator::new(
        repo,
        ArchiveWriter::new(archive_dir.path()),
        MediaRelocator::new(media_dir.path()),
    );

    let report = qbank_backfill::run_backfill(archive_dir.path(), &orchestrator).await;

    assert_eq!(report.scanned, 1);
    assert_eq!(report.ingested, 0);
    assert_eq!(report.skipped, 1);
    assert!(report.errors[0].contains("missing JSON sidecar"));
}
