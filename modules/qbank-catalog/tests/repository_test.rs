//! Integration tests against a real Postgres container. Covers business-key
//! uniqueness, source idempotence, round-trip reads, and grouping-window
//! correctness at the repository layer.

use chrono::Utc;
use qbank_catalog::Repository;
use qbank_catalog::testutil::postgres_pool;
use qbank_common::types::{NewMedia, NewQuestion, QuestionStatus};
use serde_json::json;

async fn repo_with_migrations() -> (testcontainers::ContainerAsync<testcontainers_modules::postgres::Postgres>, Repository) {
    let (container, pool) = postgres_pool().await;
    let repo = Repository::new(pool);
    repo.migrate().await.expect("migrations failed");
    (container, repo)
}

fn sample_question(source_id: uuid::Uuid, key: &str) -> NewQuestion {
    NewQuestion {
        source_id,
        source_question_key: key.to_string(),
        raw_html: "<html>q</html>".to_string(),
        raw_metadata_json: json!({"title": "sample"}),
        status: QuestionStatus::Extracted,
        extraction_path: format!("20260101_000000_source_0.html"),
    }
}

#[tokio::test]
async fn get_or_create_source_is_idempotent() {
    let (_container, repo) = repo_with_migrations().await;

    let a = repo.get_or_create_source("SourceA", None).await.unwrap();
    let b = repo.get_or_create_source("SourceA", None).await.unwrap();
    let c = repo.get_or_create_source("SourceA", Some("ignored on repeat")).await.unwrap();

    assert_eq!(a.source_id, b.source_id);
    assert_eq!(a.source_id, c.source_id);
}

#[tokio::test]
async fn add_question_dedupes_on_business_key() {
    let (_container, repo) = repo_with_migrations().await;
    let source = repo.get_or_create_source("SourceA", None).await.unwrap();

    let (first, first_fresh) = repo
        .add_question(sample_question(source.source_id, "q008"))
        .await
        .unwrap();
    let (second, second_fresh) = repo
        .add_question(sample_question(source.source_id, "q008"))
        .await
        .unwrap();

    assert!(first_fresh);
    assert!(!second_fresh);
    assert_eq!(first.question_id, second.question_id);
}

#[tokio::test]
async fn add_question_then_lookup_round_trips() {
    let (_container, repo) = repo_with_migrations().await;
    let source = repo.get_or_create_source("SourceA", None).await.unwrap();

    let (inserted, _) = repo
        .add_question(sample_question(source.source_id, "q008"))
        .await
        .unwrap();

    let fetched = repo
        .get_question_by_source_key(source.source_id, "q008")
        .await
        .unwrap()
        .expect("question should exist");

    assert_eq!(inserted.question_id, fetched.question_id);
    assert_eq!(fetched.source_question_key, "q008");
}

#[tokio::test]
async fn media_is_not_deduplicated_by_relative_path() {
    let (_container, repo) = repo_with_migrations().await;
    let source = repo.get_or_create_source("SourceA", None).await.unwrap();
    let (question, _) = repo
        .add_question(sample_question(source.source_id, "q008"))
        .await
        .unwrap();

    let media = NewMedia {
        media_role: "image".to_string(),
        media_type: "image".to_string(),
        mime_type: "image/jpeg".to_string(),
        relative_path: "SourceA/q008_img0.jpg".to_string(),
    };

    repo.add_media_to_question(question.question_id, media.clone())
        .await
        .unwrap();
    repo.add_media_to_question(question.question_id, media)
        .await
        .unwrap();

    let all = repo.get_media_for_question(question.question_id).await.unwrap();
    assert_eq!(all.len(), 2);
}

#[tokio::test]
async fn grouping_candidate_respects_window_and_exclusions() {
    let (_container, repo) = repo_with_migrations().await;
    let source = repo.get_or_create_source("SourceA", None).await.unwrap();

    let (parent, _) = repo
        .add_question(sample_question(source.source_id, "q100"))
        .await
        .unwrap();

    let now = Utc::now();

    // Within the window: candidate found.
    let within = repo
        .find_group_candidate(source.source_id, uuid::Uuid::new_v4(), now + chrono::Duration::seconds(60))
        .await
        .unwrap();
    assert_eq!(within.map(|q| q.question_id), Some(parent.question_id));

    // Excludes itself.
    let excludes_self = repo
        .find_group_candidate(source.source_id, parent.question_id, now + chrono::Duration::seconds(60))
        .await
        .unwrap();
    assert!(excludes_self.is_none());

    // Outside the window (6 minutes later): no candidate.
    let outside = repo
        .find_group_candidate(source.source_id, uuid::Uuid::new_v4(), now + chrono::Duration::minutes(6))
        .await
        .unwrap();
    assert!(outside.is_none());
}

#[tokio::test]
async fn grouping_never_overrides_an_existing_parent() {
    let (_container, repo) = repo_with_migrations().await;
    let source = repo.get_or_create_source("SourceA", None).await.unwrap();

    let (a, _) = repo.add_question(sample_question(source.source_id, "a")).await.unwrap();
    let (b, _) = repo.add_question(sample_question(source.source_id, "b")).await.unwrap();
    repo.set_parent(b.question_id, a.question_id).await.unwrap();

    // b already has a parent, so it must never show up as a grouping candidate.
    let candidate = repo
        .find_group_candidate(source.source_id, uuid::Uuid::new_v4(), Utc::now() + chrono::Duration::seconds(30))
        .await
        .unwrap();
    assert_eq!(candidate.map(|q| q.question_id), Some(a.question_id));
}
