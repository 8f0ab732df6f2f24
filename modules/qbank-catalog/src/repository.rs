// Repository: all mutating and read operations against the catalog.
// Wraps a `PgPool` rather than a long-lived session — every call acquires and
// releases a pooled connection, except the question+media+parent-linkage
// writes an ingestion makes together, which run inside a single
// `sqlx::Transaction` acquired via `begin()` and committed by the caller.

use chrono::{DateTime, Duration, Utc};
use qbank_common::grouping::grouping_window;
use qbank_common::types::{LogRecord, Media, NewLogRecord, NewMedia, NewQuestion, Question, Source};
use sqlx::{PgConnection, PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::error::{CatalogError, Result};
use crate::rows::{MediaRow, QuestionRow, SourceRow};

#[derive(Clone)]
pub struct Repository {
    pool: PgPool,
}

impl Repository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Run the embedded SQL migrations. Idempotent; safe to call on every
    /// startup.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| CatalogError::Persistence(e.into()))?;
        Ok(())
    }

    /// Open a transaction for a caller that needs several writes (question,
    /// media, parent linkage) to commit together. The caller is responsible
    /// for calling `tx.commit()` once every write has succeeded.
    pub async fn begin(&self) -> Result<Transaction<'static, Postgres>> {
        Ok(self.pool.begin().await?)
    }

    /// Get the Source named `name`, creating it if absent.
    ///
    /// Idempotent-upsert pattern: SELECT by unique key; if absent, INSERT; on
    /// a unique-violation raced by a concurrent caller, re-SELECT. Never
    /// relies on catching an exception as the primary control path.
    pub async fn get_or_create_source(
        &self,
        name: &str,
        description: Option<&str>,
    ) -> Result<Source> {
        let mut conn = self.pool.acquire().await?;
        Self::get_or_create_source_on(&mut conn, name, description).await
    }

    /// Same as `get_or_create_source`, but runs on an open transaction so it
    /// can commit together with the question/media/parent writes that follow
    /// it.
    pub async fn get_or_create_source_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        name: &str,
        description: Option<&str>,
    ) -> Result<Source> {
        Self::get_or_create_source_on(tx, name, description).await
    }

    async fn get_or_create_source_on(
        conn: &mut PgConnection,
        name: &str,
        description: Option<&str>,
    ) -> Result<Source> {
        let name = name.trim();
        if name.is_empty() {
            return Err(CatalogError::Validation(
                qbank_common::ValidationError::EmptySourceName,
            ));
        }

        if let Some(existing) = Self::find_source_by_name_on(conn, name).await? {
            return Ok(existing);
        }

        let inserted = sqlx::query_as::<_, SourceRow>(
            r#"
            INSERT INTO sources (name, description)
            VALUES ($1, $2)
            ON CONFLICT (name) DO NOTHING
            RETURNING source_id, name, description
            "#,
        )
        .bind(name)
        .bind(description)
        .fetch_optional(&mut *conn)
        .await?;

        match inserted {
            Some(row) => Ok(row.into()),
            // Lost the insert race to a concurrent caller; the row exists now.
            None => Self::find_source_by_name_on(conn, name)
                .await?
                .ok_or_else(|| {
                    CatalogError::Persistence(qbank_common::PersistenceError::Database(
                        sqlx::Error::RowNotFound,
                    ))
                }),
        }
    }

    async fn find_source_by_name_on(conn: &mut PgConnection, name: &str) -> Result<Option<Source>> {
        let row = sqlx::query_as::<_, SourceRow>(
            "SELECT source_id, name, description FROM sources WHERE name = $1",
        )
        .bind(name)
        .fetch_optional(&mut *conn)
        .await?;
        Ok(row.map(Into::into))
    }

    /// Insert a new Question, or return the existing row for its business
    /// key. The `bool` is `true` iff this call performed the insert.
    pub async fn add_question(&self, data: NewQuestion) -> Result<(Question, bool)> {
        let mut conn = self.pool.acquire().await?;
        Self::add_question_on(&mut conn, data).await
    }

    /// Same as `add_question`, but runs on an open transaction.
    pub async fn add_question_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        data: NewQuestion,
    ) -> Result<(Question, bool)> {
        Self::add_question_on(tx, data).await
    }

    async fn add_question_on(conn: &mut PgConnection, data: NewQuestion) -> Result<(Question, bool)> {
        if let Some(existing) =
            Self::get_question_by_source_key_on(conn, data.source_id, &data.source_question_key)
                .await?
        {
            return Ok((existing, false));
        }

        let inserted = sqlx::query_as::<_, QuestionRow>(
            r#"
            INSERT INTO questions
                (source_id, source_question_key, raw_html, raw_metadata_json, status, extraction_path)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (source_id, source_question_key) DO NOTHING
            RETURNING question_id, source_id, source_question_key, raw_html, raw_metadata_json,
                      status, extraction_path, parent_id, created_at, updated_at
            "#,
        )
        .bind(data.source_id)
        .bind(&data.source_question_key)
        .bind(&data.raw_html)
        .bind(&data.raw_metadata_json)
        .bind(data.status.to_string())
        .bind(&data.extraction_path)
        .fetch_optional(&mut *conn)
        .await?;

        match inserted {
            Some(row) => Ok((row.into(), true)),
            None => {
                let existing =
                    Self::get_question_by_source_key_on(conn, data.source_id, &data.source_question_key)
                        .await?
                        .ok_or_else(|| {
                            CatalogError::Persistence(qbank_common::PersistenceError::Database(
                                sqlx::Error::RowNotFound,
                            ))
                        })?;
                Ok((existing, false))
            }
        }
    }

    pub async fn get_question_by_source_key(
        &self,
        source_id: Uuid,
        key: &str,
    ) -> Result<Option<Question>> {
        let mut conn = self.pool.acquire().await?;
        Self::get_question_by_source_key_on(&mut conn, source_id, key).await
    }

    async fn get_question_by_source_key_on(
        conn: &mut PgConnection,
        source_id: Uuid,
        key: &str,
    ) -> Result<Option<Question>> {
        let row = sqlx::query_as::<_, QuestionRow>(
            r#"
            SELECT question_id, source_id, source_question_key, raw_html, raw_metadata_json,
                   status, extraction_path, parent_id, created_at, updated_at
            FROM questions
            WHERE source_id = $1 AND source_question_key = $2
            "#,
        )
        .bind(source_id)
        .bind(key)
        .fetch_optional(&mut *conn)
        .await?;
        Ok(row.map(Into::into))
    }

    pub async fn get_all_questions(&self, source_id: Option<Uuid>) -> Result<Vec<Question>> {
        let rows = match source_id {
            Some(id) => {
                sqlx::query_as::<_, QuestionRow>(
                    r#"
                    SELECT question_id, source_id, source_question_key, raw_html, raw_metadata_json,
                           status, extraction_path, parent_id, created_at, updated_at
                    FROM questions
                    WHERE source_id = $1
                    ORDER BY created_at ASC
                    "#,
                )
                .bind(id)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, QuestionRow>(
                    r#"
                    SELECT question_id, source_id, source_question_key, raw_html, raw_metadata_json,
                           status, extraction_path, parent_id, created_at, updated_at
                    FROM questions
                    ORDER BY created_at ASC
                    "#,
                )
                .fetch_all(&self.pool)
                .await?
            }
        };
        Ok(rows.into_iter().map(Into::into).collect())
    }

    pub async fn add_media_to_question(&self, question_id: Uuid, data: NewMedia) -> Result<Media> {
        let mut conn = self.pool.acquire().await?;
        Self::add_media_to_question_on(&mut conn, question_id, data).await
    }

    /// Same as `add_media_to_question`, but runs on an open transaction.
    pub async fn add_media_to_question_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        question_id: Uuid,
        data: NewMedia,
    ) -> Result<Media> {
        Self::add_media_to_question_on(tx, question_id, data).await
    }

    async fn add_media_to_question_on(
        conn: &mut PgConnection,
        question_id: Uuid,
        data: NewMedia,
    ) -> Result<Media> {
        let row = sqlx::query_as::<_, MediaRow>(
            r#"
            INSERT INTO media (question_id, media_role, media_type, mime_type, relative_path)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING media_id, question_id, media_role, media_type, mime_type, relative_path
            "#,
        )
        .bind(question_id)
        .bind(&data.media_role)
        .bind(&data.media_type)
        .bind(&data.mime_type)
        .bind(&data.relative_path)
        .fetch_one(&mut *conn)
        .await?;
        Ok(row.into())
    }

    pub async fn get_media_for_question(&self, question_id: Uuid) -> Result<Vec<Media>> {
        let rows = sqlx::query_as::<_, MediaRow>(
            "SELECT media_id, question_id, media_role, media_type, mime_type, relative_path \
             FROM media WHERE question_id = $1",
        )
        .bind(question_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    pub async fn update_question_status(&self, question_id: Uuid, status: &str) -> Result<()> {
        sqlx::query("UPDATE questions SET status = $1 WHERE question_id = $2")
            .bind(status)
            .bind(question_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Link `question_id` to `parent_id`. Never called on a question that
    /// already has a parent — callers check first via `find_group_candidate`.
    pub async fn set_parent(&self, question_id: Uuid, parent_id: Uuid) -> Result<()> {
        let mut conn = self.pool.acquire().await?;
        Self::set_parent_on(&mut conn, question_id, parent_id).await
    }

    /// Same as `set_parent`, but runs on an open transaction.
    pub async fn set_parent_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        question_id: Uuid,
        parent_id: Uuid,
    ) -> Result<()> {
        Self::set_parent_on(tx, question_id, parent_id).await
    }

    async fn set_parent_on(conn: &mut PgConnection, question_id: Uuid, parent_id: Uuid) -> Result<()> {
        sqlx::query("UPDATE questions SET parent_id = $1 WHERE question_id = $2")
            .bind(parent_id)
            .bind(question_id)
            .execute(&mut *conn)
            .await?;
        Ok(())
    }

    /// The auto-grouping candidate search: the most recent parentless
    /// question from the same source, strictly older than `created_at` and
    /// within the fixed grouping window.
    pub async fn find_group_candidate(
        &self,
        source_id: Uuid,
        exclude_id: Uuid,
        created_at: DateTime<Utc>,
    ) -> Result<Option<Question>> {
        let mut conn = self.pool.acquire().await?;
        Self::find_group_candidate_on(&mut conn, source_id, exclude_id, created_at).await
    }

    /// Same as `find_group_candidate`, but runs on an open transaction so
    /// the candidate search sees the question just inserted on that same
    /// transaction before it commits.
    pub async fn find_group_candidate_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        source_id: Uuid,
        exclude_id: Uuid,
        created_at: DateTime<Utc>,
    ) -> Result<Option<Question>> {
        Self::find_group_candidate_on(tx, source_id, exclude_id, created_at).await
    }

    async fn find_group_candidate_on(
        conn: &mut PgConnection,
        source_id: Uuid,
        exclude_id: Uuid,
        created_at: DateTime<Utc>,
    ) -> Result<Option<Question>> {
        let window: Duration = grouping_window();
        let lower_bound = created_at - window;

        let row = sqlx::query_as::<_, QuestionRow>(
            r#"
            SELECT question_id, source_id, source_question_key, raw_html, raw_metadata_json,
                   status, extraction_path, parent_id, created_at, updated_at
            FROM questions
            WHERE source_id = $1
              AND question_id != $2
              AND parent_id IS NULL
              AND created_at > $3
              AND created_at < $4
            ORDER BY created_at DESC, question_id DESC
            LIMIT 1
            "#,
        )
        .bind(source_id)
        .bind(exclude_id)
        .bind(lower_bound)
        .bind(created_at)
        .fetch_optional(&mut *conn)
        .await?;
        Ok(row.map(Into::into))
    }

    /// Append a log record. Used by the catalog logging sink; callers there
    /// swallow errors rather than propagate them, to avoid recursing back
    /// into the logging pipeline on a database hiccup.
    pub async fn insert_log(&self, data: NewLogRecord) -> Result<LogRecord> {
        let row: (Uuid, String, String, String, DateTime<Utc>) = sqlx::query_as(
            r#"
            INSERT INTO logs (level, logger_name, message)
            VALUES ($1, $2, $3)
            RETURNING log_id, level, logger_name, message, timestamp
            "#,
        )
        .bind(&data.level)
        .bind(&data.logger_name)
        .bind(&data.message)
        .fetch_one(&self.pool)
        .await?;

        Ok(LogRecord {
            log_id: row.0,
            level: row.1,
            logger_name: row.2,
            message: row.3,
            timestamp: row.4,
        })
    }
}
