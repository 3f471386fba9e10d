//! PostgreSQL submission repository implementation

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::DbResult;
use crate::models::SubmissionRow;
use crate::repo::{CreateSubmission, SubmissionChange, SubmissionRepository};

const SUBMISSION_COLUMNS: &str = r#"id, blogger_id, post_url, status, is_active,
           url_change_reason, submitted_at, reviewed_at, last_activated_at,
           revision, created_at, updated_at"#;

/// PostgreSQL submission repository
#[derive(Clone)]
pub struct PgSubmissionRepository {
    pool: PgPool,
}

impl PgSubmissionRepository {
    /// Create a new submission repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SubmissionRepository for PgSubmissionRepository {
    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<SubmissionRow>> {
        let sub = sqlx::query_as::<_, SubmissionRow>(&format!(
            "SELECT {SUBMISSION_COLUMNS} FROM submissions WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(sub)
    }

    async fn find_by_post_url(&self, post_url: &str) -> DbResult<Option<SubmissionRow>> {
        let sub = sqlx::query_as::<_, SubmissionRow>(&format!(
            "SELECT {SUBMISSION_COLUMNS} FROM submissions WHERE post_url = $1"
        ))
        .bind(post_url)
        .fetch_optional(&self.pool)
        .await?;

        Ok(sub)
    }

    async fn list_by_blogger(&self, blogger_id: Uuid) -> DbResult<Vec<SubmissionRow>> {
        let subs = sqlx::query_as::<_, SubmissionRow>(&format!(
            "SELECT {SUBMISSION_COLUMNS} FROM submissions WHERE blogger_id = $1 ORDER BY created_at"
        ))
        .bind(blogger_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(subs)
    }

    async fn list_listed_by_blogger(&self, blogger_id: Uuid) -> DbResult<Vec<SubmissionRow>> {
        let subs = sqlx::query_as::<_, SubmissionRow>(&format!(
            r#"
            SELECT {SUBMISSION_COLUMNS}
            FROM submissions
            WHERE blogger_id = $1 AND status = 'approved' AND is_active
            ORDER BY last_activated_at DESC, id
            "#
        ))
        .bind(blogger_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(subs)
    }

    async fn count_listed(&self, blogger_id: Uuid) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM submissions
            WHERE blogger_id = $1 AND status = 'approved' AND is_active
            "#,
        )
        .bind(blogger_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    async fn create(&self, sub: CreateSubmission) -> DbResult<SubmissionRow> {
        let row = sqlx::query_as::<_, SubmissionRow>(&format!(
            r#"
            INSERT INTO submissions (id, blogger_id, post_url, status, submitted_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {SUBMISSION_COLUMNS}
            "#
        ))
        .bind(sub.id)
        .bind(sub.blogger_id)
        .bind(&sub.post_url)
        .bind(&sub.status)
        .bind(sub.submitted_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    async fn apply_transition(
        &self,
        id: Uuid,
        expected_status: &str,
        expected_revision: i32,
        change: SubmissionChange,
    ) -> DbResult<Option<SubmissionRow>> {
        // Guarded single-statement update: a row is only touched when both
        // the status and the revision still match what the caller read.
        let row = sqlx::query_as::<_, SubmissionRow>(&format!(
            r#"
            UPDATE submissions
            SET status = COALESCE($1, status),
                is_active = COALESCE($2, is_active),
                post_url = COALESCE($3, post_url),
                url_change_reason = COALESCE($4, url_change_reason),
                submitted_at = COALESCE($5, submitted_at),
                reviewed_at = COALESCE($6, reviewed_at),
                last_activated_at = COALESCE($7, last_activated_at),
                revision = revision + 1,
                updated_at = NOW()
            WHERE id = $8 AND status = $9 AND revision = $10
            RETURNING {SUBMISSION_COLUMNS}
            "#
        ))
        .bind(change.status)
        .bind(change.is_active)
        .bind(change.post_url)
        .bind(change.url_change_reason)
        .bind(change.submitted_at)
        .bind(change.reviewed_at)
        .bind(change.last_activated_at)
        .bind(id)
        .bind(expected_status)
        .bind(expected_revision)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }
}
