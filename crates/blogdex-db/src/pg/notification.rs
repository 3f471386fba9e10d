//! PostgreSQL notification ledger implementation

use async_trait::async_trait;
use sqlx::PgPool;

use crate::error::{DbError, DbResult};
use crate::models::NotificationRow;
use crate::repo::{CreateNotification, NotificationRepository};

/// PostgreSQL notification ledger repository
#[derive(Clone)]
pub struct PgNotificationRepository {
    pool: PgPool,
}

impl PgNotificationRepository {
    /// Create a new notification repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NotificationRepository for PgNotificationRepository {
    async fn begin_dispatch(&self, rec: CreateNotification) -> DbResult<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO notifications (transition_key, recipient, template_id, payload, status)
            VALUES ($1, $2, $3, $4, 'dispatching')
            "#,
        )
        .bind(&rec.transition_key)
        .bind(&rec.recipient)
        .bind(&rec.template_id)
        .bind(&rec.payload)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(true),
            Err(e) => {
                let err = DbError::from(e);
                if err.is_unique_violation() {
                    // This transition was already notified.
                    Ok(false)
                } else {
                    Err(err)
                }
            }
        }
    }

    async fn mark_sent(&self, transition_key: &str) -> DbResult<()> {
        sqlx::query(
            "UPDATE notifications SET status = 'sent', updated_at = NOW() WHERE transition_key = $1",
        )
        .bind(transition_key)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn mark_failed(&self, transition_key: &str, error: &str) -> DbResult<()> {
        sqlx::query(
            r#"
            UPDATE notifications
            SET status = 'failed', error = $1, updated_at = NOW()
            WHERE transition_key = $2
            "#,
        )
        .bind(error)
        .bind(transition_key)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn list_failed(&self, limit: i64) -> DbResult<Vec<NotificationRow>> {
        let rows = sqlx::query_as::<_, NotificationRow>(
            r#"
            SELECT transition_key, recipient, template_id, payload, status, error,
                   created_at, updated_at
            FROM notifications
            WHERE status = 'failed'
            ORDER BY created_at
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}
