//! PostgreSQL billing repository implementation

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::models::BillingRow;
use crate::repo::{BillingRepository, UpsertBillingRecord};

/// PostgreSQL billing repository
#[derive(Clone)]
pub struct PgBillingRepository {
    pool: PgPool,
}

impl PgBillingRepository {
    /// Create a new billing repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BillingRepository for PgBillingRepository {
    async fn find_by_blogger_id(&self, blogger_id: Uuid) -> DbResult<Option<BillingRow>> {
        let rec = sqlx::query_as::<_, BillingRow>(
            r#"
            SELECT blogger_id, status, period_end, failure_notice_stage,
                   customer_ref, subscription_ref, created_at, updated_at
            FROM billing_records
            WHERE blogger_id = $1
            "#,
        )
        .bind(blogger_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(rec)
    }

    async fn upsert(&self, rec: UpsertBillingRecord) -> DbResult<BillingRow> {
        let row = sqlx::query_as::<_, BillingRow>(
            r#"
            INSERT INTO billing_records
                (blogger_id, status, period_end, failure_notice_stage,
                 customer_ref, subscription_ref)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (blogger_id) DO UPDATE
                SET status = EXCLUDED.status,
                    period_end = EXCLUDED.period_end,
                    failure_notice_stage = EXCLUDED.failure_notice_stage,
                    customer_ref = EXCLUDED.customer_ref,
                    subscription_ref = EXCLUDED.subscription_ref,
                    updated_at = NOW()
            RETURNING blogger_id, status, period_end, failure_notice_stage,
                      customer_ref, subscription_ref, created_at, updated_at
            "#,
        )
        .bind(rec.blogger_id)
        .bind(&rec.status)
        .bind(rec.period_end)
        .bind(&rec.failure_notice_stage)
        .bind(&rec.customer_ref)
        .bind(&rec.subscription_ref)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    async fn update_status(
        &self,
        blogger_id: Uuid,
        status: &str,
        period_end: Option<DateTime<Utc>>,
        failure_notice_stage: &str,
    ) -> DbResult<()> {
        sqlx::query(
            r#"
            UPDATE billing_records
            SET status = $1,
                period_end = COALESCE($2, period_end),
                failure_notice_stage = $3,
                updated_at = NOW()
            WHERE blogger_id = $4
            "#,
        )
        .bind(status)
        .bind(period_end)
        .bind(failure_notice_stage)
        .bind(blogger_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn record_event(
        &self,
        event_id: &str,
        blogger_id: Uuid,
        event_type: &str,
    ) -> DbResult<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO billing_events (event_id, blogger_id, event_type)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(event_id)
        .bind(blogger_id)
        .bind(event_type)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(true),
            Err(e) => {
                let err = DbError::from(e);
                if err.is_unique_violation() {
                    // Replayed event: already applied.
                    Ok(false)
                } else {
                    Err(err)
                }
            }
        }
    }
}
