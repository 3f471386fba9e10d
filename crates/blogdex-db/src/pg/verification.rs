//! PostgreSQL domain-verification repository implementation

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::DbResult;
use crate::models::DomainVerificationRow;
use crate::repo::VerificationRepository;

/// PostgreSQL domain-verification repository
#[derive(Clone)]
pub struct PgVerificationRepository {
    pool: PgPool,
}

impl PgVerificationRepository {
    /// Create a new verification repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl VerificationRepository for PgVerificationRepository {
    async fn find_by_blogger_id(
        &self,
        blogger_id: Uuid,
    ) -> DbResult<Option<DomainVerificationRow>> {
        let row = sqlx::query_as::<_, DomainVerificationRow>(
            r#"
            SELECT blogger_id, domain, method, token, status, verified_at,
                   created_at, updated_at
            FROM domain_verifications
            WHERE blogger_id = $1
            "#,
        )
        .bind(blogger_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    async fn reset_domain(
        &self,
        blogger_id: Uuid,
        domain: &str,
    ) -> DbResult<DomainVerificationRow> {
        let row = sqlx::query_as::<_, DomainVerificationRow>(
            r#"
            INSERT INTO domain_verifications (blogger_id, domain, status)
            VALUES ($1, $2, 'unverified')
            ON CONFLICT (blogger_id) DO UPDATE
                SET domain = EXCLUDED.domain,
                    method = NULL,
                    token = NULL,
                    status = 'unverified',
                    verified_at = NULL,
                    updated_at = NOW()
            RETURNING blogger_id, domain, method, token, status, verified_at,
                      created_at, updated_at
            "#,
        )
        .bind(blogger_id)
        .bind(domain)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    async fn set_challenge(&self, blogger_id: Uuid, method: &str, token: &str) -> DbResult<()> {
        sqlx::query(
            r#"
            UPDATE domain_verifications
            SET method = $1, token = $2, status = 'pending', updated_at = NOW()
            WHERE blogger_id = $3
            "#,
        )
        .bind(method)
        .bind(token)
        .bind(blogger_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn mark_verified(&self, blogger_id: Uuid) -> DbResult<()> {
        sqlx::query(
            r#"
            UPDATE domain_verifications
            SET status = 'verified', verified_at = NOW(), updated_at = NOW()
            WHERE blogger_id = $1
            "#,
        )
        .bind(blogger_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
