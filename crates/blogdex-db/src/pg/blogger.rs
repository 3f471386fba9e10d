//! PostgreSQL blogger repository implementation

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::DbResult;
use crate::models::BloggerRow;
use crate::repo::{BloggerRepository, CreateBlogger};

/// PostgreSQL blogger repository
#[derive(Clone)]
pub struct PgBloggerRepository {
    pool: PgPool,
}

impl PgBloggerRepository {
    /// Create a new blogger repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BloggerRepository for PgBloggerRepository {
    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<BloggerRow>> {
        let blogger = sqlx::query_as::<_, BloggerRow>(
            r#"
            SELECT id, email, display_name, declared_blog_url, customer_ref,
                   created_at, updated_at
            FROM bloggers
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(blogger)
    }

    async fn find_by_customer_ref(&self, customer_ref: &str) -> DbResult<Option<BloggerRow>> {
        let blogger = sqlx::query_as::<_, BloggerRow>(
            r#"
            SELECT id, email, display_name, declared_blog_url, customer_ref,
                   created_at, updated_at
            FROM bloggers
            WHERE customer_ref = $1
            "#,
        )
        .bind(customer_ref)
        .fetch_optional(&self.pool)
        .await?;

        Ok(blogger)
    }

    async fn create(&self, blogger: CreateBlogger) -> DbResult<BloggerRow> {
        let row = sqlx::query_as::<_, BloggerRow>(
            r#"
            INSERT INTO bloggers (id, email, display_name)
            VALUES ($1, $2, $3)
            RETURNING id, email, display_name, declared_blog_url, customer_ref,
                      created_at, updated_at
            "#,
        )
        .bind(blogger.id)
        .bind(&blogger.email)
        .bind(&blogger.display_name)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    async fn set_declared_blog_url(&self, id: Uuid, url: &str) -> DbResult<()> {
        sqlx::query("UPDATE bloggers SET declared_blog_url = $1, updated_at = NOW() WHERE id = $2")
            .bind(url)
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn set_customer_ref(&self, id: Uuid, customer_ref: &str) -> DbResult<()> {
        sqlx::query("UPDATE bloggers SET customer_ref = $1, updated_at = NOW() WHERE id = $2")
            .bind(customer_ref)
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
