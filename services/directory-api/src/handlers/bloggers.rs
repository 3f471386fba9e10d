//! Blogger provisioning and dashboard handlers

use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use blogdex_db::{BloggerRepository, CreateBlogger, SubmissionRepository};
use blogdex_types::BloggerId;

use crate::error::{ApiError, ApiResult};
use crate::handlers::submissions::SubmissionResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateBloggerRequest {
    /// Identity id from the managed auth backend; minted here if absent
    pub id: Option<String>,
    pub email: String,
    pub display_name: String,
}

#[derive(Debug, Serialize)]
pub struct BloggerResponse {
    pub id: String,
    pub email: String,
    pub display_name: String,
}

/// POST /api/v1/bloggers
///
/// Provisioning hook called by the auth layer when an account is created.
pub async fn create_blogger(
    State(state): State<AppState>,
    Json(req): Json<CreateBloggerRequest>,
) -> ApiResult<Json<BloggerResponse>> {
    let id = match req.id {
        Some(s) => {
            Uuid::parse_str(&s).map_err(|_| ApiError::BadRequest("Invalid id".to_string()))?
        }
        None => Uuid::new_v4(),
    };

    if req.email.is_empty() || !req.email.contains('@') {
        return Err(ApiError::BadRequest("Invalid email".to_string()));
    }

    let row = state
        .repos
        .bloggers
        .create(CreateBlogger {
            id,
            email: req.email,
            display_name: req.display_name,
        })
        .await?;

    tracing::info!(blogger_id = %row.id, "Blogger provisioned");

    Ok(Json(BloggerResponse {
        id: row.id.to_string(),
        email: row.email,
        display_name: row.display_name,
    }))
}

/// GET /api/v1/bloggers/{id}/submissions
///
/// The blogger dashboard's submission list.
pub async fn list_submissions(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Vec<SubmissionResponse>>> {
    let blogger_id = BloggerId::parse(&id)
        .map_err(|_| ApiError::BadRequest("Invalid blogger id".to_string()))?;

    let rows = state
        .repos
        .submissions
        .list_by_blogger(blogger_id.0)
        .await?;

    let mut submissions = Vec::with_capacity(rows.len());
    for row in rows {
        submissions.push(row.to_domain()?.into());
    }

    Ok(Json(submissions))
}
