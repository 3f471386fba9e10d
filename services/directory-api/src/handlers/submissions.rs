//! Submission handlers

use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use blogdex_types::{BloggerId, ReviewDecision, Submission, SubmissionId};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct CreateSubmissionRequest {
    pub blogger_id: String,
    pub url: String,
    /// Save as a draft instead of submitting for review
    #[serde(default)]
    pub draft: bool,
}

#[derive(Debug, Deserialize)]
pub struct ChangeUrlRequest {
    pub new_url: String,
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ReviewRequest {
    /// "approve" or "reject"
    pub decision: String,
    /// Required when rejecting
    pub reason: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SubmissionResponse {
    pub id: String,
    pub blogger_id: String,
    pub post_url: String,
    pub status: String,
    pub is_active: bool,
    pub url_change_reason: Option<String>,
    pub submitted_at: Option<String>,
    pub reviewed_at: Option<String>,
    pub last_activated_at: Option<String>,
}

impl From<Submission> for SubmissionResponse {
    fn from(sub: Submission) -> Self {
        Self {
            id: sub.id.to_string(),
            blogger_id: sub.blogger_id.to_string(),
            post_url: sub.post_url,
            status: sub.status.to_string(),
            is_active: sub.is_active,
            url_change_reason: sub.url_change_reason,
            submitted_at: sub.submitted_at.map(|t| t.to_rfc3339()),
            reviewed_at: sub.reviewed_at.map(|t| t.to_rfc3339()),
            last_activated_at: sub.last_activated_at.map(|t| t.to_rfc3339()),
        }
    }
}

fn parse_blogger_id(s: &str) -> ApiResult<BloggerId> {
    BloggerId::parse(s).map_err(|_| ApiError::BadRequest("Invalid blogger_id".to_string()))
}

fn parse_submission_id(s: &str) -> ApiResult<SubmissionId> {
    SubmissionId::parse(s).map_err(|_| ApiError::BadRequest("Invalid submission id".to_string()))
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /api/v1/submissions
pub async fn create_submission(
    State(state): State<AppState>,
    Json(req): Json<CreateSubmissionRequest>,
) -> ApiResult<Json<SubmissionResponse>> {
    let start = Instant::now();
    let blogger_id = parse_blogger_id(&req.blogger_id)?;

    let submission = if req.draft {
        state.listing.create_draft(blogger_id, &req.url).await?
    } else {
        state.listing.submit(blogger_id, &req.url).await?
    };

    metrics::counter!("directory_submissions_created_total").increment(1);
    metrics::histogram!("directory_operation_duration_seconds", "operation" => "create_submission")
        .record(start.elapsed().as_secs_f64());

    Ok(Json(submission.into()))
}

/// POST /api/v1/submissions/{id}/submit
pub async fn submit_draft(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<SubmissionResponse>> {
    let submission_id = parse_submission_id(&id)?;
    let submission = state.listing.submit_draft(submission_id).await?;
    Ok(Json(submission.into()))
}

/// POST /api/v1/submissions/{id}/url
pub async fn change_submission_url(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<ChangeUrlRequest>,
) -> ApiResult<Json<SubmissionResponse>> {
    let start = Instant::now();
    let submission_id = parse_submission_id(&id)?;

    let submission = state
        .listing
        .change_url(submission_id, &req.new_url, req.reason.as_deref())
        .await?;

    metrics::histogram!("directory_operation_duration_seconds", "operation" => "change_url")
        .record(start.elapsed().as_secs_f64());

    Ok(Json(submission.into()))
}

/// POST /api/v1/submissions/{id}/review
pub async fn review_submission(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<ReviewRequest>,
) -> ApiResult<Json<SubmissionResponse>> {
    let submission_id = parse_submission_id(&id)?;

    let decision = match req.decision.as_str() {
        "approve" => ReviewDecision::Approve,
        "reject" => ReviewDecision::Reject {
            reason: req
                .reason
                .ok_or_else(|| ApiError::BadRequest("Rejection requires a reason".to_string()))?,
        },
        other => {
            return Err(ApiError::BadRequest(format!("Invalid decision: {other}")));
        }
    };

    let submission = state.listing.review(submission_id, decision).await?;

    metrics::counter!("directory_reviews_total", "outcome" => submission.status.to_string())
        .increment(1);

    Ok(Json(submission.into()))
}

/// POST /api/v1/submissions/{id}/activate
pub async fn activate_submission(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<SubmissionResponse>> {
    let submission_id = parse_submission_id(&id)?;
    let submission = state.listing.activate(submission_id).await?;

    metrics::counter!("directory_activations_total").increment(1);

    Ok(Json(submission.into()))
}

/// POST /api/v1/submissions/{id}/deactivate
pub async fn deactivate_submission(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<SubmissionResponse>> {
    let submission_id = parse_submission_id(&id)?;
    let submission = state.listing.deactivate(submission_id).await?;
    Ok(Json(submission.into()))
}
