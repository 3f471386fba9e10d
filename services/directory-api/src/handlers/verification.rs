//! Domain verification handlers

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use blogdex_db::BloggerRepository;
use blogdex_types::{BloggerId, VerificationMethod};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct DeclareRequest {
    pub blogger_id: String,
    pub blog_url: String,
}

#[derive(Debug, Serialize)]
pub struct DeclareResponse {
    pub domain: String,
    pub status: String,
}

#[derive(Debug, Deserialize)]
pub struct ChallengeRequest {
    pub blogger_id: String,
    pub method: String,
}

#[derive(Debug, Serialize)]
pub struct ChallengeResponse {
    pub domain: String,
    pub method: String,
    pub token: String,
    pub instructions: String,
}

#[derive(Debug, Deserialize)]
pub struct VerifyRequest {
    pub blogger_id: String,
}

#[derive(Debug, Serialize)]
pub struct VerifyResponse {
    pub verified: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

fn parse_blogger_id(s: &str) -> ApiResult<BloggerId> {
    BloggerId::parse(s).map_err(|_| ApiError::BadRequest("Invalid blogger_id".to_string()))
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /api/v1/verification/declare
pub async fn declare_blog_url(
    State(state): State<AppState>,
    Json(req): Json<DeclareRequest>,
) -> ApiResult<Json<DeclareResponse>> {
    let blogger_id = parse_blogger_id(&req.blogger_id)?;

    let record = state
        .verification
        .declare_blog_url(blogger_id, &req.blog_url)
        .await?;
    state
        .repos
        .bloggers
        .set_declared_blog_url(blogger_id.0, &req.blog_url)
        .await?;

    Ok(Json(DeclareResponse {
        domain: record.domain,
        status: record.status.to_string(),
    }))
}

/// POST /api/v1/verification/challenge
pub async fn issue_challenge(
    State(state): State<AppState>,
    Json(req): Json<ChallengeRequest>,
) -> ApiResult<Json<ChallengeResponse>> {
    let blogger_id = parse_blogger_id(&req.blogger_id)?;
    let method: VerificationMethod = req
        .method
        .parse()
        .map_err(|_| ApiError::BadRequest(format!("Invalid method: {}", req.method)))?;

    let challenge = state.verification.issue_challenge(blogger_id, method).await?;

    metrics::counter!("directory_challenges_issued_total", "method" => method.to_string())
        .increment(1);

    Ok(Json(ChallengeResponse {
        domain: challenge.domain,
        method: challenge.method.to_string(),
        token: challenge.token,
        instructions: challenge.instructions,
    }))
}

/// POST /api/v1/verification/verify
pub async fn verify_domain(
    State(state): State<AppState>,
    Json(req): Json<VerifyRequest>,
) -> ApiResult<Json<VerifyResponse>> {
    let start = Instant::now();
    let blogger_id = parse_blogger_id(&req.blogger_id)?;

    let outcome = state.verification.verify(blogger_id).await?;

    metrics::counter!(
        "directory_verifications_total",
        "outcome" => if outcome.verified { "verified" } else { "failed" }
    )
    .increment(1);
    metrics::histogram!("directory_operation_duration_seconds", "operation" => "verify_domain")
        .record(start.elapsed().as_secs_f64());

    Ok(Json(VerifyResponse {
        verified: outcome.verified,
        reason: outcome.reason,
    }))
}
