//! Checkout and billing-portal handlers

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use blogdex_types::BloggerId;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateCheckoutRequest {
    pub blogger_id: String,
    pub success_url: Option<String>,
    pub cancel_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CheckoutResponse {
    pub session_id: String,
    pub url: String,
}

#[derive(Debug, Deserialize)]
pub struct CreatePortalRequest {
    pub blogger_id: String,
    pub return_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PortalResponse {
    pub url: String,
}

/// POST /api/v1/billing/checkout
pub async fn create_checkout(
    State(state): State<AppState>,
    Json(req): Json<CreateCheckoutRequest>,
) -> ApiResult<Json<CheckoutResponse>> {
    let start = Instant::now();

    let blogger_id = BloggerId::parse(&req.blogger_id)
        .map_err(|_| ApiError::BadRequest("Invalid blogger_id".to_string()))?;

    let session = state
        .billing
        .create_checkout(
            blogger_id,
            req.success_url.as_deref(),
            req.cancel_url.as_deref(),
        )
        .await?;

    metrics::counter!("directory_checkouts_created_total").increment(1);
    metrics::histogram!("directory_operation_duration_seconds", "operation" => "create_checkout")
        .record(start.elapsed().as_secs_f64());

    tracing::info!(blogger_id = %blogger_id, "Checkout session created");

    Ok(Json(CheckoutResponse {
        session_id: session.session_id,
        url: session.url,
    }))
}

/// POST /api/v1/billing/portal
pub async fn create_portal(
    State(state): State<AppState>,
    Json(req): Json<CreatePortalRequest>,
) -> ApiResult<Json<PortalResponse>> {
    let blogger_id = BloggerId::parse(&req.blogger_id)
        .map_err(|_| ApiError::BadRequest("Invalid blogger_id".to_string()))?;

    let portal = state
        .billing
        .create_portal(blogger_id, req.return_url.as_deref())
        .await?;

    Ok(Json(PortalResponse { url: portal.url }))
}
