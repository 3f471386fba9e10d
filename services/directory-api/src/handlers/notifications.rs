//! Notification ledger handlers

use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use blogdex_db::NotificationRepository;

use crate::error::ApiResult;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct FailedQuery {
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_limit() -> i64 {
    50
}

#[derive(Debug, Serialize)]
pub struct FailedNotification {
    pub transition_key: String,
    pub recipient: String,
    pub template_id: String,
    pub error: Option<String>,
    pub created_at: String,
}

/// GET /api/v1/notifications/failed
///
/// Failed deliveries kept for manual resend; delivery failures never roll
/// back the transitions that produced them.
pub async fn list_failed_notifications(
    State(state): State<AppState>,
    Query(query): Query<FailedQuery>,
) -> ApiResult<Json<Vec<FailedNotification>>> {
    let rows = state
        .notifications
        .list_failed(query.limit.clamp(1, 500))
        .await?;

    Ok(Json(
        rows.into_iter()
            .map(|row| FailedNotification {
                transition_key: row.transition_key,
                recipient: row.recipient,
                template_id: row.template_id,
                error: row.error,
                created_at: row.created_at.to_rfc3339(),
            })
            .collect(),
    ))
}
