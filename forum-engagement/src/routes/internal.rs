use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use validator::Validate;

use forum_shared::clients::db;
use forum_shared::errors::AppResult;
use forum_shared::types::ApiResponse;

use crate::services::notification_service;
use crate::tasks::retention;
use crate::routes::validate_body;
use crate::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct SystemNotificationRequest {
    #[validate(length(min = 1, message = "at least one recipient is required"))]
    pub user_ids: Vec<i32>,
    #[validate(length(min = 1, max = 200, message = "title must be 1-200 characters"))]
    pub title: String,
    #[validate(length(min = 1, max = 2000, message = "message must be 1-2000 characters"))]
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SystemNotificationResponse {
    pub delivered: usize,
}

/// POST /internal/notifications/system (service-to-service, no auth)
pub async fn system_notification(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SystemNotificationRequest>,
) -> AppResult<Json<ApiResponse<SystemNotificationResponse>>> {
    validate_body(&req)?;

    let policy = state.policy;
    let delivered = db::run_blocking(&state.db, move |conn| {
        notification_service::system_notification(conn, &policy, &req.user_ids, &req.title, &req.message)
    })
    .await?;

    Ok(Json(ApiResponse::ok(SystemNotificationResponse { delivered })))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RetireResponse {
    pub deleted: usize,
}

/// POST /internal/notifications/retire (service-to-service, no auth)
/// Runs the retention sweep now instead of waiting for the next tick.
pub async fn retire_notifications(
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<ApiResponse<RetireResponse>>> {
    let deleted = retention::sweep(&state).await?;

    Ok(Json(ApiResponse::ok(RetireResponse { deleted })))
}
