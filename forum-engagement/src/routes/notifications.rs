use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use forum_shared::clients::db;
use forum_shared::errors::AppResult;
use forum_shared::types::api::ApiResponse;
use forum_shared::types::auth::AuthUser;
use forum_shared::types::pagination::PaginationParams;

use crate::models::{NotificationFeed, NotificationView};
use crate::services::notification_service;
use crate::AppState;

/// GET /api/notifications
/// Unread and read notifications for the caller, one page of each.
pub async fn list_notifications(
    State(state): State<Arc<AppState>>,
    auth_user: AuthUser,
    Query(params): Query<PaginationParams>,
) -> AppResult<Json<ApiResponse<NotificationFeed>>> {
    let feed = db::run_blocking(&state.db, move |conn| {
        notification_service::list_notifications(conn, auth_user.id, &params)
    })
    .await?;

    Ok(Json(ApiResponse::ok(feed)))
}

/// GET /api/notifications/unread-count
pub async fn unread_count(
    State(state): State<Arc<AppState>>,
    auth_user: AuthUser,
) -> AppResult<Json<ApiResponse<UnreadCountResponse>>> {
    let count = db::run_blocking(&state.db, move |conn| notification_service::count_unread(conn, auth_user.id)).await?;

    Ok(Json(ApiResponse::ok(UnreadCountResponse { count })))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UnreadCountResponse {
    pub count: i64,
}

/// POST /api/notifications/mark-all-read
pub async fn mark_all_read(
    State(state): State<Arc<AppState>>,
    auth_user: AuthUser,
) -> AppResult<Json<ApiResponse<MarkAllReadResponse>>> {
    let policy = state.policy;
    let updated =
        db::run_blocking(&state.db, move |conn| notification_service::mark_all_read(conn, &policy, auth_user.id))
            .await?;

    Ok(Json(ApiResponse::ok(MarkAllReadResponse { updated })))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MarkAllReadResponse {
    pub updated: usize,
}

/// POST /api/notifications/:id/read
/// Mark a single notification as read. Only its recipient may do this.
pub async fn mark_read(
    State(state): State<Arc<AppState>>,
    auth_user: AuthUser,
    Path(id): Path<i32>,
) -> AppResult<Json<ApiResponse<NotificationView>>> {
    let policy = state.policy;
    let notification =
        db::run_blocking(&state.db, move |conn| notification_service::mark_read(conn, &policy, id, auth_user.id))
            .await?;

    Ok(Json(ApiResponse::ok(notification)))
}
