use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use validator::Validate;

use forum_shared::clients::db;
use forum_shared::errors::AppResult;
use forum_shared::types::auth::AuthUser;
use forum_shared::types::ApiResponse;

use crate::models::Comment;
use crate::services::comment_service;
use crate::routes::validate_body;
use crate::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateCommentRequest {
    #[validate(length(max = 5000, message = "comment is too long"))]
    pub content: String,
    pub parent_comment_id: Option<i32>,
}

/// POST /api/posts/:id/comments
pub async fn create_comment(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(post_id): Path<i32>,
    Json(req): Json<CreateCommentRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<Comment>>)> {
    validate_body(&req)?;

    let policy = state.policy;
    let comment = db::run_blocking(&state.db, move |conn| {
        comment_service::create_comment(conn, &policy, post_id, user.id, &req.content, req.parent_comment_id)
    })
    .await?;

    Ok((StatusCode::CREATED, Json(ApiResponse::ok(comment))))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DeletedResponse {
    pub deleted: bool,
}

/// DELETE /api/comments/:id
pub async fn delete_comment(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(comment_id): Path<i32>,
) -> AppResult<Json<ApiResponse<DeletedResponse>>> {
    let retry = state.policy.retry;
    db::run_blocking(&state.db, move |conn| comment_service::delete_comment(conn, &retry, comment_id, user.id))
        .await?;

    Ok(Json(ApiResponse::ok(DeletedResponse { deleted: true })))
}
