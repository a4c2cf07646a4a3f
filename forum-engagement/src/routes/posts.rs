use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;

use forum_shared::clients::db;
use forum_shared::errors::AppResult;
use forum_shared::types::auth::AuthUser;
use forum_shared::types::ApiResponse;

use crate::services::post_service::{self, PostDeletion};
use crate::AppState;

/// DELETE /api/posts/:id
/// Author only. Removes the post with its comments, votes and notifications.
pub async fn delete_post(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(post_id): Path<i32>,
) -> AppResult<Json<ApiResponse<PostDeletion>>> {
    let retry = state.policy.retry;
    let deletion =
        db::run_blocking(&state.db, move |conn| post_service::delete_post(conn, &retry, post_id, user.id)).await?;

    Ok(Json(ApiResponse::ok(deletion)))
}
