use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use forum_shared::clients::db;
use forum_shared::errors::AppResult;
use forum_shared::middleware::OptionalAuthUser;
use forum_shared::types::auth::AuthUser;
use forum_shared::types::ApiResponse;

use crate::models::{VoteChange, VoteStats, VoteSubject};
use crate::services::vote_service;
use crate::AppState;

/// `vote` is 1 for like and -1 for dislike; the ledger rejects anything else.
#[derive(Debug, Deserialize)]
pub struct CastVoteRequest {
    pub vote: i32,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct VoteResponse {
    pub change: VoteChange,
    #[serde(flatten)]
    pub stats: VoteStats,
}

/// POST /api/posts/:id/vote
pub async fn vote_on_post(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(post_id): Path<i32>,
    Json(req): Json<CastVoteRequest>,
) -> AppResult<Json<ApiResponse<VoteResponse>>> {
    cast(state, VoteSubject::Post(post_id), user, req.vote).await
}

/// POST /api/comments/:id/vote
pub async fn vote_on_comment(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(comment_id): Path<i32>,
    Json(req): Json<CastVoteRequest>,
) -> AppResult<Json<ApiResponse<VoteResponse>>> {
    cast(state, VoteSubject::Comment(comment_id), user, req.vote).await
}

async fn cast(
    state: Arc<AppState>,
    subject: VoteSubject,
    user: AuthUser,
    vote: i32,
) -> AppResult<Json<ApiResponse<VoteResponse>>> {
    let policy = state.policy;
    let receipt =
        db::run_blocking(&state.db, move |conn| vote_service::record_vote(conn, &policy, subject, user.id, vote)).await?;

    Ok(Json(ApiResponse::ok(VoteResponse {
        change: receipt.change,
        stats: receipt.stats,
    })))
}

/// GET /api/posts/:id/votes
pub async fn post_votes(
    State(state): State<Arc<AppState>>,
    OptionalAuthUser(user): OptionalAuthUser,
    Path(post_id): Path<i32>,
) -> AppResult<Json<ApiResponse<VoteStats>>> {
    stats(&state, VoteSubject::Post(post_id), user).await
}

/// GET /api/comments/:id/votes
pub async fn comment_votes(
    State(state): State<Arc<AppState>>,
    OptionalAuthUser(user): OptionalAuthUser,
    Path(comment_id): Path<i32>,
) -> AppResult<Json<ApiResponse<VoteStats>>> {
    stats(&state, VoteSubject::Comment(comment_id), user).await
}

async fn stats(
    state: &AppState,
    subject: VoteSubject,
    user: Option<AuthUser>,
) -> AppResult<Json<ApiResponse<VoteStats>>> {
    let viewer = user.map(|u| u.id);
    let stats = db::run_blocking(&state.db, move |conn| vote_service::subject_stats(conn, subject, viewer)).await?;

    Ok(Json(ApiResponse::ok(stats)))
}
