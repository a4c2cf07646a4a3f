pub mod config;
pub mod events;
pub mod models;
pub mod routes;
pub mod schema;
pub mod services;
pub mod sessions;
pub mod tasks;

use std::sync::Arc;

use axum::routing::{delete, get, post};
use axum::Router;
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use forum_shared::clients::db::DbPool;
use forum_shared::types::auth::{HasSessions, SessionResolver};

use crate::config::AppConfig;
use crate::services::notification_service::NotificationPolicy;

pub struct AppState {
    pub db: DbPool,
    pub config: AppConfig,
    pub policy: NotificationPolicy,
    pub sessions: Arc<dyn SessionResolver>,
    /// `None` when no Prometheus recorder is installed.
    pub metrics_handle: Option<PrometheusHandle>,
}

impl AppState {
    pub fn new(db: DbPool, config: AppConfig, sessions: Arc<dyn SessionResolver>) -> Self {
        let policy = config.notifications.policy();
        Self {
            db,
            config,
            policy,
            sessions,
            metrics_handle: None,
        }
    }

    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics_handle = Some(handle);
        self
    }
}

impl HasSessions for AppState {
    fn sessions(&self) -> &dyn SessionResolver {
        self.sessions.as_ref()
    }
}

pub fn build_router(state: Arc<AppState>) -> Router {
    use crate::routes::{comments, health, internal, notifications, posts, votes};

    Router::new()
        .route("/health", get(health::health_check))
        .route("/metrics", get(health::metrics))
        .route("/api/notifications", get(notifications::list_notifications))
        .route("/api/notifications/unread-count", get(notifications::unread_count))
        .route("/api/notifications/mark-all-read", post(notifications::mark_all_read))
        .route("/api/notifications/:id/read", post(notifications::mark_read))
        .route("/api/posts/:id", delete(posts::delete_post))
        .route("/api/posts/:id/vote", post(votes::vote_on_post))
        .route("/api/posts/:id/votes", get(votes::post_votes))
        .route("/api/posts/:id/comments", post(comments::create_comment))
        .route("/api/comments/:id", delete(comments::delete_comment))
        .route("/api/comments/:id/vote", post(votes::vote_on_comment))
        .route("/api/comments/:id/votes", get(votes::comment_votes))
        .route("/internal/notifications/system", post(internal::system_notification))
        .route("/internal/notifications/retire", post(internal::retire_notifications))
        .layer(axum::middleware::from_fn(forum_shared::middleware::metrics_middleware))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
