use std::sync::Arc;

use forum_engagement::config::AppConfig;
use forum_engagement::sessions::DbSessionResolver;
use forum_engagement::tasks::retention;
use forum_engagement::{build_router, AppState};
use forum_shared::clients::db;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    forum_shared::middleware::init_tracing("forum-engagement");

    let config = AppConfig::load()?;
    let port = config.port;

    let pool = db::create_pool(&config.database_url, config.db_pool_size)?;
    let metrics_handle = forum_shared::middleware::init_metrics()?;

    let sessions = Arc::new(DbSessionResolver::new(pool.clone()));
    let state = Arc::new(AppState::new(pool, config, sessions).with_metrics(metrics_handle));

    tracing::info!(
        dedup_window_secs = state.policy.dedup_window.num_seconds(),
        retention_days = state.policy.retention.num_days(),
        "notification policy loaded"
    );

    retention::spawn_retention_task(state.clone());

    let app = build_router(state);

    let addr = format!("0.0.0.0:{port}");
    tracing::info!(addr = %addr, "forum-engagement starting");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
