use std::sync::Arc;

use forum_shared::clients::db;
use forum_shared::errors::AppResult;

use crate::services::notification_service;
use crate::AppState;

/// Retire old read notifications once.
pub async fn sweep(state: &AppState) -> AppResult<usize> {
    let policy = state.policy;
    db::run_blocking(&state.db, move |conn| notification_service::retire_old(conn, &policy)).await
}

/// Spawn a background task that retires read notifications on a fixed interval.
pub fn spawn_retention_task(state: Arc<AppState>) -> tokio::task::JoinHandle<()> {
    let period = state.config.notifications.sweep_interval();

    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);

        loop {
            interval.tick().await;

            tracing::debug!("running notification retention sweep");
            match sweep(&state).await {
                Ok(deleted) => {
                    tracing::debug!(deleted, "notification retention sweep completed");
                }
                Err(e) => {
                    tracing::error!(error = %e, "notification retention sweep failed");
                }
            }
        }
    })
}
