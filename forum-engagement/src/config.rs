use std::time::Duration;

use serde::Deserialize;

use crate::services::notification_service::NotificationPolicy;
use crate::services::retry::RetryPolicy;

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_db")]
    pub database_url: String,
    #[serde(default = "default_pool_size")]
    pub db_pool_size: u32,
    #[serde(default)]
    pub notifications: NotificationSettings,
}

/// Notification policy knobs. Every value has a production default.
#[derive(Debug, Deserialize, Clone)]
pub struct NotificationSettings {
    #[serde(default = "default_dedup_window_secs")]
    pub dedup_window_secs: i64,
    #[serde(default = "default_retention_days")]
    pub retention_days: i64,
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
    #[serde(default = "default_retry_base_ms")]
    pub retry_base_ms: u64,
    #[serde(default = "default_retry_max_ms")]
    pub retry_max_ms: u64,
    #[serde(default = "default_retry_attempts")]
    pub retry_attempts: u32,
}

const MAX_DEDUP_WINDOW_SECS: i64 = 30 * 24 * 3600;
const MAX_RETENTION_DAYS: i64 = 3650;

fn default_port() -> u16 { 3008 }
fn default_db() -> String { "forum.db".into() }
fn default_pool_size() -> u32 { 10 }
fn default_dedup_window_secs() -> i64 { 3600 }
fn default_retention_days() -> i64 { 30 }
fn default_sweep_interval_secs() -> u64 { 3600 }
fn default_retry_base_ms() -> u64 { 100 }
fn default_retry_max_ms() -> u64 { 800 }
fn default_retry_attempts() -> u32 { 5 }

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            dedup_window_secs: default_dedup_window_secs(),
            retention_days: default_retention_days(),
            sweep_interval_secs: default_sweep_interval_secs(),
            retry_base_ms: default_retry_base_ms(),
            retry_max_ms: default_retry_max_ms(),
            retry_attempts: default_retry_attempts(),
        }
    }
}

impl NotificationSettings {
    pub fn policy(&self) -> NotificationPolicy {
        NotificationPolicy {
            dedup_window: chrono::Duration::seconds(self.dedup_window_secs),
            retention: chrono::Duration::days(self.retention_days),
            retry: RetryPolicy {
                base_delay: Duration::from_millis(self.retry_base_ms),
                max_delay: Duration::from_millis(self.retry_max_ms),
                max_attempts: self.retry_attempts,
            },
        }
    }

    /// Rejects values that would invert the retention cutoff or overflow
    /// `chrono::Duration`.
    pub fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            (0..=MAX_DEDUP_WINDOW_SECS).contains(&self.dedup_window_secs),
            "notifications.dedup_window_secs must be between 0 and {MAX_DEDUP_WINDOW_SECS}, got {}",
            self.dedup_window_secs
        );
        anyhow::ensure!(
            (1..=MAX_RETENTION_DAYS).contains(&self.retention_days),
            "notifications.retention_days must be between 1 and {MAX_RETENTION_DAYS}, got {}",
            self.retention_days
        );
        anyhow::ensure!(self.retry_attempts >= 1, "notifications.retry_attempts must be at least 1");
        anyhow::ensure!(
            self.retry_base_ms <= self.retry_max_ms,
            "notifications.retry_base_ms ({}) exceeds retry_max_ms ({})",
            self.retry_base_ms,
            self.retry_max_ms
        );
        Ok(())
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs.max(1))
    }
}

impl AppConfig {
    /// Reads `FORUM_ENGAGEMENT__*` variables, e.g.
    /// `FORUM_ENGAGEMENT__NOTIFICATIONS__DEDUP_WINDOW_SECS=600`.
    pub fn load() -> anyhow::Result<Self> {
        let config = config::Config::builder()
            .add_source(config::Environment::with_prefix("FORUM_ENGAGEMENT").separator("__"))
            .build()?;
        let config: Self = config.try_deserialize()?;
        config.notifications.validate()?;
        Ok(config)
    }
}
