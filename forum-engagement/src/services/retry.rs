//! Backoff for writes that hit a locked or busy SQLite database.

use std::time::Duration;

use diesel::result::Error as DieselError;
use metrics::counter;

use forum_shared::errors::{AppError, AppResult, ErrorCode};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub max_attempts: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_millis(800),
            max_attempts: 5,
        }
    }
}

impl RetryPolicy {
    /// Backoff delays between attempts: `max_attempts - 1` waits starting at
    /// `base_delay`, doubling, capped at `max_delay`.
    pub fn delays(&self) -> impl Iterator<Item = Duration> {
        let max_delay = self.max_delay;
        std::iter::successors(Some(self.base_delay), move |delay| Some(delay.saturating_mul(2).min(max_delay)))
            .take(self.max_attempts.max(1) as usize - 1)
    }

    /// Run `op`, retrying only busy/locked failures on the [`delays`](Self::delays) schedule.
    ///
    /// Any other error is returned after the first attempt. Exhausting the
    /// attempts surfaces [`ErrorCode::StoreBusy`]. The backoff sleeps the
    /// current thread, so async callers go through `db::run_blocking`.
    pub fn run<T, F>(&self, operation: &'static str, mut op: F) -> AppResult<T>
    where
        F: FnMut() -> diesel::QueryResult<T>,
    {
        let mut delays = self.delays();
        let mut attempt = 1;

        loop {
            match op() {
                Ok(value) => return Ok(value),
                Err(e) if is_busy(&e) => {
                    let Some(delay) = delays.next() else {
                        tracing::error!(operation, attempts = attempt, error = %e, "store still busy, giving up");
                        return Err(AppError::new(ErrorCode::StoreBusy, "database is busy, try again later"));
                    };
                    counter!("store_busy_retries_total", "operation" => operation).increment(1);
                    tracing::warn!(
                        operation,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        "store busy, backing off"
                    );
                    std::thread::sleep(delay);
                    attempt += 1;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
}

/// SQLite reports lock contention only through the message text.
pub fn is_busy(err: &DieselError) -> bool {
    match err {
        DieselError::DatabaseError(_, info) => {
            let message = info.message().to_ascii_lowercase();
            message.contains("database is locked")
                || message.contains("database table is locked")
                || message.contains("busy")
        }
        _ => false,
    }
}
