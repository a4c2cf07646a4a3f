use chrono::Utc;
use diesel::prelude::*;

use forum_shared::clients::db::DbPool;
use forum_shared::types::auth::SessionResolver;

use crate::schema::sessions;

/// Looks session cookies up in the forum's `sessions` table.
pub struct DbSessionResolver {
    pool: DbPool,
}

impl DbSessionResolver {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

impl SessionResolver for DbSessionResolver {
    fn resolve_user_id(&self, token: &str) -> Option<i32> {
        let mut conn = match self.pool.get() {
            Ok(conn) => conn,
            Err(e) => {
                tracing::error!(error = %e, "failed to get db connection for session lookup");
                return None;
            }
        };

        sessions::table
            .filter(sessions::cookie_value.eq(token))
            .filter(sessions::expiration_date.gt(Utc::now().naive_utc()))
            .select(sessions::user_id)
            .first::<i32>(&mut conn)
            .optional()
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, "session lookup failed");
                None
            })
    }
}
