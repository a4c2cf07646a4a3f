use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;

use crate::schema::users;

/// Name shown for actors whose account cannot be read.
pub const FALLBACK_NAME: &str = "Someone";

/// Username for notification text. Lookup failures fall back to [`FALLBACK_NAME`].
pub fn display_name(conn: &mut SqliteConnection, user_id: i32) -> String {
    match users::table
        .find(user_id)
        .select(users::username)
        .first::<String>(conn)
        .optional()
    {
        Ok(Some(name)) => name,
        Ok(None) => FALLBACK_NAME.to_string(),
        Err(e) => {
            tracing::warn!(user_id, error = %e, "failed to look up username");
            FALLBACK_NAME.to_string()
        }
    }
}
