pub mod comments;
pub mod health;
pub mod internal;
pub mod notifications;
pub mod posts;
pub mod votes;

use forum_shared::errors::{AppError, ErrorCode};
use validator::Validate;

/// Validate a request body, reporting field errors under `details`.
pub(crate) fn validate_body<T: Validate>(body: &T) -> Result<(), AppError> {
    body.validate().map_err(|errors| match serde_json::to_value(errors.field_errors()) {
        Ok(details) => AppError::with_details(ErrorCode::ValidationError, "invalid request body", details),
        Err(_) => AppError::new(ErrorCode::ValidationError, errors.to_string()),
    })
}
