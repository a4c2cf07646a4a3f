use serde::{Deserialize, Serialize};

/// Name of the cookie carrying the session token.
pub const SESSION_COOKIE: &str = "session";

/// Identity of the caller as resolved from their session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: i32,
}

/// Maps a session token to a user id.
///
/// Session issuance lives outside this service; implementations only look the
/// token up. `None` means anonymous or expired.
pub trait SessionResolver: Send + Sync {
    fn resolve_user_id(&self, token: &str) -> Option<i32>;
}

/// Gives the auth extractor access to a [`SessionResolver`] held in router state.
pub trait HasSessions {
    fn sessions(&self) -> &dyn SessionResolver;
}

impl<T: HasSessions> HasSessions for std::sync::Arc<T> {
    fn sessions(&self) -> &dyn SessionResolver {
        (**self).sessions()
    }
}

impl AuthUser {
    /// Resolve a token the way every entry point must: an unknown token and
    /// the reserved id 0 are both anonymous.
    pub fn resolve(resolver: &dyn SessionResolver, token: &str) -> Option<Self> {
        match resolver.resolve_user_id(token) {
            Some(id) if id > 0 => Some(Self { id }),
            _ => None,
        }
    }
}
