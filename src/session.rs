//! Session cookie settings and the keys stored in each session.
//!
//! The store itself (SQLite in production, memory in tests) is chosen by the
//! caller of [`routes::app`](crate::routes::app); this module only decides how
//! the cookie looks and how long an idle session survives.

use crate::config::Config;
use tower_sessions::{cookie::SameSite, Expiry, SessionManagerLayer, SessionStore};

/// Name of the session-identifying cookie
pub const SESSION_COOKIE: &str = "session";

/// Id of the logged-in user (i64)
pub const AUTHENTICATED_USER_ID: &str = "authenticated_user_id";

/// One-shot message shown on the next rendered page (String)
pub const FLASH: &str = "flash";

/// Path a logged-out visitor asked for before being sent to the login page
pub const REDIRECT_AFTER_LOGIN: &str = "redirect_after_login";

/// Session manager configured from [`Config`]
///
/// - HttpOnly, Path=/, SameSite=Lax, Secure unless disabled for local http
/// - Idle expiry: the deadline moves forward on every request
/// - Always saved, so that the moving deadline is persisted even when the
///   request did not otherwise touch the session
pub fn layer<S>(store: S, config: &Config) -> SessionManagerLayer<S>
where
    S: SessionStore + Clone,
{
    SessionManagerLayer::new(store)
        .with_name(SESSION_COOKIE)
        .with_http_only(true)
        .with_secure(config.cookie_secure)
        .with_same_site(SameSite::Lax)
        .with_path("/")
        .with_always_save(true)
        .with_expiry(Expiry::OnInactivity(time::Duration::hours(
            config.session_lifetime_hours,
        )))
}
