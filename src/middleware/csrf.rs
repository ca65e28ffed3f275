//! # CSRF Protection
//!
//! Synchronizer-token pattern: every session carries one random token, every
//! form echoes it back in a hidden `csrf_token` field (scripts may use the
//! `X-CSRF-Token` header instead), and every state-changing request must
//! present the token of the session its cookie names.
//!
//! ## Per-request state machine
//! - SAFE method (GET, HEAD, OPTIONS, TRACE) → pass
//! - UNSAFE method → compare submitted token with the session's token in
//!   constant time → equal: pass, otherwise: 400 Bad Request, handler never runs
//!
//! Either way the session's token is published in the
//! [`RequestContext`](crate::context::RequestContext) so pages can embed it.
//!
//! Because the token lives inside the session record, a token issued to one
//! session can never validate a request carrying another session's cookie.

use crate::context::RequestContext;
use crate::error::{AppError, AppResult};
use axum::{
    body::{to_bytes, Body},
    extract::Request,
    http::{HeaderMap, Method},
    middleware::Next,
    response::Response,
};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use rand::{rngs::OsRng, RngCore};
use subtle::ConstantTimeEq;
use tower_sessions::Session;

/// Hidden form field carrying the token
pub const CSRF_FORM_FIELD: &str = "csrf_token";

/// Header alternative to the form field
pub const CSRF_HEADER: &str = "x-csrf-token";

/// Session key holding the token
const SESSION_KEY: &str = "csrf_token";

/// Largest body buffered while looking for the token
const MAX_FORM_BYTES: usize = 64 * 1024;

/// Random bytes per token (before base64)
const TOKEN_BYTES: usize = 32;

/// The CSRF interceptor
pub async fn verify_csrf(session: Session, request: Request, next: Next) -> AppResult<Response> {
    let expected = session_token(&session).await?;

    let mut request = if is_safe(request.method()) {
        request
    } else {
        // The body is needed twice: here for the token, later by the handler's
        // form extractor. Buffer it and hand the handler a fresh copy.
        let (parts, body) = request.into_parts();
        let bytes = to_bytes(body, MAX_FORM_BYTES)
            .await
            .map_err(|e| AppError::BadRequest(format!("unreadable request body: {}", e)))?;

        let submitted = submitted_token(&parts.headers, &bytes);
        if !submitted.as_deref().is_some_and(|token| tokens_match(token, &expected)) {
            tracing::warn!(
                method = %parts.method,
                path = %parts.uri.path(),
                token_present = submitted.is_some(),
                "rejected request with invalid csrf token"
            );
            return Err(AppError::BadRequest("invalid csrf token".into()));
        }

        Request::from_parts(parts, Body::from(bytes))
    };

    // Login and logout rotate the token after this point, and both answer
    // with a redirect, so no page is ever rendered with the stale value
    RequestContext::current(request.extensions())
        .with_csrf_token(expected)
        .publish(&mut request);

    Ok(next.run(request).await)
}

/// Replace the session's token with a fresh one
///
/// Called whenever the session is re-established (login, logout) so that a
/// token observed before the switch is worthless afterwards.
pub async fn rotate_token(session: &Session) -> AppResult<String> {
    let token = generate_token();
    session.insert(SESSION_KEY, &token).await?;
    Ok(token)
}

/// The session's token, created on first use
async fn session_token(session: &Session) -> AppResult<String> {
    match session.get::<String>(SESSION_KEY).await? {
        Some(token) if !token.is_empty() => Ok(token),
        _ => rotate_token(session).await,
    }
}

fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

fn is_safe(method: &Method) -> bool {
    matches!(
        *method,
        Method::GET | Method::HEAD | Method::OPTIONS | Method::TRACE
    )
}

/// Token from the header if present, otherwise from the urlencoded form body
fn submitted_token(headers: &HeaderMap, body: &[u8]) -> Option<String> {
    if let Some(value) = headers.get(CSRF_HEADER) {
        return value.to_str().ok().map(str::to_owned);
    }

    url::form_urlencoded::parse(body)
        .find(|(key, _)| key == CSRF_FORM_FIELD)
        .map(|(_, value)| value.into_owned())
}

/// Constant-time comparison; an empty submission never matches
fn tokens_match(submitted: &str, expected: &str) -> bool {
    !submitted.is_empty() && bool::from(submitted.as_bytes().ct_eq(expected.as_bytes()))
}
