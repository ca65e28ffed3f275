//! Session-backed authentication state and the authorization guard.
//!
//! [`authenticate`] runs on every interactive route and publishes an
//! [`Identity`]; [`require_auth`] runs on protected routes only and reads
//! that published value. The guard never looks at the session's user id
//! itself, so there is a single answer per request to "who is this".

use crate::context::{Identity, RequestContext};
use crate::db::UserRepository;
use crate::error::AppResult;
use crate::session::{AUTHENTICATED_USER_ID, REDIRECT_AFTER_LOGIN};
use crate::state::AppState;
use axum::{
    extract::{Request, State},
    http::{header, HeaderValue, Method},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

/// Where unauthenticated visitors are sent
pub const LOGIN_PATH: &str = "/user/login";

/// Session-authentication loader
///
/// Publishes the request's [`Identity`] into the request context.
pub async fn authenticate(
    State(state): State<AppState>,
    session: Session,
    mut request: Request,
    next: Next,
) -> Response {
    let identity = resolve_identity(state.users.as_ref(), &session).await;

    RequestContext::current(request.extensions())
        .with_identity(identity)
        .publish(&mut request);

    next.run(request).await
}

/// Work out who the session belongs to
///
/// 1. No stored user id → anonymous
/// 2. Stored id whose account still exists → authenticated
/// 3. Stored id whose account is gone → anonymous (the session is left as is)
/// 4. Session or repository failure → anonymous, logged
///
/// Depends only on the session contents and the repository, so calling it
/// twice for the same request gives the same answer.
pub async fn resolve_identity(users: &dyn UserRepository, session: &Session) -> Identity {
    let user_id = match session.get::<i64>(AUTHENTICATED_USER_ID).await {
        Ok(Some(id)) => id,
        Ok(None) => return Identity::anonymous(),
        Err(e) => {
            tracing::error!(error = %e, "failed to read user id from session");
            return Identity::anonymous();
        }
    };

    match users.exists(user_id).await {
        Ok(true) => Identity::authenticated(user_id),
        Ok(false) => {
            tracing::debug!(user_id, "session refers to a deleted account");
            Identity::anonymous()
        }
        Err(e) => {
            tracing::error!(user_id, error = %e, "user lookup failed, treating request as anonymous");
            Identity::anonymous()
        }
    }
}

/// Authorization guard
///
/// - Anonymous → 303 to the login page; GET requests remember where they
///   were going so login can send them back
/// - Authenticated → run the handler and forbid caching of its response,
///   since the page is specific to this user
pub async fn require_auth(
    ctx: RequestContext,
    session: Session,
    request: Request,
    next: Next,
) -> AppResult<Response> {
    if !ctx.identity.is_authenticated() {
        if request.method() == Method::GET {
            session
                .insert(REDIRECT_AFTER_LOGIN, request.uri().path())
                .await?;
        }
        return Ok(Redirect::to(LOGIN_PATH).into_response());
    }

    let mut response = next.run(request).await;
    response
        .headers_mut()
        .insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    Ok(response)
}
