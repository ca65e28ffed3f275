//! # Request Context
//!
//! Facts derived by interceptors while a request travels down the pipeline.
//!
//! There is exactly one [`RequestContext`] per request, stored in the request
//! extensions. An interceptor that learns something new never edits the
//! published value: it builds an extended copy with one of the `with_*`
//! methods and publishes that instead. Handlers read it through extractors,
//! so every fact has one named, typed field rather than a lookup by key.
//!
//! | Field        | Published by                      |
//! |--------------|-----------------------------------|
//! | `csrf_token` | CSRF interceptor                  |
//! | `identity`   | session-authentication loader     |
//! | `snippet`    | resource context loader           |

use crate::db::models::Snippet;
use crate::error::AppError;
use axum::{
    extract::{FromRequestParts, Request},
    http::{request::Parts, Extensions},
};
use std::convert::Infallible;

/// Who is making the request
///
/// The "authenticated" flag is derived from the user id, so the two can never
/// disagree.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Identity {
    user_id: Option<i64>,
}

impl Identity {
    /// Nobody is logged in (or the account behind the session is gone)
    pub fn anonymous() -> Self {
        Self { user_id: None }
    }

    /// A live account is logged in
    pub fn authenticated(user_id: i64) -> Self {
        Self {
            user_id: Some(user_id),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.user_id.is_some()
    }

    pub fn user_id(&self) -> Option<i64> {
        self.user_id
    }
}

/// Per-request facts, see the module docs
#[derive(Clone, Debug, Default)]
pub struct RequestContext {
    /// Anti-forgery token bound to this request's session
    pub csrf_token: String,

    /// Result of the session-authentication loader
    pub identity: Identity,

    /// Snippet resolved from the path by the resource loader
    pub snippet: Option<Snippet>,
}

impl RequestContext {
    /// The context published so far, or an empty one at the start of the chain
    pub fn current(extensions: &Extensions) -> Self {
        extensions.get::<RequestContext>().cloned().unwrap_or_default()
    }

    pub fn with_csrf_token(self, csrf_token: String) -> Self {
        Self { csrf_token, ..self }
    }

    pub fn with_identity(self, identity: Identity) -> Self {
        Self { identity, ..self }
    }

    pub fn with_snippet(self, snippet: Snippet) -> Self {
        Self {
            snippet: Some(snippet),
            ..self
        }
    }

    /// Make this context the one downstream interceptors and the handler see
    pub fn publish(self, request: &mut Request) {
        request.extensions_mut().insert(self);
    }
}

/// Handlers take the context as an ordinary extractor.
///
/// Outside the interactive subtree nothing has been published, which reads as
/// an anonymous request with no token.
impl<S> FromRequestParts<S> for RequestContext
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(RequestContext::current(&parts.extensions))
    }
}

/// The snippet the resource loader fetched for this request
///
/// Handlers behind the loader use this instead of querying again, so they
/// always render exactly the entity the loader resolved.
#[derive(Clone, Debug)]
pub struct LoadedSnippet(pub Snippet);

impl<S> FromRequestParts<S> for LoadedSnippet
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<RequestContext>()
            .and_then(|ctx| ctx.snippet.clone())
            .map(LoadedSnippet)
            .ok_or_else(|| {
                // Only reachable if a route is wired without its loader
                AppError::Internal("snippet handler reached without the snippet loader".into())
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    #[test]
    fn identity_flag_follows_user_id() {
        assert!(!Identity::anonymous().is_authenticated());
        assert_eq!(Identity::anonymous().user_id(), None);

        let identity = Identity::authenticated(7);
        assert!(identity.is_authenticated());
        assert_eq!(identity.user_id(), Some(7));
    }

    #[test]
    fn extending_keeps_earlier_facts() {
        let ctx = RequestContext::default()
            .with_csrf_token("token".into())
            .with_identity(Identity::authenticated(3));

        assert_eq!(ctx.csrf_token, "token");
        assert_eq!(ctx.identity.user_id(), Some(3));
        assert!(ctx.snippet.is_none());
    }

    #[test]
    fn publishing_replaces_the_previous_context() {
        let mut request = Request::new(Body::empty());
        assert_eq!(
            RequestContext::current(request.extensions()).identity,
            Identity::anonymous()
        );

        RequestContext::current(request.extensions())
            .with_identity(Identity::authenticated(1))
            .publish(&mut request);

        assert_eq!(
            RequestContext::current(request.extensions()).identity,
            Identity::authenticated(1)
        );
    }
}
