//! # Per-session serialization
//!
//! The session layer loads a record when a request starts and writes it back
//! when the request ends. Two overlapping requests with the same cookie would
//! each write their own copy, and the later write wins. Worse, a request that
//! started before logout would write the logged-in record back under the id
//! logout just deleted, and the old cookie would work again.
//!
//! This interceptor sits outside the session layer and lets only one request
//! per session cookie through at a time, so every load sees the previous
//! request's save. Requests without a cookie start a fresh session and are
//! never held back.
//!
//! Locks live in process memory, which covers the single-server deployment
//! this application runs as.

use crate::session::SESSION_COOKIE;
use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tower_sessions::cookie::Cookie;

/// One async mutex per session cookie value currently in use
#[derive(Clone, Debug, Default)]
pub struct SessionLocks {
    inner: Arc<DashMap<String, Arc<Mutex<()>>>>,
}

impl SessionLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait until no other request holds `session_id`
    async fn acquire(&self, session_id: String) -> HeldLock {
        // The map entry is only borrowed long enough to clone the Arc
        let lock = self.inner.entry(session_id.clone()).or_default().clone();
        let guard = lock.lock_owned().await;

        HeldLock {
            locks: self.clone(),
            session_id,
            guard: Some(guard),
        }
    }

    /// Number of sessions with a request in flight or waiting
    pub fn in_use(&self) -> usize {
        self.inner.len()
    }
}

/// Releases the session on drop, including when the request panics or the
/// client disconnects
struct HeldLock {
    locks: SessionLocks,
    session_id: String,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for HeldLock {
    fn drop(&mut self) {
        self.guard.take();
        // Only the map still refers to the mutex: nobody is waiting
        self.locks
            .inner
            .remove_if(&self.session_id, |_, lock| Arc::strong_count(lock) == 1);
    }
}

/// Session serialization interceptor
pub async fn serialize_session(
    State(locks): State<SessionLocks>,
    request: Request,
    next: Next,
) -> Response {
    let Some(session_id) = session_cookie(request.headers()) else {
        return next.run(request).await;
    };

    let _held = locks.acquire(session_id).await;
    next.run(request).await
}

/// Value of the session cookie, if the request carries one
fn session_cookie(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(Cookie::split_parse)
        .filter_map(Result::ok)
        .find(|cookie| cookie.name() == SESSION_COOKIE)
        .map(|cookie| cookie.value().to_string())
}
