//! # Health Check Handler
//!
//! Liveness endpoint for load balancers and monitoring. It sits outside the
//! session and CSRF layers, so a ping never creates a session.

/// Health check endpoint
///
/// ## Route
/// GET /ping
///
/// ## Response
/// `200 OK` with the plain-text body `OK`. Never touches the database: a
/// passing ping means the process is serving requests, nothing more.
pub async fn ping() -> &'static str {
    "OK"
}
