//! # Error Handling
//!
//! One error type, [`AppError`], flows out of repositories, interceptors and
//! handlers. Its [`IntoResponse`] implementation is the only place that decides
//! which status a failure maps to and what the client gets to see.
//!
//! ## Taxonomy
//! | Category            | Variants                                         | Status |
//! |---------------------|--------------------------------------------------|--------|
//! | Protocol violation  | `BadRequest`, `Form`                             | 400    |
//! | Not found           | `NotFound`                                       | 404    |
//! | Internal            | `Database`, `Session`, `Template`, `PasswordHash`, `Task`, `Internal` | 500 |
//!
//! Validation failures are not errors at all: handlers re-render the form with
//! a 422 themselves. Unauthenticated access is answered by the authorization
//! guard with a redirect.
//!
//! Client-facing bodies are always the canonical reason phrase. Internal
//! failures are logged with full detail and the detail is attached to the
//! response as a [`ServerErrorDetail`] extension, which only the debug-mode
//! interceptor ever turns into body text.

use axum::{
    extract::rejection::FormRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// Application-wide error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Database errors, including pool acquire timeouts
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Session store failures (load, save, (de)serialization)
    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    /// Template rendering failures
    #[error("Template error: {0}")]
    Template(#[from] askama::Error),

    /// Password hashing failures (malformed stored hash, hasher failure)
    #[error("Password hash error: {0}")]
    PasswordHash(String),

    /// A blocking task was cancelled or panicked
    #[error("Background task error: {0}")]
    Task(#[from] tokio::task::JoinError),

    /// The submitted form could not be decoded at all
    #[error("Malformed form submission: {0}")]
    Form(#[from] FormRejection),

    /// The request broke the protocol (bad CSRF token, unreadable body)
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// The route or entity does not exist
    ///
    /// The message is for the log only; clients always get "Not Found".
    #[error("Not found: {0}")]
    NotFound(String),

    /// Email/password pair did not match a user
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Signup with an email address that is already registered
    #[error("Duplicate email")]
    DuplicateEmail,

    /// Anything else that should never happen
    #[error("Internal server error: {0}")]
    Internal(String),
}

/// Full error text attached to 500 responses for the debug-mode interceptor.
#[derive(Clone, Debug)]
pub struct ServerErrorDetail(pub String);

impl AppError {
    /// HTTP status this error is answered with
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) | AppError::Form(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AppError::DuplicateEmail => StatusCode::CONFLICT,
            AppError::Database(_)
            | AppError::Session(_)
            | AppError::Template(_)
            | AppError::PasswordHash(_)
            | AppError::Task(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Convert AppError into an HTTP response
///
/// 1. Determine the status
/// 2. Log (ERROR for internal failures, WARN for protocol violations, DEBUG for 404s)
/// 3. Answer with the canonical reason phrase as a plain-text body
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        match status {
            StatusCode::INTERNAL_SERVER_ERROR => {
                tracing::error!(error = ?self, "{}", self);
            }
            StatusCode::BAD_REQUEST => tracing::warn!("{}", self),
            _ => tracing::debug!("{}", self),
        }

        let body = status.canonical_reason().unwrap_or("Error");
        let mut response = (status, body).into_response();

        if status == StatusCode::INTERNAL_SERVER_ERROR {
            response
                .extensions_mut()
                .insert(ServerErrorDetail(self.to_string()));
        }

        response
    }
}

/// Convenience type alias for Results using AppError
pub type AppResult<T> = Result<T, AppError>;
