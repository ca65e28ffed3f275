//! # HTTP Request Handlers
//!
//! One function per route. By the time a handler runs, the interceptors have
//! already decided everything cross-cutting: the request carries a
//! [`RequestContext`](crate::context::RequestContext) with the CSRF token and
//! the caller's identity, protected handlers only ever see logged-in users,
//! and the snippet view receives its snippet ready-made.
//!
//! ## Submodules
//! - `health`: `/ping`
//! - `pages`: home and about
//! - `snippets`: view and create
//! - `users`: signup, login, logout, account
//!
//! ## Handler Pattern
//! ```rust,ignore
//! pub async fn my_handler(
//!     State(state): State<AppState>,          // repositories, config
//!     ctx: RequestContext,                    // published by interceptors
//!     session: Session,                       // flash messages
//!     PostForm(mut form): PostForm<MyForm>,   // body last
//! ) -> AppResult<Response> {
//!     // validate → 422 with the form, or act → 303
//! }
//! ```

pub mod health;
pub mod pages;
pub mod snippets;
pub mod users;

use crate::error::AppError;
use axum::http::{Method, Uri};

/// Unmatched paths and unmatched methods on known paths alike
pub async fn not_found(method: Method, uri: Uri) -> AppError {
    AppError::NotFound(format!("no route for {} {}", method, uri.path()))
}
