//! Request extractors shared by the handlers.

use crate::error::AppError;
use axum::extract::FromRequest;

/// A urlencoded form body
///
/// Same as [`axum::Form`], except that an undecodable body (wrong content
/// type, a non-numeric value in a numeric field) is answered through
/// [`AppError`], i.e. as a plain 400.
#[derive(FromRequest)]
#[from_request(via(axum::Form), rejection(AppError))]
pub struct PostForm<T>(pub T);
