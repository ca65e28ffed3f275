//! Resource context loader for `/snippets/{id}`.

use crate::context::RequestContext;
use crate::error::{AppError, AppResult};
use crate::state::AppState;
use axum::{
    extract::{rejection::PathRejection, Path, Request, State},
    middleware::Next,
    response::Response,
};

/// Resolve the path id into a snippet and publish it for the handler
///
/// - Not a strictly positive integer → 404, the repository is never asked
/// - Repository says not found → 404
/// - Any other repository failure → 500 (logged by [`AppError`])
pub async fn load_snippet(
    State(state): State<AppState>,
    path: Result<Path<String>, PathRejection>,
    mut request: Request,
    next: Next,
) -> AppResult<Response> {
    let raw = path.map(|Path(raw)| raw).unwrap_or_default();
    let id = parse_resource_id(&raw)
        .ok_or_else(|| AppError::NotFound(format!("invalid snippet id {:?}", raw)))?;

    let snippet = state.snippets.get(id).await?;

    RequestContext::current(request.extensions())
        .with_snippet(snippet)
        .publish(&mut request);

    Ok(next.run(request).await)
}

/// Strictly positive integer ids only
pub fn parse_resource_id(raw: &str) -> Option<i64> {
    raw.parse::<i64>().ok().filter(|id| *id > 0)
}
