//! Public pages that show no form.

use crate::context::RequestContext;
use crate::error::AppResult;
use crate::state::AppState;
use crate::templates::{render, AboutTemplate, HomeTemplate, TemplateData};
use axum::{extract::State, http::StatusCode, response::Response};
use tower_sessions::Session;

/// Latest snippets
///
/// ## Route
/// GET /
pub async fn home(
    State(state): State<AppState>,
    ctx: RequestContext,
    session: Session,
) -> AppResult<Response> {
    let snippets = state.snippets.latest().await?;

    let data = TemplateData::new(&ctx, &session).await?;
    render(StatusCode::OK, &HomeTemplate { data, snippets })
}

/// GET /about
pub async fn about(ctx: RequestContext, session: Session) -> AppResult<Response> {
    let data = TemplateData::new(&ctx, &session).await?;
    render(StatusCode::OK, &AboutTemplate { data })
}
