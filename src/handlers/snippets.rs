//! # Snippet Handlers
//!
//! Viewing a snippet is public; creating one requires a logged-in user (the
//! authorization guard sits in front of both create routes).

use crate::context::{LoadedSnippet, RequestContext};
use crate::error::AppResult;
use crate::extract::PostForm;
use crate::session::FLASH;
use crate::state::AppState;
use crate::templates::{render, CreateTemplate, TemplateData, ViewTemplate};
use crate::validator::{max_chars, not_blank, permitted_value, Validator};
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;

/// Lifetimes a snippet may be created with, in days
const PERMITTED_EXPIRES: [i64; 3] = [1, 7, 365];

/// Submitted (or about to be shown) snippet form
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SnippetCreateForm {
    pub title: String,
    pub content: String,

    /// Days until the snippet expires
    pub expires: i64,

    #[serde(skip)]
    pub validator: Validator,
}

impl Default for SnippetCreateForm {
    fn default() -> Self {
        SnippetCreateForm {
            title: String::new(),
            content: String::new(),
            expires: 365,
            validator: Validator::default(),
        }
    }
}

impl SnippetCreateForm {
    fn validate(&mut self) {
        let v = &mut self.validator;
        v.check_field(not_blank(&self.title), "title", "This field cannot be blank");
        v.check_field(
            max_chars(&self.title, 100),
            "title",
            "This field cannot be more than 100 characters long",
        );
        v.check_field(not_blank(&self.content), "content", "This field cannot be blank");
        v.check_field(
            permitted_value(&self.expires, &PERMITTED_EXPIRES),
            "expires",
            "This field must equal 1, 7 or 365",
        );
    }
}

/// Show one snippet
///
/// ## Route
/// GET /snippets/{id}
///
/// The snippet was already fetched by the resource loader; this handler only
/// renders it.
pub async fn snippet_view(
    ctx: RequestContext,
    session: Session,
    LoadedSnippet(snippet): LoadedSnippet,
) -> AppResult<Response> {
    let data = TemplateData::new(&ctx, &session).await?;
    render(StatusCode::OK, &ViewTemplate { data, snippet })
}

/// Empty create form
///
/// ## Route
/// GET /snippets/create
pub async fn create_form(ctx: RequestContext, session: Session) -> AppResult<Response> {
    let data = TemplateData::new(&ctx, &session).await?;
    render(
        StatusCode::OK,
        &CreateTemplate {
            data,
            form: SnippetCreateForm::default(),
        },
    )
}

/// Create a snippet
///
/// ## Route
/// POST /snippets
///
/// ## Response
/// - invalid fields → 422, the form again with the submitted values
/// - otherwise → 303 to the new snippet, with a flash message
pub async fn create(
    State(state): State<AppState>,
    ctx: RequestContext,
    session: Session,
    PostForm(mut form): PostForm<SnippetCreateForm>,
) -> AppResult<Response> {
    form.validate();

    if !form.validator.valid() {
        let data = TemplateData::new(&ctx, &session).await?;
        return render(StatusCode::UNPROCESSABLE_ENTITY, &CreateTemplate { data, form });
    }

    let id = state
        .snippets
        .insert(&form.title, &form.content, form.expires)
        .await?;
    tracing::info!(id, "snippet created");

    session.insert(FLASH, "Snippet successfully created!").await?;

    Ok(Redirect::to(&format!("/snippets/{}", id)).into_response())
}
