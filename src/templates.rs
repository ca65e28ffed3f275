//! # HTML Pages
//!
//! Every page is an askama template (compiled into the binary from
//! `templates/`) whose struct carries a [`TemplateData`] with the values the
//! base layout needs, plus whatever the page itself shows.
//!
//! ## Rendering
//! [`render`] produces the whole page into a string first. A template error
//! therefore becomes a clean 500, never a half-written 200.

use crate::context::RequestContext;
use crate::db::models::{Snippet, User};
use crate::error::AppResult;
use crate::handlers::snippets::SnippetCreateForm;
use crate::handlers::users::{PasswordUpdateForm, UserLoginForm, UserSignupForm};
use crate::session::FLASH;
use askama::Template;
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use chrono::{Datelike, Utc};
use tower_sessions::Session;

/// Values every page needs
#[derive(Clone, Debug, Default)]
pub struct TemplateData {
    pub current_year: i32,

    /// One-shot message; reading it removes it from the session
    pub flash: String,

    pub is_authenticated: bool,

    /// Embedded into every form as the `csrf_token` hidden field
    pub csrf_token: String,
}

impl TemplateData {
    pub async fn new(ctx: &RequestContext, session: &Session) -> AppResult<Self> {
        let flash = session.remove::<String>(FLASH).await?.unwrap_or_default();

        Ok(TemplateData {
            current_year: Utc::now().year(),
            flash,
            is_authenticated: ctx.identity.is_authenticated(),
            csrf_token: ctx.csrf_token.clone(),
        })
    }
}

#[derive(Template)]
#[template(path = "pages/home.html")]
pub struct HomeTemplate {
    pub data: TemplateData,
    pub snippets: Vec<Snippet>,
}

#[derive(Template)]
#[template(path = "pages/about.html")]
pub struct AboutTemplate {
    pub data: TemplateData,
}

#[derive(Template)]
#[template(path = "pages/view.html")]
pub struct ViewTemplate {
    pub data: TemplateData,
    pub snippet: Snippet,
}

#[derive(Template)]
#[template(path = "pages/create.html")]
pub struct CreateTemplate {
    pub data: TemplateData,
    pub form: SnippetCreateForm,
}

#[derive(Template)]
#[template(path = "pages/signup.html")]
pub struct SignupTemplate {
    pub data: TemplateData,
    pub form: UserSignupForm,
}

#[derive(Template)]
#[template(path = "pages/login.html")]
pub struct LoginTemplate {
    pub data: TemplateData,
    pub form: UserLoginForm,
}

#[derive(Template)]
#[template(path = "pages/account.html")]
pub struct AccountTemplate {
    pub data: TemplateData,
    pub user: User,
}

#[derive(Template)]
#[template(path = "pages/password.html")]
pub struct PasswordTemplate {
    pub data: TemplateData,
    pub form: PasswordUpdateForm,
}

/// Render `template` into a complete HTML response with `status`
pub fn render<T: Template>(status: StatusCode, template: &T) -> AppResult<Response> {
    let html = template.render()?;
    Ok((status, Html(html)).into_response())
}
