//! # User Handlers
//!
//! Signup, login, logout and the account pages.
//!
//! ## Session handling
//! Login and logout both re-establish the session: the session id is cycled
//! (the old record is deleted from the store) and the CSRF token is replaced.
//! A cookie or token captured before either step is useless afterwards.

use crate::context::RequestContext;
use crate::error::{AppError, AppResult};
use crate::extract::PostForm;
use crate::middleware::csrf;
use crate::session::{AUTHENTICATED_USER_ID, FLASH, REDIRECT_AFTER_LOGIN};
use crate::state::AppState;
use crate::templates::{
    render, AccountTemplate, LoginTemplate, PasswordTemplate, SignupTemplate, TemplateData,
};
use crate::validator::{is_email, min_chars, not_blank, Validator};
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;

const BLANK: &str = "This field cannot be blank";
const SHORT_PASSWORD: &str = "This field must be at least 8 characters long";
const BAD_EMAIL: &str = "This field must be a valid email address";

/// Where a fresh login lands when no protected page was requested before
const DEFAULT_AFTER_LOGIN: &str = "/snippets/create";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct UserSignupForm {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(skip)]
    pub validator: Validator,
}

impl UserSignupForm {
    fn validate(&mut self) {
        let v = &mut self.validator;
        v.check_field(not_blank(&self.name), "name", BLANK);
        v.check_field(not_blank(&self.email), "email", BLANK);
        v.check_field(is_email(&self.email), "email", BAD_EMAIL);
        v.check_field(not_blank(&self.password), "password", BLANK);
        v.check_field(min_chars(&self.password, 8), "password", SHORT_PASSWORD);
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct UserLoginForm {
    pub email: String,
    pub password: String,
    #[serde(skip)]
    pub validator: Validator,
}

impl UserLoginForm {
    fn validate(&mut self) {
        let v = &mut self.validator;
        v.check_field(not_blank(&self.email), "email", BLANK);
        v.check_field(is_email(&self.email), "email", BAD_EMAIL);
        v.check_field(not_blank(&self.password), "password", BLANK);
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct PasswordUpdateForm {
    pub current_password: String,
    pub new_password: String,
    pub new_password_confirmation: String,
    #[serde(skip)]
    pub validator: Validator,
}

impl PasswordUpdateForm {
    fn validate(&mut self) {
        let v = &mut self.validator;
        v.check_field(not_blank(&self.current_password), "current_password", BLANK);
        v.check_field(not_blank(&self.new_password), "new_password", BLANK);
        v.check_field(min_chars(&self.new_password, 8), "new_password", SHORT_PASSWORD);
        v.check_field(
            not_blank(&self.new_password_confirmation),
            "new_password_confirmation",
            BLANK,
        );
        v.check_field(
            self.new_password == self.new_password_confirmation,
            "new_password_confirmation",
            "Passwords do not match",
        );
    }
}

/// GET /user/signup
pub async fn signup_form(ctx: RequestContext, session: Session) -> AppResult<Response> {
    let data = TemplateData::new(&ctx, &session).await?;
    render(
        StatusCode::OK,
        &SignupTemplate {
            data,
            form: UserSignupForm::default(),
        },
    )
}

/// Create an account
///
/// ## Route
/// POST /user/signup
///
/// ## Response
/// - invalid fields or email already registered → 422 with the form
/// - otherwise → 303 to the login page
pub async fn signup(
    State(state): State<AppState>,
    ctx: RequestContext,
    session: Session,
    PostForm(mut form): PostForm<UserSignupForm>,
) -> AppResult<Response> {
    form.validate();

    if form.validator.valid() {
        match state.users.insert(&form.name, &form.email, &form.password).await {
            Ok(()) => {
                tracing::info!(email = %form.email, "user signed up");
                session
                    .insert(FLASH, "Your signup was successful. Please log in.")
                    .await?;
                return Ok(Redirect::to("/user/login").into_response());
            }
            Err(AppError::DuplicateEmail) => form
                .validator
                .add_field_error("email", "Email address is already in use"),
            Err(e) => return Err(e),
        }
    }

    let data = TemplateData::new(&ctx, &session).await?;
    render(StatusCode::UNPROCESSABLE_ENTITY, &SignupTemplate { data, form })
}

/// GET /user/login
pub async fn login_form(ctx: RequestContext, session: Session) -> AppResult<Response> {
    let data = TemplateData::new(&ctx, &session).await?;
    render(
        StatusCode::OK,
        &LoginTemplate {
            data,
            form: UserLoginForm::default(),
        },
    )
}

/// Log in
///
/// ## Route
/// POST /user/login
///
/// ## How it works
/// 1. Validate the fields, then check the credentials
/// 2. Cycle the session id so a planted cookie never becomes authenticated
/// 3. Store the user id and issue a new CSRF token
/// 4. Send the user where they were headed, or to the create page
pub async fn login(
    State(state): State<AppState>,
    ctx: RequestContext,
    session: Session,
    PostForm(mut form): PostForm<UserLoginForm>,
) -> AppResult<Response> {
    form.validate();

    if form.validator.valid() {
        match state.users.authenticate(&form.email, &form.password).await {
            Ok(user_id) => {
                session.cycle_id().await?;
                session.insert(AUTHENTICATED_USER_ID, user_id).await?;
                csrf::rotate_token(&session).await?;

                let target = session
                    .remove::<String>(REDIRECT_AFTER_LOGIN)
                    .await?
                    .unwrap_or_else(|| DEFAULT_AFTER_LOGIN.to_string());

                tracing::info!(user_id, "user logged in");
                return Ok(Redirect::to(&target).into_response());
            }
            Err(AppError::InvalidCredentials) => form
                .validator
                .add_non_field_error("Email or password is incorrect"),
            Err(e) => return Err(e),
        }
    }

    let data = TemplateData::new(&ctx, &session).await?;
    render(StatusCode::UNPROCESSABLE_ENTITY, &LoginTemplate { data, form })
}

/// Log out
///
/// ## Route
/// POST /user/logout
pub async fn logout(ctx: RequestContext, session: Session) -> AppResult<Response> {
    session.cycle_id().await?;
    session.remove::<i64>(AUTHENTICATED_USER_ID).await?;
    session.remove::<String>(REDIRECT_AFTER_LOGIN).await?;
    csrf::rotate_token(&session).await?;
    session
        .insert(FLASH, "You've been logged out successfully!")
        .await?;

    tracing::info!(user_id = ?ctx.identity.user_id(), "user logged out");
    Ok(Redirect::to("/").into_response())
}

/// The logged-in user's details
///
/// ## Route
/// GET /account/view
pub async fn account_view(
    State(state): State<AppState>,
    ctx: RequestContext,
    session: Session,
) -> AppResult<Response> {
    let user_id = current_user_id(&ctx)?;
    let user = state.users.get(user_id).await?;

    let data = TemplateData::new(&ctx, &session).await?;
    render(StatusCode::OK, &AccountTemplate { data, user })
}

/// GET /account/password/update
pub async fn password_form(ctx: RequestContext, session: Session) -> AppResult<Response> {
    let data = TemplateData::new(&ctx, &session).await?;
    render(
        StatusCode::OK,
        &PasswordTemplate {
            data,
            form: PasswordUpdateForm::default(),
        },
    )
}

/// Change password
///
/// ## Route
/// POST /account/password/update
pub async fn password_update(
    State(state): State<AppState>,
    ctx: RequestContext,
    session: Session,
    PostForm(mut form): PostForm<PasswordUpdateForm>,
) -> AppResult<Response> {
    let user_id = current_user_id(&ctx)?;
    form.validate();

    if form.validator.valid() {
        match state
            .users
            .update_password(user_id, &form.current_password, &form.new_password)
            .await
        {
            Ok(()) => {
                tracing::info!(user_id, "password updated");
                session.insert(FLASH, "Your password has been updated!").await?;
                return Ok(Redirect::to("/account/view").into_response());
            }
            Err(AppError::InvalidCredentials) => form
                .validator
                .add_field_error("current_password", "Current password is incorrect"),
            Err(e) => return Err(e),
        }
    }

    let data = TemplateData::new(&ctx, &session).await?;
    render(StatusCode::UNPROCESSABLE_ENTITY, &PasswordTemplate { data, form })
}

/// Only called behind the authorization guard, which already turned
/// anonymous requests away.
fn current_user_id(ctx: &RequestContext) -> AppResult<i64> {
    ctx.identity
        .user_id()
        .ok_or_else(|| AppError::Internal("account handler reached without a logged-in user".into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tower_sessions::MemoryStore;

    #[test]
    fn signup_rules() {
        let mut form = UserSignupForm {
            name: "".into(),
            email: "mocky@example.".into(),
            password: "pa$$".into(),
            ..Default::default()
        };
        form.validate();

        assert_eq!(form.validator.field_error("name"), BLANK);
        assert_eq!(form.validator.field_error("email"), BAD_EMAIL);
        assert_eq!(form.validator.field_error("password"), SHORT_PASSWORD);
    }

    #[test]
    fn blank_email_reports_blank_first() {
        let mut form = UserLoginForm::default();
        form.validate();

        assert_eq!(form.validator.field_error("email"), BLANK);
        assert_eq!(form.validator.field_error("password"), BLANK);
    }

    #[test]
    fn password_confirmation_must_match() {
        let mut form = PasswordUpdateForm {
            current_password: "pa$$word1".into(),
            new_password: "newpa$$word".into(),
            new_password_confirmation: "newpa$$w0rd".into(),
            ..Default::default()
        };
        form.validate();

        assert!(!form.validator.valid());
        assert_eq!(
            form.validator.field_error("new_password_confirmation"),
            "Passwords do not match"
        );
        assert!(!form.validator.has_error("new_password"));
    }

    #[tokio::test]
    async fn logout_forgets_the_remembered_page() {
        let session = Session::new(None, Arc::new(MemoryStore::default()), None);
        session.insert(AUTHENTICATED_USER_ID, 1_i64).await.unwrap();
        session
            .insert(REDIRECT_AFTER_LOGIN, "/account/view")
            .await
            .unwrap();

        let response = logout(RequestContext::default(), session.clone())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(session.get::<i64>(AUTHENTICATED_USER_ID).await.unwrap(), None);
        assert_eq!(
            session.get::<String>(REDIRECT_AFTER_LOGIN).await.unwrap(),
            None
        );
    }
}
