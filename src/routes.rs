//! # Pipeline Composer
//!
//! The whole interceptor chain is declared here, once, as data.
//!
//! ```text
//! request
//!   → security headers            (every response)
//!   → trailing-slash normalization
//!   → logger
//!   → panic recovery
//!   → router
//!       /ping, /static/*          bare
//!       everything else           interactive:
//!         → one request at a time per session cookie
//!         → session load/save
//!         → CSRF
//!         → session-authentication loader
//!         → per route: resource loader and/or authorization guard
//!         → handler
//! ```
//!
//! ## Layer order
//! `ServiceBuilder` lists its layers outermost first, so each stack below
//! reads in the same order a request travels through it.

use crate::handlers::{health, not_found, pages, snippets, users};
use crate::middleware::session_lock::{self, SessionLocks};
use crate::middleware::{auth, csrf, headers, logging, recover, resource};
use crate::session;
use crate::state::AppState;
use axum::{
    handler::HandlerWithoutStateExt,
    middleware::{from_fn, from_fn_with_state, map_response},
    routing::{get, post},
    Router,
};
use tower::{Layer, ServiceBuilder};
use tower_http::{normalize_path::NormalizePathLayer, services::ServeDir};
use tower_sessions::SessionStore;

/// Build the application
///
/// `session_store` is the SQLite store in production and a `MemoryStore` in
/// tests; everything else comes from `state`.
pub fn app<S>(state: AppState, session_store: S) -> Router
where
    S: SessionStore + Clone,
{
    let config = state.config.clone();

    // Routes only a logged-in user may reach
    let protected = Router::new()
        .route("/snippets/create", get(snippets::create_form))
        .route("/snippets", post(snippets::create))
        .route("/user/logout", post(users::logout))
        .route("/account/view", get(users::account_view))
        .route(
            "/account/password/update",
            get(users::password_form).post(users::password_update),
        )
        .route_layer(from_fn(auth::require_auth));

    // The static create route above wins over this pattern
    let snippet_view = Router::new()
        .route("/snippets/{id}", get(snippets::snippet_view))
        .route_layer(from_fn_with_state(state.clone(), resource::load_snippet));

    let interactive = Router::new()
        .route("/", get(pages::home))
        .route("/about", get(pages::about))
        .route(
            "/user/signup",
            get(users::signup_form).post(users::signup),
        )
        .route("/user/login", get(users::login_form).post(users::login))
        .merge(snippet_view)
        .merge(protected)
        .layer(
            ServiceBuilder::new()
                .layer(from_fn_with_state(
                    SessionLocks::new(),
                    session_lock::serialize_session,
                ))
                .layer(session::layer(session_store, &config))
                .layer(from_fn(csrf::verify_csrf))
                .layer(from_fn_with_state(state.clone(), auth::authenticate)),
        );

    let mut router = Router::new()
        .route("/ping", get(health::ping))
        // Missing files, directories and wrong methods get the same 404 as an
        // unmatched route
        .nest_service(
            "/static",
            ServeDir::new(&config.static_dir)
                .append_index_html_on_directories(false)
                .call_fallback_on_method_not_allowed(true)
                .fallback(not_found.into_service()),
        )
        .merge(interactive)
        .fallback(not_found)
        .method_not_allowed_fallback(not_found)
        .with_state(state);

    if config.debug {
        router = router.layer(map_response(recover::expose_error_detail));
    }

    let router = router.layer(
        ServiceBuilder::new()
            .layer(logging::layer())
            .layer(recover::layer(config.debug)),
    );

    // Normalization must happen before routing, so it wraps the router as a
    // service rather than being added as one of its layers
    Router::new()
        .fallback_service(NormalizePathLayer::trim_trailing_slash().layer(router))
        .layer(from_fn(headers::secure_headers))
}

