//! # Panic Recovery
//!
//! A handler that panics must not take the connection, or anyone else's
//! request, down with it. The panic is caught at this layer and turned into
//! exactly one 500 response:
//! - body: the canonical reason phrase, or the panic message in debug mode
//! - `Connection: close`, since whatever state the handler was touching may be
//!   half-updated and the connection must not be reused
//! - the panic message goes to the ERROR log either way
//!
//! The response is built only after the handler has unwound, so no partial
//! body can ever precede it.
//!
//! [`expose_error_detail`] is the debug-mode companion for ordinary errors:
//! it swaps the generic 500 body for the error text carried in
//! [`ServerErrorDetail`].

use crate::error::ServerErrorDetail;
use axum::{
    body::Body,
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use std::any::Any;
use tower_http::catch_panic::{CatchPanicLayer, ResponseForPanic};

/// Turns a caught panic into the 500 response
#[derive(Clone, Copy, Debug)]
pub struct PanicResponder {
    debug: bool,
}

impl ResponseForPanic for PanicResponder {
    type ResponseBody = Body;

    fn response_for_panic(&mut self, err: Box<dyn Any + Send + 'static>) -> Response<Body> {
        let message = panic_message(err.as_ref());
        tracing::error!(panic = %message, "recovered from handler panic");

        let body = if self.debug {
            format!("panic: {}", message)
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
                .canonical_reason()
                .unwrap_or("Internal Server Error")
                .to_string()
        };

        let mut response = (StatusCode::INTERNAL_SERVER_ERROR, body).into_response();
        response
            .headers_mut()
            .insert(header::CONNECTION, HeaderValue::from_static("close"));
        response
    }
}

/// `panic!` payloads are either `&'static str` or `String`
fn panic_message(err: &(dyn Any + Send)) -> String {
    if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

/// Panic recovery interceptor
pub fn layer(debug: bool) -> CatchPanicLayer<PanicResponder> {
    CatchPanicLayer::custom(PanicResponder { debug })
}

/// Debug mode only: put the logged error text into the 500 body
pub async fn expose_error_detail(response: Response) -> Response {
    let Some(ServerErrorDetail(detail)) = response.extensions().get::<ServerErrorDetail>().cloned()
    else {
        return response;
    };

    let (mut parts, _) = response.into_parts();
    parts.headers.remove(header::CONTENT_LENGTH);
    Response::from_parts(parts, Body::from(detail))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use axum::{body::to_bytes, http::Request, middleware, routing::get, Router};
    use tower::ServiceExt;

    async fn explode() -> &'static str {
        panic!("snippet table on fire")
    }

    async fn fail() -> Result<&'static str, AppError> {
        Err(AppError::Internal("pool exhausted".into()))
    }

    async fn call(app: Router, uri: &str) -> (Response, String) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let (parts, body) = response.into_parts();
        let bytes = to_bytes(body, usize::MAX).await.unwrap();
        (
            Response::from_parts(parts, Body::empty()),
            String::from_utf8(bytes.to_vec()).unwrap(),
        )
    }

    fn app(debug: bool) -> Router {
        let router = Router::new()
            .route("/panic", get(explode))
            .route("/fail", get(fail))
            .layer(layer(debug));
        if debug {
            router.layer(middleware::map_response(expose_error_detail))
        } else {
            router
        }
    }

    #[tokio::test]
    async fn panic_becomes_generic_500_and_closes_connection() {
        let (response, body) = call(app(false), "/panic").await;

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(response.headers()[header::CONNECTION], "close");
        assert_eq!(body, "Internal Server Error");
    }

    #[tokio::test]
    async fn debug_mode_shows_panic_message() {
        let (response, body) = call(app(true), "/panic").await;

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(response.headers()[header::CONNECTION], "close");
        assert!(body.contains("snippet table on fire"));
    }

    #[tokio::test]
    async fn ordinary_errors_keep_the_connection_open() {
        let (response, body) = call(app(false), "/fail").await;

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(response.headers().get(header::CONNECTION).is_none());
        assert_eq!(body, "Internal Server Error");
    }

    #[tokio::test]
    async fn debug_mode_shows_error_detail() {
        let (_, body) = call(app(true), "/fail").await;

        assert!(body.contains("pool exhausted"));
    }

    #[test]
    fn panic_payloads_are_readable() {
        assert_eq!(panic_message(&"static"), "static");
        assert_eq!(panic_message(&String::from("owned")), "owned");
        assert_eq!(panic_message(&42_u8), "unknown panic payload");
    }
}
