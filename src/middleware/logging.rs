//! Request logging
//!
//! One INFO span per request carrying the client address, protocol, method
//! and (already normalized) URI; the request and its response are logged
//! inside that span.

use axum::{extract::ConnectInfo, http::Request};
use std::net::SocketAddr;
use tower_http::{
    classify::{ServerErrorsAsFailures, SharedClassifier},
    trace::{DefaultOnRequest, DefaultOnResponse, MakeSpan, TraceLayer},
};
use tracing::{Level, Span};

/// Builds the per-request span
#[derive(Clone, Copy, Debug, Default)]
pub struct RequestSpan;

impl<B> MakeSpan<B> for RequestSpan {
    fn make_span(&mut self, request: &Request<B>) -> Span {
        tracing::info_span!(
            "request",
            remote_addr = %remote_addr(request),
            version = ?request.version(),
            method = %request.method(),
            uri = %request.uri(),
        )
    }
}

/// Peer address, or "-" when the server was not started with connect info
/// (as in tests driving the router directly)
fn remote_addr<B>(request: &Request<B>) -> String {
    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.to_string())
        .unwrap_or_else(|| "-".to_string())
}

/// Logger interceptor
pub fn layer() -> TraceLayer<SharedClassifier<ServerErrorsAsFailures>, RequestSpan> {
    TraceLayer::new_for_http()
        .make_span_with(RequestSpan)
        .on_request(DefaultOnRequest::new().level(Level::INFO))
        .on_response(DefaultOnResponse::new().level(Level::INFO))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    #[test]
    fn remote_addr_comes_from_connect_info() {
        let mut request = Request::new(Body::empty());
        assert_eq!(remote_addr(&request), "-");

        let addr: SocketAddr = "192.0.2.7:51000".parse().unwrap();
        request.extensions_mut().insert(ConnectInfo(addr));
        assert_eq!(remote_addr(&request), "192.0.2.7:51000");
    }
}
