//! Panic recovery
//!
//! [`handle_panic`] is installed through `tower_http::catch_panic` as the
//! outermost layer. A panicking request is answered with a plain 500 carrying
//! the security headers and `Connection: close`; the server keeps running.

use super::security_headers;
use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use std::any::Any;
use tower_http::catch_panic::CatchPanicLayer;

/// Catch-panic layer using [`handle_panic`]
#[must_use]
pub fn layer() -> CatchPanicLayer<fn(Box<dyn Any + Send + 'static>) -> Response> {
    CatchPanicLayer::custom(handle_panic as fn(Box<dyn Any + Send + 'static>) -> Response)
}

/// Turn a panic payload into a 500 response
pub fn handle_panic(payload: Box<dyn Any + Send + 'static>) -> Response {
    let message = payload
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| payload.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic payload");
    tracing::error!(panic = message, "request handler panicked");

    let mut response = (
        StatusCode::INTERNAL_SERVER_ERROR,
        "Internal Server Error",
    )
        .into_response();
    let headers = response.headers_mut();
    security_headers::apply(headers);
    headers.insert(header::CONNECTION, HeaderValue::from_static("close"));
    response
}
