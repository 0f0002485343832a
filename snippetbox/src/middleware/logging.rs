//! Request logging

use axum::{
    extract::{ConnectInfo, Request},
    middleware::Next,
    response::Response,
};
use std::net::SocketAddr;
use std::time::Instant;
use tracing::Instrument;

/// Log every request on arrival and its outcome on completion
///
/// The peer address comes from `ConnectInfo`; requests served without it
/// (tests, in-process callers) log `-`.
pub async fn log_request(req: Request, next: Next) -> Response {
    let remote_addr = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map_or_else(|| "-".to_string(), |ConnectInfo(addr)| addr.to_string());
    let proto = format!("{:?}", req.version());
    let method = req.method().clone();
    let uri = req.uri().clone();

    let span = tracing::info_span!("request", %method, %uri);
    async move {
        tracing::info!(ip = %remote_addr, %proto, "received request");
        let started = Instant::now();
        let response = next.run(req).await;
        tracing::debug!(
            status = response.status().as_u16(),
            elapsed_ms = started.elapsed().as_millis(),
            "finished request"
        );
        response
    }
    .instrument(span)
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::StatusCode, middleware, routing::get, Router};
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_passes_response_through() {
        let app = Router::new()
            .route("/", get(|| async { (StatusCode::ACCEPTED, "hi") }))
            .layer(middleware::from_fn(log_request));

        let req = Request::builder().uri("/").body(Body::empty()).unwrap();
        let response = app.oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::ACCEPTED);
    }
}
