//! Middleware chains
//!
//! Three chains, each extending the previous one:
//!
//! | chain       | stages (outer → inner)                                  |
//! |-------------|---------------------------------------------------------|
//! | `standard`  | panic recovery, request logging, security headers       |
//! | `dynamic`   | session load/save, CSRF check, identity resolution      |
//! | `protected` | require authentication                                  |
//!
//! `standard` wraps the whole router, fallback and static files included.
//! `dynamic` and `protected` wrap the handlers of one path only. The path's
//! 405 response for an unsupported method stays outside them, so it never
//! touches the session.

use super::auth::{authenticate, require_authentication};
use super::csrf::CsrfLayer;
use super::logging::log_request;
use super::recover;
use super::security_headers::SecurityHeadersLayer;
use super::session::SessionLayer;
use crate::state::AppState;
use axum::{middleware, routing::MethodRouter, Router};
use tower::ServiceBuilder;

/// Wrap a fully built router in the chain every request passes through
pub fn standard(router: Router) -> Router {
    router.layer(
        ServiceBuilder::new()
            .layer(recover::layer())
            .layer(middleware::from_fn(log_request))
            .layer(SecurityHeadersLayer),
    )
}

/// Add session, CSRF and identity stages to the handlers of one path
pub fn dynamic(handlers: MethodRouter<AppState>, state: &AppState) -> MethodRouter<AppState> {
    handlers.route_layer(
        ServiceBuilder::new()
            .layer(SessionLayer::new(state.sessions().clone()))
            .layer(CsrfLayer)
            .layer(middleware::from_fn_with_state(state.clone(), authenticate)),
    )
}

/// Restrict the handlers of one path to logged-in users, on top of [`dynamic`]
pub fn protected(handlers: MethodRouter<AppState>, state: &AppState) -> MethodRouter<AppState> {
    dynamic(
        handlers.route_layer(middleware::from_fn(require_authentication)),
        state,
    )
}
