//! HTTP handlers
//!
//! Handlers receive the shared [`AppState`](crate::state::AppState), the
//! per-request [`RequestContext`](crate::extractors::RequestContext) and,
//! for submissions, a bound form. Validation failures re-render the page
//! with 422; successful mutations queue a flash message and redirect with
//! 303.

pub mod health;
pub mod snippets;
pub mod users;

use crate::error::AppError;
use crate::extractors::RequestContext;
use crate::template::{render, NotFoundPage};
use axum::{http::StatusCode, response::Response};

/// Fallback for unmatched paths
///
/// Runs outside the session middleware, so the page uses the anonymous
/// layout.
pub async fn not_found() -> AppError {
    AppError::NotFound
}

/// 404 page in the layout of the visitor's session
pub(crate) fn not_found_page(ctx: &RequestContext) -> Result<Response, AppError> {
    Ok(render(
        StatusCode::NOT_FOUND,
        &NotFoundPage {
            data: ctx.template_data()?,
        },
    ))
}
