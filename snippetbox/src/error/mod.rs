//! Error types and error handling
//!
//! Handlers return `Result<_, AppError>`. Anything unexpected becomes
//! [`AppError::Server`], which is logged in full and answered with a bare 500
//! so no internal detail reaches the visitor.

use crate::models::ModelError;
use crate::session::SessionError;
use crate::template::{render, NotFoundPage, TemplateData};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// Application error type
#[derive(Debug, Error)]
pub enum AppError {
    /// Nothing at this address
    ///
    /// Rendered with the anonymous layout. Handlers holding a
    /// [`RequestContext`](crate::extractors::RequestContext) render their own
    /// 404 so the page matches the visitor's session.
    #[error("not found")]
    NotFound,

    /// Unexpected failure
    #[error(transparent)]
    Server(#[from] anyhow::Error),
}

impl AppError {
    /// Shorthand for a server error with a message
    pub fn server(message: impl Into<String>) -> Self {
        Self::Server(anyhow::anyhow!(message.into()))
    }
}

impl From<ModelError> for AppError {
    fn from(err: ModelError) -> Self {
        match err {
            ModelError::NoRecord => Self::NotFound,
            other => Self::Server(other.into()),
        }
    }
}

impl From<SessionError> for AppError {
    fn from(err: SessionError) -> Self {
        Self::Server(err.into())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            Self::NotFound => render(
                StatusCode::NOT_FOUND,
                &NotFoundPage {
                    data: TemplateData::anonymous(),
                },
            ),
            Self::Server(err) => {
                tracing::error!(error = ?err, "internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error",
                )
                    .into_response()
            }
        }
    }
}
