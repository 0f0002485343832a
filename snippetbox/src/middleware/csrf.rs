//! CSRF protection for state-changing requests
//!
//! Each session holds one random token under `csrf_token`, created the first
//! time a page is rendered. Every POST, PUT, PATCH and DELETE must echo that
//! token, either in the `csrf_token` form field or in the `X-CSRF-Token`
//! header. Requests without a matching token are answered with 403 Forbidden
//! before they reach a handler.
//!
//! Reading the form field means buffering the body; the buffered bytes are
//! handed on to the handler unchanged.

use crate::forms::binder::is_form_content_type;
use crate::session::{keys, Session, SessionError};
use axum::{
    body::{to_bytes, Body},
    extract::Request,
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use rand::Rng;
use std::task::{Context, Poll};
use tower::{Layer, Service};

/// Header checked before the form body
pub const CSRF_HEADER_NAME: &str = "x-csrf-token";

/// Form field holding the token
pub const CSRF_FORM_FIELD: &str = "csrf_token";

/// Largest body buffered while looking for the form field
pub const MAX_BUFFERED_BODY: usize = 2 * 1024 * 1024;

/// Generate a fresh token: 32 random bytes, unpadded base64url
#[must_use]
pub fn generate_token() -> String {
    let mut bytes = [0u8; 32];
    rand::rng().fill(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// The session's CSRF token, creating one if it has none yet
pub fn ensure_token(session: &Session) -> Result<String, SessionError> {
    if let Some(token) = session.get_string(keys::CSRF_TOKEN) {
        return Ok(token);
    }
    let token = generate_token();
    session.put(keys::CSRF_TOKEN, &token)?;
    Ok(token)
}

/// Compare two tokens without an early exit on the first differing byte
#[must_use]
pub fn tokens_match(submitted: &str, expected: &str) -> bool {
    submitted.len() == expected.len()
        && submitted
            .bytes()
            .zip(expected.bytes())
            .fold(0u8, |acc, (a, b)| acc | (a ^ b))
            == 0
}

/// Layer for CSRF middleware
///
/// Must sit inside the session layer, which provides the [`Session`].
#[derive(Clone, Copy, Debug, Default)]
pub struct CsrfLayer;

impl<S> Layer<S> for CsrfLayer {
    type Service = CsrfMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        CsrfMiddleware { inner }
    }
}

/// CSRF middleware service
#[derive(Clone, Debug)]
pub struct CsrfMiddleware<S> {
    inner: S,
}

impl<S> Service<Request> for CsrfMiddleware<S>
where
    S: Service<Request, Response = Response<Body>> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = Response<Body>;
    type Error = S::Error;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request) -> Self::Future {
        let mut inner = self.inner.clone();

        if is_method_safe(req.method()) {
            return Box::pin(inner.call(req));
        }

        Box::pin(async move {
            let method = req.method().clone();
            let path = req.uri().path().to_owned();

            let Some(session) = req.extensions().get::<Session>().cloned() else {
                tracing::error!("CSRF middleware requires the session layer to be applied first");
                return Ok(csrf_validation_error());
            };

            let Some(expected) = session.get_string(keys::CSRF_TOKEN) else {
                tracing::warn!(%method, %path, "CSRF check failed: session has no token");
                return Ok(csrf_validation_error());
            };

            let (parts, body) = req.into_parts();
            let header_token = parts
                .headers
                .get(CSRF_HEADER_NAME)
                .and_then(|value| value.to_str().ok())
                .map(str::to_owned);

            let (submitted, body) = match header_token {
                Some(token) => (Some(token), body),
                None => {
                    let Ok(bytes) = to_bytes(body, MAX_BUFFERED_BODY).await else {
                        tracing::warn!(%method, %path, "request body unreadable or too large");
                        return Ok(StatusCode::PAYLOAD_TOO_LARGE.into_response());
                    };
                    let token = if is_form_content_type(&parts.headers) {
                        form_field(&bytes, CSRF_FORM_FIELD)
                    } else {
                        None
                    };
                    (token, Body::from(bytes))
                }
            };

            match submitted {
                Some(token) if tokens_match(&token, &expected) => {
                    inner.call(Request::from_parts(parts, body)).await
                }
                Some(_) => {
                    tracing::warn!(%method, %path, "CSRF check failed: token mismatch");
                    Ok(csrf_validation_error())
                }
                None => {
                    tracing::warn!(%method, %path, "CSRF check failed: token missing");
                    Ok(csrf_validation_error())
                }
            }
        })
    }
}

const fn is_method_safe(method: &Method) -> bool {
    matches!(
        *method,
        Method::GET | Method::HEAD | Method::OPTIONS | Method::TRACE
    )
}

fn form_field(body: &[u8], name: &str) -> Option<String> {
    form_urlencoded::parse(body)
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.into_owned())
}

fn csrf_validation_error() -> Response<Body> {
    let status = StatusCode::FORBIDDEN;
    (status, status.canonical_reason().unwrap_or("Forbidden")).into_response()
}
