//! Session middleware for automatic session management
//!
//! Reads the session cookie, holds the token's lock for the whole request,
//! loads the session into request extensions and saves it once the inner
//! service has produced a response. Saving happens for every response,
//! including 4xx re-renders. If the inner service panics or the request is
//! dropped, nothing is saved.

use crate::error::AppError;
use crate::session::{CookieUpdate, SessionConfig, SessionId, SessionManager};
use axum::{
    body::Body,
    extract::Request,
    http::{
        header::{COOKIE, SET_COOKIE, VARY},
        HeaderValue,
    },
    response::{IntoResponse, Response},
};
use std::str::FromStr;
use std::task::{Context, Poll};
use tower::{Layer, Service};

/// Layer for session middleware
#[derive(Clone, Debug)]
pub struct SessionLayer {
    manager: SessionManager,
}

impl SessionLayer {
    /// Create a session layer backed by `manager`
    #[must_use]
    pub const fn new(manager: SessionManager) -> Self {
        Self { manager }
    }
}

impl<S> Layer<S> for SessionLayer {
    type Service = SessionMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        SessionMiddleware {
            inner,
            manager: self.manager.clone(),
        }
    }
}

/// Session middleware that handles cookie-based sessions
#[derive(Clone, Debug)]
pub struct SessionMiddleware<S> {
    inner: S,
    manager: SessionManager,
}

impl<S> Service<Request> for SessionMiddleware<S>
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

    fn call(&mut self, mut req: Request) -> Self::Future {
        let manager = self.manager.clone();
        let mut inner = self.inner.clone();

        Box::pin(async move {
            let token = extract_session_id(&req, &manager.config().cookie_name);

            // held until the response is built and the session saved
            let _lock = match &token {
                Some(id) => Some(manager.lock(id).await),
                None => None,
            };

            let session = match manager.load(token).await {
                Ok(session) => session,
                Err(err) => return Ok(AppError::from(err).into_response()),
            };
            req.extensions_mut().insert(session.clone());

            let mut response = inner.call(req).await?;

            match manager.save(&session).await {
                Ok(update) => {
                    apply_cookie_update(&mut response, &update, manager.config());
                    Ok(response)
                }
                Err(err) => Ok(AppError::from(err).into_response()),
            }
        })
    }
}

/// Extract session ID from request cookies
fn extract_session_id(req: &Request, cookie_name: &str) -> Option<SessionId> {
    let cookie_header = req.headers().get(COOKIE)?;
    let cookie_str = cookie_header.to_str().ok()?;

    for cookie in cookie_str.split(';') {
        if let Some((name, value)) = cookie.trim().split_once('=') {
            if name.trim() == cookie_name {
                return SessionId::from_str(value.trim()).ok();
            }
        }
    }

    None
}

fn apply_cookie_update(response: &mut Response<Body>, update: &CookieUpdate, config: &SessionConfig) {
    let cookie = match update {
        CookieUpdate::Unchanged => return,
        CookieUpdate::Set { id, max_age } => session_cookie(config, id.as_str(), *max_age),
    };

    if let Ok(value) = HeaderValue::from_str(&cookie) {
        let headers = response.headers_mut();
        headers.append(SET_COOKIE, value);
        headers.append(VARY, HeaderValue::from_static("Cookie"));
    }
}

/// Build a `Set-Cookie` value for the session cookie
fn session_cookie(config: &SessionConfig, value: &str, max_age: i64) -> String {
    let mut cookie = format!(
        "{}={}; Path={}; Max-Age={}; SameSite={}",
        config.cookie_name,
        value,
        config.cookie_path,
        max_age,
        config.same_site.as_str()
    );

    if config.http_only {
        cookie.push_str("; HttpOnly");
    }

    if config.secure {
        cookie.push_str("; Secure");
    }

    cookie
}
