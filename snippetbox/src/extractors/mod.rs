//! Request-scoped context extractor
//!
//! The session and identity middleware leave their results in request
//! extensions. [`RequestContext`] collects both so handlers receive them as
//! one explicit parameter.

use crate::auth::{AuthState, Identity};
use crate::error::AppError;
use crate::middleware::csrf;
use crate::session::{keys, Session};
use crate::template::TemplateData;
use axum::{extract::FromRequestParts, http::request::Parts};
use chrono::{Datelike, Utc};

/// Session and identity of the current request
///
/// Requires the dynamic middleware chain; extraction fails with a 500 on
/// routes without the session middleware.
///
/// # Example
///
/// ```rust,no_run
/// use snippetbox::extractors::RequestContext;
///
/// async fn handler(ctx: RequestContext) -> String {
///     match ctx.identity() {
///         Some(identity) => format!("hello {}", identity.name),
///         None => "hello stranger".to_string(),
///     }
/// }
/// ```
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// The visitor's session
    pub session: Session,
    /// Result of identity resolution
    pub auth: AuthState,
}

impl RequestContext {
    /// The logged-in user, if any
    #[must_use]
    pub const fn identity(&self) -> Option<&Identity> {
        self.auth.identity()
    }

    /// True when a user is logged in
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.auth.is_authenticated()
    }

    /// Layout values for a page render
    ///
    /// Consumes the pending flash message and makes sure the session has a
    /// CSRF token for the page's forms.
    pub fn template_data(&self) -> Result<TemplateData, AppError> {
        Ok(TemplateData {
            current_year: Utc::now().year(),
            flash: self.session.pop_string(keys::FLASH),
            is_authenticated: self.is_authenticated(),
            csrf_token: csrf::ensure_token(&self.session)?,
        })
    }
}

impl<S> FromRequestParts<S> for RequestContext
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let session = parts
            .extensions
            .get::<Session>()
            .cloned()
            .ok_or_else(|| AppError::server("session middleware not installed"))?;

        let auth = parts
            .extensions
            .get::<AuthState>()
            .cloned()
            .ok_or_else(|| AppError::server("authenticate middleware not installed"))?;

        Ok(Self { session, auth })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::MemoryStore;
    use axum::http::{Request, StatusCode};
    use axum::response::IntoResponse;
    use std::sync::Arc;

    fn session() -> Session {
        Session::fresh(Arc::new(MemoryStore::new()), chrono::Duration::hours(1))
    }

    #[tokio::test]
    async fn test_extracts_from_extensions() {
        let (mut parts, ()) = Request::new(()).into_parts();
        parts.extensions.insert(session());
        parts.extensions.insert(AuthState::Authenticated(Identity {
            id: 1,
            name: "Alice".into(),
            email: "alice@example.com".into(),
        }));

        let ctx = RequestContext::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(ctx.identity().map(|i| i.id), Some(1));
    }

    #[tokio::test]
    async fn test_missing_session_is_server_error() {
        let (mut parts, ()) = Request::new(()).into_parts();
        let err = RequestContext::from_request_parts(&mut parts, &()).await.unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_template_data_pops_flash_and_keeps_csrf_token() {
        let ctx = RequestContext {
            session: session(),
            auth: AuthState::Unauthenticated,
        };
        ctx.session.put(keys::FLASH, "Done").unwrap();

        let first = ctx.template_data().unwrap();
        assert_eq!(first.flash.as_deref(), Some("Done"));
        assert!(!first.is_authenticated);

        let second = ctx.template_data().unwrap();
        assert_eq!(second.flash, None);
        assert_eq!(second.csrf_token, first.csrf_token);
    }
}
