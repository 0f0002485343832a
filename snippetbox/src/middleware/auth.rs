//! Identity resolution and route protection
//!
//! [`authenticate`] runs on every dynamic route. It turns the user id stored
//! in the session into an [`AuthState`] request extension, checking that the
//! account still exists. [`require_authentication`] runs on protected routes
//! only and sends anonymous visitors to the login page.
//!
//! # Example
//!
//! ```rust,no_run
//! use snippetbox::middleware::auth::require_authentication;
//! use axum::{middleware, routing::get, Router};
//!
//! let protected: Router = Router::new().route(
//!     "/account/view",
//!     get(|| async { "account" }).route_layer(middleware::from_fn(require_authentication)),
//! );
//! ```

use crate::auth::{AuthState, Identity};
use crate::error::AppError;
use crate::models::{ModelError, UserStore};
use crate::session::{keys, Session};
use crate::state::AppState;
use axum::{
    extract::{Request, State},
    http::{header::CACHE_CONTROL, HeaderValue, Method},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};

/// Login page anonymous visitors are sent to
pub const LOGIN_PATH: &str = "/user/login";

/// Resolve the identity behind `session`
///
/// A user id that no longer matches an account is treated as logged out.
pub async fn resolve_identity(
    users: &dyn UserStore,
    session: &Session,
) -> Result<AuthState, ModelError> {
    let Some(user_id) = session.get::<i64>(keys::AUTHENTICATED_USER_ID) else {
        return Ok(AuthState::Unauthenticated);
    };

    match users.get(user_id).await {
        Ok(user) => Ok(AuthState::Authenticated(Identity::from(user))),
        Err(ModelError::NoRecord) => {
            tracing::debug!(user_id, "session refers to a deleted account");
            Ok(AuthState::Unauthenticated)
        }
        Err(err) => Err(err),
    }
}

/// Middleware inserting the request's [`AuthState`]
///
/// Requests without a session are anonymous. A failed user lookup ends the
/// request with a 500.
pub async fn authenticate(State(state): State<AppState>, mut req: Request, next: Next) -> Response {
    let session = req.extensions().get::<Session>().cloned();
    let auth = match session {
        Some(session) => match resolve_identity(state.users(), &session).await {
            Ok(auth) => auth,
            Err(err) => return AppError::Server(err.into()).into_response(),
        },
        None => AuthState::Unauthenticated,
    };

    req.extensions_mut().insert(auth);
    next.run(req).await
}

/// Let authenticated requests through, redirect the rest to login
///
/// For GET requests the requested path is remembered in the session so
/// login can return the visitor to it. Every response is marked
/// `Cache-Control: no-store`.
pub async fn require_authentication(req: Request, next: Next) -> Response {
    let authenticated = req
        .extensions()
        .get::<AuthState>()
        .is_some_and(AuthState::is_authenticated);

    let mut response = if authenticated {
        next.run(req).await
    } else {
        redirect_to_login(&req)
    };

    response
        .headers_mut()
        .insert(CACHE_CONTROL, HeaderValue::from_static("no-store"));
    response
}

fn redirect_to_login(req: &Request) -> Response {
    if req.method() == Method::GET {
        if let Some(session) = req.extensions().get::<Session>() {
            let target = req
                .uri()
                .path_and_query()
                .map_or_else(|| req.uri().path().to_owned(), ToString::to_string);
            if let Err(err) = session.put(keys::REDIRECT_PATH_AFTER_LOGIN, target) {
                return AppError::from(err).into_response();
            }
        }
    }

    tracing::debug!(path = %req.uri().path(), "redirecting anonymous visitor to login");
    Redirect::to(LOGIN_PATH).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SnippetboxConfig;
    use crate::models::{MockSnippetStore, MockUserStore, User};
    use crate::session::{MemoryStore, SessionConfig, SessionManager};
    use axum::{
        body::Body,
        http::{header::LOCATION, StatusCode},
        middleware,
        routing::get,
        Router,
    };
    use chrono::Utc;
    use std::sync::Arc;
    use tower::ServiceExt;

    fn session() -> Session {
        Session::fresh(Arc::new(MemoryStore::new()), chrono::Duration::hours(1))
    }

    fn user(id: i64) -> User {
        User {
            id,
            name: "Alice".into(),
            email: "alice@example.com".into(),
            hashed_password: String::new(),
            created: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_no_user_id_is_anonymous_without_lookup() {
        let users = MockUserStore::new();
        let auth = resolve_identity(&users, &session()).await.unwrap();
        assert_eq!(auth, AuthState::Unauthenticated);
    }

    #[tokio::test]
    async fn test_existing_user_is_authenticated() {
        let mut users = MockUserStore::new();
        users
            .expect_get()
            .withf(|id| *id == 7)
            .returning(|id| Ok(user(id)));

        let session = session();
        session.put(keys::AUTHENTICATED_USER_ID, 7_i64).unwrap();

        let auth = resolve_identity(&users, &session).await.unwrap();
        assert_eq!(auth.identity().map(|i| i.email.as_str()), Some("alice@example.com"));
    }

    #[tokio::test]
    async fn test_deleted_user_is_anonymous() {
        let mut users = MockUserStore::new();
        users.expect_get().returning(|_| Err(ModelError::NoRecord));

        let session = session();
        session.put(keys::AUTHENTICATED_USER_ID, 7_i64).unwrap();

        let auth = resolve_identity(&users, &session).await.unwrap();
        assert_eq!(auth, AuthState::Unauthenticated);
    }

    #[tokio::test]
    async fn test_lookup_failure_halts_with_500() {
        let mut users = MockUserStore::new();
        users
            .expect_get()
            .returning(|_| Err(ModelError::Database(sqlx::Error::PoolTimedOut)));

        let state = AppState::new(
            SnippetboxConfig::for_tests(),
            Arc::new(MockSnippetStore::new()),
            Arc::new(users),
            SessionManager::new(Arc::new(MemoryStore::new()), SessionConfig::default()),
        );

        let app = Router::new()
            .route("/", get(|| async { "handler ran" }))
            .layer(middleware::from_fn_with_state(state, authenticate));

        let session = session();
        session.put(keys::AUTHENTICATED_USER_ID, 1_i64).unwrap();
        let mut req = Request::builder().uri("/").body(Body::empty()).unwrap();
        req.extensions_mut().insert(session);

        let response = app.oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    fn gated() -> Router {
        Router::new().route(
            "/snippet/create",
            get(|| async { "form" })
                .post(|| async { "created" })
                .route_layer(middleware::from_fn(require_authentication)),
        )
    }

    fn request(method: Method, uri: &str, auth: AuthState, session: &Session) -> Request {
        let mut req = Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap();
        req.extensions_mut().insert(auth);
        req.extensions_mut().insert(session.clone());
        req
    }

    #[tokio::test]
    async fn test_anonymous_get_redirects_and_remembers_path() {
        let session = session();
        let req = request(
            Method::GET,
            "/snippet/create?draft=1",
            AuthState::Unauthenticated,
            &session,
        );

        let response = gated().oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers().get(LOCATION).unwrap(), LOGIN_PATH);
        assert_eq!(response.headers().get(CACHE_CONTROL).unwrap(), "no-store");
        assert_eq!(
            session.get_string(keys::REDIRECT_PATH_AFTER_LOGIN).as_deref(),
            Some("/snippet/create?draft=1")
        );
    }

    #[tokio::test]
    async fn test_anonymous_post_redirects_without_remembering() {
        let session = session();
        let req = request(Method::POST, "/snippet/create", AuthState::Unauthenticated, &session);

        let response = gated().oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert!(!session.contains(keys::REDIRECT_PATH_AFTER_LOGIN));
    }

    #[tokio::test]
    async fn test_authenticated_request_reaches_handler() {
        let session = session();
        let auth = AuthState::Authenticated(Identity {
            id: 1,
            name: "Alice".into(),
            email: "alice@example.com".into(),
        });

        let response = gated()
            .oneshot(request(Method::GET, "/snippet/create", auth, &session))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers().get(CACHE_CONTROL).unwrap(), "no-store");
    }

    #[tokio::test]
    async fn test_missing_auth_state_is_anonymous() {
        let req = Request::builder()
            .uri("/snippet/create")
            .body(Body::empty())
            .unwrap();
        let response = gated().oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers().get(LOCATION).unwrap(), LOGIN_PATH);
    }

    #[tokio::test]
    async fn test_wrong_method_is_not_gated() {
        let session = session();
        let req = request(Method::DELETE, "/snippet/create", AuthState::Unauthenticated, &session);

        let response = gated().oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert!(response.headers().get(CACHE_CONTROL).is_none());
        assert!(!session.contains(keys::REDIRECT_PATH_AFTER_LOGIN));
    }
}
