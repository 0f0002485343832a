//! Shared helpers for integration tests
//!
//! [`TestClient`] drives the full router in process and behaves like a
//! browser with one cookie: it stores the session cookie it is given and
//! sends it back on every request.

#![allow(dead_code)]

use axum::{
    body::{to_bytes, Body},
    http::{
        header::{CONTENT_TYPE, COOKIE, LOCATION, SET_COOKIE},
        HeaderMap, Method, Request, StatusCode,
    },
    Router,
};
use snippetbox::{
    config::SnippetboxConfig,
    forms::binder::encode_pairs,
    models::sqlite::{self, SqliteSnippetModel, SqliteUserModel},
    routes::routes,
    session::{MemoryStore, SessionConfig, SessionManager},
    state::AppState,
};
use sqlx::SqlitePool;
use std::path::PathBuf;
use std::sync::Arc;
use tower::ServiceExt;

/// Test configuration with the crate's static assets
pub fn test_config() -> SnippetboxConfig {
    let mut config = SnippetboxConfig::for_tests();
    config.server.static_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("ui/static");
    config
}

/// Router over a fresh in-memory database
pub async fn test_app() -> Router {
    let state = AppState::connect(test_config())
        .await
        .expect("in-memory state");
    routes(state)
}

/// State over a fresh in-memory database, with the pool for direct queries
pub async fn test_state_with_pool() -> (AppState, SqlitePool) {
    let config = test_config();
    let pool = sqlite::connect(&config.database).await.unwrap();
    sqlite::migrate(&pool).await.unwrap();

    let sessions = SessionManager::new(
        Arc::new(MemoryStore::new()),
        SessionConfig::from(&config.session),
    );
    let state = AppState::new(
        config,
        Arc::new(SqliteSnippetModel::new(pool.clone())),
        Arc::new(SqliteUserModel::new(pool.clone())),
        sessions,
    );
    (state, pool)
}

/// A collected response
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

impl TestResponse {
    pub fn location(&self) -> Option<&str> {
        self.headers.get(LOCATION).and_then(|v| v.to_str().ok())
    }
}

/// In-process client holding one session cookie
pub struct TestClient {
    app: Router,
    cookie: Option<String>,
}

impl TestClient {
    pub async fn new() -> Self {
        Self::with_app(test_app().await)
    }

    pub fn with_app(app: Router) -> Self {
        Self { app, cookie: None }
    }

    /// The router, for sending requests outside the client
    pub fn app(&self) -> Router {
        self.app.clone()
    }

    /// Current `name=value` session cookie
    pub fn cookie(&self) -> Option<&str> {
        self.cookie.as_deref()
    }

    /// Replace the stored cookie, e.g. to replay an old one
    pub fn set_cookie(&mut self, cookie: Option<String>) {
        self.cookie = cookie;
    }

    pub async fn get(&mut self, uri: &str) -> TestResponse {
        let req = self.get_request(uri);
        self.send(req).await
    }

    /// POST a form body exactly as given
    pub async fn post_form(&mut self, uri: &str, pairs: &[(&str, &str)]) -> TestResponse {
        let req = self.form_request(uri, pairs);
        self.send(req).await
    }

    /// GET request carrying the current cookie
    pub fn get_request(&self, uri: &str) -> Request<Body> {
        self.request(Method::GET, uri).body(Body::empty()).unwrap()
    }

    /// Form POST request carrying the current cookie
    pub fn form_request(&self, uri: &str, pairs: &[(&str, &str)]) -> Request<Body> {
        self.request(Method::POST, uri)
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(encode_pairs(pairs)))
            .unwrap()
    }

    /// POST a form with the session's CSRF token added
    pub async fn submit(&mut self, uri: &str, pairs: &[(&str, &str)]) -> TestResponse {
        let token = self.csrf_token().await;
        let mut pairs = pairs.to_vec();
        pairs.push(("csrf_token", token.as_str()));
        self.post_form(uri, &pairs).await
    }

    /// Fetch a page and read the CSRF token out of its forms
    pub async fn csrf_token(&mut self) -> String {
        let page = self.get("/user/login").await;
        extract_csrf_token(&page.body).expect("page carries a CSRF token")
    }

    /// Register an account through the signup form
    pub async fn signup(&mut self, name: &str, email: &str, password: &str) -> TestResponse {
        self.submit(
            "/user/signup",
            &[("name", name), ("email", email), ("password", password)],
        )
        .await
    }

    /// Log in through the login form
    pub async fn login(&mut self, email: &str, password: &str) -> TestResponse {
        self.submit("/user/login", &[("email", email), ("password", password)])
            .await
    }

    fn request(&self, method: Method, uri: &str) -> axum::http::request::Builder {
        let builder = Request::builder().method(method).uri(uri);
        match &self.cookie {
            Some(cookie) => builder.header(COOKIE, cookie),
            None => builder,
        }
    }

    async fn send(&mut self, req: Request<Body>) -> TestResponse {
        let response = self.app.clone().oneshot(req).await.unwrap();
        self.collect(response).await
    }

    /// Record any cookie `response` sets and read its body
    pub async fn collect(&mut self, response: axum::response::Response) -> TestResponse {
        if let Some(set_cookie) = response
            .headers()
            .get(SET_COOKIE)
            .and_then(|v| v.to_str().ok())
        {
            self.cookie = set_cookie.split(';').next().map(str::to_owned);
        }

        let status = response.status();
        let headers = response.headers().clone();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        TestResponse {
            status,
            headers,
            body: String::from_utf8_lossy(&body).into_owned(),
        }
    }
}

/// Value of the first `csrf_token` hidden input in `html`
pub fn extract_csrf_token(html: &str) -> Option<String> {
    let marker = "name=\"csrf_token\" value=\"";
    let start = html.find(marker)? + marker.len();
    let end = html[start..].find('"')? + start;
    Some(html[start..end].to_string())
}
