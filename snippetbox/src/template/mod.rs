//! Askama pages
//!
//! Every full page extends `base.html` and carries a [`TemplateData`] with
//! the values the layout needs. Pages are rendered into memory first, so a
//! failing template never produces a half-written response.

use crate::forms::{LoginForm, PasswordUpdateForm, SignupForm, SnippetCreateForm};
use crate::models::{Snippet, User};
use askama::Template;
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use chrono::{Datelike, Utc};

/// Values shared by every page layout
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemplateData {
    /// Year shown in the footer
    pub current_year: i32,
    /// One-shot message taken from the session
    pub flash: Option<String>,
    /// Whether to show the logged-in navigation
    pub is_authenticated: bool,
    /// Token embedded in every form
    pub csrf_token: String,
}

impl TemplateData {
    /// Layout values for a visitor without a session
    ///
    /// Used where the session middleware never ran, such as the 404 fallback.
    #[must_use]
    pub fn anonymous() -> Self {
        Self {
            current_year: Utc::now().year(),
            ..Self::default()
        }
    }
}

/// `GET /`
#[derive(Template)]
#[template(path = "home.html")]
pub struct HomePage {
    /// Layout values
    pub data: TemplateData,
    /// Latest snippets
    pub snippets: Vec<Snippet>,
}

/// `GET /snippet/view/{id}`
#[derive(Template)]
#[template(path = "view.html")]
pub struct ViewPage {
    /// Layout values
    pub data: TemplateData,
    /// Snippet shown
    pub snippet: Snippet,
}

/// `GET /snippet/create`, and re-render on invalid input
#[derive(Template)]
#[template(path = "create.html")]
pub struct CreatePage {
    /// Layout values
    pub data: TemplateData,
    /// Submitted or initial values
    pub form: SnippetCreateForm,
}

/// `GET /user/signup`, and re-render on invalid input
#[derive(Template)]
#[template(path = "signup.html")]
pub struct SignupPage {
    /// Layout values
    pub data: TemplateData,
    /// Submitted values
    pub form: SignupForm,
}

/// `GET /user/login`, and re-render on failed login
#[derive(Template)]
#[template(path = "login.html")]
pub struct LoginPage {
    /// Layout values
    pub data: TemplateData,
    /// Submitted values
    pub form: LoginForm,
}

/// `GET /account/view`
#[derive(Template)]
#[template(path = "account.html")]
pub struct AccountPage {
    /// Layout values
    pub data: TemplateData,
    /// Account shown
    pub user: User,
}

/// `GET /account/password/update`, and re-render on invalid input
#[derive(Template)]
#[template(path = "password.html")]
pub struct PasswordPage {
    /// Layout values
    pub data: TemplateData,
    /// Submitted values
    pub form: PasswordUpdateForm,
}

/// Body of every 404 response
#[derive(Template)]
#[template(path = "not_found.html")]
pub struct NotFoundPage {
    /// Layout values
    pub data: TemplateData,
}

/// Render `page` with `status`
///
/// A rendering failure is logged and becomes a generic 500.
pub fn render<T: Template>(status: StatusCode, page: &T) -> Response {
    match page.render() {
        Ok(html) => (status, Html(html)).into_response(),
        Err(err) => {
            tracing::error!(error = %err, "template rendering failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal Server Error",
            )
                .into_response()
        }
    }
}
