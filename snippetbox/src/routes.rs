//! Route table

use crate::handlers::{health, not_found, snippets, users};
use crate::middleware::chain::{self, dynamic, protected};
use crate::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::services::ServeDir;

/// Build the application router
///
/// `/ping` and `/static` get only the standard chain; page routes add the
/// dynamic chain, and account routes the protected one on top. A known path
/// requested with an unsupported method is answered 405 before any of the
/// page stages run.
pub fn routes(state: AppState) -> Router {
    let static_files = ServeDir::new(&state.config().server.static_dir);

    let router = Router::new()
        .route("/ping", get(health::ping))
        .nest_service("/static", static_files)
        .route("/", dynamic(get(snippets::home), &state))
        .route(
            "/snippet/view/{id}",
            dynamic(get(snippets::snippet_view), &state),
        )
        .route(
            "/user/signup",
            dynamic(get(users::signup_form).post(users::signup), &state),
        )
        .route(
            "/user/login",
            dynamic(get(users::login_form).post(users::login), &state),
        )
        .route(
            "/snippet/create",
            protected(
                get(snippets::snippet_create_form).post(snippets::snippet_create),
                &state,
            ),
        )
        .route("/user/logout", protected(post(users::logout), &state))
        .route("/account/view", protected(get(users::account_view), &state))
        .route(
            "/account/password/update",
            protected(
                get(users::password_update_form).post(users::password_update),
                &state,
            ),
        )
        .fallback(not_found)
        .with_state(state);

    chain::standard(router)
}
