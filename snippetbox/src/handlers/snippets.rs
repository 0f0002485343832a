//! Snippet pages

use crate::error::AppError;
use crate::extractors::RequestContext;
use crate::forms::{PostForm, SnippetCreateForm};
use crate::handlers::not_found_page;
use crate::models::ModelError;
use crate::session::keys;
use crate::state::AppState;
use crate::template::{render, CreatePage, HomePage, ViewPage};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};

/// `GET /`
pub async fn home(
    State(state): State<AppState>,
    ctx: RequestContext,
) -> Result<Response, AppError> {
    let snippets = state.snippets().latest().await?;

    Ok(render(
        StatusCode::OK,
        &HomePage {
            data: ctx.template_data()?,
            snippets,
        },
    ))
}

/// `GET /snippet/view/{id}`
///
/// Anything other than a positive integer id is a 404, as is an unknown or
/// expired snippet.
pub async fn snippet_view(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let id = match id.parse::<i64>() {
        Ok(id) if id >= 1 => id,
        _ => return not_found_page(&ctx),
    };

    let snippet = match state.snippets().get(id).await {
        Ok(snippet) => snippet,
        Err(ModelError::NoRecord) => return not_found_page(&ctx),
        Err(err) => return Err(err.into()),
    };

    Ok(render(
        StatusCode::OK,
        &ViewPage {
            data: ctx.template_data()?,
            snippet,
        },
    ))
}

/// `GET /snippet/create`
pub async fn snippet_create_form(ctx: RequestContext) -> Result<Response, AppError> {
    Ok(render(
        StatusCode::OK,
        &CreatePage {
            data: ctx.template_data()?,
            form: SnippetCreateForm::default(),
        },
    ))
}

/// `POST /snippet/create`
pub async fn snippet_create(
    State(state): State<AppState>,
    ctx: RequestContext,
    PostForm(mut form): PostForm<SnippetCreateForm>,
) -> Result<Response, AppError> {
    if !form.validate() {
        return Ok(render(
            StatusCode::UNPROCESSABLE_ENTITY,
            &CreatePage {
                data: ctx.template_data()?,
                form,
            },
        ));
    }

    let id = state
        .snippets()
        .insert(&form.title, &form.content, form.expires)
        .await?;
    tracing::info!(snippet_id = id, "snippet created");

    ctx.session
        .put(keys::FLASH, "Snippet successfully created!")?;

    Ok(Redirect::to(&format!("/snippet/view/{id}")).into_response())
}

#[cfg(test)]
mod tests {
    use crate::models::{MockSnippetStore, MockUserStore, ModelError, Snippet};
    use crate::state::AppState;
    use axum::{
        body::{to_bytes, Body},
        http::{header::LOCATION, Request, StatusCode},
        Router,
    };
    use chrono::{Duration, Utc};
    use tower::ServiceExt;

    fn app(snippets: MockSnippetStore) -> Router {
        crate::routes::routes(AppState::for_tests(snippets, MockUserStore::new()))
    }

    fn snippet(id: i64) -> Snippet {
        let now = Utc::now();
        Snippet {
            id,
            title: "An old silent pond".into(),
            content: "A frog jumps into the pond".into(),
            created: now,
            expires: now + Duration::days(7),
        }
    }

    async fn get(app: Router, uri: &str) -> (StatusCode, String) {
        let req = Request::builder().uri(uri).body(Body::empty()).unwrap();
        let response = app.oneshot(req).await.unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8_lossy(&body).into_owned())
    }

    #[tokio::test]
    async fn test_home_lists_latest() {
        let mut snippets = MockSnippetStore::new();
        snippets.expect_latest().returning(|| Ok(vec![snippet(1)]));

        let (status, body) = get(app(snippets), "/").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("An old silent pond"));
    }

    #[tokio::test]
    async fn test_home_database_failure_is_500() {
        let mut snippets = MockSnippetStore::new();
        snippets
            .expect_latest()
            .returning(|| Err(ModelError::Database(sqlx::Error::PoolClosed)));

        let (status, body) = get(app(snippets), "/").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, "Internal Server Error");
    }

    #[tokio::test]
    async fn test_view_rejects_non_positive_ids_without_lookup() {
        for uri in ["/snippet/view/0", "/snippet/view/-1", "/snippet/view/abc", "/snippet/view/1.5"] {
            let (status, _) = get(app(MockSnippetStore::new()), uri).await;
            assert_eq!(status, StatusCode::NOT_FOUND, "{uri}");
        }
    }

    #[tokio::test]
    async fn test_view_missing_snippet_is_404() {
        let mut snippets = MockSnippetStore::new();
        snippets
            .expect_get()
            .withf(|id| *id == 999)
            .returning(|_| Err(ModelError::NoRecord));

        let (status, _) = get(app(snippets), "/snippet/view/999").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_view_shows_snippet() {
        let mut snippets = MockSnippetStore::new();
        snippets.expect_get().returning(|id| Ok(snippet(id)));

        let (status, body) = get(app(snippets), "/snippet/view/4").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("A frog jumps into the pond"));
    }

    #[tokio::test]
    async fn test_create_form_requires_login() {
        let req = Request::builder()
            .uri("/snippet/create")
            .body(Body::empty())
            .unwrap();
        let response = app(MockSnippetStore::new()).oneshot(req).await.unwrap();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[LOCATION], "/user/login");
    }
}
