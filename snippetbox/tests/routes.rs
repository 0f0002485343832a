//! Route table, standard chain and static files

mod common;

use axum::{routing::get, Router};
use axum_test::TestServer;
use http::{header, HeaderMap, StatusCode};
use snippetbox::{middleware::chain, routes::routes, state::AppState};

async fn server() -> TestServer {
    TestServer::new(common::test_app().await).unwrap()
}

fn assert_security_headers(headers: &HeaderMap) {
    assert_eq!(
        headers[header::CONTENT_SECURITY_POLICY],
        "default-src 'self'; style-src 'self' fonts.googleapis.com; font-src fonts.gstatic.com"
    );
    assert_eq!(headers[header::REFERRER_POLICY], "origin-when-cross-origin");
    assert_eq!(headers[header::X_CONTENT_TYPE_OPTIONS], "nosniff");
    assert_eq!(headers[header::X_FRAME_OPTIONS], "deny");
    assert_eq!(headers[header::X_XSS_PROTECTION], "0");
}

#[tokio::test]
async fn test_ping() {
    let server = server().await;
    let response = server.get("/ping").await;

    response.assert_status_ok();
    response.assert_text("OK");
    assert_security_headers(response.headers());
    assert!(response.headers().get(header::SET_COOKIE).is_none());
}

#[tokio::test]
async fn test_home_page() {
    let server = server().await;
    let response = server.get("/").await;

    response.assert_status_ok();
    assert_security_headers(response.headers());
    assert!(response.text().contains("Latest Snippets"));
}

#[tokio::test]
async fn test_snippet_view_not_found() {
    let server = server().await;

    for path in ["/snippet/view/0", "/snippet/view/-3", "/snippet/view/abc", "/snippet/view/999"] {
        let response = server.get(path).await;
        response.assert_status(StatusCode::NOT_FOUND);
        assert_security_headers(response.headers());
    }
}

#[tokio::test]
async fn test_unknown_path_gets_custom_404() {
    let server = server().await;
    let response = server.get("/no/such/page").await;

    response.assert_status(StatusCode::NOT_FOUND);
    assert_security_headers(response.headers());
    assert!(response.text().contains("Not Found"));
    assert!(response.headers().get(header::SET_COOKIE).is_none());
}

#[tokio::test]
async fn test_wrong_method_is_405() {
    let server = server().await;
    let response = server.delete("/").await;
    response.assert_status(StatusCode::METHOD_NOT_ALLOWED);
    assert_security_headers(response.headers());
    assert!(response.headers().get(header::SET_COOKIE).is_none());
}

#[tokio::test]
async fn test_wrong_method_skips_page_stages() {
    let server = server().await;

    // CSRF would answer 403 for these if it ran
    for response in [
        server.put("/user/login").await,
        server.delete("/snippet/create").await,
        server.post("/account/view").await,
    ] {
        response.assert_status(StatusCode::METHOD_NOT_ALLOWED);
        assert!(response.headers().get(header::SET_COOKIE).is_none());
    }

    // the login gate would redirect and remember the path if it ran
    let response = server.get("/user/logout").await;
    response.assert_status(StatusCode::METHOD_NOT_ALLOWED);
    assert!(response.headers().get(header::LOCATION).is_none());
    assert!(response.headers().get(header::SET_COOKIE).is_none());
    assert!(response.headers().get(header::CACHE_CONTROL).is_none());
}

#[tokio::test]
async fn test_static_file() {
    let server = server().await;
    let response = server.get("/static/css/main.css").await;

    response.assert_status_ok();
    assert_security_headers(response.headers());
    assert!(response.headers().get(header::SET_COOKIE).is_none());
}

#[tokio::test]
async fn test_static_directory_without_index_is_404() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir(dir.path().join("img")).unwrap();
    std::fs::write(dir.path().join("img/logo.txt"), "logo").unwrap();

    let mut config = common::test_config();
    config.server.static_dir = dir.path().to_path_buf();
    let state = AppState::connect(config).await.unwrap();
    let server = TestServer::new(routes(state)).unwrap();

    server.get("/static/img/").await.assert_status(StatusCode::NOT_FOUND);

    let response = server.get("/static/img/logo.txt").await;
    response.assert_status_ok();
    response.assert_text("logo");
}

async fn explode() -> &'static str {
    panic!("handler failure")
}

#[tokio::test]
async fn test_panic_is_recovered_with_security_headers() {
    let app = chain::standard(
        Router::new()
            .route("/panic", get(explode))
            .route("/fine", get(|| async { "still serving" })),
    );
    let server = TestServer::new(app).unwrap();

    let response = server.get("/panic").await;
    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    response.assert_text("Internal Server Error");
    assert_security_headers(response.headers());
    assert_eq!(response.headers()[header::CONNECTION], "close");

    let response = server.get("/fine").await;
    response.assert_status_ok();
    response.assert_text("still serving");
}
