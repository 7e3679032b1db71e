use axum::body::Body;
use axum::Router;
use http::StatusCode;
use tempfile::TempDir;
use tower::ServiceExt;

use signup_portal::config::OAuthProvider;
use signup_portal::routes;
use signup_portal::test_util::{test_config, test_state};

fn configured_app(dir: &TempDir) -> Router {
    let config = test_config(&dir.path().join("signups.csv"), None);
    routes::app(test_state(config, "http://127.0.0.1:1"))
}

fn unconfigured_app(dir: &TempDir) -> Router {
    let mut config = test_config(&dir.path().join("signups.csv"), None);
    config.oauth = OAuthProvider::Unconfigured;
    routes::app(test_state(config, "http://127.0.0.1:1"))
}

async fn send_get(app: &Router, uri: &str) -> http::Response<axum::body::Body> {
    app.clone()
        .oneshot(
            http::Request::builder()
                .method("GET")
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap()
}

async fn body_string(response: http::Response<axum::body::Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn test_health_returns_ok() {
    let dir = TempDir::new().unwrap();
    let app = configured_app(&dir);

    let response = send_get(&app, "/health").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_string(response).await.contains("\"ok\""));
}

#[tokio::test]
async fn test_landing_page_offers_login_when_configured() {
    let dir = TempDir::new().unwrap();
    let app = configured_app(&dir);

    let response = send_get(&app, "/").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_string(response).await.contains("/login/google"));
}

#[tokio::test]
async fn test_landing_page_notes_missing_configuration() {
    let dir = TempDir::new().unwrap();
    let app = unconfigured_app(&dir);

    let response = send_get(&app, "/").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_string(response).await.contains("not configured"));
}

#[tokio::test]
async fn test_login_route_absent_when_unconfigured() {
    let dir = TempDir::new().unwrap();
    let app = unconfigured_app(&dir);

    let response = send_get(&app, "/login/google").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_profile_redirects_home_when_unconfigured() {
    let dir = TempDir::new().unwrap();
    let app = unconfigured_app(&dir);

    let response = send_get(&app, "/profile").await;
    assert!(response.status().is_redirection());
    assert_eq!(response.headers()["location"], "/");
}

#[tokio::test]
async fn test_profile_when_unconfigured_flashes_landing_page() {
    let dir = TempDir::new().unwrap();
    let app = unconfigured_app(&dir);

    let response = send_get(&app, "/profile").await;
    let cookie = response.headers()["set-cookie"]
        .to_str()
        .unwrap()
        .split(';')
        .next()
        .unwrap()
        .to_string();

    // The flash paragraph shows up once, then clears.
    let response = app
        .clone()
        .oneshot(
            http::Request::builder()
                .method("GET")
                .uri("/")
                .header("Cookie", &cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert!(body_string(response).await.contains("class=\"flash\""));

    let response = app
        .clone()
        .oneshot(
            http::Request::builder()
                .method("GET")
                .uri("/")
                .header("Cookie", &cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert!(!body_string(response).await.contains("class=\"flash\""));
}

#[tokio::test]
async fn test_debug_redirect_uri_when_unconfigured() {
    let dir = TempDir::new().unwrap();
    let app = unconfigured_app(&dir);

    let response = send_get(&app, "/debug/redirect-uri").await;
    assert_eq!(
        body_string(response).await,
        "OAuth not configured (no client id/secret)."
    );
}

#[tokio::test]
async fn test_logout_without_session_still_redirects_home() {
    let dir = TempDir::new().unwrap();
    let app = configured_app(&dir);

    let response = send_get(&app, "/logout").await;
    assert!(response.status().is_redirection());
    assert_eq!(response.headers()["location"], "/");
    assert!(response.headers().contains_key("set-cookie"));
}

#[tokio::test]
async fn test_unknown_route_returns_404() {
    let dir = TempDir::new().unwrap();
    let app = configured_app(&dir);

    let response = send_get(&app, "/nonexistent").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
