//! Router behaviour that needs no database: anything rejected before a
//! query runs, plus static files and docs.

use std::path::PathBuf;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use catalog_api::{config::AppConfig, routes::create_app, state::AppState};
use http_body_util::BodyExt;
use sea_orm::DatabaseConnection;
use tower::ServiceExt;

fn app(storage_root: PathBuf) -> Router {
    let config = AppConfig {
        database_url: "postgres://unused".to_string(),
        host: "127.0.0.1".to_string(),
        port: 3000,
        app_url: "http://localhost:3000".to_string(),
        jwt_secret: "router-test-secret".to_string(),
        token_ttl_hours: 1,
        storage_root,
        max_upload_kb: 16,
    };
    create_app(AppState::new(DatabaseConnection::Disconnected, config))
}

async fn json_body(response: axum::response::Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn health_is_public() {
    let dir = tempfile::tempdir().unwrap();
    let response = app(dir.path().into())
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["data"]["status"], "ok");
}

#[tokio::test]
async fn writes_without_token_are_unauthorized() {
    let dir = tempfile::tempdir().unwrap();
    let app = app(dir.path().into());

    for (method, uri) in [
        ("POST", "/api/products"),
        ("DELETE", "/api/products/8c1f7c36-3d3e-4a6b-9a52-2f8f2f0c6b11"),
        ("POST", "/api/categories"),
        ("GET", "/api/me"),
        ("POST", "/api/logout"),
    ] {
        let response = app
            .clone()
            .oneshot(Request::builder().method(method).uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{method} {uri}");
    }
}

#[tokio::test]
async fn garbage_bearer_token_is_unauthorized() {
    let dir = tempfile::tempdir().unwrap();
    let response = app(dir.path().into())
        .oneshot(
            Request::get("/api/me")
                .header(header::AUTHORIZATION, "Bearer not-a-jwt")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn unknown_path_gets_json_404() {
    let dir = tempfile::tempdir().unwrap();
    let response = app(dir.path().into())
        .oneshot(Request::get("/nope").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = json_body(response).await;
    assert_eq!(body["data"]["path"], "/nope");
}

#[tokio::test]
async fn stored_photos_are_served_under_storage() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join("products")).unwrap();
    std::fs::write(dir.path().join("products/a.gif"), b"GIF89a").unwrap();

    let response = app(dir.path().into())
        .oneshot(Request::get("/storage/products/a.gif").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&bytes[..], b"GIF89a");
}

#[tokio::test]
async fn oversized_body_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    // 16 KiB upload limit plus 64 KiB of form overhead
    let body = vec![b'a'; 200 * 1024];
    let response = app(dir.path().into())
        .oneshot(
            Request::post("/api/login")
                .header(header::CONTENT_TYPE, "application/json")
                .header(header::CONTENT_LENGTH, body.len())
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn docs_are_served() {
    let dir = tempfile::tempdir().unwrap();
    let response = app(dir.path().into())
        .oneshot(Request::get("/docs").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn login_body_errors_use_the_envelope() {
    let dir = tempfile::tempdir().unwrap();
    let app = app(dir.path().into());

    let missing_password = app
        .clone()
        .oneshot(
            Request::post("/api/login")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"email":"ana@example.com"}"#))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(missing_password.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = json_body(missing_password).await;
    assert!(body["data"]["errors"]["body"].is_array());

    let malformed = app
        .oneshot(
            Request::post("/api/register")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{oops"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(malformed.status(), StatusCode::BAD_REQUEST);
    let body = json_body(malformed).await;
    assert!(body["data"]["error"].is_string());
}
