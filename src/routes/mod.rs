use axum::{
    Json, Router,
    extract::DefaultBodyLimit,
    http::{StatusCode, Uri},
    routing::get,
};
use tower_http::{limit::RequestBodyLimitLayer, services::ServeDir};

use crate::{
    response::{ApiResponse, Meta},
    state::AppState,
};

pub mod auth;
pub mod categories;
pub mod doc;
pub mod form;
pub mod health;
pub mod params;
pub mod products;

// Build the API router without binding state; it will be provided at the top level.
pub fn create_api_router() -> Router<AppState> {
    Router::new()
        .merge(auth::router())
        .nest("/products", products::router())
        .nest("/categories", categories::router())
}

/// Everything except the process-level layers (tracing, request ids,
/// concurrency), which `main` adds on top.
pub fn create_app(state: AppState) -> Router {
    let body_limit = state.config.max_body_bytes();
    let photos = ServeDir::new(state.storage.root());

    Router::new()
        .route("/health", get(health::health_check))
        .nest("/api", create_api_router())
        .nest_service("/storage", photos)
        .merge(doc::scalar_docs())
        .fallback(not_found)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(RequestBodyLimitLayer::new(body_limit))
        .with_state(state)
}

async fn not_found(uri: Uri) -> (StatusCode, Json<ApiResponse<serde_json::Value>>) {
    let body = ApiResponse {
        message: "Not Found".to_string(),
        data: Some(serde_json::json!({ "path": uri.path() })),
        meta: Some(Meta::empty()),
    };
    (StatusCode::NOT_FOUND, Json(body))
}
