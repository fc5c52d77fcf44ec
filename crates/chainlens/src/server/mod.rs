mod anchors;
mod error;
mod tx;

use std::sync::Arc;
use std::time::Duration;

use axum::http::Method;
use axum::routing::{any, get};
use axum::{Json, Router};
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;

use chainlens_core::ChainStateService;

// ==============================================================================
// Application State
// ==============================================================================

pub struct AppState {
    pub service: Arc<ChainStateService>,
}

type SharedState = Arc<AppState>;

// ==============================================================================
// Router
// ==============================================================================

/// Build the API router. A request still running after `request_timeout`
/// is answered with 408 and its handler future is dropped.
#[allow(deprecated)]
pub fn build_router(state: AppState, request_timeout: Duration) -> Router {
    // Read-only API: any origin may GET it.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers(Any);

    let shared = Arc::new(state);

    let api = Router::new()
        .route("/api/v1/health", get(health))
        .route("/api/{chain}/{network}/tx/{txid}", get(tx::get_transaction))
        .route(
            "/api/{chain}/{network}/block/anchors",
            get(anchors::get_anchored_blocks),
        )
        .route(
            "/api/{chain}/{network}/block/anchors/total",
            get(anchors::get_total_anchored_blocks),
        );

    Router::new()
        .merge(api)
        .route("/api", any(api_not_found))
        .route("/api/{*path}", any(api_not_found))
        .fallback(api_not_found)
        .layer(TimeoutLayer::new(request_timeout))
        .layer(cors)
        .with_state(shared)
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn api_not_found() -> error::AppError {
    error::AppError::NotFound("API route not found".to_string())
}
