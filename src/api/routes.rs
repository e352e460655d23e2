use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use super::handlers::{configure, health, not_found, AppState};
use super::middleware::logging_middleware;

pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health))
        // Service configuration
        .route("/configure", post(configure))
        // Anything else: classified as a handler-not-found failure
        .fallback(not_found)
        .layer(middleware::from_fn(logging_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
