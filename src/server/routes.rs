//! Router configuration for the analytics API.

use axum::{routing::get, Router};
use tower_http::cors::CorsLayer;

use super::handlers;
use super::AppState;

/// Create the main router with all routes.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/api/reports/top-products", get(handlers::top_products))
        .route(
            "/api/channels/:channel_name/activity",
            get(handlers::channel_activity),
        )
        .route("/api/reports/visual-content", get(handlers::visual_content))
        .route("/api/search/messages", get(handlers::search_messages))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
