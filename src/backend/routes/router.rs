/**
 * Router Configuration
 *
 * This module provides the main router creation function that combines
 * all route configurations into a single Axum router.
 *
 * # Route Order
 *
 * 1. Health check
 * 2. Collaboration routes
 * 3. Fallback handler (404)
 *
 * Every request is traced through `tower_http::trace::TraceLayer`.
 */

use crate::backend::collab::handlers::{
    handle_collab_ack, handle_collab_leave, handle_collab_put, handle_collab_snapshot,
    handle_collab_subscription, handle_list_documents,
};
use crate::backend::server::state::AppState;
use axum::{
    http::StatusCode,
    routing::{delete, get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

/// Create the Axum router with all routes configured
///
/// # Arguments
///
/// * `app_state` - Application state containing the session registry
///
/// # Returns
///
/// Configured Axum Router ready to serve requests
pub fn create_router(app_state: AppState) -> Router<()> {
    let router = Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/collab", get(handle_list_documents))
        .route(
            "/collab/{doc_id}",
            get(handle_collab_subscription).put(handle_collab_put),
        )
        .route("/collab/{doc_id}/snapshot", get(handle_collab_snapshot))
        .route("/collab/{doc_id}/ack", post(handle_collab_ack))
        .route(
            "/collab/{doc_id}/participants/{author}",
            delete(handle_collab_leave),
        );

    // Fallback handler for 404
    let router = router.fallback(|| async { (StatusCode::NOT_FOUND, "404 Not Found") });

    router
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
        .with_state(app_state)
}
