//! Session registry and router fixtures

use axum::body::Body;
use axum::http::{Method, Request};
use axum::Router;
use hubcollab::backend::collab::{CollabState, MemorySnapshotStore};
use hubcollab::backend::routes::create_router;
use hubcollab::backend::server::AppState;
use hubcollab::shared::ot::Operation;
use hubcollab::shared::{AppConfig, OperationMessage};
use std::sync::Arc;

/// Registry over a fresh in-memory store
pub fn memory_state(history_retention: usize) -> CollabState {
    CollabState::new(Arc::new(MemorySnapshotStore::new()), 256, history_retention)
}

/// Router over `collab` with default configuration
pub fn test_router(collab: CollabState) -> Router {
    create_router(AppState::new(collab, AppConfig::default()))
}

/// JSON request for `uri`
pub fn json_request(method: Method, uri: &str, body: &serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .expect("valid request")
}

/// Wire form of an operation
pub fn operation_json(document_id: &str, operation: &Operation) -> serde_json::Value {
    serde_json::to_value(OperationMessage::from_operation(document_id, operation))
        .expect("operation serializes")
}

/// Read a whole response body as JSON
pub async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body readable");
    serde_json::from_slice(&bytes).expect("body is JSON")
}
