/**
 * Application State Management
 *
 * This module defines the application state structure and implements
 * the necessary `FromRef` traits for Axum state extraction.
 *
 * # Architecture
 *
 * The `AppState` struct serves as the central state container, holding:
 * - The collaborative editing session registry
 * - The loaded configuration
 *
 * Both are cheap to clone: the registry shares its map and store behind
 * `Arc`, and the configuration is wrapped in one.
 *
 * # Example
 *
 * ```rust,no_run
 * use hubcollab::backend::collab::CollabState;
 * use axum::extract::State;
 *
 * async fn handler(State(collab): State<CollabState>) -> String {
 *     collab.list_documents().await.join(",")
 * }
 * ```
 */

use crate::backend::collab::CollabState;
use crate::shared::AppConfig;
use axum::extract::FromRef;
use std::sync::Arc;

/// Shared state of all request handlers
#[derive(Clone)]
pub struct AppState {
    /// Open document sessions
    pub collab: CollabState,
    /// Loaded configuration
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(collab: CollabState, config: AppConfig) -> Self {
        Self {
            collab,
            config: Arc::new(config),
        }
    }
}

impl FromRef<AppState> for CollabState {
    fn from_ref(state: &AppState) -> Self {
        state.collab.clone()
    }
}

impl FromRef<AppState> for Arc<AppConfig> {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}
