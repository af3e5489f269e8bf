/**
 * Server Initialization
 *
 * This module builds the application: snapshot store, session registry,
 * background idle sweep and router.
 *
 * # Initialization Process
 *
 * 1. Load the snapshot store (SQLite if configured, memory otherwise)
 * 2. Create the session registry
 * 3. Start the idle session sweep
 * 4. Create the router
 */

use crate::backend::collab::CollabState;
use crate::backend::routes::router::create_router;
use crate::backend::server::config::load_store;
use crate::backend::server::state::AppState;
use crate::shared::AppConfig;
use axum::Router;
use std::time::Duration;

/// Create and configure the Axum application
///
/// Must be called inside a tokio runtime; the idle sweep is spawned onto it.
pub async fn create_app(config: AppConfig) -> Router<()> {
    tracing::info!("Initializing Hub Collab server");

    let store = load_store(&config).await;
    let collab = CollabState::from_config(&config, store);
    spawn_idle_sweep(collab.clone(), config.idle_sweep_secs);

    let app_state = AppState::new(collab, config);
    create_router(app_state)
}

/// Periodically flush and close sessions nobody is using
///
/// A period of 0 disables the sweep.
pub fn spawn_idle_sweep(collab: CollabState, period_secs: u64) {
    if period_secs == 0 {
        tracing::info!("[Collab] Idle session sweep disabled");
        return;
    }

    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(period_secs));
        // first tick completes immediately
        interval.tick().await;
        loop {
            interval.tick().await;
            let closed = collab.close_idle().await;
            tracing::debug!("[Collab] Idle sweep closed {} sessions", closed);
        }
    });
}
