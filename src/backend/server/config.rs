/**
 * Server Configuration
 *
 * Selects the snapshot store from the loaded configuration.
 *
 * # Error Handling
 *
 * A store that fails to initialise is logged and replaced by the in-memory
 * store; the server keeps running without durable documents.
 */

use crate::backend::collab::store::{MemorySnapshotStore, SnapshotStore, SqliteSnapshotStore};
use crate::shared::AppConfig;
use std::sync::Arc;

/// Load the snapshot store
///
/// # Returns
///
/// - `SqliteSnapshotStore` if `database_url` is set and reachable
/// - `MemorySnapshotStore` otherwise
pub async fn load_store(config: &AppConfig) -> Arc<dyn SnapshotStore> {
    let Some(database_url) = config.database_url.as_deref() else {
        tracing::warn!("[Store] DATABASE_URL not set. Documents are kept in memory only.");
        return Arc::new(MemorySnapshotStore::new());
    };

    tracing::info!("[Store] Connecting to {}", database_url);
    match SqliteSnapshotStore::connect(database_url).await {
        Ok(store) => Arc::new(store),
        Err(e) => {
            tracing::error!("[Store] Failed to open snapshot database: {:?}", e);
            tracing::warn!("[Store] Falling back to in-memory documents.");
            Arc::new(MemorySnapshotStore::new())
        }
    }
}
