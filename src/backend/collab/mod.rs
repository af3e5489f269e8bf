//! Collaborative Editing Module
//!
//! Server-side wrapper around the OT core in `shared::ot`:
//! - a registry of open document sessions, one FIFO lock per document
//! - HTTP and SSE handlers for submitting and following operations
//! - snapshot stores that persist documents across restarts
//!
//! # Architecture
//!
//! - **`state`** - session registry (`CollabState`) and per-document handles
//! - **`handlers`** - axum handlers for `/collab/{doc_id}`
//! - **`store`** - `SnapshotStore` trait with memory and SQLite implementations
//!
//! # Example
//!
//! ```rust,no_run
//! use hubcollab::backend::collab::{CollabState, MemorySnapshotStore};
//! use hubcollab::shared::ot::Operation;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), hubcollab::backend::BackendError> {
//! let state = CollabState::new(Arc::new(MemorySnapshotStore::new()), 1024, 500);
//! let submission = state.submit("doc-123", &Operation::insert("alice", 0, 0, "hi")).await?;
//! assert_eq!(submission.applied().revision, 1);
//! # Ok(())
//! # }
//! ```

/// Session registry
pub mod state;

/// HTTP handlers for collaborative editing
pub mod handlers;

/// Snapshot persistence
pub mod store;

pub use handlers::{
    handle_collab_ack, handle_collab_leave, handle_collab_put, handle_collab_snapshot,
    handle_collab_subscription, handle_list_documents,
};
pub use state::{CollabState, JoinedSession, SessionHandle};
pub use store::{MemorySnapshotStore, SnapshotStore, SqliteSnapshotStore};
