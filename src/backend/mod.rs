//! Backend Module
//!
//! Server-side code for Hub Collab: an Axum HTTP server wrapping the OT
//! core with per-document sessions, persistence and real-time delivery.
//!
//! This module is only compiled when the `ssr` feature is enabled.
//!
//! # Architecture
//!
//! - **`server`** - Server initialization, application state, store selection
//! - **`routes`** - HTTP route configuration and router assembly
//! - **`collab`** - Session registry, handlers and snapshot stores
//! - **`realtime`** - Per-document broadcast and SSE encoding
//! - **`error`** - Backend-specific error types
//!
//! # Module Structure
//!
//! ```text
//! backend/
//! ├── mod.rs          - Module exports and documentation
//! ├── server/         - Server initialization and state
//! ├── routes/         - Route configuration
//! ├── collab/         - Collaborative editing
//! ├── realtime/       - Event broadcasting
//! └── error/          - Error types
//! ```
//!
//! # Thread Safety
//!
//! - `Arc<RwLock<HashMap<..>>>` for the session registry
//! - one `tokio::sync::Mutex` per document session, held across persistence
//!   and broadcast of each applied operation
//! - `broadcast::Sender` per document for subscriber fan-out

/// Server setup and configuration
pub mod server;

/// Route configuration
pub mod routes;

/// Real-time update system
pub mod realtime;

/// Backend error types
pub mod error;

/// Collaborative editing sessions
pub mod collab;

pub use collab::state::CollabState;
pub use error::BackendError;
pub use realtime::{broadcast_event, CollabBroadcast};
pub use server::create_app;
