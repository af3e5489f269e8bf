//! Real-time Update Module
//!
//! Per-document event broadcasting and Server-Sent Events encoding.
//!
//! # Module Structure
//!
//! ```text
//! realtime/
//! ├── mod.rs          - Module exports and documentation
//! ├── broadcast.rs    - Document broadcast channels
//! └── subscription.rs - SSE frame encoding and responses
//! ```
//!
//! # Event Types
//!
//! - `operation` - an applied, transformed operation
//! - `snapshot` - full document state (join or resync)
//! - `joined` / `left` - participant presence

/// Event broadcasting utilities
pub mod broadcast;

/// Server-Sent Events encoding
pub mod subscription;

// Re-export commonly used types and functions
pub use broadcast::{broadcast_event, CollabBroadcast};
pub use subscription::{sse_response, to_sse_event};
