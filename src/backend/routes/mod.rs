//! Route Configuration Module
//!
//! Configures all HTTP routes of the server.
//!
//! # Route Types
//!
//! ## Collaboration Routes
//!
//! - `GET /collab` - open documents
//! - `GET /collab/{doc_id}` - SSE subscription (`author`, optional `since`)
//! - `PUT /collab/{doc_id}` - submit an operation
//! - `GET /collab/{doc_id}/snapshot` - current content and revision
//! - `POST /collab/{doc_id}/ack` - acknowledge a revision
//! - `DELETE /collab/{doc_id}/participants/{author}` - leave
//!
//! ## Health
//!
//! - `GET /health` - liveness check
//!
//! Unknown routes fall back to a 404.

/// Main router creation
pub mod router;

pub use router::create_router;
