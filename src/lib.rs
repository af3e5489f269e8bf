//! Hub Collab - Collaborative Note Editing Core
//!
//! Real-time collaborative editing for hub notes. Participants submit
//! concurrent insert/delete operations against a shared text document; a
//! per-document session orders them, transforms each one against the edits
//! its author had not yet seen (Operational Transformation), applies it and
//! broadcasts the result to everyone else editing the note.
//!
//! # Module Structure
//!
//! - **`shared`** - Platform-agnostic core
//!   - OT engine: operations, documents, transforms, history, sessions
//!   - Wire messages, broadcast events, errors, configuration
//!
//! - **`backend`** - Server-side code (only compiled with `ssr` feature)
//!   - Per-document session registry with serialized submission
//!   - Snapshot stores (in-memory and SQLite)
//!   - Axum HTTP transport: submit, SSE subscription, snapshot, ack
//!
//! # Feature Flags
//!
//! - **`ssr`** (default) - enables the `backend` module and the
//!   `hubcollab-server` binary
//!
//! # Concurrency
//!
//! Submissions for one document run strictly one at a time behind that
//! document's mutex; different documents never contend. Events are
//! broadcast while the mutex is held, so every participant observes
//! revisions in the order they were applied.
//!
//! # Error Handling
//!
//! - `shared::error::CollabError` for OT faults (malformed operation,
//!   revision too old, unresolvable transform)
//! - `backend::error::BackendError` for transport and persistence failures,
//!   convertible into HTTP responses

/// Shared types and the OT core
pub mod shared;

/// Backend server-side code
#[cfg(feature = "ssr")]
pub mod backend;
