//! Shared Module
//!
//! This module contains the collaborative editing core and the types that
//! are exchanged with the transport. Nothing here depends on the `ssr`
//! feature, so the OT engine can be embedded and tested on its own.
//!
//! # Overview
//!
//! - **`ot`** - operation/document models, transformation engine, history
//!   buffer and the per-document session
//! - **`message`** - JSON wire shapes for inbound and applied operations
//! - **`event`** - events broadcast to document participants
//! - **`error`** - `CollabError`, the faults of the OT core
//! - **`config`** - layered application configuration

/// Operational transformation core
pub mod ot;

/// Wire message shapes
pub mod message;

/// Collaboration events
pub mod event;

/// Shared error types
pub mod error;

/// Application configuration
pub mod config;

/// Re-export commonly used types for convenience
pub use config::{AppConfig, AppConfigBuilder, ConfigError};
pub use error::CollabError;
pub use event::{CollabEvent, EventType};
pub use message::{AckMessage, AppliedMessage, OperationMessage};
