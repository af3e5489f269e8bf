//! Collaboration Error Types
//!
//! This module defines the faults raised by the OT core and by decoding the
//! wire messages that feed it. They are resolved at the session coordinator
//! boundary: the transformation engine and history buffer never swallow them.
//!
//! # Error Categories
//!
//! - `MalformedOperation` - position/length out of bounds, unknown kind
//! - `RevisionTooOld` - base revision compacted out of history
//! - `TransformConflictUnresolvable` - no transform rule applies (a programming fault)
//! - `SerializationError` - JSON decoding failures
//! - `ValidationError` - inconsistent input outside an operation
//!
//! # Usage
//!
//! ```rust
//! use hubcollab::shared::error::CollabError;
//!
//! let error = CollabError::revision_too_old(3, 10);
//! assert!(error.needs_resync());
//! assert_eq!(error.kind(), "revision_too_old");
//! ```
use crate::shared::ot::Revision;
use thiserror::Error;

/// Faults raised while decoding, transforming or applying operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CollabError {
    /// Position or length outside the document, or an unknown kind
    #[error("Malformed operation: {reason}")]
    MalformedOperation {
        /// Human-readable reason
        reason: String,
    },

    /// Base revision has been compacted out of history
    #[error("Revision {requested} is older than the oldest retained revision {oldest}")]
    RevisionTooOld {
        /// Revision the submission was based on
        requested: Revision,
        /// Oldest revision still in history
        oldest: Revision,
    },

    /// No transform rule applies, or the engine produced an inapplicable result
    #[error("Unresolvable transform conflict: {message}")]
    TransformConflictUnresolvable {
        /// Human-readable error message
        message: String,
    },

    /// JSON serialization or deserialization error
    #[error("Serialization error: {message}")]
    SerializationError {
        /// Human-readable error message
        message: String,
    },

    /// Data validation error
    #[error("Validation error in field '{field}': {message}")]
    ValidationError {
        /// The field that failed validation
        field: String,
        /// Human-readable error message
        message: String,
    },
}

impl CollabError {
    /// Create a new malformed operation error
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedOperation {
            reason: reason.into(),
        }
    }

    /// Create a new revision-too-old error
    pub fn revision_too_old(requested: Revision, oldest: Revision) -> Self {
        Self::RevisionTooOld { requested, oldest }
    }

    /// Create a new unresolvable transform error
    pub fn unresolvable(message: impl Into<String>) -> Self {
        Self::TransformConflictUnresolvable {
            message: message.into(),
        }
    }

    /// Create a new serialization error
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::SerializationError {
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ValidationError {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Stable machine-readable name, sent to rejected participants
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MalformedOperation { .. } => "malformed_operation",
            Self::RevisionTooOld { .. } => "revision_too_old",
            Self::TransformConflictUnresolvable { .. } => "transform_conflict_unresolvable",
            Self::SerializationError { .. } => "serialization_error",
            Self::ValidationError { .. } => "validation_error",
        }
    }

    /// Whether the sender should fetch a fresh snapshot before resubmitting
    pub fn needs_resync(&self) -> bool {
        matches!(
            self,
            Self::MalformedOperation { .. } | Self::RevisionTooOld { .. }
        )
    }
}

/// Helper trait for converting serialization errors
impl From<serde_json::Error> for CollabError {
    fn from(err: serde_json::Error) -> Self {
        Self::serialization(format!("JSON error: {}", err))
    }
}
