/**
 * Backend Error Types
 *
 * This module defines error types specific to the backend server.
 * These errors are used by the session registry, snapshot stores and HTTP
 * handlers, and can be converted to HTTP responses.
 *
 * # Error Categories
 *
 * ## Handler Errors
 *
 * Request-level problems: undecodable bodies, mismatched document ids.
 *
 * ## State Errors
 *
 * Session registry problems, e.g. a document session closed underneath a
 * request.
 *
 * ## Persistence Errors
 *
 * Failures of the snapshot store (SQLite).
 *
 * ## Collaboration Errors
 *
 * OT faults from the core, mapped to:
 * - `MalformedOperation` - 422 Unprocessable Entity
 * - `RevisionTooOld` - 409 Conflict
 * - `TransformConflictUnresolvable` - 500 Internal Server Error
 */

use thiserror::Error;
use axum::http::StatusCode;
use crate::shared::CollabError;

/// Backend-specific error types
///
/// # Usage
///
/// ```rust
/// use hubcollab::backend::error::BackendError;
/// use axum::http::StatusCode;
///
/// let err = BackendError::handler(StatusCode::BAD_REQUEST, "Invalid request");
/// assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
/// ```
#[derive(Debug, Error)]
pub enum BackendError {
    /// Handler error (e.g., invalid request body)
    #[error("Handler error: {message}")]
    HandlerError {
        /// HTTP status code for this error
        status: StatusCode,
        /// Human-readable error message
        message: String,
    },

    /// Session registry error
    #[error("State error: {message}")]
    StateError {
        /// Human-readable error message
        message: String,
    },

    /// Snapshot store failure
    #[error("Persistence error: {message}")]
    PersistenceError {
        /// Human-readable error message
        message: String,
    },

    /// Fault raised by the OT core
    #[error(transparent)]
    Collab(#[from] CollabError),

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

impl BackendError {
    /// Create a new handler error with a status code
    pub fn handler(status: StatusCode, message: impl Into<String>) -> Self {
        Self::HandlerError {
            status,
            message: message.into(),
        }
    }

    /// Create a new state error
    pub fn state(message: impl Into<String>) -> Self {
        Self::StateError {
            message: message.into(),
        }
    }

    /// Create a new persistence error
    pub fn persistence(message: impl Into<String>) -> Self {
        Self::PersistenceError {
            message: message.into(),
        }
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::HandlerError { status, .. } => *status,
            Self::StateError { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Self::PersistenceError { .. } => StatusCode::SERVICE_UNAVAILABLE,
            Self::Collab(err) => match err {
                CollabError::MalformedOperation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
                CollabError::RevisionTooOld { .. } => StatusCode::CONFLICT,
                CollabError::TransformConflictUnresolvable { .. } => StatusCode::INTERNAL_SERVER_ERROR,
                CollabError::SerializationError { .. } => StatusCode::BAD_REQUEST,
                CollabError::ValidationError { .. } => StatusCode::BAD_REQUEST,
            },
            Self::SerializationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Machine-readable error kind
    pub fn kind(&self) -> &'static str {
        match self {
            Self::HandlerError { .. } => "handler_error",
            Self::StateError { .. } => "state_error",
            Self::PersistenceError { .. } => "persistence_error",
            Self::Collab(err) => err.kind(),
            Self::SerializationError(_) => "serialization_error",
        }
    }

    /// Get the error message
    pub fn message(&self) -> String {
        match self {
            Self::HandlerError { message, .. } => message.clone(),
            Self::StateError { message } => message.clone(),
            Self::PersistenceError { message } => message.clone(),
            Self::Collab(err) => err.to_string(),
            Self::SerializationError(err) => err.to_string(),
        }
    }

    /// Whether the client should resynchronize before resubmitting
    pub fn needs_resync(&self) -> bool {
        matches!(self, Self::Collab(err) if err.needs_resync())
    }
}

impl From<sqlx::Error> for BackendError {
    fn from(err: sqlx::Error) -> Self {
        Self::persistence(err.to_string())
    }
}
