/**
 * Collaboration Events
 *
 * Events emitted by a document session and delivered to subscribed
 * participants: applied operations, snapshots (initial state or resync)
 * and participant presence changes.
 */
use crate::shared::message::AppliedMessage;
use crate::shared::ot::{AppliedOperation, DocumentSnapshot, Revision};
use serde::{Deserialize, Serialize};

/// Type of collaboration event
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    /// An operation was applied
    Operation,
    /// Full document state; sent on join and when history cannot be replayed
    Snapshot,
    /// A participant joined the document
    Joined,
    /// A participant left the document
    Left,
}

impl EventType {
    /// SSE event name
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Operation => "operation",
            Self::Snapshot => "snapshot",
            Self::Joined => "joined",
            Self::Left => "left",
        }
    }
}

/// Event broadcast to the participants of one document
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CollabEvent {
    /// Type of event
    pub event_type: EventType,
    /// Document this event belongs to
    pub document_id: String,
    /// Participant that caused the event
    pub author_id: String,
    /// Document revision after the event
    pub revision: Revision,
    /// Event payload (JSON-serializable data)
    pub payload: serde_json::Value,
    /// Timestamp when event occurred
    pub timestamp: String,
}

impl CollabEvent {
    /// Create a new event
    pub fn new(
        event_type: EventType,
        document_id: impl Into<String>,
        author_id: impl Into<String>,
        revision: Revision,
        payload: serde_json::Value,
    ) -> Self {
        Self {
            event_type,
            document_id: document_id.into(),
            author_id: author_id.into(),
            revision,
            payload,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Create an operation event carrying the applied message
    pub fn operation(document_id: &str, applied: &AppliedOperation) -> Self {
        let message = AppliedMessage::from_applied(document_id, applied);
        let payload = serde_json::to_value(&message).unwrap_or(serde_json::Value::Null);
        Self::new(
            EventType::Operation,
            document_id,
            applied.operation.author_id(),
            applied.revision,
            payload,
        )
    }

    /// Create a snapshot event addressed to `author_id`
    pub fn snapshot(author_id: &str, snapshot: &DocumentSnapshot) -> Self {
        let payload = serde_json::to_value(snapshot).unwrap_or(serde_json::Value::Null);
        Self::new(
            EventType::Snapshot,
            snapshot.document_id.as_str(),
            author_id,
            snapshot.revision,
            payload,
        )
    }

    /// Create a joined event
    pub fn joined(document_id: &str, author_id: &str, revision: Revision) -> Self {
        Self::new(
            EventType::Joined,
            document_id,
            author_id,
            revision,
            serde_json::json!({ "authorId": author_id }),
        )
    }

    /// Create a left event
    pub fn left(document_id: &str, author_id: &str, revision: Revision) -> Self {
        Self::new(
            EventType::Left,
            document_id,
            author_id,
            revision,
            serde_json::json!({ "authorId": author_id }),
        )
    }

    /// Decode the applied operation of an operation event
    pub fn applied_message(&self) -> Option<AppliedMessage> {
        match self.event_type {
            EventType::Operation => serde_json::from_value(self.payload.clone()).ok(),
            _ => None,
        }
    }
}
