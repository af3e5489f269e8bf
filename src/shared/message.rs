/**
 * Wire Messages
 *
 * This module defines the JSON shapes exchanged with the transport
 * collaborator: the inbound operation a participant submits and the outbound
 * applied operation broadcast to the other participants of a document.
 *
 * Decoding is deliberately loose (`kind` is a string, numbers are signed) so
 * that an unknown kind or a negative position, length or base revision
 * surfaces as `MalformedOperation` instead of a generic JSON error.
 *
 * # Inbound shape
 *
 * ```json
 * {
 *   "id": "0b8f...", "documentId": "note-42", "authorId": "alice",
 *   "kind": "insert", "baseRevision": 3, "position": 7,
 *   "text": "hi", "tieBreakKey": "alice"
 * }
 * ```
 *
 * Outbound messages carry the same fields plus the `revision` produced.
 */
use crate::shared::error::CollabError;
use crate::shared::ot::{AppliedOperation, Operation, OperationId, OperationKind, Revision};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An operation as it travels over the wire
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct OperationMessage {
    /// Unique operation id, reused on resend
    pub id: Uuid,
    /// Target document
    pub document_id: String,
    /// Submitting participant
    pub author_id: String,
    /// `"insert"` or `"delete"`
    pub kind: String,
    /// Revision the author believed current
    pub base_revision: i64,
    /// Zero-based code-point offset at `base_revision`
    pub position: i64,
    /// Inserted text (insert only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Number of code points to remove (delete only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length: Option<i64>,
    /// Tie-break key; defaults to `author_id` when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tie_break_key: Option<String>,
}

/// An applied operation broadcast to participants
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AppliedMessage {
    #[serde(flatten)]
    pub operation: OperationMessage,
    /// Revision this operation produced
    pub revision: Revision,
}

/// Acknowledgement of everything up to `revision`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AckMessage {
    pub author_id: String,
    pub revision: Revision,
}

impl OperationMessage {
    /// Encode an operation for `document_id`
    pub fn from_operation(document_id: impl Into<String>, operation: &Operation) -> Self {
        let (text, length) = match operation.kind() {
            OperationKind::Insert { text } => (Some(text.clone()), None),
            OperationKind::Delete { length } => (None, Some(*length as i64)),
        };
        Self {
            id: *operation.id().as_uuid(),
            document_id: document_id.into(),
            author_id: operation.author_id().to_string(),
            kind: operation.kind().name().to_string(),
            base_revision: operation.base_revision() as i64,
            position: operation.position() as i64,
            text,
            length,
            tie_break_key: Some(operation.tie_break_key().to_string()),
        }
    }

    /// Decode into an `Operation`
    ///
    /// # Errors
    ///
    /// `MalformedOperation` for an unknown kind, a negative position, length
    /// or base revision, or a missing `text`/`length` for the given kind.
    pub fn to_operation(&self) -> Result<Operation, CollabError> {
        let base_revision = non_negative("baseRevision", self.base_revision)? as Revision;
        let position = non_negative("position", self.position)?;
        let kind = match self.kind.as_str() {
            "insert" => {
                let text = self
                    .text
                    .clone()
                    .ok_or_else(|| CollabError::malformed("insert without text"))?;
                OperationKind::Insert { text }
            }
            "delete" => {
                let length = self
                    .length
                    .ok_or_else(|| CollabError::malformed("delete without length"))?;
                OperationKind::Delete {
                    length: non_negative("length", length)?,
                }
            }
            other => {
                return Err(CollabError::malformed(format!("unknown kind '{}'", other)));
            }
        };

        let operation = Operation::new(self.author_id.clone(), base_revision, position, kind)
            .with_id(OperationId::from_uuid(self.id));
        Ok(match &self.tie_break_key {
            Some(key) => operation.with_tie_break_key(key.clone()),
            None => operation,
        })
    }
}

impl AppliedMessage {
    pub fn from_applied(document_id: impl Into<String>, applied: &AppliedOperation) -> Self {
        Self {
            operation: OperationMessage::from_operation(document_id, &applied.operation),
            revision: applied.revision,
        }
    }

    pub fn to_applied(&self) -> Result<AppliedOperation, CollabError> {
        Ok(AppliedOperation::new(self.revision, self.operation.to_operation()?))
    }
}

fn non_negative(field: &str, value: i64) -> Result<usize, CollabError> {
    usize::try_from(value)
        .map_err(|_| CollabError::malformed(format!("{} must be non-negative, got {}", field, value)))
}
