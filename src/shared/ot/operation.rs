/**
 * Operation Model
 *
 * This module defines the immutable description of a single edit submitted
 * by a participant: an insert or a delete at a code-point position, tagged
 * with its author, the revision it was composed against and a tie-break key.
 *
 * Operations are never mutated once built. The transformation engine and the
 * session coordinator always produce new values.
 */

use crate::shared::error::CollabError;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use uuid::Uuid;

/// Document revision number
///
/// Revision `r` is the state of a document after `r` applied operations.
pub type Revision = u64;

/// Unique operation identifier, used to detect resent operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OperationId(Uuid);

impl OperationId {
    /// Generate a fresh random identifier
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap an existing UUID
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for OperationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for OperationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// The closed set of edit kinds
///
/// There is no update-in-place: a client replacing a range sends a delete
/// followed by an insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationKind {
    /// Insert `text` at the operation's position
    Insert {
        /// Code points to insert
        text: String,
    },
    /// Remove `length` code points starting at the operation's position
    Delete {
        /// Number of code points to remove
        length: usize,
    },
}

impl OperationKind {
    /// Wire name of the kind (`"insert"` or `"delete"`)
    pub fn name(&self) -> &'static str {
        match self {
            Self::Insert { .. } => "insert",
            Self::Delete { .. } => "delete",
        }
    }
}

/// A single edit against a shared text document
///
/// Positions and lengths count Unicode code points, not bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operation {
    id: OperationId,
    author_id: String,
    base_revision: Revision,
    position: usize,
    kind: OperationKind,
    tie_break_key: String,
}

impl Operation {
    /// Create an insert operation
    ///
    /// The tie-break key defaults to the author id.
    ///
    /// # Example
    ///
    /// ```rust
    /// use hubcollab::shared::ot::Operation;
    ///
    /// let op = Operation::insert("alice", 0, 0, "hi");
    /// assert_eq!(op.apply_to("!").unwrap(), "hi!");
    /// ```
    pub fn insert(
        author_id: impl Into<String>,
        base_revision: Revision,
        position: usize,
        text: impl Into<String>,
    ) -> Self {
        Self::new(author_id, base_revision, position, OperationKind::Insert { text: text.into() })
    }

    /// Create a delete operation
    pub fn delete(
        author_id: impl Into<String>,
        base_revision: Revision,
        position: usize,
        length: usize,
    ) -> Self {
        Self::new(author_id, base_revision, position, OperationKind::Delete { length })
    }

    /// Create an operation of any kind with a fresh id
    pub fn new(
        author_id: impl Into<String>,
        base_revision: Revision,
        position: usize,
        kind: OperationKind,
    ) -> Self {
        let author_id = author_id.into();
        Self {
            id: OperationId::new(),
            tie_break_key: author_id.clone(),
            author_id,
            base_revision,
            position,
            kind,
        }
    }

    /// Return a copy carrying the given id
    pub fn with_id(mut self, id: OperationId) -> Self {
        self.id = id;
        self
    }

    /// Return a copy carrying the given tie-break key
    pub fn with_tie_break_key(mut self, key: impl Into<String>) -> Self {
        self.tie_break_key = key.into();
        self
    }

    pub fn id(&self) -> OperationId {
        self.id
    }

    pub fn author_id(&self) -> &str {
        &self.author_id
    }

    pub fn base_revision(&self) -> Revision {
        self.base_revision
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn kind(&self) -> &OperationKind {
        &self.kind
    }

    pub fn tie_break_key(&self) -> &str {
        &self.tie_break_key
    }

    /// Inserted text, `None` for deletes
    pub fn text(&self) -> Option<&str> {
        match &self.kind {
            OperationKind::Insert { text } => Some(text),
            OperationKind::Delete { .. } => None,
        }
    }

    /// Number of code points this operation inserts (0 for deletes)
    pub fn inserted_len(&self) -> usize {
        match &self.kind {
            OperationKind::Insert { text } => text.chars().count(),
            OperationKind::Delete { .. } => 0,
        }
    }

    /// Number of code points this operation removes (0 for inserts)
    pub fn deleted_len(&self) -> usize {
        match &self.kind {
            OperationKind::Insert { .. } => 0,
            OperationKind::Delete { length } => *length,
        }
    }

    /// Net change in document length once applied
    pub fn length_delta(&self) -> i64 {
        self.inserted_len() as i64 - self.deleted_len() as i64
    }

    /// True when applying the operation leaves the content unchanged
    pub fn is_noop(&self) -> bool {
        match &self.kind {
            OperationKind::Insert { text } => text.is_empty(),
            OperationKind::Delete { length } => *length == 0,
        }
    }

    /// Total order used to break ties between inserts at the same position
    ///
    /// Compares tie-break keys lexicographically, then operation ids.
    pub fn tie_break_cmp(&self, other: &Operation) -> Ordering {
        self.tie_break_key
            .cmp(&other.tie_break_key)
            .then_with(|| self.id.cmp(&other.id))
    }

    /// Build the transformed successor of this operation
    pub(crate) fn rebased(&self, position: usize, kind: OperationKind, base_revision: Revision) -> Self {
        Self {
            id: self.id,
            author_id: self.author_id.clone(),
            base_revision,
            position,
            kind,
            tie_break_key: self.tie_break_key.clone(),
        }
    }

    /// Check the operation against a document of `doc_len` code points
    pub fn validate(&self, doc_len: usize) -> Result<(), CollabError> {
        if self.position > doc_len {
            return Err(CollabError::malformed(format!(
                "position {} is beyond document length {}",
                self.position, doc_len
            )));
        }
        if let OperationKind::Delete { length } = self.kind {
            match self.position.checked_add(length) {
                Some(end) if end <= doc_len => {}
                _ => {
                    return Err(CollabError::malformed(format!(
                        "delete of {} at {} runs past document length {}",
                        length, self.position, doc_len
                    )));
                }
            }
        }
        Ok(())
    }

    /// Apply the operation to `content`, returning the new content
    ///
    /// Fails with `MalformedOperation` when the position or length falls
    /// outside the content; the input is never repaired.
    pub fn apply_to(&self, content: &str) -> Result<String, CollabError> {
        self.validate(content.chars().count())?;

        let start = byte_offset(content, self.position);
        match &self.kind {
            OperationKind::Insert { text } => {
                let mut result = String::with_capacity(content.len() + text.len());
                result.push_str(&content[..start]);
                result.push_str(text);
                result.push_str(&content[start..]);
                Ok(result)
            }
            OperationKind::Delete { length } => {
                let end = start + byte_offset(&content[start..], *length);
                let mut result = String::with_capacity(content.len() - (end - start));
                result.push_str(&content[..start]);
                result.push_str(&content[end..]);
                Ok(result)
            }
        }
    }
}

/// Byte offset of the `chars`-th code point, or the end of `content`
fn byte_offset(content: &str, chars: usize) -> usize {
    content
        .char_indices()
        .nth(chars)
        .map(|(idx, _)| idx)
        .unwrap_or(content.len())
}
