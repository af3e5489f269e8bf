/**
 * Document Model
 *
 * Holds a document's current text and revision. Only the session
 * coordinator mutates a `Document`; transformation functions work on
 * `Operation` values and never see it.
 */

use crate::shared::error::CollabError;
use crate::shared::ot::history::AppliedOperation;
use crate::shared::ot::operation::Revision;
use serde::{Deserialize, Serialize};

/// Persisted `(content, revision)` pair for a document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentSnapshot {
    pub document_id: String,
    pub content: String,
    pub revision: Revision,
}

impl DocumentSnapshot {
    /// Empty document at revision 0
    pub fn empty(document_id: impl Into<String>) -> Self {
        Self {
            document_id: document_id.into(),
            content: String::new(),
            revision: 0,
        }
    }

    /// Roll the snapshot forward through recorded operations
    ///
    /// Entries at or below the snapshot revision are skipped; the rest must
    /// be contiguous.
    pub fn replay<'a, I>(mut self, operations: I) -> Result<Self, CollabError>
    where
        I: IntoIterator<Item = &'a AppliedOperation>,
    {
        for applied in operations {
            if applied.revision <= self.revision {
                continue;
            }
            if applied.revision != self.revision + 1 {
                return Err(CollabError::validation(
                    "revision",
                    format!(
                        "recorded operations jump from {} to {}",
                        self.revision, applied.revision
                    ),
                ));
            }
            self.content = applied.operation.apply_to(&self.content)?;
            self.revision = applied.revision;
        }
        Ok(self)
    }
}

/// Live document state owned by a session
#[derive(Debug, Clone)]
pub struct Document {
    id: String,
    content: String,
    char_len: usize,
    revision: Revision,
}

impl Document {
    pub fn new(id: impl Into<String>) -> Self {
        Self::from_snapshot(DocumentSnapshot::empty(id))
    }

    pub fn from_snapshot(snapshot: DocumentSnapshot) -> Self {
        Self {
            char_len: snapshot.content.chars().count(),
            id: snapshot.document_id,
            content: snapshot.content,
            revision: snapshot.revision,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn revision(&self) -> Revision {
        self.revision
    }

    /// Length in code points
    pub fn len(&self) -> usize {
        self.char_len
    }

    pub fn is_empty(&self) -> bool {
        self.char_len == 0
    }

    pub fn snapshot(&self) -> DocumentSnapshot {
        DocumentSnapshot {
            document_id: self.id.clone(),
            content: self.content.clone(),
            revision: self.revision,
        }
    }

    /// Replace the content and advance the revision by exactly one
    pub(crate) fn advance(&mut self, content: String) -> Revision {
        self.char_len = content.chars().count();
        self.content = content;
        self.revision += 1;
        self.revision
    }
}
