/**
 * History Buffer
 *
 * Per-document ordered log of applied operations. The entry producing
 * revision `r + 1` is the operation that took the document from `r` to
 * `r + 1`. Entries below the base revision have been compacted away and
 * can no longer be used to transform late-arriving operations.
 */

use crate::shared::error::CollabError;
use crate::shared::ot::operation::{Operation, OperationId, Revision};
use std::collections::vec_deque::{self, VecDeque};

/// An operation as it was applied, with the revision it produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedOperation {
    /// Revision the document reached after applying `operation`
    pub revision: Revision,
    /// The fully transformed operation; its base revision is `revision - 1`
    pub operation: Operation,
}

impl AppliedOperation {
    pub fn new(revision: Revision, operation: Operation) -> Self {
        Self { revision, operation }
    }
}

/// Ordered log of applied operations since `base_revision`
#[derive(Debug, Clone, Default)]
pub struct HistoryBuffer {
    base_revision: Revision,
    entries: VecDeque<AppliedOperation>,
}

impl HistoryBuffer {
    /// Create an empty buffer starting at `base_revision`
    ///
    /// Sessions loaded from a snapshot start with the snapshot revision as
    /// base; nothing earlier is retained.
    pub fn new(base_revision: Revision) -> Self {
        Self {
            base_revision,
            entries: VecDeque::new(),
        }
    }

    /// Oldest revision that can still be passed to [`HistoryBuffer::since`]
    pub fn base_revision(&self) -> Revision {
        self.base_revision
    }

    /// Revision produced by the newest entry
    pub fn current_revision(&self) -> Revision {
        self.base_revision + self.entries.len() as Revision
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Operations applied after `revision`, oldest first
    ///
    /// # Errors
    ///
    /// - `RevisionTooOld` if `revision` has been compacted away
    /// - `MalformedOperation` if `revision` is ahead of the current revision
    pub fn since(&self, revision: Revision) -> Result<vec_deque::Iter<'_, AppliedOperation>, CollabError> {
        if revision < self.base_revision {
            return Err(CollabError::revision_too_old(revision, self.base_revision));
        }
        let current = self.current_revision();
        if revision > current {
            return Err(CollabError::malformed(format!(
                "revision {} is ahead of current revision {}",
                revision, current
            )));
        }
        let start = (revision - self.base_revision) as usize;
        Ok(self.entries.range(start..))
    }

    /// Append the next applied operation
    ///
    /// The entry must produce exactly `current_revision() + 1`.
    pub fn append(&mut self, applied: AppliedOperation) -> Result<(), CollabError> {
        let expected = self.current_revision() + 1;
        if applied.revision != expected {
            return Err(CollabError::unresolvable(format!(
                "history expected revision {} but got {}",
                expected, applied.revision
            )));
        }
        self.entries.push_back(applied);
        Ok(())
    }

    /// Drop entries so that `min_revision` becomes the new base
    ///
    /// `min_revision` is clamped to the current revision. Returns the number
    /// of entries removed.
    pub fn compact(&mut self, min_revision: Revision) -> usize {
        let target = min_revision.min(self.current_revision());
        if target <= self.base_revision {
            return 0;
        }
        let removed = (target - self.base_revision) as usize;
        self.entries.drain(..removed);
        self.base_revision = target;
        removed
    }

    /// Find a retained entry by operation id
    pub fn find(&self, id: OperationId) -> Option<&AppliedOperation> {
        self.entries.iter().find(|entry| entry.operation.id() == id)
    }

    pub fn iter(&self) -> vec_deque::Iter<'_, AppliedOperation> {
        self.entries.iter()
    }
}
