/**
 * Document Session
 *
 * The single writer for one document. A session owns the `Document`, its
 * `HistoryBuffer` and the set of participants, and runs the submit pipeline:
 *
 * 1. Reject resent operations already in history (returns the original result)
 * 2. Fetch the operations missed since the submission's base revision
 * 3. Validate the submission against the document as it was at that revision
 * 4. Fold it through the missed operations
 * 5. Apply it, advance the revision and append it to history
 *
 * Steps 1-4 happen in [`DocumentSession::prepare`] and leave the session
 * untouched, so callers can persist the result before [`DocumentSession::commit`].
 * Callers are responsible for serializing access; the async wrapper in
 * `backend::collab` holds a mutex per document.
 */

use crate::shared::error::CollabError;
use crate::shared::ot::document::{Document, DocumentSnapshot};
use crate::shared::ot::history::{AppliedOperation, HistoryBuffer};
use crate::shared::ot::operation::{Operation, Revision};
use crate::shared::ot::transform::transform_against;
use std::collections::{HashMap, HashSet};

/// Identifies one connection of a participant
pub type ConnectionId = u64;

/// Result of a submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    /// Newly applied at a new revision
    Applied(AppliedOperation),
    /// Already applied earlier; the original result is returned
    Duplicate(AppliedOperation),
}

impl Submission {
    pub fn applied(&self) -> &AppliedOperation {
        match self {
            Self::Applied(applied) | Self::Duplicate(applied) => applied,
        }
    }

    pub fn into_applied(self) -> AppliedOperation {
        match self {
            Self::Applied(applied) | Self::Duplicate(applied) => applied,
        }
    }

    pub fn is_duplicate(&self) -> bool {
        matches!(self, Self::Duplicate(_))
    }
}

/// A transformed operation ready to be committed
#[derive(Debug, Clone)]
pub struct PendingCommit {
    applied: AppliedOperation,
    content: String,
}

impl PendingCommit {
    pub fn applied(&self) -> &AppliedOperation {
        &self.applied
    }

    /// Content the document will hold once committed
    pub fn content(&self) -> &str {
        &self.content
    }
}

/// Outcome of [`DocumentSession::prepare`]
#[derive(Debug, Clone)]
pub enum Prepared {
    Commit(PendingCommit),
    Duplicate(AppliedOperation),
}

#[derive(Debug, Clone)]
struct Participant {
    acked: Revision,
    connections: HashSet<ConnectionId>,
}

/// Per-document coordinator state
#[derive(Debug, Clone)]
pub struct DocumentSession {
    document: Document,
    history: HistoryBuffer,
    participants: HashMap<String, Participant>,
    next_connection: ConnectionId,
    history_retention: usize,
}

impl DocumentSession {
    /// Start a session from a snapshot
    ///
    /// `history_retention` is the number of most recent entries kept even
    /// when every participant has acknowledged past them.
    pub fn new(snapshot: DocumentSnapshot, history_retention: usize) -> Self {
        let history = HistoryBuffer::new(snapshot.revision);
        Self {
            document: Document::from_snapshot(snapshot),
            history,
            participants: HashMap::new(),
            next_connection: 0,
            history_retention,
        }
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn history(&self) -> &HistoryBuffer {
        &self.history
    }

    pub fn revision(&self) -> Revision {
        self.document.revision()
    }

    pub fn snapshot(&self) -> DocumentSnapshot {
        self.document.snapshot()
    }

    /// Transform `operation` against missed history without applying it
    pub fn prepare(&self, operation: &Operation) -> Result<Prepared, CollabError> {
        if let Some(existing) = self.history.find(operation.id()) {
            return Ok(Prepared::Duplicate(existing.clone()));
        }

        let missed = self.history.since(operation.base_revision())?;

        let delta: i64 = missed.clone().map(|e| e.operation.length_delta()).sum();
        let len_at_base = self.document.len() as i64 - delta;
        if len_at_base < 0 {
            return Err(CollabError::unresolvable(format!(
                "history implies negative length at revision {}",
                operation.base_revision()
            )));
        }
        operation.validate(len_at_base as usize)?;

        let transformed = transform_against(operation, missed)?;

        let current = self.document.revision();
        if transformed.base_revision() != current {
            return Err(CollabError::unresolvable(format!(
                "transformed operation is based on {} but document is at {}",
                transformed.base_revision(),
                current
            )));
        }
        let content = transformed.apply_to(self.document.content()).map_err(|err| {
            CollabError::unresolvable(format!("transformed operation no longer fits: {}", err))
        })?;

        Ok(Prepared::Commit(PendingCommit {
            applied: AppliedOperation::new(current + 1, transformed),
            content,
        }))
    }

    /// Apply a prepared operation
    ///
    /// Fails if the session moved on since `prepare`.
    pub fn commit(&mut self, pending: PendingCommit) -> Result<AppliedOperation, CollabError> {
        let expected = self.document.revision() + 1;
        if pending.applied.revision != expected {
            return Err(CollabError::unresolvable(format!(
                "stale commit for revision {}, session expects {}",
                pending.applied.revision, expected
            )));
        }
        self.history.append(pending.applied.clone())?;
        self.document.advance(pending.content);
        self.compact();
        Ok(pending.applied)
    }

    /// Prepare and commit in one step
    pub fn submit(&mut self, operation: &Operation) -> Result<Submission, CollabError> {
        match self.prepare(operation)? {
            Prepared::Duplicate(applied) => Ok(Submission::Duplicate(applied)),
            Prepared::Commit(pending) => self.commit(pending).map(Submission::Applied),
        }
    }

    /// Applied operations after `revision`, for replay to a reconnecting participant
    pub fn replay_since(&self, revision: Revision) -> Result<Vec<AppliedOperation>, CollabError> {
        Ok(self.history.since(revision)?.cloned().collect())
    }

    /// Register a connection of `author_id`, which has seen `revision`
    ///
    /// An author may hold several connections; it stays a participant until
    /// the last one disconnects or it leaves explicitly.
    pub fn join(&mut self, author_id: impl Into<String>, revision: Revision) -> ConnectionId {
        let revision = revision.min(self.revision());
        self.next_connection += 1;
        let connection = self.next_connection;

        let participant = self
            .participants
            .entry(author_id.into())
            .or_insert_with(|| Participant {
                acked: revision,
                connections: HashSet::new(),
            });
        participant.acked = participant.acked.min(revision);
        participant.connections.insert(connection);
        connection
    }

    /// Remove a participant with all its connections; returns whether it was registered
    pub fn leave(&mut self, author_id: &str) -> bool {
        let removed = self.participants.remove(author_id).is_some();
        if removed {
            self.compact();
        }
        removed
    }

    /// Drop one connection of `author_id`
    ///
    /// Returns `true` if that was its last connection and the participant
    /// was removed. Unknown connections are ignored, so a stale connection
    /// never removes a participant that has joined again since.
    pub fn disconnect(&mut self, author_id: &str, connection: ConnectionId) -> bool {
        let Some(participant) = self.participants.get_mut(author_id) else {
            return false;
        };
        if !participant.connections.remove(&connection) || !participant.connections.is_empty() {
            return false;
        }
        self.leave(author_id)
    }

    /// Record that a participant has applied everything up to `revision`
    pub fn acknowledge(&mut self, author_id: &str, revision: Revision) -> Result<(), CollabError> {
        if revision > self.revision() {
            return Err(CollabError::malformed(format!(
                "acknowledged revision {} is ahead of current revision {}",
                revision,
                self.revision()
            )));
        }
        let participant = self
            .participants
            .entry(author_id.to_string())
            .or_insert_with(|| Participant {
                acked: revision,
                connections: HashSet::new(),
            });
        participant.acked = participant.acked.max(revision);
        self.compact();
        Ok(())
    }

    pub fn participants(&self) -> impl Iterator<Item = (&str, Revision)> {
        self.participants
            .iter()
            .map(|(id, participant)| (id.as_str(), participant.acked))
    }

    /// Number of open connections of `author_id`
    pub fn connections(&self, author_id: &str) -> usize {
        self.participants
            .get(author_id)
            .map(|participant| participant.connections.len())
            .unwrap_or(0)
    }

    pub fn has_participants(&self) -> bool {
        !self.participants.is_empty()
    }

    /// Compact history below the oldest acknowledged revision
    ///
    /// The newest `history_retention` entries are always kept.
    pub fn compact(&mut self) -> usize {
        let current = self.revision();
        let floor = current.saturating_sub(self.history_retention as Revision);
        let removed = self.history.compact(floor.min(self.oldest_ack()));
        if removed > 0 {
            tracing::debug!(
                "[Collab] Compacted {} history entries of {}, base now {}",
                removed,
                self.document.id(),
                self.history.base_revision()
            );
        }
        removed
    }

    /// Release history covered by a snapshot persisted at `min_revision`
    ///
    /// Entries a participant has not acknowledged yet are kept. The retention
    /// floor does not apply: readers that fall behind the snapshot resync
    /// from it.
    pub fn compact_to(&mut self, min_revision: Revision) -> usize {
        let removed = self.history.compact(min_revision.min(self.oldest_ack()));
        if removed > 0 {
            tracing::debug!(
                "[Collab] Released {} history entries of {} behind snapshot {}, base now {}",
                removed,
                self.document.id(),
                min_revision,
                self.history.base_revision()
            );
        }
        removed
    }

    fn oldest_ack(&self) -> Revision {
        self.participants
            .values()
            .map(|participant| participant.acked)
            .min()
            .unwrap_or_else(|| self.revision())
    }
}
