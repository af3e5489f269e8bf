/**
 * Collaborative Editing State Management
 *
 * Maps document ids to live document sessions. Each session handle owns the
 * OT state of one document behind a `tokio::sync::Mutex` (FIFO, so submits
 * are applied in arrival order), a broadcast channel for its events, and a
 * reference to the snapshot store.
 *
 * Persistence of an applied operation is awaited while the session lock is
 * held, and the resulting event is broadcast before the lock is released.
 * Subscribers therefore observe revisions in order, and a store failure
 * leaves the session untouched.
 *
 * Every `snapshot_interval` revisions the session checkpoints: it saves a
 * snapshot, which lets the store discard the operations it covers, and
 * releases the in-memory history behind it that no participant still needs.
 */

use crate::backend::collab::store::SnapshotStore;
use crate::backend::error::BackendError;
use crate::backend::realtime::broadcast::{self, broadcast_event, CollabBroadcast};
use crate::shared::ot::{
    ConnectionId, DocumentSession, DocumentSnapshot, Operation, Prepared, Revision, Submission,
};
use crate::shared::{AppConfig, CollabError, CollabEvent};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{broadcast::Receiver, Mutex, RwLock};

/// Result of joining a document
pub struct JoinedSession {
    /// Live events, subscribed before the replay was taken
    pub receiver: Receiver<CollabEvent>,
    /// Events the participant must apply first: missed operations, or a
    /// snapshot if it is new or too far behind
    pub replay: Vec<CollabEvent>,
    /// Revision the participant is at once `replay` is applied
    pub revision: Revision,
    /// Token to pass to [`SessionHandle::disconnect`] when the connection ends
    pub connection: ConnectionId,
}

/// One open document
pub struct SessionHandle {
    document_id: String,
    session: Mutex<DocumentSession>,
    events: CollabBroadcast,
    store: Arc<dyn SnapshotStore>,
    snapshot_interval: u64,
}

impl SessionHandle {
    fn new(
        snapshot: DocumentSnapshot,
        history_retention: usize,
        broadcast_capacity: usize,
        snapshot_interval: u64,
        store: Arc<dyn SnapshotStore>,
    ) -> Self {
        Self {
            document_id: snapshot.document_id.clone(),
            session: Mutex::new(DocumentSession::new(snapshot, history_retention)),
            events: broadcast::channel(broadcast_capacity),
            store,
            snapshot_interval,
        }
    }

    pub fn document_id(&self) -> &str {
        &self.document_id
    }

    /// Subscribe to live events without registering as a participant
    pub fn subscribe(&self) -> Receiver<CollabEvent> {
        self.events.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.events.receiver_count()
    }

    /// Validate, transform, persist, apply and broadcast one operation
    pub async fn submit(&self, operation: &Operation) -> Result<Submission, BackendError> {
        let mut session = self.session.lock().await;

        let pending = match session.prepare(operation)? {
            Prepared::Duplicate(applied) => {
                tracing::debug!(
                    "[Collab] Duplicate operation {} on {}, returning revision {}",
                    operation.id(),
                    self.document_id,
                    applied.revision
                );
                return Ok(Submission::Duplicate(applied));
            }
            Prepared::Commit(pending) => pending,
        };

        self.store.record(&self.document_id, pending.applied()).await?;
        let applied = session.commit(pending)?;

        tracing::info!(
            "[Collab] Applied {} by {} to {} at revision {}",
            applied.operation.kind().name(),
            applied.operation.author_id(),
            self.document_id,
            applied.revision
        );
        broadcast_event(&self.events, CollabEvent::operation(&self.document_id, &applied)).await;

        if self.snapshot_interval > 0 && applied.revision % self.snapshot_interval == 0 {
            // the operation is already recorded, so a failed checkpoint only delays pruning
            if let Err(err) = self.checkpoint(&mut session).await {
                tracing::warn!(
                    "[Collab] Checkpoint of {} at revision {} failed: {}",
                    self.document_id,
                    applied.revision,
                    err
                );
            }
        }
        Ok(Submission::Applied(applied))
    }

    /// Register `author_id` and compute what it must replay
    ///
    /// With `since`, the participant receives the operations applied after
    /// that revision. Without it, or when that history has been compacted
    /// away, it receives a snapshot of the current document.
    pub async fn join(&self, author_id: &str, since: Option<Revision>) -> Result<JoinedSession, BackendError> {
        let receiver = self.events.subscribe();
        let mut session = self.session.lock().await;
        let revision = session.revision();

        let (replay, acked) = match since {
            Some(since) => match session.replay_since(since) {
                Ok(missed) => (
                    missed
                        .iter()
                        .map(|applied| CollabEvent::operation(&self.document_id, applied))
                        .collect(),
                    since,
                ),
                Err(err) if err.needs_resync() => {
                    tracing::info!(
                        "[Collab] {} cannot replay {} from revision {}: {}",
                        author_id,
                        self.document_id,
                        since,
                        err
                    );
                    (vec![CollabEvent::snapshot(author_id, &session.snapshot())], revision)
                }
                Err(err) => return Err(err.into()),
            },
            None => (vec![CollabEvent::snapshot(author_id, &session.snapshot())], revision),
        };

        let connection = session.join(author_id, acked);
        broadcast_event(&self.events, CollabEvent::joined(&self.document_id, author_id, revision)).await;
        tracing::info!(
            "[Collab] {} joined {} at revision {} ({} replay events, connection {})",
            author_id,
            self.document_id,
            revision,
            replay.len(),
            connection
        );

        Ok(JoinedSession {
            receiver,
            replay,
            revision,
            connection,
        })
    }

    /// Remove a participant; returns whether it was registered
    pub async fn leave(&self, author_id: &str) -> bool {
        let mut session = self.session.lock().await;
        let removed = session.leave(author_id);
        if removed {
            self.announce_left(&session, author_id).await;
        }
        removed
    }

    /// End one connection of a participant
    ///
    /// The participant leaves only when this was its last connection.
    pub async fn disconnect(&self, author_id: &str, connection: ConnectionId) -> bool {
        let mut session = self.session.lock().await;
        let removed = session.disconnect(author_id, connection);
        if removed {
            self.announce_left(&session, author_id).await;
        } else {
            tracing::debug!(
                "[Collab] Connection {} of {} on {} closed",
                connection,
                author_id,
                self.document_id
            );
        }
        removed
    }

    async fn announce_left(&self, session: &DocumentSession, author_id: &str) {
        let revision = session.revision();
        broadcast_event(&self.events, CollabEvent::left(&self.document_id, author_id, revision)).await;
        tracing::info!("[Collab] {} left {}", author_id, self.document_id);
    }

    pub async fn acknowledge(&self, author_id: &str, revision: Revision) -> Result<(), BackendError> {
        let mut session = self.session.lock().await;
        session.acknowledge(author_id, revision)?;
        Ok(())
    }

    /// Events that bring a lagging subscriber from `last_revision` to current
    pub async fn catch_up(&self, author_id: &str, last_revision: Revision) -> Result<Vec<CollabEvent>, BackendError> {
        let session = self.session.lock().await;
        match session.replay_since(last_revision) {
            Ok(missed) => Ok(missed
                .iter()
                .map(|applied| CollabEvent::operation(&self.document_id, applied))
                .collect()),
            Err(err) if err.needs_resync() => Ok(vec![CollabEvent::snapshot(author_id, &session.snapshot())]),
            Err(err) => Err(err.into()),
        }
    }

    pub async fn snapshot(&self) -> DocumentSnapshot {
        self.session.lock().await.snapshot()
    }

    pub async fn revision(&self) -> Revision {
        self.session.lock().await.revision()
    }

    /// Participants and the revision each has acknowledged
    pub async fn participants(&self) -> Vec<(String, Revision)> {
        let session = self.session.lock().await;
        let mut participants: Vec<_> = session
            .participants()
            .map(|(author, revision)| (author.to_string(), revision))
            .collect();
        participants.sort();
        participants
    }

    /// Store a snapshot of the current document and release the history it covers
    pub async fn flush(&self) -> Result<DocumentSnapshot, BackendError> {
        let mut session = self.session.lock().await;
        self.checkpoint(&mut session).await
    }

    async fn checkpoint(&self, session: &mut DocumentSession) -> Result<DocumentSnapshot, BackendError> {
        let snapshot = session.snapshot();
        self.store.save_snapshot(&snapshot).await?;
        let released = session.compact_to(snapshot.revision);
        tracing::debug!(
            "[Collab] Checkpointed {} at revision {}, released {} history entries",
            self.document_id,
            snapshot.revision,
            released
        );
        Ok(snapshot)
    }

    fn is_idle(&self) -> bool {
        if self.events.receiver_count() > 0 {
            return false;
        }
        match self.session.try_lock() {
            Ok(session) => !session.has_participants(),
            Err(_) => false,
        }
    }
}

/// Registry of open document sessions
#[derive(Clone)]
pub struct CollabState {
    sessions: Arc<RwLock<HashMap<String, Arc<SessionHandle>>>>,
    store: Arc<dyn SnapshotStore>,
    broadcast_capacity: usize,
    history_retention: usize,
    snapshot_interval: u64,
}

impl CollabState {
    /// Registry without periodic checkpoints; see [`CollabState::with_snapshot_interval`]
    pub fn new(store: Arc<dyn SnapshotStore>, broadcast_capacity: usize, history_retention: usize) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            store,
            broadcast_capacity,
            history_retention,
            snapshot_interval: 0,
        }
    }

    /// Checkpoint sessions every `interval` revisions (0 disables)
    pub fn with_snapshot_interval(mut self, interval: u64) -> Self {
        self.snapshot_interval = interval;
        self
    }

    pub fn from_config(config: &AppConfig, store: Arc<dyn SnapshotStore>) -> Self {
        Self::new(store, config.broadcast_capacity, config.history_retention)
            .with_snapshot_interval(config.snapshot_interval)
    }

    pub fn store(&self) -> &Arc<dyn SnapshotStore> {
        &self.store
    }

    /// Get an open session
    pub async fn get(&self, document_id: &str) -> Option<Arc<SessionHandle>> {
        self.sessions.read().await.get(document_id).cloned()
    }

    /// Get or open the session of a document
    ///
    /// A document the store has never seen starts empty at revision 0.
    pub async fn open(&self, document_id: &str) -> Result<Arc<SessionHandle>, BackendError> {
        if document_id.trim().is_empty() {
            return Err(CollabError::validation("documentId", "must not be empty").into());
        }
        if let Some(handle) = self.get(document_id).await {
            return Ok(handle);
        }

        let snapshot = self
            .store
            .load(document_id)
            .await?
            .unwrap_or_else(|| DocumentSnapshot::empty(document_id));

        let mut sessions = self.sessions.write().await;
        let handle = sessions
            .entry(document_id.to_string())
            .or_insert_with(|| {
                tracing::info!(
                    "[Collab] Opened {} at revision {}",
                    document_id,
                    snapshot.revision
                );
                Arc::new(SessionHandle::new(
                    snapshot,
                    self.history_retention,
                    self.broadcast_capacity,
                    self.snapshot_interval,
                    self.store.clone(),
                ))
            })
            .clone();
        Ok(handle)
    }

    pub async fn submit(&self, document_id: &str, operation: &Operation) -> Result<Submission, BackendError> {
        self.open(document_id).await?.submit(operation).await
    }

    pub async fn snapshot(&self, document_id: &str) -> Result<DocumentSnapshot, BackendError> {
        Ok(self.open(document_id).await?.snapshot().await)
    }

    pub async fn acknowledge(&self, document_id: &str, author_id: &str, revision: Revision) -> Result<(), BackendError> {
        self.open(document_id).await?.acknowledge(author_id, revision).await
    }

    /// Remove a participant from an open document
    ///
    /// Returns `false` if the document is not open or the author was not
    /// registered.
    pub async fn leave(&self, document_id: &str, author_id: &str) -> bool {
        match self.get(document_id).await {
            Some(handle) => handle.leave(author_id).await,
            None => false,
        }
    }

    /// Ids of open documents, sorted
    pub async fn list_documents(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.sessions.read().await.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Flush and drop sessions nobody is using
    ///
    /// A session is idle when it has no participants, no subscribers, no
    /// request holding it and no lock holder. Returns the number closed.
    pub async fn close_idle(&self) -> usize {
        let idle: Vec<Arc<SessionHandle>> = {
            let mut sessions = self.sessions.write().await;
            let ids: Vec<String> = sessions
                .iter()
                .filter(|(_, handle)| Arc::strong_count(handle) == 1 && handle.is_idle())
                .map(|(id, _)| id.clone())
                .collect();
            ids.iter().filter_map(|id| sessions.remove(id)).collect()
        };

        for handle in &idle {
            match handle.flush().await {
                Ok(snapshot) => tracing::info!(
                    "[Collab] Closed idle {} at revision {}",
                    snapshot.document_id,
                    snapshot.revision
                ),
                Err(err) => tracing::warn!(
                    "[Collab] Failed to flush {} while closing: {}",
                    handle.document_id(),
                    err
                ),
            }
        }
        idle.len()
    }
}
