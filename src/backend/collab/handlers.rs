/**
 * Collaborative Editing Handlers
 *
 * HTTP surface of the session coordinator:
 * - `GET /collab` - list open documents
 * - `PUT /collab/{doc_id}` - submit an operation, returns the applied result
 * - `GET /collab/{doc_id}?author=..&since=..` - SSE subscription
 * - `GET /collab/{doc_id}/snapshot` - current content and revision
 * - `POST /collab/{doc_id}/ack` - acknowledge a revision
 * - `DELETE /collab/{doc_id}/participants/{author}` - leave a document
 *
 * # Subscription Stream
 *
 * A subscriber first receives its replay (missed operations, or a snapshot),
 * then live events. Operation events at or below the last delivered revision
 * are skipped. Every applied operation is delivered, including the
 * subscriber's own: an author may be connected more than once, and a client
 * recognises its own submissions by operation id. If the subscriber falls
 * behind the broadcast buffer, the stream catches up from the session history.
 *
 * Each stream holds one connection of its participant. Dropping the stream
 * ends that connection only, so a reconnect that races the old stream's
 * teardown keeps the participant registered.
 */

use crate::backend::collab::state::{CollabState, SessionHandle};
use crate::backend::error::BackendError;
use crate::backend::realtime::{sse_response, to_sse_event};
use crate::shared::message::{AckMessage, AppliedMessage, OperationMessage};
use crate::shared::ot::{ConnectionId, DocumentSnapshot, Revision};
use crate::shared::{CollabError, CollabEvent, EventType};
use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{sse::Event, IntoResponse},
    Json,
};
use futures_util::stream;
use serde::Deserialize;
use std::collections::VecDeque;
use std::convert::Infallible;
use std::sync::Arc;
use tokio::sync::broadcast::{error::RecvError, Receiver};

/// Query parameters of the subscription endpoint
#[derive(Debug, Deserialize)]
pub struct SubscribeParams {
    /// Subscribing participant
    pub author: String,
    /// Last revision the participant has applied, if reconnecting
    #[serde(default)]
    pub since: Option<Revision>,
}

/// List open documents (GET /collab)
pub async fn handle_list_documents(State(collab): State<CollabState>) -> Json<serde_json::Value> {
    let documents = collab.list_documents().await;
    Json(serde_json::json!({ "documents": documents }))
}

/// Submit an operation (PUT /collab/{doc_id})
///
/// The response is the operation as applied: transformed against concurrent
/// history and stamped with its revision. Resending an operation with the same
/// id returns the original result.
pub async fn handle_collab_put(
    State(collab): State<CollabState>,
    Path(doc_id): Path<String>,
    body: Bytes,
) -> Result<Json<AppliedMessage>, BackendError> {
    let message: OperationMessage = serde_json::from_slice(&body).map_err(|e| {
        tracing::warn!("[Collab] Undecodable operation for {}: {}", doc_id, e);
        BackendError::handler(StatusCode::BAD_REQUEST, format!("Invalid operation body: {}", e))
    })?;

    if message.document_id != doc_id {
        return Err(CollabError::malformed(format!(
            "operation targets {} but was sent to {}",
            message.document_id, doc_id
        ))
        .into());
    }

    let operation = message.to_operation()?;
    let submission = collab.submit(&doc_id, &operation).await?;
    Ok(Json(AppliedMessage::from_applied(&doc_id, submission.applied())))
}

/// Current document state (GET /collab/{doc_id}/snapshot)
pub async fn handle_collab_snapshot(
    State(collab): State<CollabState>,
    Path(doc_id): Path<String>,
) -> Result<Json<DocumentSnapshot>, BackendError> {
    Ok(Json(collab.snapshot(&doc_id).await?))
}

/// Acknowledge a revision (POST /collab/{doc_id}/ack)
pub async fn handle_collab_ack(
    State(collab): State<CollabState>,
    Path(doc_id): Path<String>,
    Json(ack): Json<AckMessage>,
) -> Result<StatusCode, BackendError> {
    collab.acknowledge(&doc_id, &ack.author_id, ack.revision).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Leave a document (DELETE /collab/{doc_id}/participants/{author})
pub async fn handle_collab_leave(
    State(collab): State<CollabState>,
    Path((doc_id, author)): Path<(String, String)>,
) -> Result<StatusCode, BackendError> {
    if collab.leave(&doc_id, &author).await {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(BackendError::handler(
            StatusCode::NOT_FOUND,
            format!("{} is not a participant of {}", author, doc_id),
        ))
    }
}

/// Subscribe to a document (GET /collab/{doc_id})
pub async fn handle_collab_subscription(
    State(collab): State<CollabState>,
    Path(doc_id): Path<String>,
    Query(params): Query<SubscribeParams>,
) -> Result<impl IntoResponse, BackendError> {
    if params.author.trim().is_empty() {
        return Err(CollabError::validation("author", "must not be empty").into());
    }
    tracing::info!(
        "[Collab] Subscription request for {} from {} (since {:?})",
        doc_id,
        params.author,
        params.since
    );

    let handle = collab.open(&doc_id).await?;
    let joined = handle.join(&params.author, params.since).await?;

    let state = SubscriptionState {
        _guard: ParticipantGuard {
            handle: handle.clone(),
            author: params.author.clone(),
            connection: joined.connection,
        },
        handle,
        receiver: joined.receiver,
        pending: joined.replay.into(),
        last_revision: joined.revision,
        author: params.author,
    };

    Ok(sse_response(stream::unfold(state, next_frame)))
}

struct SubscriptionState {
    handle: Arc<SessionHandle>,
    receiver: Receiver<CollabEvent>,
    pending: VecDeque<CollabEvent>,
    last_revision: Revision,
    author: String,
    _guard: ParticipantGuard,
}

async fn next_frame(mut state: SubscriptionState) -> Option<(Result<Event, Infallible>, SubscriptionState)> {
    loop {
        if let Some(event) = state.pending.pop_front() {
            if let Some(frame) = to_sse_event(&event) {
                return Some((Ok(frame), state));
            }
            continue;
        }

        match state.receiver.recv().await {
            Ok(event) => {
                if event.event_type == EventType::Operation {
                    if event.revision <= state.last_revision {
                        continue;
                    }
                    state.last_revision = event.revision;
                }
                state.pending.push_back(event);
            }
            Err(RecvError::Lagged(skipped)) => {
                tracing::warn!(
                    "[Realtime] Subscriber {} of {} lagged by {} events, catching up from revision {}",
                    state.author,
                    state.handle.document_id(),
                    skipped,
                    state.last_revision
                );
                match state.handle.catch_up(&state.author, state.last_revision).await {
                    Ok(events) => {
                        for event in events {
                            state.last_revision = state.last_revision.max(event.revision);
                            state.pending.push_back(event);
                        }
                    }
                    Err(err) => {
                        tracing::error!(
                            "[Realtime] Catch-up failed for {} on {}: {}",
                            state.author,
                            state.handle.document_id(),
                            err
                        );
                        return None;
                    }
                }
            }
            Err(RecvError::Closed) => return None,
        }
    }
}

/// Ends the participant's connection when its subscription stream is dropped
struct ParticipantGuard {
    handle: Arc<SessionHandle>,
    author: String,
    connection: ConnectionId,
}

impl Drop for ParticipantGuard {
    fn drop(&mut self) {
        let handle = self.handle.clone();
        let author = std::mem::take(&mut self.author);
        let connection = self.connection;
        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                runtime.spawn(async move {
                    handle.disconnect(&author, connection).await;
                });
            }
            Err(_) => tracing::warn!(
                "[Collab] No runtime to remove {} from {}",
                author,
                handle.document_id()
            ),
        }
    }
}
