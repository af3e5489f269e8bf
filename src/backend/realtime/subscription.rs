/**
 * Server-Sent Events Encoding
 *
 * Converts collaboration events into SSE frames and wraps event streams in
 * an SSE response with keep-alive. The document-specific stream logic
 * (replay, lag recovery, participant filtering) lives in
 * `backend::collab::handlers`.
 *
 * # Frame Format
 *
 * ```text
 * event: operation
 * id: 12
 * data: {"eventType":"operation","documentId":"note-1",...}
 * ```
 *
 * The SSE `id` is the document revision, so a reconnecting client can pass
 * it back as `since`.
 */

use crate::shared::CollabEvent;
use axum::response::sse::{Event, KeepAlive, KeepAliveStream, Sse};
use std::convert::Infallible;
use tokio_stream::Stream;

/// Convert a collaboration event into an SSE frame
///
/// Returns `None` if the event cannot be serialized; the caller skips it.
pub fn to_sse_event(event: &CollabEvent) -> Option<Event> {
    match serde_json::to_string(event) {
        Ok(data) => Some(
            Event::default()
                .event(event.event_type.as_str())
                .id(event.revision.to_string())
                .data(data),
        ),
        Err(e) => {
            tracing::error!("[Realtime] Failed to serialize event: {:?}", e);
            None
        }
    }
}

/// Wrap a stream of SSE frames in a response with keep-alive comments
pub fn sse_response<S>(stream: S) -> Sse<KeepAliveStream<S>>
where
    S: Stream<Item = Result<Event, Infallible>> + Send + 'static,
{
    Sse::new(stream).keep_alive(KeepAlive::default())
}
