/**
 * Collaboration Event Broadcasting
 *
 * Each document session owns a `tokio::sync::broadcast` channel. Every
 * subscriber of the document receives a copy of each event, in send order.
 * Sessions send while holding their mutex, so the channel order is the
 * revision order.
 */

use crate::shared::CollabEvent;
use tokio::sync::broadcast;

/// Broadcast channel for the events of one document
pub type CollabBroadcast = broadcast::Sender<CollabEvent>;

/// Create a document channel with room for `capacity` buffered events
pub fn channel(capacity: usize) -> CollabBroadcast {
    let (tx, _) = broadcast::channel(capacity.max(1));
    tx
}

/// Broadcast an event to all subscribers of a document
///
/// # Returns
///
/// Number of active subscribers that received the event (0 if no subscribers)
pub async fn broadcast_event(broadcast_tx: &CollabBroadcast, event: CollabEvent) -> usize {
    let event_type = event.event_type;
    let revision = event.revision;
    match broadcast_tx.send(event) {
        Ok(subscriber_count) => {
            tracing::debug!(
                "[Realtime] {} event at revision {} sent to {} subscribers",
                event_type.as_str(),
                revision,
                subscriber_count
            );
            subscriber_count
        }
        Err(_) => {
            // No subscribers, that's okay
            tracing::trace!("[Realtime] No subscribers for {} event", event_type.as_str());
            0
        }
    }
}
