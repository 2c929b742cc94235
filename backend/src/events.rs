//! Event broadcasting system for real-time updates.

use axum::response::sse::{Event, KeepAlive};
use axum::response::Sse;
use futures::Stream;
use mixdesk_types::MixerEvent;
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;
use tracing::debug;

/// Receives mixer state-change notifications.
///
/// Publishing is best-effort: implementations must not block and callers
/// never observe delivery failures. Mixers publish while holding their own
/// lock, so implementations must not call back into the registry.
pub trait ChangeNotifier: Send + Sync {
    fn publish(&self, event: MixerEvent);
}

/// Event broadcaster for SSE (Server-Sent Events) and WebSocket clients.
#[derive(Clone)]
pub struct EventBroadcaster {
    /// Broadcast channel for events
    sender: Arc<broadcast::Sender<MixerEvent>>,
}

impl EventBroadcaster {
    /// Create a new event broadcaster with a buffer size.
    pub fn new(buffer_size: usize) -> Self {
        let (sender, _) = broadcast::channel(buffer_size.max(1));
        Self {
            sender: Arc::new(sender),
        }
    }

    /// Broadcast an event to all connected clients.
    pub fn broadcast(&self, event: MixerEvent) {
        debug!(
            event = event.event_name(),
            "Broadcasting event: {}",
            event.description()
        );
        // No receivers is not an error
        let _ = self.sender.send(event);
    }

    /// Subscribe to the raw event stream.
    pub fn subscribe(&self) -> broadcast::Receiver<MixerEvent> {
        self.sender.subscribe()
    }

    /// Subscribe to events and get a SSE stream.
    pub fn sse_stream(&self) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
        let stream = BroadcastStream::new(self.sender.subscribe());

        let event_stream = stream.filter_map(|result| match result {
            Ok(event) => {
                debug!("Sending SSE event: {}", event.description());
                match serde_json::to_string(&event) {
                    Ok(json) => Some(Ok(Event::default().event(event.event_name()).data(json))),
                    Err(e) => {
                        tracing::error!("Failed to serialize event: {}", e);
                        None
                    }
                }
            }
            Err(e) => {
                // BroadcastStream returns RecvError when lagging
                tracing::warn!("Client lagging, skipping events: {}", e);
                None
            }
        });

        Sse::new(event_stream).keep_alive(
            KeepAlive::new()
                .interval(Duration::from_secs(15))
                .text("keep-alive"),
        )
    }

    /// Get the number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl ChangeNotifier for EventBroadcaster {
    fn publish(&self, event: MixerEvent) {
        self.broadcast(event);
    }
}

impl Default for EventBroadcaster {
    fn default() -> Self {
        Self::new(100) // Default buffer of 100 events
    }
}

/// Notifier that keeps every published event, for assertions in tests.
#[cfg(test)]
#[derive(Default)]
pub(crate) struct RecordingNotifier {
    events: parking_lot::Mutex<Vec<MixerEvent>>,
}

#[cfg(test)]
impl RecordingNotifier {
    pub(crate) fn events(&self) -> Vec<MixerEvent> {
        self.events.lock().clone()
    }

    pub(crate) fn names(&self) -> Vec<&'static str> {
        self.events.lock().iter().map(|e| e.event_name()).collect()
    }
}

#[cfg(test)]
impl ChangeNotifier for RecordingNotifier {
    fn publish(&self, event: MixerEvent) {
        self.events.lock().push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[tokio::test]
    async fn test_broadcaster_creation() {
        let broadcaster = EventBroadcaster::new(10);
        assert_eq!(broadcaster.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_broadcast_event() {
        let broadcaster = EventBroadcaster::new(10);
        let id = Uuid::new_v4();

        let mut rx = broadcaster.subscribe();
        assert_eq!(broadcaster.subscriber_count(), 1);

        broadcaster.publish(MixerEvent::MixerRemove { id });

        let event = rx.recv().await.unwrap();
        assert_eq!(event, MixerEvent::MixerRemove { id });
    }

    #[test]
    fn test_publish_without_subscribers_is_silent() {
        let broadcaster = EventBroadcaster::new(1);
        broadcaster.publish(MixerEvent::Ping);
        broadcaster.publish(MixerEvent::Ping);
    }
}
