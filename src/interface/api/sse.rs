//! Live-update event streaming
//!
//! A single broadcast channel fans resolved call events out to every open
//! client stream. Publishing never blocks: with no subscribers the event is
//! dropped, and a lagged subscriber loses oldest events rather than stalling
//! anyone else. Subscribers only see events published after they connect.

use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::stream::Stream;
use futures::StreamExt;
use serde_json::{json, Value};
use std::convert::Infallible;
use tokio::sync::broadcast;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;
use tracing::{debug, warn};
use uuid::Uuid;

use super::session_handler::AppState;

/// Events pushed to connected clients
#[derive(Debug, Clone)]
pub enum LiveEvent {
    /// A call attempt resolved; the session now carries its summary
    CallSummary { assistant_id: Uuid, summary: String },
    /// Intermediate status change, no client action required
    CallUpdated { assistant_id: Uuid, status: String },
}

impl LiveEvent {
    pub fn name(&self) -> &'static str {
        match self {
            LiveEvent::CallSummary { .. } => "call_summary",
            LiveEvent::CallUpdated { .. } => "call_updated",
        }
    }

    pub fn data(&self) -> Value {
        match self {
            LiveEvent::CallSummary {
                assistant_id,
                summary,
            } => json!({
                "assistant_id": assistant_id,
                "summary": summary,
            }),
            LiveEvent::CallUpdated {
                assistant_id,
                status,
            } => json!({
                "assistant_id": assistant_id,
                "status": status,
            }),
        }
    }
}

/// Event broadcaster
pub struct EventBroadcaster {
    tx: broadcast::Sender<LiveEvent>,
}

impl EventBroadcaster {
    /// Create new event broadcaster with specified per-subscriber capacity
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Subscribe to events published from this moment on
    pub fn subscribe(&self) -> broadcast::Receiver<LiveEvent> {
        self.tx.subscribe()
    }

    /// Publish an event to all current subscribers
    pub fn publish(&self, event: LiveEvent) {
        match self.tx.send(event) {
            Ok(receivers) => debug!("Published event to {} subscribers", receivers),
            Err(_) => debug!("No subscribers connected, event dropped"),
        }
    }

    /// Get number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for EventBroadcaster {
    fn default() -> Self {
        Self::new(256)
    }
}

/// SSE stream of live call events
///
/// The connection blocks only on "wait for the next event"; dropping the
/// stream (client disconnect) drops the receiver and removes the subscriber.
pub async fn stream_handler(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = state.broadcaster.subscribe();
    debug!("SSE client connected");

    let stream = BroadcastStream::new(rx).filter_map(|message| async move {
        match message {
            Ok(event) => match Event::default().event(event.name()).json_data(event.data()) {
                Ok(sse_event) => Some(Ok(sse_event)),
                Err(e) => {
                    warn!("Failed to encode SSE event: {}", e);
                    None
                }
            },
            Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                warn!("SSE subscriber lagged, {} events dropped", skipped);
                None
            }
        }
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::broadcast::error::TryRecvError;

    #[test]
    fn test_broadcaster_creation() {
        let broadcaster = EventBroadcaster::new(100);
        assert_eq!(broadcaster.subscriber_count(), 0);
    }

    #[test]
    fn test_publish_without_subscribers_does_not_fail() {
        let broadcaster = EventBroadcaster::new(100);
        broadcaster.publish(LiveEvent::CallUpdated {
            assistant_id: Uuid::new_v4(),
            status: "ringing".to_string(),
        });
    }

    #[tokio::test]
    async fn test_subscriber_receives_event() {
        let broadcaster = EventBroadcaster::new(100);
        let mut rx = broadcaster.subscribe();
        let assistant_id = Uuid::new_v4();

        broadcaster.publish(LiveEvent::CallSummary {
            assistant_id,
            summary: "All done".to_string(),
        });

        let event = rx.recv().await.unwrap();
        match event {
            LiveEvent::CallSummary {
                assistant_id: id,
                summary,
            } => {
                assert_eq!(id, assistant_id);
                assert_eq!(summary, "All done");
            }
            _ => panic!("Wrong event type"),
        }
    }

    #[tokio::test]
    async fn test_all_subscribers_receive_in_publish_order() {
        let broadcaster = EventBroadcaster::new(100);
        let mut rx1 = broadcaster.subscribe();
        let mut rx2 = broadcaster.subscribe();
        assert_eq!(broadcaster.subscriber_count(), 2);

        let assistant_id = Uuid::new_v4();
        broadcaster.publish(LiveEvent::CallUpdated {
            assistant_id,
            status: "initiated".to_string(),
        });
        broadcaster.publish(LiveEvent::CallSummary {
            assistant_id,
            summary: "done".to_string(),
        });

        for rx in [&mut rx1, &mut rx2] {
            assert!(matches!(
                rx.recv().await.unwrap(),
                LiveEvent::CallUpdated { .. }
            ));
            assert!(matches!(
                rx.recv().await.unwrap(),
                LiveEvent::CallSummary { .. }
            ));
        }
    }

    #[tokio::test]
    async fn test_late_subscriber_sees_no_backlog() {
        let broadcaster = EventBroadcaster::new(100);
        broadcaster.publish(LiveEvent::CallSummary {
            assistant_id: Uuid::new_v4(),
            summary: "before subscribe".to_string(),
        });

        let mut rx = broadcaster.subscribe();
        assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));
    }

    #[tokio::test]
    async fn test_dropped_subscriber_is_removed() {
        let broadcaster = EventBroadcaster::new(100);
        let rx = broadcaster.subscribe();
        assert_eq!(broadcaster.subscriber_count(), 1);
        drop(rx);
        assert_eq!(broadcaster.subscriber_count(), 0);
    }

    #[test]
    fn test_event_payload_shape() {
        let assistant_id = Uuid::new_v4();
        let event = LiveEvent::CallSummary {
            assistant_id,
            summary: "hi".to_string(),
        };
        assert_eq!(event.name(), "call_summary");
        let data = event.data();
        assert_eq!(data["assistant_id"], json!(assistant_id));
        assert_eq!(data["summary"], "hi");
    }
}
