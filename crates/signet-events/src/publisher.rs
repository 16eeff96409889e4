//! Event publication: journal plus broadcast fan-out.
//!
//! Every published event is appended to an in-process journal and then
//! broadcast to live subscribers. The journal is the at-least-once
//! backstop: a subscriber that lags behind the broadcast buffer re-reads
//! the journal from its last seen sequence number, so an event can be
//! delivered more than once but is never lost while the publisher lives.
//! Listeners key off event content and treat duplicates as no-ops.

use std::sync::{Arc, Mutex};

use tokio::sync::broadcast;

use signet_core::Event;

use crate::subscription::EventSubscription;

/// Default broadcast buffer size before slow subscribers lag.
const DEFAULT_CAPACITY: usize = 256;

/// An event with its journal sequence number.
///
/// Sequence numbers are assigned in commit order, starting at 1. Because
/// registry mutations publish while holding their per-application lock,
/// journal order preserves per-application commit order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequencedEvent {
    pub seq: u64,
    pub event: Event,
}

/// Publishes registry change events to any number of subscribers.
///
/// `publish` is fire-and-forget for the caller: having no subscribers is
/// not an error, and a committed mutation is never rolled back because
/// delivery failed.
pub struct EventPublisher {
    journal: Arc<Mutex<Vec<SequencedEvent>>>,
    tx: broadcast::Sender<SequencedEvent>,
}

impl EventPublisher {
    /// Create a publisher with the default broadcast capacity.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Create a publisher with an explicit broadcast capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self {
            journal: Arc::new(Mutex::new(Vec::new())),
            tx,
        }
    }

    /// Publish an event, returning its journal sequence number.
    ///
    /// The journal append and the broadcast send happen under one lock,
    /// so subscribers observe a single total order consistent with the
    /// journal.
    pub fn publish(&self, event: Event) -> u64 {
        let mut journal = self.journal.lock().unwrap_or_else(|e| e.into_inner());
        let seq = journal.len() as u64 + 1;
        let sequenced = SequencedEvent {
            seq,
            event: event.clone(),
        };
        journal.push(sequenced.clone());

        if self.tx.send(sequenced).is_err() {
            // No live subscribers; the journal still has the event.
            tracing::debug!(kind = event.kind(), application = %event.application(),
                "published event with no subscribers");
        } else {
            tracing::debug!(seq, kind = event.kind(), application = %event.application(),
                "published event");
        }

        seq
    }

    /// Subscribe to events published after this call.
    pub fn subscribe(&self) -> EventSubscription {
        // Hold the journal lock while creating the receiver so the
        // subscription point is atomic with respect to publish.
        let journal = self.journal.lock().unwrap_or_else(|e| e.into_inner());
        let rx = self.tx.subscribe();
        let last_seen = journal.len() as u64;
        drop(journal);

        EventSubscription::new(rx, Arc::clone(&self.journal), last_seen)
    }

    /// All events with a sequence number greater than `after_seq`.
    ///
    /// This is the reconciliation path for consumers that missed the
    /// live broadcast.
    pub fn events_since(&self, after_seq: u64) -> Vec<SequencedEvent> {
        let journal = self.journal.lock().unwrap_or_else(|e| e.into_inner());
        journal
            .iter()
            .filter(|e| e.seq > after_seq)
            .cloned()
            .collect()
    }

    /// Sequence number of the most recently published event (0 if none).
    pub fn last_seq(&self) -> u64 {
        let journal = self.journal.lock().unwrap_or_else(|e| e.into_inner());
        journal.len() as u64
    }
}

impl Default for EventPublisher {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use signet_core::ApplicationId;

    fn deleted(app: &str) -> Event {
        Event::ApplicationDeleted {
            application: ApplicationId::new(app),
        }
    }

    #[tokio::test]
    async fn test_publish_without_subscribers_is_ok() {
        let publisher = EventPublisher::new();
        assert_eq!(publisher.publish(deleted("app-1")), 1);
        assert_eq!(publisher.publish(deleted("app-2")), 2);
        assert_eq!(publisher.last_seq(), 2);
    }

    #[tokio::test]
    async fn test_events_since_filters_by_seq() {
        let publisher = EventPublisher::new();
        publisher.publish(deleted("app-1"));
        publisher.publish(deleted("app-2"));
        publisher.publish(deleted("app-3"));

        let tail = publisher.events_since(1);
        assert_eq!(tail.len(), 2);
        assert_eq!(tail[0].seq, 2);
        assert_eq!(tail[1].seq, 3);

        assert!(publisher.events_since(3).is_empty());
    }

    #[tokio::test]
    async fn test_subscriber_sees_only_later_events() {
        let publisher = EventPublisher::new();
        publisher.publish(deleted("before"));

        let mut sub = publisher.subscribe();
        publisher.publish(deleted("after"));

        let received = sub.recv().await.unwrap();
        assert_eq!(received.event, deleted("after"));
        assert_eq!(received.seq, 2);
    }

    #[tokio::test]
    async fn test_broadcast_order_matches_journal() {
        let publisher = EventPublisher::new();
        let mut sub = publisher.subscribe();

        for i in 0..10 {
            publisher.publish(deleted(&format!("app-{i}")));
        }

        for i in 0..10 {
            let received = sub.recv().await.unwrap();
            assert_eq!(received.seq, i + 1);
            assert_eq!(received.event, deleted(&format!("app-{i}")));
        }
    }

    #[tokio::test]
    async fn test_lagged_subscriber_catches_up_from_journal() {
        // Capacity 4 forces the broadcast buffer to overflow; the
        // subscription must recover every event from the journal.
        let publisher = EventPublisher::with_capacity(4);
        let mut sub = publisher.subscribe();

        for i in 0..32 {
            publisher.publish(deleted(&format!("app-{i}")));
        }

        for i in 0..32 {
            let received = sub.recv().await.unwrap();
            assert_eq!(received.seq, i + 1, "no event may be lost");
        }
    }
}
