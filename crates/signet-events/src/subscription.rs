//! Event subscriptions with bounded-time waiting.
//!
//! A subscription receives every event published after its creation, in
//! journal order. The live path is a broadcast receiver; when that lags,
//! the subscription transparently replays the missed range from the
//! journal, so the consumer sees an unbroken sequence (possibly with
//! duplicates across the seam, which content-keyed listeners ignore).

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::broadcast;

use signet_core::Event;

use crate::error::{EventError, Result};
use crate::publisher::SequencedEvent;

/// A consumer's view of the event stream.
pub struct EventSubscription {
    rx: broadcast::Receiver<SequencedEvent>,
    journal: Arc<Mutex<Vec<SequencedEvent>>>,
    /// Highest sequence number handed to the consumer.
    last_seen: u64,
    /// Events replayed from the journal, not yet handed out.
    backlog: VecDeque<SequencedEvent>,
}

impl EventSubscription {
    pub(crate) fn new(
        rx: broadcast::Receiver<SequencedEvent>,
        journal: Arc<Mutex<Vec<SequencedEvent>>>,
        last_seen: u64,
    ) -> Self {
        Self {
            rx,
            journal,
            last_seen,
            backlog: VecDeque::new(),
        }
    }

    /// Receive the next event.
    ///
    /// Blocks until an event is available. Returns `Closed` only once the
    /// publisher is gone *and* the journal has been fully drained.
    pub async fn recv(&mut self) -> Result<SequencedEvent> {
        loop {
            if let Some(event) = self.backlog.pop_front() {
                self.last_seen = event.seq;
                return Ok(event);
            }

            match self.rx.recv().await {
                Ok(event) => {
                    if event.seq <= self.last_seen {
                        // Duplicate of an event already replayed from the
                        // journal; safe to drop here.
                        continue;
                    }
                    if event.seq > self.last_seen + 1 {
                        self.replay_from_journal();
                        continue;
                    }
                    self.last_seen = event.seq;
                    return Ok(event);
                }
                Err(broadcast::error::RecvError::Lagged(missed)) => {
                    tracing::warn!(missed, "event subscriber lagged; replaying from journal");
                    self.replay_from_journal();
                }
                Err(broadcast::error::RecvError::Closed) => {
                    self.replay_from_journal();
                    if self.backlog.is_empty() {
                        return Err(EventError::Closed);
                    }
                }
            }
        }
    }

    /// Block until an event equal to `expected` arrives, or the timeout
    /// expires.
    ///
    /// A timeout means the event has not been observed yet, not that the
    /// mutation failed; callers reconcile by re-reading the registry.
    pub async fn wait_for(&mut self, expected: &Event, timeout: Duration) -> Result<SequencedEvent> {
        self.wait_matching(|event| event == expected, timeout).await
    }

    /// Block until an event satisfying the predicate arrives, or the
    /// timeout expires.
    pub async fn wait_matching<F>(
        &mut self,
        mut matches: F,
        timeout: Duration,
    ) -> Result<SequencedEvent>
    where
        F: FnMut(&Event) -> bool,
    {
        let deadline = tokio::time::Instant::now() + timeout;

        loop {
            match tokio::time::timeout_at(deadline, self.recv()).await {
                Ok(Ok(event)) if matches(&event.event) => return Ok(event),
                Ok(Ok(_)) => continue,
                Ok(Err(err)) => return Err(err),
                Err(_) => return Err(EventError::Timeout),
            }
        }
    }

    /// Pull everything newer than `last_seen` out of the journal.
    fn replay_from_journal(&mut self) {
        let journal = self.journal.lock().unwrap_or_else(|e| e.into_inner());
        // seq is 1-based and dense, so the journal index of the first
        // missing event is exactly last_seen.
        let start = self.last_seen as usize;
        self.backlog.extend(journal[start..].iter().cloned());
    }
}
