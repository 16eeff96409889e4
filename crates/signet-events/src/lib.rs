//! # Signet Events
//!
//! At-least-once event propagation for the Signet registry.
//!
//! ## Overview
//!
//! Every committed registry mutation publishes one [`signet_core::Event`].
//! The publisher appends it to an in-process journal and broadcasts it to
//! live subscribers. Delivery is at-least-once: a subscriber that falls
//! behind the broadcast buffer replays the missed range from the journal,
//! and consumers key off event content so duplicates are harmless.
//!
//! ## Key Types
//!
//! - [`EventPublisher`] - journal + broadcast fan-out
//! - [`EventSubscription`] - per-consumer stream with bounded-time
//!   [`EventSubscription::wait_for`]
//! - [`SequencedEvent`] - an event with its journal sequence number
//!
//! ## Ordering
//!
//! Journal sequence numbers are assigned in commit order. Registry
//! mutations publish before releasing their per-application lock, so
//! events for one application are always observed in mutation order; no
//! cross-application ordering is promised.

pub mod error;
pub mod publisher;
pub mod subscription;

pub use error::{EventError, Result};
pub use publisher::{EventPublisher, SequencedEvent};
pub use subscription::EventSubscription;
