//! Runtime events: types and broadcast channel.
//!
//! This module groups the event **data model** and the **bus** used to
//! publish/subscribe to runtime events emitted by the hub, subject queues,
//! mailbox delivery loops and observer workers.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and payload metadata
//! - [`EventBus`] thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: `PubSub` (lifecycle), `SubjectQueue` (creation/close),
//!   `Mailbox` (subscribe/unsubscribe/drop/panic), `ObserverSet` workers.
//! - **Consumers**: the observer listener spawned by `PubSubBuilder::build`
//!   and anyone holding a receiver from `PubSub::events`.
//!
//! Events never take part in message delivery: a full or absent event
//! receiver does not slow down publishers.

mod bus;
mod event;

pub use bus::EventBus;
pub use event::{Event, EventKind};
