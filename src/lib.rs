//! # subjectbus
//!
//! **subjectbus** is an in-process publish/subscribe hub for tokio applications.
//!
//! Callers subscribe a handler to a named subject and receive every message
//! published to that subject afterwards: in order, one at a time, on a
//! dedicated delivery loop. Publishers are throttled by bounded per-subscriber
//! mailboxes instead of being failed or silently outrun.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!   publish("orders", m)        subscribe("orders", h)          close(grace)
//!            │                           │                            │
//!            ▼                           ▼                            ▼
//! ┌───────────────────────────────────────────────────────────────────────────┐
//! │  PubSub (hub)                                                             │
//! │  - subjects: name → SubjectQueue (created lazily)                         │
//! │  - lifecycle: Open → Closing → Closed                                     │
//! │  - EventBus (runtime events → observers)                                  │
//! └──────┬──────────────────────────────────────────────┬─────────────────────┘
//!        ▼                                              ▼
//! ┌───────────────────────┐                    ┌───────────────────────┐
//! │ SubjectQueue "orders" │                    │ SubjectQueue "prices" │
//! │ - subscribers: id→box │                    │ ...                   │
//! └───┬───────────────┬───┘                    └───────────────────────┘
//!     ▼               ▼   (fan-out, one send per mailbox; may wait when full)
//! ┌─────────┐     ┌─────────┐
//! │ Mailbox │     │ Mailbox │   bounded FIFO + Running/Draining/Closed + in-flight count
//! └────┬────┘     └────┬────┘
//!      ▼               ▼
//!  delivery loop   delivery loop  ──► handler.handle(msg)   (panics caught → HandlerPanicked)
//! ```
//!
//! ### Lifecycle
//! ```text
//! Subscription::unsubscribe():
//!   Running ─► Draining ─► (all accepted messages handled) ─► Closed ─► removed from subject
//!
//! PubSub::close(grace):
//!   Open ─► Closing ─► every subject: every mailbox drained & closed ─► Closed
//!   caller waits up to `grace`; on timeout gets DeadlineExceeded, teardown continues
//! ```
//!
//! ## Guarantees
//! - Per-subscription FIFO; no ordering across subscriptions or subjects.
//! - A message published on one subject never reaches another subject's handlers.
//! - `publish` waits while the slowest live subscription's mailbox is full.
//! - `unsubscribe` returns only after every accepted message was handled.
//! - After `close` begins, `subscribe`/`publish` fail with [`PubSubError::Closed`].
//!
//! ## Features
//! | Area              | Description                                              | Key types / traits                     |
//! |-------------------|----------------------------------------------------------|----------------------------------------|
//! | **Hub**           | Subscribe, publish, close.                               | [`PubSub`], [`PubSubBuilder`]          |
//! | **Handlers**      | Receive messages as trait objects or closures.           | [`Handler`], [`HandlerFn`], [`Message`]|
//! | **Subscriptions** | Leave a subject after draining.                          | [`Subscription`], [`MailboxState`]     |
//! | **Observers**     | Hook into runtime events (logging, metrics).             | [`Observe`], [`Event`], [`EventKind`]  |
//! | **Errors**        | Typed errors for closed hub and close deadlines.         | [`PubSubError`]                        |
//! | **Configuration** | Mailbox and event buffer sizes.                          | [`PubSubConfig`]                       |
//!
//! ## Optional features
//! - `logging`: exports a simple built-in [`LogWriter`] _(demo/reference only)_.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use std::time::Duration;
//! use subjectbus::{HandlerFn, Message, PubSub, PubSubConfig};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     #[cfg(feature = "logging")]
//!     let observers: Vec<Arc<dyn subjectbus::Observe>> = vec![Arc::new(subjectbus::LogWriter::new())];
//!     #[cfg(not(feature = "logging"))]
//!     let observers: Vec<Arc<dyn subjectbus::Observe>> = Vec::new();
//!
//!     let hub = PubSub::builder(PubSubConfig::default())
//!         .with_observers(observers)
//!         .build();
//!
//!     let audit = HandlerFn::arc("audit", |msg: Message| async move {
//!         if let Some(text) = msg.downcast_ref::<&str>() {
//!             println!("audit: {text}");
//!         }
//!     });
//!     let sub = hub.subscribe("orders", audit).await?;
//!
//!     hub.publish("orders", "created #1").await?;
//!     hub.publish("orders", "paid #1").await?;
//!
//!     sub.unsubscribe().await;
//!     hub.close(Duration::from_secs(5)).await?;
//!     Ok(())
//! }
//! ```
mod core;
mod error;
mod events;
mod handlers;
mod observers;

// ---- Public re-exports ----

pub use crate::core::{
    Lifecycle, MailboxState, PubSub, PubSubBuilder, PubSubConfig, Subscription, SubscriptionId,
};
pub use error::PubSubError;
pub use events::{Event, EventKind};
pub use handlers::{Handler, HandlerFn, HandlerRef, Message};
pub use observers::Observe;

// Optional: expose a simple built-in logger observer (demo/reference).
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use observers::LogWriter;
