//! # Shutdown coordinator.
//!
//! Runs detached from the caller of `PubSub::close`, so a caller that stops
//! waiting (deadline exceeded, future dropped) never interrupts teardown.
//!
//! ```text
//! close() ──► Open → Closing ──► spawn(teardown)
//!                                   ├─► take every subject queue (write lock)
//!                                   ├─► close all queues concurrently
//!                                   │     └─► each drains + closes its mailboxes
//!                                   └─► publish Closed, Closing → Closed
//! ```

use std::sync::Arc;

use futures::future::join_all;
use tokio::sync::watch;

use super::hub::Lifecycle;
use super::subject::SubjectQueue;
use crate::events::{Event, EventBus, EventKind};

/// Closes every queue, then marks the hub `Closed`.
pub(super) async fn teardown(
    queues: Vec<Arc<SubjectQueue>>,
    lifecycle: &watch::Sender<Lifecycle>,
    bus: &EventBus,
) {
    join_all(queues.iter().map(|q| q.close())).await;

    bus.publish(Event::new(EventKind::Closed));
    lifecycle.send_replace(Lifecycle::Closed);
}
