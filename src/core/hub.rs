//! # PubSub: the subject → queue hub and its lifecycle.
//!
//! The [`PubSub`] owns the mapping from subject names to subject queues, the
//! runtime event channel and the hub [`Lifecycle`]. Queues are created lazily
//! on first use and only torn down by [`PubSub::close`].
//!
//! ## Key responsibilities
//! - create subject queues on demand (subscribe **or** publish)
//! - route `subscribe`/`publish` to the right queue
//! - reject every call with [`PubSubError::Closed`] once closing has begun
//! - run the shutdown coordinator exactly once and let callers wait on it
//!
//! ## High-level architecture
//! ```text
//! subscribe(subject, handler) ─┐
//!                              ├─► ensure Open ─► queue(subject) ─► SubjectQueue ─► Mailbox(es)
//! publish(subject, msg) ───────┘                 (lazy create,
//!                                                 write lock + Open re-check)
//!
//! close(grace):
//!   Open ──► Closing  (first caller only) ──► spawn shutdown::teardown
//!   every caller: wait for Closed ─┬─ in time   → Ok(())
//!                                  └─ too late  → Err(DeadlineExceeded), teardown continues
//! ```
//!
//! ## Rules
//! - Lifecycle is monotonic: `Open → Closing → Closed`.
//! - No subject entry is created once the lifecycle has left `Open`.
//! - The subject map lock is never held while a mailbox sends or drains.
//! - Calls that passed the `Open` check before closing began may still finish.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use subjectbus::{Message, PubSub, PubSubConfig};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), subjectbus::PubSubError> {
//!     let hub = PubSub::new(PubSubConfig::default());
//!
//!     let sub = hub
//!         .subscribe_fn("orders", |msg: Message| async move {
//!             if let Some(id) = msg.downcast_ref::<u64>() {
//!                 println!("order {id}");
//!             }
//!         })
//!         .await?;
//!
//!     hub.publish("orders", 1u64).await?;
//!     sub.unsubscribe().await;
//!
//!     hub.close(Duration::from_secs(5)).await
//! }
//! ```

use std::any::Any;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{RwLock, broadcast, watch};
use tokio::time::Instant;

use super::builder::PubSubBuilder;
use super::config::PubSubConfig;
use super::shutdown;
use super::subject::SubjectQueue;
use super::subscription::Subscription;
use crate::error::PubSubError;
use crate::events::{Event, EventBus, EventKind};
use crate::handlers::{HandlerFn, HandlerRef, Message};

/// Hub lifecycle.
///
/// Monotonic: `Open → Closing → Closed`, no reverse transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    /// Accepting subscribe and publish calls.
    Open,
    /// Teardown in progress; new calls are rejected.
    Closing,
    /// Every subject queue and mailbox has been drained and closed.
    Closed,
}

/// In-process publish/subscribe hub.
///
/// Created with [`PubSub::new`] or [`PubSub::builder`]; shared as `Arc<PubSub>`.
pub struct PubSub {
    cfg: PubSubConfig,
    subjects: RwLock<HashMap<String, Arc<SubjectQueue>>>,
    lifecycle: watch::Sender<Lifecycle>,
    bus: EventBus,
}

impl PubSub {
    /// Returns a builder for a hub with the given configuration.
    pub fn builder(cfg: PubSubConfig) -> PubSubBuilder {
        PubSubBuilder::new(cfg)
    }

    /// Creates a hub without observers.
    pub fn new(cfg: PubSubConfig) -> Arc<Self> {
        Self::builder(cfg).build()
    }

    pub(crate) fn new_internal(cfg: PubSubConfig, bus: EventBus) -> Self {
        let (lifecycle, _rx) = watch::channel(Lifecycle::Open);
        Self {
            cfg,
            subjects: RwLock::new(HashMap::new()),
            lifecycle,
            bus,
        }
    }

    /// Returns the configuration this hub was built with.
    pub fn config(&self) -> &PubSubConfig {
        &self.cfg
    }

    /// Returns the current lifecycle stage.
    pub fn lifecycle(&self) -> Lifecycle {
        *self.lifecycle.borrow()
    }

    /// Returns `true` once teardown has fully completed.
    pub fn is_closed(&self) -> bool {
        self.lifecycle() == Lifecycle::Closed
    }

    /// Observes lifecycle changes; `changed()` errors once the hub is dropped.
    pub(crate) fn watch_lifecycle(&self) -> watch::Receiver<Lifecycle> {
        self.lifecycle.subscribe()
    }

    /// Creates a receiver for runtime events published after this call.
    pub fn events(&self) -> broadcast::Receiver<Event> {
        self.bus.subscribe()
    }

    /// Returns the sorted list of known subjects.
    pub async fn subjects(&self) -> Vec<String> {
        let subjects = self.subjects.read().await;
        let mut names: Vec<String> = subjects.keys().cloned().collect();
        names.sort_unstable();
        names
    }

    /// Returns the number of live subscriptions on `subject` (0 if unknown).
    pub async fn subscriber_count(&self, subject: &str) -> usize {
        let queue = self.subjects.read().await.get(subject).cloned();
        match queue {
            Some(q) => q.len().await,
            None => 0,
        }
    }

    /// Registers `handler` on `subject`.
    ///
    /// Creates the subject on first use. The returned [`Subscription`] is the
    /// only way to leave the subject before the hub closes.
    ///
    /// # Errors
    /// [`PubSubError::Closed`] once closing has begun.
    pub async fn subscribe(
        &self,
        subject: &str,
        handler: HandlerRef,
    ) -> Result<Subscription, PubSubError> {
        self.ensure_open()?;
        let queue = self.queue(subject).await?;
        let mailbox = queue.subscribe(handler).await?;
        Ok(Subscription::new(mailbox))
    }

    /// Registers a closure on `subject`; the handler is named after the subject.
    ///
    /// # Errors
    /// [`PubSubError::Closed`] once closing has begun.
    pub async fn subscribe_fn<F, Fut>(
        &self,
        subject: &str,
        f: F,
    ) -> Result<Subscription, PubSubError>
    where
        F: Fn(Message) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.subscribe(subject, HandlerFn::arc(subject.to_string(), f))
            .await
    }

    /// Publishes `value` to every current subscription of `subject`.
    ///
    /// Waits while any live subscription's mailbox is full. Publishing to a
    /// subject without subscribers succeeds and delivers nothing.
    ///
    /// # Errors
    /// [`PubSubError::Closed`] once closing has begun.
    pub async fn publish<T>(&self, subject: &str, value: T) -> Result<(), PubSubError>
    where
        T: Any + Send + Sync,
    {
        self.publish_message(subject, Message::new(value)).await
    }

    /// Publishes an already-wrapped [`Message`] (e.g., forwarding one received by a handler).
    ///
    /// # Errors
    /// [`PubSubError::Closed`] once closing has begun.
    pub async fn publish_message(&self, subject: &str, msg: Message) -> Result<(), PubSubError> {
        self.ensure_open()?;
        let queue = self.queue(subject).await?;
        queue.publish(msg).await;
        Ok(())
    }

    /// Closes the hub, waiting at most `grace` for teardown to finish.
    ///
    /// See [`PubSub::close_until`].
    pub async fn close(self: &Arc<Self>, grace: Duration) -> Result<(), PubSubError> {
        self.close_until(Instant::now() + grace).await
    }

    /// Closes the hub, waiting until `deadline` at the latest.
    ///
    /// The first call moves the hub to `Closing` and starts teardown in the
    /// background: every subject queue drains and closes its mailboxes, then
    /// the hub becomes `Closed`. Every call (first, duplicate or concurrent)
    /// waits for that same teardown.
    ///
    /// # Errors
    /// [`PubSubError::DeadlineExceeded`] if teardown has not finished by
    /// `deadline`. Teardown is not cancelled; only this wait is abandoned.
    pub async fn close_until(self: &Arc<Self>, deadline: Instant) -> Result<(), PubSubError> {
        let started_at = Instant::now();
        let started = self.lifecycle.send_if_modified(|l| {
            if *l == Lifecycle::Open {
                *l = Lifecycle::Closing;
                true
            } else {
                false
            }
        });

        if started {
            self.bus.publish(Event::new(EventKind::CloseRequested));
            let me = Arc::clone(self);
            tokio::spawn(async move { me.shutdown().await });
        }

        let mut rx = self.lifecycle.subscribe();
        let done = async move {
            let _ = rx.wait_for(|l| *l == Lifecycle::Closed).await;
        };

        match tokio::time::timeout_at(deadline, done).await {
            Ok(()) => Ok(()),
            Err(_) => {
                let waited = started_at.elapsed();
                self.bus
                    .publish(Event::new(EventKind::CloseDeadlineExceeded).with_deadline(waited));
                Err(PubSubError::DeadlineExceeded { waited })
            }
        }
    }

    async fn shutdown(&self) {
        let queues: Vec<Arc<SubjectQueue>> = {
            let mut subjects = self.subjects.write().await;
            subjects.drain().map(|(_, q)| q).collect()
        };
        shutdown::teardown(queues, &self.lifecycle, &self.bus).await;
    }

    fn ensure_open(&self) -> Result<(), PubSubError> {
        match self.lifecycle() {
            Lifecycle::Open => Ok(()),
            Lifecycle::Closing | Lifecycle::Closed => Err(PubSubError::Closed),
        }
    }

    /// Returns the queue for `subject`, creating it if absent.
    async fn queue(&self, subject: &str) -> Result<Arc<SubjectQueue>, PubSubError> {
        {
            let subjects = self.subjects.read().await;
            if let Some(q) = subjects.get(subject) {
                return Ok(Arc::clone(q));
            }
        }

        let mut subjects = self.subjects.write().await;
        // Teardown takes this lock after leaving `Open`; re-check so nothing is created behind it.
        self.ensure_open()?;
        let queue = subjects.entry(subject.to_string()).or_insert_with(|| {
            SubjectQueue::new(
                subject,
                self.cfg.mailbox_capacity_clamped(),
                self.bus.clone(),
            )
        });
        Ok(Arc::clone(queue))
    }
}
