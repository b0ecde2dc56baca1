//! # Subject queue: the set of mailboxes listening on one subject.
//!
//! A [`SubjectQueue`] is created lazily by the hub on the first subscribe or
//! publish for a subject name and lives until the hub closes.
//!
//! ## Architecture
//! ```text
//! subscribe(handler) ──► Mailbox::spawn ──► subscribers[id] = mailbox
//!                                     └──► watcher: on Closed → remove(id)
//!
//! publish(msg) ──► snapshot (read lock) ──► for each mailbox: send(msg).await
//!                    (lock released)                 └─ may wait (backpressure)
//!
//! close() ──► (once) take all + mark closed (write lock) ──► unsubscribe all ──► SubjectClosed
//! ```
//!
//! ## Rules
//! - A subscription id present in the map has a running (or draining) mailbox.
//! - The map lock is never held across `Mailbox::send` or `Mailbox::unsubscribe`:
//!   one slow mailbox must not stall lookups for the whole subject.
//! - A mailbox subscribing concurrently with a publish may or may not see that message.
//! - Once closed, the queue rejects new subscriptions with `PubSubError::Closed`.

use std::collections::HashMap;
use std::sync::{Arc, Weak};

use futures::future::join_all;
use tokio::sync::{OnceCell, RwLock};

use super::mailbox::{self, Mailbox};
use super::subscription::SubscriptionId;
use crate::error::PubSubError;
use crate::events::{Event, EventBus, EventKind};
use crate::handlers::{HandlerRef, Message};

struct Subscribers {
    mailboxes: HashMap<SubscriptionId, Arc<Mailbox>>,
    closed: bool,
}

pub(crate) struct SubjectQueue {
    name: Arc<str>,
    capacity: usize,
    inner: RwLock<Subscribers>,
    close_once: OnceCell<()>,
    bus: EventBus,
}

impl SubjectQueue {
    pub(crate) fn new(name: impl Into<Arc<str>>, capacity: usize, bus: EventBus) -> Arc<Self> {
        let name = name.into();
        bus.publish(Event::new(EventKind::SubjectCreated).with_subject(Arc::clone(&name)));
        Arc::new(Self {
            name,
            capacity,
            inner: RwLock::new(Subscribers {
                mailboxes: HashMap::new(),
                closed: false,
            }),
            close_once: OnceCell::new(),
            bus,
        })
    }

    /// Registers a new mailbox for `handler` and starts its delivery loop.
    pub(crate) async fn subscribe(
        self: &Arc<Self>,
        handler: HandlerRef,
    ) -> Result<Arc<Mailbox>, PubSubError> {
        let mailbox = {
            let mut inner = self.inner.write().await;
            if inner.closed {
                return Err(PubSubError::Closed);
            }
            let mailbox = Mailbox::spawn(
                Arc::clone(&self.name),
                handler,
                self.capacity,
                self.bus.clone(),
            );
            inner.mailboxes.insert(mailbox.id(), Arc::clone(&mailbox));
            mailbox
        };

        self.spawn_watcher(&mailbox);
        Ok(mailbox)
    }

    /// Removes the mailbox from the map once it reaches `Closed`.
    fn spawn_watcher(self: &Arc<Self>, mailbox: &Mailbox) {
        let id = mailbox.id();
        let mut state = mailbox.watch_state();
        let queue: Weak<Self> = Arc::downgrade(self);

        tokio::spawn(async move {
            mailbox::wait_closed(&mut state).await;
            if let Some(queue) = queue.upgrade() {
                queue.inner.write().await.mailboxes.remove(&id);
            }
        });
    }

    /// Fans `msg` out to every mailbox registered at the time of the call.
    pub(crate) async fn publish(&self, msg: Message) {
        let targets: Vec<Arc<Mailbox>> = {
            let inner = self.inner.read().await;
            inner.mailboxes.values().cloned().collect()
        };

        for mailbox in targets {
            mailbox.send(msg.clone()).await;
        }
    }

    /// Number of registered mailboxes.
    pub(crate) async fn len(&self) -> usize {
        self.inner.read().await.mailboxes.len()
    }

    /// Drains and closes every mailbox, then marks the queue closed.
    ///
    /// Runs at most once; concurrent callers wait for the same run.
    pub(crate) async fn close(&self) {
        self.close_once
            .get_or_init(|| async {
                let mailboxes: Vec<Arc<Mailbox>> = {
                    let mut inner = self.inner.write().await;
                    inner.closed = true;
                    inner.mailboxes.drain().map(|(_, m)| m).collect()
                };

                join_all(mailboxes.iter().map(|m| m.unsubscribe())).await;

                self.bus
                    .publish(Event::new(EventKind::SubjectClosed).with_subject(Arc::clone(&self.name)));
            })
            .await;
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::time::Duration;

    use super::*;
    use crate::handlers::HandlerFn;

    fn collecting(seen: &Arc<Mutex<Vec<u32>>>) -> HandlerRef {
        let s = Arc::clone(seen);
        HandlerFn::arc("collect", move |msg: Message| {
            let s = Arc::clone(&s);
            async move {
                if let Some(n) = msg.downcast_ref::<u32>() {
                    s.lock().unwrap().push(*n);
                }
            }
        })
    }

    #[tokio::test]
    async fn test_fan_out_reaches_every_mailbox() {
        let q = SubjectQueue::new("prices", 16, EventBus::new(16));
        let a = Arc::new(Mutex::new(Vec::new()));
        let b = Arc::new(Mutex::new(Vec::new()));
        let ma = q.subscribe(collecting(&a)).await.unwrap();
        let mb = q.subscribe(collecting(&b)).await.unwrap();
        assert_eq!(q.len().await, 2);

        for n in 0..5u32 {
            q.publish(Message::new(n)).await;
        }
        ma.unsubscribe().await;
        mb.unsubscribe().await;

        assert_eq!(*a.lock().unwrap(), vec![0, 1, 2, 3, 4]);
        assert_eq!(*b.lock().unwrap(), vec![0, 1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn test_unsubscribed_mailbox_is_removed() {
        let q = SubjectQueue::new("prices", 16, EventBus::new(16));
        let seen = Arc::new(Mutex::new(Vec::new()));
        let m = q.subscribe(collecting(&seen)).await.unwrap();

        m.unsubscribe().await;

        let deadline = tokio::time::Instant::now() + Duration::from_secs(1);
        while q.len().await != 0 {
            assert!(tokio::time::Instant::now() < deadline, "watcher did not remove mailbox");
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }

    #[tokio::test]
    async fn test_close_drains_and_rejects_new_subscribers() {
        let q = SubjectQueue::new("prices", 16, EventBus::new(16));
        let seen = Arc::new(Mutex::new(Vec::new()));
        let m = q.subscribe(collecting(&seen)).await.unwrap();

        for n in 0..10u32 {
            q.publish(Message::new(n)).await;
        }
        tokio::join!(q.close(), q.close());

        assert_eq!(seen.lock().unwrap().len(), 10);
        assert_eq!(m.state(), mailbox::MailboxState::Closed);
        assert_eq!(q.len().await, 0);
        assert!(matches!(
            q.subscribe(collecting(&seen)).await,
            Err(PubSubError::Closed)
        ));
    }
}
