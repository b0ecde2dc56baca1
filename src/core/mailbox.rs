//! # Mailbox: per-subscription bounded queue and delivery loop.
//!
//! Every subscription owns exactly one [`Mailbox`]: a bounded FIFO, a
//! three-state lifecycle ([`MailboxState`]) and an in-flight counter, plus one
//! spawned delivery loop that invokes the handler message by message.
//!
//! ## Architecture
//! ```text
//! send(msg) ──► reserve slot ──► [bounded FIFO] ──► delivery loop ──► handler.handle(msg)
//!   │            (waits while        (capacity)          │                 └─► panic → HandlerPanicked
//!   │             full)                                   └─► inflight -= 1
//!   └─► not Running → dropped (MessageDropped)
//!
//! unsubscribe():
//!   Running ──► Draining ──► (inflight == 0) ──► Closed ──► loop exits
//! ```
//!
//! ## Rules
//! - **Per-mailbox FIFO**: messages reach the handler in acceptance order.
//! - **Single consumer**: the handler never runs concurrently with itself.
//! - **Backpressure**: `send` waits while the buffer is full and the mailbox is open.
//! - **Drain-before-close**: `Closed` is entered only once every accepted message
//!   has been handled.
//! - **Silent drop**: a message offered to a draining/closed mailbox is discarded;
//!   the publisher is not told.
//!
//! Accepting a message and counting it in flight happen under the state read
//! lock, so the `Running → Draining` transition can never slip between them.

use std::fmt;
use std::sync::Arc;

use futures::FutureExt;
use tokio::sync::{mpsc, watch};

use super::inflight::Inflight;
use super::subscription::SubscriptionId;
use crate::error::panic_info;
use crate::events::{Event, EventBus, EventKind};
use crate::handlers::{HandlerRef, Message};

/// Lifecycle of a single subscription's mailbox.
///
/// Monotonic: `Running → Draining → Closed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MailboxState {
    /// Accepting and delivering messages.
    Running,
    /// Unsubscribe in progress: no new messages accepted, queued ones still delivered.
    Draining,
    /// Every accepted message handled; the delivery loop has been told to stop.
    Closed,
}

impl MailboxState {
    /// Returns a short lowercase name for logs and events.
    pub fn as_str(&self) -> &'static str {
        match self {
            MailboxState::Running => "running",
            MailboxState::Draining => "draining",
            MailboxState::Closed => "closed",
        }
    }
}

impl fmt::Display for MailboxState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub(crate) struct Mailbox {
    id: SubscriptionId,
    subject: Arc<str>,
    tx: mpsc::Sender<Message>,
    state: watch::Sender<MailboxState>,
    inflight: Arc<Inflight>,
    bus: EventBus,
}

impl Mailbox {
    /// Creates a mailbox and spawns its delivery loop.
    ///
    /// Must be called from within a tokio runtime.
    pub(crate) fn spawn(
        subject: Arc<str>,
        handler: HandlerRef,
        capacity: usize,
        bus: EventBus,
    ) -> Arc<Self> {
        let id = SubscriptionId::new();
        let (tx, rx) = mpsc::channel::<Message>(capacity.max(1));
        let (state, state_rx) = watch::channel(MailboxState::Running);
        let inflight = Arc::new(Inflight::new());

        bus.publish(
            Event::new(EventKind::Subscribed)
                .with_subject(Arc::clone(&subject))
                .with_subscription(id)
                .with_reason(handler.name()),
        );

        let delivery = Delivery {
            id,
            subject: Arc::clone(&subject),
            handler,
            state: state_rx,
            inflight: Arc::clone(&inflight),
            bus: bus.clone(),
        };
        tokio::spawn(delivery.run(rx));

        Arc::new(Self {
            id,
            subject,
            tx,
            state,
            inflight,
            bus,
        })
    }

    pub(crate) fn id(&self) -> SubscriptionId {
        self.id
    }

    pub(crate) fn subject(&self) -> &str {
        &self.subject
    }

    pub(crate) fn state(&self) -> MailboxState {
        *self.state.borrow()
    }

    pub(crate) fn pending(&self) -> usize {
        self.inflight.get()
    }

    /// Returns a receiver that observes state transitions.
    pub(crate) fn watch_state(&self) -> watch::Receiver<MailboxState> {
        self.state.subscribe()
    }

    /// Offers a message to this mailbox.
    ///
    /// Waits while the buffer is full. Drops the message silently if the
    /// mailbox is draining or closed (before or after the wait).
    pub(crate) async fn send(&self, msg: Message) {
        let current = self.state();
        if current != MailboxState::Running {
            self.report_drop(current);
            return;
        }

        let permit = match self.tx.reserve().await {
            Ok(permit) => permit,
            Err(_) => {
                self.report_drop(MailboxState::Closed);
                return;
            }
        };

        let accepted = {
            let state = self.state.borrow();
            if *state == MailboxState::Running {
                self.inflight.add();
                Ok(())
            } else {
                Err(*state)
            }
        };

        match accepted {
            Ok(()) => permit.send(msg),
            Err(state) => self.report_drop(state),
        }
    }

    /// Drains every accepted message, then closes the mailbox.
    ///
    /// The first call starts the drain; every call (first or later) returns
    /// once the mailbox is `Closed`. The drain runs in its own task, so
    /// dropping this future does not leave the mailbox stuck in `Draining`.
    ///
    /// Awaiting this from inside the same subscription's handler never
    /// completes: the message being handled is itself in flight.
    pub(crate) async fn unsubscribe(self: &Arc<Self>) {
        let started = self.state.send_if_modified(|s| {
            if *s == MailboxState::Running {
                *s = MailboxState::Draining;
                true
            } else {
                false
            }
        });

        if started {
            let me = Arc::clone(self);
            tokio::spawn(async move {
                me.inflight.wait_zero().await;
                // Announce first: waiters on `Closed` publish their own completion events.
                me.bus.publish(
                    Event::new(EventKind::Unsubscribed)
                        .with_subject(Arc::clone(&me.subject))
                        .with_subscription(me.id),
                );
                me.state.send_replace(MailboxState::Closed);
            });
        }

        self.closed().await;
    }

    /// Waits until the mailbox reaches `Closed`.
    pub(crate) async fn closed(&self) {
        wait_closed(&mut self.state.subscribe()).await;
    }

    fn report_drop(&self, state: MailboxState) {
        self.bus.publish(
            Event::new(EventKind::MessageDropped)
                .with_subject(Arc::clone(&self.subject))
                .with_subscription(self.id)
                .with_reason(state.as_str()),
        );
    }
}

/// Waits until the observed mailbox reaches `Closed` or its owner is dropped.
pub(crate) async fn wait_closed(rx: &mut watch::Receiver<MailboxState>) {
    let _ = rx.wait_for(|s| *s == MailboxState::Closed).await;
}

/// State owned by the spawned delivery loop.
struct Delivery {
    id: SubscriptionId,
    subject: Arc<str>,
    handler: HandlerRef,
    state: watch::Receiver<MailboxState>,
    inflight: Arc<Inflight>,
    bus: EventBus,
}

impl Delivery {
    async fn run(mut self, mut rx: mpsc::Receiver<Message>) {
        loop {
            let msg = tokio::select! {
                biased;
                _ = wait_closed(&mut self.state) => break,
                msg = rx.recv() => match msg {
                    Some(msg) => msg,
                    None => break,
                },
            };

            self.invoke(msg).await;
            self.inflight.done();
        }
    }

    async fn invoke(&self, msg: Message) {
        let fut = self.handler.handle(msg);
        if let Err(panic_err) = std::panic::AssertUnwindSafe(fut).catch_unwind().await {
            self.bus.publish(
                Event::new(EventKind::HandlerPanicked)
                    .with_subject(Arc::clone(&self.subject))
                    .with_subscription(self.id)
                    .with_reason(panic_info(&*panic_err)),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use tokio::sync::Semaphore;

    use super::*;
    use crate::handlers::HandlerFn;

    fn recorder() -> (HandlerRef, Arc<Mutex<Vec<u32>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let s = Arc::clone(&seen);
        let h: HandlerRef = HandlerFn::arc("recorder", move |msg: Message| {
            let s = Arc::clone(&s);
            async move {
                if let Some(n) = msg.downcast_ref::<u32>() {
                    s.lock().unwrap().push(*n);
                }
            }
        });
        (h, seen)
    }

    #[tokio::test]
    async fn test_delivers_in_order_and_drains_on_unsubscribe() {
        let (h, seen) = recorder();
        let mb = Mailbox::spawn("orders".into(), h, 100, EventBus::new(16));

        for n in 1..=50u32 {
            mb.send(Message::new(n)).await;
        }
        mb.unsubscribe().await;

        assert_eq!(*seen.lock().unwrap(), (1..=50).collect::<Vec<_>>());
        assert_eq!(mb.state(), MailboxState::Closed);
        assert_eq!(mb.pending(), 0);
    }

    #[tokio::test]
    async fn test_send_after_close_is_dropped() {
        let bus = EventBus::new(64);
        let mut events = bus.subscribe();
        let (h, seen) = recorder();
        let mb = Mailbox::spawn("orders".into(), h, 4, bus);

        mb.unsubscribe().await;
        mb.send(Message::new(7u32)).await;

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(seen.lock().unwrap().is_empty());

        let mut dropped = false;
        while let Ok(ev) = events.try_recv() {
            if ev.kind == EventKind::MessageDropped {
                assert_eq!(ev.reason.as_deref(), Some("closed"));
                dropped = true;
            }
        }
        assert!(dropped);
    }

    fn gated(gate: &Arc<Semaphore>, handled: &Arc<AtomicUsize>) -> HandlerRef {
        let gate = Arc::clone(gate);
        let handled = Arc::clone(handled);
        HandlerFn::arc("gated", move |_msg: Message| {
            let gate = Arc::clone(&gate);
            let handled = Arc::clone(&handled);
            async move {
                if let Ok(p) = gate.acquire().await {
                    p.forget();
                }
                handled.fetch_add(1, Ordering::SeqCst);
            }
        })
    }

    async fn wait_for_state(mb: &Mailbox, want: MailboxState) {
        tokio::time::timeout(Duration::from_secs(1), async {
            while mb.state() != want {
                tokio::task::yield_now().await;
            }
        })
        .await
        .expect("mailbox did not reach the expected state");
    }

    #[tokio::test]
    async fn test_send_while_draining_is_dropped() {
        let bus = EventBus::new(64);
        let mut events = bus.subscribe();
        let gate = Arc::new(Semaphore::new(0));
        let handled = Arc::new(AtomicUsize::new(0));
        let mb = Mailbox::spawn("orders".into(), gated(&gate, &handled), 4, bus);

        mb.send(Message::new(1u32)).await;
        let leaving = {
            let mb = Arc::clone(&mb);
            tokio::spawn(async move { mb.unsubscribe().await })
        };
        wait_for_state(&mb, MailboxState::Draining).await;

        mb.send(Message::new(2u32)).await;
        assert_eq!(mb.pending(), 1);

        gate.add_permits(10);
        leaving.await.unwrap();
        assert_eq!(handled.load(Ordering::SeqCst), 1);

        let mut reasons = Vec::new();
        while let Ok(ev) = events.try_recv() {
            if ev.kind == EventKind::MessageDropped {
                reasons.push(ev.reason.as_deref().map(str::to_owned));
            }
        }
        assert_eq!(reasons, vec![Some("draining".to_string())]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_drain_finishes_under_continuous_publish() {
        let handled = Arc::new(AtomicUsize::new(0));
        let h: HandlerRef = {
            let handled = Arc::clone(&handled);
            HandlerFn::arc("busy", move |_msg: Message| {
                let handled = Arc::clone(&handled);
                async move {
                    tokio::task::yield_now().await;
                    handled.fetch_add(1, Ordering::SeqCst);
                }
            })
        };
        let mb = Mailbox::spawn("busy".into(), h, 4, EventBus::new(16));

        let publisher = {
            let mb = Arc::clone(&mb);
            tokio::spawn(async move {
                let mut n = 0u32;
                while mb.state() != MailboxState::Closed {
                    mb.send(Message::new(n)).await;
                    n = n.wrapping_add(1);
                    tokio::task::yield_now().await;
                }
            })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;

        tokio::time::timeout(Duration::from_secs(2), mb.unsubscribe())
            .await
            .expect("drain must finish while the publisher keeps sending");
        assert_eq!(mb.state(), MailboxState::Closed);
        assert_eq!(mb.pending(), 0);
        assert!(handled.load(Ordering::SeqCst) > 0);

        tokio::time::timeout(Duration::from_secs(1), publisher)
            .await
            .expect("publisher stops once the mailbox is closed")
            .unwrap();
    }

    #[tokio::test]
    async fn test_dropped_unsubscribe_still_closes() {
        let gate = Arc::new(Semaphore::new(0));
        let handled = Arc::new(AtomicUsize::new(0));
        let mb = Mailbox::spawn("orders".into(), gated(&gate, &handled), 4, EventBus::new(16));

        mb.send(Message::new(1u32)).await;
        let waited = tokio::time::timeout(Duration::from_millis(20), mb.unsubscribe()).await;
        assert!(waited.is_err(), "drain waits for the parked handler");
        assert_eq!(mb.state(), MailboxState::Draining);

        gate.add_permits(1);
        tokio::time::timeout(Duration::from_secs(1), mb.closed())
            .await
            .expect("drain continues after the caller gave up");
        assert_eq!(mb.state(), MailboxState::Closed);
        assert_eq!(handled.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_unsubscribe_is_idempotent() {
        let (h, _seen) = recorder();
        let mb = Mailbox::spawn("orders".into(), h, 4, EventBus::new(16));

        tokio::join!(mb.unsubscribe(), mb.unsubscribe());
        mb.unsubscribe().await;
        assert_eq!(mb.state(), MailboxState::Closed);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_full_buffer_blocks_sender() {
        let gate = Arc::new(Semaphore::new(0));
        let handled = Arc::new(AtomicUsize::new(0));

        let h: HandlerRef = {
            let gate = Arc::clone(&gate);
            let handled = Arc::clone(&handled);
            HandlerFn::arc("slow", move |_msg: Message| {
                let gate = Arc::clone(&gate);
                let handled = Arc::clone(&handled);
                async move {
                    if let Ok(p) = gate.acquire().await {
                        p.forget();
                    }
                    handled.fetch_add(1, Ordering::SeqCst);
                }
            })
        };
        let mb = Mailbox::spawn("slow".into(), h, 2, EventBus::new(16));

        // One message is taken by the loop (stuck in the handler), two fill the buffer.
        for n in 0..3u32 {
            mb.send(Message::new(n)).await;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;

        let blocked = tokio::time::timeout(Duration::from_millis(50), mb.send(Message::new(3u32))).await;
        assert!(blocked.is_err(), "send must wait while the buffer is full");

        gate.add_permits(1);
        tokio::time::timeout(Duration::from_secs(1), mb.send(Message::new(4u32)))
            .await
            .expect("send must proceed once a slot frees up");

        gate.add_permits(100);
        mb.unsubscribe().await;
        assert_eq!(handled.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_panicking_handler_does_not_stop_delivery() {
        let bus = EventBus::new(64);
        let mut events = bus.subscribe();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let s = Arc::clone(&seen);
        let h: HandlerRef = HandlerFn::arc("flaky", move |msg: Message| {
            let s = Arc::clone(&s);
            async move {
                let n = *msg.downcast_ref::<u32>().unwrap();
                if n == 2 {
                    panic!("bad message {n}");
                }
                s.lock().unwrap().push(n);
            }
        });
        let mb = Mailbox::spawn("flaky".into(), h, 8, bus);

        for n in 1..=3u32 {
            mb.send(Message::new(n)).await;
        }
        mb.unsubscribe().await;

        assert_eq!(*seen.lock().unwrap(), vec![1, 3]);

        let mut panicked = None;
        while let Ok(ev) = events.try_recv() {
            if ev.kind == EventKind::HandlerPanicked {
                panicked = ev.reason.clone();
            }
        }
        assert_eq!(panicked.as_deref(), Some("bad message 2"));
    }
}
