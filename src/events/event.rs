//! # Runtime events emitted by the hub, subject queues and mailboxes.
//!
//! The [`EventKind`] enum classifies event types across three categories:
//! - **Subscription events**: subject creation, subscribe/unsubscribe, drops, handler panics
//! - **Shutdown events**: close requested, subject closed, hub closed, deadline exceeded
//! - **Observer events**: overflow and panics inside observer workers
//!
//! The [`Event`] struct carries additional metadata such as timestamps, subject name,
//! subscription id and reasons.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases monotonically.
//! Use `seq` to restore the exact order when events are delivered out of order.
//!
//! ## Example
//! ```rust
//! use subjectbus::{Event, EventKind};
//!
//! let ev = Event::new(EventKind::HandlerPanicked)
//!     .with_subject("orders")
//!     .with_reason("boom");
//!
//! assert_eq!(ev.kind, EventKind::HandlerPanicked);
//! assert_eq!(ev.subject.as_deref(), Some("orders"));
//! assert_eq!(ev.reason.as_deref(), Some("boom"));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::{Duration, SystemTime};

use crate::core::SubscriptionId;

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of runtime events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Subscription events ===
    /// A subject queue was created lazily on first subscribe/publish.
    ///
    /// Sets:
    /// - `subject`: subject name
    SubjectCreated,

    /// A mailbox was registered and its delivery loop started.
    ///
    /// Sets:
    /// - `subject`: subject name
    /// - `subscription`: subscription id
    /// - `reason`: handler name
    Subscribed,

    /// A mailbox drained every accepted message and reached `Closed`.
    ///
    /// Sets:
    /// - `subject`: subject name
    /// - `subscription`: subscription id
    Unsubscribed,

    /// A message was dropped because its mailbox was draining or closed.
    ///
    /// Sets:
    /// - `subject`: subject name
    /// - `subscription`: subscription id
    /// - `reason`: mailbox state at drop time (`"draining"`, `"closed"`)
    MessageDropped,

    /// A handler panicked while processing a message; delivery continued.
    ///
    /// Sets:
    /// - `subject`: subject name
    /// - `subscription`: subscription id
    /// - `reason`: panic info/message
    HandlerPanicked,

    // === Shutdown events ===
    /// `close` was called for the first time; lifecycle moved to `Closing`.
    CloseRequested,

    /// Every mailbox of a subject was drained and the subject queue closed.
    ///
    /// Sets:
    /// - `subject`: subject name
    SubjectClosed,

    /// Teardown finished; lifecycle moved to `Closed`.
    Closed,

    /// A caller of `close` gave up waiting; teardown continues.
    ///
    /// Sets:
    /// - `deadline_ms`: how long the caller waited (ms)
    CloseDeadlineExceeded,

    // === Observer events ===
    /// Observer panicked during event processing.
    ///
    /// Sets:
    /// - `subject`: observer name
    /// - `reason`: panic info/message
    ObserverPanicked,

    /// Observer dropped an event (queue full or worker closed).
    ///
    /// Sets:
    /// - `subject`: observer name
    /// - `reason`: reason string (e.g., "full", "closed")
    ObserverOverflow,
}

/// Runtime event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,
    /// Subject name (or observer name for observer events).
    pub subject: Option<Arc<str>>,
    /// Subscription the event refers to, if any.
    pub subscription: Option<SubscriptionId>,
    /// Human-readable reason (panic info, drop details, etc.).
    pub reason: Option<Arc<str>>,
    /// Close wait in milliseconds (compact).
    pub deadline_ms: Option<u32>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            subject: None,
            subscription: None,
            reason: None,
            deadline_ms: None,
        }
    }

    /// Attaches a subject name.
    #[inline]
    pub fn with_subject(mut self, subject: impl Into<Arc<str>>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    /// Attaches a subscription id.
    #[inline]
    pub fn with_subscription(mut self, id: SubscriptionId) -> Self {
        self.subscription = Some(id);
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Attaches the close wait duration (stored as milliseconds).
    #[inline]
    pub fn with_deadline(mut self, d: Duration) -> Self {
        let ms = d.as_millis().min(u128::from(u32::MAX)) as u32;
        self.deadline_ms = Some(ms);
        self
    }

    /// Creates an observer overflow event.
    #[inline]
    pub fn observer_overflow(observer: &'static str, reason: &'static str) -> Self {
        Event::new(EventKind::ObserverOverflow)
            .with_subject(observer)
            .with_reason(format!("observer={observer} reason={reason}"))
    }

    /// Creates an observer panic event.
    #[inline]
    pub fn observer_panicked(observer: &'static str, info: String) -> Self {
        Event::new(EventKind::ObserverPanicked)
            .with_subject(observer)
            .with_reason(info)
    }

    #[inline]
    pub fn is_observer_overflow(&self) -> bool {
        matches!(self.kind, EventKind::ObserverOverflow)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seq_is_monotonic() {
        let a = Event::new(EventKind::CloseRequested);
        let b = Event::new(EventKind::Closed);
        assert!(b.seq > a.seq);
    }

    #[test]
    fn test_deadline_saturates() {
        let ev = Event::new(EventKind::CloseDeadlineExceeded)
            .with_deadline(Duration::from_secs(u64::MAX / 2));
        assert_eq!(ev.deadline_ms, Some(u32::MAX));
    }

    #[test]
    fn test_observer_overflow_helper() {
        let ev = Event::observer_overflow("metrics", "full");
        assert!(ev.is_observer_overflow());
        assert_eq!(ev.subject.as_deref(), Some("metrics"));
        assert_eq!(ev.reason.as_deref(), Some("observer=metrics reason=full"));
    }
}
