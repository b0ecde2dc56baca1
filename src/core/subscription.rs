//! # Subscription handle.
//!
//! [`Subscription`] is what `PubSub::subscribe` hands back to the caller. It is
//! the only way to leave a subject: [`Subscription::unsubscribe`] drains every
//! message already accepted for this subscription and then closes it. The
//! subject queue notices the close on its own and forgets the subscription.
//!
//! Dropping the handle does **not** unsubscribe; the subscription stays live
//! until `unsubscribe` or `PubSub::close`.

use std::fmt;
use std::sync::Arc;

use uuid::Uuid;

use super::mailbox::{Mailbox, MailboxState};

/// Opaque, unique identifier of a subscription.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(Uuid);

impl SubscriptionId {
    pub(crate) fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Returns the underlying UUID.
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// Handle to a live (or finished) subscription.
///
/// Cheap to clone; clones refer to the same mailbox.
#[derive(Clone)]
pub struct Subscription {
    mailbox: Arc<Mailbox>,
}

impl Subscription {
    pub(crate) fn new(mailbox: Arc<Mailbox>) -> Self {
        Self { mailbox }
    }

    /// Returns this subscription's identifier.
    pub fn id(&self) -> SubscriptionId {
        self.mailbox.id()
    }

    /// Returns the subject this subscription listens on.
    pub fn subject(&self) -> &str {
        self.mailbox.subject()
    }

    /// Returns the current mailbox state.
    pub fn state(&self) -> MailboxState {
        self.mailbox.state()
    }

    /// Returns `true` once the subscription has fully drained and closed.
    pub fn is_closed(&self) -> bool {
        self.state() == MailboxState::Closed
    }

    /// Number of accepted messages the handler has not finished yet.
    pub fn pending(&self) -> usize {
        self.mailbox.pending()
    }

    /// Leaves the subject after handling every message already accepted.
    ///
    /// Waits until the handler has processed every accepted message, then
    /// closes the mailbox. Idempotent: later or concurrent calls wait for the
    /// same close and never fail.
    ///
    /// Do not await this from inside this subscription's own handler; spawn it
    /// instead, since the message being handled counts as pending.
    pub async fn unsubscribe(&self) {
        self.mailbox.unsubscribe().await;
    }

    /// Waits until the subscription is closed by any party (`unsubscribe` or
    /// `PubSub::close`), without initiating anything.
    pub async fn closed(&self) {
        self.mailbox.closed().await;
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id())
            .field("subject", &self.subject())
            .field("state", &self.state())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_unique() {
        let a = SubscriptionId::new();
        let b = SubscriptionId::new();
        assert_ne!(a, b);
        assert_eq!(a.to_string(), a.as_uuid().to_string());
    }
}
