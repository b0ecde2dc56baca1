//! Runtime core: hub, subject queues, mailboxes and shutdown.
//!
//! The public API from this module is [`PubSub`] (plus its builder, config,
//! lifecycle and the [`Subscription`] handle). Everything else is wiring.
//!
//! Internal modules:
//! - [`hub`]: subject map, lazy subject creation, lifecycle, `close`;
//! - [`subject`]: per-subject set of mailboxes and fan-out;
//! - [`mailbox`]: bounded per-subscription queue and delivery loop;
//! - [`inflight`]: wait-for-zero counter backing drain-before-close;
//! - [`shutdown`]: detached teardown run by the first `close`;
//! - [`subscription`]: caller-facing handle and subscription ids.
//!
//! ```text
//! PubSub ──► SubjectQueue ("orders") ──┬──► Mailbox #1 ──► loop ──► handler
//!        │                             └──► Mailbox #2 ──► loop ──► handler
//!        └─► SubjectQueue ("prices")  ──────► Mailbox #3 ──► loop ──► handler
//! ```

mod builder;
mod config;
mod hub;
mod inflight;
mod mailbox;
mod shutdown;
mod subject;
mod subscription;

pub use builder::PubSubBuilder;
pub use config::PubSubConfig;
pub use hub::{Lifecycle, PubSub};
pub use mailbox::MailboxState;
pub use subscription::{Subscription, SubscriptionId};
