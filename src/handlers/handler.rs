//! # Handler abstraction.
//!
//! A [`Handler`] receives every message delivered to one subscription, one at a
//! time, from a dedicated delivery loop. The common handle type is [`HandlerRef`],
//! an `Arc<dyn Handler>` suitable for sharing across the runtime.

use std::sync::Arc;

use async_trait::async_trait;

use super::message::Message;

/// Shared handle to a handler.
pub type HandlerRef = Arc<dyn Handler>;

/// # Asynchronous message handler.
///
/// Called from the subscription's delivery loop, not in the publisher context.
/// While a handler is running, further messages for the same subscription wait
/// in its mailbox; once the mailbox is full, publishers on that subject wait too.
///
/// Panics are caught; the runtime publishes `EventKind::HandlerPanicked` and
/// continues with the next message.
///
/// # Example
/// ```
/// use async_trait::async_trait;
/// use subjectbus::{Handler, Message};
///
/// struct Printer;
///
/// #[async_trait]
/// impl Handler for Printer {
///     async fn handle(&self, msg: Message) {
///         if let Some(n) = msg.downcast_ref::<u64>() {
///             println!("got {n}");
///         }
///     }
///
///     fn name(&self) -> &str { "printer" }
/// }
/// ```
#[async_trait]
pub trait Handler: Send + Sync + 'static {
    /// Processes a single message.
    async fn handle(&self, msg: Message);

    /// Returns the handler name used in events.
    ///
    /// The default uses `type_name::<Self>()`, which can be verbose - override it when possible.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}
