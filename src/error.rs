//! Error types returned by the pub/sub hub.
//!
//! The surface is intentionally small:
//!
//! - [`PubSubError::Closed`] — `subscribe`/`publish` after teardown has begun.
//! - [`PubSubError::DeadlineExceeded`] — the caller of `close` stopped waiting;
//!   teardown itself keeps running in the background.
//!
//! Handler failures are never surfaced here. A panicking handler is reported as
//! an [`EventKind::HandlerPanicked`](crate::EventKind::HandlerPanicked) event and
//! delivery continues with the next message.

use std::time::Duration;
use thiserror::Error;

/// # Errors produced by the pub/sub hub.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PubSubError {
    /// The hub is closing or closed; the operation was rejected.
    #[error("pubsub is closed")]
    Closed,

    /// `close` did not observe completion before the caller's deadline.
    ///
    /// Teardown is not aborted: every mailbox is still drained and closed.
    #[error("close deadline exceeded after {waited:?}; teardown continues in background")]
    DeadlineExceeded {
        /// How long the caller waited before giving up.
        waited: Duration,
    },
}

impl PubSubError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use subjectbus::PubSubError;
    ///
    /// assert_eq!(PubSubError::Closed.as_label(), "pubsub_closed");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            PubSubError::Closed => "pubsub_closed",
            PubSubError::DeadlineExceeded { .. } => "pubsub_close_deadline_exceeded",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            PubSubError::Closed => "pubsub is closed".to_string(),
            PubSubError::DeadlineExceeded { waited } => {
                format!("close still running after {waited:?}")
            }
        }
    }

    /// Indicates whether this is the [`PubSubError::Closed`] sentinel.
    pub fn is_closed(&self) -> bool {
        matches!(self, PubSubError::Closed)
    }
}

/// Extracts a readable message from a caught panic payload.
pub(crate) fn panic_info(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}
