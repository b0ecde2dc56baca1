//! # Message handlers.
//!
//! This module defines the subscriber side of message delivery:
//! - [`Message`] — untyped, cheaply cloneable payload handed to handlers;
//! - [`Handler`] — async trait invoked once per delivered message;
//! - [`HandlerFn`] — closure-backed handler;
//! - [`HandlerRef`] — shared handle (`Arc<dyn Handler>`) used by the runtime.
//!
//! ## Delivery contract
//! ```text
//! publish(subject, msg) ──► SubjectQueue ──► [mailbox] ──► delivery loop ──► handler.handle(msg)
//!                                                                 └─► panic caught → HandlerPanicked
//! ```
//! - One delivery loop per subscription: a handler is never invoked concurrently
//!   with itself for the same subscription.
//! - Messages arrive in the order they were accepted into the mailbox.

mod handler;
mod handler_fn;
mod message;

pub use handler::{Handler, HandlerRef};
pub use handler_fn::HandlerFn;
pub use message::Message;
