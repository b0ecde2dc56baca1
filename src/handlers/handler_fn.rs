//! # Function-backed handler (`HandlerFn`)
//!
//! [`HandlerFn`] wraps a closure `F: Fn(Message) -> Fut`, producing a fresh
//! future per delivered message. If the closure needs shared state, capture an
//! `Arc<...>` explicitly.
//!
//! ## Example
//! ```rust
//! use subjectbus::{Handler, HandlerFn, HandlerRef, Message};
//!
//! let h: HandlerRef = HandlerFn::arc("audit", |msg: Message| async move {
//!     let _ = msg.downcast_ref::<String>();
//! });
//!
//! assert_eq!(h.name(), "audit");
//! ```

use std::borrow::Cow;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;

use super::handler::Handler;
use super::message::Message;

/// Function-backed handler implementation.
#[derive(Debug)]
pub struct HandlerFn<F> {
    name: Cow<'static, str>,
    f: F,
}

impl<F> HandlerFn<F> {
    /// Creates a new function-backed handler.
    ///
    /// Prefer [`HandlerFn::arc`] when you immediately need a [`HandlerRef`](super::HandlerRef).
    pub fn new(name: impl Into<Cow<'static, str>>, f: F) -> Self {
        Self { name: name.into(), f }
    }

    /// Creates the handler and returns it as a shared handle.
    pub fn arc(name: impl Into<Cow<'static, str>>, f: F) -> Arc<Self> {
        Arc::new(Self::new(name, f))
    }
}

#[async_trait]
impl<F, Fut> Handler for HandlerFn<F>
where
    F: Fn(Message) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    async fn handle(&self, msg: Message) {
        (self.f)(msg).await
    }

    fn name(&self) -> &str {
        &self.name
    }
}
