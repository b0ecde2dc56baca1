//! # Untyped message payload.
//!
//! Publishers and subscribers agree on the payload type out-of-band; the bus
//! never inspects it. A [`Message`] is allocated once per publish and fan-out
//! clones the reference, never the payload.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Type-erased, shareable message payload.
///
/// # Example
/// ```
/// use subjectbus::Message;
///
/// let msg = Message::new(42u32);
/// assert!(msg.is::<u32>());
/// assert_eq!(msg.downcast_ref::<u32>(), Some(&42));
/// assert!(msg.downcast_ref::<String>().is_none());
/// ```
#[derive(Clone)]
pub struct Message {
    payload: Arc<dyn Any + Send + Sync>,
}

impl Message {
    /// Wraps a value into a message.
    ///
    /// Passing a `Message` here nests it; use `PubSub::publish_message` to
    /// forward an existing message.
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self {
            payload: Arc::new(value),
        }
    }

    /// Returns `true` if the payload is of type `T`.
    #[inline]
    pub fn is<T: Any>(&self) -> bool {
        self.payload.is::<T>()
    }

    /// Borrows the payload as `T`, if it is one.
    #[inline]
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.payload.downcast_ref::<T>()
    }

    /// Returns a shared handle to the payload as `T`, if it is one.
    pub fn downcast<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        Arc::clone(&self.payload).downcast::<T>().ok()
    }
}

impl fmt::Debug for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Message").finish_non_exhaustive()
    }
}
