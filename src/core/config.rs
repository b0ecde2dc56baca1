//! # Hub configuration.
//!
//! Provides [`PubSubConfig`], the settings consumed by [`PubSubBuilder`](crate::PubSubBuilder).
//!
//! ## Sentinel values
//! - `mailbox_capacity = 0` → clamped to 1 (a mailbox always holds at least one message)
//! - `event_capacity = 0` → clamped to 1

/// Configuration for a [`PubSub`](crate::PubSub) hub.
///
/// ## Field semantics
/// - `mailbox_capacity`: per-subscription buffer size; publishers wait once it is full
/// - `event_capacity`: runtime event ring buffer size (min 1; clamped by `EventBus`)
#[derive(Clone, Debug)]
pub struct PubSubConfig {
    /// Number of messages a single subscription may hold before publishers wait.
    ///
    /// This is the only flow-control knob: a publish on a subject takes as long
    /// as its slowest live subscriber needs to free a slot.
    pub mailbox_capacity: usize,

    /// Capacity of the runtime event broadcast channel ring buffer.
    ///
    /// Event receivers that lag behind more than `event_capacity` events
    /// receive `Lagged` and skip older items. Message delivery is unaffected.
    pub event_capacity: usize,
}

impl PubSubConfig {
    /// Returns the mailbox capacity clamped to a minimum of 1.
    #[inline]
    pub fn mailbox_capacity_clamped(&self) -> usize {
        self.mailbox_capacity.max(1)
    }

    /// Returns the event capacity clamped to a minimum of 1.
    #[inline]
    pub fn event_capacity_clamped(&self) -> usize {
        self.event_capacity.max(1)
    }
}

impl Default for PubSubConfig {
    /// Default configuration:
    ///
    /// - `mailbox_capacity = 100`
    /// - `event_capacity = 1024`
    fn default() -> Self {
        Self {
            mailbox_capacity: 100,
            event_capacity: 1024,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = PubSubConfig::default();
        assert_eq!(cfg.mailbox_capacity, 100);
        assert_eq!(cfg.event_capacity, 1024);
    }

    #[test]
    fn test_zero_is_clamped() {
        let cfg = PubSubConfig {
            mailbox_capacity: 0,
            event_capacity: 0,
        };
        assert_eq!(cfg.mailbox_capacity_clamped(), 1);
        assert_eq!(cfg.event_capacity_clamped(), 1);
    }
}
