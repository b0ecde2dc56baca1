//! # In-flight counter (wait-for-zero).
//!
//! Counts messages accepted into a mailbox but not yet handled. The mailbox
//! drain waits on [`Inflight::wait_zero`] before moving to `Closed`.
//!
//! Backed by a `watch` channel so waiters never miss the transition to zero.

use tokio::sync::watch;

#[derive(Debug)]
pub(crate) struct Inflight {
    count: watch::Sender<usize>,
}

impl Inflight {
    pub(crate) fn new() -> Self {
        let (count, _rx) = watch::channel(0usize);
        Self { count }
    }

    /// Records one accepted message.
    pub(crate) fn add(&self) {
        self.count.send_modify(|n| *n += 1);
    }

    /// Records one handled message.
    pub(crate) fn done(&self) {
        self.count.send_modify(|n| *n = n.saturating_sub(1));
    }

    /// Current number of accepted-but-unhandled messages.
    pub(crate) fn get(&self) -> usize {
        *self.count.borrow()
    }

    /// Waits until the counter reaches zero.
    pub(crate) async fn wait_zero(&self) {
        let mut rx = self.count.subscribe();
        // Sender is owned by `self`, so the channel cannot close while we wait.
        let _ = rx.wait_for(|n| *n == 0).await;
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn test_wait_zero_returns_immediately_when_idle() {
        let c = Inflight::new();
        tokio::time::timeout(Duration::from_millis(100), c.wait_zero())
            .await
            .expect("idle counter must not block");
    }

    #[tokio::test]
    async fn test_wait_zero_blocks_until_done() {
        let c = Arc::new(Inflight::new());
        c.add();
        c.add();
        assert_eq!(c.get(), 2);

        let waiter = {
            let c = Arc::clone(&c);
            tokio::spawn(async move { c.wait_zero().await })
        };

        c.done();
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());

        c.done();
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("waiter must finish")
            .unwrap();
        assert_eq!(c.get(), 0);
    }
}
