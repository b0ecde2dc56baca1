use std::sync::Arc;

use tokio::sync::{broadcast, watch};

use crate::{
    core::PubSubConfig,
    events::{Event, EventBus, EventKind},
    observers::{Observe, ObserverSet},
};
use super::hub::{Lifecycle, PubSub};

/// Builder for constructing a [`PubSub`] hub with optional observers.
pub struct PubSubBuilder {
    cfg: PubSubConfig,
    observers: Vec<Arc<dyn Observe>>,
}

impl PubSubBuilder {
    /// Creates a new builder with the given configuration.
    pub fn new(cfg: PubSubConfig) -> Self {
        Self {
            cfg,
            observers: Vec::new(),
        }
    }

    /// Sets runtime event observers.
    ///
    /// Observers receive hub events (subjects, subscriptions, drops, panics,
    /// shutdown) through dedicated workers with bounded queues. They never
    /// slow down message delivery.
    pub fn with_observers(mut self, observers: Vec<Arc<dyn Observe>>) -> Self {
        self.observers = observers;
        self
    }

    /// Builds and returns the hub.
    ///
    /// When observers are configured this spawns their workers and the event
    /// listener, so it must then be called from within a tokio runtime.
    pub fn build(self) -> Arc<PubSub> {
        let bus = EventBus::new(self.cfg.event_capacity_clamped());
        let hub = Arc::new(PubSub::new_internal(self.cfg, bus.clone()));
        if !self.observers.is_empty() {
            let set = ObserverSet::new(self.observers, bus.clone());
            Self::observer_listener(set, bus.subscribe(), hub.watch_lifecycle());
        }
        hub
    }

    /// Forwards bus events to the observer set.
    ///
    /// Stops after the hub's `Closed` event, or once the hub is dropped
    /// without closing and the buffered events are forwarded.
    fn observer_listener(
        set: ObserverSet,
        mut rx: broadcast::Receiver<Event>,
        mut lifecycle: watch::Receiver<Lifecycle>,
    ) {
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    biased;
                    res = rx.recv() => match res {
                        Ok(ev) => {
                            set.emit(&ev);
                            if ev.kind == EventKind::Closed {
                                break;
                            }
                        }
                        Err(broadcast::error::RecvError::Lagged(_)) => continue,
                        Err(broadcast::error::RecvError::Closed) => break,
                    },
                    gone = lifecycle.changed() => {
                        if gone.is_err() {
                            break;
                        }
                    }
                }
            }
            set.shutdown().await;
        });
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;

    use super::*;
    use crate::handlers::Message;

    struct Recorder {
        kinds: Arc<Mutex<Vec<EventKind>>>,
        drops: Arc<AtomicUsize>,
    }

    impl Drop for Recorder {
        fn drop(&mut self) {
            self.drops.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[async_trait]
    impl Observe for Recorder {
        async fn on_event(&self, event: &Event) {
            self.kinds.lock().unwrap().push(event.kind);
        }
        fn name(&self) -> &'static str {
            "recorder"
        }
    }

    fn recorder() -> (Arc<dyn Observe>, Arc<Mutex<Vec<EventKind>>>, Arc<AtomicUsize>) {
        let kinds = Arc::new(Mutex::new(Vec::new()));
        let drops = Arc::new(AtomicUsize::new(0));
        let obs = Recorder {
            kinds: Arc::clone(&kinds),
            drops: Arc::clone(&drops),
        };
        (Arc::new(obs), kinds, drops)
    }

    async fn wait_until(cond: impl Fn() -> bool) {
        tokio::time::timeout(Duration::from_secs(2), async {
            while !cond() {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("condition not reached in time");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_observer_sees_children_close_before_hub() {
        for _ in 0..50 {
            let (obs, kinds, drops) = recorder();
            let hub = PubSub::builder(PubSubConfig::default())
                .with_observers(vec![obs])
                .build();

            let _sub = hub
                .subscribe_fn("orders", |_msg: Message| async {})
                .await
                .unwrap();
            hub.close(Duration::from_secs(1)).await.unwrap();

            // Listener exits after `Closed`; workers finish, then drop the observer.
            wait_until(|| drops.load(Ordering::SeqCst) == 1).await;
            assert_eq!(
                *kinds.lock().unwrap(),
                vec![
                    EventKind::SubjectCreated,
                    EventKind::Subscribed,
                    EventKind::CloseRequested,
                    EventKind::Unsubscribed,
                    EventKind::SubjectClosed,
                    EventKind::Closed,
                ]
            );
        }
    }

    #[tokio::test]
    async fn test_listener_stops_when_hub_dropped_without_close() {
        let (obs, kinds, drops) = recorder();
        let hub = PubSub::builder(PubSubConfig::default())
            .with_observers(vec![obs])
            .build();
        hub.publish("orders", 1u32).await.unwrap();

        drop(hub);

        wait_until(|| drops.load(Ordering::SeqCst) == 1).await;
        assert_eq!(*kinds.lock().unwrap(), vec![EventKind::SubjectCreated]);
    }
}
