//! # Custom Observer Example
//!
//! Shows how to implement a custom event observer that counts hub activity,
//! while two subscriptions consume messages at different speeds.
//!
//! ## Run
//! ```bash
//! cargo run --example observer
//! ```

use std::{
    sync::Arc,
    sync::atomic::{AtomicU64, Ordering},
    time::Duration,
};

use subjectbus::{Event, EventKind, Message, Observe, PubSub, PubSubConfig};
use tokio::sync::Notify;

#[derive(Default)]
struct Counters {
    subscribed: AtomicU64,
    unsubscribed: AtomicU64,
    panics: AtomicU64,
    closed: Notify,
}

impl Counters {
    fn print_stats(&self) {
        println!();
        println!("Events:");
        println!(" ├─► Subscribed:   {}", self.subscribed.load(Ordering::Relaxed));
        println!(" ├─► Unsubscribed: {}", self.unsubscribed.load(Ordering::Relaxed));
        println!(" └─► Panics:       {}", self.panics.load(Ordering::Relaxed));
    }
}

#[async_trait::async_trait]
impl Observe for Counters {
    async fn on_event(&self, ev: &Event) {
        match ev.kind {
            EventKind::Subscribed => {
                self.subscribed.fetch_add(1, Ordering::Relaxed);
            }
            EventKind::Unsubscribed => {
                self.unsubscribed.fetch_add(1, Ordering::Relaxed);
            }
            EventKind::HandlerPanicked => {
                self.panics.fetch_add(1, Ordering::Relaxed);
            }
            // Last event of the hub; everything before it was already counted.
            EventKind::Closed => self.closed.notify_one(),
            _ => {}
        }
    }

    fn name(&self) -> &'static str {
        "counters"
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let counters = Arc::new(Counters::default());
    let cfg = PubSubConfig {
        mailbox_capacity: 8,
        ..PubSubConfig::default()
    };
    let hub = PubSub::builder(cfg)
        .with_observers(vec![counters.clone() as Arc<dyn Observe>])
        .build();

    let _fast = hub
        .subscribe_fn("orders", |msg: Message| async move {
            if let Some(id) = msg.downcast_ref::<u32>() {
                println!("[fast] order {id}");
            }
        })
        .await?;

    let _slow = hub
        .subscribe_fn("orders", |msg: Message| async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            let id = msg.downcast_ref::<u32>().copied().unwrap_or_default();
            if id == 13 {
                panic!("unlucky order {id}");
            }
            println!("[slow] order {id}");
        })
        .await?;

    // Publishing is paced by the slow subscriber once its mailbox fills up.
    for id in 0..32u32 {
        hub.publish("orders", id).await?;
    }

    hub.close(Duration::from_secs(5)).await?;
    counters.closed.notified().await;
    counters.print_stats();
    Ok(())
}
