//! # LogWriter — simple event printer
//!
//! A minimal observer that prints incoming [`Event`]s to stdout.
//! Use it for tests or demos.
//!
//! ## Example output
//! ```text
//! [subject-created] subject="orders"
//! [subscribed] subject="orders" id=6a1f… handler="audit"
//! [dropped] subject="orders" id=6a1f… state="draining"
//! [handler-panicked] subject="orders" id=6a1f… info="boom"
//! [close-requested]
//! [unsubscribed] subject="orders" id=6a1f…
//! [subject-closed] subject="orders"
//! [closed]
//! ```

use async_trait::async_trait;

use crate::events::{Event, EventKind};
use crate::observers::Observe;

/// Event writer observer.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    fn line(e: &Event) -> String {
        let subject = e.subject.as_deref().unwrap_or("-");
        let id = e
            .subscription
            .map(|id| id.to_string())
            .unwrap_or_else(|| "-".to_string());
        let reason = e.reason.as_deref().unwrap_or("-");

        match e.kind {
            EventKind::SubjectCreated => format!("[subject-created] subject={subject:?}"),
            EventKind::Subscribed => {
                format!("[subscribed] subject={subject:?} id={id} handler={reason:?}")
            }
            EventKind::Unsubscribed => format!("[unsubscribed] subject={subject:?} id={id}"),
            EventKind::MessageDropped => {
                format!("[dropped] subject={subject:?} id={id} state={reason:?}")
            }
            EventKind::HandlerPanicked => {
                format!("[handler-panicked] subject={subject:?} id={id} info={reason:?}")
            }
            EventKind::CloseRequested => "[close-requested]".to_string(),
            EventKind::SubjectClosed => format!("[subject-closed] subject={subject:?}"),
            EventKind::Closed => "[closed]".to_string(),
            EventKind::CloseDeadlineExceeded => format!(
                "[close-deadline-exceeded] waited_ms={}",
                e.deadline_ms.unwrap_or_default()
            ),
            EventKind::ObserverOverflow => {
                format!("[observer-overflow] observer={subject} reason={reason}")
            }
            EventKind::ObserverPanicked => {
                format!("[observer-panicked] observer={subject} info={reason}")
            }
        }
    }
}

#[async_trait]
impl Observe for LogWriter {
    async fn on_event(&self, e: &Event) {
        println!("{}", Self::line(e));
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_format() {
        let ev = Event::new(EventKind::MessageDropped)
            .with_subject("orders")
            .with_reason("closed");
        assert_eq!(
            LogWriter::line(&ev),
            "[dropped] subject=\"orders\" id=- state=\"closed\""
        );
        assert_eq!(LogWriter::line(&Event::new(EventKind::Closed)), "[closed]");
    }
}
