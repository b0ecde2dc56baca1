//! # Runtime event observers.
//!
//! This module provides the [`Observe`] trait and the fan-out that drives
//! observers from the hub's event channel.
//!
//! ```text
//! Mailbox / SubjectQueue / PubSub ── publish(Event) ──► EventBus ──► listener ──► ObserverSet
//!                                                                                 ├──► LogWriter
//!                                                                                 └──► custom
//! ```
//!
//! ## Optional features
//! - `logging`: exports a simple built-in [`LogWriter`] _(demo/reference only)_.

#[cfg(feature = "logging")]
mod log;
mod observer;
mod set;

#[cfg(feature = "logging")]
pub use log::LogWriter;
pub use observer::Observe;
pub(crate) use set::ObserverSet;
