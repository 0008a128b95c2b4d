//! # Event subscribers for the fleetvisor runtime.
//!
//! This module provides the [`Subscribe`] trait, the [`SubscriberSet`] fan-out and the
//! built-in [`LogWriter`].
//!
//! ## Architecture
//! ```text
//! Orchestrator / Monitor / AlertDesk ── publish(Event) ──► Bus ──► Controller listener
//!                                                                       │
//!                                                               SubscriberSet::emit
//!                                                          ┌────────────┼────────────┐
//!                                                          ▼            ▼            ▼
//!                                                      LogWriter     Metrics      Custom
//! ```

#[cfg(feature = "logging")]
mod log;
mod subscriber;
mod subscriber_set;

#[cfg(feature = "logging")]
pub use log::LogWriter;
pub use subscriber::Subscribe;
pub(crate) use subscriber_set::panic_message;
pub use subscriber_set::SubscriberSet;
