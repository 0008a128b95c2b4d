//! Runtime core: transactions, monitoring, alerts and lifecycle.
//!
//! The public entry point is [`Controller`], built through [`ControllerBuilder`].
//!
//! Internal modules:
//! - [`config`]: timings, thresholds and fault injection;
//! - [`alerts`]: active-alert set and its serialized remediation;
//! - [`remediation`]: refill and emergency-stop procedures;
//! - [`orchestrator`]: one fueling transaction across a station and a tanker;
//! - [`monitor`]: periodic mirror/heal/alert loop;
//! - [`controller`]: owns the parts above, starts and stops the monitor;
//! - [`shutdown`]: cross-platform shutdown signal handling.

mod alerts;
mod builder;
mod config;
mod controller;
mod monitor;
mod orchestrator;
mod remediation;
mod shutdown;

pub use alerts::{ALERT_SEPARATOR, Alert, AlertDesk, AlertKind};
pub use builder::ControllerBuilder;
pub use config::Config;
pub use controller::Controller;
pub use monitor::TickReport;
pub use orchestrator::Receipt;
