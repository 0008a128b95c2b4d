//! # LogWriter: renders events through `tracing`.
//!
//! A subscriber that turns incoming [`Event`]s into structured `tracing` records.
//! Install a `tracing` subscriber (e.g. `tracing-subscriber`'s `fmt`) to see them.
//!
//! ## Example output
//! ```text
//! INFO  fleetvisor: transaction settled station=1 tanker=1 fuel=АИ-92 quantity=100
//! WARN  fleetvisor: alert raised tanker=3 fuel=АИ-98 reason="Tanker 3 (АИ-98): low fuel 400 l"
//! WARN  fleetvisor: emergency stop station=2
//! ERROR fleetvisor: monitor tick failed reason="..."
//! ```

use async_trait::async_trait;
use tracing::{debug, error, info, warn};

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Event writer subscriber.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let tanker = e.tanker.map(|t| t.0);
        let station = e.station.map(|s| s.0);
        let fuel = e.fuel.as_ref().map(|f| f.as_str());
        let reason = e.reason.as_deref();

        match e.kind {
            EventKind::MonitorStarted => info!("monitor started"),
            EventKind::MonitorStopped => info!("monitor stopped"),
            EventKind::TickFailed => error!(reason, "monitor tick failed"),
            EventKind::PublishFailed => warn!(tanker, station, reason, "telemetry publish failed"),
            EventKind::OperatorWriteApplied => {
                info!(tanker, station, reason, "operator write applied")
            }
            EventKind::OperatorWriteRejected => warn!(reason, "operator write rejected"),
            EventKind::TransactionSettled => info!(
                station,
                tanker,
                fuel,
                quantity = e.quantity,
                "transaction settled"
            ),
            EventKind::TransactionAborted => warn!(
                station,
                tanker,
                fuel,
                quantity = e.quantity,
                reason,
                "transaction aborted"
            ),
            EventKind::TransactionRejected => {
                debug!(station, fuel, quantity = e.quantity, reason, "transaction rejected")
            }
            EventKind::AlertRaised => warn!(tanker, fuel, reason, "alert raised"),
            EventKind::AlertResolved => info!(tanker, fuel, reason, "alert resolved"),
            EventKind::TankerRepaired => info!(tanker, "tanker repaired"),
            EventKind::StationRepaired => info!(station, "station repaired"),
            EventKind::FleetRefilled => info!(tankers = e.quantity, "fleet refilled"),
            EventKind::EmergencyStop => warn!(station, "emergency stop"),
            EventKind::ShutdownRequested => info!("shutdown requested"),
            EventKind::StoppedWithinGrace => info!("stopped within grace"),
            EventKind::GraceExceeded => error!("grace exceeded"),
            EventKind::SubscriberOverflow => warn!(reason, "subscriber overflow"),
            EventKind::SubscriberPanicked => error!(reason, "subscriber panicked"),
        }
    }

    fn name(&self) -> &'static str {
        "log-writer"
    }
}
