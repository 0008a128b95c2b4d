//! # Runtime events emitted by the controller, orchestrator, monitor and alert desk.
//!
//! The [`EventKind`] enum classifies event types across five categories:
//! - **Monitor events**: loop lifecycle and per-tick faults
//! - **Telemetry events**: publish failures and operator writes
//! - **Transaction events**: fueling outcomes
//! - **Alert events**: raise, remediation steps and resolution
//! - **Runtime events**: shutdown and subscriber health
//!
//! The [`Event`] struct carries additional metadata such as timestamps, the resource
//! involved, quantities and reasons.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases monotonically.
//! Use `seq` to restore the exact order when events are delivered out of order.
//!
//! ## Example
//! ```rust
//! use fleetvisor::{Event, EventKind, FuelType, TankerId};
//!
//! let ev = Event::new(EventKind::AlertRaised)
//!     .with_tanker(TankerId(1))
//!     .with_fuel(FuelType::from("АИ-92"))
//!     .with_reason("low fuel");
//!
//! assert_eq!(ev.kind, EventKind::AlertRaised);
//! assert_eq!(ev.tanker, Some(TankerId(1)));
//! assert_eq!(ev.reason.as_deref(), Some("low fuel"));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::SystemTime;

use crate::fleet::{FuelType, StationId, TankerId};

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of runtime events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Monitor events ===
    /// Monitor loop started.
    MonitorStarted,

    /// Monitor loop observed its stop signal and exited.
    MonitorStopped,

    /// A monitor tick failed (error or panic); the loop continues on the next period.
    ///
    /// Sets:
    /// - `reason`: failure message
    TickFailed,

    // === Telemetry events ===
    /// Publishing a value to the telemetry boundary failed.
    ///
    /// Sets:
    /// - `tanker` / `station`: owning resource, if any
    /// - `reason`: node and error
    PublishFailed,

    /// A queued operator write was applied to a resource.
    ///
    /// Sets:
    /// - `tanker` / `station`: written resource
    /// - `reason`: node and value
    OperatorWriteApplied,

    /// A queued operator write could not be applied.
    ///
    /// Sets:
    /// - `reason`: node and rejection
    OperatorWriteRejected,

    // === Transaction events ===
    /// Transaction settled.
    ///
    /// Sets:
    /// - `tanker`, `station`, `fuel`, `quantity`
    TransactionSettled,

    /// Tanker refused to dispense; the station reservation was cancelled.
    ///
    /// Sets:
    /// - `tanker`, `station`, `fuel`, `quantity`, `reason`
    TransactionAborted,

    /// Transaction refused before any side effect, or settlement was refused.
    ///
    /// Sets:
    /// - `fuel`, `quantity`, `reason`; `station` when known
    TransactionRejected,

    // === Alert events ===
    /// Alert raised and added to the active set.
    ///
    /// Sets:
    /// - `tanker`, `fuel`, `reason`: alert message
    AlertRaised,

    /// Remediation finished and the alert left the active set.
    ///
    /// Sets:
    /// - `tanker`, `fuel`, `reason`: alert message
    AlertResolved,

    /// Tanker repaired (monitor auto-heal or remediation).
    ///
    /// Sets:
    /// - `tanker`
    TankerRepaired,

    /// Station repaired (monitor auto-heal or remediation).
    ///
    /// Sets:
    /// - `station`
    StationRepaired,

    /// Low-fuel remediation refilled the fleet.
    ///
    /// Sets:
    /// - `quantity`: number of tankers refilled
    FleetRefilled,

    /// Emergency remediation stopped a busy station with zero revenue.
    ///
    /// Sets:
    /// - `station`
    EmergencyStop,

    // === Runtime events ===
    /// Shutdown requested (OS signal or explicit stop).
    ShutdownRequested,

    /// Monitor stopped within the configured grace period.
    StoppedWithinGrace,

    /// Grace period exceeded; the monitor task was aborted.
    GraceExceeded,

    /// Subscriber panicked during event processing.
    ///
    /// Sets:
    /// - `reason`: subscriber name and panic message
    SubscriberPanicked,

    /// Subscriber dropped an event (queue full or worker closed).
    ///
    /// Sets:
    /// - `reason`: subscriber name and cause
    SubscriberOverflow,
}

/// Runtime event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,
    /// Tanker involved, if any.
    pub tanker: Option<TankerId>,
    /// Station involved, if any.
    pub station: Option<StationId>,
    /// Fuel type involved, if any.
    pub fuel: Option<FuelType>,
    /// Volume involved (litres), or a count for aggregate events.
    pub quantity: Option<f64>,
    /// Human-readable reason (errors, alert messages, etc.).
    pub reason: Option<Arc<str>>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            tanker: None,
            station: None,
            fuel: None,
            quantity: None,
            reason: None,
        }
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    #[inline]
    pub fn with_tanker(mut self, id: TankerId) -> Self {
        self.tanker = Some(id);
        self
    }

    #[inline]
    pub fn with_station(mut self, id: StationId) -> Self {
        self.station = Some(id);
        self
    }

    #[inline]
    pub fn with_fuel(mut self, fuel: FuelType) -> Self {
        self.fuel = Some(fuel);
        self
    }

    #[inline]
    pub fn with_quantity(mut self, quantity: f64) -> Self {
        self.quantity = Some(quantity);
        self
    }

    /// Creates a subscriber overflow event.
    #[inline]
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        Event::new(EventKind::SubscriberOverflow)
            .with_reason(format!("subscriber={subscriber} reason={reason}"))
    }

    /// Creates a subscriber panic event.
    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::new(EventKind::SubscriberPanicked)
            .with_reason(format!("subscriber={subscriber} info={info}"))
    }

    #[inline]
    pub fn is_subscriber_overflow(&self) -> bool {
        matches!(self.kind, EventKind::SubscriberOverflow)
    }
}
