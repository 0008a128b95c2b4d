//! Error types used by the fleetvisor runtime, its resources and the telemetry boundary.
//!
//! This module defines one enum per failure class:
//!
//! - [`Rejection`] — a resource (or the orchestrator) refused an operation; no state changed.
//! - [`TelemetryError`] — the telemetry boundary failed to publish or accept a value.
//! - [`FleetError`] — an invalid fleet definition was handed to the builder.
//! - [`TickError`] — a monitor tick could not complete.
//! - [`RuntimeError`] — failures of the controller's outer surface (start/stop).
//!
//! All types provide helper methods (`as_label`, `as_message`) for logging/metrics.
//! Rejections and telemetry faults are never fatal: the core branches on them or logs
//! them and keeps running.

use std::time::Duration;
use thiserror::Error;

use crate::fleet::{FuelType, StationId, TankerId};
use crate::telemetry::NodeId;

/// # Rejected operations.
///
/// Returned by [`Tanker`](crate::Tanker), [`Station`](crate::Station) and the fueling
/// orchestrator when an operation is refused. A rejection guarantees the target
/// resource was left unchanged.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Rejection {
    /// The tanker is flagged broken; dispensing is refused regardless of fuel level.
    #[error("tanker {tanker} is broken")]
    TankerBroken {
        /// Rejecting tanker.
        tanker: TankerId,
    },

    /// The tanker holds less fuel than requested.
    #[error("tanker {tanker} has {available} l, requested {requested} l")]
    InsufficientFuel {
        /// Rejecting tanker.
        tanker: TankerId,
        /// Requested volume.
        requested: f64,
        /// Volume currently held.
        available: f64,
    },

    /// The station is flagged broken.
    #[error("station {station} is broken")]
    StationBroken {
        /// Rejecting station.
        station: StationId,
    },

    /// The station already has an open transaction.
    #[error("station {station} is busy")]
    StationBusy {
        /// Rejecting station.
        station: StationId,
    },

    /// The station has no open transaction to stop.
    #[error("station {station} is idle")]
    StationIdle {
        /// Rejecting station.
        station: StationId,
    },

    /// The transaction being settled is no longer the station's open transaction
    /// (it was emergency-stopped or repaired in the meantime).
    #[error("station {station} session closed before settlement")]
    SessionClosed {
        /// Rejecting station.
        station: StationId,
    },

    /// No tanker or no station is bound to the requested fuel type.
    #[error("no tanker/station bound to fuel type {fuel}")]
    UnknownFuelType {
        /// Requested fuel type.
        fuel: FuelType,
    },

    /// No tanker or station with this id exists in the fleet.
    #[error("unknown resource id {id}")]
    UnknownResource {
        /// Requested id.
        id: u32,
    },

    /// The quantity is negative or not a finite number.
    #[error("invalid quantity {quantity}")]
    InvalidQuantity {
        /// Offending quantity.
        quantity: f64,
    },
}

impl Rejection {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use fleetvisor::{Rejection, StationId};
    ///
    /// let err = Rejection::StationBusy { station: StationId(1) };
    /// assert_eq!(err.as_label(), "station_busy");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            Rejection::TankerBroken { .. } => "tanker_broken",
            Rejection::InsufficientFuel { .. } => "insufficient_fuel",
            Rejection::StationBroken { .. } => "station_broken",
            Rejection::StationBusy { .. } => "station_busy",
            Rejection::StationIdle { .. } => "station_idle",
            Rejection::SessionClosed { .. } => "session_closed",
            Rejection::UnknownFuelType { .. } => "unknown_fuel_type",
            Rejection::UnknownResource { .. } => "unknown_resource",
            Rejection::InvalidQuantity { .. } => "invalid_quantity",
        }
    }

    /// Returns a human-readable message with details about the rejection.
    pub fn as_message(&self) -> String {
        self.to_string()
    }
}

/// # Errors produced at the telemetry boundary.
///
/// These are transient infrastructure faults: callers inside the core log them and
/// continue; they never abort a monitor tick or a remediation.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TelemetryError {
    /// The boundary is not reachable (server down, connection lost, injected failure).
    #[error("telemetry unavailable: {reason}")]
    Unavailable {
        /// Underlying cause.
        reason: String,
    },

    /// The addressed node does not exist on the boundary.
    #[error("unknown node {node}")]
    UnknownNode {
        /// Addressed node.
        node: NodeId,
    },

    /// An external write targeted a read-only node.
    #[error("node {node} is read-only")]
    ReadOnly {
        /// Addressed node.
        node: NodeId,
    },

    /// An external write carried a value of the wrong type for the node.
    #[error("type mismatch writing node {node}")]
    TypeMismatch {
        /// Addressed node.
        node: NodeId,
    },
}

impl TelemetryError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            TelemetryError::Unavailable { .. } => "telemetry_unavailable",
            TelemetryError::UnknownNode { .. } => "telemetry_unknown_node",
            TelemetryError::ReadOnly { .. } => "telemetry_read_only",
            TelemetryError::TypeMismatch { .. } => "telemetry_type_mismatch",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        self.to_string()
    }
}

/// # Errors produced while building a [`Fleet`](crate::Fleet).
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FleetError {
    /// Two tankers were bound to the same fuel type.
    #[error("fuel type {fuel} already has a tanker")]
    DuplicateTanker {
        /// Duplicated fuel type.
        fuel: FuelType,
    },

    /// Two stations were bound to the same fuel type.
    #[error("fuel type {fuel} already has a station")]
    DuplicateStation {
        /// Duplicated fuel type.
        fuel: FuelType,
    },

    /// Tanker capacity must be positive and finite.
    #[error("tanker for {fuel} has invalid capacity {capacity}")]
    InvalidCapacity {
        /// Fuel type of the offending tanker.
        fuel: FuelType,
        /// Offending capacity.
        capacity: f64,
    },

    /// Station price must be non-negative and finite.
    #[error("station for {fuel} has invalid price {price}")]
    InvalidPrice {
        /// Fuel type of the offending station.
        fuel: FuelType,
        /// Offending price.
        price: f64,
    },
}

impl FleetError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            FleetError::DuplicateTanker { .. } => "fleet_duplicate_tanker",
            FleetError::DuplicateStation { .. } => "fleet_duplicate_station",
            FleetError::InvalidCapacity { .. } => "fleet_invalid_capacity",
            FleetError::InvalidPrice { .. } => "fleet_invalid_price",
        }
    }
}

/// # Errors produced by a single monitor tick.
///
/// The monitor loop logs these and runs the next tick on schedule.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TickError {
    /// The tick panicked; resources it touched keep whatever state the panic left.
    #[error("monitor tick panicked: {info}")]
    Panicked {
        /// Panic payload rendered as text.
        info: String,
    },
}

impl TickError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            TickError::Panicked { .. } => "tick_panicked",
        }
    }
}

/// # Errors produced by the controller runtime.
///
/// These represent failures of the outer surface (starting and stopping the system),
/// not of individual resource operations.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// `start()` was called while the monitor is already running.
    #[error("controller already running")]
    AlreadyRunning,

    /// `stop()` was called while the monitor is not running.
    #[error("controller not running")]
    NotRunning,

    /// The monitor did not stop within the configured grace period and was aborted.
    #[error("monitor did not stop within {grace:?}; aborted")]
    GraceExceeded {
        /// The configured grace duration.
        grace: Duration,
    },

    /// The telemetry boundary could not be started.
    #[error("telemetry boundary failed to start: {0}")]
    Telemetry(#[from] TelemetryError),

    /// OS signal handlers could not be installed.
    #[error("signal handling failed: {0}")]
    Signal(#[from] std::io::Error),
}

impl RuntimeError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use fleetvisor::RuntimeError;
    /// use std::time::Duration;
    ///
    /// let err = RuntimeError::GraceExceeded { grace: Duration::from_secs(5) };
    /// assert_eq!(err.as_label(), "runtime_grace_exceeded");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            RuntimeError::AlreadyRunning => "runtime_already_running",
            RuntimeError::NotRunning => "runtime_not_running",
            RuntimeError::GraceExceeded { .. } => "runtime_grace_exceeded",
            RuntimeError::Telemetry(_) => "runtime_telemetry",
            RuntimeError::Signal(_) => "runtime_signal",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            RuntimeError::GraceExceeded { grace } => {
                format!("grace exceeded after {grace:?}")
            }
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejection_labels_are_stable() {
        let err = Rejection::InsufficientFuel {
            tanker: TankerId(2),
            requested: 100.0,
            available: 50.0,
        };
        assert_eq!(err.as_label(), "insufficient_fuel");
        assert_eq!(err.as_message(), "tanker 2 has 50 l, requested 100 l");
    }

    #[test]
    fn test_runtime_error_wraps_telemetry() {
        let err: RuntimeError = TelemetryError::Unavailable {
            reason: "down".into(),
        }
        .into();
        assert_eq!(err.as_label(), "runtime_telemetry");
        assert!(err.as_message().contains("down"));
    }
}
