//! # fleetvisor
//!
//! **Fleetvisor** is a concurrent control runtime for a small fuel depot: a fleet of
//! tankers (one per fuel type) feeding dispensing stations, mirrored to an external
//! telemetry/control boundary.
//!
//! It runs fueling transactions across a station and a tanker, watches tanker
//! readings on a periodic monitor loop, and remediates alerts (resupply on low fuel,
//! emergency stop on abnormal temperature or pressure) one at a time.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!   fuel(type, q)          push_reading(id, ..)          operator writes
//!        │                        │                              │
//!        ▼                        ▼                              ▼
//! ┌───────────────────────────────────────────────────────────────────────┐
//! │  Controller                                                           │
//! │  - Fleet        (fuel type → Tanker, Station; each behind its own lock)│
//! │  - Orchestrator (station reserve → tanker dispense → settle)          │
//! │  - Monitor      (periodic: apply writes, publish, heal, alert)        │
//! │  - AlertDesk    (active set + serialized remediation)                 │
//! │  - Telemetry    (boundary: node tree, publishes, queued writes)       │
//! └──────┬──────────────────┬──────────────────┬──────────────────────────┘
//!        │ Publishes        │ Publishes        │ Publishes
//!        │ - Transaction*   │ - TankerRepaired │ - AlertRaised/Resolved
//!        │                  │ - PublishFailed  │ - EmergencyStop
//!        ▼                  ▼                  ▼
//! ┌───────────────────────────────────────────────────────────────────────┐
//! │                        Bus (broadcast channel)                        │
//! │                      (capacity: Config::bus_capacity)                 │
//! └─────────────────────────────────┬─────────────────────────────────────┘
//!                                   ▼
//!                            SubscriberSet (per-sub queues)
//!                          ┌─────────┼─────────┐
//!                          ▼         ▼         ▼
//!                      LogWriter   sub2 ...  subN
//! ```
//!
//! ### Locking
//! ```text
//! alert lock (tokio, outer) ──► one resource lock at a time (std, inner, never across .await)
//! ```
//!
//! ## Features
//! | Area              | Description                                                   | Key types / traits                     |
//! |-------------------|---------------------------------------------------------------|----------------------------------------|
//! | **Resources**     | Lockable tankers and stations with whole-operation methods.   | [`Tanker`], [`Station`]                |
//! | **Fleet**         | Fuel-type registry with validated construction.               | [`Fleet`], [`FleetBuilder`]            |
//! | **Control**       | Transactions, monitor loop, lifecycle.                        | [`Controller`], [`Receipt`]            |
//! | **Alerts**        | Active set, remediation, published join.                      | [`AlertDesk`], [`Alert`]               |
//! | **Telemetry**     | Boundary trait and an in-process implementation.              | [`Telemetry`], [`MemoryTelemetry`]     |
//! | **Subscriber API**| Hook into runtime events (logging, metrics, custom).          | [`Subscribe`]                          |
//! | **Errors**        | Typed rejections and runtime errors.                          | [`Rejection`], [`RuntimeError`]        |
//! | **Configuration** | Timings, thresholds, fault injection.                         | [`Config`], [`Limits`]                 |
//!
//! ## Optional features
//! - `logging` (default): exports the built-in [`LogWriter`] subscriber, which renders
//!   events through `tracing`.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use std::time::Duration;
//! use fleetvisor::{Config, Controller, FuelType, MemoryTelemetry, NodeId, NodeValue, TankerField};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let cfg = Config {
//!         transfer_latency: Duration::ZERO,
//!         ..Config::default()
//!     };
//!
//!     #[cfg(feature = "logging")]
//!     let subs: Vec<Arc<dyn fleetvisor::Subscribe>> = vec![Arc::new(fleetvisor::LogWriter::new())];
//!     #[cfg(not(feature = "logging"))]
//!     let subs: Vec<Arc<dyn fleetvisor::Subscribe>> = Vec::new();
//!
//!     let telemetry = Arc::new(MemoryTelemetry::new());
//!     let controller = Controller::builder(cfg)
//!         .with_telemetry(Arc::clone(&telemetry))
//!         .with_subscribers(subs)
//!         .build();
//!     controller.start().await?;
//!
//!     let receipt = controller.fuel(&FuelType::from("АИ-92"), 100.0).await?;
//!     println!("sold {} l for {:.2}", receipt.quantity, receipt.revenue);
//!
//!     controller.tick().await?;
//!     let level = telemetry.read(NodeId::tanker(receipt.tanker, TankerField::FuelLevel));
//!     assert_eq!(level, Some(NodeValue::Number(1400.0)));
//!
//!     controller.stop().await?;
//!     Ok(())
//! }
//! ```
mod core;
mod error;
mod events;
mod fleet;
mod policies;
mod resources;
mod subscribers;
mod telemetry;

// ---- Public re-exports ----

pub use crate::core::{
    ALERT_SEPARATOR, Alert, AlertDesk, AlertKind, Config, Controller, ControllerBuilder, Receipt,
    TickReport,
};
pub use error::{FleetError, Rejection, RuntimeError, TelemetryError, TickError};
pub use events::{Bus, Event, EventKind};
pub use fleet::{Fleet, FleetBuilder, FuelType, StationId, TankerId};
pub use policies::{FaultInjection, Limits};
pub use resources::{
    SessionId, Station, StationOverride, StationSnapshot, Tanker, TankerOverride, TankerSnapshot,
};
pub use subscribers::{Subscribe, SubscriberSet};
pub use telemetry::{
    Access, MemoryTelemetry, NodeId, NodeValue, OperatorWrite, Override, StationField,
    TankerField, Telemetry,
};

// Built-in logger subscriber.
// Disable with: `--no-default-features`
#[cfg(feature = "logging")]
pub use subscribers::LogWriter;
