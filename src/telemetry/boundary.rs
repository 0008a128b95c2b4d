//! # Telemetry boundary trait.
//!
//! [`Telemetry`] is the seam between the core and the external monitoring/control
//! network (an industrial-protocol server in production, [`MemoryTelemetry`] in
//! process). The core only ever calls it with **no resource lock held**.
//!
//! ## Rules
//! - `register` is called once at controller start; an error there is fatal.
//! - `publish` is best-effort: errors are logged by the caller and never propagate.
//! - `drain_writes` hands over operator writes received since the last call; the
//!   monitor applies them at the start of each tick.
//!
//! ## Example
//! ```rust
//! use async_trait::async_trait;
//! use fleetvisor::{Fleet, NodeId, NodeValue, OperatorWrite, Telemetry, TelemetryError};
//!
//! struct Discard;
//!
//! #[async_trait]
//! impl Telemetry for Discard {
//!     async fn register(&self, _fleet: &Fleet) -> Result<(), TelemetryError> { Ok(()) }
//!     async fn publish(&self, _node: NodeId, _value: NodeValue) -> Result<(), TelemetryError> {
//!         Ok(())
//!     }
//!     async fn drain_writes(&self) -> Vec<OperatorWrite> { Vec::new() }
//!     fn name(&self) -> &'static str { "discard" }
//! }
//! ```
//!
//! [`MemoryTelemetry`]: crate::MemoryTelemetry

use async_trait::async_trait;

use crate::error::TelemetryError;
use crate::fleet::Fleet;
use crate::telemetry::node::{NodeId, NodeValue, OperatorWrite};

/// External surface that mirrors resource state and accepts operator writes.
#[async_trait]
pub trait Telemetry: Send + Sync + 'static {
    /// Exposes the fleet's node tree (identity nodes and initial values).
    async fn register(&self, fleet: &Fleet) -> Result<(), TelemetryError>;

    /// Publishes the current value of one node.
    async fn publish(&self, node: NodeId, value: NodeValue) -> Result<(), TelemetryError>;

    /// Takes all operator writes queued since the previous call, in arrival order.
    async fn drain_writes(&self) -> Vec<OperatorWrite>;

    /// Returns the boundary name used in logs.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}
