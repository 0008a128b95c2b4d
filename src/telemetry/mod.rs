//! Telemetry/control boundary.
//!
//! - [`Telemetry`] the async trait the core publishes through
//! - [`MemoryTelemetry`] in-process node tree with operator writes and failure injection
//! - [`NodeId`], [`NodeValue`], [`Access`], [`OperatorWrite`] node model
//!
//! The `Alerts` node carries the active alert messages joined by `"; "`.

mod boundary;
mod memory;
mod node;

pub use boundary::Telemetry;
pub use memory::MemoryTelemetry;
pub use node::{Access, NodeId, NodeValue, OperatorWrite, Override, StationField, TankerField};
