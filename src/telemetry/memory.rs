//! # In-process telemetry boundary.
//!
//! [`MemoryTelemetry`] keeps the node tree in memory, playing the part of the
//! protocol server: the core publishes into it, and [`MemoryTelemetry::write`]
//! plays a remote client writing a node.
//!
//! ## Architecture
//! ```text
//!  core ── publish(node, value) ──► nodes: BTreeMap<NodeId, Node>  ◄── read(node) ── operator
//!                                        ▲
//!  monitor tick ◄── drain_writes() ── queue ◄── write(node, value) ── operator
//! ```
//!
//! ## Failure injection
//! - [`set_available(false)`](MemoryTelemetry::set_available) makes `register` and
//!   every `publish` fail with `Unavailable`.
//! - [`fail_next_publishes(n)`](MemoryTelemetry::fail_next_publishes) fails the next
//!   `n` publishes only.

use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use crate::error::TelemetryError;
use crate::fleet::Fleet;
use crate::telemetry::boundary::Telemetry;
use crate::telemetry::node::{Access, NodeId, NodeValue, OperatorWrite, StationField, TankerField};

#[derive(Clone, Debug)]
struct Node {
    access: Access,
    value: NodeValue,
}

/// Node tree held in memory.
#[derive(Debug)]
pub struct MemoryTelemetry {
    nodes: Mutex<BTreeMap<NodeId, Node>>,
    writes: Mutex<VecDeque<OperatorWrite>>,
    available: AtomicBool,
    fail_publishes: AtomicUsize,
    writable_sold: bool,
}

impl Default for MemoryTelemetry {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryTelemetry {
    /// Creates an empty boundary; the station `Sold` node is read-only.
    pub fn new() -> Self {
        Self {
            nodes: Mutex::new(BTreeMap::new()),
            writes: Mutex::new(VecDeque::new()),
            available: AtomicBool::new(true),
            fail_publishes: AtomicUsize::new(0),
            writable_sold: false,
        }
    }

    /// Makes the station `Sold` node writable by operators.
    pub fn with_writable_sold(mut self, writable: bool) -> Self {
        self.writable_sold = writable;
        self
    }

    /// Toggles availability of the whole boundary.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Fails the next `n` publishes with `Unavailable`.
    pub fn fail_next_publishes(&self, n: usize) {
        self.fail_publishes.store(n, Ordering::SeqCst);
    }

    /// Current value of a node.
    pub fn read(&self, node: NodeId) -> Option<NodeValue> {
        self.nodes().get(&node).map(|n| n.value.clone())
    }

    /// Writes a node as a remote client would, queueing it for the monitor.
    ///
    /// ### Errors
    /// - [`TelemetryError::UnknownNode`] if the node was never registered
    /// - [`TelemetryError::ReadOnly`] if the node is read-only
    /// - [`TelemetryError::TypeMismatch`] if the value's type differs from the node's
    pub fn write(&self, node: NodeId, value: NodeValue) -> Result<(), TelemetryError> {
        {
            let mut nodes = self.nodes();
            let entry = nodes
                .get_mut(&node)
                .ok_or(TelemetryError::UnknownNode { node })?;
            if entry.access == Access::ReadOnly {
                return Err(TelemetryError::ReadOnly { node });
            }
            if !entry.value.same_type(&value) {
                return Err(TelemetryError::TypeMismatch { node });
            }
            entry.value = value.clone();
        }
        self.queue().push_back(OperatorWrite { node, value });
        Ok(())
    }

    fn sold_access(&self) -> Access {
        if self.writable_sold {
            Access::Writable
        } else {
            Access::ReadOnly
        }
    }

    fn check_available(&self) -> Result<(), TelemetryError> {
        if !self.available.load(Ordering::SeqCst) {
            return Err(TelemetryError::Unavailable {
                reason: "boundary offline".into(),
            });
        }
        let injected = self
            .fail_publishes
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if injected {
            return Err(TelemetryError::Unavailable {
                reason: "injected failure".into(),
            });
        }
        Ok(())
    }

    fn nodes(&self) -> MutexGuard<'_, BTreeMap<NodeId, Node>> {
        self.nodes.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn queue(&self) -> MutexGuard<'_, VecDeque<OperatorWrite>> {
        self.writes.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl Telemetry for MemoryTelemetry {
    async fn register(&self, fleet: &Fleet) -> Result<(), TelemetryError> {
        if !self.available.load(Ordering::SeqCst) {
            return Err(TelemetryError::Unavailable {
                reason: "boundary offline".into(),
            });
        }
        let mut nodes = self.nodes();
        for tanker in fleet.tankers() {
            let s = tanker.snapshot();
            for field in TankerField::ALL {
                let (access, value) = match field {
                    TankerField::FuelType => {
                        (Access::ReadOnly, NodeValue::Text(tanker.fuel().as_str().into()))
                    }
                    TankerField::FuelLevel => (Access::Writable, NodeValue::Number(s.level)),
                    TankerField::Temperature => {
                        (Access::Writable, NodeValue::Number(s.temperature))
                    }
                    TankerField::Pressure => (Access::Writable, NodeValue::Number(s.pressure)),
                    TankerField::Broken => (Access::Writable, NodeValue::Flag(s.broken)),
                };
                nodes.insert(NodeId::tanker(s.id, field), Node { access, value });
            }
        }
        for station in fleet.stations() {
            let s = station.snapshot();
            for field in StationField::ALL {
                let (access, value) = match field {
                    StationField::FuelType => {
                        (Access::ReadOnly, NodeValue::Text(station.fuel().as_str().into()))
                    }
                    StationField::Price => (Access::ReadOnly, NodeValue::Number(s.price)),
                    StationField::Dispensed => (Access::Writable, NodeValue::Number(s.dispensed)),
                    StationField::Sold => (self.sold_access(), NodeValue::Number(s.sold)),
                    StationField::Busy => (Access::Writable, NodeValue::Flag(s.busy)),
                    StationField::Broken => (Access::Writable, NodeValue::Flag(s.broken)),
                };
                nodes.insert(NodeId::station(s.id, field), Node { access, value });
            }
        }
        nodes.insert(
            NodeId::Alerts,
            Node {
                access: Access::Writable,
                value: NodeValue::Text("".into()),
            },
        );
        Ok(())
    }

    async fn publish(&self, node: NodeId, value: NodeValue) -> Result<(), TelemetryError> {
        self.check_available()?;
        let mut nodes = self.nodes();
        let entry = nodes
            .get_mut(&node)
            .ok_or(TelemetryError::UnknownNode { node })?;
        entry.value = value;
        Ok(())
    }

    async fn drain_writes(&self) -> Vec<OperatorWrite> {
        self.queue().drain(..).collect()
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Config;
    use crate::fleet::{StationId, TankerId};

    async fn registered() -> MemoryTelemetry {
        let fleet = Fleet::reference(&Config::default());
        let t = MemoryTelemetry::new();
        t.register(&fleet).await.unwrap();
        t
    }

    #[tokio::test]
    async fn test_register_exposes_identity_nodes() {
        let t = registered().await;
        let fuel = t.read(NodeId::tanker(TankerId(1), TankerField::FuelType));
        assert_eq!(fuel, Some(NodeValue::Text("АИ-92".into())));
        let price = t.read(NodeId::station(StationId(1), StationField::Price));
        assert_eq!(price, Some(NodeValue::Number(52.5)));
        assert_eq!(t.read(NodeId::Alerts), Some(NodeValue::Text("".into())));
    }

    #[tokio::test]
    async fn test_operator_write_is_queued_once() {
        let t = registered().await;
        let node = NodeId::tanker(TankerId(2), TankerField::Temperature);
        t.write(node, NodeValue::Number(45.0)).unwrap();
        assert_eq!(t.read(node), Some(NodeValue::Number(45.0)));

        let writes = t.drain_writes().await;
        assert_eq!(writes.len(), 1);
        assert_eq!(writes[0].node, node);
        assert!(t.drain_writes().await.is_empty());
    }

    #[tokio::test]
    async fn test_read_only_nodes_reject_writes() {
        let t = registered().await;
        let node = NodeId::station(StationId(1), StationField::Sold);
        assert_eq!(
            t.write(node, NodeValue::Number(1.0)),
            Err(TelemetryError::ReadOnly { node })
        );
        let node = NodeId::tanker(TankerId(1), TankerField::FuelType);
        assert!(t.write(node, NodeValue::Text("x".into())).is_err());
    }

    #[tokio::test]
    async fn test_sold_writable_when_configured() {
        let fleet = Fleet::reference(&Config::default());
        let t = MemoryTelemetry::new().with_writable_sold(true);
        t.register(&fleet).await.unwrap();
        let node = NodeId::station(StationId(1), StationField::Sold);
        assert!(t.write(node, NodeValue::Number(10.0)).is_ok());
    }

    #[tokio::test]
    async fn test_injected_failures_are_consumed() {
        let t = registered().await;
        t.fail_next_publishes(1);
        let node = NodeId::tanker(TankerId(1), TankerField::FuelLevel);
        assert!(t.publish(node, NodeValue::Number(1.0)).await.is_err());
        assert!(t.publish(node, NodeValue::Number(2.0)).await.is_ok());
        assert_eq!(t.read(node), Some(NodeValue::Number(2.0)));
    }

    #[tokio::test]
    async fn test_offline_boundary_fails_register() {
        let fleet = Fleet::reference(&Config::default());
        let t = MemoryTelemetry::new();
        t.set_available(false);
        assert!(matches!(
            t.register(&fleet).await,
            Err(TelemetryError::Unavailable { .. })
        ));
    }
}
