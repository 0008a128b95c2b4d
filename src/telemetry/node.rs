//! Node addressing and values on the telemetry boundary.
//!
//! The boundary mirrors the fleet as a tree of typed nodes:
//! ```text
//! Tankers/
//!   Tanker1/ FuelType (ro)  FuelLevel (rw)  Temperature (rw)  Pressure (rw)  Broken (rw)
//! Stations/
//!   Station1/ FuelType (ro)  Price (ro)  Dispensed (rw)  Sold (ro|rw)  Busy (rw)  Broken (rw)
//! Alerts (rw)
//! ```

use std::fmt;
use std::sync::Arc;

use crate::error::TelemetryError;
use crate::fleet::{StationId, TankerId};
use crate::resources::{StationOverride, TankerOverride};

/// Tanker node names.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TankerField {
    FuelType,
    FuelLevel,
    Temperature,
    Pressure,
    Broken,
}

impl TankerField {
    /// All tanker fields, in publish order.
    pub const ALL: [TankerField; 5] = [
        TankerField::FuelType,
        TankerField::FuelLevel,
        TankerField::Temperature,
        TankerField::Pressure,
        TankerField::Broken,
    ];

    fn as_str(self) -> &'static str {
        match self {
            TankerField::FuelType => "FuelType",
            TankerField::FuelLevel => "FuelLevel",
            TankerField::Temperature => "Temperature",
            TankerField::Pressure => "Pressure",
            TankerField::Broken => "Broken",
        }
    }
}

/// Station node names.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum StationField {
    FuelType,
    Price,
    Dispensed,
    Sold,
    Busy,
    Broken,
}

impl StationField {
    /// All station fields, in publish order.
    pub const ALL: [StationField; 6] = [
        StationField::FuelType,
        StationField::Price,
        StationField::Dispensed,
        StationField::Sold,
        StationField::Busy,
        StationField::Broken,
    ];

    fn as_str(self) -> &'static str {
        match self {
            StationField::FuelType => "FuelType",
            StationField::Price => "Price",
            StationField::Dispensed => "Dispensed",
            StationField::Sold => "Sold",
            StationField::Busy => "Busy",
            StationField::Broken => "Broken",
        }
    }
}

/// Address of a node on the telemetry boundary.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum NodeId {
    Tanker { id: TankerId, field: TankerField },
    Station { id: StationId, field: StationField },
    Alerts,
}

impl NodeId {
    pub fn tanker(id: TankerId, field: TankerField) -> Self {
        NodeId::Tanker { id, field }
    }

    pub fn station(id: StationId, field: StationField) -> Self {
        NodeId::Station { id, field }
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeId::Tanker { id, field } => write!(f, "Tankers/Tanker{id}/{}", field.as_str()),
            NodeId::Station { id, field } => {
                write!(f, "Stations/Station{id}/{}", field.as_str())
            }
            NodeId::Alerts => f.write_str("Alerts"),
        }
    }
}

/// Value carried by a node.
#[derive(Clone, Debug, PartialEq)]
pub enum NodeValue {
    Text(Arc<str>),
    Number(f64),
    Flag(bool),
}

impl NodeValue {
    /// Returns `true` if both values are the same variant.
    pub fn same_type(&self, other: &NodeValue) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            NodeValue::Number(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_flag(&self) -> Option<bool> {
        match self {
            NodeValue::Flag(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            NodeValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for NodeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeValue::Text(s) => write!(f, "{s:?}"),
            NodeValue::Number(v) => write!(f, "{v}"),
            NodeValue::Flag(b) => write!(f, "{b}"),
        }
    }
}

/// Whether remote clients may write a node.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Access {
    ReadOnly,
    Writable,
}

/// Resource-level effect of an operator write.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Override {
    Tanker(TankerId, TankerOverride),
    Station(StationId, StationOverride),
}

/// A value written to the boundary by a remote client, queued for the monitor.
#[derive(Clone, Debug, PartialEq)]
pub struct OperatorWrite {
    pub node: NodeId,
    pub value: NodeValue,
}

impl OperatorWrite {
    /// Translates the write into a resource override.
    ///
    /// Returns `Ok(None)` for nodes that have no resource behind them (`Alerts`).
    pub fn to_override(&self) -> Result<Option<Override>, TelemetryError> {
        let node = self.node;
        let mismatch = || TelemetryError::TypeMismatch { node };
        let read_only = || TelemetryError::ReadOnly { node };

        let ov = match node {
            NodeId::Alerts => return Ok(None),
            NodeId::Tanker { id, field } => {
                let field = match field {
                    TankerField::FuelType => return Err(read_only()),
                    TankerField::FuelLevel => {
                        TankerOverride::FuelLevel(self.value.as_number().ok_or_else(mismatch)?)
                    }
                    TankerField::Temperature => {
                        TankerOverride::Temperature(self.value.as_number().ok_or_else(mismatch)?)
                    }
                    TankerField::Pressure => {
                        TankerOverride::Pressure(self.value.as_number().ok_or_else(mismatch)?)
                    }
                    TankerField::Broken => {
                        TankerOverride::Broken(self.value.as_flag().ok_or_else(mismatch)?)
                    }
                };
                Override::Tanker(id, field)
            }
            NodeId::Station { id, field } => {
                let field = match field {
                    StationField::FuelType | StationField::Price => return Err(read_only()),
                    StationField::Dispensed => {
                        StationOverride::Dispensed(self.value.as_number().ok_or_else(mismatch)?)
                    }
                    StationField::Sold => {
                        StationOverride::Sold(self.value.as_number().ok_or_else(mismatch)?)
                    }
                    StationField::Busy => {
                        StationOverride::Busy(self.value.as_flag().ok_or_else(mismatch)?)
                    }
                    StationField::Broken => {
                        StationOverride::Broken(self.value.as_flag().ok_or_else(mismatch)?)
                    }
                };
                Override::Station(id, field)
            }
        };
        Ok(Some(ov))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_paths() {
        let n = NodeId::tanker(TankerId(3), TankerField::Temperature);
        assert_eq!(n.to_string(), "Tankers/Tanker3/Temperature");
        let n = NodeId::station(StationId(1), StationField::Busy);
        assert_eq!(n.to_string(), "Stations/Station1/Busy");
        assert_eq!(NodeId::Alerts.to_string(), "Alerts");
    }

    #[test]
    fn test_write_translates_to_override() {
        let w = OperatorWrite {
            node: NodeId::tanker(TankerId(1), TankerField::Temperature),
            value: NodeValue::Number(20.0),
        };
        assert_eq!(
            w.to_override(),
            Ok(Some(Override::Tanker(
                TankerId(1),
                TankerOverride::Temperature(20.0)
            )))
        );
    }

    #[test]
    fn test_write_type_mismatch() {
        let node = NodeId::station(StationId(1), StationField::Busy);
        let w = OperatorWrite {
            node,
            value: NodeValue::Number(1.0),
        };
        assert_eq!(w.to_override(), Err(TelemetryError::TypeMismatch { node }));
    }

    #[test]
    fn test_alerts_write_has_no_resource() {
        let w = OperatorWrite {
            node: NodeId::Alerts,
            value: NodeValue::Text("ack".into()),
        };
        assert_eq!(w.to_override(), Ok(None));
    }
}
