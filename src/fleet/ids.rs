//! Identity types shared by resources, the registry and the telemetry boundary.

use std::fmt;
use std::sync::Arc;

/// Fuel-type label a tanker and a station are bound to (e.g. `"АИ-92"`).
///
/// Cheap to clone (`Arc<str>`); immutable after creation.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FuelType(Arc<str>);

impl FuelType {
    /// Creates a fuel-type label.
    pub fn new(label: impl Into<Arc<str>>) -> Self {
        Self(label.into())
    }

    /// Returns the label.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FuelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for FuelType {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for FuelType {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

/// Unique tanker id within a fleet.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TankerId(pub u32);

impl fmt::Display for TankerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique station id within a fleet.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StationId(pub u32);

impl fmt::Display for StationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
