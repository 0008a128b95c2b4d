//! Fleet identity types and the registry.
//!
//! - [`FuelType`], [`TankerId`], [`StationId`] identity shared across modules
//! - [`Fleet`] immutable fuel-type → (tanker, station) registry
//! - [`FleetBuilder`] validated construction

mod ids;
mod registry;

pub use ids::{FuelType, StationId, TankerId};
pub use registry::{Fleet, FleetBuilder};
