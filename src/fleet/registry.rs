//! # Fleet registry: the fixed set of tankers and stations.
//!
//! [`Fleet`] maps each fuel type to exactly one [`Tanker`] and one [`Station`].
//! Membership is fixed at [`FleetBuilder::build`]; afterwards the registry is shared
//! read-only (`Arc<Fleet>`) and needs no lock of its own. All mutation goes through
//! the resources' own locks.
//!
//! ## Example
//! ```rust
//! use fleetvisor::{Config, Fleet, FuelType};
//!
//! let fleet = Fleet::builder(&Config::default())
//!     .tanker("АИ-92", 1500.0, 2000.0)
//!     .station("АИ-92", 52.5)
//!     .build()
//!     .unwrap();
//!
//! let fuel = FuelType::from("АИ-92");
//! assert!(fleet.tanker_for(&fuel).is_some());
//! assert!(fleet.station_for(&fuel).is_some());
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use crate::core::Config;
use crate::error::FleetError;
use crate::fleet::{FuelType, StationId, TankerId};
use crate::policies::{FaultInjection, Limits};
use crate::resources::{Station, Tanker};

/// Immutable registry of the fleet's resources.
#[derive(Debug)]
pub struct Fleet {
    tankers: Vec<Arc<Tanker>>,
    stations: Vec<Arc<Station>>,
    tanker_by_fuel: BTreeMap<FuelType, Arc<Tanker>>,
    station_by_fuel: BTreeMap<FuelType, Arc<Station>>,
}

impl Fleet {
    /// Starts a builder whose tankers use the config's limits and fault policy.
    pub fn builder(cfg: &Config) -> FleetBuilder {
        FleetBuilder::new(cfg.limits.clone(), cfg.fault_injection.clone())
    }

    /// Reference configuration: four fuel types, one tanker (capacity 2000 l) and
    /// one station each.
    pub fn reference(cfg: &Config) -> Self {
        let mut builder = Fleet::builder(cfg);
        for (fuel, level, price) in [
            ("АИ-92", 1500.0, 52.5),
            ("АИ-95", 1800.0, 57.9),
            ("АИ-98", 1200.0, 68.3),
            ("ДТ", 2000.0, 66.1),
        ] {
            builder = builder.tanker(fuel, level, 2000.0).station(fuel, price);
        }
        builder.build_unchecked()
    }

    /// Tanker bound to `fuel`.
    pub fn tanker_for(&self, fuel: &FuelType) -> Option<&Arc<Tanker>> {
        self.tanker_by_fuel.get(fuel)
    }

    /// Station bound to `fuel`.
    pub fn station_for(&self, fuel: &FuelType) -> Option<&Arc<Station>> {
        self.station_by_fuel.get(fuel)
    }

    /// Tanker by id.
    pub fn tanker(&self, id: TankerId) -> Option<&Arc<Tanker>> {
        self.tankers.iter().find(|t| t.id() == id)
    }

    /// Station by id.
    pub fn station(&self, id: StationId) -> Option<&Arc<Station>> {
        self.stations.iter().find(|s| s.id() == id)
    }

    /// All tankers in id order.
    pub fn tankers(&self) -> impl Iterator<Item = &Arc<Tanker>> {
        self.tankers.iter()
    }

    /// All stations in id order.
    pub fn stations(&self) -> impl Iterator<Item = &Arc<Station>> {
        self.stations.iter()
    }

    /// Fuel types served by the fleet, sorted.
    pub fn fuel_types(&self) -> impl Iterator<Item = &FuelType> {
        self.tanker_by_fuel.keys()
    }
}

/// Builder for a [`Fleet`]. Ids are assigned sequentially from 1 in insertion order.
pub struct FleetBuilder {
    limits: Limits,
    faults: FaultInjection,
    tankers: Vec<(FuelType, f64, f64)>,
    stations: Vec<(FuelType, f64)>,
}

impl FleetBuilder {
    /// Creates an empty builder.
    pub fn new(limits: Limits, faults: FaultInjection) -> Self {
        Self {
            limits,
            faults,
            tankers: Vec::new(),
            stations: Vec::new(),
        }
    }

    /// Adds a tanker for `fuel` with an initial `level` and `capacity` (litres).
    pub fn tanker(mut self, fuel: impl Into<FuelType>, level: f64, capacity: f64) -> Self {
        self.tankers.push((fuel.into(), level, capacity));
        self
    }

    /// Adds a station for `fuel` selling at `price` per litre.
    pub fn station(mut self, fuel: impl Into<FuelType>, price: f64) -> Self {
        self.stations.push((fuel.into(), price));
        self
    }

    /// Validates and builds the registry.
    ///
    /// ### Errors
    /// - [`FleetError::DuplicateTanker`] / [`FleetError::DuplicateStation`] if a fuel
    ///   type is bound twice
    /// - [`FleetError::InvalidCapacity`] for a non-positive or non-finite capacity
    /// - [`FleetError::InvalidPrice`] for a negative or non-finite price
    pub fn build(self) -> Result<Fleet, FleetError> {
        let mut seen = BTreeSet::new();
        for (fuel, _, capacity) in &self.tankers {
            if !(capacity.is_finite() && *capacity > 0.0) {
                return Err(FleetError::InvalidCapacity {
                    fuel: fuel.clone(),
                    capacity: *capacity,
                });
            }
            if !seen.insert(fuel.clone()) {
                return Err(FleetError::DuplicateTanker { fuel: fuel.clone() });
            }
        }
        seen.clear();
        for (fuel, price) in &self.stations {
            if !(price.is_finite() && *price >= 0.0) {
                return Err(FleetError::InvalidPrice {
                    fuel: fuel.clone(),
                    price: *price,
                });
            }
            if !seen.insert(fuel.clone()) {
                return Err(FleetError::DuplicateStation { fuel: fuel.clone() });
            }
        }
        Ok(self.build_unchecked())
    }

    fn build_unchecked(self) -> Fleet {
        let mut fleet = Fleet {
            tankers: Vec::with_capacity(self.tankers.len()),
            stations: Vec::with_capacity(self.stations.len()),
            tanker_by_fuel: BTreeMap::new(),
            station_by_fuel: BTreeMap::new(),
        };
        for (n, (fuel, level, capacity)) in self.tankers.into_iter().enumerate() {
            let tanker = Arc::new(Tanker::new(
                TankerId(n as u32 + 1),
                fuel.clone(),
                level,
                capacity,
                self.limits.clone(),
                self.faults.clone(),
            ));
            fleet.tanker_by_fuel.insert(fuel, Arc::clone(&tanker));
            fleet.tankers.push(tanker);
        }
        for (n, (fuel, price)) in self.stations.into_iter().enumerate() {
            let station = Arc::new(Station::new(StationId(n as u32 + 1), fuel.clone(), price));
            fleet.station_by_fuel.insert(fuel, Arc::clone(&station));
            fleet.stations.push(station);
        }
        fleet
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_fleet_binds_one_pair_per_fuel() {
        let fleet = Fleet::reference(&Config::default());
        assert_eq!(fleet.tankers().count(), 4);
        assert_eq!(fleet.stations().count(), 4);
        for fuel in fleet.fuel_types() {
            let t = fleet.tanker_for(fuel).unwrap();
            let s = fleet.station_for(fuel).unwrap();
            assert_eq!(t.fuel(), fuel);
            assert_eq!(s.fuel(), fuel);
            assert_eq!(t.capacity(), 2000.0);
        }
    }

    #[test]
    fn test_ids_are_sequential() {
        let fleet = Fleet::reference(&Config::default());
        let ids: Vec<u32> = fleet.tankers().map(|t| t.id().0).collect();
        assert_eq!(ids, vec![1, 2, 3, 4]);
        assert!(fleet.tanker(TankerId(3)).is_some());
        assert!(fleet.station(StationId(9)).is_none());
    }

    #[test]
    fn test_duplicate_fuel_type_rejected() {
        let err = Fleet::builder(&Config::default())
            .tanker("АИ-92", 100.0, 2000.0)
            .tanker("АИ-92", 100.0, 2000.0)
            .build()
            .unwrap_err();
        assert_eq!(err.as_label(), "fleet_duplicate_tanker");
    }

    #[test]
    fn test_invalid_capacity_rejected() {
        let err = Fleet::builder(&Config::default())
            .tanker("ДТ", 100.0, 0.0)
            .build()
            .unwrap_err();
        assert!(matches!(err, FleetError::InvalidCapacity { .. }));
    }

    #[test]
    fn test_unknown_fuel_resolves_to_none() {
        let fleet = Fleet::reference(&Config::default());
        assert!(fleet.tanker_for(&FuelType::from("LPG")).is_none());
    }
}
