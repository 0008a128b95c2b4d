//! # Tanker: lockable bulk-fuel resource.
//!
//! A [`Tanker`] holds a fuel volume plus two environmental readings and a health flag.
//! All mutable state sits behind the tanker's own mutex; every operation is a single
//! critical section, so a dispense and a concurrent reading update never interleave.
//!
//! ## Rules
//! - `0 ≤ level ≤ capacity` after every operation (writes are clamped).
//! - While `broken`, `dispense` is rejected regardless of fuel level.
//! - `update_reading` recomputes `broken` from the readings it applied.
//! - Operator overrides write one field raw and **do not** recompute `broken`;
//!   the monitor decides on the next tick.
//! - The lock is never held across an `.await`.
//!
//! ## Example
//! ```rust
//! use fleetvisor::{FaultInjection, FuelType, Limits, Tanker, TankerId};
//!
//! let t = Tanker::new(TankerId(1), FuelType::from("АИ-92"), 1500.0, 2000.0,
//!                     Limits::default(), FaultInjection::Disabled);
//! assert!(t.dispense(100.0).is_ok());
//! assert_eq!(t.snapshot().level, 1400.0);
//!
//! t.update_reading(1400.0, 45.0, 1.0).unwrap();
//! assert!(t.snapshot().broken);
//! assert!(t.dispense(1.0).is_err());
//! ```

use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::error::Rejection;
use crate::fleet::{FuelType, TankerId};
use crate::policies::{FaultInjection, Limits, sample};

/// Point-in-time copy of a tanker's state.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TankerSnapshot {
    /// Tanker id.
    pub id: TankerId,
    /// Fuel volume (litres).
    pub level: f64,
    /// Maximum fuel volume (litres).
    pub capacity: f64,
    /// Temperature (°C).
    pub temperature: f64,
    /// Pressure (bar).
    pub pressure: f64,
    /// Health flag.
    pub broken: bool,
}

/// A single writable tanker field, as written by an operator through the telemetry boundary.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TankerOverride {
    /// Force the fuel level (clamped to capacity).
    FuelLevel(f64),
    /// Force the temperature.
    Temperature(f64),
    /// Force the pressure.
    Pressure(f64),
    /// Force the health flag.
    Broken(bool),
}

#[derive(Debug)]
struct TankerState {
    level: f64,
    temperature: f64,
    pressure: f64,
    broken: bool,
}

/// Bulk fuel-storage resource bound to one fuel type.
#[derive(Debug)]
pub struct Tanker {
    id: TankerId,
    fuel: FuelType,
    capacity: f64,
    limits: Limits,
    faults: FaultInjection,
    state: Mutex<TankerState>,
}

impl Tanker {
    /// Creates a healthy tanker at nominal readings.
    ///
    /// `level` is clamped to `[0, capacity]`; a non-positive `capacity` is treated as `0`.
    pub fn new(
        id: TankerId,
        fuel: FuelType,
        level: f64,
        capacity: f64,
        limits: Limits,
        faults: FaultInjection,
    ) -> Self {
        let capacity = if capacity.is_finite() { capacity.max(0.0) } else { 0.0 };
        let state = TankerState {
            level: clamp_level(level, capacity),
            temperature: limits.nominal_temperature,
            pressure: limits.nominal_pressure,
            broken: false,
        };
        Self {
            id,
            fuel,
            capacity,
            limits,
            faults,
            state: Mutex::new(state),
        }
    }

    /// Returns the tanker id.
    pub fn id(&self) -> TankerId {
        self.id
    }

    /// Returns the bound fuel type.
    pub fn fuel(&self) -> &FuelType {
        &self.fuel
    }

    /// Returns the capacity (litres).
    pub fn capacity(&self) -> f64 {
        self.capacity
    }

    /// Returns the operating envelope this tanker judges its readings against.
    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    /// Takes a consistent copy of the current state.
    pub fn snapshot(&self) -> TankerSnapshot {
        let s = self.lock();
        self.view(&s)
    }

    /// Removes `quantity` litres, all or nothing.
    ///
    /// Returns the remaining level on success.
    ///
    /// ### Rejections
    /// - [`Rejection::InvalidQuantity`] for negative or non-finite quantities
    /// - [`Rejection::TankerBroken`] while broken
    /// - [`Rejection::InsufficientFuel`] if `level < quantity`
    pub fn dispense(&self, quantity: f64) -> Result<f64, Rejection> {
        check_quantity(quantity)?;
        let mut s = self.lock();
        if s.broken {
            return Err(Rejection::TankerBroken { tanker: self.id });
        }
        if s.level < quantity {
            return Err(Rejection::InsufficientFuel {
                tanker: self.id,
                requested: quantity,
                available: s.level,
            });
        }
        s.level = clamp_level(s.level - quantity, self.capacity);
        Ok(s.level)
    }

    /// Applies a full reading (fuel level, temperature, pressure) and recomputes `broken`.
    ///
    /// With fault injection enabled, the supplied temperature/pressure may be replaced by
    /// hazard values before being applied; the override always wins.
    pub fn update_reading(
        &self,
        level: f64,
        temperature: f64,
        pressure: f64,
    ) -> Result<TankerSnapshot, Rejection> {
        check_finite(level)?;
        self.apply_reading(Some(level), temperature, pressure)
    }

    /// Like [`update_reading`](Self::update_reading), but keeps the current level.
    ///
    /// The level is read and kept under the tanker lock, so a concurrent `dispense`
    /// is never overwritten.
    pub fn update_environment(
        &self,
        temperature: f64,
        pressure: f64,
    ) -> Result<TankerSnapshot, Rejection> {
        self.apply_reading(None, temperature, pressure)
    }

    fn apply_reading(
        &self,
        level: Option<f64>,
        temperature: f64,
        pressure: f64,
    ) -> Result<TankerSnapshot, Rejection> {
        check_finite(temperature)?;
        check_finite(pressure)?;
        let (temperature, pressure) = self.faults.apply(temperature, pressure);

        let mut s = self.lock();
        if let Some(level) = level {
            s.level = clamp_level(level, self.capacity);
        }
        s.temperature = temperature;
        s.pressure = pressure;
        s.broken = !self.limits.readings_nominal(temperature, pressure);
        Ok(self.view(&s))
    }

    /// Clears `broken`, resetting any out-of-range reading to its nominal default.
    pub fn repair(&self) -> TankerSnapshot {
        let mut s = self.lock();
        self.repair_locked(&mut s);
        self.view(&s)
    }

    /// Fills the tanker to capacity and clears `broken` if the readings are nominal.
    pub fn refill(&self) -> TankerSnapshot {
        let mut s = self.lock();
        s.level = self.capacity;
        if self.limits.readings_nominal(s.temperature, s.pressure) {
            s.broken = false;
        }
        self.view(&s)
    }

    /// Emergency correction: if either reading is out of range, resamples it inside the
    /// nominal band and repairs the tanker.
    ///
    /// Returns `true` if a correction was made.
    pub fn correct_readings(&self) -> bool {
        let mut rng = rand::rng();
        let mut s = self.lock();
        let mut corrected = false;
        if !self.limits.temperature_nominal(s.temperature) {
            s.temperature = sample(&mut rng, &self.limits.resample_temperature);
            corrected = true;
        }
        if !self.limits.pressure_nominal(s.pressure) {
            s.pressure = sample(&mut rng, &self.limits.resample_pressure);
            corrected = true;
        }
        if corrected {
            self.repair_locked(&mut s);
        }
        corrected
    }

    /// Writes a single field without recomputing `broken`.
    pub fn apply_override(&self, field: TankerOverride) -> Result<(), Rejection> {
        let mut s = self.lock();
        match field {
            TankerOverride::FuelLevel(v) => {
                check_finite(v)?;
                s.level = clamp_level(v, self.capacity);
            }
            TankerOverride::Temperature(v) => {
                check_finite(v)?;
                s.temperature = v;
            }
            TankerOverride::Pressure(v) => {
                check_finite(v)?;
                s.pressure = v;
            }
            TankerOverride::Broken(b) => s.broken = b,
        }
        Ok(())
    }

    fn repair_locked(&self, s: &mut TankerState) {
        if !self.limits.temperature_nominal(s.temperature) {
            s.temperature = self.limits.nominal_temperature;
        }
        if !self.limits.pressure_nominal(s.pressure) {
            s.pressure = self.limits.nominal_pressure;
        }
        s.broken = false;
    }

    fn view(&self, s: &TankerState) -> TankerSnapshot {
        TankerSnapshot {
            id: self.id,
            level: s.level,
            capacity: self.capacity,
            temperature: s.temperature,
            pressure: s.pressure,
            broken: s.broken,
        }
    }

    fn lock(&self) -> MutexGuard<'_, TankerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[inline]
fn clamp_level(level: f64, capacity: f64) -> f64 {
    if level.is_nan() {
        return 0.0;
    }
    level.clamp(0.0, capacity)
}

pub(crate) fn check_quantity(quantity: f64) -> Result<(), Rejection> {
    if quantity.is_finite() && quantity >= 0.0 {
        Ok(())
    } else {
        Err(Rejection::InvalidQuantity { quantity })
    }
}

fn check_finite(v: f64) -> Result<(), Rejection> {
    if v.is_finite() {
        Ok(())
    } else {
        Err(Rejection::InvalidQuantity { quantity: v })
    }
}
