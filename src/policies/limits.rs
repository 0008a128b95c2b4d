//! # Operating envelope for tankers.
//!
//! [`Limits`] holds the thresholds that decide whether a tanker is healthy and which
//! alerts the monitor raises, plus the nominal values used when readings are reset.
//!
//! All bounds are **exclusive**: a reading exactly on a bound is nominal.
//! ```text
//!   temperature:  min_temperature ≤ t ≤ max_temperature   (default -10 .. 40 °C)
//!   pressure:     min_pressure    ≤ p ≤ max_pressure      (default 0.5 .. 2.0 bar)
//!   fuel:         level < low_fuel → low-fuel alert       (default 500 l)
//! ```
//!
//! # Example
//! ```rust
//! use fleetvisor::Limits;
//!
//! let limits = Limits::default();
//! assert!(!limits.temperature_high(40.0));
//! assert!(limits.temperature_high(40.0001));
//! assert!(!limits.pressure_low(0.5));
//! assert!(limits.pressure_low(0.4999));
//! ```

use std::ops::RangeInclusive;

/// Thresholds and nominal defaults for tanker readings.
#[derive(Clone, Debug, PartialEq)]
pub struct Limits {
    /// Temperature above this is abnormal (°C).
    pub max_temperature: f64,
    /// Temperature below this is abnormal (°C).
    pub min_temperature: f64,
    /// Pressure above this is abnormal (bar).
    pub max_pressure: f64,
    /// Pressure below this is abnormal (bar).
    pub min_pressure: f64,
    /// Fuel level below this raises a low-fuel alert (litres).
    pub low_fuel: f64,
    /// Temperature written back by `repair()` when the current one is out of range.
    pub nominal_temperature: f64,
    /// Pressure written back by `repair()` when the current one is out of range.
    pub nominal_pressure: f64,
    /// Band sampled by emergency remediation when correcting a temperature.
    pub resample_temperature: RangeInclusive<f64>,
    /// Band sampled by emergency remediation when correcting a pressure.
    pub resample_pressure: RangeInclusive<f64>,
}

impl Default for Limits {
    /// Reference envelope:
    ///
    /// - temperature `-10.0 ..= 40.0`, nominal `20.0`, resampled in `15.0 ..= 25.0`
    /// - pressure `0.5 ..= 2.0`, nominal `1.0`, resampled in `0.9 ..= 1.1`
    /// - low fuel below `500.0`
    fn default() -> Self {
        Self {
            max_temperature: 40.0,
            min_temperature: -10.0,
            max_pressure: 2.0,
            min_pressure: 0.5,
            low_fuel: 500.0,
            nominal_temperature: 20.0,
            nominal_pressure: 1.0,
            resample_temperature: 15.0..=25.0,
            resample_pressure: 0.9..=1.1,
        }
    }
}

impl Limits {
    /// Returns `true` if `t` is strictly above `max_temperature`.
    #[inline]
    pub fn temperature_high(&self, t: f64) -> bool {
        t > self.max_temperature
    }

    /// Returns `true` if `t` is strictly below `min_temperature`.
    #[inline]
    pub fn temperature_low(&self, t: f64) -> bool {
        t < self.min_temperature
    }

    /// Returns `true` if `p` is strictly above `max_pressure`.
    #[inline]
    pub fn pressure_high(&self, p: f64) -> bool {
        p > self.max_pressure
    }

    /// Returns `true` if `p` is strictly below `min_pressure`.
    #[inline]
    pub fn pressure_low(&self, p: f64) -> bool {
        p < self.min_pressure
    }

    /// Returns `true` if `level` is strictly below `low_fuel`.
    #[inline]
    pub fn fuel_low(&self, level: f64) -> bool {
        level < self.low_fuel
    }

    /// Returns `true` if the temperature is inside the envelope.
    #[inline]
    pub fn temperature_nominal(&self, t: f64) -> bool {
        !self.temperature_high(t) && !self.temperature_low(t)
    }

    /// Returns `true` if the pressure is inside the envelope.
    #[inline]
    pub fn pressure_nominal(&self, p: f64) -> bool {
        !self.pressure_high(p) && !self.pressure_low(p)
    }

    /// Returns `true` if both readings are inside the envelope.
    ///
    /// The inverse of this is the tanker's `broken` rule.
    #[inline]
    pub fn readings_nominal(&self, t: f64, p: f64) -> bool {
        self.temperature_nominal(t) && self.pressure_nominal(p)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds_are_exclusive() {
        let l = Limits::default();
        assert!(l.temperature_nominal(40.0));
        assert!(l.temperature_nominal(-10.0));
        assert!(l.pressure_nominal(2.0));
        assert!(l.pressure_nominal(0.5));
        assert!(l.temperature_low(-10.0001));
        assert!(l.pressure_high(2.0001));
    }

    #[test]
    fn test_low_fuel_threshold() {
        let l = Limits::default();
        assert!(l.fuel_low(499.9));
        assert!(!l.fuel_low(500.0));
    }

    #[test]
    fn test_resample_bands_are_nominal() {
        let l = Limits::default();
        for t in [*l.resample_temperature.start(), *l.resample_temperature.end()] {
            assert!(l.temperature_nominal(t));
        }
        for p in [*l.resample_pressure.start(), *l.resample_pressure.end()] {
            assert!(l.pressure_nominal(p));
        }
    }
}
