//! # Fault-injection policy for tanker readings.
//!
//! [`FaultInjection`] simulates sensor excursions inside `Tanker::update_reading`.
//! When enabled, every reading update rolls against `probability`; on a hit the
//! caller-supplied temperature and pressure are **replaced** by values drawn from the
//! hazard ranges before they are applied.
//!
//! - [`FaultInjection::Disabled`] — readings are applied exactly as supplied (default)
//! - [`FaultInjection::Hazard`] — readings are overridden with probability `p`
//!
//! Tests use `Disabled` for deterministic assertions, or `Hazard` with
//! `probability = 1.0` to force the remediation paths.

use rand::Rng;
use std::ops::RangeInclusive;

/// Policy controlling randomized overrides of tanker readings.
#[derive(Clone, Debug, PartialEq, Default)]
pub enum FaultInjection {
    /// No overrides: readings are applied as supplied.
    #[default]
    Disabled,

    /// Override readings with probability `probability` (clamped to `0.0 ..= 1.0`).
    Hazard {
        /// Chance that a single update is overridden.
        probability: f64,
        /// Range the overriding temperature is drawn from.
        temperature: RangeInclusive<f64>,
        /// Range the overriding pressure is drawn from.
        pressure: RangeInclusive<f64>,
    },
}

impl FaultInjection {
    /// Hazard policy with the reference excursion ranges
    /// (temperature `41 ..= 60 °C`, pressure `2.1 ..= 3.0 bar`).
    pub fn hazard(probability: f64) -> Self {
        FaultInjection::Hazard {
            probability,
            temperature: 41.0..=60.0,
            pressure: 2.1..=3.0,
        }
    }

    /// Returns `true` if this policy can ever override a reading.
    pub fn is_enabled(&self) -> bool {
        match self {
            FaultInjection::Disabled => false,
            FaultInjection::Hazard { probability, .. } => *probability > 0.0,
        }
    }

    /// Applies the policy to a `(temperature, pressure)` pair.
    ///
    /// Returns the pair unchanged unless the roll hits.
    pub fn apply(&self, temperature: f64, pressure: f64) -> (f64, f64) {
        match self {
            FaultInjection::Disabled => (temperature, pressure),
            FaultInjection::Hazard {
                probability,
                temperature: t_range,
                pressure: p_range,
            } => {
                let p = if probability.is_nan() {
                    0.0
                } else {
                    probability.clamp(0.0, 1.0)
                };
                let mut rng = rand::rng();
                if !rng.random_bool(p) {
                    return (temperature, pressure);
                }
                (sample(&mut rng, t_range), sample(&mut rng, p_range))
            }
        }
    }
}

/// Draws a value from `range`, tolerating inverted bounds.
pub(crate) fn sample(rng: &mut impl Rng, range: &RangeInclusive<f64>) -> f64 {
    let (lo, hi) = (*range.start(), *range.end());
    if lo >= hi {
        return lo;
    }
    rng.random_range(lo..=hi)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_passes_readings_through() {
        let policy = FaultInjection::Disabled;
        assert!(!policy.is_enabled());
        assert_eq!(policy.apply(45.0, 1.0), (45.0, 1.0));
    }

    #[test]
    fn test_zero_probability_never_overrides() {
        let policy = FaultInjection::hazard(0.0);
        assert!(!policy.is_enabled());
        for _ in 0..100 {
            assert_eq!(policy.apply(20.0, 1.0), (20.0, 1.0));
        }
    }

    #[test]
    fn test_certain_hazard_always_overrides_within_range() {
        let policy = FaultInjection::hazard(1.0);
        for _ in 0..100 {
            let (t, p) = policy.apply(20.0, 1.0);
            assert!((41.0..=60.0).contains(&t), "temperature {t} out of hazard range");
            assert!((2.1..=3.0).contains(&p), "pressure {p} out of hazard range");
        }
    }

    #[test]
    fn test_probability_above_one_is_clamped() {
        let policy = FaultInjection::Hazard {
            probability: 7.0,
            temperature: 50.0..=50.0,
            pressure: 0.1..=0.1,
        };
        assert_eq!(policy.apply(20.0, 1.0), (50.0, 0.1));
    }
}
