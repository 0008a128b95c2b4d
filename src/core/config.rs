//! # Global runtime configuration.
//!
//! Provides [`Config`], the centralized settings for the controller runtime.
//!
//! Config is used in two ways:
//! 1. **Fleet creation**: `Fleet::builder(&config)` / `Fleet::reference(&config)`
//!    hand `limits` and `fault_injection` to every tanker.
//! 2. **Controller creation**: `Controller::builder(config)` uses the timings.
//!
//! ## Sentinel values
//! - `transfer_latency = 0s` → no simulated transfer time
//! - `resupply_delay = 0s` → no simulated resupply time
//! - `monitor_period = 0s` → treated as 1 ms (an interval cannot be zero)

use std::time::Duration;

use crate::policies::{FaultInjection, Limits};

/// Global configuration for the controller runtime.
///
/// ## Field semantics
/// - `monitor_period`: time between monitor ticks
/// - `transfer_latency`: simulated physical transfer time of one transaction
/// - `resupply_delay`: simulated resupply time of low-fuel remediation
/// - `grace`: maximum wait for the monitor to stop on shutdown (`0s` = abort immediately)
/// - `bus_capacity`: event bus ring buffer size (min 1; clamped by Bus)
/// - `limits`: thresholds and nominal defaults
/// - `fault_injection`: randomized reading overrides
///
/// All fields are public; prefer the helper accessors to avoid sprinkling sentinel
/// checks across the codebase.
#[derive(Clone, Debug)]
pub struct Config {
    /// Period of the monitor loop.
    pub monitor_period: Duration,

    /// Time a station stays reserved between dispense and settlement.
    ///
    /// The station is busy, not locked, during this wait.
    pub transfer_latency: Duration,

    /// Time low-fuel remediation waits before refilling the fleet.
    ///
    /// Spent while holding the alert lock: concurrent remediations queue behind it.
    pub resupply_delay: Duration,

    /// Maximum time to wait for the monitor task to exit on `stop()`.
    pub grace: Duration,

    /// Capacity of the event bus broadcast channel ring buffer.
    pub bus_capacity: usize,

    /// Thresholds and nominal defaults for tanker readings.
    pub limits: Limits,

    /// Fault-injection policy applied inside `Tanker::update_reading`.
    pub fault_injection: FaultInjection,
}

impl Config {
    /// Returns the monitor period clamped to a minimum of 1 ms.
    #[inline]
    pub fn monitor_period_clamped(&self) -> Duration {
        self.monitor_period.max(Duration::from_millis(1))
    }

    /// Returns the transfer latency as an `Option` (`None` = no wait).
    #[inline]
    pub fn transfer_wait(&self) -> Option<Duration> {
        non_zero(self.transfer_latency)
    }

    /// Returns the resupply delay as an `Option` (`None` = no wait).
    #[inline]
    pub fn resupply_wait(&self) -> Option<Duration> {
        non_zero(self.resupply_delay)
    }

    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `monitor_period = 1s`
    /// - `transfer_latency = 1s`
    /// - `resupply_delay = 2s`
    /// - `grace = 5s`
    /// - `bus_capacity = 1024`
    /// - `limits = Limits::default()`
    /// - `fault_injection = FaultInjection::Disabled`
    fn default() -> Self {
        Self {
            monitor_period: Duration::from_secs(1),
            transfer_latency: Duration::from_secs(1),
            resupply_delay: Duration::from_secs(2),
            grace: Duration::from_secs(5),
            bus_capacity: 1024,
            limits: Limits::default(),
            fault_injection: FaultInjection::Disabled,
        }
    }
}

#[inline]
fn non_zero(d: Duration) -> Option<Duration> {
    if d == Duration::ZERO { None } else { Some(d) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sentinels() {
        let cfg = Config {
            monitor_period: Duration::ZERO,
            transfer_latency: Duration::ZERO,
            bus_capacity: 0,
            ..Config::default()
        };
        assert_eq!(cfg.monitor_period_clamped(), Duration::from_millis(1));
        assert_eq!(cfg.transfer_wait(), None);
        assert_eq!(cfg.resupply_wait(), Some(Duration::from_secs(2)));
        assert_eq!(cfg.bus_capacity_clamped(), 1);
    }
}
