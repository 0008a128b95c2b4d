//! Tunable policies for resource health and fault simulation.
//!
//! This module groups the knobs that decide **when** a tanker counts as healthy and
//! **whether** its readings get perturbed on the way in.
//!
//! ## Contents
//! - [`Limits`] thresholds, nominal defaults and resample bands
//! - [`FaultInjection`] randomized sensor excursions for resilience testing
//!
//! ## Quick wiring
//! ```text
//! Config { limits: Limits, fault_injection: FaultInjection }
//!      ├─► Tanker::update_reading  uses fault_injection.apply() then limits for `broken`
//!      ├─► Tanker::repair          uses limits.nominal_* to reset out-of-range readings
//!      ├─► Monitor                 uses limits to evaluate alert thresholds
//!      └─► Remediation             uses limits.resample_* for emergency correction
//! ```
//!
//! ## Defaults
//! - `Limits::default()` → -10..40 °C, 0.5..2.0 bar, low fuel < 500 l.
//! - `FaultInjection::Disabled`.

mod fault;
mod limits;

pub(crate) use fault::sample;
pub use fault::FaultInjection;
pub use limits::Limits;
