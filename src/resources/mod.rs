//! Lockable fleet resources.
//!
//! Each resource owns a private `std::sync::Mutex` around its mutable state and
//! exposes only whole operations, so callers cannot touch fields without holding
//! the lock. Operations return `Result<_, Rejection>`; a rejection leaves state
//! unchanged.
//!
//! ## Contents
//! - [`Tanker`] fuel volume, readings, health; dispense / update / repair
//! - [`Station`] one open transaction at a time; start / stop / settle / repair
//!
//! No method acquires a second resource's lock, and no lock outlives the call.

mod station;
mod tanker;

pub use station::{SessionId, Station, StationOverride, StationSnapshot};
pub use tanker::{Tanker, TankerOverride, TankerSnapshot};
