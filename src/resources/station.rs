//! # Station: lockable dispensing point.
//!
//! A [`Station`] sells one fuel type at a fixed unit price and carries at most one
//! open transaction at a time.
//!
//! ## Transaction lifecycle
//! ```text
//!            start_fueling(q)                   stop_fueling(q') / settle(session, q')
//!   idle ───────────────────────► busy ───────────────────────────────────────────► idle
//!   (busy=false, dispensed=0)     (busy=true, dispensed+=q)     sold += q', revenue += q'·price
//!                                   │
//!                                   └── repair() ──► idle   (transaction discarded, no revenue)
//! ```
//!
//! ## Rules
//! - `busy == true` ⇔ a transaction is open; a second `start_fueling` is rejected.
//! - `stop_fueling(0)` is the way to cancel: busy is cleared with zero revenue.
//! - Every `start_fueling` opens a new [`SessionId`]; `settle` only closes the session
//!   it was given, so a caller cannot close a transaction that replaced its own.
//! - Unit price and fuel type never change.

use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::error::Rejection;
use crate::fleet::{FuelType, StationId};
use crate::resources::tanker::check_quantity;

/// Identifies one reservation of a station (one `start_fueling`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SessionId(pub u64);

/// Point-in-time copy of a station's state.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StationSnapshot {
    /// Station id.
    pub id: StationId,
    /// Unit price.
    pub price: f64,
    /// A transaction is open.
    pub busy: bool,
    /// Health flag.
    pub broken: bool,
    /// Volume reserved by the open transaction (0 when idle).
    pub dispensed: f64,
    /// Cumulative sold volume.
    pub sold: f64,
    /// Cumulative revenue.
    pub revenue: f64,
}

/// A single writable station field, as written by an operator through the telemetry boundary.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum StationOverride {
    /// Force the in-flight dispensed volume.
    Dispensed(f64),
    /// Force the cumulative sold volume.
    Sold(f64),
    /// Force the busy flag. Opening this way creates a session no orchestrator owns;
    /// closing resets the in-flight volume.
    Busy(bool),
    /// Force the health flag.
    Broken(bool),
}

#[derive(Debug, Default)]
struct StationState {
    busy: bool,
    broken: bool,
    dispensed: f64,
    sold: f64,
    revenue: f64,
    session: u64,
}

/// Point-of-sale resource bound to one fuel type.
#[derive(Debug)]
pub struct Station {
    id: StationId,
    fuel: FuelType,
    price: f64,
    state: Mutex<StationState>,
}

impl Station {
    /// Creates an idle, healthy station.
    pub fn new(id: StationId, fuel: FuelType, price: f64) -> Self {
        Self {
            id,
            fuel,
            price,
            state: Mutex::new(StationState::default()),
        }
    }

    /// Returns the station id.
    pub fn id(&self) -> StationId {
        self.id
    }

    /// Returns the bound fuel type.
    pub fn fuel(&self) -> &FuelType {
        &self.fuel
    }

    /// Returns the unit price.
    pub fn price(&self) -> f64 {
        self.price
    }

    /// Takes a consistent copy of the current state.
    pub fn snapshot(&self) -> StationSnapshot {
        let s = self.lock();
        self.view(&s)
    }

    /// Opens a transaction reserving `quantity` litres.
    pub fn start_fueling(&self, quantity: f64) -> Result<SessionId, Rejection> {
        check_quantity(quantity)?;
        let mut s = self.lock();
        if s.broken {
            return Err(Rejection::StationBroken { station: self.id });
        }
        if s.busy {
            return Err(Rejection::StationBusy { station: self.id });
        }
        s.busy = true;
        s.dispensed += quantity;
        s.session += 1;
        Ok(SessionId(s.session))
    }

    /// Closes the open transaction, booking `quantity` litres as sold.
    ///
    /// Returns the revenue of this transaction (`quantity × price`).
    pub fn stop_fueling(&self, quantity: f64) -> Result<f64, Rejection> {
        check_quantity(quantity)?;
        let mut s = self.lock();
        self.close_locked(&mut s, quantity)
    }

    /// Like [`stop_fueling`](Self::stop_fueling), but only if `session` is still the
    /// open transaction.
    pub fn settle(&self, session: SessionId, quantity: f64) -> Result<f64, Rejection> {
        check_quantity(quantity)?;
        let mut s = self.lock();
        if s.busy && s.session != session.0 {
            return Err(Rejection::SessionClosed { station: self.id });
        }
        if !s.busy && !s.broken {
            return Err(Rejection::SessionClosed { station: self.id });
        }
        self.close_locked(&mut s, quantity)
    }

    /// Clears `broken`; an open transaction is discarded (busy cleared, no revenue).
    pub fn repair(&self) -> StationSnapshot {
        let mut s = self.lock();
        s.broken = false;
        if s.busy {
            s.busy = false;
            s.dispensed = 0.0;
        }
        self.view(&s)
    }

    /// Writes a single field without any transaction bookkeeping beyond the busy rules
    /// documented on [`StationOverride`].
    pub fn apply_override(&self, field: StationOverride) -> Result<(), Rejection> {
        let mut s = self.lock();
        match field {
            StationOverride::Dispensed(v) => {
                check_quantity(v)?;
                s.dispensed = v;
            }
            StationOverride::Sold(v) => {
                check_quantity(v)?;
                s.sold = v;
            }
            StationOverride::Busy(true) => {
                if !s.busy {
                    s.busy = true;
                    s.session += 1;
                }
            }
            StationOverride::Busy(false) => {
                s.busy = false;
                s.dispensed = 0.0;
            }
            StationOverride::Broken(b) => s.broken = b,
        }
        Ok(())
    }

    fn close_locked(&self, s: &mut StationState, quantity: f64) -> Result<f64, Rejection> {
        if s.broken {
            return Err(Rejection::StationBroken { station: self.id });
        }
        if !s.busy {
            return Err(Rejection::StationIdle { station: self.id });
        }
        let revenue = quantity * self.price;
        s.sold += quantity;
        s.revenue += revenue;
        s.busy = false;
        s.dispensed = 0.0;
        Ok(revenue)
    }

    fn view(&self, s: &StationState) -> StationSnapshot {
        StationSnapshot {
            id: self.id,
            price: self.price,
            busy: s.busy,
            broken: s.broken,
            dispensed: s.dispensed,
            sold: s.sold,
            revenue: s.revenue,
        }
    }

    fn lock(&self) -> MutexGuard<'_, StationState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
