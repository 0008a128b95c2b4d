//! # Fueling orchestrator: one transaction across a station and a tanker.
//!
//! ```text
//!   Idle ──start_fueling──► StationReserved ──► Dispensing ──dispense ok──► (transfer wait) ──settle──► Settled
//!    │                                              │
//!    └─ rejected (no change)                        └─ dispense refused ─► stop(0) ─► Aborted
//! ```
//!
//! ## Rules
//! - At most one resource lock is held at any instant; none during the transfer wait.
//! - The station stays `busy` through the transfer wait, so a concurrent transaction
//!   on the same fuel is rejected rather than queued.
//! - Settlement uses the reservation's [`SessionId`](crate::SessionId). If an emergency
//!   stop or repair closed it during the wait, settlement is refused; the fuel already
//!   left the tanker and is not booked as sold.

use std::sync::Arc;
use std::time::Duration;

use crate::error::Rejection;
use crate::events::{Bus, Event, EventKind};
use crate::fleet::{Fleet, FuelType, StationId, TankerId};
use crate::resources::SessionId;

/// Outcome of a settled transaction.
#[derive(Clone, Debug, PartialEq)]
pub struct Receipt {
    /// Station that ran the transaction.
    pub station: StationId,
    /// Tanker the fuel came from.
    pub tanker: TankerId,
    /// Fuel type sold.
    pub fuel: FuelType,
    /// Station session the sale was booked under.
    pub session: SessionId,
    /// Litres dispensed.
    pub quantity: f64,
    /// Revenue booked for this sale (`quantity * price`).
    pub revenue: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Phase {
    Idle,
    StationReserved,
    Dispensing,
    Settled,
    Aborted,
}

impl Phase {
    fn can_advance_to(self, next: Phase) -> bool {
        matches!(
            (self, next),
            (Phase::Idle, Phase::StationReserved)
                | (Phase::StationReserved, Phase::Dispensing)
                | (Phase::Dispensing, Phase::Settled)
                | (Phase::Dispensing, Phase::Aborted)
        )
    }
}

struct Transaction<'a> {
    fuel: &'a FuelType,
    quantity: f64,
    phase: Phase,
}

impl Transaction<'_> {
    fn advance(&mut self, next: Phase) {
        debug_assert!(
            self.phase.can_advance_to(next),
            "illegal transition {:?} -> {next:?}",
            self.phase
        );
        tracing::trace!(
            fuel = %self.fuel,
            quantity = self.quantity,
            from = ?self.phase,
            to = ?next,
            "transaction"
        );
        self.phase = next;
    }
}

#[derive(Clone)]
pub(crate) struct Orchestrator {
    fleet: Arc<Fleet>,
    bus: Bus,
    transfer: Option<Duration>,
}

impl Orchestrator {
    pub(crate) fn new(fleet: Arc<Fleet>, bus: Bus, transfer: Option<Duration>) -> Self {
        Self {
            fleet,
            bus,
            transfer,
        }
    }

    /// Runs one fueling transaction of `quantity` litres of `fuel`.
    pub(crate) async fn fuel(&self, fuel: &FuelType, quantity: f64) -> Result<Receipt, Rejection> {
        let mut tx = Transaction {
            fuel,
            quantity,
            phase: Phase::Idle,
        };

        let pair = (self.fleet.tanker_for(fuel), self.fleet.station_for(fuel));
        let (Some(tanker), Some(station)) = pair else {
            let rejection = Rejection::UnknownFuelType { fuel: fuel.clone() };
            self.rejected(fuel, quantity, None, &rejection);
            return Err(rejection);
        };

        let session = match station.start_fueling(quantity) {
            Ok(session) => session,
            Err(rejection) => {
                self.rejected(fuel, quantity, Some(station.id()), &rejection);
                return Err(rejection);
            }
        };
        tx.advance(Phase::StationReserved);

        tx.advance(Phase::Dispensing);
        if let Err(rejection) = tanker.dispense(quantity) {
            if let Err(e) = station.settle(session, 0.0) {
                tracing::debug!(
                    station = station.id().0,
                    rejection = %e,
                    "reservation already closed"
                );
            }
            tx.advance(Phase::Aborted);
            self.bus.publish(
                Event::new(EventKind::TransactionAborted)
                    .with_tanker(tanker.id())
                    .with_station(station.id())
                    .with_fuel(fuel.clone())
                    .with_quantity(quantity)
                    .with_reason(rejection.as_message()),
            );
            return Err(rejection);
        }

        if let Some(wait) = self.transfer {
            tokio::time::sleep(wait).await;
        }

        match station.settle(session, quantity) {
            Ok(revenue) => {
                tx.advance(Phase::Settled);
                self.bus.publish(
                    Event::new(EventKind::TransactionSettled)
                        .with_tanker(tanker.id())
                        .with_station(station.id())
                        .with_fuel(fuel.clone())
                        .with_quantity(quantity),
                );
                Ok(Receipt {
                    station: station.id(),
                    tanker: tanker.id(),
                    fuel: fuel.clone(),
                    session,
                    quantity,
                    revenue,
                })
            }
            Err(rejection) => {
                tracing::warn!(
                    station = station.id().0,
                    tanker = tanker.id().0,
                    quantity,
                    rejection = %rejection,
                    "dispensed fuel not booked: reservation closed during transfer"
                );
                self.rejected(fuel, quantity, Some(station.id()), &rejection);
                Err(rejection)
            }
        }
    }

    fn rejected(
        &self,
        fuel: &FuelType,
        quantity: f64,
        station: Option<StationId>,
        why: &Rejection,
    ) {
        let mut ev = Event::new(EventKind::TransactionRejected)
            .with_fuel(fuel.clone())
            .with_quantity(quantity)
            .with_reason(why.as_message());
        if let Some(id) = station {
            ev = ev.with_station(id);
        }
        self.bus.publish(ev);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Config;
    use crate::resources::{StationOverride, TankerOverride};

    fn setup(transfer: Option<Duration>) -> (Arc<Fleet>, Bus, Orchestrator) {
        let fleet = Arc::new(Fleet::reference(&Config::default()));
        let bus = Bus::new(64);
        let orch = Orchestrator::new(Arc::clone(&fleet), bus.clone(), transfer);
        (fleet, bus, orch)
    }

    fn ai92() -> FuelType {
        FuelType::from("АИ-92")
    }

    #[test]
    fn test_phase_transitions() {
        assert!(Phase::Idle.can_advance_to(Phase::StationReserved));
        assert!(Phase::Dispensing.can_advance_to(Phase::Aborted));
        assert!(!Phase::Idle.can_advance_to(Phase::Settled));
        assert!(!Phase::Settled.can_advance_to(Phase::Dispensing));
    }

    #[tokio::test]
    async fn test_settled_transaction_moves_fuel_and_books_revenue() {
        let (fleet, _bus, orch) = setup(None);
        let receipt = orch.fuel(&ai92(), 100.0).await.unwrap();

        assert_eq!(receipt.quantity, 100.0);
        assert!((receipt.revenue - 5250.0).abs() < 1e-9);
        let tanker = fleet.tanker_for(&ai92()).unwrap().snapshot();
        assert_eq!(tanker.level, 1400.0);
        let station = fleet.station_for(&ai92()).unwrap().snapshot();
        assert!(!station.busy);
        assert_eq!(station.sold, 100.0);
    }

    #[tokio::test]
    async fn test_unknown_fuel_changes_nothing() {
        let (fleet, bus, orch) = setup(None);
        let mut rx = bus.subscribe();
        let err = orch.fuel(&FuelType::from("Хз"), 10.0).await.unwrap_err();
        assert!(matches!(err, Rejection::UnknownFuelType { .. }));
        assert_eq!(rx.recv().await.unwrap().kind, EventKind::TransactionRejected);
        assert!(fleet.stations().all(|s| !s.snapshot().busy));
    }

    #[tokio::test]
    async fn test_insufficient_fuel_aborts_and_frees_station() {
        let (fleet, bus, orch) = setup(None);
        let mut rx = bus.subscribe();
        let err = orch.fuel(&ai92(), 1600.0).await.unwrap_err();
        assert!(matches!(err, Rejection::InsufficientFuel { .. }));

        let station = fleet.station_for(&ai92()).unwrap().snapshot();
        assert!(!station.busy);
        assert_eq!(station.sold, 0.0);
        assert_eq!(fleet.tanker_for(&ai92()).unwrap().snapshot().level, 1500.0);
        assert_eq!(rx.recv().await.unwrap().kind, EventKind::TransactionAborted);
    }

    #[tokio::test]
    async fn test_broken_tanker_aborts() {
        let (fleet, _bus, orch) = setup(None);
        fleet
            .tanker_for(&ai92())
            .unwrap()
            .apply_override(TankerOverride::Broken(true))
            .unwrap();
        let err = orch.fuel(&ai92(), 10.0).await.unwrap_err();
        assert!(matches!(err, Rejection::TankerBroken { .. }));
        assert!(!fleet.station_for(&ai92()).unwrap().snapshot().busy);
    }

    #[tokio::test]
    async fn test_broken_station_rejects_before_dispense() {
        let (fleet, _bus, orch) = setup(None);
        fleet
            .station_for(&ai92())
            .unwrap()
            .apply_override(StationOverride::Broken(true))
            .unwrap();
        let err = orch.fuel(&ai92(), 10.0).await.unwrap_err();
        assert!(matches!(err, Rejection::StationBroken { .. }));
        assert_eq!(fleet.tanker_for(&ai92()).unwrap().snapshot().level, 1500.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_transaction_on_same_fuel_is_rejected() {
        let (fleet, _bus, orch) = setup(Some(Duration::from_secs(1)));
        let first = {
            let orch = orch.clone();
            tokio::spawn(async move { orch.fuel(&ai92(), 100.0).await })
        };
        tokio::task::yield_now().await;

        let second = orch.fuel(&ai92(), 100.0).await;
        assert!(matches!(second, Err(Rejection::StationBusy { .. })));

        let first = first.await.unwrap().unwrap();
        assert_eq!(first.quantity, 100.0);
        assert_eq!(fleet.tanker_for(&ai92()).unwrap().snapshot().level, 1400.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_emergency_stop_during_transfer_refuses_settlement() {
        let (fleet, bus, orch) = setup(Some(Duration::from_secs(1)));
        let handle = {
            let orch = orch.clone();
            tokio::spawn(async move { orch.fuel(&ai92(), 100.0).await })
        };
        tokio::task::yield_now().await;

        crate::core::remediation::emergency_stop(&fleet, &bus);

        let err = handle.await.unwrap().unwrap_err();
        assert!(matches!(err, Rejection::SessionClosed { .. }));
        let station = fleet.station_for(&ai92()).unwrap().snapshot();
        assert_eq!(station.sold, 0.0);
        assert_eq!(station.revenue, 0.0);
        assert_eq!(fleet.tanker_for(&ai92()).unwrap().snapshot().level, 1400.0);
    }
}
