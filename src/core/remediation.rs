//! Remediation procedures run by [`AlertDesk`](crate::AlertDesk) while it holds the
//! alert lock. Each resource call takes and releases its own lock.

use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::events::{Bus, Event, EventKind};
use crate::fleet::Fleet;

/// Waits for the resupply delay, then fills every tanker to capacity.
///
/// A cancelled `cancel` cuts the wait short; the refill still happens.
pub(crate) async fn refill_fleet(
    fleet: &Fleet,
    bus: &Bus,
    resupply: Option<Duration>,
    cancel: &CancellationToken,
) {
    if let Some(wait) = resupply {
        tokio::select! {
            _ = tokio::time::sleep(wait) => {}
            _ = cancel.cancelled() => {
                tracing::debug!(?wait, "resupply wait cut short by shutdown");
            }
        }
    }

    let mut refilled = 0usize;
    for tanker in fleet.tankers() {
        let was_broken = tanker.snapshot().broken;
        let after = tanker.refill();
        refilled += 1;
        if was_broken && !after.broken {
            bus.publish(Event::new(EventKind::TankerRepaired).with_tanker(tanker.id()));
        }
    }
    bus.publish(Event::new(EventKind::FleetRefilled).with_quantity(refilled as f64));
}

/// Stops every busy station with zero revenue and repairs it, then resamples and
/// repairs every tanker whose temperature or pressure is out of range.
pub(crate) fn emergency_stop(fleet: &Fleet, bus: &Bus) {
    for station in fleet.stations() {
        if !station.snapshot().busy {
            continue;
        }
        // A broken station refuses the stop; the repair below closes it anyway.
        if let Err(e) = station.stop_fueling(0.0) {
            tracing::debug!(station = station.id().0, rejection = %e, "emergency stop refused");
        }
        station.repair();
        bus.publish(Event::new(EventKind::EmergencyStop).with_station(station.id()));
        bus.publish(Event::new(EventKind::StationRepaired).with_station(station.id()));
    }

    for tanker in fleet.tankers() {
        if tanker.correct_readings() {
            bus.publish(Event::new(EventKind::TankerRepaired).with_tanker(tanker.id()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Config;
    use crate::resources::TankerOverride;

    #[tokio::test]
    async fn test_refill_reports_count_and_repairs_nominal_tankers() {
        let fleet = Fleet::reference(&Config::default());
        let bus = Bus::new(32);
        let mut rx = bus.subscribe();
        let first = fleet.tankers().next().unwrap();
        first.apply_override(TankerOverride::Broken(true)).unwrap();

        refill_fleet(&fleet, &bus, None, &CancellationToken::new()).await;

        assert!(!first.snapshot().broken);
        let repaired = rx.recv().await.unwrap();
        assert_eq!(repaired.kind, EventKind::TankerRepaired);
        assert_eq!(repaired.tanker, Some(first.id()));
        let refilled = rx.recv().await.unwrap();
        assert_eq!(refilled.kind, EventKind::FleetRefilled);
        assert_eq!(refilled.quantity, Some(4.0));
    }

    #[test]
    fn test_refill_keeps_abnormal_tanker_broken() {
        let fleet = Fleet::reference(&Config::default());
        let t = fleet.tankers().next().unwrap();
        t.update_reading(10.0, 55.0, 1.0).unwrap();
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
            .unwrap();
        let never = CancellationToken::new();
        rt.block_on(refill_fleet(&fleet, &Bus::new(8), None, &never));
        let snap = t.snapshot();
        assert!(snap.broken);
        assert_eq!(snap.level, snap.capacity);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_cuts_resupply_wait_short() {
        let fleet = Fleet::reference(&Config::default());
        let t = fleet.tankers().next().unwrap();
        t.dispense(t.snapshot().level - 10.0).unwrap();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let started = tokio::time::Instant::now();
        refill_fleet(&fleet, &Bus::new(8), Some(Duration::from_secs(60)), &cancel).await;

        assert!(started.elapsed() < Duration::from_secs(1));
        assert_eq!(t.snapshot().level, t.capacity());
    }

    #[test]
    fn test_emergency_stop_leaves_idle_stations_alone() {
        let fleet = Fleet::reference(&Config::default());
        let bus = Bus::new(8);
        let mut rx = bus.subscribe();
        emergency_stop(&fleet, &bus);
        assert!(rx.try_recv().is_err());
    }
}
