//! # Monitor: the periodic loop that mirrors, heals and alerts.
//!
//! One tick, in order:
//! 1. apply operator writes queued at the telemetry boundary (raw field overrides);
//! 2. for each tanker: snapshot → publish → auto-repair when broken with nominal
//!    readings → raise every threshold alert that holds;
//! 3. for each station: snapshot → publish → auto-repair when broken.
//!
//! ```text
//! run(token)
//!   loop {
//!     select! {
//!       token.cancelled() ─► exit (MonitorStopped)
//!       interval.tick()   ─► catch_unwind(tick())
//!                               ├─ Ok(report)  ─► next period
//!                               └─ Err(panic)  ─► TickFailed, next period
//!     }
//!   }
//! ```
//!
//! ## Rules
//! - Publishing and alert raising happen with no resource lock held.
//! - A failed publish is logged and counted; the tick continues with the next node.
//! - The stop signal is observed between ticks and inside a tick's resupply wait,
//!   so a stop is seen within one period. The controller's grace period bounds the
//!   rest.

use std::sync::Arc;

use futures::FutureExt;
use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::core::alerts::{Alert, AlertDesk};
use crate::error::TickError;
use crate::events::{Bus, Event, EventKind};
use crate::fleet::{Fleet, StationId, TankerId};
use crate::subscribers::panic_message;
use crate::telemetry::{
    NodeId, NodeValue, OperatorWrite, Override, StationField, TankerField, Telemetry,
};

/// What one monitor tick did.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Operator writes applied to resources.
    pub writes_applied: usize,
    /// Operator writes that could not be applied.
    pub writes_rejected: usize,
    /// Publishes that failed at the telemetry boundary.
    pub publish_failures: usize,
    /// Tankers auto-repaired by this tick.
    pub tankers_repaired: usize,
    /// Stations auto-repaired by this tick.
    pub stations_repaired: usize,
    /// Alerts raised (and remediated) by this tick.
    pub alerts_raised: usize,
}

#[derive(Clone)]
pub(crate) struct Monitor {
    fleet: Arc<Fleet>,
    telemetry: Arc<dyn Telemetry>,
    alerts: Arc<AlertDesk>,
    bus: Bus,
}

impl Monitor {
    pub(crate) fn new(
        fleet: Arc<Fleet>,
        telemetry: Arc<dyn Telemetry>,
        alerts: Arc<AlertDesk>,
        bus: Bus,
    ) -> Self {
        Self {
            fleet,
            telemetry,
            alerts,
            bus,
        }
    }

    /// Ticks every `period` until `token` is cancelled.
    pub(crate) async fn run(self, period: std::time::Duration, token: CancellationToken) {
        self.bus.publish(Event::new(EventKind::MonitorStarted));
        let mut interval = time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = token.cancelled() => break,
                _ = interval.tick() => {
                    if let Err(e) = self.guarded_tick(&token).await {
                        tracing::error!(error = %e, "monitor tick failed");
                    }
                }
            }
        }
        self.bus.publish(Event::new(EventKind::MonitorStopped));
    }

    /// Runs one tick, converting a panic into [`TickError`] and a `TickFailed` event.
    ///
    /// A cancelled `cancel` cuts any resupply wait inside the tick short.
    pub(crate) async fn guarded_tick(
        &self,
        cancel: &CancellationToken,
    ) -> Result<TickReport, TickError> {
        match std::panic::AssertUnwindSafe(self.tick(cancel)).catch_unwind().await {
            Ok(report) => Ok(report),
            Err(panic) => {
                let err = TickError::Panicked {
                    info: panic_message(&*panic),
                };
                self.bus
                    .publish(Event::new(EventKind::TickFailed).with_reason(err.to_string()));
                Err(err)
            }
        }
    }

    async fn tick(&self, cancel: &CancellationToken) -> TickReport {
        let mut report = TickReport::default();

        for write in self.telemetry.drain_writes().await {
            self.apply_write(write, &mut report);
        }

        for tanker in self.fleet.tankers() {
            let snap = tanker.snapshot();
            let id = snap.id;
            let values = [
                (TankerField::FuelLevel, NodeValue::Number(snap.level)),
                (TankerField::Temperature, NodeValue::Number(snap.temperature)),
                (TankerField::Pressure, NodeValue::Number(snap.pressure)),
                (TankerField::Broken, NodeValue::Flag(snap.broken)),
            ];
            for (field, value) in values {
                self.publish(NodeId::tanker(id, field), value, Some(id), None, &mut report)
                    .await;
            }

            if snap.broken && tanker.limits().readings_nominal(snap.temperature, snap.pressure) {
                tanker.repair();
                report.tankers_repaired += 1;
                self.bus
                    .publish(Event::new(EventKind::TankerRepaired).with_tanker(id));
            }

            for alert in Alert::evaluate(&snap, tanker.fuel(), tanker.limits()) {
                report.alerts_raised += 1;
                self.alerts.raise_until(alert, cancel).await;
            }
        }

        for station in self.fleet.stations() {
            let snap = station.snapshot();
            let id = snap.id;
            let values = [
                (StationField::Dispensed, NodeValue::Number(snap.dispensed)),
                (StationField::Sold, NodeValue::Number(snap.sold)),
                (StationField::Busy, NodeValue::Flag(snap.busy)),
                (StationField::Broken, NodeValue::Flag(snap.broken)),
            ];
            for (field, value) in values {
                self.publish(NodeId::station(id, field), value, None, Some(id), &mut report)
                    .await;
            }

            if snap.broken {
                station.repair();
                report.stations_repaired += 1;
                self.bus
                    .publish(Event::new(EventKind::StationRepaired).with_station(id));
            }
        }

        report
    }

    fn apply_write(&self, write: OperatorWrite, report: &mut TickReport) {
        let described = format!("{}={}", write.node, write.value);
        let applied = match write.to_override() {
            Ok(None) => return,
            Ok(Some(Override::Tanker(id, field))) => self
                .fleet
                .tanker(id)
                .ok_or(format!("unknown tanker {id}"))
                .and_then(|t| t.apply_override(field).map_err(|e| e.to_string()))
                .map(|()| Event::new(EventKind::OperatorWriteApplied).with_tanker(id)),
            Ok(Some(Override::Station(id, field))) => self
                .fleet
                .station(id)
                .ok_or(format!("unknown station {id}"))
                .and_then(|s| s.apply_override(field).map_err(|e| e.to_string()))
                .map(|()| Event::new(EventKind::OperatorWriteApplied).with_station(id)),
            Err(e) => Err(e.to_string()),
        };

        match applied {
            Ok(ev) => {
                report.writes_applied += 1;
                self.bus.publish(ev.with_reason(described));
            }
            Err(why) => {
                report.writes_rejected += 1;
                tracing::warn!(write = %described, reason = %why, "operator write rejected");
                self.bus.publish(
                    Event::new(EventKind::OperatorWriteRejected)
                        .with_reason(format!("{described}: {why}")),
                );
            }
        }
    }

    async fn publish(
        &self,
        node: NodeId,
        value: NodeValue,
        tanker: Option<TankerId>,
        station: Option<StationId>,
        report: &mut TickReport,
    ) {
        let Err(e) = self.telemetry.publish(node, value).await else {
            return;
        };
        report.publish_failures += 1;
        tracing::warn!(%node, error = %e, "telemetry publish failed");

        let mut ev =
            Event::new(EventKind::PublishFailed).with_reason(format!("node={node} err={e}"));
        if let Some(id) = tanker {
            ev = ev.with_tanker(id);
        }
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
    use crate::fleet::FuelType;
    use crate::resources::{StationOverride, TankerOverride};
    use crate::telemetry::MemoryTelemetry;
    use std::time::Duration;

    async fn setup() -> (Arc<Fleet>, Arc<MemoryTelemetry>, Monitor) {
        let cfg = Config {
            resupply_delay: Duration::ZERO,
            ..Config::default()
        };
        let fleet = Arc::new(Fleet::reference(&cfg));
        let telemetry = Arc::new(MemoryTelemetry::new());
        telemetry.register(&fleet).await.unwrap();
        let bus = Bus::new(256);
        let alerts = Arc::new(AlertDesk::new(
            Arc::clone(&fleet),
            telemetry.clone(),
            bus.clone(),
            cfg,
        ));
        let monitor = Monitor::new(Arc::clone(&fleet), telemetry.clone(), alerts, bus);
        (fleet, telemetry, monitor)
    }

    #[tokio::test]
    async fn test_quiet_tick_publishes_state() {
        let (fleet, telemetry, monitor) = setup().await;
        let tanker = fleet.tankers().next().unwrap();
        tanker.dispense(100.0).unwrap();

        let report = monitor.guarded_tick(&CancellationToken::new()).await.unwrap();
        assert_eq!(report, TickReport::default());
        assert_eq!(
            telemetry.read(NodeId::tanker(tanker.id(), TankerField::FuelLevel)),
            Some(NodeValue::Number(1400.0))
        );
    }

    #[tokio::test]
    async fn test_broken_tanker_with_nominal_readings_is_repaired() {
        let (fleet, _telemetry, monitor) = setup().await;
        let tanker = fleet.tankers().next().unwrap();
        tanker.apply_override(TankerOverride::Broken(true)).unwrap();

        let report = monitor.guarded_tick(&CancellationToken::new()).await.unwrap();
        assert_eq!(report.tankers_repaired, 1);
        assert!(!tanker.snapshot().broken);
    }

    #[tokio::test]
    async fn test_broken_station_is_repaired() {
        let (fleet, _telemetry, monitor) = setup().await;
        let station = fleet.stations().nth(2).unwrap();
        station.apply_override(StationOverride::Broken(true)).unwrap();

        let report = monitor.guarded_tick(&CancellationToken::new()).await.unwrap();
        assert_eq!(report.stations_repaired, 1);
        assert!(!station.snapshot().broken);
    }

    #[tokio::test]
    async fn test_operator_write_applied_before_evaluation() {
        let (fleet, telemetry, monitor) = setup().await;
        let tanker = fleet.tanker_for(&FuelType::from("АИ-95")).unwrap();
        telemetry
            .write(
                NodeId::tanker(tanker.id(), TankerField::Temperature),
                NodeValue::Number(50.0),
            )
            .unwrap();

        let report = monitor.guarded_tick(&CancellationToken::new()).await.unwrap();
        assert_eq!(report.writes_applied, 1);
        assert_eq!(report.alerts_raised, 1);
        assert!(tanker.limits().temperature_nominal(tanker.snapshot().temperature));
    }

    #[tokio::test]
    async fn test_low_fuel_refills_and_later_tankers_do_not_alert() {
        let (fleet, _telemetry, monitor) = setup().await;
        for t in fleet.tankers() {
            t.dispense(t.snapshot().level - 100.0).unwrap();
        }

        let report = monitor.guarded_tick(&CancellationToken::new()).await.unwrap();
        assert_eq!(report.alerts_raised, 1);
        assert!(fleet.tankers().all(|t| t.snapshot().level == t.capacity()));
    }

    #[tokio::test]
    async fn test_publish_failures_do_not_abort_tick() {
        let (fleet, telemetry, monitor) = setup().await;
        let station = fleet.stations().next().unwrap();
        station.apply_override(StationOverride::Broken(true)).unwrap();
        telemetry.fail_next_publishes(3);

        let report = monitor.guarded_tick(&CancellationToken::new()).await.unwrap();
        assert_eq!(report.publish_failures, 3);
        assert_eq!(report.stations_repaired, 1);
    }

    #[tokio::test]
    async fn test_rejected_write_is_counted() {
        let (fleet, telemetry, monitor) = setup().await;
        let station = fleet.stations().next().unwrap();
        telemetry
            .write(
                NodeId::station(station.id(), StationField::Dispensed),
                NodeValue::Number(-5.0),
            )
            .unwrap();

        let report = monitor.guarded_tick(&CancellationToken::new()).await.unwrap();
        assert_eq!(report.writes_rejected, 1);
        assert_eq!(station.snapshot().dispensed, 0.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_during_resupply_is_seen_within_one_period() {
        let cfg = Config::default();
        let fleet = Arc::new(Fleet::reference(&cfg));
        let telemetry = Arc::new(MemoryTelemetry::new());
        telemetry.register(&fleet).await.unwrap();
        let bus = Bus::new(256);
        let alerts = Arc::new(AlertDesk::new(
            Arc::clone(&fleet),
            telemetry.clone(),
            bus.clone(),
            cfg.clone(),
        ));
        let monitor = Monitor::new(Arc::clone(&fleet), telemetry, Arc::clone(&alerts), bus);
        let tanker = fleet.tankers().next().unwrap();
        tanker.dispense(tanker.snapshot().level - 10.0).unwrap();

        let token = CancellationToken::new();
        let handle = tokio::spawn(monitor.run(cfg.monitor_period, token.clone()));
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(alerts.active().len(), 1);

        let cancelled_at = tokio::time::Instant::now();
        token.cancel();
        handle.await.unwrap();

        assert!(cancelled_at.elapsed() < cfg.monitor_period);
        assert!(alerts.active().is_empty());
        assert_eq!(tanker.snapshot().level, tanker.capacity());
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_stops_on_cancel() {
        let (_fleet, _telemetry, monitor) = setup().await;
        let token = CancellationToken::new();
        let handle = tokio::spawn(monitor.run(Duration::from_secs(1), token.clone()));
        tokio::time::sleep(Duration::from_millis(3500)).await;
        token.cancel();
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .unwrap()
            .unwrap();
    }
}
