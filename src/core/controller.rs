//! # Controller: owns the fleet, the alert desk and the monitor lifecycle.
//!
//! The [`Controller`] owns the event bus, the [`Fleet`], the [`AlertDesk`] and the
//! telemetry boundary. It starts the monitor loop and the subscriber fan-out, runs
//! fueling transactions, and stops everything within [`Config::grace`].
//!
//! ## High-level architecture
//! ```text
//! Controller::builder(cfg).with_fleet(..).with_telemetry(..).with_subscribers(..).build()
//!
//! start():
//!   telemetry.register(&fleet)                         (fatal on error)
//!   listener:  Bus.subscribe() ─► SubscriberSet::emit(Event)      (fire-and-forget)
//!   monitor:   Monitor::run(period, token.child_token())
//!
//! Event flow:
//!   Orchestrator / Monitor / AlertDesk ── publish(Event) ──► Bus ──► listener
//!                                                                      │
//!                                                                      ▼
//!                                                                SubscriberSet
//!                                                          ┌─────────┬─┴───────┐
//!                                                          ▼         ▼         ▼
//!                                                     [queue S1] [queue S2] [queue SN]
//!
//! stop():
//!   Bus.publish(ShutdownRequested)
//!   monitor token.cancel()
//!   timeout(grace, monitor):
//!      ├─ Ok       → Bus.publish(StoppedWithinGrace)
//!      └─ Timeout  → abort monitor, republish "Alerts",
//!                    Bus.publish(GraceExceeded), Err(GraceExceeded)
//!   listener token.cancel() → drain bus → SubscriberSet::shutdown()
//! ```
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use fleetvisor::{Config, Controller, FuelType};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let cfg = Config {
//!         transfer_latency: Duration::ZERO,
//!         ..Config::default()
//!     };
//!     let controller = Controller::builder(cfg).build();
//!     controller.start().await?;
//!
//!     let receipt = controller.fuel(&FuelType::from("АИ-95"), 40.0).await?;
//!     assert_eq!(receipt.quantity, 40.0);
//!
//!     controller.stop().await?;
//!     Ok(())
//! }
//! ```

use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::core::{
    alerts::{Alert, AlertDesk},
    builder::ControllerBuilder,
    monitor::{Monitor, TickReport},
    orchestrator::{Orchestrator, Receipt},
    shutdown, Config,
};
use crate::error::{Rejection, RuntimeError, TickError};
use crate::events::{Bus, Event, EventKind};
use crate::fleet::{Fleet, FuelType, TankerId};
use crate::resources::TankerSnapshot;
use crate::subscribers::{Subscribe, SubscriberSet};
use crate::telemetry::Telemetry;

struct Running {
    monitor_token: CancellationToken,
    listener_token: CancellationToken,
    monitor: JoinHandle<()>,
    listener: JoinHandle<()>,
}

/// Coordinates the fleet, transactions, the monitor loop and event delivery.
pub struct Controller {
    cfg: Config,
    bus: Bus,
    fleet: Arc<Fleet>,
    telemetry: Arc<dyn Telemetry>,
    alerts: Arc<AlertDesk>,
    orchestrator: Orchestrator,
    monitor: Monitor,
    subscribers: Vec<Arc<dyn Subscribe>>,
    running: Mutex<Option<Running>>,
}

impl Controller {
    /// Creates a builder with the given configuration.
    pub fn builder(cfg: Config) -> ControllerBuilder {
        ControllerBuilder::new(cfg)
    }

    pub(crate) fn new_internal(
        cfg: Config,
        fleet: Fleet,
        telemetry: Arc<dyn Telemetry>,
        subscribers: Vec<Arc<dyn Subscribe>>,
    ) -> Self {
        let bus = Bus::new(cfg.bus_capacity_clamped());
        let fleet = Arc::new(fleet);
        let alerts = Arc::new(AlertDesk::new(
            Arc::clone(&fleet),
            Arc::clone(&telemetry),
            bus.clone(),
            cfg.clone(),
        ));
        let orchestrator =
            Orchestrator::new(Arc::clone(&fleet), bus.clone(), cfg.transfer_wait());
        let monitor = Monitor::new(
            Arc::clone(&fleet),
            Arc::clone(&telemetry),
            Arc::clone(&alerts),
            bus.clone(),
        );
        Self {
            cfg,
            bus,
            fleet,
            telemetry,
            alerts,
            orchestrator,
            monitor,
            subscribers,
            running: Mutex::new(None),
        }
    }

    /// Registers the fleet with the telemetry boundary and starts the monitor loop
    /// and subscriber delivery.
    ///
    /// ### Errors
    /// - [`RuntimeError::AlreadyRunning`] if already started
    /// - [`RuntimeError::Telemetry`] if the boundary refuses registration
    pub async fn start(&self) -> Result<(), RuntimeError> {
        if self.is_running() {
            return Err(RuntimeError::AlreadyRunning);
        }
        self.telemetry.register(&self.fleet).await?;

        let mut slot = self.slot();
        if slot.is_some() {
            return Err(RuntimeError::AlreadyRunning);
        }

        let root = CancellationToken::new();
        let listener_token = root.child_token();
        let monitor_token = root.child_token();
        let listener = self.subscriber_listener(listener_token.clone());
        let monitor = tokio::spawn(
            self.monitor
                .clone()
                .run(self.cfg.monitor_period_clamped(), monitor_token.clone()),
        );
        tracing::info!(
            telemetry = self.telemetry.name(),
            tankers = self.fleet.tankers().count(),
            stations = self.fleet.stations().count(),
            "controller started"
        );

        *slot = Some(Running {
            monitor_token,
            listener_token,
            monitor,
            listener,
        });
        Ok(())
    }

    /// Stops the monitor loop, waiting up to [`Config::grace`] for it to exit.
    ///
    /// A stop during a low-fuel resupply wait cuts the wait short. An aborted
    /// monitor leaves no alert behind: the one it was remediating is dropped from
    /// the active set and `Alerts` is republished.
    ///
    /// ### Errors
    /// - [`RuntimeError::NotRunning`] if not started
    /// - [`RuntimeError::GraceExceeded`] if the monitor had to be aborted
    pub async fn stop(&self) -> Result<(), RuntimeError> {
        let Some(running) = self.slot().take() else {
            return Err(RuntimeError::NotRunning);
        };

        self.bus.publish(Event::new(EventKind::ShutdownRequested));
        running.monitor_token.cancel();

        let grace = self.cfg.grace;
        let mut monitor = running.monitor;
        let result = match tokio::time::timeout(grace, &mut monitor).await {
            Ok(_) => {
                self.bus.publish(Event::new(EventKind::StoppedWithinGrace));
                Ok(())
            }
            Err(_) => {
                monitor.abort();
                match monitor.await {
                    Err(e) if !e.is_cancelled() => {
                        tracing::warn!(error = %e, "monitor task failed");
                    }
                    _ => {}
                }
                self.alerts.republish().await;
                self.bus.publish(Event::new(EventKind::GraceExceeded));
                Err(RuntimeError::GraceExceeded { grace })
            }
        };

        running.listener_token.cancel();
        if let Err(e) = running.listener.await {
            tracing::warn!(error = %e, "subscriber listener failed");
        }
        tracing::info!(ok = result.is_ok(), "controller stopped");
        result
    }

    /// Starts, waits for an OS termination signal, then stops gracefully.
    pub async fn run_until_signal(&self) -> Result<(), RuntimeError> {
        self.start().await?;
        match shutdown::wait_for_shutdown_signal().await {
            Ok(signal) => {
                tracing::info!(signal = signal.as_str(), "shutdown signal received");
                self.stop().await
            }
            Err(e) => {
                if let Err(stop) = self.stop().await {
                    tracing::warn!(error = %stop, "stop after signal failure");
                }
                Err(RuntimeError::Signal(e))
            }
        }
    }

    /// Returns `true` between a successful `start()` and the next `stop()`.
    pub fn is_running(&self) -> bool {
        self.slot().is_some()
    }

    /// Runs one fueling transaction (see [`Receipt`]).
    pub async fn fuel(&self, fuel: &FuelType, quantity: f64) -> Result<Receipt, Rejection> {
        self.orchestrator.fuel(fuel, quantity).await
    }

    /// Applies a sensor reading to a tanker.
    ///
    /// ### Errors
    /// - [`Rejection::UnknownResource`] if no tanker has this id
    /// - [`Rejection::InvalidQuantity`] for non-finite readings
    pub fn push_reading(
        &self,
        tanker: TankerId,
        level: f64,
        temperature: f64,
        pressure: f64,
    ) -> Result<TankerSnapshot, Rejection> {
        self.fleet
            .tanker(tanker)
            .ok_or(Rejection::UnknownResource { id: tanker.0 })?
            .update_reading(level, temperature, pressure)
    }

    /// Applies a temperature/pressure reading to a tanker, keeping its fuel level.
    ///
    /// ### Errors
    /// - [`Rejection::UnknownResource`] if no tanker has this id
    /// - [`Rejection::InvalidQuantity`] for non-finite readings
    pub fn push_environment(
        &self,
        tanker: TankerId,
        temperature: f64,
        pressure: f64,
    ) -> Result<TankerSnapshot, Rejection> {
        self.fleet
            .tanker(tanker)
            .ok_or(Rejection::UnknownResource { id: tanker.0 })?
            .update_environment(temperature, pressure)
    }

    /// Raises an alert and runs its remediation; returns once it is resolved.
    pub async fn raise_alert(&self, alert: Alert) {
        self.alerts.raise(alert).await
    }

    /// Runs one monitor tick in the caller's task, independent of the loop.
    pub async fn tick(&self) -> Result<TickReport, TickError> {
        self.monitor.guarded_tick(&CancellationToken::new()).await
    }

    /// The fleet under control.
    pub fn fleet(&self) -> &Fleet {
        &self.fleet
    }

    /// The active-alert desk.
    pub fn alerts(&self) -> &AlertDesk {
        &self.alerts
    }

    /// The event bus (subscribe to observe runtime events).
    pub fn bus(&self) -> &Bus {
        &self.bus
    }

    /// The configuration this controller was built with.
    pub fn config(&self) -> &Config {
        &self.cfg
    }

    /// The telemetry boundary.
    pub fn telemetry(&self) -> &Arc<dyn Telemetry> {
        &self.telemetry
    }

    /// Subscribes to the bus and forwards events to a fresh subscriber set.
    ///
    /// After cancellation, events still buffered on the bus are forwarded before the
    /// subscriber workers are drained.
    fn subscriber_listener(&self, token: CancellationToken) -> JoinHandle<()> {
        let mut rx = self.bus.subscribe();
        let set = SubscriberSet::new(self.subscribers.clone(), self.bus.clone());
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    biased;
                    ev = rx.recv() => match ev {
                        Ok(ev) => set.emit(ev),
                        Err(RecvError::Lagged(n)) => {
                            tracing::warn!(skipped = n, "subscriber listener lagged");
                        }
                        Err(RecvError::Closed) => break,
                    },
                    _ = token.cancelled() => break,
                }
            }
            while let Ok(ev) = rx.try_recv() {
                set.emit(ev);
            }
            set.shutdown().await;
        })
    }

    fn slot(&self) -> std::sync::MutexGuard<'_, Option<Running>> {
        self.running.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TelemetryError;
    use crate::telemetry::{MemoryTelemetry, NodeId, NodeValue, OperatorWrite};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct Recorder(Arc<Mutex<Vec<EventKind>>>);

    #[async_trait]
    impl Subscribe for Recorder {
        async fn on_event(&self, ev: &Event) {
            self.0.lock().unwrap().push(ev.kind);
        }
        fn name(&self) -> &'static str {
            "recorder"
        }
    }

    struct Panicky;

    #[async_trait]
    impl Subscribe for Panicky {
        async fn on_event(&self, ev: &Event) {
            if ev.kind == EventKind::MonitorStarted {
                panic!("subscriber blew up");
            }
        }
        fn name(&self) -> &'static str {
            "panicky"
        }
    }

    /// Memory telemetry whose second `Alerts` publish (the resolve) hangs for a minute.
    struct StallingResolve {
        inner: MemoryTelemetry,
        alerts_published: AtomicUsize,
    }

    #[async_trait]
    impl Telemetry for StallingResolve {
        async fn register(&self, fleet: &Fleet) -> Result<(), TelemetryError> {
            self.inner.register(fleet).await
        }
        async fn publish(&self, node: NodeId, value: NodeValue) -> Result<(), TelemetryError> {
            let stall = node == NodeId::Alerts
                && self.alerts_published.fetch_add(1, Ordering::SeqCst) == 1;
            if stall {
                tokio::time::sleep(Duration::from_secs(60)).await;
            }
            self.inner.publish(node, value).await
        }
        async fn drain_writes(&self) -> Vec<OperatorWrite> {
            self.inner.drain_writes().await
        }
    }

    fn quick() -> Config {
        Config {
            monitor_period: Duration::from_millis(100),
            transfer_latency: Duration::ZERO,
            resupply_delay: Duration::ZERO,
            grace: Duration::from_secs(1),
            ..Config::default()
        }
    }

    #[tokio::test]
    async fn test_start_twice_is_rejected() {
        let c = Controller::builder(quick()).build();
        c.start().await.unwrap();
        assert!(matches!(c.start().await, Err(RuntimeError::AlreadyRunning)));
        c.stop().await.unwrap();
        assert!(matches!(c.stop().await, Err(RuntimeError::NotRunning)));
    }

    #[tokio::test]
    async fn test_start_fails_when_boundary_is_down() {
        let telemetry = Arc::new(MemoryTelemetry::new());
        telemetry.set_available(false);
        let c = Controller::builder(quick()).with_telemetry(telemetry).build();
        assert!(matches!(c.start().await, Err(RuntimeError::Telemetry(_))));
        assert!(!c.is_running());
    }

    #[tokio::test]
    async fn test_lifecycle_events_reach_subscribers() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let c = Controller::builder(quick())
            .with_subscribers(vec![Arc::new(Recorder(Arc::clone(&seen)))])
            .build();
        c.start().await.unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        c.stop().await.unwrap();

        let seen = seen.lock().unwrap().clone();
        for kind in [
            EventKind::MonitorStarted,
            EventKind::ShutdownRequested,
            EventKind::MonitorStopped,
            EventKind::StoppedWithinGrace,
        ] {
            assert!(seen.contains(&kind), "missing {kind:?} in {seen:?}");
        }
    }

    #[tokio::test]
    async fn test_push_reading_unknown_tanker() {
        let c = Controller::builder(quick()).build();
        assert_eq!(
            c.push_reading(TankerId(99), 100.0, 20.0, 1.0),
            Err(Rejection::UnknownResource { id: 99 })
        );
        let snap = c.push_reading(TankerId(1), 100.0, 45.0, 1.0).unwrap();
        assert!(snap.broken);
    }

    #[tokio::test]
    async fn test_push_environment_keeps_level() {
        let c = Controller::builder(quick()).build();
        let t = c.fleet().tankers().next().unwrap();
        t.dispense(200.0).unwrap();
        let snap = c.push_environment(t.id(), 45.0, 1.0).unwrap();
        assert_eq!(snap.level, 1300.0);
        assert!(snap.broken);
        assert_eq!(
            c.push_environment(TankerId(99), 20.0, 1.0),
            Err(Rejection::UnknownResource { id: 99 })
        );
    }

    #[tokio::test]
    async fn test_stop_survives_panicking_subscriber() {
        let c = Controller::builder(quick())
            .with_subscribers(vec![Arc::new(Panicky)])
            .build();
        c.start().await.unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;
        c.stop().await.unwrap();
        assert!(!c.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_during_resupply_returns_within_one_period() {
        let cfg = Config::default();
        let period = cfg.monitor_period;
        let c = Controller::builder(cfg).build();
        let t = c.fleet().tankers().next().unwrap();
        t.dispense(t.snapshot().level - 10.0).unwrap();

        c.start().await.unwrap();
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(c.alerts().active().len(), 1);

        let stopping = tokio::time::Instant::now();
        c.stop().await.unwrap();
        assert!(stopping.elapsed() < period);
        assert!(c.alerts().active().is_empty());
        assert_eq!(t.snapshot().level, t.capacity());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_aborts_monitor_stuck_in_remediation() {
        let cfg = Config {
            resupply_delay: Duration::from_secs(60),
            grace: Duration::from_secs(1),
            ..quick()
        };
        let telemetry = Arc::new(StallingResolve {
            inner: MemoryTelemetry::new(),
            alerts_published: AtomicUsize::new(0),
        });
        let c = Controller::builder(cfg)
            .with_telemetry(Arc::clone(&telemetry))
            .build();
        let t = c.fleet().tankers().next().unwrap();
        t.dispense(t.snapshot().level - 10.0).unwrap();

        c.start().await.unwrap();
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(c.alerts().active().len(), 1);

        let err = c.stop().await.unwrap_err();
        assert!(matches!(err, RuntimeError::GraceExceeded { .. }));
        assert!(!c.is_running());
        assert!(c.alerts().active().is_empty());
        assert_eq!(
            telemetry.inner.read(NodeId::Alerts),
            Some(NodeValue::Text("".into()))
        );
    }
}
