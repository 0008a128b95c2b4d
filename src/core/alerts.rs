//! # Alert desk: the active-alert set and its synchronous remediation.
//!
//! [`AlertDesk::raise`] is one call that records an alert, publishes the active set,
//! runs the remediation for the alert's class and then resolves it:
//!
//! ```text
//! raise(alert)
//!   ├─► lock(active)                                  (tokio mutex, held to the end)
//!   ├─► active.push(alert) ─► publish "Alerts" = join("; ")
//!   ├─► remediate(alert.kind)
//!   │     ├─ LowFuel        ─► sleep(resupply) or stop ─► every tanker: refill()
//!   │     └─ Temperature/Pressure ─► every busy station: stop(0) + repair()
//!   │                             └► every abnormal tanker: resample + repair()
//!   ├─► active.remove(alert.key) ─► publish "Alerts"
//!   └─► unlock
//! ```
//!
//! ## Rules
//! - Lock order is alert lock (outer) → one resource lock at a time (inner).
//!   Resource locks are taken and released inside each resource call.
//! - Remediations are serialized: only one runs at a time, system-wide, and the
//!   raiser is blocked for its full duration (including the resupply delay).
//! - The monitor's stop signal cuts the resupply delay short; the refill and the
//!   resolve still run.
//! - An alert whose remediation is dropped midway is removed from the active set.
//! - The active set is keyed by `(tanker, kind)`; the published text keeps the
//!   human-readable messages.

use std::fmt;
use std::sync::{Arc, Mutex as StdMutex, PoisonError};

use tokio::sync::{Mutex, MutexGuard};
use tokio_util::sync::CancellationToken;

use crate::core::remediation;
use crate::core::Config;
use crate::events::{Bus, Event, EventKind};
use crate::fleet::{Fleet, FuelType, TankerId};
use crate::policies::Limits;
use crate::resources::TankerSnapshot;
use crate::telemetry::{NodeId, NodeValue, Telemetry};

/// Separator used when publishing the active set.
pub const ALERT_SEPARATOR: &str = "; ";

/// Classification of an alert.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AlertKind {
    /// Fuel level below `Limits::low_fuel`; remediated by refilling the fleet.
    LowFuel,
    /// Temperature above `Limits::max_temperature`.
    HighTemperature,
    /// Temperature below `Limits::min_temperature`.
    LowTemperature,
    /// Pressure above `Limits::max_pressure`.
    HighPressure,
    /// Pressure below `Limits::min_pressure`.
    LowPressure,
}

impl AlertKind {
    /// Returns `true` for temperature and pressure alerts (emergency-stop class).
    pub fn is_environmental(self) -> bool {
        !matches!(self, AlertKind::LowFuel)
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(self) -> &'static str {
        match self {
            AlertKind::LowFuel => "low_fuel",
            AlertKind::HighTemperature => "high_temperature",
            AlertKind::LowTemperature => "low_temperature",
            AlertKind::HighPressure => "high_pressure",
            AlertKind::LowPressure => "low_pressure",
        }
    }
}

/// A raised condition pending remediation.
#[derive(Clone, Debug, PartialEq)]
pub struct Alert {
    /// Tanker whose reading raised the alert.
    pub tanker: TankerId,
    /// Fuel type that tanker carries.
    pub fuel: FuelType,
    /// Which threshold was crossed.
    pub kind: AlertKind,
    /// Human-readable text, as published on the `Alerts` node.
    pub message: Arc<str>,
}

impl Alert {
    /// Builds an alert whose message names the tanker and the offending reading.
    pub fn new(tanker: TankerId, fuel: FuelType, kind: AlertKind, reading: f64) -> Self {
        let what = match kind {
            AlertKind::LowFuel => format!("low fuel {reading} l"),
            AlertKind::HighTemperature => format!("high temperature {reading} °C"),
            AlertKind::LowTemperature => format!("low temperature {reading} °C"),
            AlertKind::HighPressure => format!("high pressure {reading} bar"),
            AlertKind::LowPressure => format!("low pressure {reading} bar"),
        };
        let message = format!("Tanker {tanker} ({fuel}): {what}");
        Self {
            tanker,
            fuel,
            kind,
            message: message.into(),
        }
    }

    /// Evaluates every threshold against a snapshot, in the fixed order
    /// low fuel → high temperature → low temperature → high pressure → low pressure.
    ///
    /// Conditions are independent: all that hold are returned.
    pub fn evaluate(snap: &TankerSnapshot, fuel: &FuelType, limits: &Limits) -> Vec<Alert> {
        let checks = [
            (limits.fuel_low(snap.level), AlertKind::LowFuel, snap.level),
            (
                limits.temperature_high(snap.temperature),
                AlertKind::HighTemperature,
                snap.temperature,
            ),
            (
                limits.temperature_low(snap.temperature),
                AlertKind::LowTemperature,
                snap.temperature,
            ),
            (
                limits.pressure_high(snap.pressure),
                AlertKind::HighPressure,
                snap.pressure,
            ),
            (
                limits.pressure_low(snap.pressure),
                AlertKind::LowPressure,
                snap.pressure,
            ),
        ];
        checks
            .into_iter()
            .filter(|(hit, _, _)| *hit)
            .map(|(_, kind, reading)| Alert::new(snap.id, fuel.clone(), kind, reading))
            .collect()
    }

    /// Identity of the condition inside the active set.
    pub fn key(&self) -> (TankerId, AlertKind) {
        (self.tanker, self.kind)
    }
}

impl fmt::Display for Alert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Active-alert set plus the remediation procedures it triggers.
pub struct AlertDesk {
    fleet: Arc<Fleet>,
    telemetry: Arc<dyn Telemetry>,
    bus: Bus,
    cfg: Config,
    active: Mutex<Vec<Alert>>,
    /// Last published messages, readable without waiting on a running remediation.
    view: StdMutex<Vec<Arc<str>>>,
}

impl AlertDesk {
    pub(crate) fn new(
        fleet: Arc<Fleet>,
        telemetry: Arc<dyn Telemetry>,
        bus: Bus,
        cfg: Config,
    ) -> Self {
        Self {
            fleet,
            telemetry,
            bus,
            cfg,
            active: Mutex::new(Vec::new()),
            view: StdMutex::new(Vec::new()),
        }
    }

    /// Messages of the currently active alerts, in raise order.
    pub fn active(&self) -> Vec<Arc<str>> {
        self.view
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// The active messages joined by `"; "`, as published on the `Alerts` node.
    pub fn joined(&self) -> String {
        self.active().join(ALERT_SEPARATOR)
    }

    /// Records `alert`, remediates it and resolves it (see module docs).
    ///
    /// A second raise for a `(tanker, kind)` that is already active does not add a
    /// second entry.
    pub async fn raise(&self, alert: Alert) {
        self.raise_until(alert, &CancellationToken::new()).await;
    }

    /// Same as [`raise`](Self::raise), but a cancelled `cancel` cuts the resupply
    /// wait short.
    ///
    /// If the returned future is dropped midway, the alert is still removed from the
    /// active set and the view; the `Alerts` node is republished in the background.
    pub(crate) async fn raise_until(&self, alert: Alert, cancel: &CancellationToken) {
        let mut pending = Pending {
            desk: self,
            active: self.active.lock().await,
            alert,
            finished: false,
        };
        let key = pending.alert.key();

        if !pending.active.iter().any(|a| a.key() == key) {
            let alert = pending.alert.clone();
            pending.active.push(alert);
        }
        self.publish(&pending.active).await;
        self.bus.publish(
            Event::new(EventKind::AlertRaised)
                .with_tanker(pending.alert.tanker)
                .with_fuel(pending.alert.fuel.clone())
                .with_reason(Arc::clone(&pending.alert.message)),
        );

        if pending.alert.kind.is_environmental() {
            remediation::emergency_stop(&self.fleet, &self.bus);
        } else {
            let resupply = self.cfg.resupply_wait();
            remediation::refill_fleet(&self.fleet, &self.bus, resupply, cancel).await;
        }

        pending.active.retain(|a| a.key() != key);
        self.publish(&pending.active).await;
        pending.finished = true;
        self.bus.publish(
            Event::new(EventKind::AlertResolved)
                .with_tanker(pending.alert.tanker)
                .with_fuel(pending.alert.fuel.clone())
                .with_reason(Arc::clone(&pending.alert.message)),
        );
    }

    /// Publishes the current view to `Alerts` again.
    pub(crate) async fn republish(&self) {
        let text = self.joined();
        publish_text(self.telemetry.as_ref(), &self.bus, text).await;
    }

    async fn publish(&self, active: &[Alert]) {
        let text = self.set_view(active);
        publish_text(self.telemetry.as_ref(), &self.bus, text).await;
    }

    fn set_view(&self, active: &[Alert]) -> String {
        let messages: Vec<Arc<str>> = active.iter().map(|a| Arc::clone(&a.message)).collect();
        let text = messages.join(ALERT_SEPARATOR);
        *self.view.lock().unwrap_or_else(PoisonError::into_inner) = messages;
        text
    }
}

async fn publish_text(telemetry: &dyn Telemetry, bus: &Bus, text: String) {
    if let Err(e) = telemetry
        .publish(NodeId::Alerts, NodeValue::Text(text.into()))
        .await
    {
        tracing::warn!(error = %e, "publishing alerts failed");
        bus.publish(
            Event::new(EventKind::PublishFailed)
                .with_reason(format!("node={} err={e}", NodeId::Alerts)),
        );
    }
}

/// The alert lock plus the alert being remediated under it.
///
/// Dropping it before `finished` is set (an aborted monitor task, a cancelled
/// caller) removes the alert so the desk never reports a remediation nobody runs.
struct Pending<'a> {
    desk: &'a AlertDesk,
    active: MutexGuard<'a, Vec<Alert>>,
    alert: Alert,
    finished: bool,
}

impl Drop for Pending<'_> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        let key = self.alert.key();
        self.active.retain(|a| a.key() != key);
        let text = self.desk.set_view(&self.active);

        tracing::warn!(alert = %self.alert, "remediation abandoned");
        self.desk.bus.publish(
            Event::new(EventKind::AlertResolved)
                .with_tanker(self.alert.tanker)
                .with_fuel(self.alert.fuel.clone())
                .with_reason(format!("abandoned: {}", self.alert.message)),
        );

        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            let telemetry = Arc::clone(&self.desk.telemetry);
            let bus = self.desk.bus.clone();
            handle.spawn(async move { publish_text(telemetry.as_ref(), &bus, text).await });
        }
    }
}
