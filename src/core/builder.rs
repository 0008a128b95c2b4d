use std::sync::Arc;

use crate::{
    core::{Config, controller::Controller},
    fleet::Fleet,
    subscribers::Subscribe,
    telemetry::{MemoryTelemetry, Telemetry},
};

/// Builder for constructing a [`Controller`] with optional parts.
pub struct ControllerBuilder {
    cfg: Config,
    fleet: Option<Fleet>,
    telemetry: Option<Arc<dyn Telemetry>>,
    subscribers: Vec<Arc<dyn Subscribe>>,
}

impl ControllerBuilder {
    /// Creates a new builder with the given configuration.
    pub fn new(cfg: Config) -> Self {
        Self {
            cfg,
            fleet: None,
            telemetry: None,
            subscribers: Vec::new(),
        }
    }

    /// Sets the fleet to control.
    ///
    /// Defaults to [`Fleet::reference`] built from this builder's config.
    pub fn with_fleet(mut self, fleet: Fleet) -> Self {
        self.fleet = Some(fleet);
        self
    }

    /// Sets the telemetry boundary.
    ///
    /// Defaults to a fresh [`MemoryTelemetry`]. Keep a clone of the `Arc` to inject
    /// operator writes from the outside.
    pub fn with_telemetry<T: Telemetry>(mut self, telemetry: Arc<T>) -> Self {
        self.telemetry = Some(telemetry);
        self
    }

    /// Sets event subscribers for observability.
    ///
    /// Subscribers receive runtime events (transactions, alerts, repairs, lifecycle)
    /// through dedicated workers with bounded queues, once the controller is started.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Builds the controller. Nothing runs until [`Controller::start`].
    pub fn build(self) -> Controller {
        let fleet = match self.fleet {
            Some(fleet) => fleet,
            None => Fleet::reference(&self.cfg),
        };
        let telemetry: Arc<dyn Telemetry> = match self.telemetry {
            Some(telemetry) => telemetry,
            None => Arc::new(MemoryTelemetry::new()),
        };
        Controller::new_internal(self.cfg, fleet, telemetry, self.subscribers)
    }
}
