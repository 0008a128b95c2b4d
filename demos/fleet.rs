//! Fleet demo driver.
//!
//! Seeds the reference fleet, turns on hazard injection and fires a random fueling
//! workload at the controller while the monitor runs.
//!
//! # Usage
//!
//! ```bash
//! # Run for 30 seconds
//! cargo run --example fleet -- --seconds 30
//!
//! # Run until Ctrl-C, with debug logs
//! RUST_LOG=fleetvisor=debug cargo run --example fleet -- --seconds 0
//! ```

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use fleetvisor::{Config, Controller, FaultInjection, FuelType, LogWriter, Subscribe};
use rand::Rng;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Fuel depot simulation
#[derive(Parser, Debug)]
#[command(name = "fleet")]
#[command(about = "Random fueling workload against the reference fleet")]
struct Args {
    /// Stop after this many seconds (0 = wait for Ctrl-C)
    #[arg(short, long, default_value = "20")]
    seconds: u64,

    /// Probability that a pushed reading is replaced by a hazard value
    #[arg(long, default_value = "0.05")]
    hazard: f64,

    /// Milliseconds between workload requests
    #[arg(long, default_value = "300")]
    interval_ms: u64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    tracing_subscriber::registry().with(fmt::layer()).with(filter).init();

    let cfg = Config {
        fault_injection: FaultInjection::hazard(args.hazard),
        ..Config::default()
    };
    let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(LogWriter::new())];
    let controller = Arc::new(Controller::builder(cfg).with_subscribers(subs).build());
    controller.start().await?;

    let fuels: Vec<FuelType> = controller.fleet().fuel_types().cloned().collect();
    let workload = tokio::spawn(workload(
        Arc::clone(&controller),
        fuels,
        Duration::from_millis(args.interval_ms.max(1)),
    ));

    if args.seconds == 0 {
        tokio::signal::ctrl_c().await?;
    } else {
        tokio::select! {
            _ = tokio::time::sleep(Duration::from_secs(args.seconds)) => {}
            _ = tokio::signal::ctrl_c() => {}
        }
    }
    workload.abort();
    controller.stop().await?;

    for station in controller.fleet().stations() {
        let s = station.snapshot();
        tracing::info!(
            station = s.id.0,
            fuel = %station.fuel(),
            sold = s.sold,
            revenue = s.revenue,
            "station totals"
        );
    }
    Ok(())
}

async fn workload(controller: Arc<Controller>, fuels: Vec<FuelType>, every: Duration) {
    let mut ticker = tokio::time::interval(every);
    loop {
        ticker.tick().await;

        let (fuel, quantity, reading) = {
            let mut rng = rand::rng();
            let fuel = fuels[rng.random_range(0..fuels.len())].clone();
            let quantity = f64::from(rng.random_range(10u32..=150));
            let reading = rng.random_bool(0.2).then(|| {
                (
                    rng.random_range(15.0..=25.0),
                    rng.random_range(0.9..=1.1),
                )
            });
            (fuel, quantity, reading)
        };

        if let Some((temperature, pressure)) = reading {
            if let Some(tanker) = controller.fleet().tanker_for(&fuel) {
                // Sensors report the environment only; the level belongs to dispense.
                if let Err(e) = controller.push_environment(tanker.id(), temperature, pressure) {
                    tracing::warn!(fuel = %fuel, rejection = %e, "reading refused");
                }
            }
        }

        let controller = Arc::clone(&controller);
        tokio::spawn(async move {
            match controller.fuel(&fuel, quantity).await {
                Ok(r) => tracing::debug!(
                    fuel = %r.fuel,
                    quantity = r.quantity,
                    revenue = r.revenue,
                    "sale"
                ),
                Err(e) => tracing::debug!(
                    fuel = %fuel,
                    quantity,
                    rejection = e.as_label(),
                    "sale refused"
                ),
            }
        });
    }
}
