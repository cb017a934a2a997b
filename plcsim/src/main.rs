//! PLC Simulation Harness
//!
//! Loads a controller configuration, seeds an in-memory sensor source and
//! reads sensors through the routing layer the way a protocol surface would,
//! printing every reading and the final diagnostics as JSON lines.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use plc_router::{PlcSimConfig, RoutingManager, SensorGateway};
use plc_sim::InMemorySensorSource;
use plc_types::Catalog;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "plcsim", version, about = "Read sensors through simulated PLC scan cycles")]
struct Args {
    /// Controller configuration (JSON)
    #[arg(short, long, required_unless_present = "list_models")]
    config: Option<std::path::PathBuf>,

    /// Number of read rounds
    #[arg(short = 'n', long, default_value_t = 5)]
    reads: u32,

    /// Delay between read rounds in milliseconds
    #[arg(short, long, default_value_t = 100)]
    interval_ms: u64,

    /// Sensor to seed and read, as ID=VALUE (repeatable)
    #[arg(short, long = "sensor", value_parser = parse_sensor)]
    sensors: Vec<(String, f64)>,

    /// Start with the PLC layer switched off
    #[arg(long)]
    bypass: bool,

    /// Print the vendor/model catalog and exit
    #[arg(long)]
    list_models: bool,
}

fn parse_sensor(arg: &str) -> Result<(String, f64), String> {
    let (id, value) = arg
        .split_once('=')
        .ok_or_else(|| format!("expected ID=VALUE, got '{arg}'"))?;
    let value = value
        .trim()
        .parse::<f64>()
        .map_err(|e| format!("invalid value for {id}: {e}"))?;
    Ok((id.trim().to_string(), value))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "plcsim=info,plc_types=info,plc_sim=info,plc_router=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();

    if args.list_models {
        for model in Catalog::models() {
            println!(
                "{:<20} {:<20} {:>4}ms  forcing: {}",
                model.vendor,
                model.model,
                model.default_scan_cycle_ms,
                if model.supports_forcing { "yes" } else { "no" }
            );
        }
        return Ok(());
    }

    let Some(path) = args.config.as_deref() else {
        anyhow::bail!("--config is required");
    };
    let config = PlcSimConfig::load(path)
        .with_context(|| format!("loading configuration from {}", path.display()))?;

    let source = Arc::new(InMemorySensorSource::with_values(
        args.sensors.iter().map(|(id, value)| (id.as_str(), *value)),
    ));
    let manager = Arc::new(
        RoutingManager::new(&config, source).context("building the routing layer")?,
    );
    if args.bypass {
        manager.set_simulation_enabled(false);
    }

    info!("Starting plcsim with {} controllers", manager.list_controllers().len());
    for summary in manager.list_controllers() {
        println!("{}", serde_json::to_string(&summary)?);
    }

    let gateway = SensorGateway::new(Arc::clone(&manager));
    for round in 0..args.reads {
        if round > 0 {
            tokio::time::sleep(Duration::from_millis(args.interval_ms)).await;
        }
        for (sensor_id, _) in &args.sensors {
            match gateway.read(sensor_id).await {
                Ok(reading) => println!("{}", serde_json::to_string(&reading)?),
                Err(e) => warn!("Read of {} failed: {}", sensor_id, e),
            }
        }
    }

    for diagnostics in manager.diagnostics_all() {
        println!("{}", serde_json::to_string(&diagnostics)?);
    }
    Ok(())
}
