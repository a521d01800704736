//! # lumenhubd — lumenhub daemon
//!
//! Composition root that wires the gateway adapter into the hub and runs it.
//!
//! ## Responsibilities
//! - Parse configuration (env vars, config file)
//! - Install the `tracing` subscriber
//! - Construct the gateway adapter and the in-process event bus
//! - Start the hub and forward gateway telemetry into it
//! - Log every published event
//! - Handle graceful shutdown (SIGINT)
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer; no domain logic belongs here.

mod config;

use std::sync::Arc;

use tokio::sync::broadcast;
use tracing_subscriber::EnvFilter;

use lumenhub_adapter_virtual::VirtualGateway;
use lumenhub_app::event_bus::InProcessEventBus;
use lumenhub_app::hub;

use config::Config;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&config.logging.filter)?)
        .init();

    // Gateway
    let (gateway, mut telemetry) = VirtualGateway::new(config.virtual_gateway.clone());
    let gateway = Arc::new(gateway);

    // Event bus
    let event_bus = InProcessEventBus::new(256);
    let mut events = event_bus.subscribe();

    // Hub
    let running = hub::start(gateway, event_bus, config.hub_config()).await?;

    let handle = running.handle.clone();
    tokio::spawn(async move {
        while let Some(message) = telemetry.recv().await {
            if handle.telemetry(message).is_err() {
                break;
            }
        }
    });

    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => tracing::info!(
                    event = %event.name(),
                    device = event.device.as_ref().map(ToString::to_string),
                    "event"
                ),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "event log lagging");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    });

    tracing::info!("lumenhubd running, press ctrl-c to stop");
    tokio::signal::ctrl_c().await?;

    tracing::info!("shutting down");
    running.handle.shutdown()?;
    running.task.await?;
    Ok(())
}
