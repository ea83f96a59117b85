//! # nuki-server
//!
//! Headless daemon that bridges Nuki Smart Locks over Bluetooth Low Energy.
//!
//! This binary:
//! - loads (or creates) the bridge identity and the paired locks from `bridge.json`
//! - keeps a background scan running for lock beacons and pairing advertisements
//! - refreshes every paired lock's state at startup
//! - logs the callback objects and push events the bridge emits
//!
//! The HTTP façade is a separate concern and talks to [`nuki_ble::Bridge`].

mod config;

use std::sync::Arc;

use nuki_ble::{BleAdapter, Bridge, BridgeEvent, BroadcastPublisher, BtleplugAdapter, EventPublisher};
use nuki_store::{ConfigStore, JsonFileStore};
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::ServerConfig;

const EVENT_BUFFER: usize = 64;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // -----------------------------------------------------------------------
    // 1. Load configuration
    // -----------------------------------------------------------------------
    let config = ServerConfig::from_env();

    // -----------------------------------------------------------------------
    // 2. Initialize tracing (respects RUST_LOG env var)
    // -----------------------------------------------------------------------
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.default_log_filter())),
        )
        .init();

    info!("Starting Nuki bridge v{}", env!("CARGO_PKG_VERSION"));
    info!(?config, "Loaded configuration");

    // -----------------------------------------------------------------------
    // 3. Initialize subsystems
    // -----------------------------------------------------------------------

    // Configuration record
    let store = match &config.config_path {
        Some(dir) => JsonFileStore::in_dir(dir),
        None => JsonFileStore::default_location()?,
    };
    info!(path = %store.path().display(), "Using configuration file");
    let store: Arc<dyn ConfigStore> = Arc::new(store);

    // Bluetooth adapter
    let adapter: Arc<dyn BleAdapter> = Arc::new(BtleplugAdapter::first().await?);

    // Event fan-out, logged until an HTTP façade subscribes
    let publisher = BroadcastPublisher::new(EVENT_BUFFER);
    let events = tokio::spawn(log_events(publisher.subscribe()));
    let publisher: Arc<dyn EventPublisher> = Arc::new(publisher);

    // -----------------------------------------------------------------------
    // 4. Start the bridge
    // -----------------------------------------------------------------------
    let bridge = Bridge::start(adapter, store, publisher, config.bridge_settings()).await?;
    info!(
        app_id = bridge.settings().app_id,
        name = %bridge.settings().bridge_name,
        "Bridge started"
    );

    let refreshed = bridge.refresh_all().await;
    info!(refreshed, locks = bridge.list_locks().await.len(), "Initial state refresh done");

    if config.pairing_on_start {
        bridge.set_pairing_enabled(true);
    }

    // -----------------------------------------------------------------------
    // 5. Run until Ctrl-C
    // -----------------------------------------------------------------------
    tokio::signal::ctrl_c().await?;
    info!("Received Ctrl-C, shutting down");

    bridge.shutdown().await;
    events.abort();
    Ok(())
}

async fn log_events(mut rx: broadcast::Receiver<BridgeEvent>) {
    loop {
        match rx.recv().await {
            Ok(BridgeEvent::Callback(callback)) => match serde_json::to_string(&callback) {
                Ok(json) => info!(nuki_id = callback.nuki_id, callback = %json, "Lock callback"),
                Err(e) => warn!(error = %e, "Failed to serialize callback"),
            },
            Ok(BridgeEvent::Push(event)) => {
                info!(event = %event.name, payload = %event.payload, "Push event");
            }
            Err(RecvError::Lagged(skipped)) => debug!(skipped, "Event log lagged"),
            Err(RecvError::Closed) => break,
        }
    }
}
