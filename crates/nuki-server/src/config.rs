//! Daemon configuration loaded from environment variables.
//!
//! Every setting has a default, so the bridge starts with zero
//! configuration.

use std::path::PathBuf;
use std::time::Duration;

use nuki_ble::BridgeSettings;
use nuki_shared::constants::{DEFAULT_APP_ID, DEFAULT_BRIDGE_NAME, RECEIVE_WINDOW_MS};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Directory holding `bridge.json`.
    /// Env: `NUKI_CONFIGPATH`
    /// Default: the platform data directory.
    pub config_path: Option<PathBuf>,

    /// Env: `NUKI_APP_ID`
    pub app_id: u32,

    /// Name the bridge registers itself under on each lock.
    /// Env: `NUKI_BRIDGE_NAME`
    pub bridge_name: String,

    /// Open the pairing window right after startup.
    /// Env: `NUKI_PAIRING_ON_START` (true/false)
    pub pairing_on_start: bool,

    /// Env: `NUKI_RECEIVE_WINDOW_MS`
    pub receive_window: Duration,

    /// Default log level `debug` instead of `info` when `RUST_LOG` is unset.
    /// Env: `NUKI_VERBOSE` (true/false)
    pub verbose: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            config_path: None,
            app_id: DEFAULT_APP_ID,
            bridge_name: DEFAULT_BRIDGE_NAME.to_string(),
            pairing_on_start: false,
            receive_window: Duration::from_millis(RECEIVE_WINDOW_MS),
            verbose: false,
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(path) = lookup("NUKI_CONFIGPATH") {
            if !path.is_empty() {
                config.config_path = Some(PathBuf::from(path));
            }
        }

        if let Some(val) = lookup("NUKI_APP_ID") {
            match val.parse::<u32>() {
                Ok(id) => config.app_id = id,
                Err(_) => tracing::warn!(value = %val, "Invalid NUKI_APP_ID, using default"),
            }
        }

        if let Some(name) = lookup("NUKI_BRIDGE_NAME") {
            if !name.is_empty() {
                config.bridge_name = name;
            }
        }

        if let Some(val) = lookup("NUKI_PAIRING_ON_START") {
            config.pairing_on_start = is_true(&val);
        }

        if let Some(val) = lookup("NUKI_RECEIVE_WINDOW_MS") {
            match val.parse::<u64>() {
                Ok(ms) if ms > 0 => config.receive_window = Duration::from_millis(ms),
                _ => tracing::warn!(value = %val, "Invalid NUKI_RECEIVE_WINDOW_MS, using default"),
            }
        }

        if let Some(val) = lookup("NUKI_VERBOSE") {
            config.verbose = is_true(&val);
        }

        config
    }

    pub fn bridge_settings(&self) -> BridgeSettings {
        BridgeSettings {
            app_id: self.app_id,
            bridge_name: self.bridge_name.clone(),
            receive_window: self.receive_window,
            ..BridgeSettings::default()
        }
    }

    pub fn default_log_filter(&self) -> &'static str {
        if self.verbose {
            "debug"
        } else {
            "info,nuki_ble=debug"
        }
    }
}

fn is_true(val: &str) -> bool {
    matches!(val.trim().to_ascii_lowercase().as_str(), "true" | "1" | "yes")
}
