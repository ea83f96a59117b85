use std::time::Duration;

use nuki_shared::constants::{
    BEACON_DEBOUNCE_SECS, DEFAULT_APP_ID, DEFAULT_BRIDGE_NAME, LOCK_ACTION_TIMEOUT_SECS,
    PAIRING_WINDOW_SECS,
    RECEIVE_WINDOW_MS, SCAN_RETRY_SECS, SCAN_SETTLE_MS,
};

/// Runtime tunables of the bridge.
#[derive(Debug, Clone)]
pub struct BridgeSettings {
    /// Application id the bridge authorizes itself with.
    pub app_id: u32,
    /// Name shown in the lock's authorization list.
    pub bridge_name: String,
    /// Silence that ends one notification transfer.
    pub receive_window: Duration,
    /// How long to keep following a lock action's progress reports.
    pub action_timeout: Duration,
    /// Delay between the scanner stopping and the first connect.
    pub scan_settle: Duration,
    /// Wait before restarting a scan that failed or ended by itself.
    pub scan_retry: Duration,
    /// How long pairing mode stays on.
    pub pairing_window: Duration,
    /// Minimum spacing of beacon-triggered state fetches per lock.
    pub beacon_debounce: Duration,
}

impl Default for BridgeSettings {
    fn default() -> Self {
        Self {
            app_id: DEFAULT_APP_ID,
            bridge_name: DEFAULT_BRIDGE_NAME.to_string(),
            receive_window: Duration::from_millis(RECEIVE_WINDOW_MS),
            action_timeout: Duration::from_secs(LOCK_ACTION_TIMEOUT_SECS),
            scan_settle: Duration::from_millis(SCAN_SETTLE_MS),
            scan_retry: Duration::from_secs(SCAN_RETRY_SECS),
            pairing_window: Duration::from_secs(PAIRING_WINDOW_SECS),
            beacon_debounce: Duration::from_secs(BEACON_DEBOUNCE_SECS),
        }
    }
}
