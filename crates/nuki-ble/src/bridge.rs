//! The bridge: owns the identity, the lock registry and the radio, and exposes
//! the command surface consumed by an HTTP façade.
//!
//! Lock order is always radio first, registry second. The radio is held for a
//! whole connection/command sequence; the registry only for lookups and
//! mutations, never across radio I/O.

use std::sync::{Arc, Mutex as StdMutex};

use futures::future::BoxFuture;
use nuki_shared::beacon::Beacon;
use nuki_shared::enums::LockAction;
use nuki_shared::identity::BridgeIdentity;
use nuki_shared::models::{Config, KeyturnerState, LogEntry};
use nuki_store::ConfigStore;
use serde::Serialize;
use tokio::sync::{mpsc, Mutex, Notify};
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};

use crate::adapter::{AdvertisementSink, BleAdapter};
use crate::arbitration::RadioArbiter;
use crate::error::SessionError;
use crate::events::{emit_event, CallbackObject, EventPublisher, EVENT_PAIRED, EVENT_STATE};
use crate::lock::{Lock, LockActionOutcome, Transport};
use crate::monitor;
use crate::pairing::Pairing;
use crate::pairing_window::PairingWindow;
use crate::registry::LockRegistry;
use crate::settings::BridgeSettings;

/// One row of [`Bridge::list_locks`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LockSummary {
    pub nuki_id: u32,
    pub address: String,
    /// From the last fetched config
    pub name: Option<String>,
    pub paired: bool,
    pub state: Option<KeyturnerState>,
}

impl LockSummary {
    fn new(nuki_id: u32, lock: &Lock) -> Self {
        Self {
            nuki_id,
            address: lock.address().to_string(),
            name: lock.last_config().map(|c| c.name.clone()),
            paired: lock.is_paired(),
            state: lock.last_state().cloned(),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StatePayload<'a> {
    nuki_id: u32,
    #[serde(flatten)]
    state: &'a KeyturnerState,
}

struct Inner {
    identity: BridgeIdentity,
    settings: BridgeSettings,
    transport: Transport,
    registry: Mutex<LockRegistry>,
    arbiter: RadioArbiter,
    pairing: PairingWindow,
    store: Arc<dyn ConfigStore>,
    publisher: Arc<dyn EventPublisher>,
    shutdown: Notify,
    monitor: StdMutex<Option<JoinHandle<()>>>,
}

#[derive(Clone)]
pub struct Bridge {
    inner: Arc<Inner>,
}

impl Bridge {
    /// Load (or create and save) the configuration, start the advertisement
    /// monitor and begin scanning.
    pub async fn start(
        adapter: Arc<dyn BleAdapter>,
        store: Arc<dyn ConfigStore>,
        publisher: Arc<dyn EventPublisher>,
        settings: BridgeSettings,
    ) -> Result<Self, SessionError> {
        let transport = Transport::new(adapter.clone(), &settings);

        let (identity, registry) = match store.load()? {
            Some(config) => {
                let identity = config.identity()?;
                let registry = LockRegistry::from_configuration(&config, &identity, &transport)?;
                info!(locks = registry.len(), "Loaded bridge configuration");
                (identity, registry)
            }
            None => {
                let identity = BridgeIdentity::generate();
                let registry = LockRegistry::new();
                store.save(&registry.to_configuration(&identity))?;
                info!("Generated new bridge identity");
                (identity, registry)
            }
        };

        // Capacity 1: bursts arriving while the monitor is busy are dropped.
        let (adv_tx, adv_rx) = mpsc::channel(1);
        let arbiter = RadioArbiter::new(
            adapter,
            AdvertisementSink::new(adv_tx),
            settings.scan_settle,
            settings.scan_retry,
        );
        let pairing = PairingWindow::new(settings.pairing_window);

        let bridge = Self {
            inner: Arc::new(Inner {
                identity,
                settings,
                transport,
                registry: Mutex::new(registry),
                arbiter,
                pairing,
                store,
                publisher,
                shutdown: Notify::new(),
                monitor: StdMutex::new(None),
            }),
        };

        let handle = tokio::spawn(monitor::run(bridge.clone(), adv_rx));
        if let Ok(mut slot) = bridge.inner.monitor.lock() {
            *slot = Some(handle);
        }
        bridge.inner.arbiter.start().await;
        Ok(bridge)
    }

    pub fn identity(&self) -> &BridgeIdentity {
        &self.inner.identity
    }

    pub fn settings(&self) -> &BridgeSettings {
        &self.inner.settings
    }

    // -----------------------------------------------------------------------
    // Registry only, no radio traffic
    // -----------------------------------------------------------------------

    pub async fn list_locks(&self) -> Vec<LockSummary> {
        let registry = self.inner.registry.lock().await;
        registry
            .iter()
            .map(|(nuki_id, lock)| LockSummary::new(nuki_id, lock))
            .collect()
    }

    /// Cached state from the last fetch.
    pub async fn last_state(&self, nuki_id: u32) -> Result<Option<KeyturnerState>, SessionError> {
        let registry = self.inner.registry.lock().await;
        let lock = registry
            .get(nuki_id)
            .ok_or(SessionError::UnknownLock(nuki_id))?;
        Ok(lock.last_state().cloned())
    }

    pub(crate) async fn is_known_address(&self, address: &str) -> bool {
        self.inner.registry.lock().await.contains_address(address)
    }

    // -----------------------------------------------------------------------
    // Lock commands
    // -----------------------------------------------------------------------

    pub async fn get_lock_state(&self, nuki_id: u32) -> Result<KeyturnerState, SessionError> {
        self.with_lock(nuki_id, |lock| Box::pin(lock.request_keyturner_state()))
            .await
    }

    pub async fn perform_lock_action(
        &self,
        nuki_id: u32,
        action: LockAction,
        name_suffix: &str,
    ) -> Result<LockActionOutcome, SessionError> {
        let suffix = name_suffix.to_string();
        let outcome = self
            .with_lock(nuki_id, |lock| {
                Box::pin(async move { lock.lock_action(action, &suffix).await })
            })
            .await?;
        if let Some(state) = &outcome.state {
            self.announce_state(nuki_id, state);
        }
        Ok(outcome)
    }

    pub async fn get_lock_config(&self, nuki_id: u32) -> Result<Config, SessionError> {
        self.with_lock(nuki_id, |lock| Box::pin(lock.request_config()))
            .await
    }

    pub async fn get_lock_history(
        &self,
        nuki_id: u32,
        offset: u32,
        count: u16,
    ) -> Result<Vec<LogEntry>, SessionError> {
        self.with_lock(nuki_id, |lock| {
            Box::pin(lock.request_log_entries(offset, count))
        })
        .await
    }

    /// Fetch state and config of every known lock, one after the other.
    /// Returns how many succeeded.
    pub async fn refresh_all(&self) -> usize {
        let ids = self.inner.registry.lock().await.ids();
        let mut refreshed = 0;
        for nuki_id in ids {
            let result = self
                .with_lock(nuki_id, |lock| {
                    Box::pin(async move {
                        lock.request_keyturner_state().await?;
                        lock.request_config().await?;
                        Ok::<(), SessionError>(())
                    })
                })
                .await;
            match result {
                Ok(()) => refreshed += 1,
                Err(e) => warn!(nuki_id, error = %e, "Refresh failed"),
            }
        }
        refreshed
    }

    // -----------------------------------------------------------------------
    // Registry mutations
    // -----------------------------------------------------------------------

    pub fn set_pairing_enabled(&self, enabled: bool) {
        if enabled {
            self.inner.pairing.enable();
        } else {
            self.inner.pairing.disable();
        }
    }

    pub fn is_pairing_enabled(&self) -> bool {
        self.inner.pairing.is_enabled()
    }

    pub async fn delete_lock(&self, nuki_id: u32) -> Result<(), SessionError> {
        let mut registry = self.inner.registry.lock().await;
        let lock = registry
            .remove(nuki_id)
            .ok_or(SessionError::UnknownLock(nuki_id))?;
        if let Err(e) = self.persist(&registry) {
            registry.insert(nuki_id, lock);
            return Err(e);
        }
        info!(nuki_id, "Lock removed");
        Ok(())
    }

    pub async fn update_lock_pin(&self, nuki_id: u32, pin: u16) -> Result<(), SessionError> {
        let mut registry = self.inner.registry.lock().await;
        let lock = registry
            .get_mut(nuki_id)
            .ok_or(SessionError::UnknownLock(nuki_id))?;
        let previous = lock.admin_pin();
        lock.set_admin_pin(pin);
        if let Err(e) = self.persist(&registry) {
            if let Some(lock) = registry.get_mut(nuki_id) {
                lock.set_admin_pin(previous);
            }
            return Err(e);
        }
        info!(nuki_id, "Admin PIN updated");
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Advertisement driven
    // -----------------------------------------------------------------------

    /// Pair with the lock at `address` and register it under its Nuki ID.
    /// Nothing is registered or saved unless every step succeeds.
    pub async fn pair_candidate(&self, address: &str) -> Result<u32, SessionError> {
        let _radio = self.inner.arbiter.acquire().await;
        info!(lock = %address, "Pairing with new lock");

        let mut lock = Lock::new(address, self.inner.transport.clone());
        let result = async {
            Pairing::new(
                &mut lock,
                &self.inner.identity,
                self.inner.settings.app_id,
                self.inner.settings.bridge_name.as_str(),
            )
            .run()
            .await?;
            lock.request_config().await
        }
        .await;
        lock.disconnect().await;
        let nuki_id = result?.nuki_id;

        let summary = {
            let mut registry = self.inner.registry.lock().await;
            let summary = LockSummary::new(nuki_id, &lock);
            let replaced = registry.insert(nuki_id, lock);
            if let Err(e) = self.persist(&registry) {
                registry.remove(nuki_id);
                if let Some(previous) = replaced {
                    registry.insert(nuki_id, previous);
                }
                return Err(e);
            }
            summary
        };

        info!(nuki_id, lock = %address, "Lock paired");
        emit_event(self.inner.publisher.as_ref(), EVENT_PAIRED, &summary);
        Ok(nuki_id)
    }

    /// React to a beacon. Returns whether the lock was contacted.
    pub async fn handle_beacon(&self, beacon: &Beacon) -> Result<bool, SessionError> {
        let nuki_id = beacon.nuki_id;
        if !beacon.dirty {
            return Ok(false);
        }
        {
            let registry = self.inner.registry.lock().await;
            let Some(lock) = registry.get(nuki_id) else {
                trace!(nuki_id, "Beacon from unknown lock");
                return Ok(false);
            };
            if lock
                .last_fetch()
                .is_some_and(|at| at.elapsed() < self.inner.settings.beacon_debounce)
            {
                debug!(nuki_id, "Beacon within debounce window");
                return Ok(false);
            }
        }

        debug!(nuki_id, tx_power = beacon.tx_power, "State change signalled");
        let state = self.get_lock_state(nuki_id).await?;
        self.announce_state(nuki_id, &state);
        Ok(true)
    }

    pub async fn shutdown(&self) {
        info!("Shutting down bridge");
        self.inner.shutdown.notify_one();
        self.inner.arbiter.shutdown().await;
        let handle = self.inner.monitor.lock().ok().and_then(|mut slot| slot.take());
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                warn!(error = %e, "Advertisement monitor ended abnormally");
            }
        }
    }

    pub(crate) async fn shutdown_requested(&self) {
        self.inner.shutdown.notified().await
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    /// Run `op` against a registered lock while owning the radio.
    ///
    /// The session runs on a detached copy so the registry stays available to
    /// cache reads and mutations; fetched snapshots are merged back afterwards
    /// unless the lock was deleted in the meantime.
    async fn with_lock<T, F>(&self, nuki_id: u32, op: F) -> Result<T, SessionError>
    where
        F: for<'a> FnOnce(&'a mut Lock) -> BoxFuture<'a, Result<T, SessionError>>,
    {
        if self.inner.registry.lock().await.get(nuki_id).is_none() {
            return Err(SessionError::UnknownLock(nuki_id));
        }

        let _radio = self.inner.arbiter.acquire().await;
        let mut lock = self
            .inner
            .registry
            .lock()
            .await
            .get(nuki_id)
            .map(Lock::detached)
            .ok_or(SessionError::UnknownLock(nuki_id))?;
        let result = op(&mut lock).await;
        lock.disconnect().await;

        match self.inner.registry.lock().await.get_mut(nuki_id) {
            Some(registered) => registered.absorb_snapshots(&lock),
            None => debug!(nuki_id, "Lock removed during session"),
        }
        result
    }

    fn persist(&self, registry: &LockRegistry) -> Result<(), SessionError> {
        self.inner
            .store
            .save(&registry.to_configuration(&self.inner.identity))?;
        Ok(())
    }

    fn announce_state(&self, nuki_id: u32, state: &KeyturnerState) {
        self.inner
            .publisher
            .publish_callback(CallbackObject::new(nuki_id, state));
        emit_event(
            self.inner.publisher.as_ref(),
            EVENT_STATE,
            StatePayload { nuki_id, state },
        );
    }
}
