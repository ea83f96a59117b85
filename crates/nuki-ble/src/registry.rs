use std::collections::BTreeMap;

use nuki_shared::identity::BridgeIdentity;
use nuki_store::{BridgeConfiguration, StoreError};
use tracing::warn;

use crate::lock::{Lock, Transport};

/// Paired locks keyed by Nuki ID.
#[derive(Debug, Default)]
pub struct LockRegistry {
    locks: BTreeMap<u32, Lock>,
}

impl LockRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild from a persisted record. Entries whose key material does not
    /// decode are skipped with a warning instead of failing the whole load.
    pub fn from_configuration(
        config: &BridgeConfiguration,
        identity: &BridgeIdentity,
        transport: &Transport,
    ) -> Result<Self, StoreError> {
        let mut registry = Self::new();
        for (nuki_id, record) in config.lock_entries()? {
            match Lock::from_record(record, identity, transport.clone()) {
                Ok(lock) => {
                    registry.insert(nuki_id, lock);
                }
                Err(e) => warn!(nuki_id, error = %e, "Skipping unreadable lock record"),
            }
        }
        Ok(registry)
    }

    /// The persisted form, identity included.
    pub fn to_configuration(&self, identity: &BridgeIdentity) -> BridgeConfiguration {
        let mut config = BridgeConfiguration::new(identity);
        for (nuki_id, lock) in &self.locks {
            if let Some(record) = lock.to_record() {
                config.insert_lock(*nuki_id, record);
            }
        }
        config
    }

    /// Returns the lock previously registered under `nuki_id`, if any.
    pub fn insert(&mut self, nuki_id: u32, lock: Lock) -> Option<Lock> {
        self.locks.insert(nuki_id, lock)
    }

    pub fn remove(&mut self, nuki_id: u32) -> Option<Lock> {
        self.locks.remove(&nuki_id)
    }

    pub fn get(&self, nuki_id: u32) -> Option<&Lock> {
        self.locks.get(&nuki_id)
    }

    pub fn get_mut(&mut self, nuki_id: u32) -> Option<&mut Lock> {
        self.locks.get_mut(&nuki_id)
    }

    pub fn contains_address(&self, address: &str) -> bool {
        self.locks
            .values()
            .any(|lock| lock.address().eq_ignore_ascii_case(address))
    }

    pub fn ids(&self) -> Vec<u32> {
        self.locks.keys().copied().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, &Lock)> {
        self.locks.iter().map(|(id, lock)| (*id, lock))
    }

    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}
