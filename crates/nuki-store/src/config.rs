use std::collections::BTreeMap;

use base64::{engine::general_purpose::STANDARD, Engine};
use nuki_shared::constants::PUBKEY_SIZE;
use nuki_shared::identity::BridgeIdentity;
use serde::{Deserialize, Serialize};

use crate::error::{Result, StoreError};

/// The persisted bridge record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BridgeConfiguration {
    pub private_key: String,
    pub public_key: String,
    #[serde(default)]
    pub locks: BTreeMap<String, LockConfiguration>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LockConfiguration {
    pub public_key: String,
    pub address: String,
    /// Decimal string
    pub authorization_id: String,
    #[serde(rename = "adminPIN", default)]
    pub admin_pin: u16,
}

impl BridgeConfiguration {
    /// A record holding `identity` and no locks.
    pub fn new(identity: &BridgeIdentity) -> Self {
        Self {
            private_key: STANDARD.encode(identity.secret_bytes()),
            public_key: STANDARD.encode(identity.public_key_bytes()),
            locks: BTreeMap::new(),
        }
    }

    /// Decode and validate the stored key pair.
    pub fn identity(&self) -> Result<BridgeIdentity> {
        let secret = decode_b64("privateKey", &self.private_key)?;
        let public = decode_b64("publicKey", &self.public_key)?;
        BridgeIdentity::from_key_pair(&secret, &public)
            .map_err(|e| StoreError::InvalidConfig(format!("bridge key pair: {e}")))
    }

    /// Locks keyed by numeric Nuki id.
    pub fn lock_entries(&self) -> Result<Vec<(u32, &LockConfiguration)>> {
        self.locks
            .iter()
            .map(|(id, lock)| {
                let nuki_id = id
                    .parse()
                    .map_err(|_| StoreError::InvalidConfig(format!("lock id {id:?} is not a number")))?;
                Ok((nuki_id, lock))
            })
            .collect()
    }

    pub fn insert_lock(&mut self, nuki_id: u32, lock: LockConfiguration) {
        self.locks.insert(nuki_id.to_string(), lock);
    }
}

impl LockConfiguration {
    pub fn new(
        address: impl Into<String>,
        authorization_id: u32,
        public_key: &[u8; PUBKEY_SIZE],
        admin_pin: u16,
    ) -> Self {
        Self {
            public_key: STANDARD.encode(public_key),
            address: address.into(),
            authorization_id: authorization_id.to_string(),
            admin_pin,
        }
    }

    pub fn authorization_id(&self) -> Result<u32> {
        self.authorization_id.parse().map_err(|_| {
            StoreError::InvalidConfig(format!(
                "authorizationId {:?} is not a number",
                self.authorization_id
            ))
        })
    }

    pub fn public_key(&self) -> Result<[u8; PUBKEY_SIZE]> {
        let bytes = decode_b64("lock publicKey", &self.public_key)?;
        bytes.as_slice().try_into().map_err(|_| {
            StoreError::InvalidConfig(format!(
                "lock publicKey has {} bytes, expected {PUBKEY_SIZE}",
                bytes.len()
            ))
        })
    }
}

fn decode_b64(field: &str, value: &str) -> Result<Vec<u8>> {
    if value.is_empty() {
        return Err(StoreError::InvalidConfig(format!("{field} is missing")));
    }
    STANDARD
        .decode(value)
        .map_err(|e| StoreError::InvalidConfig(format!("{field}: {e}")))
}
