use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use x25519_dalek::{PublicKey, StaticSecret};

use crate::constants::{PUBKEY_SIZE, SECRET_KEY_SIZE};
use crate::crypto::SharedKey;
use crate::error::IdentityError;

/// The bridge's long-lived Curve25519 key pair, shared by every paired lock.
#[derive(Clone)]
pub struct BridgeIdentity {
    secret: StaticSecret,
}

/// Raw key material for persistence
#[derive(Serialize, Deserialize)]
pub struct IdentityExport {
    pub secret_key: [u8; SECRET_KEY_SIZE],
    pub public_key: [u8; PUBKEY_SIZE],
}

impl BridgeIdentity {
    pub fn generate() -> Self {
        Self {
            secret: StaticSecret::random_from_rng(OsRng),
        }
    }

    pub fn from_secret_bytes(secret: [u8; SECRET_KEY_SIZE]) -> Self {
        Self {
            secret: StaticSecret::from(secret),
        }
    }

    /// Restore from stored bytes, checking sizes and that the public half
    /// actually belongs to the secret.
    pub fn from_key_pair(secret: &[u8], public: &[u8]) -> Result<Self, IdentityError> {
        let secret: [u8; SECRET_KEY_SIZE] =
            secret
                .try_into()
                .map_err(|_| IdentityError::InvalidKeyBytes {
                    expected: SECRET_KEY_SIZE,
                    actual: secret.len(),
                })?;
        let identity = Self::from_secret_bytes(secret);
        if public.len() != PUBKEY_SIZE {
            return Err(IdentityError::InvalidKeyBytes {
                expected: PUBKEY_SIZE,
                actual: public.len(),
            });
        }
        if identity.public_key_bytes() != public {
            return Err(IdentityError::KeyMismatch);
        }
        Ok(identity)
    }

    pub fn public_key_bytes(&self) -> [u8; PUBKEY_SIZE] {
        PublicKey::from(&self.secret).to_bytes()
    }

    pub fn secret_bytes(&self) -> [u8; SECRET_KEY_SIZE] {
        self.secret.to_bytes()
    }

    /// Precompute the session key for a lock
    pub fn shared_key(&self, peer_public: &[u8; PUBKEY_SIZE]) -> SharedKey {
        SharedKey::derive(&self.secret, peer_public)
    }

    pub fn to_export(&self) -> IdentityExport {
        IdentityExport {
            secret_key: self.secret_bytes(),
            public_key: self.public_key_bytes(),
        }
    }
}

impl std::fmt::Debug for BridgeIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BridgeIdentity")
            .field("public_key", &self.public_key_bytes())
            .finish_non_exhaustive()
    }
}
