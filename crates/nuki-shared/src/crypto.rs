use crypto_secretbox::{
    aead::{generic_array::GenericArray, Aead, KeyInit},
    XSalsa20Poly1305,
};
use hmac::{Hmac, Mac};
use rand::RngCore;
use salsa20::cipher::consts::U10;
use sha2::Sha256;
use x25519_dalek::{PublicKey, StaticSecret};

use crate::constants::{AUTHENTICATOR_SIZE, NONCE_SIZE, SHARED_KEY_SIZE};
use crate::error::CryptoError;

type HmacSha256 = Hmac<Sha256>;

pub type Authenticator = [u8; AUTHENTICATOR_SIZE];

/// Per-lock symmetric key, precomputed once from the bridge secret and the
/// lock's public key (NaCl `crypto_box_beforenm`).
#[derive(Clone, PartialEq, Eq)]
pub struct SharedKey([u8; SHARED_KEY_SIZE]);

impl SharedKey {
    /// X25519 followed by HSalsa20 over a zero input block.
    pub fn derive(secret: &StaticSecret, peer_public: &[u8; 32]) -> Self {
        let dh = secret.diffie_hellman(&PublicKey::from(*peer_public));
        let key = salsa20::hsalsa::<U10>(
            GenericArray::from_slice(dh.as_bytes()),
            &GenericArray::default(),
        );
        let mut out = [0u8; SHARED_KEY_SIZE];
        out.copy_from_slice(&key);
        Self(out)
    }

    pub fn from_bytes(bytes: [u8; SHARED_KEY_SIZE]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; SHARED_KEY_SIZE] {
        &self.0
    }

    /// HMAC-SHA256 keyed with the shared key over the concatenation of `parts`.
    pub fn authenticator(&self, parts: &[&[u8]]) -> Result<Authenticator, CryptoError> {
        let mut mac = self.mac()?;
        for part in parts {
            mac.update(part);
        }
        Ok(mac.finalize().into_bytes().into())
    }

    /// Constant-time check of an authenticator produced by the peer.
    pub fn verify_authenticator(&self, parts: &[&[u8]], tag: &[u8]) -> Result<(), CryptoError> {
        let mut mac = self.mac()?;
        for part in parts {
            mac.update(part);
        }
        mac.verify_slice(tag).map_err(|_| CryptoError::DecryptFailure)
    }

    /// XSalsa20-Poly1305 seal; output is `tag (16) | ciphertext`.
    pub fn seal(&self, nonce: &[u8; NONCE_SIZE], plaintext: &[u8]) -> Result<Vec<u8>, CryptoError> {
        XSalsa20Poly1305::new(GenericArray::from_slice(&self.0))
            .encrypt(GenericArray::from_slice(nonce), plaintext)
            .map_err(|_| CryptoError::EncryptionFailed)
    }

    pub fn open(&self, nonce: &[u8; NONCE_SIZE], sealed: &[u8]) -> Result<Vec<u8>, CryptoError> {
        XSalsa20Poly1305::new(GenericArray::from_slice(&self.0))
            .decrypt(GenericArray::from_slice(nonce), sealed)
            .map_err(|_| CryptoError::DecryptFailure)
    }

    fn mac(&self) -> Result<HmacSha256, CryptoError> {
        <HmacSha256 as Mac>::new_from_slice(&self.0).map_err(|_| CryptoError::InvalidKeyLength)
    }
}

impl std::fmt::Debug for SharedKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SharedKey(..)")
    }
}

/// Fresh random bytes for nonces and challenges.
pub fn random_bytes<const N: usize>() -> [u8; N] {
    let mut out = [0u8; N];
    rand::rngs::OsRng.fill_bytes(&mut out);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::OsRng;

    #[test]
    fn test_both_sides_derive_same_key() {
        let bridge = StaticSecret::random_from_rng(OsRng);
        let lock = StaticSecret::random_from_rng(OsRng);

        let on_bridge = SharedKey::derive(&bridge, PublicKey::from(&lock).as_bytes());
        let on_lock = SharedKey::derive(&lock, PublicKey::from(&bridge).as_bytes());

        assert_eq!(on_bridge, on_lock);
        assert_ne!(on_bridge.as_bytes(), &[0u8; 32]);
    }

    #[test]
    fn test_known_nacl_precompute() {
        // Alice/Bob vectors from the NaCl box test suite
        let alice: [u8; 32] =
            hex::decode("77076d0a7318a57d3c16c17251b26645df4c2f87ebc0992ab177fba51db92c2a")
                .unwrap()
                .try_into()
                .unwrap();
        let bob_pub: [u8; 32] =
            hex::decode("de9edb7d7b7dc1b4d35b61c2ece435373f8343c85b78674dadfc7e146f882b4f")
                .unwrap()
                .try_into()
                .unwrap();

        let key = SharedKey::derive(&StaticSecret::from(alice), &bob_pub);
        assert_eq!(
            hex::encode(key.as_bytes()),
            "1b27556473e985d462cd51197a9a46c76009549eac6474f206c4ee0844f68389"
        );
    }

    #[test]
    fn test_seal_is_tag_first() {
        let key = SharedKey::from_bytes(random_bytes());
        let nonce = random_bytes();
        let sealed = key.seal(&nonce, b"keyturner").unwrap();
        assert_eq!(sealed.len(), 16 + 9);
        assert_eq!(key.open(&nonce, &sealed).unwrap(), b"keyturner");
    }

    #[test]
    fn test_wrong_key_fails() {
        let nonce = random_bytes();
        let sealed = SharedKey::from_bytes(random_bytes()).seal(&nonce, b"x").unwrap();
        let other = SharedKey::from_bytes(random_bytes());
        assert_eq!(other.open(&nonce, &sealed), Err(CryptoError::DecryptFailure));
    }

    #[test]
    fn test_authenticator_over_parts() {
        let key = SharedKey::from_bytes([7u8; 32]);
        let joined = key.authenticator(&[b"public-key-a", b"public-key-b"]).unwrap();
        let single = key.authenticator(&[b"public-key-apublic-key-b"]).unwrap();
        assert_eq!(joined, single);

        key.verify_authenticator(&[b"public-key-a", b"public-key-b"], &joined)
            .unwrap();
        assert!(key.verify_authenticator(&[b"other"], &joined).is_err());
    }
}
