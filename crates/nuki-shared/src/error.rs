use thiserror::Error;

#[derive(Error, Debug)]
pub enum NukiError {
    #[error("Frame error: {0}")]
    Frame(#[from] FrameError),

    #[error("Crypto error: {0}")]
    Crypto(#[from] CryptoError),

    #[error("Identity error: {0}")]
    Identity(#[from] IdentityError),

    #[error("Beacon error: {0}")]
    Beacon(#[from] BeaconError),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FrameError {
    #[error("Malformed {context}: need {needed} bytes, have {available}")]
    Malformed {
        context: &'static str,
        needed: usize,
        available: usize,
    },

    #[error("Corrupt frame: CRC {received:#06x} does not match computed {computed:#06x}")]
    CorruptFrame { computed: u16, received: u16 },
}

impl FrameError {
    pub(crate) fn malformed(context: &'static str, needed: usize, available: usize) -> Self {
        Self::Malformed {
            context,
            needed,
            available,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CryptoError {
    #[error("Encryption failed")]
    EncryptionFailed,

    #[error("Decryption failed: invalid ciphertext or wrong key")]
    DecryptFailure,

    #[error("Invalid key length")]
    InvalidKeyLength,
}

#[derive(Error, Debug)]
pub enum IdentityError {
    #[error("Invalid key bytes: expected {expected}, got {actual}")]
    InvalidKeyBytes { expected: usize, actual: usize },

    #[error("Public key does not belong to the secret key")]
    KeyMismatch,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BeaconError {
    #[error("Beacon has wrong size: {0} bytes")]
    WrongSize(usize),

    #[error("Not a beacon: type byte {0:#04x}")]
    NotABeacon(u8),
}
