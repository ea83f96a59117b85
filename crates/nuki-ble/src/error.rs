use nuki_shared::models::ErrorReport;
use nuki_shared::{Command, CryptoError, FrameError, NukiError};
use nuki_store::StoreError;
use thiserror::Error;
use uuid::Uuid;

/// Radio and link failures reported by a [`crate::BleAdapter`].
#[derive(Error, Debug)]
pub enum BleError {
    #[error("No Bluetooth adapter found")]
    NoAdapter,

    #[error("Device {0} not found")]
    DeviceNotFound(String),

    #[error("Characteristic {0} not found")]
    CharacteristicNotFound(Uuid),

    #[error("Device disconnected")]
    Disconnected,

    #[error("Bluetooth error: {0}")]
    Backend(String),
}

/// Everything a lock session can fail with. None of these are retried
/// inside the bridge.
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Connection error: {0}")]
    Connection(#[from] BleError),

    #[error("Timed out waiting for a response")]
    Timeout,

    #[error("Protocol error: expected {expected}, got {actual}{}", describe(.report))]
    Protocol {
        expected: Command,
        actual: Command,
        report: Option<ErrorReport>,
    },

    #[error("Frame error: {0}")]
    Frame(#[from] FrameError),

    #[error("Crypto error: {0}")]
    Crypto(#[from] CryptoError),

    #[error("Lock is not paired")]
    NotPaired,

    #[error("Unknown lock {0}")]
    UnknownLock(u32),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Codec error: {0}")]
    Codec(NukiError),
}

fn describe(report: &Option<ErrorReport>) -> String {
    report.map(|r| format!(" ({r})")).unwrap_or_default()
}

impl SessionError {
    pub(crate) fn unexpected(expected: Command, actual: Command, report: Option<ErrorReport>) -> Self {
        Self::Protocol {
            expected,
            actual,
            report,
        }
    }
}

impl From<NukiError> for SessionError {
    fn from(e: NukiError) -> Self {
        match e {
            NukiError::Frame(e) => Self::Frame(e),
            NukiError::Crypto(e) => Self::Crypto(e),
            other => Self::Codec(other),
        }
    }
}
