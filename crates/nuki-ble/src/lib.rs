//! # nuki-ble
//!
//! Talks to Nuki Smart Locks over Bluetooth Low Energy.
//!
//! - [`adapter`]: the trait seam to a concrete Bluetooth stack
//! - [`receive`]: reassembly of notification chunks into messages
//! - [`lock`]: per-lock session and the encrypted command layer
//! - [`pairing`]: the six-step authorization handshake
//! - [`arbitration`]: exclusive use of the radio between scanning and sessions
//! - [`bridge`]: registry, persistence, advertisement handling and the
//!   command surface used by an HTTP façade

pub mod adapter;
pub mod arbitration;
pub mod bridge;
pub mod error;
pub mod events;
pub mod lock;
pub mod pairing;
pub mod pairing_window;
pub mod receive;
pub mod registry;
pub mod settings;

#[cfg(feature = "btleplug")]
pub mod btleplug_adapter;

mod monitor;

#[cfg(test)]
pub(crate) mod testing;

pub use adapter::{Advertisement, AdvertisementSink, BleAdapter, BleConnection, ServiceData};
pub use bridge::{Bridge, LockSummary};
pub use error::{BleError, SessionError};
pub use events::{BridgeEvent, BroadcastPublisher, CallbackObject, EventPublisher, PushEvent};
pub use lock::{Lock, LockActionOutcome, Transport};
pub use settings::BridgeSettings;

#[cfg(feature = "btleplug")]
pub use btleplug_adapter::BtleplugAdapter;
