//! # nuki-store
//!
//! Persistence of the bridge configuration record: the bridge's Curve25519
//! key pair and, per paired lock, its address, authorization id, public key
//! and admin PIN.
//!
//! The record is a single pretty-printed JSON document (`bridge.json`).
//! Binary fields are base64, the authorization id is a decimal string, and
//! locks are keyed by their numeric Nuki id rendered as a string.

pub mod config;
pub mod store;

mod error;

pub use config::{BridgeConfiguration, LockConfiguration};
pub use error::{Result, StoreError};
pub use store::{ConfigStore, JsonFileStore, MemoryStore};
