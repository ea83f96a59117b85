//! Nuki keyturner BLE wire protocol.
//!
//! Everything in here is a pure transform: no radio, no clocks, no I/O.
//! The session and transport layers live in `nuki-ble`.

pub mod beacon;
pub mod constants;
pub mod crypto;
pub mod encrypted;
pub mod enums;
pub mod error;
pub mod frame;
pub mod identity;
pub mod models;

mod wire;

pub use enums::Command;
pub use error::{BeaconError, CryptoError, FrameError, IdentityError, NukiError};
