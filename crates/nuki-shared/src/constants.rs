use uuid::Uuid;

/// Application name
pub const APP_NAME: &str = "Nuki Bridge";

/// XSalsa20-Poly1305 nonce size in bytes
pub const NONCE_SIZE: usize = 24;

/// Poly1305 tag size prepended to every sealed body
pub const TAG_SIZE: usize = 16;

/// Curve25519 public key size in bytes
pub const PUBKEY_SIZE: usize = 32;

/// Curve25519 secret key size in bytes
pub const SECRET_KEY_SIZE: usize = 32;

/// Shared (precomputed) key size in bytes
pub const SHARED_KEY_SIZE: usize = 32;

/// Challenge nonce carried in Challenge frames and command payloads
pub const CHALLENGE_SIZE: usize = 32;

/// HMAC-SHA256 authenticator size
pub const AUTHENTICATOR_SIZE: usize = 32;

/// Command id (2) + CRC16 (2)
pub const FRAME_OVERHEAD: usize = 4;

/// nonce (24) + authorization id (4) + length (2)
pub const ENCRYPTED_HEADER_SIZE: usize = NONCE_SIZE + 4 + 2;

/// Name fields (authorization name, log entry name, config name) are 32 bytes, null padded
pub const NAME_SIZE: usize = 32;

/// Name suffix field of a lock action request
pub const NAME_SUFFIX_SIZE: usize = 20;

/// Manufacturer data length of a Nuki beacon advertisement
pub const BEACON_SIZE: usize = 25;

/// Beacon type byte
pub const BEACON_TYPE: u8 = 0x02;

/// Transmit power the lock advertises when nothing changed
pub const BEACON_CLEAN_TX_POWER: i8 = -60;

/// Bluetooth OUI prefix of Nuki devices
pub const NUKI_ADDRESS_PREFIX: &str = "54:D2:72:";

/// Keyturner pairing service (also advertised as service data while in pairing mode)
pub const PAIRING_SERVICE_UUID: Uuid = Uuid::from_u128(0xa92ee100_5501_11e4_916c_0800200c9a66);

/// Keyturner service
pub const KEYTURNER_SERVICE_UUID: Uuid = Uuid::from_u128(0xa92ee200_5501_11e4_916c_0800200c9a66);

/// Pairing general data input/output characteristic
pub const PAIRING_GDIO_UUID: Uuid = Uuid::from_u128(0xa92ee101_5501_11e4_916c_0800200c9a66);

/// Keyturner general data input/output characteristic
pub const KEYTURNER_GDIO_UUID: Uuid = Uuid::from_u128(0xa92ee201_5501_11e4_916c_0800200c9a66);

/// Keyturner user-specific (encrypted) data input/output characteristic
pub const KEYTURNER_USDIO_UUID: Uuid = Uuid::from_u128(0xa92ee202_5501_11e4_916c_0800200c9a66);

/// Default application id the bridge authorizes itself with
pub const DEFAULT_APP_ID: u32 = 50;

/// Default name the bridge authorizes itself with
pub const DEFAULT_BRIDGE_NAME: &str = "RustBridge";

/// Authorization id type for a bridge
pub const ID_TYPE_BRIDGE: u8 = 0x01;

/// Inactivity window that frames one notification transfer
pub const RECEIVE_WINDOW_MS: u64 = 500;

/// Pairing mode auto-disable delay
pub const PAIRING_WINDOW_SECS: u64 = 10;

/// Minimum interval between beacon-triggered state fetches of one lock
pub const BEACON_DEBOUNCE_SECS: u64 = 2;

/// Settle time after the scanner has quiesced before connecting
pub const SCAN_SETTLE_MS: u64 = 500;

/// Configuration file name
pub const CONFIG_FILE_NAME: &str = "bridge.json";

/// How long a lock action may keep reporting progress before the bridge stops listening
pub const LOCK_ACTION_TIMEOUT_SECS: u64 = 10;

/// Delay before a failed background scan is started again.
pub const SCAN_RETRY_SECS: u64 = 5;
