//! In-process stand-ins for the radio and for real locks.
//!
//! [`SimulatedLock`] speaks the actual wire protocol: it has its own key pair,
//! checks authenticators and nonces, seals its answers and hands them back in
//! 20-byte notification chunks. [`SimulatedRadio`] records how the bridge uses
//! the radio so tests can assert that scanning and sessions never overlap.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use nuki_shared::constants::{
    CHALLENGE_SIZE, KEYTURNER_USDIO_UUID, PAIRING_GDIO_UUID, PAIRING_SERVICE_UUID,
};
use nuki_shared::crypto::{random_bytes, SharedKey};
use nuki_shared::encrypted::{self, DecryptedMessage};
use nuki_shared::enums::{
    CompletionStatus, DoorSensorState, ErrorCode, LockAction, LockState, LogType, NukiState,
    SortOrder, StatusCode, Trigger,
};
use nuki_shared::frame::Frame;
use nuki_shared::identity::BridgeIdentity;
use nuki_shared::models::{
    AuthorizationData, AuthorizationIdConfirmation, AuthorizationIdResponse, Config,
    ConfigRequest, ErrorReport, KeyturnerState, LockActionRequest, LogEntriesRequest, LogEntry,
    LogEntryDetails,
};
use nuki_shared::Command;
use tokio::sync::{mpsc, oneshot};
use uuid::Uuid;

use crate::adapter::{Advertisement, AdvertisementSink, BleAdapter, BleConnection, ServiceData};
use crate::error::BleError;
use crate::lock::Transport;
use crate::settings::BridgeSettings;

const CHUNK: usize = 20;
const CONNECT_LATENCY: Duration = Duration::from_millis(5);
const MOTOR_TIME: Duration = Duration::from_millis(80);

pub(crate) fn test_settings() -> BridgeSettings {
    BridgeSettings {
        app_id: 50,
        bridge_name: "TestBridge".into(),
        receive_window: Duration::from_millis(30),
        action_timeout: Duration::from_secs(1),
        scan_settle: Duration::ZERO,
        scan_retry: Duration::from_millis(10),
        pairing_window: Duration::from_millis(300),
        beacon_debounce: Duration::from_secs(2),
    }
}

// ---------------------------------------------------------------------------
// Radio
// ---------------------------------------------------------------------------

#[derive(Default)]
pub(crate) struct RadioStats {
    scanning: AtomicBool,
    scans_started: AtomicUsize,
    connects: AtomicUsize,
    active_sessions: AtomicUsize,
    max_sessions: AtomicUsize,
    overlaps: AtomicUsize,
}

impl RadioStats {
    pub fn is_scanning(&self) -> bool {
        self.scanning.load(Ordering::SeqCst)
    }

    pub fn scans_started(&self) -> usize {
        self.scans_started.load(Ordering::SeqCst)
    }

    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    pub fn active_sessions(&self) -> usize {
        self.active_sessions.load(Ordering::SeqCst)
    }

    pub fn max_sessions(&self) -> usize {
        self.max_sessions.load(Ordering::SeqCst)
    }

    /// Connects made while scanning or while another session was open.
    pub fn overlaps(&self) -> usize {
        self.overlaps.load(Ordering::SeqCst)
    }

    fn session_opened(&self) {
        self.connects.fetch_add(1, Ordering::SeqCst);
        if self.is_scanning() {
            self.overlaps.fetch_add(1, Ordering::SeqCst);
        }
        let previous = self.active_sessions.fetch_add(1, Ordering::SeqCst);
        if previous > 0 {
            self.overlaps.fetch_add(1, Ordering::SeqCst);
        }
        self.max_sessions.fetch_max(previous + 1, Ordering::SeqCst);
    }

    fn session_closed(&self) {
        self.active_sessions.fetch_sub(1, Ordering::SeqCst);
    }
}

pub(crate) struct SimulatedRadio {
    locks: Mutex<HashMap<String, Arc<SimulatedLock>>>,
    sink: Mutex<Option<AdvertisementSink>>,
    stats: Arc<RadioStats>,
    failing_scans: AtomicUsize,
}

impl SimulatedRadio {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            locks: Mutex::new(HashMap::new()),
            sink: Mutex::new(None),
            stats: Arc::new(RadioStats::default()),
            failing_scans: AtomicUsize::new(0),
        })
    }

    pub fn add_lock(&self, lock: Arc<SimulatedLock>) {
        self.locks
            .lock()
            .unwrap()
            .insert(lock.address.clone(), lock);
    }

    pub fn stats(&self) -> &RadioStats {
        &self.stats
    }

    pub fn transport(self: &Arc<Self>) -> Transport {
        Transport::new(self.clone(), &test_settings())
    }

    /// The next `count` scans fail immediately, as with a powered-off adapter.
    pub fn fail_next_scans(&self, count: usize) {
        self.failing_scans.store(count, Ordering::SeqCst);
    }

    /// Hand an advertisement to the running scan. `false` when nobody is
    /// scanning or the sink dropped it.
    pub fn advertise(&self, advertisement: Advertisement) -> bool {
        match self.sink.lock().unwrap().as_ref() {
            Some(sink) => sink.deliver(advertisement),
            None => false,
        }
    }

    /// Wait until a scan is running again.
    pub async fn wait_for_scan(&self) {
        for _ in 0..200 {
            if self.sink.lock().unwrap().is_some() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("scan did not restart");
    }
}

#[async_trait]
impl BleAdapter for SimulatedRadio {
    async fn scan(
        &self,
        sink: AdvertisementSink,
        stop: oneshot::Receiver<()>,
    ) -> Result<(), BleError> {
        if self
            .failing_scans
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
        {
            return Err(BleError::Backend("adapter powered off".into()));
        }
        self.stats.scanning.store(true, Ordering::SeqCst);
        self.stats.scans_started.fetch_add(1, Ordering::SeqCst);
        *self.sink.lock().unwrap() = Some(sink);

        let _ = stop.await;

        *self.sink.lock().unwrap() = None;
        self.stats.scanning.store(false, Ordering::SeqCst);
        Ok(())
    }

    async fn connect(&self, address: &str) -> Result<Box<dyn BleConnection>, BleError> {
        let lock = self
            .locks
            .lock()
            .unwrap()
            .get(&address.to_uppercase())
            .cloned()
            .ok_or_else(|| BleError::DeviceNotFound(address.to_string()))?;

        self.stats.session_opened();
        tokio::time::sleep(CONNECT_LATENCY).await;
        Ok(Box::new(SimulatedConnection {
            lock,
            stats: self.stats.clone(),
            subscriptions: HashMap::new(),
            open: true,
        }))
    }
}

struct SimulatedConnection {
    lock: Arc<SimulatedLock>,
    stats: Arc<RadioStats>,
    subscriptions: HashMap<Uuid, mpsc::Sender<Vec<u8>>>,
    open: bool,
}

impl SimulatedConnection {
    fn close(&mut self) {
        if self.open {
            self.open = false;
            self.subscriptions.clear();
            self.stats.session_closed();
        }
    }
}

#[async_trait]
impl BleConnection for SimulatedConnection {
    async fn subscribe(&mut self, characteristic: Uuid) -> Result<mpsc::Receiver<Vec<u8>>, BleError> {
        if !self.open {
            return Err(BleError::Disconnected);
        }
        let (tx, rx) = mpsc::channel(256);
        self.subscriptions.insert(characteristic, tx);
        Ok(rx)
    }

    async fn write(&mut self, characteristic: Uuid, data: &[u8]) -> Result<(), BleError> {
        if !self.open {
            return Err(BleError::Disconnected);
        }
        let Some(tx) = self.subscriptions.get(&characteristic).cloned() else {
            return Ok(());
        };

        for transfer in self.lock.handle(characteristic, data) {
            if transfer.delay.is_zero() {
                send_chunks(&tx, &transfer.bytes).await;
            } else {
                let tx = tx.clone();
                tokio::spawn(async move {
                    tokio::time::sleep(transfer.delay).await;
                    send_chunks(&tx, &transfer.bytes).await;
                });
            }
        }
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<(), BleError> {
        self.close();
        Ok(())
    }
}

impl Drop for SimulatedConnection {
    fn drop(&mut self) {
        self.close();
    }
}

async fn send_chunks(tx: &mpsc::Sender<Vec<u8>>, bytes: &[u8]) {
    for chunk in bytes.chunks(CHUNK) {
        if tx.send(chunk.to_vec()).await.is_err() {
            return;
        }
    }
}

// ---------------------------------------------------------------------------
// Lock
// ---------------------------------------------------------------------------

struct Transfer {
    delay: Duration,
    bytes: Vec<u8>,
}

impl Transfer {
    fn now(bytes: Vec<u8>) -> Self {
        Self {
            delay: Duration::ZERO,
            bytes,
        }
    }
}

struct SimState {
    pairing_mode: bool,
    corrupt_key: bool,
    wrong_reply_to: Option<Command>,
    double_challenge: bool,

    bridge_public_key: Option<[u8; 32]>,
    pairing_key: Option<SharedKey>,
    pairing_nonce: Option<[u8; CHALLENGE_SIZE]>,
    pending_authorization: Option<(u32, [u8; CHALLENGE_SIZE])>,
    authorized_name: Option<String>,
    next_authorization_id: u32,

    shared_key: Option<SharedKey>,
    /// Seals replies instead of `shared_key` when set
    reply_key: Option<SharedKey>,
    authorization_id: Option<u32>,
    challenge: Option<[u8; CHALLENGE_SIZE]>,

    lock_state: LockState,
    last_action: LockAction,
    last_action_suffix: Option<String>,
    state_fetches: usize,
    log: Vec<LogEntry>,
    pin: u16,
}

pub(crate) struct SimulatedLock {
    pub address: String,
    pub nuki_id: u32,
    keys: BridgeIdentity,
    state: Mutex<SimState>,
}

impl SimulatedLock {
    pub fn new(address: &str, nuki_id: u32) -> Arc<Self> {
        Arc::new(Self {
            address: address.to_uppercase(),
            nuki_id,
            keys: BridgeIdentity::generate(),
            state: Mutex::new(SimState {
                pairing_mode: false,
                corrupt_key: false,
                wrong_reply_to: None,
                double_challenge: false,
                bridge_public_key: None,
                pairing_key: None,
                pairing_nonce: None,
                pending_authorization: None,
                authorized_name: None,
                next_authorization_id: 3,
                shared_key: None,
                reply_key: None,
                authorization_id: None,
                challenge: None,
                lock_state: LockState::Locked,
                last_action: LockAction::Lock,
                last_action_suffix: None,
                state_fetches: 0,
                log: Vec::new(),
                pin: 4321,
            }),
        })
    }

    pub fn public_key(&self) -> [u8; 32] {
        self.keys.public_key_bytes()
    }

    pub fn enter_pairing_mode(&self) {
        self.state.lock().unwrap().pairing_mode = true;
    }

    /// Answer the frame the bridge sends with `command` with the wrong reply.
    pub fn reply_wrong_command_to(&self, command: Command) {
        self.state.lock().unwrap().wrong_reply_to = Some(command);
    }

    /// Derive a key that does not match the bridge's.
    pub fn corrupt_shared_key(&self) {
        self.state.lock().unwrap().corrupt_key = true;
    }

    /// Answer challenge requests with two challenges in one transfer.
    pub fn send_two_challenges(&self) {
        self.state.lock().unwrap().double_challenge = true;
    }

    /// Keep reading requests with the session key but seal replies with `key`.
    pub fn seal_replies_with(&self, key: SharedKey) {
        self.state.lock().unwrap().reply_key = Some(key);
    }

    /// Skip the handshake and trust `bridge` under `authorization_id`.
    pub fn pair_with(&self, bridge: &BridgeIdentity, authorization_id: u32) {
        let mut st = self.state.lock().unwrap();
        st.shared_key = Some(self.keys.shared_key(&bridge.public_key_bytes()));
        st.authorization_id = Some(authorization_id);
    }

    pub fn authorization_id(&self) -> Option<u32> {
        self.state.lock().unwrap().authorization_id
    }

    pub fn shared_key(&self) -> Option<SharedKey> {
        self.state.lock().unwrap().shared_key.clone()
    }

    pub fn authorized_name(&self) -> Option<String> {
        self.state.lock().unwrap().authorized_name.clone()
    }

    pub fn set_lock_state(&self, lock_state: LockState) {
        self.state.lock().unwrap().lock_state = lock_state;
    }

    pub fn state_fetches(&self) -> usize {
        self.state.lock().unwrap().state_fetches
    }

    pub fn last_action_suffix(&self) -> Option<String> {
        self.state.lock().unwrap().last_action_suffix.clone()
    }

    pub fn pin(&self) -> u16 {
        self.state.lock().unwrap().pin
    }

    /// Append `count` unlock records, numbered from 1.
    pub fn push_log_entries(&self, count: u32) {
        let mut st = self.state.lock().unwrap();
        for index in 1..=count {
            st.log.push(LogEntry {
                index,
                timestamp: None,
                auth_id: 7,
                name: "Bridge".into(),
                log_type: LogType::LockAction,
                details: LogEntryDetails::LockActionRecord {
                    action: LockAction::Unlock,
                    trigger: Trigger::Manual,
                    flags: 0,
                    status: CompletionStatus::Success,
                },
            });
        }
    }

    pub fn pairing_advertisement(&self) -> Advertisement {
        Advertisement {
            address: self.address.clone(),
            service_data: vec![ServiceData {
                uuid: PAIRING_SERVICE_UUID,
                data: vec![],
            }],
            manufacturer_data: vec![],
        }
    }

    pub fn beacon(&self, tx_power: i8) -> Advertisement {
        let mut data = vec![0x4C, 0x00, 0x02, 0x15];
        data.extend_from_slice(&PAIRING_SERVICE_UUID.into_bytes());
        data.extend_from_slice(&self.nuki_id.to_be_bytes());
        data.push(tx_power as u8);
        Advertisement {
            address: self.address.clone(),
            service_data: vec![],
            manufacturer_data: data,
        }
    }

    fn keyturner_state(&self, st: &SimState) -> KeyturnerState {
        KeyturnerState {
            nuki_state: NukiState::DoorMode,
            lock_state: st.lock_state,
            trigger: Trigger::System,
            current_time: None,
            timezone_offset: 0,
            critical_battery: false,
            config_update_count: 0,
            lockngo_timer: false,
            last_lock_action: st.last_action,
            last_lock_action_trigger: Trigger::System,
            last_lock_action_completion_status: CompletionStatus::Success,
            door_sensor_state: DoorSensorState::DoorClosed,
        }
    }

    fn config(&self, st: &SimState) -> Config {
        Config {
            nuki_id: self.nuki_id,
            name: format!("Nuki_{:08X}", self.nuki_id),
            latitude: 52.5,
            longitude: 13.4,
            auto_unlatch: false,
            pairing_enabled: st.pairing_mode,
            button_enabled: true,
            led_enabled: true,
            led_brightness: 3,
            current_time: None,
            timezone_offset: 60,
            dst_mode: true,
            has_fob: false,
            fob_action_1: 1,
            fob_action_2: 2,
            fob_action_3: 0,
            single_lock: false,
            advertising_mode: 0,
            has_keypad: false,
            firmware_version: "2.12.4".into(),
            hardware_revision: "5.1".into(),
            homekit_status: 0,
            timezone_id: 37,
        }
    }

    fn handle(&self, characteristic: Uuid, data: &[u8]) -> Vec<Transfer> {
        let mut st = self.state.lock().unwrap();
        if characteristic == PAIRING_GDIO_UUID {
            vec![Transfer::now(self.handle_plain(&mut st, data).encode())]
        } else if characteristic == KEYTURNER_USDIO_UUID {
            self.handle_encrypted(&mut st, data)
        } else {
            Vec::new()
        }
    }

    // ---- pairing characteristic ----

    fn handle_plain(&self, st: &mut SimState, data: &[u8]) -> Frame {
        let frame = match Frame::decode(data) {
            Ok(frame) => frame,
            Err(_) => return error_frame(ErrorCode::BadCrc, Command::Other(0)),
        };
        if st.wrong_reply_to == Some(frame.command) {
            return if frame.command == Command::AuthorizationIdConfirmation {
                error_frame(ErrorCode::BadParameter, frame.command)
            } else {
                Frame::new(Command::Status, vec![StatusCode::Complete.raw()])
            };
        }
        if !st.pairing_mode {
            return error_frame(ErrorCode::NotPairing, frame.command);
        }

        match frame.command {
            Command::RequestData if frame.payload == Command::PublicKey.raw().to_le_bytes() => {
                Frame::new(Command::PublicKey, self.public_key())
            }
            Command::PublicKey => {
                let Ok(bridge_public_key) = <[u8; 32]>::try_from(frame.payload.as_slice()) else {
                    return error_frame(ErrorCode::PairingBadParameter, frame.command);
                };
                let key = if st.corrupt_key {
                    SharedKey::from_bytes(random_bytes())
                } else {
                    self.keys.shared_key(&bridge_public_key)
                };
                let nonce: [u8; CHALLENGE_SIZE] = random_bytes();
                st.bridge_public_key = Some(bridge_public_key);
                st.pairing_key = Some(key);
                st.pairing_nonce = Some(nonce);
                Frame::new(Command::Challenge, nonce)
            }
            Command::AuthorizationAuthenticator => {
                let (Some(key), Some(bridge), Some(nonce)) =
                    (&st.pairing_key, st.bridge_public_key, st.pairing_nonce)
                else {
                    return error_frame(ErrorCode::PairingBadParameter, frame.command);
                };
                if key
                    .verify_authenticator(&[&bridge, &self.public_key(), &nonce], &frame.payload)
                    .is_err()
                {
                    return error_frame(ErrorCode::BadAuthenticator, frame.command);
                }
                let nonce: [u8; CHALLENGE_SIZE] = random_bytes();
                st.pairing_nonce = Some(nonce);
                Frame::new(Command::Challenge, nonce)
            }
            Command::AuthorizationData => {
                let (Some(key), Some(nonce)) = (st.pairing_key.clone(), st.pairing_nonce) else {
                    return error_frame(ErrorCode::PairingBadParameter, frame.command);
                };
                let Ok((authenticator, body)) = AuthorizationData::decode(&frame.payload) else {
                    return error_frame(ErrorCode::PairingBadParameter, frame.command);
                };
                if key
                    .verify_authenticator(&[&body.encode(), &nonce], &authenticator)
                    .is_err()
                {
                    return error_frame(ErrorCode::BadAuthenticator, frame.command);
                }

                let authorization_id = st.next_authorization_id;
                st.next_authorization_id += 1;
                let uuid = random_bytes::<16>();
                let response_nonce: [u8; CHALLENGE_SIZE] = random_bytes();
                let id_bytes = authorization_id.to_le_bytes();
                let Ok(authenticator) =
                    key.authenticator(&[&id_bytes, &uuid, &response_nonce, &body.nonce])
                else {
                    return error_frame(ErrorCode::Unknown, frame.command);
                };
                st.pending_authorization = Some((authorization_id, response_nonce));
                st.authorized_name = Some(body.name);
                Frame::new(
                    Command::AuthorizationId,
                    AuthorizationIdResponse {
                        authenticator,
                        authorization_id,
                        uuid,
                        nonce: response_nonce,
                    }
                    .encode(),
                )
            }
            Command::AuthorizationIdConfirmation => {
                let (Some(key), Some((pending, nonce))) =
                    (st.pairing_key.clone(), st.pending_authorization)
                else {
                    return error_frame(ErrorCode::PairingBadParameter, frame.command);
                };
                let Ok(confirmation) = AuthorizationIdConfirmation::decode(&frame.payload) else {
                    return error_frame(ErrorCode::PairingBadParameter, frame.command);
                };
                if confirmation.authorization_id != pending
                    || key
                        .verify_authenticator(
                            &[&pending.to_le_bytes(), &nonce],
                            &confirmation.authenticator,
                        )
                        .is_err()
                {
                    return error_frame(ErrorCode::BadAuthenticator, frame.command);
                }
                st.shared_key = Some(key);
                st.authorization_id = Some(pending);
                st.pairing_mode = false;
                Frame::new(Command::Status, vec![StatusCode::Complete.raw()])
            }
            other => error_frame(ErrorCode::PairingBadParameter, other),
        }
    }

    // ---- encrypted characteristic ----

    fn handle_encrypted(&self, st: &mut SimState, data: &[u8]) -> Vec<Transfer> {
        let (Some(key), Some(authorization_id)) = (st.shared_key.clone(), st.authorization_id)
        else {
            return Vec::new();
        };
        // Undecryptable requests get no answer.
        let Ok(messages) = encrypted::open(&key, data) else {
            return Vec::new();
        };

        let reply_key = st.reply_key.clone().unwrap_or_else(|| key.clone());
        let seal = |replies: &[(Command, Vec<u8>)]| -> Vec<u8> {
            replies
                .iter()
                .flat_map(|(command, payload)| {
                    encrypted::seal(&reply_key, authorization_id, *command, payload).unwrap()
                })
                .collect()
        };

        let mut transfers = Vec::new();
        for message in messages {
            if message.inner_authorization_id != authorization_id {
                let report = report(ErrorCode::InvalidAuthId, message.command);
                transfers.push(Transfer::now(seal(&[report])));
                continue;
            }
            for (delay, replies) in self.respond(st, &message) {
                transfers.push(Transfer {
                    delay,
                    bytes: seal(&replies),
                });
            }
        }
        transfers
    }

    fn respond(
        &self,
        st: &mut SimState,
        message: &DecryptedMessage,
    ) -> Vec<(Duration, Vec<(Command, Vec<u8>)>)> {
        let now = |replies| vec![(Duration::ZERO, replies)];

        match message.command {
            Command::RequestData => {
                let wanted = message
                    .payload
                    .get(..2)
                    .map(|raw| Command::from_raw(u16::from_le_bytes([raw[0], raw[1]])));
                match wanted {
                    Some(Command::Challenge) => {
                        let nonce: [u8; CHALLENGE_SIZE] = random_bytes();
                        st.challenge = Some(nonce);
                        let mut replies = vec![(Command::Challenge, nonce.to_vec())];
                        if st.double_challenge {
                            let other: [u8; CHALLENGE_SIZE] = random_bytes();
                            replies.push((Command::Challenge, other.to_vec()));
                        }
                        now(replies)
                    }
                    Some(Command::KeyturnerStates) => {
                        st.state_fetches += 1;
                        now(vec![(
                            Command::KeyturnerStates,
                            self.keyturner_state(st).encode(),
                        )])
                    }
                    _ => now(vec![report(ErrorCode::BadParameter, message.command)]),
                }
            }
            Command::RequestConfig => match ConfigRequest::decode(&message.payload) {
                Ok(request) if take_challenge(st) == Some(request.nonce) => {
                    now(vec![(Command::Config, self.config(st).encode())])
                }
                _ => now(vec![report(ErrorCode::BadNonce, message.command)]),
            },
            Command::LockAction => match LockActionRequest::decode(&message.payload) {
                Ok(request) if take_challenge(st) == Some(request.nonce) => {
                    st.lock_state = match request.action {
                        LockAction::Unlock => LockState::Unlocked,
                        LockAction::Unlatch | LockAction::LocknGoUnlatch => LockState::Unlatched,
                        LockAction::Lock | LockAction::LocknGo | LockAction::FullLock => {
                            LockState::Locked
                        }
                        _ => st.lock_state,
                    };
                    st.last_action = request.action;
                    st.last_action_suffix = Some(request.name_suffix);
                    vec![
                        (
                            Duration::ZERO,
                            vec![(Command::Status, vec![StatusCode::Accepted.raw()])],
                        ),
                        (
                            MOTOR_TIME,
                            vec![
                                (Command::KeyturnerStates, self.keyturner_state(st).encode()),
                                (Command::Status, vec![StatusCode::Complete.raw()]),
                            ],
                        ),
                    ]
                }
                _ => now(vec![report(ErrorCode::BadNonce, message.command)]),
            },
            Command::RequestLogEntries => match LogEntriesRequest::decode(&message.payload) {
                Ok(request) if take_challenge(st) == Some(request.nonce) => {
                    if request.pin != st.pin {
                        return now(vec![report(ErrorCode::BadPin, message.command)]);
                    }
                    let mut entries = st.log.clone();
                    if request.sort_order == SortOrder::Descending {
                        entries.reverse();
                    }
                    let mut replies: Vec<_> = entries
                        .iter()
                        .skip(request.start_index as usize)
                        .take(usize::from(request.count))
                        .map(|entry| (Command::LogEntry, entry.encode()))
                        .collect();
                    replies.push((Command::Status, vec![StatusCode::Complete.raw()]));
                    now(replies)
                }
                _ => now(vec![report(ErrorCode::BadNonce, message.command)]),
            },
            other => now(vec![report(ErrorCode::BadParameter, other)]),
        }
    }
}

fn take_challenge(st: &mut SimState) -> Option<[u8; CHALLENGE_SIZE]> {
    st.challenge.take()
}

fn report(code: ErrorCode, command: Command) -> (Command, Vec<u8>) {
    (Command::ErrorReport, ErrorReport { code, command }.encode())
}

fn error_frame(code: ErrorCode, command: Command) -> Frame {
    let (command_id, payload) = report(code, command);
    Frame::new(command_id, payload)
}
