//! Per-lock session: key material, cached snapshots and the
//! connect / challenge / command / decode cycle.

use std::sync::Arc;
use std::time::{Duration, Instant};

use nuki_shared::constants::{
    CHALLENGE_SIZE, KEYTURNER_USDIO_UUID, PAIRING_GDIO_UUID, PUBKEY_SIZE,
};
use nuki_shared::crypto::SharedKey;
use nuki_shared::encrypted::{self, DecryptedMessage};
use nuki_shared::enums::{CompletionStatus, LockAction, SortOrder, StatusCode};
use nuki_shared::frame::Frame;
use nuki_shared::identity::BridgeIdentity;
use nuki_shared::models::{
    Config, ConfigRequest, KeyturnerState, LockActionRequest, LogEntriesRequest, LogEntry,
};
use nuki_shared::{Command, FrameError};
use nuki_store::{LockConfiguration, StoreError};
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::adapter::{BleAdapter, BleConnection};
use crate::error::{BleError, SessionError};
use crate::receive::{discard_pending, receive, receive_within};
use crate::settings::BridgeSettings;

/// How a lock reaches the radio.
#[derive(Clone)]
pub struct Transport {
    pub adapter: Arc<dyn BleAdapter>,
    pub receive_window: Duration,
    /// Upper bound on waiting for the next progress report of a lock action
    pub action_timeout: Duration,
    pub app_id: u32,
}

impl Transport {
    pub fn new(adapter: Arc<dyn BleAdapter>, settings: &BridgeSettings) -> Self {
        Self {
            adapter,
            receive_window: settings.receive_window,
            action_timeout: settings.action_timeout,
            app_id: settings.app_id,
        }
    }
}

/// Result of a lock action as far as the lock reported it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LockActionOutcome {
    /// Last `Status` frame seen: `Accepted` while the motor is still
    /// running, `Complete` once the lock is done.
    pub status: Option<StatusCode>,
    /// Most recent state pushed during the action
    pub state: Option<KeyturnerState>,
    pub completion_status: Option<CompletionStatus>,
}

impl LockActionOutcome {
    pub fn is_complete(&self) -> bool {
        self.status == Some(StatusCode::Complete)
    }
}

struct Session {
    connection: Box<dyn BleConnection>,
    pairing: mpsc::Receiver<Vec<u8>>,
    usdio: mpsc::Receiver<Vec<u8>>,
}

pub struct Lock {
    address: String,
    transport: Transport,
    authorization_id: Option<u32>,
    admin_pin: u16,
    peer_public_key: Option<[u8; PUBKEY_SIZE]>,
    shared_key: Option<SharedKey>,
    last_config: Option<Config>,
    last_state: Option<KeyturnerState>,
    last_fetch: Option<Instant>,
    session: Option<Session>,
}

impl Lock {
    /// An unpaired lock, e.g. a pairing candidate.
    pub fn new(address: impl Into<String>, transport: Transport) -> Self {
        Self {
            address: address.into().to_uppercase(),
            transport,
            authorization_id: None,
            admin_pin: 0,
            peer_public_key: None,
            shared_key: None,
            last_config: None,
            last_state: None,
            last_fetch: None,
            session: None,
        }
    }

    /// Restore a paired lock from its persisted record.
    pub fn from_record(
        record: &LockConfiguration,
        identity: &BridgeIdentity,
        transport: Transport,
    ) -> Result<Self, StoreError> {
        let peer_public_key = record.public_key()?;
        let mut lock = Self::new(&record.address, transport);
        lock.set_credentials(
            record.authorization_id()?,
            peer_public_key,
            identity.shared_key(&peer_public_key),
        );
        lock.admin_pin = record.admin_pin;
        Ok(lock)
    }

    /// `None` until pairing has completed.
    pub fn to_record(&self) -> Option<LockConfiguration> {
        let authorization_id = self.authorization_id?;
        let peer_public_key = self.peer_public_key.as_ref()?;
        Some(LockConfiguration::new(
            &self.address,
            authorization_id,
            peer_public_key,
            self.admin_pin,
        ))
    }

    /// Same credentials and snapshots, no connection.
    pub(crate) fn detached(&self) -> Self {
        Self {
            address: self.address.clone(),
            transport: self.transport.clone(),
            authorization_id: self.authorization_id,
            admin_pin: self.admin_pin,
            peer_public_key: self.peer_public_key,
            shared_key: self.shared_key.clone(),
            last_config: self.last_config.clone(),
            last_state: self.last_state.clone(),
            last_fetch: self.last_fetch,
            session: None,
        }
    }

    /// Take over whatever `other` fetched more recently than this lock.
    /// Credentials and the admin PIN stay untouched.
    pub(crate) fn absorb_snapshots(&mut self, other: &Lock) {
        if other.last_fetch > self.last_fetch {
            self.last_state = other.last_state.clone();
            self.last_fetch = other.last_fetch;
        }
        if other.last_config.is_some() {
            self.last_config = other.last_config.clone();
        }
    }

    pub(crate) fn set_credentials(
        &mut self,
        authorization_id: u32,
        peer_public_key: [u8; PUBKEY_SIZE],
        shared_key: SharedKey,
    ) {
        self.authorization_id = Some(authorization_id);
        self.peer_public_key = Some(peer_public_key);
        self.shared_key = Some(shared_key);
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn authorization_id(&self) -> Option<u32> {
        self.authorization_id
    }

    pub fn peer_public_key(&self) -> Option<&[u8; PUBKEY_SIZE]> {
        self.peer_public_key.as_ref()
    }

    pub fn shared_key(&self) -> Option<&SharedKey> {
        self.shared_key.as_ref()
    }

    pub fn is_paired(&self) -> bool {
        self.authorization_id.is_some() && self.shared_key.is_some()
    }

    pub fn admin_pin(&self) -> u16 {
        self.admin_pin
    }

    pub fn set_admin_pin(&mut self, pin: u16) {
        self.admin_pin = pin;
    }

    pub fn last_config(&self) -> Option<&Config> {
        self.last_config.as_ref()
    }

    pub fn last_state(&self) -> Option<&KeyturnerState> {
        self.last_state.as_ref()
    }

    /// When the bridge last fetched a state successfully.
    pub fn last_fetch(&self) -> Option<Instant> {
        self.last_fetch
    }

    pub fn is_connected(&self) -> bool {
        self.session.is_some()
    }

    pub(crate) fn transport(&self) -> &Transport {
        &self.transport
    }

    // -----------------------------------------------------------------------
    // Connection lifecycle
    // -----------------------------------------------------------------------

    pub async fn connect(&mut self) -> Result<(), SessionError> {
        debug!(lock = %self.address, "Connecting");
        let mut connection = self.transport.adapter.connect(&self.address).await?;

        let subscribed = async {
            let pairing = connection.subscribe(PAIRING_GDIO_UUID).await?;
            let usdio = connection.subscribe(KEYTURNER_USDIO_UUID).await?;
            Ok::<_, BleError>((pairing, usdio))
        }
        .await;

        match subscribed {
            Ok((pairing, usdio)) => {
                self.session = Some(Session {
                    connection,
                    pairing,
                    usdio,
                });
                info!(lock = %self.address, "Connected");
                Ok(())
            }
            Err(e) => {
                if let Err(close) = connection.disconnect().await {
                    debug!(lock = %self.address, error = %close, "Disconnect after failed subscribe");
                }
                Err(e.into())
            }
        }
    }

    pub async fn ensure_connected(&mut self) -> Result<(), SessionError> {
        if self.session.is_none() {
            self.connect().await?;
        }
        Ok(())
    }

    pub async fn disconnect(&mut self) {
        if let Some(mut session) = self.session.take() {
            match session.connection.disconnect().await {
                Ok(()) => debug!(lock = %self.address, "Disconnected"),
                Err(e) => warn!(lock = %self.address, error = %e, "Disconnect failed"),
            }
        }
    }

    fn session_mut(&mut self) -> Result<&mut Session, SessionError> {
        self.session
            .as_mut()
            .ok_or(SessionError::Connection(BleError::Disconnected))
    }

    // -----------------------------------------------------------------------
    // Unencrypted exchange (pairing characteristic)
    // -----------------------------------------------------------------------

    /// Send one unencrypted frame and decode the single reply.
    pub(crate) async fn exchange_plain(&mut self, frame: &Frame) -> Result<Frame, SessionError> {
        self.ensure_connected().await?;
        let window = self.transport.receive_window;
        let session = self.session_mut()?;

        discard_pending(&mut session.pairing);
        session
            .connection
            .write(PAIRING_GDIO_UUID, &frame.encode())
            .await?;
        let reply = receive(&mut session.pairing, window).await?;
        Ok(Frame::decode(&reply)?)
    }

    // -----------------------------------------------------------------------
    // Encrypted exchange (user-specific characteristic)
    // -----------------------------------------------------------------------

    fn credentials(&self) -> Result<(u32, SharedKey), SessionError> {
        match (self.authorization_id, &self.shared_key) {
            (Some(id), Some(key)) => Ok((id, key.clone())),
            _ => Err(SessionError::NotPaired),
        }
    }

    async fn exchange_encrypted(
        &mut self,
        command: Command,
        payload: &[u8],
    ) -> Result<Vec<DecryptedMessage>, SessionError> {
        let (authorization_id, key) = self.credentials()?;
        self.ensure_connected().await?;
        let window = self.transport.receive_window;
        let session = self.session_mut()?;

        let sealed = encrypted::seal(&key, authorization_id, command, payload)?;
        discard_pending(&mut session.usdio);
        session
            .connection
            .write(KEYTURNER_USDIO_UUID, &sealed)
            .await?;
        let reply = receive(&mut session.usdio, window).await?;
        Ok(encrypted::open(&key, &reply)?)
    }

    /// Next transfer on the encrypted characteristic, without sending.
    async fn receive_encrypted(
        &mut self,
        first_chunk: Duration,
    ) -> Result<Vec<DecryptedMessage>, SessionError> {
        let (_, key) = self.credentials()?;
        let window = self.transport.receive_window;
        let session = self.session_mut()?;
        let reply = receive_within(&mut session.usdio, first_chunk, window).await?;
        Ok(encrypted::open(&key, &reply)?)
    }

    async fn request_data(&mut self, wanted: Command) -> Result<Vec<DecryptedMessage>, SessionError> {
        self.exchange_encrypted(Command::RequestData, &wanted.raw().to_le_bytes())
            .await
    }

    async fn request_challenge(&mut self) -> Result<[u8; CHALLENGE_SIZE], SessionError> {
        let reply = self.request_data(Command::Challenge).await?;
        let challenge = expect_only(reply, Command::Challenge)?;
        challenge_nonce(&challenge.payload)
    }

    fn record_state(&mut self, state: KeyturnerState) {
        self.last_state = Some(state);
        self.last_fetch = Some(Instant::now());
    }

    // -----------------------------------------------------------------------
    // Commands
    // -----------------------------------------------------------------------

    /// Direct request, no challenge needed.
    pub async fn request_keyturner_state(&mut self) -> Result<KeyturnerState, SessionError> {
        debug!(lock = %self.address, "Request keyturner state");
        let reply = self.request_data(Command::KeyturnerStates).await?;
        let message = expect_first(reply, Command::KeyturnerStates)?;
        let state = KeyturnerState::decode(&message.payload)?;
        self.record_state(state.clone());
        Ok(state)
    }

    pub async fn request_config(&mut self) -> Result<Config, SessionError> {
        debug!(lock = %self.address, "Request config");
        let nonce = self.request_challenge().await?;
        let reply = self
            .exchange_encrypted(Command::RequestConfig, &ConfigRequest { nonce }.encode())
            .await?;
        let message = expect_first(reply, Command::Config)?;
        let config = Config::decode(&message.payload)?;
        self.last_config = Some(config.clone());
        Ok(config)
    }

    /// Trigger `action` and follow the lock's status updates until it reports
    /// completion or goes quiet.
    pub async fn lock_action(
        &mut self,
        action: LockAction,
        name_suffix: &str,
    ) -> Result<LockActionOutcome, SessionError> {
        info!(lock = %self.address, action = %action, "Lock action");
        let nonce = self.request_challenge().await?;
        let request = LockActionRequest {
            action,
            app_id: self.transport.app_id,
            flags: 0,
            name_suffix: name_suffix.to_string(),
            nonce,
        };
        let mut messages = self
            .exchange_encrypted(Command::LockAction, &request.encode())
            .await?;

        if let Some(first) = messages.first() {
            if !matches!(first.command, Command::Status | Command::KeyturnerStates) {
                return Err(SessionError::unexpected(
                    Command::Status,
                    first.command,
                    first.error_report(),
                ));
            }
        }

        let mut outcome = LockActionOutcome::default();
        loop {
            for message in &messages {
                match message.command {
                    Command::Status => {
                        let code = message.payload.first().copied().ok_or(FrameError::Malformed {
                            context: "status",
                            needed: 1,
                            available: 0,
                        })?;
                        outcome.status = Some(StatusCode::from_raw(code));
                    }
                    Command::KeyturnerStates => {
                        outcome.state = Some(KeyturnerState::decode(&message.payload)?);
                    }
                    Command::ErrorReport => {
                        return Err(SessionError::unexpected(
                            Command::Status,
                            Command::ErrorReport,
                            message.error_report(),
                        ));
                    }
                    other => debug!(lock = %self.address, command = %other, "Ignoring message during lock action"),
                }
            }
            if outcome.is_complete() {
                break;
            }
            match self.receive_encrypted(self.transport.action_timeout).await {
                Ok(more) => messages = more,
                Err(SessionError::Timeout) => {
                    debug!(lock = %self.address, "Lock went quiet before completing");
                    break;
                }
                Err(e) => return Err(e),
            }
        }

        if let Some(state) = &outcome.state {
            outcome.completion_status = Some(state.last_lock_action_completion_status);
            self.record_state(state.clone());
        }
        Ok(outcome)
    }

    /// Newest first, starting `offset` entries back.
    pub async fn request_log_entries(
        &mut self,
        offset: u32,
        count: u16,
    ) -> Result<Vec<LogEntry>, SessionError> {
        debug!(lock = %self.address, offset, count, "Request log entries");
        let nonce = self.request_challenge().await?;
        let request = LogEntriesRequest {
            start_index: offset,
            count,
            sort_order: SortOrder::Descending,
            total_count: false,
            nonce,
            pin: self.admin_pin,
        };
        let messages = self
            .exchange_encrypted(Command::RequestLogEntries, &request.encode())
            .await?;

        if let Some(first) = messages.first() {
            if !matches!(first.command, Command::LogEntry | Command::Status) {
                return Err(SessionError::unexpected(
                    Command::LogEntry,
                    first.command,
                    first.error_report(),
                ));
            }
        }

        let entries = messages
            .iter()
            .filter(|m| m.command == Command::LogEntry)
            .map(|m| LogEntry::decode(&m.payload))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }
}

impl std::fmt::Debug for Lock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Lock")
            .field("address", &self.address)
            .field("authorization_id", &self.authorization_id)
            .field("paired", &self.is_paired())
            .field("connected", &self.is_connected())
            .finish_non_exhaustive()
    }
}

fn leading(
    first: Option<DecryptedMessage>,
    expected: Command,
) -> Result<DecryptedMessage, SessionError> {
    let Some(first) = first else {
        return Err(SessionError::Timeout);
    };
    if first.command != expected {
        return Err(SessionError::unexpected(
            expected,
            first.command,
            first.error_report(),
        ));
    }
    Ok(first)
}

/// The leading message, which must be `expected`. Trailing messages are logged
/// and dropped.
fn expect_first(
    messages: Vec<DecryptedMessage>,
    expected: Command,
) -> Result<DecryptedMessage, SessionError> {
    let mut messages = messages.into_iter();
    let first = leading(messages.next(), expected)?;
    for extra in messages {
        debug!(expected = %expected, command = %extra.command, "Dropping trailing message");
    }
    Ok(first)
}

/// Exactly one message, of type `expected`.
fn expect_only(
    messages: Vec<DecryptedMessage>,
    expected: Command,
) -> Result<DecryptedMessage, SessionError> {
    let mut messages = messages.into_iter();
    let first = leading(messages.next(), expected)?;
    match messages.next() {
        Some(extra) => Err(SessionError::unexpected(
            expected,
            extra.command,
            extra.error_report(),
        )),
        None => Ok(first),
    }
}

pub(crate) fn challenge_nonce(payload: &[u8]) -> Result<[u8; CHALLENGE_SIZE], SessionError> {
    payload
        .get(..CHALLENGE_SIZE)
        .and_then(|nonce| nonce.try_into().ok())
        .ok_or(SessionError::Frame(FrameError::Malformed {
            context: "challenge",
            needed: CHALLENGE_SIZE,
            available: payload.len(),
        }))
}
