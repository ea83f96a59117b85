//! Six-step key exchange that turns an unpaired lock into an authorized one.
//!
//! All steps run over the unencrypted pairing characteristic. Credentials are
//! only handed to the [`Lock`] after the final confirmation, so a failure at
//! any step leaves it unpaired.

use nuki_shared::constants::{CHALLENGE_SIZE, ID_TYPE_BRIDGE, PUBKEY_SIZE};
use nuki_shared::crypto::{random_bytes, SharedKey};
use nuki_shared::frame::Frame;
use nuki_shared::identity::BridgeIdentity;
use nuki_shared::models::{AuthorizationData, AuthorizationIdConfirmation, AuthorizationIdResponse};
use nuki_shared::{Command, FrameError};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::SessionError;
use crate::lock::{challenge_nonce, Lock};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PairingState {
    Disconnected,
    Connected,
    KeysExchanged,
    ChallengeIssued,
    AuthorizationSubmitted,
    Confirmed,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairingOutcome {
    pub authorization_id: u32,
    pub peer_public_key: [u8; PUBKEY_SIZE],
    /// Lock-side UUID of the new authorization
    pub uuid: [u8; 16],
}

pub struct Pairing<'a> {
    lock: &'a mut Lock,
    identity: &'a BridgeIdentity,
    app_id: u32,
    name: String,
    state: PairingState,
}

impl<'a> Pairing<'a> {
    pub fn new(
        lock: &'a mut Lock,
        identity: &'a BridgeIdentity,
        app_id: u32,
        name: impl Into<String>,
    ) -> Self {
        let state = if lock.is_connected() {
            PairingState::Connected
        } else {
            PairingState::Disconnected
        };
        Self {
            lock,
            identity,
            app_id,
            name: name.into(),
            state,
        }
    }

    pub fn state(&self) -> PairingState {
        self.state
    }

    pub async fn run(&mut self) -> Result<PairingOutcome, SessionError> {
        match self.handshake().await {
            Ok(outcome) => {
                self.state = PairingState::Confirmed;
                info!(
                    lock = %self.lock.address(),
                    authorization_id = outcome.authorization_id,
                    "Pairing complete"
                );
                Ok(outcome)
            }
            Err(e) => {
                warn!(lock = %self.lock.address(), state = ?self.state, error = %e, "Pairing failed");
                self.state = PairingState::Failed;
                Err(e)
            }
        }
    }

    async fn handshake(&mut self) -> Result<PairingOutcome, SessionError> {
        self.lock.ensure_connected().await?;
        self.state = PairingState::Connected;

        // 1. lock public key
        let reply = self
            .exchange(Frame::request_data(Command::PublicKey), Command::PublicKey)
            .await?;
        let peer_public_key: [u8; PUBKEY_SIZE] = reply
            .payload
            .get(..PUBKEY_SIZE)
            .and_then(|key| key.try_into().ok())
            .ok_or(FrameError::Malformed {
                context: "public key",
                needed: PUBKEY_SIZE,
                available: reply.payload.len(),
            })?;
        let shared_key = self.identity.shared_key(&peer_public_key);
        let bridge_public_key = self.identity.public_key_bytes();

        // 2. our public key, answered by the first challenge
        let reply = self
            .exchange(
                Frame::new(Command::PublicKey, bridge_public_key),
                Command::Challenge,
            )
            .await?;
        let first_nonce = challenge_nonce(&reply.payload)?;
        self.state = PairingState::KeysExchanged;
        debug!(lock = %self.lock.address(), "Public keys exchanged");

        // 3. prove we hold the shared key
        let authenticator =
            shared_key.authenticator(&[&bridge_public_key, &peer_public_key, &first_nonce])?;
        let reply = self
            .exchange(
                Frame::new(Command::AuthorizationAuthenticator, authenticator),
                Command::Challenge,
            )
            .await?;
        let second_nonce = challenge_nonce(&reply.payload)?;
        self.state = PairingState::ChallengeIssued;

        // 4. who we are
        let data = AuthorizationData {
            id_type: ID_TYPE_BRIDGE,
            app_id: self.app_id,
            name: self.name.clone(),
            nonce: random_bytes::<CHALLENGE_SIZE>(),
        };
        let reply = self
            .exchange(
                Frame::new(
                    Command::AuthorizationData,
                    signed(&shared_key, &data.encode(), &second_nonce)?,
                ),
                Command::AuthorizationId,
            )
            .await?;
        let response = AuthorizationIdResponse::decode(&reply.payload)?;
        self.state = PairingState::AuthorizationSubmitted;
        debug!(
            lock = %self.lock.address(),
            authorization_id = response.authorization_id,
            "Authorization id assigned"
        );

        // 5. confirm the assigned id
        let id_bytes = response.authorization_id.to_le_bytes();
        let confirmation = AuthorizationIdConfirmation {
            authenticator: shared_key.authenticator(&[&id_bytes, &response.nonce])?,
            authorization_id: response.authorization_id,
        };
        let reply = self
            .lock
            .exchange_plain(&Frame::new(
                Command::AuthorizationIdConfirmation,
                confirmation.encode(),
            ))
            .await?;
        if reply.command == Command::ErrorReport {
            return Err(SessionError::unexpected(
                Command::Status,
                reply.command,
                reply.error_report(),
            ));
        }

        self.lock
            .set_credentials(response.authorization_id, peer_public_key, shared_key);
        Ok(PairingOutcome {
            authorization_id: response.authorization_id,
            peer_public_key,
            uuid: response.uuid,
        })
    }

    async fn exchange(&mut self, frame: Frame, expected: Command) -> Result<Frame, SessionError> {
        let reply = self.lock.exchange_plain(&frame).await?;
        if reply.command != expected {
            return Err(SessionError::unexpected(
                expected,
                reply.command,
                reply.error_report(),
            ));
        }
        Ok(reply)
    }
}

/// `HMAC(body ‖ nonce) ‖ body`
fn signed(key: &SharedKey, body: &[u8], nonce: &[u8]) -> Result<Vec<u8>, SessionError> {
    let authenticator = key.authenticator(&[body, nonce])?;
    let mut payload = Vec::with_capacity(authenticator.len() + body.len());
    payload.extend_from_slice(&authenticator);
    payload.extend_from_slice(body);
    Ok(payload)
}
