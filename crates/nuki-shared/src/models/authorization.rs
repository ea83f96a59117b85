use bytes::BufMut;

use crate::constants::{AUTHENTICATOR_SIZE, CHALLENGE_SIZE, NAME_SIZE};
use crate::crypto::Authenticator;
use crate::error::FrameError;
use crate::wire::{pad_name, Reader};

/// Body of `AuthorizationData` (step 4 of pairing), without the leading
/// authenticator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationData {
    pub id_type: u8,
    pub app_id: u32,
    pub name: String,
    pub nonce: [u8; CHALLENGE_SIZE],
}

impl AuthorizationData {
    pub const SIZE: usize = 1 + 4 + NAME_SIZE + CHALLENGE_SIZE;

    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(Self::SIZE);
        buf.put_u8(self.id_type);
        buf.put_u32_le(self.app_id);
        buf.put_slice(&pad_name::<NAME_SIZE>(&self.name));
        buf.put_slice(&self.nonce);
        buf
    }

    /// Splits a full `AuthorizationData` payload into authenticator and body.
    pub fn decode(payload: &[u8]) -> Result<(Authenticator, Self), FrameError> {
        let mut r = Reader::new(payload, "authorization data");
        r.need(AUTHENTICATOR_SIZE + Self::SIZE)?;
        let authenticator = r.array()?;
        Ok((
            authenticator,
            Self {
                id_type: r.u8()?,
                app_id: r.u32_le()?,
                name: r.name::<NAME_SIZE>()?,
                nonce: r.array()?,
            },
        ))
    }
}

/// The lock's answer to `AuthorizationData`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationIdResponse {
    pub authenticator: Authenticator,
    pub authorization_id: u32,
    pub uuid: [u8; 16],
    pub nonce: [u8; CHALLENGE_SIZE],
}

impl AuthorizationIdResponse {
    pub const SIZE: usize = AUTHENTICATOR_SIZE + 4 + 16 + CHALLENGE_SIZE;

    pub fn decode(payload: &[u8]) -> Result<Self, FrameError> {
        let mut r = Reader::new(payload, "authorization id");
        r.need(Self::SIZE)?;
        Ok(Self {
            authenticator: r.array()?,
            authorization_id: r.u32_le()?,
            uuid: r.array()?,
            nonce: r.array()?,
        })
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(Self::SIZE);
        buf.put_slice(&self.authenticator);
        buf.put_u32_le(self.authorization_id);
        buf.put_slice(&self.uuid);
        buf.put_slice(&self.nonce);
        buf
    }
}

/// Final pairing step: authenticator over `authorization id | lock nonce`,
/// followed by the authorization id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationIdConfirmation {
    pub authenticator: Authenticator,
    pub authorization_id: u32,
}

impl AuthorizationIdConfirmation {
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(AUTHENTICATOR_SIZE + 4);
        buf.put_slice(&self.authenticator);
        buf.put_u32_le(self.authorization_id);
        buf
    }

    pub fn decode(payload: &[u8]) -> Result<Self, FrameError> {
        let mut r = Reader::new(payload, "authorization id confirmation");
        Ok(Self {
            authenticator: r.array()?,
            authorization_id: r.u32_le()?,
        })
    }
}
