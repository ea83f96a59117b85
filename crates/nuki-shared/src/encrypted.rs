//! Encrypted session frames.
//!
//! ```text
//! nonce (24) | authorization id (LE32) | length (LE16) | sealed body
//! body = inner authorization id (LE32) | command (LE16) | payload | CRC16 (LE)
//! ```
//!
//! The length field counts the sealed bytes (tag included). One notification
//! transfer may carry several frames back to back.

use bytes::BufMut;

use crate::constants::{ENCRYPTED_HEADER_SIZE, NONCE_SIZE};
use crate::crypto::{random_bytes, SharedKey};
use crate::enums::Command;
use crate::error::{FrameError, NukiError};
use crate::frame::{append_crc, verify_crc};
use crate::models::ErrorReport;
use crate::wire::Reader;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecryptedMessage {
    /// Authorization id from the plaintext header
    pub authorization_id: u32,
    /// Authorization id from inside the sealed body
    pub inner_authorization_id: u32,
    pub command: Command,
    pub payload: Vec<u8>,
}

impl DecryptedMessage {
    pub fn error_report(&self) -> Option<ErrorReport> {
        if self.command != Command::ErrorReport {
            return None;
        }
        ErrorReport::decode(&self.payload).ok()
    }
}

/// Seal one command under a fresh random nonce.
pub fn seal(
    key: &SharedKey,
    authorization_id: u32,
    command: Command,
    payload: &[u8],
) -> Result<Vec<u8>, NukiError> {
    seal_with_nonce(key, &random_bytes(), authorization_id, command, payload)
}

pub(crate) fn seal_with_nonce(
    key: &SharedKey,
    nonce: &[u8; NONCE_SIZE],
    authorization_id: u32,
    command: Command,
    payload: &[u8],
) -> Result<Vec<u8>, NukiError> {
    let mut body = Vec::with_capacity(payload.len() + 8);
    body.put_u32_le(authorization_id);
    body.put_u16_le(command.raw());
    body.put_slice(payload);
    append_crc(&mut body);

    let sealed = key.seal(nonce, &body)?;
    let length = u16::try_from(sealed.len())
        .map_err(|_| FrameError::malformed("encrypted body", usize::from(u16::MAX), sealed.len()))?;

    let mut out = Vec::with_capacity(ENCRYPTED_HEADER_SIZE + sealed.len());
    out.put_slice(nonce);
    out.put_u32_le(authorization_id);
    out.put_u16_le(length);
    out.put_slice(&sealed);
    Ok(out)
}

/// Open every frame in `data`, in arrival order.
pub fn open(key: &SharedKey, data: &[u8]) -> Result<Vec<DecryptedMessage>, NukiError> {
    let mut reader = Reader::new(data, "encrypted frame");
    let mut messages = Vec::new();

    while reader.remaining() > 0 {
        let nonce = reader.array::<NONCE_SIZE>()?;
        let authorization_id = reader.u32_le()?;
        let length = reader.u16_le()?;
        let sealed = reader.bytes(usize::from(length))?;

        let body = key.open(&nonce, sealed)?;
        messages.push(parse_body(authorization_id, &body)?);
    }

    Ok(messages)
}

fn parse_body(authorization_id: u32, body: &[u8]) -> Result<DecryptedMessage, FrameError> {
    if body.len() < 8 {
        return Err(FrameError::malformed("encrypted body", 8, body.len()));
    }
    let content = verify_crc(body, "encrypted body")?;
    let mut reader = Reader::new(content, "encrypted body");
    let inner_authorization_id = reader.u32_le()?;
    let command = Command::from_raw(reader.u16_le()?);
    Ok(DecryptedMessage {
        authorization_id,
        inner_authorization_id,
        command,
        payload: reader.rest().to_vec(),
    })
}
