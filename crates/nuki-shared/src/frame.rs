use bytes::BufMut;
use crc::{Crc, CRC_16_IBM_3740};

use crate::constants::FRAME_OVERHEAD;
use crate::enums::Command;
use crate::error::FrameError;
use crate::models::ErrorReport;

/// CRC-16/CCITT-FALSE (poly 0x1021, init 0xFFFF, no reflection).
const CCITT_FALSE: Crc<u16> = Crc::<u16>::new(&CRC_16_IBM_3740);

pub fn crc16(data: &[u8]) -> u16 {
    CCITT_FALSE.checksum(data)
}

/// Append the little-endian CRC of everything already in `buf`.
pub(crate) fn append_crc(buf: &mut Vec<u8>) {
    let crc = crc16(buf);
    buf.put_u16_le(crc);
}

/// Split `data` into body and trailing CRC, failing if they disagree.
pub(crate) fn verify_crc<'a>(data: &'a [u8], context: &'static str) -> Result<&'a [u8], FrameError> {
    if data.len() < 2 {
        return Err(FrameError::malformed(context, 2, data.len()));
    }
    let (body, trailer) = data.split_at(data.len() - 2);
    let received = u16::from_le_bytes([trailer[0], trailer[1]]);
    let computed = crc16(body);
    if received != computed {
        return Err(FrameError::CorruptFrame { computed, received });
    }
    Ok(body)
}

/// Unencrypted command frame: `command (LE16) | payload | CRC16 (LE)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub command: Command,
    pub payload: Vec<u8>,
}

impl Frame {
    pub fn new(command: Command, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            command,
            payload: payload.into(),
        }
    }

    /// `RequestData` asking the lock to send `wanted`.
    pub fn request_data(wanted: Command) -> Self {
        Self::new(Command::RequestData, wanted.raw().to_le_bytes())
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.payload.len() + FRAME_OVERHEAD);
        buf.put_u16_le(self.command.raw());
        buf.put_slice(&self.payload);
        append_crc(&mut buf);
        buf
    }

    pub fn decode(data: &[u8]) -> Result<Self, FrameError> {
        if data.len() < FRAME_OVERHEAD {
            return Err(FrameError::malformed("frame", FRAME_OVERHEAD, data.len()));
        }
        let body = verify_crc(data, "frame")?;
        let command = Command::from_raw(u16::from_le_bytes([body[0], body[1]]));
        Ok(Self {
            command,
            payload: body[2..].to_vec(),
        })
    }

    /// The error report carried by this frame, if it is one.
    pub fn error_report(&self) -> Option<ErrorReport> {
        if self.command != Command::ErrorReport {
            return None;
        }
        ErrorReport::decode(&self.payload).ok()
    }
}
