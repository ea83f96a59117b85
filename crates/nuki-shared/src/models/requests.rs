use bytes::BufMut;

use crate::constants::{CHALLENGE_SIZE, NAME_SUFFIX_SIZE};
use crate::enums::{LockAction, SortOrder};
use crate::error::FrameError;
use crate::wire::{pad_name, trim_name, Reader};

/// Payload of `RequestConfig`: just the challenge nonce.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigRequest {
    pub nonce: [u8; CHALLENGE_SIZE],
}

impl ConfigRequest {
    pub fn encode(&self) -> Vec<u8> {
        self.nonce.to_vec()
    }

    pub fn decode(payload: &[u8]) -> Result<Self, FrameError> {
        let mut r = Reader::new(payload, "config request");
        Ok(Self {
            nonce: r.array()?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockActionRequest {
    pub action: LockAction,
    pub app_id: u32,
    pub flags: u8,
    /// Shown in the lock's log after the bridge name; truncated to 20 bytes
    pub name_suffix: String,
    pub nonce: [u8; CHALLENGE_SIZE],
}

impl LockActionRequest {
    pub const SIZE: usize = 1 + 4 + 1 + NAME_SUFFIX_SIZE + CHALLENGE_SIZE;

    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(Self::SIZE);
        buf.put_u8(self.action.raw());
        buf.put_u32_le(self.app_id);
        buf.put_u8(self.flags);
        buf.put_slice(&pad_name::<NAME_SUFFIX_SIZE>(&self.name_suffix));
        buf.put_slice(&self.nonce);
        buf
    }

    pub fn decode(payload: &[u8]) -> Result<Self, FrameError> {
        let mut r = Reader::new(payload, "lock action request");
        r.need(Self::SIZE)?;
        Ok(Self {
            action: r.u8()?.into(),
            app_id: r.u32_le()?,
            flags: r.u8()?,
            name_suffix: trim_name(&r.array::<NAME_SUFFIX_SIZE>()?),
            nonce: r.array()?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntriesRequest {
    pub start_index: u32,
    pub count: u16,
    pub sort_order: SortOrder,
    /// Ask the lock to prepend its total entry count
    pub total_count: bool,
    pub nonce: [u8; CHALLENGE_SIZE],
    pub pin: u16,
}

impl LogEntriesRequest {
    pub const SIZE: usize = 4 + 2 + 1 + 1 + CHALLENGE_SIZE + 2;

    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(Self::SIZE);
        buf.put_u32_le(self.start_index);
        buf.put_u16_le(self.count);
        buf.put_u8(self.sort_order.raw());
        buf.put_u8(u8::from(self.total_count));
        buf.put_slice(&self.nonce);
        buf.put_u16_le(self.pin);
        buf
    }

    pub fn decode(payload: &[u8]) -> Result<Self, FrameError> {
        let mut r = Reader::new(payload, "log entries request");
        r.need(Self::SIZE)?;
        Ok(Self {
            start_index: r.u32_le()?,
            count: r.u16_le()?,
            sort_order: r.u8()?.into(),
            total_count: r.bool()?,
            nonce: r.array()?,
            pin: r.u16_le()?,
        })
    }
}
