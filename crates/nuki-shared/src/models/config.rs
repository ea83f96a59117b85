use bytes::BufMut;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::constants::NAME_SIZE;
use crate::error::FrameError;
use crate::wire::{pad_name, put_datetime, Reader};

/// Lock configuration as returned by `RequestConfig`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    pub nuki_id: u32,
    pub name: String,
    pub latitude: f32,
    pub longitude: f32,
    pub auto_unlatch: bool,
    pub pairing_enabled: bool,
    pub button_enabled: bool,
    pub led_enabled: bool,
    pub led_brightness: u8,
    pub current_time: Option<NaiveDateTime>,
    /// Minutes east of UTC
    pub timezone_offset: i16,
    pub dst_mode: bool,
    pub has_fob: bool,
    pub fob_action_1: u8,
    pub fob_action_2: u8,
    pub fob_action_3: u8,
    pub single_lock: bool,
    pub advertising_mode: u8,
    pub has_keypad: bool,
    pub firmware_version: String,
    pub hardware_revision: String,
    pub homekit_status: u8,
    pub timezone_id: u16,
}

impl Config {
    pub const SIZE: usize = 74;

    pub fn decode(payload: &[u8]) -> Result<Self, FrameError> {
        let mut r = Reader::new(payload, "config");
        r.need(Self::SIZE)?;
        Ok(Self {
            nuki_id: r.u32_le()?,
            name: r.name::<NAME_SIZE>()?,
            latitude: r.f32_le()?,
            longitude: r.f32_le()?,
            auto_unlatch: r.bool()?,
            pairing_enabled: r.bool()?,
            button_enabled: r.bool()?,
            led_enabled: r.bool()?,
            led_brightness: r.u8()?,
            current_time: r.datetime()?,
            timezone_offset: r.i16_le()?,
            dst_mode: r.bool()?,
            has_fob: r.bool()?,
            fob_action_1: r.u8()?,
            fob_action_2: r.u8()?,
            fob_action_3: r.u8()?,
            single_lock: r.bool()?,
            advertising_mode: r.u8()?,
            has_keypad: r.bool()?,
            firmware_version: {
                let [major, minor, patch] = r.array::<3>()?;
                format!("{major}.{minor}.{patch}")
            },
            hardware_revision: {
                let [major, minor] = r.array::<2>()?;
                format!("{major}.{minor}")
            },
            homekit_status: r.u8()?,
            timezone_id: r.u16_le()?,
        })
    }

    /// Wire form, as a lock would send it. Version strings that do not parse
    /// encode as zeros.
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(Self::SIZE);
        buf.put_u32_le(self.nuki_id);
        buf.put_slice(&pad_name::<NAME_SIZE>(&self.name));
        buf.put_f32_le(self.latitude);
        buf.put_f32_le(self.longitude);
        for flag in [
            self.auto_unlatch,
            self.pairing_enabled,
            self.button_enabled,
            self.led_enabled,
        ] {
            buf.put_u8(u8::from(flag));
        }
        buf.put_u8(self.led_brightness);
        match &self.current_time {
            Some(at) => put_datetime(&mut buf, at),
            None => buf.put_bytes(0, 7),
        }
        buf.put_i16_le(self.timezone_offset);
        buf.put_u8(u8::from(self.dst_mode));
        buf.put_u8(u8::from(self.has_fob));
        buf.put_u8(self.fob_action_1);
        buf.put_u8(self.fob_action_2);
        buf.put_u8(self.fob_action_3);
        buf.put_u8(u8::from(self.single_lock));
        buf.put_u8(self.advertising_mode);
        buf.put_u8(u8::from(self.has_keypad));
        buf.put_slice(&version_bytes::<3>(&self.firmware_version));
        buf.put_slice(&version_bytes::<2>(&self.hardware_revision));
        buf.put_u8(self.homekit_status);
        buf.put_u16_le(self.timezone_id);
        buf
    }
}

fn version_bytes<const N: usize>(version: &str) -> [u8; N] {
    let mut out = [0u8; N];
    for (slot, part) in out.iter_mut().zip(version.split('.')) {
        *slot = part.parse().unwrap_or(0);
    }
    out
}
