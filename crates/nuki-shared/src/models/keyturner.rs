use bytes::BufMut;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::enums::{CompletionStatus, DoorSensorState, LockAction, LockState, NukiState, Trigger};
use crate::error::FrameError;
use crate::wire::{put_datetime, Reader};

/// Live status snapshot of the keyturner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyturnerState {
    pub nuki_state: NukiState,
    pub lock_state: LockState,
    pub trigger: Trigger,
    pub current_time: Option<NaiveDateTime>,
    /// Minutes east of UTC
    pub timezone_offset: i16,
    pub critical_battery: bool,
    pub config_update_count: u8,
    pub lockngo_timer: bool,
    pub last_lock_action: LockAction,
    pub last_lock_action_trigger: Trigger,
    pub last_lock_action_completion_status: CompletionStatus,
    pub door_sensor_state: DoorSensorState,
}

impl KeyturnerState {
    pub const SIZE: usize = 19;

    /// Newer firmware appends fields; anything past the known layout is ignored.
    pub fn decode(payload: &[u8]) -> Result<Self, FrameError> {
        let mut r = Reader::new(payload, "keyturner state");
        r.need(Self::SIZE)?;
        Ok(Self {
            nuki_state: r.u8()?.into(),
            lock_state: r.u8()?.into(),
            trigger: r.u8()?.into(),
            current_time: r.datetime()?,
            timezone_offset: r.i16_le()?,
            critical_battery: r.bool()?,
            config_update_count: r.u8()?,
            lockngo_timer: r.bool()?,
            last_lock_action: r.u8()?.into(),
            last_lock_action_trigger: r.u8()?.into(),
            last_lock_action_completion_status: r.u8()?.into(),
            door_sensor_state: r.u8()?.into(),
        })
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(Self::SIZE);
        buf.put_u8(self.nuki_state.raw());
        buf.put_u8(self.lock_state.raw());
        buf.put_u8(self.trigger.raw());
        match &self.current_time {
            Some(at) => put_datetime(&mut buf, at),
            None => buf.put_bytes(0, 7),
        }
        buf.put_i16_le(self.timezone_offset);
        buf.put_u8(u8::from(self.critical_battery));
        buf.put_u8(self.config_update_count);
        buf.put_u8(u8::from(self.lockngo_timer));
        buf.put_u8(self.last_lock_action.raw());
        buf.put_u8(self.last_lock_action_trigger.raw());
        buf.put_u8(self.last_lock_action_completion_status.raw());
        buf.put_u8(self.door_sensor_state.raw());
        buf
    }
}
