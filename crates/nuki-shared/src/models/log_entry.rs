use bytes::BufMut;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::constants::NAME_SIZE;
use crate::enums::{CompletionStatus, DoorSensorEvent, KeypadActionSource, LockAction, LogType, Trigger};
use crate::error::FrameError;
use crate::wire::{pad_name, put_datetime, Reader};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    pub index: u32,
    pub timestamp: Option<NaiveDateTime>,
    pub auth_id: u32,
    pub name: String,
    pub log_type: LogType,
    pub details: LogEntryDetails,
}

/// Type-specific tail of a log entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum LogEntryDetails {
    /// Logging switched on/off, or door sensor logging switched on/off
    Logging { on: bool },
    /// Lock action, calibration or initialization run
    #[serde(rename_all = "camelCase")]
    LockActionRecord {
        action: LockAction,
        trigger: Trigger,
        flags: u8,
        status: CompletionStatus,
    },
    #[serde(rename_all = "camelCase")]
    KeypadAction {
        action: LockAction,
        source: KeypadActionSource,
        status: CompletionStatus,
        code_id: u16,
    },
    DoorSensor { state: DoorSensorEvent },
    /// Entry type this bridge cannot interpret; the tail is kept verbatim
    Unknown { raw: Vec<u8> },
}

impl LogEntry {
    pub const HEADER_SIZE: usize = 4 + 7 + 4 + NAME_SIZE + 1;

    pub fn decode(payload: &[u8]) -> Result<Self, FrameError> {
        let mut r = Reader::new(payload, "log entry");
        r.need(Self::HEADER_SIZE)?;
        let index = r.u32_le()?;
        let timestamp = r.datetime()?;
        let auth_id = r.u32_le()?;
        let name = r.name::<NAME_SIZE>()?;
        let log_type = LogType::from_raw(r.u8()?);

        let details = match log_type {
            LogType::Logging | LogType::DoorSensorLogging => LogEntryDetails::Logging { on: r.bool()? },
            LogType::LockAction | LogType::Calibration | LogType::InitializationRun => {
                LogEntryDetails::LockActionRecord {
                    action: r.u8()?.into(),
                    trigger: r.u8()?.into(),
                    flags: r.u8()?,
                    status: r.u8()?.into(),
                }
            }
            LogType::KeypadAction => LogEntryDetails::KeypadAction {
                action: r.u8()?.into(),
                source: r.u8()?.into(),
                status: r.u8()?.into(),
                code_id: r.u16_le()?,
            },
            LogType::DoorSensor => LogEntryDetails::DoorSensor {
                state: r.u8()?.into(),
            },
            LogType::Other(_) => LogEntryDetails::Unknown {
                raw: r.rest().to_vec(),
            },
        };

        Ok(Self {
            index,
            timestamp,
            auth_id,
            name,
            log_type,
            details,
        })
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(Self::HEADER_SIZE + 5);
        buf.put_u32_le(self.index);
        match &self.timestamp {
            Some(at) => put_datetime(&mut buf, at),
            None => buf.put_bytes(0, 7),
        }
        buf.put_u32_le(self.auth_id);
        buf.put_slice(&pad_name::<NAME_SIZE>(&self.name));
        buf.put_u8(self.log_type.raw());
        match &self.details {
            LogEntryDetails::Logging { on } => buf.put_u8(u8::from(*on)),
            LogEntryDetails::LockActionRecord {
                action,
                trigger,
                flags,
                status,
            } => {
                buf.put_u8(action.raw());
                buf.put_u8(trigger.raw());
                buf.put_u8(*flags);
                buf.put_u8(status.raw());
            }
            LogEntryDetails::KeypadAction {
                action,
                source,
                status,
                code_id,
            } => {
                buf.put_u8(action.raw());
                buf.put_u8(source.raw());
                buf.put_u8(status.raw());
                buf.put_u16_le(*code_id);
            }
            LogEntryDetails::DoorSensor { state } => buf.put_u8(state.raw()),
            LogEntryDetails::Unknown { raw } => buf.put_slice(raw),
        }
        buf
    }
}
