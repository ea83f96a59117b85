use serde::{Deserialize, Serialize};

use crate::enums::{Command, ErrorCode};
use crate::error::FrameError;
use crate::wire::Reader;

/// `ErrorReport` payload: what went wrong and for which command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorReport {
    pub code: ErrorCode,
    pub command: Command,
}

impl ErrorReport {
    pub fn decode(payload: &[u8]) -> Result<Self, FrameError> {
        let mut r = Reader::new(payload, "error report");
        Ok(Self {
            code: r.u8()?.into(),
            command: r.u16_le()?.into(),
        })
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut buf = vec![self.code.raw()];
        buf.extend_from_slice(&self.command.raw().to_le_bytes());
        buf
    }
}

impl std::fmt::Display for ErrorReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} on {}", self.code, self.command)
    }
}
