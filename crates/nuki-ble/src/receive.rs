//! Reassembly of MTU-sized notification chunks into one logical message.
//!
//! A message is over once the characteristic has been silent for a whole
//! receive window. Every chunk restarts the window.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::timeout;

use crate::error::{BleError, SessionError};

pub async fn receive(
    rx: &mut mpsc::Receiver<Vec<u8>>,
    window: Duration,
) -> Result<Vec<u8>, SessionError> {
    receive_within(rx, window, window).await
}

/// Like [`receive`], but waits up to `first_chunk` for the transfer to start.
pub async fn receive_within(
    rx: &mut mpsc::Receiver<Vec<u8>>,
    first_chunk: Duration,
    window: Duration,
) -> Result<Vec<u8>, SessionError> {
    let mut message = Vec::new();
    loop {
        let wait = if message.is_empty() { first_chunk } else { window };
        match timeout(wait, rx.recv()).await {
            Ok(Some(chunk)) => message.extend_from_slice(&chunk),
            Ok(None) if message.is_empty() => {
                return Err(SessionError::Connection(BleError::Disconnected))
            }
            Ok(None) => return Ok(message),
            Err(_) if message.is_empty() => return Err(SessionError::Timeout),
            Err(_) => return Ok(message),
        }
    }
}

/// Drop chunks left over from an earlier exchange.
pub fn discard_pending(rx: &mut mpsc::Receiver<Vec<u8>>) -> usize {
    let mut dropped = 0;
    while rx.try_recv().is_ok() {
        dropped += 1;
    }
    dropped
}
