//! Exclusive ownership of the radio.
//!
//! Scanning is the idle holder of the radio. Anything that wants to connect
//! calls [`RadioArbiter::acquire`], which waits for the token, stops the
//! background scan and waits until it has fully stopped. Dropping the returned
//! [`RadioGuard`] restarts the scan and hands the token on, on every path out
//! of the critical section including errors and panics.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{oneshot, Mutex, OwnedMutexGuard};
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

use crate::adapter::{AdvertisementSink, BleAdapter};

struct ScanHandle {
    stop: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

impl ScanHandle {
    async fn stop(self) {
        let _ = self.stop.send(());
        if let Err(e) = self.task.await {
            warn!(error = %e, "Scan task ended abnormally");
        }
        debug!("Scan stopped");
    }
}

#[derive(Default)]
struct ScanSlot {
    scan: Option<ScanHandle>,
    shut_down: bool,
}

#[derive(Clone)]
struct ScanStarter {
    adapter: Arc<dyn BleAdapter>,
    sink: AdvertisementSink,
    retry: Duration,
}

impl ScanStarter {
    /// Keeps a scan running until stopped. A scan that fails or ends on its own
    /// is started again after `retry`.
    fn spawn(&self) -> ScanHandle {
        let (stop, mut stop_rx) = oneshot::channel();
        let starter = self.clone();
        let task = tokio::spawn(async move {
            loop {
                let (scan_stop, scan_stop_rx) = oneshot::channel();
                let scan = starter.adapter.scan(starter.sink.clone(), scan_stop_rx);
                tokio::pin!(scan);
                debug!("Scan started");

                let result = tokio::select! {
                    result = &mut scan => result,
                    _ = &mut stop_rx => {
                        let _ = scan_stop.send(());
                        if let Err(e) = scan.await {
                            warn!(error = %e, "Scan failed while stopping");
                        }
                        return;
                    }
                };
                match result {
                    Ok(()) => debug!("Scan ended unexpectedly"),
                    Err(e) => error!(
                        error = %e,
                        retry_secs = starter.retry.as_secs_f32(),
                        "Scan failed, no advertisements until it restarts"
                    ),
                }

                tokio::select! {
                    _ = tokio::time::sleep(starter.retry) => {}
                    _ = &mut stop_rx => return,
                }
            }
        });
        ScanHandle { stop, task }
    }
}

pub struct RadioArbiter {
    slot: Arc<Mutex<ScanSlot>>,
    starter: ScanStarter,
    settle: Duration,
}

impl RadioArbiter {
    /// `settle` is slept after the scan stopped, before the caller may connect.
    /// `retry` is the pause before a failed scan is started again.
    pub fn new(
        adapter: Arc<dyn BleAdapter>,
        sink: AdvertisementSink,
        settle: Duration,
        retry: Duration,
    ) -> Self {
        Self {
            slot: Arc::new(Mutex::new(ScanSlot::default())),
            starter: ScanStarter {
                adapter,
                sink,
                retry,
            },
            settle,
        }
    }

    /// Begin background scanning. No-op if already scanning.
    pub async fn start(&self) {
        let mut slot = self.slot.lock().await;
        if !slot.shut_down && slot.scan.is_none() {
            slot.scan = Some(self.starter.spawn());
        }
    }

    pub async fn acquire(&self) -> RadioGuard {
        let mut slot = self.slot.clone().lock_owned().await;
        if let Some(scan) = slot.scan.take() {
            scan.stop().await;
        }
        if !self.settle.is_zero() {
            tokio::time::sleep(self.settle).await;
        }
        RadioGuard {
            slot: Some(slot),
            starter: self.starter.clone(),
        }
    }

    /// Stop scanning for good. Later guards release without restarting it.
    pub async fn shutdown(&self) {
        let mut slot = self.slot.lock().await;
        slot.shut_down = true;
        if let Some(scan) = slot.scan.take() {
            scan.stop().await;
        }
    }
}

/// Held while a connection or command sequence is in flight.
pub struct RadioGuard {
    slot: Option<OwnedMutexGuard<ScanSlot>>,
    starter: ScanStarter,
}

impl Drop for RadioGuard {
    fn drop(&mut self) {
        if let Some(mut slot) = self.slot.take() {
            if !slot.shut_down {
                slot.scan = Some(self.starter.spawn());
            }
        }
    }
}
