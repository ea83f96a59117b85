//! The seam between the bridge and a concrete Bluetooth stack.
//!
//! The bridge only needs two things from the radio: a stream of
//! advertisements while idle, and a connection on which it can write to a
//! characteristic and receive that characteristic's notifications as a
//! channel of byte chunks. GATT discovery and subscription plumbing stay
//! behind these traits.

use async_trait::async_trait;
use nuki_shared::constants::{NUKI_ADDRESS_PREFIX, PAIRING_SERVICE_UUID};
use tokio::sync::{mpsc, oneshot};
use tracing::trace;
use uuid::Uuid;

use crate::error::BleError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceData {
    pub uuid: Uuid,
    pub data: Vec<u8>,
}

/// One received broadcast.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Advertisement {
    /// `AA:BB:CC:DD:EE:FF`
    pub address: String,
    pub service_data: Vec<ServiceData>,
    /// Raw manufacturer data including the leading company id
    pub manufacturer_data: Vec<u8>,
}

impl Advertisement {
    pub fn is_nuki(&self) -> bool {
        self.address.to_uppercase().starts_with(NUKI_ADDRESS_PREFIX)
    }

    /// Locks in pairing mode advertise the pairing service as service data.
    pub fn is_pairing_candidate(&self) -> bool {
        self.service_data
            .iter()
            .any(|sd| sd.uuid == PAIRING_SERVICE_UUID)
    }
}

/// Where a scanner delivers advertisements.
///
/// Delivery never blocks the scanner: non-Nuki addresses are filtered out and
/// anything arriving while the monitor is still busy is dropped.
#[derive(Debug, Clone)]
pub struct AdvertisementSink {
    tx: mpsc::Sender<Advertisement>,
}

impl AdvertisementSink {
    pub fn new(tx: mpsc::Sender<Advertisement>) -> Self {
        Self { tx }
    }

    /// Returns whether the advertisement was queued.
    pub fn deliver(&self, advertisement: Advertisement) -> bool {
        if !advertisement.is_nuki() {
            return false;
        }
        match self.tx.try_send(advertisement) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(adv)) => {
                trace!(address = %adv.address, "Skipping advertisement, monitor busy");
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => false,
        }
    }
}

#[async_trait]
pub trait BleAdapter: Send + Sync + 'static {
    /// Passive scan until `stop` fires (or its sender is dropped). Must not
    /// return before the radio has actually stopped scanning.
    async fn scan(
        &self,
        sink: AdvertisementSink,
        stop: oneshot::Receiver<()>,
    ) -> Result<(), BleError>;

    /// Connect to `address` and discover its characteristics.
    async fn connect(&self, address: &str) -> Result<Box<dyn BleConnection>, BleError>;
}

#[async_trait]
pub trait BleConnection: Send {
    /// Enable notifications/indications on a characteristic. Every inbound
    /// notification payload arrives as one chunk on the returned channel.
    async fn subscribe(&mut self, characteristic: Uuid) -> Result<mpsc::Receiver<Vec<u8>>, BleError>;

    async fn write(&mut self, characteristic: Uuid, data: &[u8]) -> Result<(), BleError>;

    async fn disconnect(&mut self) -> Result<(), BleError>;
}
