//! [`BleAdapter`] on top of `btleplug`.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use btleplug::api::{Central, CentralEvent, Characteristic, Manager as _, Peripheral as _, ScanFilter, WriteType};
use btleplug::platform::{Adapter, Manager, Peripheral};
use futures::StreamExt;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, trace};
use uuid::Uuid;

use crate::adapter::{Advertisement, AdvertisementSink, BleAdapter, BleConnection, ServiceData};
use crate::error::BleError;

const NOTIFICATION_BUFFER: usize = 64;

fn backend(e: btleplug::Error) -> BleError {
    BleError::Backend(e.to_string())
}

pub struct BtleplugAdapter {
    adapter: Adapter,
}

impl BtleplugAdapter {
    /// Use the first adapter the platform reports.
    pub async fn first() -> Result<Self, BleError> {
        let manager = Manager::new().await.map_err(backend)?;
        let adapter = manager
            .adapters()
            .await
            .map_err(backend)?
            .into_iter()
            .next()
            .ok_or(BleError::NoAdapter)?;
        if let Ok(info) = adapter.adapter_info().await {
            info!(adapter = %info, "Using Bluetooth adapter");
        }
        Ok(Self { adapter })
    }

    async fn advertisement(&self, event: CentralEvent) -> Option<Advertisement> {
        let (id, service_data, manufacturer_data) = match event {
            CentralEvent::ManufacturerDataAdvertisement {
                id,
                manufacturer_data,
            } => {
                // Rebuild the raw field: company id (LE) followed by its data.
                let raw = manufacturer_data
                    .into_iter()
                    .next()
                    .map(|(company, data)| {
                        let mut raw = company.to_le_bytes().to_vec();
                        raw.extend_from_slice(&data);
                        raw
                    })
                    .unwrap_or_default();
                (id, Vec::new(), raw)
            }
            CentralEvent::ServiceDataAdvertisement { id, service_data } => {
                let service_data = service_data
                    .into_iter()
                    .map(|(uuid, data)| ServiceData { uuid, data })
                    .collect();
                (id, service_data, Vec::new())
            }
            _ => return None,
        };
        let peripheral = self.adapter.peripheral(&id).await.ok()?;
        Some(Advertisement {
            address: peripheral.address().to_string(),
            service_data,
            manufacturer_data,
        })
    }

    async fn find(&self, address: &str) -> Result<Peripheral, BleError> {
        let peripherals = self.adapter.peripherals().await.map_err(backend)?;
        peripherals
            .into_iter()
            .find(|p| p.address().to_string().eq_ignore_ascii_case(address))
            .ok_or_else(|| BleError::DeviceNotFound(address.to_string()))
    }
}

#[async_trait]
impl BleAdapter for BtleplugAdapter {
    async fn scan(
        &self,
        sink: AdvertisementSink,
        mut stop: oneshot::Receiver<()>,
    ) -> Result<(), BleError> {
        let mut events = self.adapter.events().await.map_err(backend)?;
        self.adapter
            .start_scan(ScanFilter::default())
            .await
            .map_err(backend)?;

        loop {
            tokio::select! {
                _ = &mut stop => break,
                event = events.next() => match event {
                    Some(event) => {
                        if let Some(advertisement) = self.advertisement(event).await {
                            sink.deliver(advertisement);
                        }
                    }
                    None => break,
                },
            }
        }

        self.adapter.stop_scan().await.map_err(backend)
    }

    async fn connect(&self, address: &str) -> Result<Box<dyn BleConnection>, BleError> {
        let peripheral = self.find(address).await?;
        peripheral.connect().await.map_err(backend)?;
        if let Err(e) = peripheral.discover_services().await {
            let _ = peripheral.disconnect().await;
            return Err(backend(e));
        }
        let mut notifications = match peripheral.notifications().await {
            Ok(stream) => stream,
            Err(e) => {
                let _ = peripheral.disconnect().await;
                return Err(backend(e));
            }
        };

        let routes: Arc<Mutex<HashMap<Uuid, mpsc::Sender<Vec<u8>>>>> = Arc::default();
        let router_routes = routes.clone();
        let router = tokio::spawn(async move {
            while let Some(notification) = notifications.next().await {
                let route = router_routes
                    .lock()
                    .ok()
                    .and_then(|routes| routes.get(&notification.uuid).cloned());
                match route {
                    Some(tx) => {
                        if tx.send(notification.value).await.is_err() {
                            trace!(uuid = %notification.uuid, "Notification receiver gone");
                        }
                    }
                    None => trace!(uuid = %notification.uuid, "Unrouted notification"),
                }
            }
        });

        debug!(lock = %address, "GATT connected");
        Ok(Box::new(BtleplugConnection {
            peripheral,
            routes,
            router,
        }))
    }
}

struct BtleplugConnection {
    peripheral: Peripheral,
    routes: Arc<Mutex<HashMap<Uuid, mpsc::Sender<Vec<u8>>>>>,
    router: JoinHandle<()>,
}

impl BtleplugConnection {
    fn characteristic(&self, uuid: Uuid) -> Result<Characteristic, BleError> {
        self.peripheral
            .characteristics()
            .into_iter()
            .find(|c| c.uuid == uuid)
            .ok_or(BleError::CharacteristicNotFound(uuid))
    }
}

#[async_trait]
impl BleConnection for BtleplugConnection {
    async fn subscribe(&mut self, characteristic: Uuid) -> Result<mpsc::Receiver<Vec<u8>>, BleError> {
        let target = self.characteristic(characteristic)?;
        let (tx, rx) = mpsc::channel(NOTIFICATION_BUFFER);
        if let Ok(mut routes) = self.routes.lock() {
            routes.insert(characteristic, tx);
        }
        self.peripheral.subscribe(&target).await.map_err(backend)?;
        Ok(rx)
    }

    async fn write(&mut self, characteristic: Uuid, data: &[u8]) -> Result<(), BleError> {
        let target = self.characteristic(characteristic)?;
        self.peripheral
            .write(&target, data, WriteType::WithResponse)
            .await
            .map_err(backend)
    }

    async fn disconnect(&mut self) -> Result<(), BleError> {
        self.router.abort();
        if let Ok(mut routes) = self.routes.lock() {
            routes.clear();
        }
        self.peripheral.disconnect().await.map_err(backend)
    }
}

impl Drop for BtleplugConnection {
    fn drop(&mut self) {
        self.router.abort();
    }
}
