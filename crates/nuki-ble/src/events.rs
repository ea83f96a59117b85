use nuki_shared::models::KeyturnerState;
use serde::Serialize;
use tokio::sync::broadcast;
use tracing::{error, trace};

pub const EVENT_STATE: &str = "state";
pub const EVENT_PAIRED: &str = "paired";

/// Device type code for a Smart Lock in callback objects.
pub const DEVICE_TYPE_SMARTLOCK: u8 = 2;

/// Webhook payload describing a lock's current state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CallbackObject {
    pub device_type: u8,
    pub battery_critical: bool,
    pub mode: u8,
    pub nuki_id: u32,
    pub state: u8,
    pub state_name: String,
}

impl CallbackObject {
    pub fn new(nuki_id: u32, state: &KeyturnerState) -> Self {
        Self {
            device_type: DEVICE_TYPE_SMARTLOCK,
            battery_critical: state.critical_battery,
            mode: state.nuki_state.raw(),
            nuki_id,
            state: state.lock_state.raw(),
            state_name: state.lock_state.name().to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PushEvent {
    pub name: String,
    pub payload: serde_json::Value,
}

/// Where the bridge announces state changes.
pub trait EventPublisher: Send + Sync {
    fn publish_callback(&self, callback: CallbackObject);
    fn publish_event(&self, event: PushEvent);
}

/// Serialize `payload` and publish it under `name`.
pub fn emit_event<S: Serialize>(publisher: &dyn EventPublisher, name: &str, payload: S) {
    match serde_json::to_value(payload) {
        Ok(payload) => publisher.publish_event(PushEvent {
            name: name.to_string(),
            payload,
        }),
        Err(e) => error!(event = name, error = %e, "Failed to serialize event"),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum BridgeEvent {
    Callback(CallbackObject),
    Push(PushEvent),
}

/// Fans events out to any number of in-process subscribers.
#[derive(Clone)]
pub struct BroadcastPublisher {
    tx: broadcast::Sender<BridgeEvent>,
}

impl BroadcastPublisher {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<BridgeEvent> {
        self.tx.subscribe()
    }

    fn send(&self, event: BridgeEvent) {
        if self.tx.send(event).is_err() {
            trace!("No event subscribers");
        }
    }
}

impl EventPublisher for BroadcastPublisher {
    fn publish_callback(&self, callback: CallbackObject) {
        self.send(BridgeEvent::Callback(callback));
    }

    fn publish_event(&self, event: PushEvent) {
        self.send(BridgeEvent::Push(event));
    }
}
