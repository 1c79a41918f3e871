//! Outbound events and the emitter facade.
//!
//! Every adapter notifies the host through [`EventEmitter`]; it is the only
//! point of contact with the host's event delivery. Delivery is ordered per
//! sink, but events emitted concurrently by different adapters have no
//! relative order.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use tauri::{AppHandle, Emitter, Runtime};
use tokio::sync::mpsc;
use tracing::{debug, warn};

// ---------------------------------------------------------------------------
// Event names
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BridgeEvent {
    FetchSdkData,
    DeviceDiscovered,
    DeviceDiscoveryFailed,
    DeviceConnected,
    DeviceConnectFailure,
    DeviceDisconnected,
    ApplyingFirmwareUpdate,
    FirmwareUpdateProgress,
    FirmwareDownloadProgress,
    FirmwareUpdateComplete,
    FirmwareUpdateFailure,
    PayFinished,
}

impl BridgeEvent {
    pub const ALL: [BridgeEvent; 12] = [
        BridgeEvent::FetchSdkData,
        BridgeEvent::DeviceDiscovered,
        BridgeEvent::DeviceDiscoveryFailed,
        BridgeEvent::DeviceConnected,
        BridgeEvent::DeviceConnectFailure,
        BridgeEvent::DeviceDisconnected,
        BridgeEvent::ApplyingFirmwareUpdate,
        BridgeEvent::FirmwareUpdateProgress,
        BridgeEvent::FirmwareDownloadProgress,
        BridgeEvent::FirmwareUpdateComplete,
        BridgeEvent::FirmwareUpdateFailure,
        BridgeEvent::PayFinished,
    ];

    /// Wire name the host listens on.
    pub fn as_str(self) -> &'static str {
        match self {
            BridgeEvent::FetchSdkData => "onPayFetchSdkData",
            BridgeEvent::DeviceDiscovered => "onDeviceDiscovered",
            BridgeEvent::DeviceDiscoveryFailed => "onDeviceDiscoveryFailed",
            BridgeEvent::DeviceConnected => "onDeviceConnected",
            BridgeEvent::DeviceConnectFailure => "onDeviceConnectFailure",
            BridgeEvent::DeviceDisconnected => "onDeviceDisconnected",
            BridgeEvent::ApplyingFirmwareUpdate => "onApplyingFirmwareUpdate",
            BridgeEvent::FirmwareUpdateProgress => "onFirmwareUpdateProgress",
            BridgeEvent::FirmwareDownloadProgress => "onFirmwareDownloadProgress",
            BridgeEvent::FirmwareUpdateComplete => "onFirmwareUpdateComplete",
            BridgeEvent::FirmwareUpdateFailure => "onFirmwareUpdateFailure",
            BridgeEvent::PayFinished => "onPayFinished",
        }
    }
}

impl fmt::Display for BridgeEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// All event names a host should subscribe to.
pub fn supported_events() -> Vec<&'static str> {
    BridgeEvent::ALL.iter().map(|e| e.as_str()).collect()
}

// ---------------------------------------------------------------------------
// Sinks
// ---------------------------------------------------------------------------

/// Host event delivery mechanism.
pub trait EventSink: Send + Sync {
    fn deliver(&self, name: &str, payload: Value) -> Result<(), String>;
}

/// Delivers events to the Tauri frontend via `AppHandle::emit`.
pub struct TauriEventSink<R: Runtime> {
    app: AppHandle<R>,
}

impl<R: Runtime> TauriEventSink<R> {
    pub fn new(app: AppHandle<R>) -> Self {
        Self { app }
    }
}

impl<R: Runtime> EventSink for TauriEventSink<R> {
    fn deliver(&self, name: &str, payload: Value) -> Result<(), String> {
        self.app.emit(name, payload).map_err(|e| e.to_string())
    }
}

/// An event as it left the bridge.
#[derive(Debug, Clone, PartialEq)]
pub struct EmittedEvent {
    pub name: String,
    pub payload: Value,
}

/// Forwards events into an unbounded channel, for hosts that consume them
/// from their own task.
#[derive(Clone)]
pub struct ChannelEventSink {
    tx: mpsc::UnboundedSender<EmittedEvent>,
}

impl ChannelEventSink {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<EmittedEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl EventSink for ChannelEventSink {
    fn deliver(&self, name: &str, payload: Value) -> Result<(), String> {
        self.tx
            .send(EmittedEvent {
                name: name.to_string(),
                payload,
            })
            .map_err(|_| "event receiver dropped".to_string())
    }
}

// ---------------------------------------------------------------------------
// Emitter facade
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct EventEmitter {
    sink: Arc<dyn EventSink>,
}

impl EventEmitter {
    pub fn new(sink: Arc<dyn EventSink>) -> Self {
        Self { sink }
    }

    /// Fire-and-forget: a delivery failure is logged, never returned.
    pub fn emit(&self, event: BridgeEvent, payload: Value) {
        debug!(event = %event, payload = %payload, "Emitting bridge event");
        if let Err(e) = self.sink.deliver(event.as_str(), payload) {
            warn!(event = %event, error = %e, "Failed to deliver bridge event");
        }
    }
}
