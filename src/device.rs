//! Device session adapter.
//!
//! Wraps discovery/connect/disconnect on the SDK's device manager and mirrors
//! its callbacks into host events. A successful connect is reported only
//! after extended device info (including a firmware-update probe) has been
//! gathered, as a single `onDeviceConnected` event.

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tokio::runtime::Handle;
use tracing::{info, warn};

use crate::callbacks::DeviceCallback;
use crate::errors::{ErrorFormatter, MSG_DEVICE_NOT_FOUND};
use crate::events::{BridgeEvent, EventEmitter};
use crate::sdk::{Device, DeviceManager, FirmwareManager};

/// Body of `onDeviceConnected`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectedDeviceInfo {
    pub name: String,
    pub is_charging: bool,
    pub model: String,
    pub serial_number: String,
    #[serde(rename = "type")]
    pub device_type: &'static str,
    pub battery_capacity: u8,
    pub update_available: bool,
    /// Seconds since the Unix epoch; `0` when the update has no deadline.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required_date: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requires_bluetooth_connection: Option<bool>,
}

impl ConnectedDeviceInfo {
    fn from_device(device: &Device) -> Self {
        Self {
            name: device.name.clone().unwrap_or_default(),
            is_charging: device.is_charging,
            model: device.model.clone().unwrap_or_default(),
            serial_number: device.serial_number.clone(),
            device_type: device.device_type.as_str(),
            battery_capacity: device.battery_capacity,
            update_available: false,
            required_date: None,
            requires_bluetooth_connection: None,
        }
    }
}

#[derive(Clone)]
pub struct DeviceSession {
    devices: Arc<dyn DeviceManager>,
    firmware: Arc<dyn FirmwareManager>,
    emitter: EventEmitter,
    errors: ErrorFormatter,
    runtime: Handle,
}

impl DeviceSession {
    pub fn new(
        devices: Arc<dyn DeviceManager>,
        firmware: Arc<dyn FirmwareManager>,
        emitter: EventEmitter,
        errors: ErrorFormatter,
        runtime: Handle,
    ) -> Self {
        Self {
            devices,
            firmware,
            emitter,
            errors,
            runtime,
        }
    }

    pub fn start_discovery(&self) {
        info!("Starting device discovery");
        self.devices.start_discovery();
    }

    pub fn stop_discovery(&self) {
        info!("Stopping device discovery");
        self.devices.stop_discovery();
    }

    /// Connect to a previously discovered device. Unknown serial numbers are
    /// reported as `onDeviceConnectFailure` without touching the SDK.
    pub fn connect(&self, serial_number: &str) {
        let device = self
            .devices
            .discovered_devices()
            .into_iter()
            .find(|d| !serial_number.is_empty() && d.serial_number == serial_number);

        let Some(device) = device else {
            warn!(serial_number = %serial_number, "Connect requested for unknown device");
            self.emitter.emit(
                BridgeEvent::DeviceConnectFailure,
                self.errors.local(MSG_DEVICE_NOT_FOUND).to_payload(),
            );
            return;
        };

        info!(serial_number = %serial_number, "Connecting to device");
        self.devices.connect(&device);
    }

    pub fn disconnect(&self) {
        info!("Disconnecting device");
        self.devices.disconnect();
    }

    /// Translate one device-manager callback into its host event.
    pub fn handle(&self, callback: DeviceCallback) {
        match callback {
            DeviceCallback::Discovered(device) => {
                info!(
                    serial_number = %device.serial_number,
                    device_type = device.device_type.as_str(),
                    "Device discovered"
                );
                self.emitter.emit(
                    BridgeEvent::DeviceDiscovered,
                    serde_json::json!({
                        "serialNumber": device.serial_number,
                        "type": device.device_type.as_str(),
                    }),
                );
            }
            DeviceCallback::DiscoveryFailed(error) => {
                warn!(error = %error, "Device discovery failed");
                self.emitter
                    .emit(BridgeEvent::DeviceDiscoveryFailed, serde_json::json!({}));
            }
            DeviceCallback::Connected(Err(error)) => {
                warn!(error = %error, "Device connect failed");
                self.emitter.emit(
                    BridgeEvent::DeviceConnectFailure,
                    self.errors.sdk(&error).to_payload(),
                );
            }
            DeviceCallback::Connected(Ok(())) => {
                let session = self.clone();
                self.runtime.spawn(async move {
                    let info = session.connected_device_info().await;
                    session.emitter.emit(BridgeEvent::DeviceConnected, info);
                });
            }
            DeviceCallback::Disconnected => {
                info!("Device disconnected");
                self.emitter
                    .emit(BridgeEvent::DeviceDisconnected, serde_json::json!({}));
            }
        }
    }

    /// Gather the connected device's details plus firmware-update status.
    ///
    /// A failed probe marks `updateAvailable: false`; it never suppresses the
    /// connected event.
    pub async fn connected_device_info(&self) -> Value {
        let Some(device) = self.devices.connected_device() else {
            warn!("SDK reported a connection but has no connected device");
            return serde_json::json!({});
        };

        let mut info = ConnectedDeviceInfo::from_device(&device);
        match self.firmware.firmware_update_summary().await {
            Ok(Some(summary)) => {
                info.update_available = true;
                info.required_date = Some(
                    summary
                        .required_date
                        .map(|d| d.timestamp_millis() as f64 / 1000.0)
                        .unwrap_or(0.0),
                );
                info.requires_bluetooth_connection = Some(summary.requires_bluetooth_connection);
            }
            Ok(None) => {}
            Err(e) => {
                warn!(error = %e, "Firmware update probe failed");
            }
        }

        info!(
            serial_number = %info.serial_number,
            update_available = info.update_available,
            "Device connected"
        );
        serde_json::to_value(&info).unwrap_or_else(|_| serde_json::json!({}))
    }
}
