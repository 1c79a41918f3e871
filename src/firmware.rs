//! Firmware session adapter.

use std::sync::Arc;

use tokio::runtime::Handle;
use tracing::{debug, info, warn};

use crate::callbacks::FirmwareCallback;
use crate::errors::ErrorFormatter;
use crate::events::{BridgeEvent, EventEmitter};
use crate::sdk::FirmwareManager;

#[derive(Clone)]
pub struct FirmwareSession {
    firmware: Arc<dyn FirmwareManager>,
    emitter: EventEmitter,
    errors: ErrorFormatter,
    runtime: Handle,
}

impl FirmwareSession {
    pub fn new(
        firmware: Arc<dyn FirmwareManager>,
        emitter: EventEmitter,
        errors: ErrorFormatter,
        runtime: Handle,
    ) -> Self {
        Self {
            firmware,
            emitter,
            errors,
            runtime,
        }
    }

    /// Start an update on the connected device. Only a rejected start is
    /// reported from here; progress and completion come back as callbacks.
    pub fn start_firmware_update(&self) {
        let session = self.clone();
        self.runtime.spawn(async move {
            info!("Starting firmware update");
            if let Err(e) = session.firmware.start_firmware_update().await {
                warn!(error = %e, "Firmware update could not be started");
                session.emitter.emit(
                    BridgeEvent::FirmwareUpdateFailure,
                    session.errors.sdk(&e).to_payload(),
                );
            }
        });
    }

    pub fn handle(&self, callback: FirmwareCallback) {
        match callback {
            FirmwareCallback::ApplyingUpdate => {
                info!("Applying firmware update");
                self.emitter
                    .emit(BridgeEvent::ApplyingFirmwareUpdate, serde_json::json!({}));
            }
            FirmwareCallback::UpdateProgress(percent) => {
                debug!(percent, "Firmware update progress");
                self.emitter.emit(
                    BridgeEvent::FirmwareUpdateProgress,
                    serde_json::json!({ "percent": percent }),
                );
            }
            FirmwareCallback::DownloadProgress(percent) => {
                debug!(percent, "Firmware download progress");
                self.emitter.emit(
                    BridgeEvent::FirmwareDownloadProgress,
                    serde_json::json!({ "percent": percent }),
                );
            }
            FirmwareCallback::UpdateComplete => {
                info!("Firmware update complete");
                self.emitter
                    .emit(BridgeEvent::FirmwareUpdateComplete, serde_json::json!({}));
            }
            FirmwareCallback::UpdateFailure(error) => {
                warn!(error = %error, "Firmware update failed");
                self.emitter.emit(
                    BridgeEvent::FirmwareUpdateFailure,
                    self.errors.sdk(&error).to_payload(),
                );
            }
        }
    }
}
