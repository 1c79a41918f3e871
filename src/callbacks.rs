//! Callback categories the SDK dispatches into the bridge.
//!
//! Vendor glue translates each SDK delegate call into one of these values and
//! hands it to [`crate::bridge::TerminalBridge::dispatch_device`] or
//! [`crate::bridge::TerminalBridge::dispatch_firmware`]. Callbacks may arrive
//! on any thread.

use crate::sdk::{Device, SdkError};

#[derive(Debug, Clone, PartialEq)]
pub enum DeviceCallback {
    Discovered(Device),
    DiscoveryFailed(SdkError),
    /// Outcome of a `connect` request.
    Connected(Result<(), SdkError>),
    Disconnected,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FirmwareCallback {
    ApplyingUpdate,
    /// Install progress, 0-100.
    UpdateProgress(f64),
    /// Download progress, 0-100.
    DownloadProgress(f64),
    UpdateComplete,
    UpdateFailure(SdkError),
}
