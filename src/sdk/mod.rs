//! Payment terminal SDK seam.
//!
//! The vendor SDK (device discovery, firmware update, transaction execution)
//! is an external collaborator. This module defines the traits the bridge
//! calls into and the data it exchanges with the SDK. Vendor glue code
//! implements the traits and forwards SDK callbacks through
//! [`crate::bridge::TerminalBridge`]'s dispatch functions.

#[cfg(test)]
pub(crate) mod mock;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::presentation::PresentationContext;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Failure reported by the SDK, carrying its native code and description.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{description} (code {code})")]
pub struct SdkError {
    pub code: i64,
    pub description: String,
}

impl SdkError {
    pub fn new(code: i64, description: impl Into<String>) -> Self {
        Self {
            code,
            description: description.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Devices
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DeviceType {
    /// The host device itself acting as a contactless terminal.
    TapToPay,
    /// An external card reader.
    CardReader,
}

impl DeviceType {
    pub fn as_str(self) -> &'static str {
        match self {
            DeviceType::TapToPay => "tapToPay",
            DeviceType::CardReader => "cardReader",
        }
    }
}

/// A payment device as reported by the SDK's device manager.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Device {
    pub serial_number: String,
    pub name: Option<String>,
    pub model: Option<String>,
    pub is_charging: bool,
    /// Battery level in percent.
    pub battery_capacity: u8,
    #[serde(rename = "type")]
    pub device_type: DeviceType,
}

/// A pending firmware update for the connected device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSummary {
    /// Date after which the update is mandatory.
    pub required_date: Option<DateTime<Utc>>,
    /// The update must be applied over a close-range wireless connection.
    pub requires_bluetooth_connection: bool,
}

// ---------------------------------------------------------------------------
// Payments
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PaymentInterfaceType {
    TapToPay,
    CardReader,
}

impl PaymentInterfaceType {
    /// Map the host's numeric selector: `0` tap-to-pay, `1` card reader.
    /// Anything else falls back to tap-to-pay.
    pub fn from_wire(value: i64) -> Self {
        match value {
            1 => PaymentInterfaceType::CardReader,
            _ => PaymentInterfaceType::TapToPay,
        }
    }
}

/// Opaque handle to a payment interface resolved by the SDK.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentInterface {
    pub kind: PaymentInterfaceType,
    pub id: String,
}

/// Transaction request decoded from the host's JSON text. Not interpreted by
/// the bridge beyond requiring a JSON object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionRequest(pub Map<String, Value>);

impl TransactionRequest {
    pub fn from_slice(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }
}

/// Transaction outcome produced by the SDK. Payment-level declines are
/// encoded inside the payload, never as a separate error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionResult(pub Value);

// ---------------------------------------------------------------------------
// SDK traits
// ---------------------------------------------------------------------------

/// Device discovery and connection. Outcomes of `start_discovery` and
/// `connect` arrive later as [`crate::callbacks::DeviceCallback`]s.
pub trait DeviceManager: Send + Sync {
    fn start_discovery(&self);
    fn stop_discovery(&self);
    fn discovered_devices(&self) -> Vec<Device>;
    fn connect(&self, device: &Device);
    fn disconnect(&self);
    fn connected_device(&self) -> Option<Device>;
}

#[async_trait]
pub trait FirmwareManager: Send + Sync {
    /// Kick off an update. Progress arrives as
    /// [`crate::callbacks::FirmwareCallback`]s; only a failure to start is
    /// returned here.
    async fn start_firmware_update(&self) -> Result<(), SdkError>;

    /// Probe the connected device for a pending update. `Ok(None)` means the
    /// device is up to date.
    async fn firmware_update_summary(&self) -> Result<Option<UpdateSummary>, SdkError>;
}

#[async_trait]
pub trait PaymentService: Send + Sync {
    async fn payment_interface(
        &self,
        kind: PaymentInterfaceType,
    ) -> Result<PaymentInterface, SdkError>;

    async fn perform_transaction(
        &self,
        request: TransactionRequest,
        interface: PaymentInterface,
        presentation: PresentationContext,
    ) -> TransactionResult;
}

/// The set of SDK handles a bridge instance owns for its lifetime.
#[derive(Clone)]
pub struct TerminalSdk {
    pub devices: Arc<dyn DeviceManager>,
    pub firmware: Arc<dyn FirmwareManager>,
    pub payments: Arc<dyn PaymentService>,
}
