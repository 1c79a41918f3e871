use serde_json::Value;
use tracing::warn;

use crate::bridge::TerminalBridge;
use crate::events::supported_events;
use crate::payload::{field, payload_arg0_as_string, value_to_i64};
use crate::sdk::PaymentInterfaceType;

#[derive(Debug)]
struct PayCompatPayload {
    interface_type: PaymentInterfaceType,
    request_data: Value,
}

#[derive(Debug, PartialEq)]
struct SdkDataCompatPayload {
    callback_id: String,
    value: Option<String>,
}

/// `connect(serialNumber)` or `connect({ serialNumber })`. The serial is
/// matched exactly against discovered devices, so it is not trimmed.
fn parse_serial_number(arg0: Option<Value>) -> String {
    let raw = match &arg0 {
        Some(obj @ Value::Object(_)) => field(obj, &["serialNumber", "serial_number"]),
        other => other.as_ref(),
    };
    raw.and_then(Value::as_str).unwrap_or_default().to_string()
}

/// `pay(interfaceType, requestData)` or `pay({ interfaceType, requestData })`.
fn parse_pay_args(arg0: Option<Value>, arg1: Option<Value>) -> PayCompatPayload {
    let arg0 = arg0.unwrap_or(Value::Null);

    let raw_type = match &arg0 {
        Value::Object(_) => field(&arg0, &["interfaceType", "interface_type", "type"]).cloned(),
        Value::Null => None,
        other => Some(other.clone()),
    };
    let interface_type = match raw_type.as_ref().and_then(value_to_i64) {
        Some(n @ (0 | 1)) => PaymentInterfaceType::from_wire(n),
        _ => {
            warn!(interface_type = ?raw_type, "Unknown interface type, using tapToPay");
            PaymentInterfaceType::TapToPay
        }
    };

    let request_data = match arg1 {
        Some(v) if !v.is_null() => v,
        _ => field(&arg0, &["requestData", "request_data"])
            .cloned()
            .unwrap_or(Value::Null),
    };

    PayCompatPayload {
        interface_type,
        request_data,
    }
}

/// `setSdkData(callbackId, value)` or `setSdkData({ callbackId, value })`.
/// The value is passed through untrimmed; a missing or null value fails the
/// pending call.
fn parse_sdk_data_args(
    arg0: Option<Value>,
    arg1: Option<Value>,
) -> Result<SdkDataCompatPayload, String> {
    let object_value = match &arg0 {
        Some(obj @ Value::Object(_)) => field(obj, &["value", "sdkData", "sdk_data"]).cloned(),
        _ => None,
    };
    let callback_id = payload_arg0_as_string(arg0, &["callbackId", "callback_id"])
        .ok_or("Missing callbackId")?;

    let value = arg1
        .filter(|v| !v.is_null())
        .or(object_value)
        .and_then(|v| v.as_str().map(str::to_string));

    Ok(SdkDataCompatPayload { callback_id, value })
}

#[tauri::command]
pub async fn terminal_start_discovery(
    bridge: tauri::State<'_, TerminalBridge>,
) -> Result<Value, String> {
    bridge.start_discovery();
    Ok(serde_json::json!({ "success": true }))
}

#[tauri::command]
pub async fn terminal_stop_discovery(
    bridge: tauri::State<'_, TerminalBridge>,
) -> Result<Value, String> {
    bridge.stop_discovery();
    Ok(serde_json::json!({ "success": true }))
}

#[tauri::command]
pub async fn terminal_connect(
    arg0: Option<Value>,
    bridge: tauri::State<'_, TerminalBridge>,
) -> Result<Value, String> {
    bridge.connect(&parse_serial_number(arg0));
    Ok(serde_json::json!({ "success": true }))
}

#[tauri::command]
pub async fn terminal_disconnect(
    bridge: tauri::State<'_, TerminalBridge>,
) -> Result<Value, String> {
    bridge.disconnect();
    Ok(serde_json::json!({ "success": true }))
}

#[tauri::command]
pub async fn terminal_start_firmware_update(
    bridge: tauri::State<'_, TerminalBridge>,
) -> Result<Value, String> {
    bridge.start_firmware_update();
    Ok(serde_json::json!({ "success": true }))
}

#[tauri::command]
pub async fn terminal_pay(
    arg0: Option<Value>,
    arg1: Option<Value>,
    bridge: tauri::State<'_, TerminalBridge>,
) -> Result<Value, String> {
    let payload = parse_pay_args(arg0, arg1);
    bridge.pay(payload.interface_type, &payload.request_data);
    Ok(serde_json::json!({ "success": true }))
}

#[tauri::command]
pub async fn terminal_set_sdk_data(
    arg0: Option<Value>,
    arg1: Option<Value>,
    bridge: tauri::State<'_, TerminalBridge>,
) -> Result<Value, String> {
    let payload = parse_sdk_data_args(arg0, arg1)?;
    bridge.set_sdk_data(&payload.callback_id, payload.value);
    Ok(serde_json::json!({ "success": true }))
}

#[tauri::command]
pub async fn terminal_supported_events() -> Result<Value, String> {
    Ok(serde_json::json!({ "events": supported_events() }))
}
