//! Scripted SDK used by the bridge tests.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::mpsc::UnboundedReceiver;

use super::*;
use crate::events::EmittedEvent;

pub(crate) struct ScriptedSdk {
    pub discovered: Mutex<Vec<Device>>,
    pub connected: Mutex<Option<Device>>,
    pub update_summary: Mutex<Result<Option<UpdateSummary>, SdkError>>,
    pub firmware_start: Mutex<Result<(), SdkError>>,
    pub interface_error: Mutex<Option<SdkError>>,
    pub transaction_result: Mutex<Value>,

    pub discovering: AtomicBool,
    pub connect_calls: Mutex<Vec<String>>,
    pub disconnect_calls: AtomicUsize,
    pub firmware_starts: AtomicUsize,
    pub transactions: Mutex<Vec<(TransactionRequest, PaymentInterface, PresentationContext)>>,
}

impl ScriptedSdk {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            discovered: Mutex::new(Vec::new()),
            connected: Mutex::new(None),
            update_summary: Mutex::new(Ok(None)),
            firmware_start: Mutex::new(Ok(())),
            interface_error: Mutex::new(None),
            transaction_result: Mutex::new(serde_json::json!({ "success": true })),
            discovering: AtomicBool::new(false),
            connect_calls: Mutex::new(Vec::new()),
            disconnect_calls: AtomicUsize::new(0),
            firmware_starts: AtomicUsize::new(0),
            transactions: Mutex::new(Vec::new()),
        })
    }

    pub fn handles(self: &Arc<Self>) -> TerminalSdk {
        TerminalSdk {
            devices: self.clone(),
            firmware: self.clone(),
            payments: self.clone(),
        }
    }

    pub fn transaction_count(&self) -> usize {
        self.transactions.lock().unwrap().len()
    }
}

impl DeviceManager for ScriptedSdk {
    fn start_discovery(&self) {
        self.discovering.store(true, Ordering::SeqCst);
    }

    fn stop_discovery(&self) {
        self.discovering.store(false, Ordering::SeqCst);
    }

    fn discovered_devices(&self) -> Vec<Device> {
        self.discovered.lock().unwrap().clone()
    }

    fn connect(&self, device: &Device) {
        self.connect_calls
            .lock()
            .unwrap()
            .push(device.serial_number.clone());
    }

    fn disconnect(&self) {
        self.disconnect_calls.fetch_add(1, Ordering::SeqCst);
    }

    fn connected_device(&self) -> Option<Device> {
        self.connected.lock().unwrap().clone()
    }
}

#[async_trait]
impl FirmwareManager for ScriptedSdk {
    async fn start_firmware_update(&self) -> Result<(), SdkError> {
        self.firmware_starts.fetch_add(1, Ordering::SeqCst);
        self.firmware_start.lock().unwrap().clone()
    }

    async fn firmware_update_summary(&self) -> Result<Option<UpdateSummary>, SdkError> {
        tokio::task::yield_now().await;
        self.update_summary.lock().unwrap().clone()
    }
}

#[async_trait]
impl PaymentService for ScriptedSdk {
    async fn payment_interface(
        &self,
        kind: PaymentInterfaceType,
    ) -> Result<PaymentInterface, SdkError> {
        if let Some(err) = self.interface_error.lock().unwrap().clone() {
            return Err(err);
        }
        Ok(PaymentInterface {
            kind,
            id: format!("{kind:?}-interface"),
        })
    }

    async fn perform_transaction(
        &self,
        request: TransactionRequest,
        interface: PaymentInterface,
        presentation: PresentationContext,
    ) -> TransactionResult {
        tokio::task::yield_now().await;
        self.transactions
            .lock()
            .unwrap()
            .push((request, interface, presentation));
        TransactionResult(self.transaction_result.lock().unwrap().clone())
    }
}

pub(crate) fn card_reader(serial: &str) -> Device {
    Device {
        serial_number: serial.to_string(),
        name: Some("Counter reader".into()),
        model: Some("S1E2L".into()),
        is_charging: false,
        battery_capacity: 80,
        device_type: DeviceType::CardReader,
    }
}

/// Next event from the sink, waiting up to a second for spawned tasks.
pub(crate) async fn next_event(rx: &mut UnboundedReceiver<EmittedEvent>) -> EmittedEvent {
    tokio::time::timeout(Duration::from_secs(1), rx.recv())
        .await
        .expect("timed out waiting for event")
        .expect("event channel closed")
}

/// Let spawned tasks run, then assert nothing else was emitted.
pub(crate) async fn assert_no_more_events(rx: &mut UnboundedReceiver<EmittedEvent>) {
    tokio::time::sleep(Duration::from_millis(20)).await;
    if let Ok(extra) = rx.try_recv() {
        panic!("unexpected extra event: {extra:?}");
    }
}
