//! The bridge instance.
//!
//! One [`TerminalBridge`] exists per host session. It owns the pending-call
//! registry and the SDK handles, and exposes two surfaces:
//! - host commands (`start_discovery`, `connect`, `pay`, `set_sdk_data`, ...),
//!   all non-blocking, with results delivered as events;
//! - SDK entry points (`dispatch_device`, `dispatch_firmware`,
//!   `fetch_sdk_data`) that vendor glue calls from any thread.
//!
//! The bridge is cheap to clone; clones share all state.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::callbacks::{DeviceCallback, FirmwareCallback};
use crate::config::BridgeConfig;
use crate::device::DeviceSession;
use crate::errors::{BridgeError, ErrorFormatter};
use crate::events::{BridgeEvent, EventEmitter, EventSink};
use crate::firmware::FirmwareSession;
use crate::pending::PendingCalls;
use crate::presentation::PresentationProvider;
use crate::sdk::{PaymentInterfaceType, TerminalSdk};
use crate::transaction::TransactionSession;

#[derive(Clone)]
pub struct TerminalBridge {
    devices: DeviceSession,
    firmware: FirmwareSession,
    transactions: TransactionSession,
    pending: Arc<PendingCalls>,
    emitter: EventEmitter,
    errors: ErrorFormatter,
    fetch_timeout: Option<Duration>,
}

impl TerminalBridge {
    /// Build a bridge on the current tokio runtime.
    pub fn new(
        sdk: TerminalSdk,
        sink: Arc<dyn EventSink>,
        presenter: Arc<dyn PresentationProvider>,
        config: &BridgeConfig,
    ) -> Result<Self, BridgeError> {
        let runtime = Handle::try_current().map_err(|e| BridgeError::NoRuntime(e.to_string()))?;
        Ok(Self::with_runtime(sdk, sink, presenter, config, runtime))
    }

    /// Build a bridge whose background work runs on `runtime`. SDK callbacks
    /// may then arrive on threads outside any runtime.
    pub fn with_runtime(
        sdk: TerminalSdk,
        sink: Arc<dyn EventSink>,
        presenter: Arc<dyn PresentationProvider>,
        config: &BridgeConfig,
        runtime: Handle,
    ) -> Self {
        let emitter = EventEmitter::new(sink);
        let errors = ErrorFormatter::new(config.error_domain.clone());

        let devices = DeviceSession::new(
            sdk.devices.clone(),
            sdk.firmware.clone(),
            emitter.clone(),
            errors.clone(),
            runtime.clone(),
        );
        let firmware = FirmwareSession::new(
            sdk.firmware.clone(),
            emitter.clone(),
            errors.clone(),
            runtime.clone(),
        );
        let transactions = TransactionSession::new(
            sdk.payments,
            presenter,
            emitter.clone(),
            errors.clone(),
            runtime,
        );

        info!(
            error_domain = %errors.domain(),
            fetch_timeout_secs = config.fetch_timeout_secs,
            "Terminal bridge created"
        );

        Self {
            devices,
            firmware,
            transactions,
            pending: Arc::new(PendingCalls::new()),
            emitter,
            errors,
            fetch_timeout: config.fetch_timeout(),
        }
    }

    pub fn errors(&self) -> &ErrorFormatter {
        &self.errors
    }

    // -- Host commands -------------------------------------------------------

    pub fn start_discovery(&self) {
        self.devices.start_discovery();
    }

    pub fn stop_discovery(&self) {
        self.devices.stop_discovery();
    }

    pub fn connect(&self, serial_number: &str) {
        self.devices.connect(serial_number);
    }

    pub fn disconnect(&self) {
        self.devices.disconnect();
    }

    pub fn start_firmware_update(&self) {
        self.firmware.start_firmware_update();
    }

    /// See [`TransactionSession::pay`].
    pub fn pay(
        &self,
        interface_type: PaymentInterfaceType,
        request_data: &Value,
    ) -> Option<JoinHandle<()>> {
        self.transactions.pay(interface_type, request_data)
    }

    /// Host answer to an `onPayFetchSdkData` event. Unknown ids are ignored.
    pub fn set_sdk_data(&self, callback_id: &str, value: Option<String>) {
        self.pending.resolve(callback_id, value);
    }

    // -- SDK entry points ----------------------------------------------------

    pub fn dispatch_device(&self, callback: DeviceCallback) {
        self.devices.handle(callback);
    }

    pub fn dispatch_firmware(&self, callback: FirmwareCallback) {
        self.firmware.handle(callback);
    }

    /// Ask the host for SDK session data and wait for its answer.
    ///
    /// Emits `onPayFetchSdkData { token, callbackId }`. A null answer, or no
    /// answer within the configured timeout, fails with
    /// [`BridgeError::FetchFailed`].
    pub async fn fetch_sdk_data(&self, setup_token: &str) -> Result<String, BridgeError> {
        let (callback_id, call) = self.pending.register();
        self.emitter.emit(
            BridgeEvent::FetchSdkData,
            serde_json::json!({ "token": setup_token, "callbackId": callback_id }),
        );

        let Some(timeout) = self.fetch_timeout else {
            return call.wait().await;
        };

        match tokio::time::timeout(timeout, call.wait()).await {
            Ok(outcome) => outcome,
            Err(_) => {
                self.pending.cancel(&callback_id);
                warn!(
                    callback_id = %callback_id,
                    timeout_secs = timeout.as_secs(),
                    "Host did not answer sdk data request in time"
                );
                Err(BridgeError::FetchFailed)
            }
        }
    }

    /// Number of host round-trips still awaiting an answer.
    pub fn pending_calls(&self) -> usize {
        self.pending.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{ChannelEventSink, EmittedEvent};
    use crate::presentation::{FixedPresenter, PresentationContext};
    use crate::sdk::mock::{assert_no_more_events, card_reader, next_event, ScriptedSdk};
    use tokio::sync::mpsc::UnboundedReceiver;

    fn bridge(
        sdk: &Arc<ScriptedSdk>,
        config: BridgeConfig,
    ) -> (TerminalBridge, UnboundedReceiver<EmittedEvent>) {
        let (sink, rx) = ChannelEventSink::channel();
        let bridge = TerminalBridge::new(
            sdk.handles(),
            Arc::new(sink),
            Arc::new(FixedPresenter::new(Some(PresentationContext::new("main")))),
            &config,
        )
        .unwrap();
        (bridge, rx)
    }

    #[test]
    fn test_new_without_runtime_fails() {
        let sdk = ScriptedSdk::new();
        let (sink, _rx) = ChannelEventSink::channel();
        let result = TerminalBridge::new(
            sdk.handles(),
            Arc::new(sink),
            Arc::new(FixedPresenter::default()),
            &BridgeConfig::default(),
        );
        assert!(matches!(result, Err(BridgeError::NoRuntime(_))));
    }

    #[tokio::test]
    async fn test_fetch_sdk_data_round_trip() {
        let sdk = ScriptedSdk::new();
        let (bridge, mut rx) = bridge(&sdk, BridgeConfig::default());

        let fetcher = bridge.clone();
        let fetch = tokio::spawn(async move { fetcher.fetch_sdk_data("setup-token").await });

        let event = next_event(&mut rx).await;
        assert_eq!(event.name, "onPayFetchSdkData");
        assert_eq!(event.payload["token"], "setup-token");
        let callback_id = event.payload["callbackId"].as_str().unwrap().to_string();
        assert_eq!(bridge.pending_calls(), 1);

        bridge.set_sdk_data(&callback_id, Some("sdk-data".into()));
        assert_eq!(fetch.await.unwrap().unwrap(), "sdk-data");
        assert_eq!(bridge.pending_calls(), 0);

        // Late duplicate answer is ignored.
        bridge.set_sdk_data(&callback_id, Some("again".into()));
        assert_no_more_events(&mut rx).await;
    }

    #[tokio::test]
    async fn test_fetch_sdk_data_null_answer_fails() {
        let sdk = ScriptedSdk::new();
        let (bridge, mut rx) = bridge(&sdk, BridgeConfig::default());

        let fetcher = bridge.clone();
        let fetch = tokio::spawn(async move { fetcher.fetch_sdk_data("t").await });

        let event = next_event(&mut rx).await;
        let callback_id = event.payload["callbackId"].as_str().unwrap().to_string();
        bridge.set_sdk_data(&callback_id, None);

        let err = fetch.await.unwrap().unwrap_err();
        assert!(matches!(err, BridgeError::FetchFailed));
        assert_eq!(err.to_structured(bridge.errors()).message, "fetch sdk data failed");
    }

    #[tokio::test(start_paused = true)]
    async fn test_unanswered_fetch_expires() {
        let sdk = ScriptedSdk::new();
        let config = BridgeConfig {
            fetch_timeout_secs: 5,
            ..BridgeConfig::default()
        };
        let (bridge, mut rx) = bridge(&sdk, config);

        let fetcher = bridge.clone();
        let fetch = tokio::spawn(async move { fetcher.fetch_sdk_data("t").await });
        let event = next_event(&mut rx).await;
        let callback_id = event.payload["callbackId"].as_str().unwrap().to_string();

        tokio::time::advance(Duration::from_secs(6)).await;
        assert!(matches!(
            fetch.await.unwrap(),
            Err(BridgeError::FetchFailed)
        ));
        assert_eq!(bridge.pending_calls(), 0);

        // The expired id is now unknown.
        bridge.set_sdk_data(&callback_id, Some("late".into()));
    }

    #[tokio::test]
    async fn test_unknown_callback_id_does_not_disturb_pending_fetch() {
        let sdk = ScriptedSdk::new();
        let (bridge, mut rx) = bridge(&sdk, BridgeConfig::default());

        let fetcher = bridge.clone();
        let fetch = tokio::spawn(async move { fetcher.fetch_sdk_data("t").await });
        let event = next_event(&mut rx).await;
        let callback_id = event.payload["callbackId"].as_str().unwrap().to_string();

        bridge.set_sdk_data("abc", Some("wrong".into()));
        assert_eq!(bridge.pending_calls(), 1);

        bridge.set_sdk_data(&callback_id, Some("right".into()));
        assert_eq!(fetch.await.unwrap().unwrap(), "right");
    }

    #[tokio::test]
    async fn test_discover_then_connect_scenario() {
        let sdk = ScriptedSdk::new();
        let (bridge, mut rx) = bridge(&sdk, BridgeConfig::default());

        bridge.start_discovery();
        let device = card_reader("S123");
        sdk.discovered.lock().unwrap().push(device.clone());
        bridge.dispatch_device(DeviceCallback::Discovered(device.clone()));

        let discovered = next_event(&mut rx).await;
        assert_eq!(discovered.name, "onDeviceDiscovered");
        assert_eq!(discovered.payload["serialNumber"], "S123");

        bridge.connect("S123");
        assert_eq!(*sdk.connect_calls.lock().unwrap(), vec!["S123".to_string()]);

        *sdk.connected.lock().unwrap() = Some(device);
        bridge.dispatch_device(DeviceCallback::Connected(Ok(())));

        let connected = next_event(&mut rx).await;
        assert_eq!(connected.name, "onDeviceConnected");
        assert_eq!(connected.payload["serialNumber"], "S123");
        assert_eq!(connected.payload["type"], "cardReader");
        assert_eq!(connected.payload["batteryCapacity"], 80);
        assert_eq!(connected.payload["updateAvailable"], false);
        assert_no_more_events(&mut rx).await;
    }

    #[tokio::test]
    async fn test_pay_with_bad_json_scenario() {
        let sdk = ScriptedSdk::new();
        let (bridge, mut rx) = bridge(&sdk, BridgeConfig::default());

        bridge.pay(
            PaymentInterfaceType::from_wire(0),
            &Value::String("{bad json".into()),
        );

        let event = next_event(&mut rx).await;
        assert_eq!(event.name, "onPayFinished");
        assert_eq!(event.payload["error"]["code"], -1);
        assert_no_more_events(&mut rx).await;
        assert_eq!(sdk.transaction_count(), 0);
    }

    #[tokio::test]
    async fn test_configured_domain_reaches_events() {
        let sdk = ScriptedSdk::new();
        let config = BridgeConfig {
            error_domain: "shop.terminal".into(),
            ..BridgeConfig::default()
        };
        let (bridge, mut rx) = bridge(&sdk, config);

        bridge.connect("missing");

        let event = next_event(&mut rx).await;
        assert_eq!(event.payload["error"]["domain"], "shop.terminal");
    }

    #[test]
    fn test_callbacks_from_foreign_thread_use_bridge_runtime() {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        let sdk = ScriptedSdk::new();
        *sdk.connected.lock().unwrap() = Some(card_reader("S123"));
        let (sink, mut rx) = ChannelEventSink::channel();
        let bridge = TerminalBridge::with_runtime(
            sdk.handles(),
            Arc::new(sink),
            Arc::new(FixedPresenter::default()),
            &BridgeConfig::default(),
            runtime.handle().clone(),
        );

        std::thread::spawn(move || bridge.dispatch_device(DeviceCallback::Connected(Ok(()))))
            .join()
            .unwrap();

        let event = runtime.block_on(next_event(&mut rx));
        assert_eq!(event.name, "onDeviceConnected");
    }
}
