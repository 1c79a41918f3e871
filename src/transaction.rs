//! Transaction adapter.
//!
//! `pay` runs in three stages:
//! 1. precondition checks on the calling thread (presentation surface,
//!    request decoding), each reported as a `-1` error;
//! 2. interface resolution and transaction execution on the runtime;
//! 3. exactly one `onPayFinished` with the SDK's result, or with a
//!    structured error if the interface could not be resolved.
//!
//! Payment-level declines are part of the SDK result, not bridge errors.

use std::sync::Arc;

use serde_json::Value;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::errors::{
    ErrorFormatter, MSG_INVALID_REQUEST, MSG_NO_PRESENTATION_CONTEXT, MSG_STRING_TO_BYTES,
};
use crate::events::{BridgeEvent, EventEmitter};
use crate::presentation::{PresentationContext, PresentationProvider};
use crate::sdk::{PaymentInterfaceType, PaymentService, TransactionRequest, TransactionResult};

/// Raw request bytes from the host's JSON text. Only string values carry a
/// text encoding; anything else cannot be converted.
fn request_bytes(request_data: &Value) -> Option<Vec<u8>> {
    request_data.as_str().map(|s| s.as_bytes().to_vec())
}

/// Body of `onPayFinished` for a completed transaction. Non-object results
/// are replaced by `{}`.
fn result_payload(result: TransactionResult) -> Value {
    match result.0 {
        Value::Object(map) => Value::Object(map),
        other => {
            warn!(result = %other, "Transaction result is not a JSON object");
            serde_json::json!({})
        }
    }
}

#[derive(Clone)]
pub struct TransactionSession {
    payments: Arc<dyn PaymentService>,
    presenter: Arc<dyn PresentationProvider>,
    emitter: EventEmitter,
    errors: ErrorFormatter,
    runtime: Handle,
}

impl TransactionSession {
    pub fn new(
        payments: Arc<dyn PaymentService>,
        presenter: Arc<dyn PresentationProvider>,
        emitter: EventEmitter,
        errors: ErrorFormatter,
        runtime: Handle,
    ) -> Self {
        Self {
            payments,
            presenter,
            emitter,
            errors,
            runtime,
        }
    }

    /// Start a payment. Returns the handle of the spawned execution task, or
    /// `None` when a precondition failed and `onPayFinished` was already
    /// emitted.
    pub fn pay(
        &self,
        interface_type: PaymentInterfaceType,
        request_data: &Value,
    ) -> Option<JoinHandle<()>> {
        let Some(presentation) = self.presenter.current() else {
            warn!("Payment requested without a presentation context");
            self.finish_with_error(MSG_NO_PRESENTATION_CONTEXT);
            return None;
        };

        let Some(bytes) = request_bytes(request_data) else {
            warn!("Payment request data is not text");
            self.finish_with_error(MSG_STRING_TO_BYTES);
            return None;
        };

        let request = match TransactionRequest::from_slice(&bytes) {
            Ok(request) => request,
            Err(e) => {
                warn!(error = %e, "Payment request data is not a valid request");
                self.finish_with_error(format!("{MSG_INVALID_REQUEST}: {e}"));
                return None;
            }
        };

        let session = self.clone();
        Some(self.runtime.spawn(async move {
            session.execute(interface_type, request, presentation).await;
        }))
    }

    async fn execute(
        &self,
        interface_type: PaymentInterfaceType,
        request: TransactionRequest,
        presentation: PresentationContext,
    ) {
        let interface = match self.payments.payment_interface(interface_type).await {
            Ok(interface) => interface,
            Err(e) => {
                warn!(error = %e, interface = ?interface_type, "Payment interface unavailable");
                self.emitter.emit(
                    BridgeEvent::PayFinished,
                    self.errors.sdk(&e).to_payload(),
                );
                return;
            }
        };

        info!(
            interface = ?interface_type,
            surface = %presentation.surface,
            "Performing transaction"
        );
        let result = self
            .payments
            .perform_transaction(request, interface, presentation)
            .await;

        info!(interface = ?interface_type, "Transaction finished");
        self.emitter
            .emit(BridgeEvent::PayFinished, result_payload(result));
    }

    fn finish_with_error(&self, message: impl Into<String>) {
        self.emitter.emit(
            BridgeEvent::PayFinished,
            self.errors.local(message).to_payload(),
        );
    }
}
