//! Pending host round-trips.
//!
//! Some SDK requests can only be answered by the host (e.g. session data
//! fetched from a backend). The bridge registers a one-shot waiter under a
//! fresh correlation id, sends the id out in an event, and the host answers
//! through `setSdkData(callbackId, value)`.
//!
//! Entries are removed under the same lock that looks them up, so every id
//! resolves at most once. Unknown or already-resolved ids are logged and
//! ignored.

use std::collections::HashMap;
use std::sync::Mutex;

use tokio::sync::oneshot;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::errors::BridgeError;

type Waiter = oneshot::Sender<Result<String, BridgeError>>;

/// Receiving half of a registered call.
#[derive(Debug)]
pub struct PendingCall {
    id: String,
    rx: oneshot::Receiver<Result<String, BridgeError>>,
}

impl PendingCall {
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Wait for the host's answer. A dropped waiter counts as a failed fetch.
    pub async fn wait(self) -> Result<String, BridgeError> {
        self.rx.await.unwrap_or(Err(BridgeError::FetchFailed))
    }
}

/// Correlation id → waiter map shared by host calls and SDK tasks.
#[derive(Default)]
pub struct PendingCalls {
    calls: Mutex<HashMap<String, Waiter>>,
}

impl PendingCalls {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a fresh correlation id and store its waiter.
    pub fn register(&self) -> (String, PendingCall) {
        let id = Uuid::new_v4().to_string();
        let (tx, rx) = oneshot::channel();
        {
            let mut calls = self.calls.lock().unwrap_or_else(|e| e.into_inner());
            calls.insert(id.clone(), tx);
        }
        debug!(callback_id = %id, "Registered pending call");
        (id.clone(), PendingCall { id, rx })
    }

    /// Fulfil (`Some`) or fail (`None`) the waiter for `id`.
    ///
    /// Returns `false` when no call was pending under `id`.
    pub fn resolve(&self, id: &str, value: Option<String>) -> bool {
        let waiter = {
            let mut calls = self.calls.lock().unwrap_or_else(|e| e.into_inner());
            calls.remove(id)
        };

        let Some(waiter) = waiter else {
            warn!(callback_id = %id, "No pending call found for callback id");
            return false;
        };

        let outcome = value.ok_or(BridgeError::FetchFailed);
        if waiter.send(outcome).is_err() {
            debug!(callback_id = %id, "Pending call resolved after its waiter went away");
        }
        true
    }

    /// Drop the entry for `id` without answering it (expired waits).
    pub fn cancel(&self, id: &str) -> bool {
        let mut calls = self.calls.lock().unwrap_or_else(|e| e.into_inner());
        calls.remove(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
