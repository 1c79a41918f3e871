//! Error formatting for everything that crosses the host boundary.
//!
//! Native failures (SDK errors, local precondition failures) are flattened
//! into a single `{ code, message, domain }` shape so the host can match on
//! `code`/`domain` without knowing where the error came from.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::sdk::SdkError;

/// Domain stamped on every structured error unless configured otherwise.
pub const DEFAULT_ERROR_DOMAIN: &str = "pos.terminal.bridge";

/// Code used for failures detected by the bridge itself.
pub const LOCAL_ERROR_CODE: i64 = -1;

pub const MSG_DEVICE_NOT_FOUND: &str = "device not found";
pub const MSG_NO_PRESENTATION_CONTEXT: &str = "no presentation context";
pub const MSG_STRING_TO_BYTES: &str = "failed to convert string to bytes";
pub const MSG_INVALID_REQUEST: &str = "invalid transaction request";
pub const MSG_FETCH_FAILED: &str = "fetch sdk data failed";

// ---------------------------------------------------------------------------
// Structured error
// ---------------------------------------------------------------------------

/// Uniform error shape used in every `error` field of an outbound event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuredError {
    pub code: i64,
    pub message: String,
    pub domain: String,
}

impl StructuredError {
    /// Event body wrapping this error: `{ "error": { code, message, domain } }`.
    pub fn to_payload(&self) -> Value {
        serde_json::json!({ "error": self })
    }
}

/// Builds [`StructuredError`]s for one bridge instance.
///
/// The domain is fixed when the bridge is created; formatting itself is pure
/// and never fails.
#[derive(Debug, Clone)]
pub struct ErrorFormatter {
    domain: String,
}

impl ErrorFormatter {
    pub fn new(domain: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
        }
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn format(&self, code: i64, message: impl Into<String>) -> StructuredError {
        StructuredError {
            code,
            message: message.into(),
            domain: self.domain.clone(),
        }
    }

    /// Format a failure the bridge detected locally (code `-1`).
    pub fn local(&self, message: impl Into<String>) -> StructuredError {
        self.format(LOCAL_ERROR_CODE, message)
    }

    /// Format an SDK-reported failure, keeping its native code and description.
    pub fn sdk(&self, error: &SdkError) -> StructuredError {
        self.format(error.code, error.description.clone())
    }
}

impl Default for ErrorFormatter {
    fn default() -> Self {
        Self::new(DEFAULT_ERROR_DOMAIN)
    }
}

// ---------------------------------------------------------------------------
// Crate error
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum BridgeError {
    /// A pending host round-trip ended without a value (null answer,
    /// timeout, or the bridge dropped the waiter).
    #[error("fetch sdk data failed")]
    FetchFailed,

    #[error("no tokio runtime available: {0}")]
    NoRuntime(String),

    #[error("invalid bridge config: {0}")]
    Config(String),

    #[error("logging init failed: {0}")]
    Logging(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl BridgeError {
    /// Wire representation handed back to the SDK or host.
    pub fn to_structured(&self, formatter: &ErrorFormatter) -> StructuredError {
        match self {
            BridgeError::FetchFailed => formatter.local(MSG_FETCH_FAILED),
            other => formatter.local(other.to_string()),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
