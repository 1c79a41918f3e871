//! Bridge configuration.
//!
//! Read from `terminal-bridge.json` in the host's config directory. Every
//! field has a default, so a missing file or a partial file is fine; a file
//! that is not valid JSON is an error.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::errors::{BridgeError, DEFAULT_ERROR_DOMAIN};

pub const CONFIG_FILE: &str = "terminal-bridge.json";

const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 30;
const DEFAULT_LOG_FILTER: &str = "info,pos_terminal_bridge=debug";
const DEFAULT_MAX_LOG_FILES: usize = 7;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BridgeConfig {
    /// Domain stamped on every structured error.
    pub error_domain: String,
    /// How long a host round-trip may stay unanswered. `0` waits forever.
    pub fetch_timeout_secs: u64,
    /// Default `EnvFilter` directive when `RUST_LOG` is unset.
    pub log_filter: String,
    /// Rolling log files kept on disk.
    pub max_log_files: usize,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            error_domain: DEFAULT_ERROR_DOMAIN.to_string(),
            fetch_timeout_secs: DEFAULT_FETCH_TIMEOUT_SECS,
            log_filter: DEFAULT_LOG_FILTER.to_string(),
            max_log_files: DEFAULT_MAX_LOG_FILES,
        }
    }
}

impl BridgeConfig {
    pub fn load(path: &Path) -> Result<Self, BridgeError> {
        match fs::read_to_string(path) {
            Ok(raw) => {
                let config = Self::from_json_str(&raw)?;
                info!(path = %path.display(), "Loaded terminal bridge config");
                Ok(config)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e.into()),
        }
    }

    pub fn from_json_str(raw: &str) -> Result<Self, BridgeError> {
        serde_json::from_str(raw).map_err(|e| BridgeError::Config(e.to_string()))
    }

    pub fn fetch_timeout(&self) -> Option<Duration> {
        match self.fetch_timeout_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }
}
