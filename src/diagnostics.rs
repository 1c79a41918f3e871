//! Logging setup and log retention.
//!
//! The host calls [`init_logging`] once at startup, before installing the
//! plugin. Logs go to the console and, one JSON object per line, to a daily
//! rolling file; the returned guard must be kept alive for the file writer to
//! flush.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::BridgeConfig;
use crate::errors::BridgeError;

/// Prefix of rolling log files (`terminal-bridge.YYYY-MM-DD`).
pub const LOG_FILE_PREFIX: &str = "terminal-bridge";

/// Install the global subscriber: `RUST_LOG` (or the configured filter), a
/// console layer and a non-blocking daily JSON file layer under `log_dir`.
pub fn init_logging(config: &BridgeConfig, log_dir: &Path) -> Result<WorkerGuard, BridgeError> {
    fs::create_dir_all(log_dir)?;
    let pruned = prune_old_logs(log_dir, config.max_log_files);

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_filter));

    let file_appender = tracing_appender::rolling::daily(log_dir, LOG_FILE_PREFIX);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = fmt::layer()
        .json()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(true);
    let console_layer = fmt::layer().with_target(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| BridgeError::Logging(e.to_string()))?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        log_dir = %log_dir.display(),
        pruned,
        "Terminal bridge logging initialised"
    );
    Ok(guard)
}

/// Delete all but the newest `keep` bridge log files. Returns how many were
/// removed.
pub fn prune_old_logs(log_dir: &Path, keep: usize) -> usize {
    let Ok(entries) = fs::read_dir(log_dir) else {
        return 0;
    };

    let mut log_files: Vec<(PathBuf, std::time::SystemTime)> = entries
        .flatten()
        .filter(|entry| {
            entry.path().is_file()
                && entry
                    .file_name()
                    .to_str()
                    .map(|name| name.starts_with(LOG_FILE_PREFIX))
                    .unwrap_or(false)
        })
        .map(|entry| {
            let modified = entry
                .metadata()
                .ok()
                .and_then(|m| m.modified().ok())
                .unwrap_or(std::time::UNIX_EPOCH);
            (entry.path(), modified)
        })
        .collect();

    // Newest first; ties broken by name so daily files sort by date.
    log_files.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| b.0.cmp(&a.0)));

    let mut removed = 0;
    for (path, _) in log_files.iter().skip(keep) {
        match fs::remove_file(path) {
            Ok(()) => removed += 1,
            Err(e) => warn!(path = %path.display(), error = %e, "Failed to prune log file"),
        }
    }
    removed
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_prune_keeps_newest_and_ignores_other_files() {
        let dir = tempfile::tempdir().unwrap();
        for day in 1..=5 {
            fs::write(
                dir.path().join(format!("{LOG_FILE_PREFIX}.2026-10-0{day}")),
                "log",
            )
            .unwrap();
        }
        fs::write(dir.path().join("unrelated.txt"), "keep me").unwrap();

        assert_eq!(prune_old_logs(dir.path(), 3), 2);
        assert!(dir.path().join("unrelated.txt").exists());
        let remaining = fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(remaining, 4);
    }

    #[test]
    fn test_prune_missing_dir_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(prune_old_logs(&dir.path().join("missing"), 1), 0);
    }

    #[test]
    #[serial]
    fn test_init_logging_installs_once() {
        let dir = tempfile::tempdir().unwrap();
        let config = BridgeConfig::default();

        let first = init_logging(&config, dir.path());
        assert!(first.is_ok());
        assert!(matches!(
            init_logging(&config, dir.path()),
            Err(BridgeError::Logging(_))
        ));

        // Dropping the guard flushes the non-blocking writer.
        drop(first);
        let log_file = fs::read_dir(dir.path())
            .unwrap()
            .flatten()
            .map(|e| e.path())
            .find(|p| {
                p.file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.starts_with(LOG_FILE_PREFIX))
            })
            .expect("rolling log file");
        let content = fs::read_to_string(log_file).unwrap();
        let lines: Vec<serde_json::Value> = content
            .lines()
            .filter(|l| !l.trim().is_empty())
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert!(lines.iter().any(|l| {
            l["fields"]["message"] == "Terminal bridge logging initialised"
                && l["target"] == "pos_terminal_bridge::diagnostics"
        }));
    }
}
