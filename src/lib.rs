//! POS Terminal Bridge - Tauri v2 plugin
//!
//! Exposes a payment terminal SDK (device discovery, firmware update,
//! transaction execution) to the frontend through IPC commands and events.
//! Commands are fire-and-forget; every outcome reaches the frontend as one
//! of the events listed by [`events::supported_events`].
//!
//! Vendor glue implements the traits in [`sdk`], passes them to [`init`],
//! and forwards SDK callbacks through the managed [`TerminalBridge`]:
//!
//! ```ignore
//! let bridge = app.state::<pos_terminal_bridge::TerminalBridge>();
//! bridge.dispatch_device(DeviceCallback::Disconnected);
//! ```

use std::sync::Arc;

use tauri::plugin::{Builder, TauriPlugin};
use tauri::{Manager, Runtime};
use tracing::{info, warn};

pub mod bridge;
pub mod callbacks;
mod commands;
pub mod config;
pub mod device;
pub mod diagnostics;
pub mod errors;
pub mod events;
pub mod firmware;
mod payload;
pub mod pending;
pub mod presentation;
pub mod sdk;
pub mod transaction;

pub use bridge::TerminalBridge;
pub use callbacks::{DeviceCallback, FirmwareCallback};
pub use config::BridgeConfig;
pub use errors::{BridgeError, StructuredError};
pub use sdk::TerminalSdk;

const PLUGIN_NAME: &str = "pos-terminal-bridge";

/// Build the plugin. On setup it loads [`BridgeConfig`] from the app config
/// dir, creates the [`TerminalBridge`] on Tauri's async runtime and registers
/// it as managed state.
pub fn init<R: Runtime>(sdk: TerminalSdk) -> TauriPlugin<R> {
    Builder::new(PLUGIN_NAME)
        .invoke_handler(tauri::generate_handler![
            commands::terminal::terminal_start_discovery,
            commands::terminal::terminal_stop_discovery,
            commands::terminal::terminal_connect,
            commands::terminal::terminal_disconnect,
            commands::terminal::terminal_start_firmware_update,
            commands::terminal::terminal_pay,
            commands::terminal::terminal_set_sdk_data,
            commands::terminal::terminal_supported_events,
        ])
        .setup(move |app, _api| {
            let config = match app.path().app_config_dir() {
                Ok(dir) => BridgeConfig::load(&dir.join(config::CONFIG_FILE))?,
                Err(e) => {
                    warn!(error = %e, "No app config dir, using default bridge config");
                    BridgeConfig::default()
                }
            };

            let sink = Arc::new(events::TauriEventSink::new(app.clone()));
            let presenter = Arc::new(presentation::FocusedWindowPresenter::new(app.clone()));
            let runtime = tauri::async_runtime::handle().inner().clone();

            app.manage(TerminalBridge::with_runtime(
                sdk, sink, presenter, &config, runtime,
            ));

            info!("Terminal bridge plugin registered");
            Ok(())
        })
        .build()
}
