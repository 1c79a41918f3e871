const COMMANDS: &[&str] = &[
    "terminal_start_discovery",
    "terminal_stop_discovery",
    "terminal_connect",
    "terminal_disconnect",
    "terminal_start_firmware_update",
    "terminal_pay",
    "terminal_set_sdk_data",
    "terminal_supported_events",
];

fn main() {
    tauri_plugin::Builder::new(COMMANDS).build();
}
