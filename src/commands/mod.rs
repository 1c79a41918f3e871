//! IPC command handlers the frontend calls via `invoke()`.

pub mod terminal;
