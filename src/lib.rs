// Library surface for headless/integration tests and reuse.
// Keep this lean to avoid coupling to bin-only types in main.rs.
pub mod app_dirs;
pub mod capability;
pub mod catalog;
pub mod config;
pub mod countdown;
pub mod keymap;
pub mod logging;
pub mod runtime;
pub mod session;
pub mod signal;
pub mod trainer;
pub mod ui;
pub mod util;
pub mod wake_lock;
