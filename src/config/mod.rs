//! Application Configuration Module
//!
//! Provides service configuration loaded from TOML files, replacing
//! hardcoded endpoints, timeouts, and sampling parameters with
//! operator-tunable values.
//!
//! ## Loading Order
//!
//! 1. `ADPILOT_CONFIG` environment variable (path to TOML file)
//! 2. `adpilot.toml` in the current working directory
//! 3. Built-in defaults
//!
//! ## Usage
//!
//! Call `config::init()` once at startup, then `config::get()` anywhere:
//!
//! ```ignore
//! // In main():
//! config::init(AppConfig::load());
//!
//! // Anywhere in the codebase:
//! let timeout = config::get().search.query_timeout_secs;
//! ```

mod app_config;

pub use app_config::*;

use std::sync::OnceLock;

/// Global application configuration, initialized once at startup.
static APP_CONFIG: OnceLock<AppConfig> = OnceLock::new();

/// Initialize the global application configuration.
///
/// Must be called exactly once before any calls to `get()`.
pub fn init(config: AppConfig) {
    if APP_CONFIG.set(config).is_err() {
        tracing::warn!("config::init() called more than once — ignoring");
    }
}

/// Get a reference to the global application configuration.
///
/// Panics if `init()` has not been called. A missing config is a fatal
/// startup error, not a recoverable condition.
pub fn get() -> &'static AppConfig {
    APP_CONFIG
        .get()
        .expect("config::get() called before config::init() — this is a startup bug")
}

/// Check whether the config has been initialized.
///
/// Useful for tests and optional config paths.
pub fn is_initialized() -> bool {
    APP_CONFIG.get().is_some()
}
