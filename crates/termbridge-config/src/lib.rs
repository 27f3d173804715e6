//! termbridge configuration system.
//!
//! TOML-based configuration loaded once at startup. Every section uses
//! `serde(default)` so partial configs work out of the box. The loaded
//! config is immutable; callers wrap it in an `Arc` and hand it to each
//! session bridge they construct.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use termbridge_config::{load_config, config_to_json};
//!
//! let config = load_config(None).expect("failed to load config");
//! println!("{}", config_to_json(&config));
//! ```

pub mod schema;
pub mod toml_loader;
pub mod validation;

pub use schema::{
    BridgeConfig, LogLevel, LoggingConfig, ServerConfig, SessionConfig, ShellConfig,
    CONFIG_SCHEMA_VERSION,
};

use std::path::Path;
use termbridge_common::ConfigError;

/// Load config from an explicit path, or from the platform default path.
///
/// The default path is created with a commented template when missing.
/// An explicit path that does not exist is an error.
pub fn load_config(path: Option<&Path>) -> Result<BridgeConfig, ConfigError> {
    match path {
        Some(path) => toml_loader::load_from_path(path),
        None => toml_loader::load_default(),
    }
}

/// Serialize a config to a pretty-printed JSON string.
pub fn config_to_json(config: &BridgeConfig) -> String {
    serde_json::to_string_pretty(config)
        .unwrap_or_else(|e| format!("{{\"error\": \"failed to serialize config: {e}\"}}"))
}
