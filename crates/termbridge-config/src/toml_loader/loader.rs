//! Reading and validating a config file.

use std::io::ErrorKind;
use std::path::Path;

use termbridge_common::ConfigError;
use tracing::{info, warn};

use super::paths::{create_default_config, default_config_path};
use crate::schema::BridgeConfig;
use crate::validation;

/// Load config from an explicit TOML file.
///
/// Missing fields take their defaults. A file that parses but fails
/// validation is ignored with a warning and the defaults are returned.
pub fn load_from_path(path: &Path) -> Result<BridgeConfig, ConfigError> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(ConfigError::FileNotFound(path.to_path_buf()));
        }
        Err(e) => {
            return Err(ConfigError::ParseError(format!(
                "cannot read {}: {e}",
                path.display()
            )));
        }
    };

    let config: BridgeConfig = toml::from_str(&content)
        .map_err(|e| ConfigError::ParseError(format!("{}: {e}", path.display())))?;

    match validation::validate(&config) {
        Ok(()) => {
            info!(path = %path.display(), "Loaded config");
            Ok(config)
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Invalid config, using defaults");
            Ok(BridgeConfig::default())
        }
    }
}

/// Load config from the platform default path, seeding it with the
/// commented template on first run.
///
/// Linux: `~/.config/termbridge/config.toml`.
/// macOS: `~/Library/Application Support/termbridge/config.toml`.
pub fn load_default() -> Result<BridgeConfig, ConfigError> {
    let path = default_config_path()?;
    match load_from_path(&path) {
        Err(ConfigError::FileNotFound(_)) => {
            create_default_config(&path)?;
            Ok(BridgeConfig::default())
        }
        other => other,
    }
}
