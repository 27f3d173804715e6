//! Where the config file lives, and seeding it on first run.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use termbridge_common::ConfigError;
use tracing::info;

use super::template::default_config_toml;

const APP_DIR: &str = "termbridge";
const FILE_NAME: &str = "config.toml";

/// `<platform config dir>/termbridge/config.toml`.
pub fn default_config_path() -> Result<PathBuf, ConfigError> {
    dirs::config_dir()
        .map(|dir| dir.join(APP_DIR).join(FILE_NAME))
        .ok_or_else(|| ConfigError::ParseError("no platform config directory".into()))
}

/// Write the commented template to `path`, creating parent directories.
pub fn create_default_config(path: &Path) -> Result<(), ConfigError> {
    let io_error = |action: &str, e: io::Error| {
        ConfigError::ParseError(format!("cannot {action} {}: {e}", path.display()))
    };

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| io_error("create parent directory of", e))?;
    }
    fs::write(path, default_config_toml()).map_err(|e| io_error("write", e))?;

    info!(path = %path.display(), "Created default config");
    Ok(())
}
