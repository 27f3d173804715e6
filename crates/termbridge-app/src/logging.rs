//! Tracing setup.
//!
//! Filter precedence: `--log-level`, then `RUST_LOG`, then the config file's
//! `[logging] level`.

use termbridge_config::LogLevel;
use tracing_subscriber::EnvFilter;

pub fn filter(cli: Option<&str>, configured: LogLevel) -> EnvFilter {
    if let Some(directive) = cli {
        match EnvFilter::try_new(directive) {
            Ok(filter) => return filter,
            // No subscriber yet, so stderr is the only place this can go.
            Err(e) => eprintln!("Ignoring invalid --log-level '{directive}': {e}"),
        }
    }
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(configured.directive()))
}

pub fn init(cli: Option<&str>, configured: LogLevel) {
    tracing_subscriber::fmt()
        .with_env_filter(filter(cli, configured))
        .init();
}
