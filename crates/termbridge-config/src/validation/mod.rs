//! Full configuration validation.
//!
//! Validates numeric ranges and string fields, collecting every error
//! into a single `ConfigError::ValidationError`.

mod helpers;


use crate::schema::BridgeConfig;
use helpers::{validate_non_empty, validate_range};
use termbridge_common::ConfigError;

/// Largest transcript the bridge will keep (16 MiB).
pub const MAX_TRANSCRIPT_BYTES: u32 = 16 * 1024 * 1024;

/// Run all validations on a config, collecting all errors.
pub fn validate(config: &BridgeConfig) -> Result<(), ConfigError> {
    let mut errors: Vec<String> = Vec::new();

    // Session
    let session = &config.session;
    validate_range(&mut errors, "session.default_rows", session.default_rows.into(), 1, 500);
    validate_range(&mut errors, "session.default_cols", session.default_cols.into(), 1, 500);
    validate_range(
        &mut errors,
        "session.output_queue_depth",
        session.output_queue_depth,
        1,
        4096,
    );
    validate_range(
        &mut errors,
        "session.transcript_bytes",
        session.transcript_bytes,
        0,
        MAX_TRANSCRIPT_BYTES,
    );
    validate_range(&mut errors, "session.event_capacity", session.event_capacity, 1, 1024);
    validate_range(
        &mut errors,
        "session.flush_timeout_ms",
        session.flush_timeout_ms,
        0,
        60_000,
    );

    // Shell
    validate_non_empty(&mut errors, "shell.term", &config.shell.term);
    validate_range(
        &mut errors,
        "shell.read_chunk_bytes",
        config.shell.read_chunk_bytes,
        512,
        65_536,
    );

    // Server
    validate_non_empty(&mut errors, "server.bind", &config.server.bind);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::ValidationError(errors.join("; ")))
    }
}
