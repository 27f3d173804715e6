//! Configuration schema types for termbridge.
//!
//! All structs use `serde(default)` so partial configs work correctly.

mod server;
mod session;
mod shell;
mod system;

pub use server::*;
pub use session::*;
pub use shell::*;
pub use system::*;

use serde::{Deserialize, Serialize};

/// Current config schema version.
pub const CONFIG_SCHEMA_VERSION: u32 = 1;

/// Root configuration for termbridge.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct BridgeConfig {
    pub session: SessionConfig,
    pub shell: ShellConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
}

// =============================================================================
// Tests
// =============================================================================
