//! `[shell]`: the process the PTY transport launches.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// What to run for each new channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ShellConfig {
    /// Empty means `$SHELL` (or `/bin/sh`).
    pub program: String,
    pub args: Vec<String>,
    /// Starting directory; the server's own when unset.
    pub working_directory: Option<String>,
    /// Set after the inherited allow-list, so these win.
    pub env: HashMap<String, String>,
    /// Pass `-l` when no explicit `args` are given.
    pub login_shell: bool,
    pub term: String,
    /// Read buffer size for the PTY master (512-65536).
    pub read_chunk_bytes: u32,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            program: String::new(),
            args: Vec::new(),
            working_directory: None,
            env: HashMap::new(),
            login_shell: true,
            term: "xterm-256color".into(),
            read_chunk_bytes: 8_192,
        }
    }
}
