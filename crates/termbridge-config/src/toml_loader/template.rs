//! Default TOML config template with inline documentation comments.

/// Generate the default TOML config content with comments.
pub(crate) fn default_config_toml() -> String {
    r##"# termbridge configuration
# Schema version 1
# Only override what you want to change -- missing fields use defaults.

[session]
# default_rows = 24          # 1-500
# default_cols = 80          # 1-500
# output_queue_depth = 64    # 1-4096 chunks buffered ahead of the display
# transcript_bytes = 262144  # 0-16777216, 0 disables repaint history
# event_capacity = 64        # 1-1024
# closed_banner = true
# flush_timeout_ms = 2000    # 0-60000

[shell]
# program = ""               # empty = $SHELL, falling back to /bin/sh
# args = []
# working_directory = "~/src"
# login_shell = true
# term = "xterm-256color"
# read_chunk_bytes = 8192    # 512-65536

[shell.env]
# EDITOR = "nvim"

[server]
# bind = "127.0.0.1"
# port = 7681

[logging]
# level = "INFO"             # DEBUG, INFO, WARNING, ERROR
"##
    .to_string()
}
