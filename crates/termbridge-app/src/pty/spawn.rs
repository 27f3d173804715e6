//! Shell launch description: which program, which arguments, which environment.

use portable_pty::CommandBuilder;
use termbridge_config::ShellConfig;

// =============================================================================
// SHELL DETECTION
// =============================================================================

/// Get the user's default shell.
///
/// - Unix: reads `$SHELL`, falls back to `/bin/sh`
/// - Windows: reads `$COMSPEC`, falls back to `cmd.exe`
pub fn default_shell() -> String {
    #[cfg(unix)]
    {
        std::env::var("SHELL").unwrap_or_else(|_| "/bin/sh".to_string())
    }
    #[cfg(windows)]
    {
        std::env::var("COMSPEC").unwrap_or_else(|_| "cmd.exe".to_string())
    }
}

// =============================================================================
// ENVIRONMENT SANITIZATION
// =============================================================================

/// Variables inherited from the server's own environment. Everything else is
/// dropped so server-side secrets never reach a browser user's shell.
const ALLOWED_ENV_VARS: &[&str] = &[
    "HOME",
    "USER",
    "LOGNAME",
    "SHELL",
    "PATH",
    "LANG",
    "LC_ALL",
    "LC_CTYPE",
    "TMPDIR",
    "TMP",
    "TEMP",
    // Windows-specific
    "USERPROFILE",
    "APPDATA",
    "LOCALAPPDATA",
    "SYSTEMROOT",
    "COMSPEC",
    "HOMEDRIVE",
    "HOMEPATH",
];

// =============================================================================
// LAUNCH
// =============================================================================

/// Everything needed to start one shell process. Shared by every channel
/// the server opens.
#[derive(Debug, Clone)]
pub struct ShellLaunch {
    shell: ShellConfig,
    execute: Option<String>,
}

impl ShellLaunch {
    pub fn new(shell: ShellConfig, execute: Option<String>) -> Self {
        Self { shell, execute }
    }

    pub fn program(&self) -> String {
        if self.shell.program.is_empty() {
            default_shell()
        } else {
            self.shell.program.clone()
        }
    }

    /// Name shown in titles and in the closed banner.
    pub fn label(&self) -> String {
        if let Some(command) = &self.execute {
            return command.clone();
        }
        let program = self.program();
        program
            .rsplit(['/', '\\'])
            .next()
            .unwrap_or(&program)
            .to_string()
    }

    pub fn read_chunk_bytes(&self) -> usize {
        self.shell.read_chunk_bytes as usize
    }

    pub fn argv(&self) -> Vec<String> {
        let mut argv = vec![self.program()];
        if let Some(command) = &self.execute {
            #[cfg(unix)]
            argv.push("-c".into());
            #[cfg(windows)]
            argv.push("/C".into());
            argv.push(command.clone());
            return argv;
        }

        argv.extend(self.shell.args.iter().cloned());
        // A login shell loads .profile and friends, like a remote login would.
        if cfg!(unix) && self.shell.login_shell && self.shell.args.is_empty() {
            argv.push("-l".into());
        }
        argv
    }

    /// Sanitized environment: allow-listed variables, then `TERM`, then the
    /// configured extras.
    pub fn env(&self) -> Vec<(String, String)> {
        let mut env: Vec<(String, String)> = ALLOWED_ENV_VARS
            .iter()
            .filter_map(|key| std::env::var(key).ok().map(|val| (key.to_string(), val)))
            .collect();
        env.push(("TERM".into(), self.shell.term.clone()));
        env.extend(
            self.shell
                .env
                .iter()
                .map(|(key, val)| (key.clone(), val.clone())),
        );
        env
    }

    pub(super) fn command(&self) -> CommandBuilder {
        let mut cmd = CommandBuilder::from_argv(self.argv().into_iter().map(Into::into).collect());
        cmd.env_clear();
        for (key, val) in self.env() {
            cmd.env(key, val);
        }
        if let Some(dir) = &self.shell.working_directory {
            cmd.cwd(dir);
        }
        cmd
    }
}

// =============================================================================
// TESTS
// =============================================================================
