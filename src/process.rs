//! Centralized command execution with consistent error handling.
//!
//! Every external program the installer touches (apt-get, pip, systemctl,
//! sudo, curl) goes through [`Cmd`], so failures always carry the program
//! name, its exit code and its stderr.

use anyhow::{Context, Result};
use std::ffi::{OsStr, OsString};
use std::fmt;
use std::path::Path;
use std::process::{Command, ExitStatus, Stdio};

/// Result of a command execution.
#[derive(Debug, Clone)]
pub struct CommandResult {
    /// Exit status of the command.
    pub status: ExitStatus,
    /// Captured stdout as a string.
    pub stdout: String,
    /// Captured stderr as a string.
    pub stderr: String,
}

impl CommandResult {
    /// Returns true if the command exited successfully.
    pub fn success(&self) -> bool {
        self.status.success()
    }

    /// Get the exit code, mapping signal termination to `128 + signal`.
    pub fn code(&self) -> i32 {
        exit_code(self.status)
    }

    /// Get stdout, trimmed of whitespace.
    pub fn stdout_trimmed(&self) -> &str {
        self.stdout.trim()
    }
}

/// A command that ran and exited non-zero.
///
/// Kept as a concrete type so the exit code survives being wrapped in
/// `anyhow` context and can be forwarded as the process exit status.
#[derive(Debug, Clone)]
pub struct CommandError {
    pub program: String,
    pub message: String,
    pub code: i32,
    pub stderr: String,
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.stderr.is_empty() {
            write!(f, "{} (exit code {})", self.message, self.code)
        } else {
            write!(f, "{} (exit code {}):\n{}", self.message, self.code, self.stderr)
        }
    }
}

impl std::error::Error for CommandError {}

/// Convert an exit status into a shell-style exit code.
pub fn exit_code(status: ExitStatus) -> i32 {
    use std::os::unix::process::ExitStatusExt;

    match (status.code(), status.signal()) {
        (Some(code), _) => code,
        (None, Some(signal)) => 128 + signal,
        (None, None) => 1,
    }
}

/// Builder for configuring command execution.
///
/// Arguments are kept as `OsString` so paths and forwarded arguments reach
/// the child byte for byte, whatever their encoding.
#[derive(Debug, Clone)]
pub struct Cmd {
    program: String,
    args: Vec<OsString>,
    envs: Vec<(String, String)>,
    /// If true, don't fail on non-zero exit.
    allow_fail: bool,
    /// Custom error message prefix.
    error_prefix: Option<String>,
}

impl Cmd {
    /// Create a new command builder.
    pub fn new(program: impl AsRef<str>) -> Self {
        Self {
            program: program.as_ref().to_string(),
            args: Vec::new(),
            envs: Vec::new(),
            allow_fail: false,
            error_prefix: None,
        }
    }

    /// Add a single argument.
    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    /// Add multiple arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        for arg in args {
            self.args.push(arg.as_ref().to_os_string());
        }
        self
    }

    /// Add a path as an argument.
    pub fn arg_path(self, path: &Path) -> Self {
        self.arg(path)
    }

    /// Set an environment variable for the child only.
    pub fn env(mut self, key: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        self.envs
            .push((key.as_ref().to_string(), value.as_ref().to_string()));
        self
    }

    /// Allow non-zero exit codes without failing.
    pub fn allow_fail(mut self) -> Self {
        self.allow_fail = true;
        self
    }

    /// Set a custom error message prefix.
    pub fn error_msg(mut self, msg: impl AsRef<str>) -> Self {
        self.error_prefix = Some(msg.as_ref().to_string());
        self
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        for (key, value) in &self.envs {
            cmd.env(key, value);
        }
        cmd
    }

    fn failure(&self, code: i32, stderr: &str) -> CommandError {
        CommandError {
            program: self.program.clone(),
            message: self
                .error_prefix
                .clone()
                .unwrap_or_else(|| format!("'{}' failed", self.program)),
            code,
            stderr: stderr.trim().to_string(),
        }
    }

    /// Run the command and capture output.
    pub fn run(self) -> Result<CommandResult> {
        tracing::debug!(program = %self.program, args = ?self.args, "running command");

        let output = self.command().output().with_context(|| {
            format!("Failed to execute '{}'. Is it installed?", self.program)
        })?;

        let result = CommandResult {
            status: output.status,
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };

        if !self.allow_fail && !result.success() {
            return Err(self.failure(result.code(), &result.stderr).into());
        }

        Ok(result)
    }

    /// Run the command with inherited stdio (interactive/streaming).
    ///
    /// Output goes directly to the terminal. Use for long-running commands
    /// where the user should see progress (apt-get, pip).
    pub fn run_interactive(self) -> Result<ExitStatus> {
        tracing::debug!(program = %self.program, args = ?self.args, "running interactive command");

        let mut cmd = self.command();
        cmd.stdin(Stdio::inherit());
        cmd.stdout(Stdio::inherit());
        cmd.stderr(Stdio::inherit());

        let status = cmd.status().with_context(|| {
            format!("Failed to execute '{}'. Is it installed?", self.program)
        })?;

        if !self.allow_fail && !status.success() {
            return Err(self.failure(exit_code(status), "").into());
        }

        Ok(status)
    }
}

/// Find the exit code of the first failed command in an error chain.
pub fn failed_exit_code(err: &anyhow::Error) -> Option<i32> {
    err.chain()
        .find_map(|cause| cause.downcast_ref::<CommandError>())
        .map(|failure| failure.code)
}

/// Full path of `program` if it is on PATH.
pub fn which(program: &str) -> Option<String> {
    which::which(program)
        .ok()
        .map(|path| path.to_string_lossy().into_owned())
}

// =============================================================================
// Tests
// =============================================================================
