//! Privilege guard.
//!
//! Installing packages and writing into the systemd unit directory needs
//! root. When started unprivileged, the installer re-runs itself through
//! the elevation command and exits with the child's status.

use anyhow::{Context, Result};
use nix::unistd::geteuid;
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};

use crate::process::{exit_code, Cmd};

/// Outcome of the privilege check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Privilege {
    /// Already running as root; continue in this process.
    Elevated,
    /// An elevated child ran the installation and exited with this code.
    Delegated(i32),
}

/// Elevation mechanism.
pub trait Elevator {
    /// True if the effective caller is the administrative identity.
    fn is_privileged(&self) -> bool;

    /// Run `program args...` with administrative rights and return its exit code.
    fn elevate(&self, program: &Path, args: &[OsString]) -> Result<i32>;
}

/// `sudo`-style elevation (any command that takes `<program> <args...>`).
pub struct Sudo {
    command: String,
}

impl Sudo {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }
}

impl Elevator for Sudo {
    fn is_privileged(&self) -> bool {
        geteuid().is_root()
    }

    fn elevate(&self, program: &Path, args: &[OsString]) -> Result<i32> {
        let status = Cmd::new(&self.command)
            .arg_path(program)
            .args(args)
            .allow_fail()
            .error_msg(format!("Elevation via '{}' failed", self.command))
            .run_interactive()?;
        Ok(exit_code(status))
    }
}

/// Ensure the rest of the pipeline runs with administrative rights.
///
/// Nothing else happens before this check. If elevation cannot even be
/// spawned the error propagates and the caller must exit non-zero.
pub fn ensure_privileged(
    elevator: &dyn Elevator,
    program: &Path,
    args: &[OsString],
) -> Result<Privilege> {
    if elevator.is_privileged() {
        return Ok(Privilege::Elevated);
    }

    println!("Not running as root, re-running with elevated privileges...");
    let code = elevator.elevate(program, args)?;
    Ok(Privilege::Delegated(code))
}

/// Path used to re-invoke the running installer.
///
/// `argv[0]` as invoked when it names a path, so a symlinked installer is
/// re-run through the same link. Bare names found via PATH fall back to
/// the running executable.
pub fn current_program(argv0: Option<&OsStr>) -> Result<PathBuf> {
    match argv0 {
        Some(arg) if Path::new(arg).components().count() > 1 => Ok(PathBuf::from(arg)),
        _ => std::env::current_exe().context("Cannot determine the running executable"),
    }
}
