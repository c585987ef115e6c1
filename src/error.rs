//! Stage-labeled installer errors.
//!
//! Each pipeline stage fails with its own variant so the console message
//! names the stage. The underlying cause stays an `anyhow::Error` and keeps
//! any [`CommandError`](crate::process::CommandError) reachable for the exit
//! code.

use std::fmt;

use thiserror::Error;

use crate::process::failed_exit_code;

/// Step of the service activation sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivationStep {
    Stop,
    Permissions,
    DaemonReload,
    Enable,
    Start,
}

impl fmt::Display for ActivationStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ActivationStep::Stop => "stop",
            ActivationStep::Permissions => "chmod",
            ActivationStep::DaemonReload => "daemon-reload",
            ActivationStep::Enable => "enable",
            ActivationStep::Start => "start",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum InstallError {
    #[error("cannot obtain administrative rights")]
    Privilege(#[source] anyhow::Error),

    #[error("cannot locate the installer directory")]
    Resolution(#[source] anyhow::Error),

    #[error("installation path rejected: {0}")]
    InvalidPath(String),

    #[error("package installation failed")]
    Package(#[source] anyhow::Error),

    #[error("copying files to the installation path failed")]
    Deploy(#[source] anyhow::Error),

    #[error("rendering service unit templates failed")]
    Template(#[source] anyhow::Error),

    #[error("service activation failed at step '{step}'{}", unit_suffix(.unit))]
    Activation {
        step: ActivationStep,
        unit: Option<String>,
        #[source]
        source: anyhow::Error,
    },
}

fn unit_suffix(unit: &Option<String>) -> String {
    unit.as_ref()
        .map(|u| format!(" for {}", u))
        .unwrap_or_default()
}

impl InstallError {
    /// Process exit status to report for this failure.
    ///
    /// The exit code of the failing external command when there is one,
    /// otherwise 1.
    pub fn exit_code(&self) -> i32 {
        let source = match self {
            InstallError::Privilege(e)
            | InstallError::Resolution(e)
            | InstallError::Package(e)
            | InstallError::Deploy(e)
            | InstallError::Template(e) => e,
            InstallError::Activation { source, .. } => source,
            InstallError::InvalidPath(_) => return 1,
        };
        match failed_exit_code(source) {
            Some(0) | None => 1,
            Some(code) => code,
        }
    }

    /// Short stage label used in console output.
    pub fn stage(&self) -> &'static str {
        match self {
            InstallError::Privilege(_) => "privilege",
            InstallError::Resolution(_) => "locate",
            InstallError::InvalidPath(_) => "validate",
            InstallError::Package(_) => "packages",
            InstallError::Deploy(_) => "deploy",
            InstallError::Template(_) => "render",
            InstallError::Activation { .. } => "activate",
        }
    }
}

pub type Result<T> = std::result::Result<T, InstallError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::CommandError;

    fn command_failure(code: i32) -> anyhow::Error {
        anyhow::Error::new(CommandError {
            program: "systemctl".into(),
            message: "'systemctl' failed".into(),
            code,
            stderr: String::new(),
        })
    }

    #[test]
    fn test_exit_code_from_command() {
        let err = InstallError::Package(command_failure(100).context("apt-get install"));
        assert_eq!(err.exit_code(), 100);
    }

    #[test]
    fn test_exit_code_defaults_to_one() {
        let err = InstallError::Deploy(anyhow::anyhow!("disk full"));
        assert_eq!(err.exit_code(), 1);
        assert_eq!(InstallError::InvalidPath("empty".into()).exit_code(), 1);
    }

    #[test]
    fn test_activation_message_names_step_and_unit() {
        let err = InstallError::Activation {
            step: ActivationStep::Enable,
            unit: Some("wifisetup.service".into()),
            source: command_failure(1),
        };
        assert_eq!(
            err.to_string(),
            "service activation failed at step 'enable' for wifisetup.service"
        );

        let err = InstallError::Activation {
            step: ActivationStep::DaemonReload,
            unit: None,
            source: command_failure(1),
        };
        assert_eq!(
            err.to_string(),
            "service activation failed at step 'daemon-reload'"
        );
    }
}
