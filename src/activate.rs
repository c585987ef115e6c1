//! Register and start rendered units with systemd.

use anyhow::Result;
use std::path::Path;

use crate::common::set_mode;
use crate::error::{ActivationStep, InstallError};
use crate::process::Cmd;
use crate::render::{RenderedUnit, UNIT_MODE};

/// Init system control surface.
pub trait InitSystem {
    fn stop(&self, unit: &str) -> Result<()>;
    fn daemon_reload(&self) -> Result<()>;
    fn enable(&self, unit: &str) -> Result<()>;
    fn start(&self, unit: &str) -> Result<()>;
    /// Current state as reported by the init system ("active", "inactive", ...).
    fn is_active(&self, unit: &str) -> Result<String>;
}

/// systemctl on the host.
pub struct Systemctl {
    program: String,
}

impl Systemctl {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn unit_cmd(&self, verb: &str, unit: &str) -> Result<()> {
        Cmd::new(&self.program)
            .args([verb, unit])
            .error_msg(format!("systemctl {} {} failed", verb, unit))
            .run()?;
        Ok(())
    }
}

impl InitSystem for Systemctl {
    fn stop(&self, unit: &str) -> Result<()> {
        self.unit_cmd("stop", unit)
    }

    fn daemon_reload(&self) -> Result<()> {
        Cmd::new(&self.program)
            .arg("daemon-reload")
            .error_msg("systemctl daemon-reload failed")
            .run()?;
        Ok(())
    }

    fn enable(&self, unit: &str) -> Result<()> {
        self.unit_cmd("enable", unit)
    }

    fn start(&self, unit: &str) -> Result<()> {
        self.unit_cmd("start", unit)
    }

    fn is_active(&self, unit: &str) -> Result<String> {
        // is-active exits non-zero for anything but "active"; the state is on stdout.
        let out = Cmd::new(&self.program)
            .args(["is-active", unit])
            .allow_fail()
            .run()?;
        let state = out.stdout_trimmed();
        Ok(if state.is_empty() {
            "unknown".to_string()
        } else {
            state.to_string()
        })
    }
}

/// Stop, chmod, reload, enable and start the rendered units.
///
/// Stop failures are ignored so first-time installs, where no unit exists
/// yet, go through. Every later step is fatal and reports which step and
/// unit failed. Reload must precede enable, and enable must precede start.
pub fn activate(
    init: &dyn InitSystem,
    units: &[RenderedUnit],
    unit_dir: &Path,
) -> std::result::Result<(), InstallError> {
    for unit in units {
        match init.stop(&unit.name) {
            Ok(()) => println!("  Stopped {}", unit.name),
            Err(e) => tracing::debug!(unit = %unit.name, error = %e, "stop ignored"),
        }
    }

    for unit in units {
        set_mode(&unit.path_in(unit_dir), UNIT_MODE)
            .map_err(|source| unit_failure(ActivationStep::Permissions, unit, source))?;
    }

    init.daemon_reload()
        .map_err(|source| InstallError::Activation {
            step: ActivationStep::DaemonReload,
            unit: None,
            source,
        })?;

    for unit in units {
        init.enable(&unit.name)
            .map_err(|source| unit_failure(ActivationStep::Enable, unit, source))?;
        println!("  Enabled {}", unit.name);
    }

    for unit in units {
        init.start(&unit.name)
            .map_err(|source| unit_failure(ActivationStep::Start, unit, source))?;
        println!("  Started {}", unit.name);
    }

    Ok(())
}

fn unit_failure(step: ActivationStep, unit: &RenderedUnit, source: anyhow::Error) -> InstallError {
    InstallError::Activation {
        step,
        unit: Some(unit.name.clone()),
        source,
    }
}


#[cfg(test)]
mod tests {
    use super::fakes::FakeInit;
    use super::*;
    use std::fs;
    use std::os::unix::fs::PermissionsExt;
    use tempfile::TempDir;

    fn units(dir: &Path) -> Vec<RenderedUnit> {
        ["python.naturewatch.service", "wifisetup.service"]
            .iter()
            .map(|name| {
                fs::write(dir.join(name), "[Unit]\n").unwrap();
                fs::set_permissions(dir.join(name), fs::Permissions::from_mode(0o600)).unwrap();
                RenderedUnit {
                    name: name.to_string(),
                    text: "[Unit]\n".into(),
                }
            })
            .collect()
    }

    #[test]
    fn test_first_install_sequence() {
        let temp = TempDir::new().unwrap();
        let units = units(temp.path());
        let init = FakeInit::default();

        activate(&init, &units, temp.path()).unwrap();

        assert_eq!(
            *init.log.borrow(),
            vec![
                "stop python.naturewatch.service",
                "stop wifisetup.service",
                "daemon-reload",
                "enable python.naturewatch.service",
                "enable wifisetup.service",
                "start python.naturewatch.service",
                "start wifisetup.service",
            ]
        );
        let mode = fs::metadata(temp.path().join("wifisetup.service"))
            .unwrap()
            .permissions()
            .mode();
        assert_eq!(mode & 0o777, 0o644);
        assert_eq!(init.is_active("wifisetup.service").unwrap(), "active");
    }

    #[test]
    fn test_enable_failure_names_step_and_unit() {
        let temp = TempDir::new().unwrap();
        let units = units(temp.path());
        let init = FakeInit {
            fail_on: Some("enable wifisetup.service".into()),
            ..Default::default()
        };

        let err = activate(&init, &units, temp.path()).unwrap_err();

        match err {
            InstallError::Activation { step, unit, .. } => {
                assert_eq!(step, ActivationStep::Enable);
                assert_eq!(unit.as_deref(), Some("wifisetup.service"));
            }
            other => panic!("unexpected error: {}", other),
        }
        assert!(!init.log.borrow().iter().any(|e| e.starts_with("start")));
    }

    #[test]
    fn test_missing_unit_file_fails_before_reload() {
        let temp = TempDir::new().unwrap();
        let init = FakeInit::default();
        let ghost = vec![RenderedUnit {
            name: "ghost.service".into(),
            text: String::new(),
        }];

        let err = activate(&init, &ghost, temp.path()).unwrap_err();

        assert!(matches!(
            err,
            InstallError::Activation {
                step: ActivationStep::Permissions,
                ..
            }
        ));
        assert!(!init.log.borrow().contains(&"daemon-reload".to_string()));
    }

    #[test]
    fn test_systemctl_is_active_reads_stdout() {
        let init = Systemctl::new("echo");
        // `echo is-active foo` prints the args back; good enough to exercise parsing.
        assert_eq!(init.is_active("foo").unwrap(), "is-active foo");
    }
}
