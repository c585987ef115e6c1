//! OS and interpreter package installation.
//!
//! The package manager is only ever driven through [`PackageManager`], so
//! the pipeline can run against a recording fake in tests.

pub mod piwheels;
pub mod runtime;

use anyhow::{Context, Result};

use crate::plan::PackageSpec;
use crate::process::Cmd;

pub use piwheels::{PiWheels, WheelIndex};
pub use runtime::{install_runtime_packages, Pip, PythonResolver};

/// OS package manager operations used by the installer.
pub trait PackageManager {
    fn clean(&self) -> Result<()>;
    fn update(&self) -> Result<()>;
    fn upgrade(&self) -> Result<()>;
    fn dist_upgrade(&self) -> Result<()>;
    fn install(&self, packages: &[String]) -> Result<()>;
    fn autoremove(&self) -> Result<()>;
}

/// apt-get, run non-interactively.
pub struct Apt {
    program: String,
}

impl Apt {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn cmd(&self, step: &str) -> Cmd {
        Cmd::new(&self.program)
            .env("DEBIAN_FRONTEND", "noninteractive")
            .arg(step)
            .error_msg(format!("{} {} failed", self.program, step))
    }
}

impl PackageManager for Apt {
    fn clean(&self) -> Result<()> {
        self.cmd("clean").run_interactive()?;
        Ok(())
    }

    fn update(&self) -> Result<()> {
        self.cmd("update").run_interactive()?;
        Ok(())
    }

    fn upgrade(&self) -> Result<()> {
        self.cmd("upgrade").arg("-y").run_interactive()?;
        Ok(())
    }

    fn dist_upgrade(&self) -> Result<()> {
        self.cmd("dist-upgrade").arg("-y").run_interactive()?;
        Ok(())
    }

    fn install(&self, packages: &[String]) -> Result<()> {
        if packages.is_empty() {
            return Ok(());
        }
        self.cmd("install")
            .arg("-y")
            .args(packages)
            .run_interactive()?;
        Ok(())
    }

    fn autoremove(&self) -> Result<()> {
        self.cmd("autoremove").arg("-y").run_interactive()?;
        Ok(())
    }
}

/// Refresh, upgrade, and install the OS package list.
///
/// Clean, update and both upgrades are best-effort: a failure is reported
/// and the run continues. The install step is fatal because every later
/// stage depends on those packages.
pub fn install_os_packages(pm: &dyn PackageManager, spec: &PackageSpec) -> Result<()> {
    let refresh: [(&str, &dyn Fn() -> Result<()>); 4] = [
        ("clean", &|| pm.clean()),
        ("update", &|| pm.update()),
        ("upgrade", &|| pm.upgrade()),
        ("dist-upgrade", &|| pm.dist_upgrade()),
    ];

    for (step, run) in refresh {
        println!("  Package manager: {}...", step);
        if let Err(e) = run() {
            eprintln!("  [WARN] {} failed, continuing: {:#}", step, e);
        }
    }

    println!("  Installing {} OS packages...", spec.os_packages.len());
    pm.install(&spec.os_packages)
        .context("Installing OS packages failed")?;

    if let Err(e) = pm.autoremove() {
        eprintln!("  [WARN] autoremove failed, continuing: {:#}", e);
    }

    Ok(())
}
