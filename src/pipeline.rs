//! The installation pipeline (packages, deploy, render, activate).
//!
//! Privilege and self-location happen before an [`InstallPlan`] exists, in
//! the `install` command. Everything here runs strictly in order and stops
//! at the first failing stage.

use std::path::PathBuf;

use crate::activate::{activate, InitSystem};
use crate::deploy::{deploy, verify_deployment, DeployReport};
use crate::error::{InstallError, Result};
use crate::packages::{
    install_os_packages, install_runtime_packages, PackageManager, PythonResolver, WheelIndex,
};
use crate::plan::{InstallPlan, HELPERS_DIR, UNIT_TEMPLATES};
use crate::render::{render_units, RenderedUnit};
use crate::timing::Timer;

/// External systems the pipeline drives.
pub struct Installer<'a> {
    pub packages: &'a dyn PackageManager,
    pub wheels: &'a dyn WheelIndex,
    pub python: &'a dyn PythonResolver,
    pub init: &'a dyn InitSystem,
    /// Directory rendered units are written to.
    pub unit_dir: PathBuf,
}

/// What a successful run did.
#[derive(Debug, Clone)]
pub struct InstallReport {
    pub deploy: DeployReport,
    pub units: Vec<RenderedUnit>,
}

impl Installer<'_> {
    /// Run stages 3 through 7 for `plan`.
    pub fn run(&self, plan: &InstallPlan) -> Result<InstallReport> {
        if plan.skip_packages {
            println!("Skipping package installation (--skip-packages)\n");
        } else {
            println!("Installing OS packages...");
            let timer = Timer::start("OS packages");
            install_os_packages(self.packages, &plan.packages).map_err(InstallError::Package)?;
            timer.finish();

            println!("\nInstalling Python packages...");
            let timer = Timer::start("Python packages");
            install_runtime_packages(
                self.wheels,
                self.python,
                &plan.packages.python_packages,
                plan.packages.prefer_binary,
                &plan.requirements(),
            )
            .map_err(InstallError::Package)?;
            timer.finish();
            println!();
        }

        println!(
            "Copying {} to {}...",
            plan.source_dir.display(),
            plan.install_path
        );
        let timer = Timer::start("Deploy");
        let report = deploy(&plan.source_dir, plan.install_path.as_path())
            .map_err(InstallError::Deploy)?;
        if report.files > 0 {
            let checked = verify_deployment(&plan.source_dir, &report.destination)
                .map_err(InstallError::Deploy)?;
            println!(
                "  Copied and verified {} files ({} directories, {} symlinks)",
                checked, report.dirs, report.symlinks
            );
        }
        if report.removed > 0 {
            println!("  Removed {} entries no longer in the source", report.removed);
        }
        timer.finish();

        println!("\nRendering service units...");
        let timer = Timer::start("Render");
        let helpers = report.destination.join(HELPERS_DIR);
        let units = render_units(&helpers, &UNIT_TEMPLATES, &plan.install_path, &self.unit_dir)
            .map_err(InstallError::Template)?;
        timer.finish();

        println!("\nActivating services...");
        let timer = Timer::start("Activate");
        activate(self.init, &units, &self.unit_dir)?;
        timer.finish();

        Ok(InstallReport {
            deploy: report,
            units,
        })
    }
}
