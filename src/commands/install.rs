//! Install command - the full provisioning run.

use std::ffi::OsString;
use std::path::PathBuf;

use crate::activate::{InitSystem, Systemctl};
use crate::config::{self, Config};
use crate::error::{InstallError, Result};
use crate::packages::{Apt, Pip, PiWheels};
use crate::pipeline::Installer;
use crate::plan::{InstallPath, InstallPlan};
use crate::privilege::{self, Privilege, Sudo};

/// Options for one installation run.
#[derive(Debug, Clone)]
pub struct InstallArgs {
    pub install_path: PathBuf,
    /// Installer tree override; defaults to the executable's directory.
    pub source: Option<PathBuf>,
    pub skip_packages: bool,
    /// Run as the current user even if it is not root.
    pub no_elevate: bool,
}

/// Execute the install command and return the process exit code.
///
/// `argv` is the original command line. When this process is not root the
/// elevated child is started through `argv[0]` with the rest unchanged.
pub fn cmd_install(args: &InstallArgs, argv: &[OsString]) -> Result<i32> {
    // Stage 1. The .env file lives in the not-yet-located tree, so the
    // elevation command comes from the process environment only.
    if !args.no_elevate {
        let env_config = Config::from_vars(&config::process_vars());
        let elevator = Sudo::new(env_config.elevate);
        let program = privilege::current_program(argv.first().map(OsString::as_os_str))
            .map_err(InstallError::Privilege)?;
        let forwarded = argv.get(1..).unwrap_or(&[]);

        match privilege::ensure_privileged(&elevator, &program, forwarded)
            .map_err(InstallError::Privilege)?
        {
            Privilege::Elevated => {}
            Privilege::Delegated(code) => return Ok(code),
        }
    }

    // Stage 2.
    let source_dir =
        super::resolve_source(args.source.as_deref()).map_err(InstallError::Resolution)?;
    let config = Config::load(&source_dir);
    tracing::debug!(source = %source_dir.display(), ?config, "resolved installer");

    let install_path = InstallPath::new(args.install_path.clone())?;
    let mut plan = InstallPlan::new(source_dir, install_path);
    plan.skip_packages = args.skip_packages;

    println!("=== Installing Naturewatch camera server ===");
    println!("  Source:      {}", plan.source_dir.display());
    println!("  Destination: {}", plan.deployed_dir().display());
    println!("  Units:       {}\n", config.unit_dir.display());

    let apt = Apt::new(&config.apt);
    let wheels = PiWheels::from_config(&config);
    let pip = Pip::new(&config.pip);
    let init = Systemctl::new(&config.systemctl);

    let installer = Installer {
        packages: &apt,
        wheels: &wheels,
        python: &pip,
        init: &init,
        unit_dir: config.unit_dir.clone(),
    };
    let report = installer.run(&plan)?;

    println!("\nService status:");
    for unit in &report.units {
        let state = init
            .is_active(&unit.name)
            .unwrap_or_else(|e| format!("unknown ({})", e));
        println!("  {:<32} {}", unit.name, state);
    }

    println!("\nInstallation complete: {}", report.deploy.destination.display());
    Ok(0)
}
