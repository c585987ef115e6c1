//! Preflight checks for an installation.
//!
//! Validates host tools, the installer tree and the unit directory before
//! anything is changed. Run with `nw-install preflight`.

mod environment;
mod host_tools;
mod types;

use std::path::Path;

use anyhow::{bail, Result};

use crate::config::Config;

pub use types::{CheckResult, CheckStatus, PreflightReport};

/// Run all preflight checks.
pub fn run_preflight(source_dir: &Path, config: &Config) -> PreflightReport {
    let mut checks = Vec::new();

    println!("Running preflight checks...\n");

    println!("Checking host tools...");
    checks.extend(host_tools::check_host_tools(config));

    println!("Checking installer tree...");
    checks.extend(environment::check_source_tree(source_dir));

    println!("Checking unit directory...");
    checks.push(environment::check_unit_dir(&config.unit_dir));

    println!();

    PreflightReport { checks }
}

/// Run preflight and bail if any checks fail.
pub fn run_preflight_or_fail(source_dir: &Path, config: &Config) -> Result<()> {
    let report = run_preflight(source_dir, config);
    report.print();

    if !report.all_passed() {
        bail!(
            "Preflight failed: {} check(s) failed. Fix the issues above before installing.",
            report.fail_count()
        );
    }

    println!("All preflight checks passed!\n");
    Ok(())
}
