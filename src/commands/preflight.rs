//! Preflight command - runs preflight checks.

use anyhow::Result;
use std::path::Path;

use crate::config::Config;
use crate::preflight;

/// Execute the preflight command.
pub fn cmd_preflight(source_dir: &Path, config: &Config, strict: bool) -> Result<()> {
    if strict {
        preflight::run_preflight_or_fail(source_dir, config)?;
    } else {
        let report = preflight::run_preflight(source_dir, config);
        report.print();
        if !report.all_passed() {
            println!("Some checks failed. Use --strict to exit non-zero.");
        }
    }
    Ok(())
}
