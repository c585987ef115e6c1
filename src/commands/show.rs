//! Show command - displays information.

use anyhow::Result;
use std::path::Path;

use crate::config::Config;
use crate::plan::{HELPERS_DIR, UNIT_TEMPLATES};

/// Show target for the show command.
pub enum ShowTarget {
    /// Show configuration
    Config,
    /// Show managed units and where they are written
    Units,
}

/// Execute the show command.
pub fn cmd_show(source_dir: &Path, target: ShowTarget, config: &Config) -> Result<()> {
    match target {
        ShowTarget::Config => {
            println!("Installer tree: {}", source_dir.display());
            config.print();
        }
        ShowTarget::Units => {
            for name in UNIT_TEMPLATES {
                let template = source_dir.join(HELPERS_DIR).join(name);
                let marker = if template.is_file() { "" } else { " (template missing)" };
                println!(
                    "  {} -> {}{}",
                    template.display(),
                    config.unit_dir.join(name).display(),
                    marker
                );
            }
        }
    }
    Ok(())
}
