//! Render command - renders unit templates without installing anything.

use anyhow::Result;
use std::path::{Path, PathBuf};

use crate::plan::{InstallPath, HELPERS_DIR, UNIT_TEMPLATES};
use crate::render::{render_unit, render_units};

/// Render both units for `install_path`, to `output` or stdout.
pub fn cmd_render(source_dir: &Path, install_path: PathBuf, output: Option<&Path>) -> Result<()> {
    let install_path = InstallPath::new(install_path)?;
    let helpers = source_dir.join(HELPERS_DIR);

    match output {
        Some(dir) => {
            render_units(&helpers, &UNIT_TEMPLATES, &install_path, dir)?;
        }
        None => {
            for name in UNIT_TEMPLATES {
                let unit = render_unit(&helpers.join(name), &install_path)?;
                println!("# {}", unit.name);
                print!("{}", unit.text);
                if !unit.text.ends_with('\n') {
                    println!();
                }
                println!();
            }
        }
    }
    Ok(())
}
