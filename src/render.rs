//! Render systemd unit templates.
//!
//! Templates are ordinary unit files with `${path}` wherever the
//! installation directory belongs.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use crate::common::write_file_mode;
use crate::plan::InstallPath;

/// Placeholder replaced with the installation path.
pub const PATH_TOKEN: &str = "${path}";

/// Permission bits for rendered unit files.
pub const UNIT_MODE: u32 = 0o644;

/// A unit rendered in memory, not yet written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedUnit {
    /// Unit name, same as the template's file name.
    pub name: String,
    pub text: String,
}

impl RenderedUnit {
    /// Where this unit lives inside `unit_dir`.
    pub fn path_in(&self, unit_dir: &Path) -> PathBuf {
        unit_dir.join(&self.name)
    }
}

/// Replace every `${path}` in `template` with `install_path`.
pub fn render_template(template: &str, install_path: &str) -> String {
    template.replace(PATH_TOKEN, install_path)
}

/// Read one template and render it.
pub fn render_unit(template_path: &Path, install_path: &InstallPath) -> Result<RenderedUnit> {
    let name = template_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .with_context(|| format!("{} is not a file", template_path.display()))?;
    let template = fs::read_to_string(template_path)
        .with_context(|| format!("Cannot read unit template {}", template_path.display()))?;

    Ok(RenderedUnit {
        name,
        text: render_template(&template, install_path.as_str()),
    })
}

/// Render every template, then write them all into `unit_dir`.
///
/// Nothing is written unless every template renders, so a missing
/// template never leaves a half-registered service set behind.
pub fn render_units(
    helpers_dir: &Path,
    templates: &[&str],
    install_path: &InstallPath,
    unit_dir: &Path,
) -> Result<Vec<RenderedUnit>> {
    let rendered = templates
        .iter()
        .map(|name| render_unit(&helpers_dir.join(name), install_path))
        .collect::<Result<Vec<_>>>()?;

    for unit in &rendered {
        let dest = unit.path_in(unit_dir);
        write_file_mode(&dest, &unit.text, UNIT_MODE)
            .with_context(|| format!("Cannot write {}", dest.display()))?;
        println!("  Wrote {}", dest.display());
    }

    Ok(rendered)
}
