//! CLI command handlers.
//!
//! Each submodule handles a specific CLI command:
//! - `install` - Run the full installation pipeline
//! - `preflight` - Check the host and installer tree
//! - `render` - Render unit templates without installing
//! - `show` - Display configuration and managed units
//! - `status` - Query the init system for each managed unit

pub mod install;
mod preflight;
mod render;
pub mod show;
mod status;

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use crate::locate;

pub use install::{cmd_install, InstallArgs};
pub use preflight::cmd_preflight;
pub use render::cmd_render;
pub use show::cmd_show;
pub use status::cmd_status;

/// Installer tree: `--source` if given, otherwise the directory holding
/// the running executable.
pub fn resolve_source(source: Option<&Path>) -> Result<PathBuf> {
    match source {
        Some(dir) => fs::canonicalize(dir)
            .with_context(|| format!("Source directory {} not found", dir.display())),
        None => {
            let argv0 = std::env::args_os().next();
            locate::resolve_current(argv0.as_deref())
        }
    }
}
