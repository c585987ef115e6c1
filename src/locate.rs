//! Locate the installer's own directory.
//!
//! Every input the installer reads (templates under `helpers/`, the pip
//! manifest, the tree that gets deployed) lives next to the installer, so
//! the invoked path is chased through symlinks before taking its parent.

use anyhow::{bail, Context, Result};
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};

/// Maximum number of links followed before giving up (Linux MAXSYMLINKS).
pub const MAX_SYMLINK_HOPS: usize = 40;

/// Resolve the directory containing `invoked_path` after following every
/// symlink in the chain.
///
/// A relative `invoked_path` is anchored at `base_dir`. A relative link
/// target is resolved against the directory holding the link, never the
/// process working directory.
pub fn resolve_self_dir(invoked_path: &Path, base_dir: &Path) -> Result<PathBuf> {
    let mut current = if invoked_path.is_absolute() {
        invoked_path.to_path_buf()
    } else {
        base_dir.join(invoked_path)
    };

    let mut hops = 0;
    while current.is_symlink() {
        if hops == MAX_SYMLINK_HOPS {
            bail!(
                "Too many levels of symbolic links starting at {}",
                invoked_path.display()
            );
        }
        hops += 1;

        let target = fs::read_link(&current)
            .with_context(|| format!("Failed to read link {}", current.display()))?;
        current = if target.is_absolute() {
            target
        } else {
            let link_dir = current.parent().unwrap_or_else(|| Path::new("/"));
            link_dir.join(target)
        };
    }

    let parent = current
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .with_context(|| format!("{} has no parent directory", current.display()))?;

    fs::canonicalize(parent)
        .with_context(|| format!("Failed to canonicalize {}", parent.display()))
}

/// Resolve the source directory of the running executable.
///
/// Uses `argv[0]` when it names a path, falling back to the kernel's view
/// of the executable for bare names found via PATH.
pub fn resolve_current(argv0: Option<&OsStr>) -> Result<PathBuf> {
    let cwd = std::env::current_dir().context("Cannot read current directory")?;

    if let Some(arg) = argv0.map(Path::new).filter(|p| p.components().count() > 1) {
        return resolve_self_dir(arg, &cwd);
    }

    let exe = std::env::current_exe().context("Cannot determine the running executable")?;
    resolve_self_dir(&exe, &cwd)
}
