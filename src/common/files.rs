//! File writes with explicit Unix permissions.

use anyhow::{Context, Result};
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;

/// Write a file with specific Unix permissions, creating parent directories
/// as needed.
///
/// The mode is applied after writing, so an existing file with looser or
/// tighter bits ends up with exactly `mode`.
pub fn write_file_mode<P: AsRef<Path>, C: AsRef<[u8]>>(
    path: P,
    content: C,
    mode: u32,
) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Cannot create {}", parent.display()))?;
    }
    fs::write(path, content)?;
    set_mode(path, mode)
}

/// Set the permission bits of an existing file.
pub fn set_mode(path: &Path, mode: u32) -> Result<()> {
    fs::set_permissions(path, fs::Permissions::from_mode(mode))
        .with_context(|| format!("Cannot chmod {:o} {}", mode, path.display()))
}
