//! Copy the installer tree into the installation path.
//!
//! The tree lands at `<install_path>/<basename of source>` and replaces any
//! earlier copy there: files are overwritten and entries the source no
//! longer has are removed. Symlinks are recreated rather than followed.

use anyhow::{bail, Context, Result};
use sha2::{Digest, Sha256};
use std::fs;
use std::io;
use std::os::unix::fs::symlink;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// What a deployment copied.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DeployReport {
    pub destination: PathBuf,
    pub files: usize,
    pub dirs: usize,
    pub symlinks: usize,
    /// Entries from an earlier copy that the source no longer has.
    pub removed: usize,
}

/// Copy `source_dir` into `install_path`.
pub fn deploy(source_dir: &Path, install_path: &Path) -> Result<DeployReport> {
    let name = source_dir
        .file_name()
        .with_context(|| format!("{} has no directory name", source_dir.display()))?;
    let destination = install_path.join(name);

    fs::create_dir_all(install_path)
        .with_context(|| format!("Cannot create {}", install_path.display()))?;

    let source = fs::canonicalize(source_dir)
        .with_context(|| format!("Source tree {} not found", source_dir.display()))?;
    let install_canonical = fs::canonicalize(install_path)
        .with_context(|| format!("Cannot resolve {}", install_path.display()))?;

    if install_canonical.join(name) == source {
        println!("  Source already at {}, nothing to copy", destination.display());
        return Ok(DeployReport {
            destination,
            ..Default::default()
        });
    }
    if install_canonical.starts_with(&source) {
        bail!(
            "Installation path {} is inside the source tree {}",
            install_path.display(),
            source.display()
        );
    }
    if source.starts_with(install_canonical.join(name)) {
        bail!(
            "Source tree {} is inside the destination {}",
            source.display(),
            destination.display()
        );
    }

    let mut report = DeployReport {
        destination: destination.clone(),
        ..Default::default()
    };

    for entry in WalkDir::new(&source).follow_links(false) {
        let entry = entry.with_context(|| format!("Cannot walk {}", source.display()))?;
        let rel = entry
            .path()
            .strip_prefix(&source)
            .context("Walked outside the source tree")?;
        let dst = destination.join(rel);
        let file_type = entry.file_type();

        if file_type.is_dir() {
            copy_dir_entry(entry.path(), &dst)?;
            report.dirs += 1;
        } else if file_type.is_symlink() {
            let target = fs::read_link(entry.path())
                .with_context(|| format!("Cannot read link {}", entry.path().display()))?;
            clear_destination(&dst)?;
            symlink(&target, &dst)
                .with_context(|| format!("Cannot create link {}", dst.display()))?;
            report.symlinks += 1;
        } else {
            clear_destination_unless_file(&dst)?;
            fs::copy(entry.path(), &dst).with_context(|| {
                format!("Cannot copy {} to {}", entry.path().display(), dst.display())
            })?;
            report.files += 1;
        }
    }

    report.removed = prune_stale(&source, &destination)?;
    Ok(report)
}

/// Remove entries under `destination` that have no counterpart in `source`.
fn prune_stale(source: &Path, destination: &Path) -> Result<usize> {
    let mut stale = Vec::new();
    let mut walk = WalkDir::new(destination)
        .min_depth(1)
        .follow_links(false)
        .into_iter();

    while let Some(entry) = walk.next() {
        let entry = entry.with_context(|| format!("Cannot walk {}", destination.display()))?;
        let rel = entry
            .path()
            .strip_prefix(destination)
            .context("Walked outside the destination")?;

        match fs::symlink_metadata(source.join(rel)) {
            Ok(_) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                if entry.file_type().is_dir() {
                    walk.skip_current_dir();
                }
                stale.push(entry.into_path());
            }
            Err(e) => {
                return Err(e).with_context(|| format!("Cannot inspect {}", rel.display()));
            }
        }
    }

    for path in &stale {
        clear_destination(path)?;
    }
    Ok(stale.len())
}

fn copy_dir_entry(src: &Path, dst: &Path) -> Result<()> {
    if dst.is_symlink() || dst.is_file() {
        fs::remove_file(dst).with_context(|| format!("Cannot replace {}", dst.display()))?;
    }
    fs::create_dir_all(dst).with_context(|| format!("Cannot create {}", dst.display()))?;
    let perms = fs::metadata(src)?.permissions();
    fs::set_permissions(dst, perms)
        .with_context(|| format!("Cannot set permissions on {}", dst.display()))?;
    Ok(())
}

/// Remove whatever sits at `dst` so a link can be created there.
fn clear_destination(dst: &Path) -> Result<()> {
    match fs::symlink_metadata(dst) {
        Ok(meta) if meta.is_dir() => fs::remove_dir_all(dst),
        Ok(_) => fs::remove_file(dst),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
    .with_context(|| format!("Cannot replace {}", dst.display()))
}

/// A regular file is overwritten in place; anything else is removed so
/// `fs::copy` never writes through a stale symlink.
fn clear_destination_unless_file(dst: &Path) -> Result<()> {
    match fs::symlink_metadata(dst) {
        Ok(meta) if meta.is_file() => Ok(()),
        _ => clear_destination(dst),
    }
}

/// Check every regular file under `source_dir` has an identical copy under
/// `destination`.
pub fn verify_deployment(source_dir: &Path, destination: &Path) -> Result<usize> {
    let mut checked = 0;
    for entry in WalkDir::new(source_dir).follow_links(false) {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let rel = entry.path().strip_prefix(source_dir)?;
        let copy = destination.join(rel);
        if !copy.is_file() {
            bail!("{} missing from deployment", rel.display());
        }
        if sha256_file(entry.path())? != sha256_file(&copy)? {
            bail!("{} differs from source after copy", rel.display());
        }
        checked += 1;
    }
    Ok(checked)
}

fn sha256_file(path: &Path) -> Result<String> {
    let mut file =
        fs::File::open(path).with_context(|| format!("Cannot open {}", path.display()))?;
    let mut hasher = Sha256::new();
    io::copy(&mut file, &mut hasher)
        .with_context(|| format!("Cannot read {}", path.display()))?;
    Ok(format!("{:x}", hasher.finalize()))
}
