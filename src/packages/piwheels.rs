//! Prebuilt wheels from the piwheels index.
//!
//! Building numpy or opencv from source on a Pi takes hours or fails
//! outright. piwheels publishes per-release wheel metadata, including the
//! apt libraries each wheel links against. The helper picks the newest
//! release with a wheel for the running interpreter, installs those
//! libraries, and then installs exactly that wheel.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};

use crate::config::Config;
use crate::process::Cmd;

/// Installs a binary artifact for one interpreter package.
pub trait WheelIndex {
    fn install_binary(&self, package: &str) -> Result<()>;
}

/// Project metadata served at `<index>/project/<name>/json/`.
///
/// Releases are kept in document order, which piwheels serves newest first.
#[derive(Debug, Deserialize)]
pub struct ProjectInfo {
    #[serde(default)]
    pub releases: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Default, Deserialize)]
struct Release {
    #[serde(default)]
    files: BTreeMap<String, WheelFile>,
}

#[derive(Debug, Default, Deserialize)]
struct WheelFile {
    #[serde(default)]
    apt_dependencies: Vec<String>,
}

/// Release chosen for the running interpreter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompatibleRelease {
    pub version: String,
    /// apt packages the matching wheels need, sorted and de-duplicated.
    pub apt_dependencies: Vec<String>,
}

impl ProjectInfo {
    pub fn parse(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Malformed project metadata from wheel index")
    }

    /// Newest release with at least one wheel whose filename carries
    /// `python_tag` (e.g. `cp311`).
    pub fn find_newest_compatible(&self, python_tag: &str) -> Result<CompatibleRelease> {
        for (version, value) in &self.releases {
            let release: Release = serde_json::from_value(value.clone())
                .with_context(|| format!("Malformed metadata for release {}", version))?;

            let matching: Vec<&WheelFile> = release
                .files
                .iter()
                .filter(|(name, _)| name.contains(python_tag))
                .map(|(_, file)| file)
                .collect();

            if matching.is_empty() {
                continue;
            }

            let deps: BTreeSet<String> = matching
                .iter()
                .flat_map(|file| file.apt_dependencies.iter().cloned())
                .collect();

            return Ok(CompatibleRelease {
                version: version.clone(),
                apt_dependencies: deps.into_iter().collect(),
            });
        }

        bail!(
            "No release compatible with the current python version ({})",
            python_tag
        )
    }
}

/// Wheel tag for an interpreter's `py_version_nodot` (e.g. "311" -> "cp311").
pub fn python_tag_from_nodot(nodot: &str) -> Result<String> {
    let nodot = nodot.trim();
    if nodot.is_empty() || !nodot.chars().all(|c| c.is_ascii_digit()) {
        bail!("Unexpected interpreter version '{}'", nodot);
    }
    Ok(format!("cp{}", nodot))
}

/// piwheels-backed [`WheelIndex`] that drives curl, apt-get and pip.
pub struct PiWheels {
    index_url: String,
    apt: String,
    pip: String,
    python: String,
    python_tag: Option<String>,
}

impl PiWheels {
    pub fn from_config(config: &Config) -> Self {
        Self {
            index_url: config.wheel_index_url.clone(),
            apt: config.apt.clone(),
            pip: config.pip.clone(),
            python: config.python.clone(),
            python_tag: config.python_tag.clone(),
        }
    }

    fn project_url(&self, package: &str) -> String {
        format!("{}/project/{}/json/", self.index_url, package)
    }

    fn python_tag(&self) -> Result<String> {
        if let Some(tag) = &self.python_tag {
            return Ok(tag.clone());
        }
        let out = Cmd::new(&self.python)
            .args([
                "-c",
                "import sysconfig; print(sysconfig.get_config_var('py_version_nodot'))",
            ])
            .error_msg("Cannot determine interpreter version")
            .run()?;
        python_tag_from_nodot(out.stdout_trimmed())
    }

    fn fetch(&self, package: &str) -> Result<ProjectInfo> {
        let url = self.project_url(package);
        let out = Cmd::new("curl")
            .args(["-fsSL", "--max-time", "10", &url])
            .error_msg(format!("Fetching {} failed", url))
            .run()?;
        ProjectInfo::parse(&out.stdout)
    }
}

impl WheelIndex for PiWheels {
    fn install_binary(&self, package: &str) -> Result<()> {
        let tag = self.python_tag()?;
        let release = self.fetch(package)?.find_newest_compatible(&tag)?;

        println!(
            "    {} {}: prebuilt wheel for {}",
            package, release.version, tag
        );

        if !release.apt_dependencies.is_empty() {
            println!(
                "    Installing native dependencies: {}",
                release.apt_dependencies.join(" ")
            );
            Cmd::new(&self.apt)
                .env("DEBIAN_FRONTEND", "noninteractive")
                .arg("install")
                .args(&release.apt_dependencies)
                .args(["--ignore-missing", "-y"])
                .error_msg(format!("Installing native dependencies of {} failed", package))
                .run_interactive()?;
        }

        Cmd::new(&self.pip)
            .args(["install", "--only-binary=:all:", "--extra-index-url"])
            .arg(format!("{}/simple", self.index_url))
            .arg(format!("{}=={}", package, release.version))
            .error_msg(format!("Installing wheel {}=={} failed", package, release.version))
            .run_interactive()?;

        Ok(())
    }
}
