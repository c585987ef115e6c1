//! Installation inputs: where the tree comes from, where it goes, and
//! what gets installed.

use std::fmt;
use std::path::{Component, Path, PathBuf};

use crate::error::InstallError;
use crate::render::PATH_TOKEN;

/// Unit templates shipped under `helpers/`, in activation order.
pub const UNIT_TEMPLATES: [&str; 2] = ["python.naturewatch.service", "wifisetup.service"];

/// Pinned pip manifest, relative to the source directory.
pub const REQUIREMENTS_FILE: &str = "requirements.txt";

/// Directory holding helper files and unit templates.
pub const HELPERS_DIR: &str = "helpers";

/// Validated installation directory.
///
/// The same value is used for the copy destination and for every
/// rendered unit, so the two can never disagree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallPath(PathBuf);

impl InstallPath {
    /// Validate a caller-supplied installation path.
    ///
    /// The path is substituted verbatim into unit files, so it must be
    /// absolute and free of characters systemd would reinterpret: control
    /// characters, whitespace (word splitting in `ExecStart=`), `%`
    /// (specifier expansion), and the substitution token itself.
    pub fn new(path: impl Into<PathBuf>) -> Result<Self, InstallError> {
        let path = path.into();
        let text = path
            .to_str()
            .ok_or_else(|| InstallError::InvalidPath("path is not valid UTF-8".into()))?;

        if text.is_empty() {
            return Err(InstallError::InvalidPath("path is empty".into()));
        }
        if !path.is_absolute() {
            return Err(InstallError::InvalidPath(format!(
                "'{}' is not absolute",
                text
            )));
        }
        if path.components().any(|c| c == Component::ParentDir) {
            return Err(InstallError::InvalidPath(format!(
                "'{}' contains '..'",
                text
            )));
        }
        if let Some(bad) = text
            .chars()
            .find(|c| c.is_control() || c.is_whitespace() || *c == '%')
        {
            return Err(InstallError::InvalidPath(format!(
                "'{}' contains unsupported character {:?}",
                text.escape_debug(),
                bad
            )));
        }
        if text.contains(PATH_TOKEN) {
            return Err(InstallError::InvalidPath(format!(
                "'{}' contains the template token {}",
                text, PATH_TOKEN
            )));
        }

        Ok(Self(path))
    }

    pub fn as_path(&self) -> &Path {
        &self.0
    }

    /// String form substituted into unit templates.
    pub fn as_str(&self) -> &str {
        // Validated as UTF-8 in `new`.
        self.0.to_str().unwrap_or_default()
    }
}

impl fmt::Display for InstallPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// OS and interpreter packages the appliance needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageSpec {
    pub os_packages: Vec<String>,
    pub python_packages: Vec<String>,
    /// Pass `--prefer-binary` to pip when falling back to the default index.
    pub prefer_binary: bool,
}

impl PackageSpec {
    /// Package set for the camera server on Raspberry Pi OS.
    pub fn naturewatch() -> Self {
        let os = [
            "python3",
            "python3-pip",
            "python3-dev",
            "python3-numpy",
            "python3-opencv",
            "python3-picamera2",
            "libatlas-base-dev",
            "libjpeg-dev",
            "zlib1g-dev",
            "hostapd",
            "dnsmasq",
            "curl",
        ];
        let python = ["flask", "imutils", "requests"];

        Self {
            os_packages: os.iter().map(|s| s.to_string()).collect(),
            python_packages: python.iter().map(|s| s.to_string()).collect(),
            prefer_binary: true,
        }
    }
}

/// Everything one installation run needs, resolved up front.
#[derive(Debug, Clone)]
pub struct InstallPlan {
    /// Symlink-resolved directory holding the installer tree.
    pub source_dir: PathBuf,
    pub install_path: InstallPath,
    pub packages: PackageSpec,
    /// Skip stages 3 and 4 (packages already present).
    pub skip_packages: bool,
}

impl InstallPlan {
    pub fn new(source_dir: PathBuf, install_path: InstallPath) -> Self {
        Self {
            source_dir,
            install_path,
            packages: PackageSpec::naturewatch(),
            skip_packages: false,
        }
    }

    /// Where the deployer puts the tree: `<install_path>/<basename of source>`.
    pub fn deployed_dir(&self) -> PathBuf {
        match self.source_dir.file_name() {
            Some(name) => self.install_path.as_path().join(name),
            None => self.install_path.as_path().to_path_buf(),
        }
    }

    /// Pip manifest inside the source tree.
    pub fn requirements(&self) -> PathBuf {
        self.source_dir.join(REQUIREMENTS_FILE)
    }
}
