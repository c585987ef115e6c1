//! Configuration management for nw-install.
//!
//! Reads configuration from a .env file next to the installer and from
//! environment variables. Environment variables take precedence over .env.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Default systemd unit directory for rendered units.
pub const DEFAULT_UNIT_DIR: &str = "/etc/systemd/system";

/// Default wheel index (Raspberry Pi prebuilt wheels).
pub const DEFAULT_WHEEL_INDEX_URL: &str = "https://www.piwheels.org";

/// nw-install configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Where rendered unit files are written (default: /etc/systemd/system)
    pub unit_dir: PathBuf,
    /// Base URL of the wheel index service
    pub wheel_index_url: String,
    /// Python interpreter used to detect the wheel tag
    pub python: String,
    /// pip executable
    pub pip: String,
    /// Elevation command (e.g., "sudo")
    pub elevate: String,
    /// OS package manager executable
    pub apt: String,
    /// Init system control executable
    pub systemctl: String,
    /// Wheel tag override (e.g., "cp311"); detected from `python` when unset
    pub python_tag: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self::from_vars(&HashMap::new())
    }
}

/// The process environment, skipping entries that are not valid UTF-8.
pub fn process_vars() -> HashMap<String, String> {
    std::env::vars_os()
        .filter_map(|(key, value)| Some((key.into_string().ok()?, value.into_string().ok()?)))
        .collect()
}

impl Config {
    /// Load configuration from .env file and environment.
    ///
    /// The .env file is looked up in `base_dir` (the installer's own
    /// directory), never in the current working directory.
    pub fn load(base_dir: &Path) -> Self {
        let mut env_vars = HashMap::new();

        let env_path = base_dir.join(".env");
        if env_path.exists() {
            match dotenvy::from_path_iter(&env_path) {
                Ok(iter) => {
                    for item in iter {
                        match item {
                            Ok((key, value)) => {
                                env_vars.insert(key, value);
                            }
                            Err(e) => {
                                eprintln!(
                                    "  [WARN] Ignoring malformed line in {}: {}",
                                    env_path.display(),
                                    e
                                );
                            }
                        }
                    }
                }
                Err(e) => {
                    eprintln!("  [WARN] Cannot read {}: {}", env_path.display(), e);
                }
            }
        }

        // Environment variables override .env file
        env_vars.extend(process_vars());

        Self::from_vars(&env_vars)
    }

    /// Build config from an explicit variable map, applying defaults.
    pub fn from_vars(vars: &HashMap<String, String>) -> Self {
        let get = |key: &str, default: &str| {
            vars.get(key)
                .filter(|v| !v.trim().is_empty())
                .cloned()
                .unwrap_or_else(|| default.to_string())
        };

        Self {
            unit_dir: PathBuf::from(get("NW_UNIT_DIR", DEFAULT_UNIT_DIR)),
            wheel_index_url: get("NW_WHEEL_INDEX_URL", DEFAULT_WHEEL_INDEX_URL)
                .trim_end_matches('/')
                .to_string(),
            python: get("NW_PYTHON", "python3"),
            pip: get("NW_PIP", "pip3"),
            elevate: get("NW_ELEVATE", "sudo"),
            apt: get("NW_APT", "apt-get"),
            systemctl: get("NW_SYSTEMCTL", "systemctl"),
            python_tag: vars
                .get("NW_PYTHON_TAG")
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty()),
        }
    }

    /// Print configuration for debugging.
    pub fn print(&self) {
        println!("Configuration:");
        println!("  NW_UNIT_DIR: {}", self.unit_dir.display());
        println!("  NW_WHEEL_INDEX_URL: {}", self.wheel_index_url);
        println!("  NW_PYTHON: {}", self.python);
        println!("  NW_PIP: {}", self.pip);
        println!("  NW_ELEVATE: {}", self.elevate);
        println!("  NW_APT: {}", self.apt);
        println!("  NW_SYSTEMCTL: {}", self.systemctl);
        match &self.python_tag {
            Some(tag) => println!("  NW_PYTHON_TAG: {}", tag),
            None => println!("  NW_PYTHON_TAG: (detect from {})", self.python),
        }
    }
}
