//! Shared test utilities for nw-install integration tests.
#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use anyhow::{bail, Result};
use nw_install::activate::InitSystem;
use nw_install::packages::{PackageManager, PythonResolver, WheelIndex};
use nw_install::pipeline::Installer;
use tempfile::TempDir;

pub const SERVER_TEMPLATE: &str = "[Unit]\nDescription=Naturewatch camera server\nAfter=network.target\n\n[Service]\nWorkingDirectory=${path}/NaturewatchCameraServer\nExecStart=/usr/bin/python3 -m naturewatch_camera_server\nRestart=always\n\n[Install]\nWantedBy=multi-user.target\n";

pub const WIFI_TEMPLATE: &str = "[Unit]\nDescription=Naturewatch Wi-Fi setup\nBefore=hostapd.service\n\n[Service]\nType=oneshot\nExecStart=/usr/bin/python3 ${path}/NaturewatchCameraServer/helpers/cfgsetup.py\n\n[Install]\nWantedBy=multi-user.target\n";

/// Temporary host: an installer tree, a place to install to and a unit directory.
pub struct TestEnv {
    /// Temporary directory (kept alive for lifetime of TestEnv)
    pub _temp_dir: TempDir,
    pub root: PathBuf,
    /// The installer tree (`.../NaturewatchCameraServer`)
    pub source: PathBuf,
    /// Stand-in for /etc/systemd/system
    pub unit_dir: PathBuf,
}

impl TestEnv {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let root = fs::canonicalize(temp_dir.path()).expect("Failed to canonicalize temp dir");
        let source = root.join("home/pi/NaturewatchCameraServer");
        let unit_dir = root.join("etc/systemd/system");

        create_source_tree(&source);
        fs::create_dir_all(&unit_dir).expect("Failed to create unit dir");

        Self {
            _temp_dir: temp_dir,
            root,
            source,
            unit_dir,
        }
    }

    /// A path under the temp root, e.g. `env.path("opt/app")`.
    pub fn path(&self, rel: &str) -> PathBuf {
        self.root.join(rel)
    }
}

/// Lay out a minimal camera server tree with both unit templates.
pub fn create_source_tree(source: &Path) {
    let files = [
        ("helpers/python.naturewatch.service", SERVER_TEMPLATE),
        ("helpers/wifisetup.service", WIFI_TEMPLATE),
        ("helpers/cfgsetup.py", "print('cfg')\n"),
        ("naturewatch_camera_server/__init__.py", ""),
        ("naturewatch_camera_server/__main__.py", "print('camera')\n"),
        ("naturewatch_camera_server/static/index.html", "<html></html>\n"),
        ("requirements.txt", "flask==2.2.5\nimutils==0.5.4\n"),
    ];
    for (rel, content) in files {
        let path = source.join(rel);
        fs::create_dir_all(path.parent().expect("file has parent")).expect("Failed to create dir");
        fs::write(&path, content).expect("Failed to write source file");
    }
}

/// One fake for every external system, all writing to a shared log.
#[derive(Default)]
pub struct FakeHost {
    pub log: Rc<RefCell<Vec<String>>>,
    /// Units the init system knows about (loaded at some point).
    pub loaded: RefCell<Vec<String>>,
    pub state: RefCell<HashMap<String, String>>,
    pub wheels: Vec<&'static str>,
    /// Log entries that should fail when reached.
    pub fail_on: Vec<String>,
}

impl FakeHost {
    pub fn new() -> Self {
        Self {
            wheels: vec!["imutils"],
            ..Default::default()
        }
    }

    fn record(&self, entry: String) -> Result<()> {
        self.log.borrow_mut().push(entry.clone());
        if self.fail_on.contains(&entry) {
            bail!("{} failed", entry);
        }
        Ok(())
    }

    pub fn entries(&self) -> Vec<String> {
        self.log.borrow().clone()
    }

    pub fn installer(&self, unit_dir: &Path) -> Installer<'_> {
        Installer {
            packages: self,
            wheels: self,
            python: self,
            init: self,
            unit_dir: unit_dir.to_path_buf(),
        }
    }
}

impl PackageManager for FakeHost {
    fn clean(&self) -> Result<()> {
        self.record("apt clean".into())
    }
    fn update(&self) -> Result<()> {
        self.record("apt update".into())
    }
    fn upgrade(&self) -> Result<()> {
        self.record("apt upgrade".into())
    }
    fn dist_upgrade(&self) -> Result<()> {
        self.record("apt dist-upgrade".into())
    }
    fn install(&self, packages: &[String]) -> Result<()> {
        self.record(format!("apt install {}", packages.len()))
    }
    fn autoremove(&self) -> Result<()> {
        self.record("apt autoremove".into())
    }
}

impl WheelIndex for FakeHost {
    fn install_binary(&self, package: &str) -> Result<()> {
        if !self.wheels.contains(&package) {
            bail!("no wheel for {}", package);
        }
        self.record(format!("wheel {}", package))
    }
}

impl PythonResolver for FakeHost {
    fn install(&self, package: &str, prefer_binary: bool) -> Result<()> {
        self.record(format!("pip {} prefer_binary={}", package, prefer_binary))
    }
    fn install_requirements(&self, _manifest: &Path) -> Result<()> {
        self.record("pip -r requirements.txt".into())
    }
}

impl InitSystem for FakeHost {
    fn stop(&self, unit: &str) -> Result<()> {
        self.record(format!("stop {}", unit))?;
        if !self.loaded.borrow().iter().any(|u| u == unit) {
            bail!("Failed to stop {}: Unit {} not loaded.", unit, unit);
        }
        self.state.borrow_mut().insert(unit.into(), "inactive".into());
        Ok(())
    }
    fn daemon_reload(&self) -> Result<()> {
        self.record("daemon-reload".into())
    }
    fn enable(&self, unit: &str) -> Result<()> {
        self.record(format!("enable {}", unit))?;
        let mut loaded = self.loaded.borrow_mut();
        if !loaded.iter().any(|u| u == unit) {
            loaded.push(unit.to_string());
        }
        Ok(())
    }
    fn start(&self, unit: &str) -> Result<()> {
        self.record(format!("start {}", unit))?;
        self.state.borrow_mut().insert(unit.into(), "active".into());
        Ok(())
    }
    fn is_active(&self, unit: &str) -> Result<String> {
        Ok(self
            .state
            .borrow()
            .get(unit)
            .cloned()
            .unwrap_or_else(|| "inactive".into()))
    }
}

/// Relative paths of every file under `dir`, sorted.
pub fn tree_listing(dir: &Path) -> Vec<String> {
    let mut files: Vec<String> = walkdir::WalkDir::new(dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| {
            e.path()
                .strip_prefix(dir)
                .expect("walked under dir")
                .to_string_lossy()
                .into_owned()
        })
        .collect();
    files.sort();
    files
}

/// Assert that a file contains expected content.
pub fn assert_file_contains(path: &Path, expected: &str) {
    let content = fs::read_to_string(path)
        .unwrap_or_else(|e| panic!("Failed to read file {}: {}", path.display(), e));
    assert!(
        content.contains(expected),
        "File {} does not contain expected content.\nExpected to find: {}\nActual content: {}",
        path.display(),
        expected,
        content
    );
}

/// Assert that a file exists.
pub fn assert_file_exists(path: &Path) {
    assert!(path.exists(), "Expected file to exist: {}", path.display());
}
