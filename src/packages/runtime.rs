//! Interpreter-level dependencies (pip).

use anyhow::{Context, Result};
use std::path::Path;

use super::piwheels::WheelIndex;
use crate::process::Cmd;

/// The general interpreter package resolver.
pub trait PythonResolver {
    fn install(&self, package: &str, prefer_binary: bool) -> Result<()>;
    fn install_requirements(&self, manifest: &Path) -> Result<()>;
}

pub struct Pip {
    program: String,
}

impl Pip {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl PythonResolver for Pip {
    fn install(&self, package: &str, prefer_binary: bool) -> Result<()> {
        let mut cmd = Cmd::new(&self.program).arg("install");
        if prefer_binary {
            cmd = cmd.arg("--prefer-binary");
        }
        cmd.arg(package)
            .error_msg(format!("pip install {} failed", package))
            .run_interactive()?;
        Ok(())
    }

    fn install_requirements(&self, manifest: &Path) -> Result<()> {
        Cmd::new(&self.program)
            .args(["install", "-r"])
            .arg_path(manifest)
            .error_msg(format!("pip install -r {} failed", manifest.display()))
            .run_interactive()?;
        Ok(())
    }
}

/// Install interpreter packages, preferring prebuilt wheels.
///
/// Each package goes through the wheel index first; any failure there
/// (no compatible wheel, index unreachable) falls back to the resolver.
/// The pinned manifest is installed afterwards if present.
pub fn install_runtime_packages(
    wheels: &dyn WheelIndex,
    resolver: &dyn PythonResolver,
    packages: &[String],
    prefer_binary: bool,
    manifest: &Path,
) -> Result<()> {
    for package in packages {
        println!("  Installing {}...", package);
        if let Err(e) = wheels.install_binary(package) {
            println!("    No prebuilt wheel ({:#}), using pip", e);
            resolver
                .install(package, prefer_binary)
                .with_context(|| format!("Installing {} failed", package))?;
        }
    }

    if manifest.is_file() {
        println!("  Installing pinned requirements from {}...", manifest.display());
        resolver
            .install_requirements(manifest)
            .context("Installing pinned requirements failed")?;
    } else {
        println!("  No {} found, skipping pinned requirements", manifest.display());
    }

    Ok(())
}


#[cfg(test)]
mod tests {
    use super::fakes::{FakePip, FakeWheels};
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_wheel_first_then_fallback_then_manifest() {
        let temp = tempfile::TempDir::new().unwrap();
        let manifest = temp.path().join("requirements.txt");
        std::fs::write(&manifest, "flask==2.2.5\n").unwrap();

        let log = Rc::new(RefCell::new(Vec::new()));
        let wheels = FakeWheels {
            available: vec!["numpy"],
            log: log.clone(),
        };
        let pip = FakePip {
            failing: vec![],
            log: log.clone(),
        };

        install_runtime_packages(&wheels, &pip, &names(&["numpy", "imutils"]), true, &manifest)
            .unwrap();

        assert_eq!(
            *log.borrow(),
            vec![
                "wheel numpy",
                "pip imutils prefer_binary=true",
                "pip -r requirements.txt"
            ]
        );
    }

    #[test]
    fn test_missing_manifest_is_skipped() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let wheels = FakeWheels {
            available: vec![],
            log: log.clone(),
        };
        let pip = FakePip {
            failing: vec![],
            log: log.clone(),
        };

        install_runtime_packages(
            &wheels,
            &pip,
            &names(&["flask"]),
            false,
            Path::new("/nonexistent/requirements.txt"),
        )
        .unwrap();

        assert_eq!(*log.borrow(), vec!["pip flask prefer_binary=false"]);
    }

    #[test]
    fn test_fallback_failure_is_fatal() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let wheels = FakeWheels {
            available: vec![],
            log: log.clone(),
        };
        let pip = FakePip {
            failing: vec!["opencv-python"],
            log: log.clone(),
        };

        let err = install_runtime_packages(
            &wheels,
            &pip,
            &names(&["opencv-python", "flask"]),
            true,
            Path::new("/nonexistent"),
        )
        .unwrap_err();

        assert!(err.to_string().contains("opencv-python"));
        assert_eq!(log.borrow().len(), 1);
    }
}
