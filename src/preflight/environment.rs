//! Source tree and target environment checks.

use std::fs;
use std::path::Path;

use crate::plan::{HELPERS_DIR, REQUIREMENTS_FILE, UNIT_TEMPLATES};
use crate::render::PATH_TOKEN;

use super::types::CheckResult;

/// Check the installer tree has what the render and pip stages read.
pub fn check_source_tree(source_dir: &Path) -> Vec<CheckResult> {
    let mut results = Vec::new();
    let helpers = source_dir.join(HELPERS_DIR);

    for name in UNIT_TEMPLATES {
        let label = format!("{}/{}", HELPERS_DIR, name);
        let path = helpers.join(name);
        let result = match fs::read_to_string(&path) {
            Ok(text) if text.contains(PATH_TOKEN) => CheckResult::pass(&label),
            Ok(_) => CheckResult::warn(
                &label,
                &format!("No {} token; the unit will not point at the install path", PATH_TOKEN),
            ),
            Err(e) => CheckResult::fail(&label, &format!("Cannot read template: {}", e)),
        };
        results.push(result);
    }

    if source_dir.join(REQUIREMENTS_FILE).is_file() {
        results.push(CheckResult::pass(REQUIREMENTS_FILE));
    } else {
        results.push(CheckResult::warn(
            REQUIREMENTS_FILE,
            "Not found - pinned dependencies will be skipped",
        ));
    }

    results
}

/// Check the unit directory accepts new files.
pub fn check_unit_dir(unit_dir: &Path) -> CheckResult {
    let name = format!("{} writable", unit_dir.display());
    if !unit_dir.is_dir() {
        return CheckResult::fail(&name, "Directory does not exist - is this a systemd host?");
    }

    let probe = unit_dir.join(".nw-install-preflight");
    match fs::write(&probe, "") {
        Ok(()) => {
            let _ = fs::remove_file(&probe);
            CheckResult::pass(&name)
        }
        Err(e) => CheckResult::fail(&name, &format!("{} (run as root)", e)),
    }
}
