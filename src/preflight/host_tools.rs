//! Host tool availability checks.

use crate::config::Config;
use crate::process;

use super::types::CheckResult;

/// Check the programs the pipeline shells out to.
pub fn check_host_tools(config: &Config) -> Vec<CheckResult> {
    let required = [
        (config.apt.as_str(), "Required to install OS packages"),
        (config.systemctl.as_str(), "Required to register services"),
        (config.python.as_str(), "Required to detect the wheel tag"),
        (config.pip.as_str(), "Required to install Python packages (apt install python3-pip)"),
        ("curl", "Required to query the wheel index (apt install curl)"),
    ];

    let mut results: Vec<CheckResult> = required
        .iter()
        .map(|(tool, purpose)| check_tool(tool, purpose, true))
        .collect();

    results.push(check_tool(
        &config.elevate,
        "Needed only when not started as root",
        false,
    ));

    results
}

fn check_tool(tool: &str, purpose: &str, required: bool) -> CheckResult {
    match process::which(tool) {
        Some(path) => CheckResult::pass_with(tool, &path),
        None => {
            let msg = format!("Not found in PATH. {}", purpose);
            if required {
                CheckResult::fail(tool, &msg)
            } else {
                CheckResult::warn(tool, &msg)
            }
        }
    }
}
