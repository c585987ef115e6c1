//! CLI tests against the real nw-install binary (no installing).

mod helpers;

use assert_cmd::Command;
use helpers::TestEnv;
use predicates::prelude::*;
use std::ffi::OsStr;
use std::fs;
use std::os::unix::ffi::OsStrExt;

#[allow(deprecated)]
fn nw_cmd() -> Command {
    Command::cargo_bin("nw-install").unwrap()
}

#[test]
fn test_help_output() {
    nw_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Naturewatch camera server installer"))
        .stdout(predicate::str::contains("preflight"))
        .stdout(predicate::str::contains("render"));
}

#[test]
fn test_render_to_stdout() {
    let env = TestEnv::new();
    nw_cmd()
        .arg("render")
        .arg("/opt/naturewatch")
        .arg("--source")
        .arg(&env.source)
        .assert()
        .success()
        .stdout(predicate::str::contains("# python.naturewatch.service"))
        .stdout(predicate::str::contains(
            "WorkingDirectory=/opt/naturewatch/NaturewatchCameraServer",
        ))
        .stdout(predicate::str::contains("${path}").not());
}

#[test]
fn test_render_to_directory() {
    let env = TestEnv::new();
    let out = env.path("rendered");
    nw_cmd()
        .args(["render", "/home/pi"])
        .arg("--source")
        .arg(&env.source)
        .arg("--output")
        .arg(&out)
        .assert()
        .success();

    let unit = fs::read_to_string(out.join("wifisetup.service")).unwrap();
    let exec = "ExecStart=/usr/bin/python3 /home/pi/NaturewatchCameraServer/helpers/cfgsetup.py";
    assert!(unit.contains(exec));
}

#[test]
fn test_render_rejects_relative_path() {
    let env = TestEnv::new();
    nw_cmd()
        .args(["render", "opt/app"])
        .arg("--source")
        .arg(&env.source)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error"));
}

#[test]
fn test_render_rejects_non_utf8_path_cleanly() {
    let env = TestEnv::new();
    nw_cmd()
        .arg("render")
        .arg(OsStr::from_bytes(b"/opt/\xff"))
        .arg("--source")
        .arg(&env.source)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("not valid UTF-8"))
        .stderr(predicate::str::contains("panicked").not());
}

#[test]
fn test_install_rejects_non_utf8_path_cleanly() {
    let env = TestEnv::new();
    nw_cmd()
        .args(["install", "--no-elevate", "--skip-packages"])
        .arg(OsStr::from_bytes(b"/opt/\xff"))
        .arg("--source")
        .arg(&env.source)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("not valid UTF-8"))
        .stderr(predicate::str::contains("panicked").not());
}

#[test]
fn test_show_units_uses_unit_dir_override() {
    let env = TestEnv::new();
    nw_cmd()
        .args(["show", "units"])
        .arg("--source")
        .arg(&env.source)
        .env("NW_UNIT_DIR", &env.unit_dir)
        .assert()
        .success()
        .stdout(predicate::str::contains(
            env.unit_dir.join("wifisetup.service").display().to_string(),
        ))
        .stdout(predicate::str::contains("template missing").not());
}

#[test]
fn test_missing_source_fails() {
    let env = TestEnv::new();
    nw_cmd()
        .args(["show", "config"])
        .arg("--source")
        .arg(env.path("does-not-exist"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}
