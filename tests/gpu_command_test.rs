//! Integration tests for the gpu commands, using a shell stand-in for gpustat.

#![cfg(unix)]

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::{TempDir, tempdir};

const STATUS_JSON: &str = r#"{"hostname": "node", "gpus": [{"index": 0, "name": "A100", "memory.used": 500, "memory.total": 1000}, {"index": 1, "name": "A100", "memory.used": 100, "memory.total": 1000}, {"index": 2, "name": "A100", "memory.used": 100, "memory.total": 1000}]}"#;

fn write_config(dir: &Path, script: &str) -> PathBuf {
    let path = dir.join("config.toml");
    let contents = format!(
        "[gpu]\nstatus_program = \"sh\"\nstatus_args = [\"-c\", {}]\ndevice_env_var = \"TRAINWATCH_TEST_DEVICE\"\n",
        toml_string(script)
    );
    fs::write(&path, contents).unwrap();
    path
}

/// JSON string escaping is valid TOML basic-string syntax.
fn toml_string(s: &str) -> String {
    serde_json::to_string(s).unwrap()
}

fn status_config() -> (TempDir, PathBuf) {
    let dir = tempdir().unwrap();
    let config = write_config(dir.path(), &format!("echo '{STATUS_JSON}'"));
    (dir, config)
}

#[test]
fn test_gpu_freest_prints_first_minimum() {
    let (_dir, config) = status_config();

    let mut cmd = cargo_bin_cmd!("trainwatch");
    cmd.arg("--config").arg(&config).arg("gpu").arg("freest");

    cmd.assert().success().stdout("1\n");
}

#[test]
fn test_gpu_list_marks_freest() {
    let (_dir, config) = status_config();

    let mut cmd = cargo_bin_cmd!("trainwatch");
    cmd.arg("--config").arg(&config).arg("gpu").arg("list");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("[1] A100 - 100 / 1000 MiB [freest]"))
        .stdout(predicate::str::contains("[0] A100 - 500 / 1000 MiB\n"));
}

#[test]
fn test_gpu_list_json() {
    let (_dir, config) = status_config();

    let mut cmd = cargo_bin_cmd!("trainwatch");
    cmd.arg("--config").arg(&config).arg("gpu").arg("list").arg("--json");

    let output = cmd.assert().success();
    let stdout = String::from_utf8(output.get_output().stdout.clone()).unwrap();
    let json: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(json["gpus"].as_array().map(Vec::len), Some(3));
    assert_eq!(json["gpus"][1]["memory.used"], 100);
}

#[test]
fn test_gpu_exec_pins_child_only() {
    let (_dir, config) = status_config();

    let mut cmd = cargo_bin_cmd!("trainwatch");
    cmd.arg("--config")
        .arg(&config)
        .arg("gpu")
        .arg("exec")
        .arg("--")
        .arg("sh")
        .arg("-c")
        .arg("echo device=$TRAINWATCH_TEST_DEVICE; exit 7");

    cmd.assert().code(7).stdout("device=1\n");
}

#[test]
fn test_gpu_freest_propagates_command_failure() {
    let dir = tempdir().unwrap();
    let config = write_config(dir.path(), "echo 'gpustat: NVML not found' >&2; exit 1");

    let mut cmd = cargo_bin_cmd!("trainwatch");
    cmd.arg("--config").arg(&config).arg("gpu").arg("freest");

    cmd.assert()
        .code(1)
        .stderr(predicate::str::contains("NVML not found"));
}

#[test]
fn test_gpu_freest_rejects_invalid_json() {
    let dir = tempdir().unwrap();
    let config = write_config(dir.path(), "echo not-json");

    let mut cmd = cargo_bin_cmd!("trainwatch");
    cmd.arg("--config").arg(&config).arg("gpu").arg("freest");

    cmd.assert()
        .code(1)
        .stderr(predicate::str::contains("failed to parse GPU status output"));
}

#[test]
fn test_gpu_runtime_reports() {
    let mut cmd = cargo_bin_cmd!("trainwatch");
    cmd.arg("gpu").arg("runtime");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("CUDA runtime:"));
}
