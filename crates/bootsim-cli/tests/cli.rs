//! CLI tests.
//!
//! Runs the `bootsim` binary end-to-end. Every scenario except `--realtime`
//! uses simulated time, so they finish instantly.

#![allow(deprecated)] // Command::cargo_bin is deprecated but replacement requires newer assert_cmd

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn bootsim() -> Command {
    let mut cmd = Command::cargo_bin("bootsim").unwrap();
    cmd.env_remove("RUST_LOG").env("NO_COLOR", "1");
    cmd
}

// ============================================================================
// Basics
// ============================================================================

#[test]
fn version_command_succeeds() {
    bootsim()
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains("bootsim"))
        .stdout(predicate::str::contains("Stages:       7"));
}

#[test]
fn version_flag_shows_version() {
    bootsim()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("bootsim"));
}

#[test]
fn help_flag_shows_usage() {
    bootsim()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("secure-boot"));
}

#[test]
fn unknown_mode_is_rejected() {
    bootsim()
        .args(["run", "--mode", "evil"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown boot mode"));
}

// ============================================================================
// Stages
// ============================================================================

#[test]
fn stages_lists_catalog() {
    bootsim()
        .arg("stages")
        .assert()
        .success()
        .stdout(predicate::str::contains("Boot ROM Execution"))
        .stdout(predicate::str::contains("OS Handoff"))
        .stdout(predicate::str::contains("(7 stages, 19.5 s at 1x)"));
}

#[test]
fn stages_json_is_machine_readable() {
    let output = bootsim().args(["stages", "--json"]).output().unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let stages = json["stages"].as_array().unwrap();
    assert_eq!(stages.len(), 7);
    assert_eq!(stages[0]["duration_ms"], 2000);
}

// ============================================================================
// Run
// ============================================================================

#[test]
fn run_normal_boot_succeeds() {
    bootsim()
        .arg("run")
        .assert()
        .success()
        .stdout(predicate::str::contains("[ 19500 ms]"))
        .stdout(predicate::str::contains("complete: success"))
        .stdout(predicate::str::contains("BOOT SUCCESS"))
        .stdout(predicate::str::contains("Chain of trust verified"));
}

#[test]
fn run_tampered_boot_enters_safe_mode() {
    bootsim()
        .args(["run", "--mode", "tampered"])
        .assert()
        .success()
        .stdout(predicate::str::contains("complete: failed"))
        .stdout(predicate::str::contains("SAFE MODE"))
        .stdout(predicate::str::contains("Boot ended failed"));
}

#[test]
fn run_speed_scales_simulated_time() {
    bootsim()
        .args(["run", "--speed", "2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[  9750 ms]"));
}

#[test]
fn run_rejects_out_of_range_speed() {
    bootsim()
        .args(["run", "--speed", "5"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid --speed"));
}

#[test]
fn run_step_walks_every_stage() {
    bootsim()
        .args(["run", "--step"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Power-On Reset"))
        .stdout(predicate::str::contains("stage 6"))
        .stdout(predicate::str::contains("complete: success"));
}

#[test]
fn realtime_conflicts_with_step() {
    bootsim()
        .args(["run", "--realtime", "--step"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot be used with"));
}

// ============================================================================
// Inspect
// ============================================================================

#[test]
fn inspect_tampered_stage_six() {
    bootsim()
        .args(["inspect", "6", "--mode", "tampered"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Stage 6/7"))
        .stdout(predicate::str::contains("SAFE MODE"))
        .stdout(predicate::str::contains("safeMode"))
        .stdout(predicate::str::contains("0x0000F000"))
        .stdout(predicate::str::contains("FAILED"));
}

#[test]
fn inspect_terminal_stage_is_complete() {
    bootsim()
        .args(["inspect", "7"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Complete"))
        .stdout(predicate::str::contains("BOOT SUCCESS"))
        .stdout(predicate::str::contains("100%"));
}

#[test]
fn inspect_out_of_range_fails() {
    bootsim()
        .args(["inspect", "8"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Cannot inspect stage 8"))
        .stderr(predicate::str::contains("out of range"));
}

#[test]
fn inspect_json_snapshot() {
    let output = bootsim()
        .args(["inspect", "3", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["stage"], 3);
    assert_eq!(json["phase"], "paused");
    assert_eq!(json["projection"]["flags"]["flash_active"], true);
    assert_eq!(json["projection"]["flags"]["cpu_active"], false);
}

// ============================================================================
// Config
// ============================================================================

#[test]
fn config_show_defaults() {
    let temp = TempDir::new().unwrap();

    bootsim()
        .args(["config", "show", "--dir", temp.path().to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("[simulation]"))
        .stdout(predicate::str::contains("[display]"))
        .stdout(predicate::str::contains("[logging]"));
}

#[test]
fn config_show_reads_project_file() {
    let temp = TempDir::new().unwrap();
    fs::write(
        temp.path().join("bootsim.toml"),
        "[simulation]\nmode = \"tampered\"\n",
    )
    .unwrap();

    bootsim()
        .args(["config", "show", "--dir", temp.path().to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("# from"))
        .stdout(predicate::str::contains("mode = \"tampered\""));
}

#[test]
fn config_show_json() {
    let temp = TempDir::new().unwrap();

    bootsim()
        .args([
            "config",
            "show",
            "--dir",
            temp.path().to_str().unwrap(),
            "--format",
            "json",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"simulation\""));
}

#[test]
fn config_show_rejects_unknown_format() {
    let temp = TempDir::new().unwrap();

    bootsim()
        .args([
            "config",
            "show",
            "--dir",
            temp.path().to_str().unwrap(),
            "--format",
            "yaml",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown format"));
}

#[test]
fn config_file_flag_drives_run() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("custom.toml");
    fs::write(
        &path,
        "[simulation]\nmode = \"tampered\"\nautoplay = false\n\n[display]\nshow_memory = true\n",
    )
    .unwrap();

    bootsim()
        .args(["--config", path.to_str().unwrap(), "run"])
        .assert()
        .success()
        .stdout(predicate::str::contains("complete: failed"))
        .stdout(predicate::str::contains("Memory"));
}

#[test]
fn environment_overrides_project_config() {
    let temp = TempDir::new().unwrap();
    fs::write(
        temp.path().join("bootsim.toml"),
        "[simulation]\nmode = \"normal\"\n",
    )
    .unwrap();

    bootsim()
        .current_dir(temp.path())
        .env("BOOTSIM_SIMULATION__MODE", "tampered")
        .env("BOOTSIM_DISPLAY__SHOW_MEMORY", "true")
        .arg("run")
        .assert()
        .success()
        .stdout(predicate::str::contains("Booting tampered image"))
        .stdout(predicate::str::contains("complete: failed"))
        .stdout(predicate::str::contains("Memory"));
}

#[test]
fn environment_speed_out_of_range_fails() {
    let temp = TempDir::new().unwrap();

    bootsim()
        .current_dir(temp.path())
        .env("BOOTSIM_SIMULATION__SPEED", "1.1")
        .arg("version")
        .assert()
        .failure()
        .stderr(predicate::str::contains("simulation.speed"));
}

#[test]
fn missing_config_file_fails() {
    bootsim()
        .args(["--config", "/nonexistent/bootsim.toml", "version"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load config file"));
}
