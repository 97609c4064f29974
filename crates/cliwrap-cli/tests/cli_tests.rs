// SPDX-License-Identifier: MIT OR Apache-2.0
//! Integration tests for the `cliwrap` binary.

use assert_cmd::Command;
use predicates::str::contains;
use std::io::Write;

fn cliwrap() -> Command {
    #[allow(deprecated)]
    Command::cargo_bin("cliwrap").expect("binary `cliwrap` should be built")
}

const SH_CONFIG: &str = r#"
program = "sh"

[commands.say]
output = "lines"

[[commands.say.parameters]]
name = "c"
type = "text"

[commands.fail]
output = "lines"

[[commands.fail.parameters]]
name = "c"
type = "text"
default = "exit 4"
"#;

fn config_file() -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().expect("create temp config");
    file.write_all(SH_CONFIG.as_bytes()).expect("write config");
    file
}

// ── Help & version ──────────────────────────────────────────────────

#[test]
fn help_flag_prints_usage() {
    cliwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(contains("commands"))
        .stdout(contains("args"))
        .stdout(contains("run"))
        .stdout(contains("schema"));
}

#[test]
fn version_flag_prints_version() {
    cliwrap()
        .arg("--version")
        .assert()
        .success()
        .stdout(contains(env!("CARGO_PKG_VERSION")));
}

// ── Schema ──────────────────────────────────────────────────────────

#[test]
fn schema_is_valid_json() {
    let out = cliwrap().arg("schema").output().expect("run cliwrap");
    assert!(out.status.success());
    let schema: serde_json::Value = serde_json::from_slice(&out.stdout).expect("json schema");
    assert!(schema["properties"]["commands"].is_object());
}

// ── Config-driven subcommands ───────────────────────────────────────

#[test]
fn commands_lists_configured_commands() {
    let cfg = config_file();
    cliwrap()
        .arg("--config")
        .arg(cfg.path())
        .arg("commands")
        .assert()
        .success()
        .stdout(contains("program: sh"))
        .stdout(contains("say\tc"))
        .stdout(contains("fail\tc"));
}

#[test]
fn args_prints_the_constructed_string() {
    let cfg = config_file();
    cliwrap()
        .arg("--config")
        .arg(cfg.path())
        .args(["args", "say", "--param", "c=echo hi"])
        .assert()
        .success()
        .stdout(contains("-c \"echo hi\""));
}

#[test]
fn args_rejects_malformed_params() {
    let cfg = config_file();
    cliwrap()
        .arg("--config")
        .arg(cfg.path())
        .args(["args", "say", "--param", "novalue"])
        .assert()
        .failure()
        .stderr(contains("KEY=VALUE"));
}

#[test]
fn unknown_command_fails() {
    let cfg = config_file();
    cliwrap()
        .arg("--config")
        .arg(cfg.path())
        .args(["args", "shout"])
        .assert()
        .failure()
        .stderr(contains("unknown command 'shout'"));
}

#[test]
fn missing_config_fails() {
    cliwrap()
        .args(["--config", "/no/such/cliwrap.toml", "commands"])
        .assert()
        .failure()
        .stderr(contains("load config"));
}

#[cfg(unix)]
#[test]
fn run_prints_parsed_lines() {
    let cfg = config_file();
    cliwrap()
        .arg("--config")
        .arg(cfg.path())
        .args(["run", "say", "--param", "c=echo hello; echo world"])
        .assert()
        .success()
        .stdout(contains("hello\nworld"));
}

#[cfg(unix)]
#[test]
fn run_json_reports_output_and_exit_code() {
    let cfg = config_file();
    let out = cliwrap()
        .arg("--config")
        .arg(cfg.path())
        .args(["run", "say", "--json", "--param", "c=echo hello"])
        .output()
        .expect("run cliwrap");
    assert!(out.status.success());
    let report: serde_json::Value = serde_json::from_slice(&out.stdout).expect("json report");
    assert_eq!(report["output"], serde_json::json!(["hello"]));
    assert_eq!(report["exit_code"], 0);
    assert_eq!(report["arguments"], "-c \"echo hello\"");
}

#[cfg(unix)]
#[test]
fn run_fails_when_the_program_fails() {
    let cfg = config_file();
    cliwrap()
        .arg("--config")
        .arg(cfg.path())
        .args(["run", "fail"])
        .assert()
        .failure()
        .stderr(contains("code Some(4)"));
}
