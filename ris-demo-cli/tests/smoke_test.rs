//! Smoke tests for ris-demo-cli
//!
//! These tests verify basic functionality of the CLI without requiring
//! network access or a RIS account.

use std::process::{Command, Output};

/// Ascii85 form of `ris-sdk-test-configuration-key`.
const TEST_KEY_ENCODED: &str = r"EbTSHF(B&<FCfN8/Rr^:Anbn#Eaa'(Df..BAU+";
const TEST_KEY_FINGERPRINT: &str =
    "873d2db501e91cd27e634ae2ab0a006f1fa7f47e025a6932fb78c98ef93a89cd";

fn ris_demo(args: &[&str]) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_ris-demo"));
    cmd.args(args);
    for var in [
        "RIS_URL",
        "RIS_API_KEY",
        "RIS_API_KEY_FILE",
        "RIS_CONFIG_KEY",
        "RIS_CONFIG_KEY_FINGERPRINT",
        "RIS_MIGRATION_MODE_ENABLED",
        "RUST_LOG",
    ] {
        cmd.env_remove(var);
    }
    cmd
}

fn run(cmd: &mut Command) -> Output {
    let output = cmd.output().expect("Failed to execute ris-demo");
    if !output.status.success() {
        eprintln!("stdout: {}", String::from_utf8_lossy(&output.stdout));
        eprintln!("stderr: {}", String::from_utf8_lossy(&output.stderr));
    }
    output
}

/// Test that the CLI can show help
#[test]
fn test_cli_help() {
    let output = run(&mut ris_demo(&["--help"]));
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success());
    assert!(stdout.contains("inquiry"), "Help should mention 'inquiry'");
    assert!(stdout.contains("khash"), "Help should mention 'khash'");
}

/// Test that version is shown
#[test]
fn test_cli_version() {
    let output = run(&mut ris_demo(&["--version"]));
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("ris-demo"));
}

/// Masking works offline without any configuration
#[test]
fn test_cli_mask() {
    let output = run(&mut ris_demo(&["mask", "0007380568572514"]));
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success());
    assert!(stdout.contains("000738XXXXXX2514"));
    assert!(stdout.contains("2514"));
}

/// Short tokens are rejected
#[test]
fn test_cli_mask_short_token_fails() {
    let output = run(&mut ris_demo(&["mask", "411111"]));
    assert!(!output.status.success());
}

/// KHASH uses the configuration key from the environment
#[test]
fn test_cli_khash() {
    let output = run(ris_demo(&["khash", "4111111111111111"])
        .env("RIS_CONFIG_KEY", TEST_KEY_ENCODED)
        .env("RIS_CONFIG_KEY_FINGERPRINT", TEST_KEY_FINGERPRINT));
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("41111128CFDMLHXX5Q0J"));

    let output = run(ris_demo(&["khash", "4111111111111111", "--merchant-id", "666666"])
        .env("RIS_CONFIG_KEY", TEST_KEY_ENCODED)
        .env("RIS_CONFIG_KEY_FINGERPRINT", TEST_KEY_FINGERPRINT));
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("66666628CFDMLHXX5Q0J"));
}

/// A wrong fingerprint is fatal
#[test]
fn test_cli_khash_wrong_fingerprint() {
    let wrong = "0".repeat(64);
    let output = run(ris_demo(&["khash", "4111111111111111"])
        .env("RIS_CONFIG_KEY", TEST_KEY_ENCODED)
        .env("RIS_CONFIG_KEY_FINGERPRINT", &wrong));
    assert!(!output.status.success());
}

/// Config reports what is missing
#[test]
fn test_cli_config_missing() {
    let output = run(&mut ris_demo(&["config"]));
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("RIS_CONFIG_KEY"));
}

/// Config loads an API key file
#[test]
fn test_cli_config_with_key_file() {
    use std::io::Write;

    let mut key_file = tempfile::NamedTempFile::new().expect("Failed to create key file");
    writeln!(key_file, "api-key-from-file").unwrap();

    let output = run(ris_demo(&["config"])
        .env("RIS_URL", "https://risk.test.kount.net")
        .env("RIS_API_KEY_FILE", key_file.path())
        .env("RIS_CONFIG_KEY", TEST_KEY_ENCODED)
        .env("RIS_CONFIG_KEY_FINGERPRINT", TEST_KEY_FINGERPRINT));
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success());
    assert!(stdout.contains("direct"));
    assert!(!stdout.contains("api-key-from-file"));
}
