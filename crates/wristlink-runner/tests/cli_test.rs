//! CLI tests. The binary runs as a subprocess so each case gets a fresh
//! process and its own tracing subscriber.

use std::path::Path;
use std::process::{Command, Output};

fn wristlink(args: &[&str]) -> Output {
    // CARGO_BIN_EXE_wristlink is set by cargo when running tests for this crate
    let binary = env!("CARGO_BIN_EXE_wristlink");
    Command::new(binary)
        .args(args)
        .current_dir(env!("CARGO_MANIFEST_DIR"))
        .env("RUST_LOG", "warn")
        .output()
        .unwrap_or_else(|e| panic!("Failed to run {}: {}", binary, e))
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[test]
fn test_resource_transfer_over_lossy_link() {
    let output = wristlink(&[
        "--config",
        "tests/fixtures/lossy_link.yaml",
        "transfer",
        "--kind",
        "resource",
        "tests/fixtures/resource.txt",
    ]);
    let text = stdout(&output);
    assert!(output.status.success(), "stdout: {}", text);

    let size = std::fs::metadata(Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/resource.txt"))
        .unwrap()
        .len();
    // 32 byte MTU less the 6 byte envelope.
    let packets = (size as usize).div_ceil(26);
    assert!(text.contains("state: completed"), "stdout: {}", text);
    assert!(text.contains(&format!("bytes: {}", size)), "stdout: {}", text);
    assert!(text.contains(&format!("packets: {}", packets)), "stdout: {}", text);
    assert!(text.contains(&format!("progress: {}/{} (100%)", packets, packets)));
    assert!(!text.contains("acks dropped: 0"), "stdout: {}", text);
}

#[test]
fn test_market_dial_is_sent_unchanged() {
    let output = wristlink(&[
        "--config",
        "tests/fixtures/lossy_link.yaml",
        "transfer",
        "--kind",
        "market",
        "--dial-num",
        "42",
        "tests/fixtures/market_dial.bin",
    ]);
    let text = stdout(&output);
    assert!(output.status.success(), "stdout: {}", text);

    let dial = std::fs::read(Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/market_dial.bin")).unwrap();
    // 32 byte MTU less the 7 byte envelope.
    let packets = dial.len().div_ceil(25);
    assert!(text.contains("state: completed"), "stdout: {}", text);
    assert!(text.contains(&format!("bytes: {}", dial.len())), "stdout: {}", text);
    assert!(text.contains(&format!("packets: {}", packets)), "stdout: {}", text);
    assert!(text.contains(&format!("received: {}\n", hex::encode(&dial))), "stdout: {}", text);
}

#[test]
fn test_transfer_fails_when_acks_never_arrive() {
    let output = wristlink(&[
        "--config",
        "tests/fixtures/dead_link.yaml",
        "transfer",
        "--kind",
        "resource",
        "tests/fixtures/resource.txt",
    ]);
    let text = stdout(&output);
    assert!(!output.status.success());
    assert!(text.contains("state: failed"), "stdout: {}", text);
    assert!(text.contains("failure: transfer failed"), "stdout: {}", text);
}

#[test]
fn test_inspect_prints_state() {
    let output = wristlink(&["inspect", "514b01", "5c0100010201 00f0 00f0 03414243", "ff00"]);
    let text = stdout(&output);
    assert!(output.status.success(), "stdout: {}", text);
    assert!(text.contains("BatteryUpdated"), "stdout: {}", text);
    assert!(text.contains("DeviceInfoUpdated"), "stdout: {}", text);
    assert!(text.contains("Unrecognized"), "stdout: {}", text);
    assert!(text.contains("level: 75"), "stdout: {}", text);
    assert!(text.contains("serial: ABC"), "stdout: {}", text);
}

#[test]
fn test_inspect_rejects_bad_hex() {
    let output = wristlink(&["inspect", "zz"]);
    assert!(!output.status.success());
    // main returns the error, so its Debug form lands on stderr.
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Hex(InvalidHexCharacter"), "stderr: {}", stderr);
}

#[test]
fn test_config_reflects_file() {
    let output = wristlink(&["--config", "tests/fixtures/round_watch.yaml", "config"]);
    let text = stdout(&output);
    assert!(output.status.success());
    assert!(text.contains("shape: Round"), "stdout: {}", text);
    assert!(text.contains("max_bytes: 90000"), "stdout: {}", text);
    assert!(text.contains("max_retries: 3"), "stdout: {}", text);
    assert!(text.contains("color: Purple"), "stdout: {}", text);
}

#[test]
fn test_metrics_listing() {
    let output = wristlink(&["metrics"]);
    let text = stdout(&output);
    assert!(output.status.success());
    assert!(text.contains("wristlink.transfer.packets_sent"));
    assert!(text.contains("wristlink.codec.encoded_bytes"));
}

#[test]
fn test_missing_config_file() {
    let output = wristlink(&["--config", "tests/fixtures/absent.yaml", "config"]);
    assert!(!output.status.success());
}
