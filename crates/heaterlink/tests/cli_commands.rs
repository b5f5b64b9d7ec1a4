#![cfg(feature = "cli")]

use std::process::{Command, Output};

const SCENARIO: &str = "AA 00 00 03 00 01 05 78 00 14 00 F4 01 32 00 32 00";

fn heaterlink(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_heaterlink"))
        .arg("--log-level")
        .arg("error")
        .args(args)
        .env_remove("MQTT_PREFIX")
        .env_remove("MQTT_DISCOVERY_PREFIX")
        .output()
        .expect("heaterlink should run")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[test]
fn version_prints_package_version() {
    let output = heaterlink(&["version"]);

    assert!(output.status.success());
    assert_eq!(
        stdout(&output).trim(),
        format!("heaterlink {}", env!("CARGO_PKG_VERSION"))
    );
}

#[test]
fn decode_reports_scenario_fields_as_json() {
    let output = heaterlink(&["--format", "json", "decode", SCENARIO]);

    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_str(stdout(&output).trim())
        .expect("decode output should be JSON");
    assert_eq!(value["running_mode"], 0);
    assert_eq!(value["set_level"], 20);
    assert_eq!(value["running_step_message"], "Self-test");
    assert_eq!(value["error_message"], "No fault");
    assert_eq!(value["case_temperature"], 50);
    assert_eq!(value["cab_temperature"], 50);
    assert!(value.get("set_temperature").is_none());
}

#[test]
fn decode_rejects_bad_marker_with_data_invalid() {
    let output = heaterlink(&["decode", "55000003000105780014 00F4013200 3200"]);

    assert_eq!(output.status.code(), Some(60));
    assert!(String::from_utf8_lossy(&output.stderr).contains("decode failed"));
}

#[test]
fn decode_rejects_non_hex_with_usage() {
    let output = heaterlink(&["decode", "not-a-frame"]);
    assert_eq!(output.status.code(), Some(64));
}

#[test]
fn encode_level_frame() {
    let output = heaterlink(&["--format", "json", "encode", "level", "12"]);

    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_str(stdout(&output).trim())
        .expect("encode output should be JSON");
    assert_eq!(value["frame"], "aa550c22040c003e");
    assert_eq!(value["command_name"], "set-level");
    assert_eq!(value["pairing"], false);
}

#[test]
fn encode_rejects_out_of_range_level() {
    let output = heaterlink(&["encode", "level", "40"]);

    assert_eq!(output.status.code(), Some(64));
    assert!(String::from_utf8_lossy(&output.stderr).contains("invalid level 40"));
}

#[test]
fn encode_pairing_frame_uses_pairing_variant() {
    let output = heaterlink(&["--format", "json", "encode", "start", "--pairing"]);

    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_str(stdout(&output).trim())
        .expect("encode output should be JSON");
    assert_eq!(value["pairing"], true);
    let frame = value["frame"].as_str().expect("frame is a string");
    assert!(frame.starts_with("aa66"));
}

#[test]
fn simulate_dry_run_announces_and_publishes_state() {
    let output = heaterlink(&[
        "--format",
        "json",
        "simulate",
        "--dry-run",
        "--duration",
        "1",
        "--mac",
        "ec:b1:c3:00:3c:56",
        "--device-name",
        "Garage",
        "--device-model",
        "5kW",
        "--topic-prefix",
        "home",
    ]);

    assert!(output.status.success());
    let lines: Vec<serde_json::Value> = stdout(&output)
        .lines()
        .map(|line| serde_json::from_str(line).expect("each line is JSON"))
        .collect();

    assert!(lines.iter().any(|m| {
        m["topic"] == "homeassistant/button/BYD-ECB1C3003C56/start/config"
            && m["retain"] == true
    }));
    assert!(lines.iter().any(|m| {
        m["topic"] == "home/BYD-ECB1C3003C56/status/state" && m["payload"] == "Standby"
    }));
    assert!(lines.iter().any(|m| {
        m["topic"] == "home/BYD-ECB1C3003C56/start/av" && m["payload"] == "online"
    }));
}
