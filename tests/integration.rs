use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use prost::Message;
use tempfile::TempDir;

use run_ledger::event_log::proto;

fn rled_binary() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // remove test binary name
    path.pop(); // remove deps/
    path.push("rled");
    path
}

fn masked_crc32c(bytes: &[u8]) -> u32 {
    crc32c::crc32c(bytes)
        .rotate_right(15)
        .wrapping_add(0xa282_ead8)
}

fn frame(payload: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(payload.len() + 16);
    let length = (payload.len() as u64).to_le_bytes();
    out.extend_from_slice(&length);
    out.extend_from_slice(&masked_crc32c(&length).to_le_bytes());
    out.extend_from_slice(payload);
    out.extend_from_slice(&masked_crc32c(payload).to_le_bytes());
    out
}

fn scalar_event(tag: &str, wall_time: f64, step: i64, value: f32) -> proto::Event {
    proto::Event {
        wall_time,
        step,
        file_version: None,
        summary: Some(proto::Summary {
            value: vec![proto::SummaryValue {
                tag: tag.to_string(),
                simple_value: Some(value),
            }],
        }),
    }
}

fn write_event_file(dir: &Path, events: &[proto::Event]) {
    let mut bytes = Vec::new();
    let version = proto::Event {
        wall_time: 0.0,
        step: 0,
        file_version: Some("brain.Event:2".to_string()),
        summary: None,
    };
    bytes.extend_from_slice(&frame(&version.encode_to_vec()));
    for event in events {
        bytes.extend_from_slice(&frame(&event.encode_to_vec()));
    }
    fs::write(dir.join("events.out.tfevents.1700000000.testhost"), bytes).unwrap();
}

fn setup_logdir(events: &[proto::Event]) -> TempDir {
    let tmp = TempDir::new().unwrap();
    let logdir = tmp.path().join("runs").join("baseline");
    fs::create_dir_all(&logdir).unwrap();
    write_event_file(&logdir, events);
    tmp
}

fn run_rled(args: &[&str]) -> (String, String, bool) {
    let binary = rled_binary();
    let output = Command::new(&binary)
        .args(args)
        .output()
        .unwrap_or_else(|e| panic!("Failed to run rled binary at {:?}: {}", binary, e));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let success = output.status.success();
    (stdout, stderr, success)
}

#[test]
fn test_export_csv() {
    let tmp = setup_logdir(&[
        scalar_event("loss", 1700000000.0, 0, 1.0),
        scalar_event("acc", 1700000000.0, 0, 0.25),
        scalar_event("loss", 1700000060.0, 1, 0.5),
        scalar_event("acc", 1700000060.0, 1, 0.75),
    ]);
    let logdir = tmp.path().join("runs").join("baseline");
    let out = tmp.path().join("scalars.csv");

    let (stdout, stderr, success) = run_rled(&[
        "export",
        "csv",
        "--logdir",
        logdir.to_str().unwrap(),
        "--out",
        out.to_str().unwrap(),
    ]);
    assert!(success, "export failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("ok"));

    let written = fs::read_to_string(&out).unwrap();
    let mut lines = written.lines();
    assert_eq!(lines.next(), Some("acc,loss"));
    assert_eq!(lines.next(), Some("0.25,1"));
    assert_eq!(lines.next(), Some("0.75,0.5"));
}

#[test]
fn test_export_csv_uneven_columns_fails_without_writing() {
    let tmp = setup_logdir(&[
        scalar_event("loss", 1700000000.0, 0, 1.0),
        scalar_event("loss", 1700000060.0, 1, 0.5),
        scalar_event("acc", 1700000000.0, 0, 0.25),
        scalar_event("acc", 1700000060.0, 1, 0.5),
        scalar_event("acc", 1700000120.0, 2, 0.75),
    ]);
    let logdir = tmp.path().join("runs").join("baseline");
    let out = tmp.path().join("scalars.csv");

    let (_, stderr, success) = run_rled(&[
        "export",
        "csv",
        "--logdir",
        logdir.to_str().unwrap(),
        "--out",
        out.to_str().unwrap(),
    ]);
    assert!(!success, "uneven columns must fail the export");
    assert!(stderr.contains("lengths differ"), "stderr: {}", stderr);
    assert!(!out.exists(), "no partial file may be written");
}

#[test]
fn test_export_json_unpack() {
    let tmp = setup_logdir(&[
        scalar_event("loss", 1700000000.0, 0, 1.0),
        scalar_event("loss", 1700000060.0, 1, 0.5),
        scalar_event("loss", 1700000120.0, 2, 0.25),
    ]);
    let logdir = tmp.path().join("runs").join("baseline");
    let out = tmp.path().join("scalars.json");

    let (stdout, stderr, success) = run_rled(&[
        "export",
        "json",
        "--logdir",
        logdir.to_str().unwrap(),
        "--out",
        out.to_str().unwrap(),
        "--mode",
        "unpack",
    ]);
    assert!(success, "export failed: stdout={}, stderr={}", stdout, stderr);

    let parsed: serde_json::Value = serde_json::from_str(&fs::read_to_string(&out).unwrap()).unwrap();
    let loss = &parsed["loss"];
    assert_eq!(loss["steps"].as_array().unwrap().len(), 3);
    assert_eq!(loss["values"].as_array().unwrap().len(), 3);
    let timestamps = loss["timestamps"].as_array().unwrap();
    assert_eq!(timestamps.len(), 3);
    assert!(timestamps[0].as_str().unwrap().contains('T'));
}

#[test]
fn test_export_suffix_filter() {
    let tmp = setup_logdir(&[
        scalar_event("train/loss", 1700000000.0, 0, 1.0),
        scalar_event("train/lr", 1700000000.0, 0, 0.001),
    ]);
    let logdir = tmp.path().join("runs").join("baseline");
    let out = tmp.path().join("scalars.json");

    let (_, _, success) = run_rled(&[
        "export",
        "json",
        "--logdir",
        logdir.to_str().unwrap(),
        "--out",
        out.to_str().unwrap(),
        "--suffix",
        "loss",
    ]);
    assert!(success);

    let parsed: serde_json::Value = serde_json::from_str(&fs::read_to_string(&out).unwrap()).unwrap();
    let object = parsed.as_object().unwrap();
    assert_eq!(object.len(), 1);
    assert!(object.contains_key("train/loss"));
}

#[test]
fn test_export_csv_rejects_unpack_mode() {
    let tmp = setup_logdir(&[scalar_event("loss", 1700000000.0, 0, 1.0)]);
    let logdir = tmp.path().join("runs").join("baseline");
    let out = tmp.path().join("scalars.csv");

    let (_, stderr, success) = run_rled(&[
        "export",
        "csv",
        "--logdir",
        logdir.to_str().unwrap(),
        "--out",
        out.to_str().unwrap(),
        "--mode",
        "unpack",
    ]);
    assert!(!success);
    assert!(stderr.contains("strip mode only"), "stderr: {}", stderr);
}

#[test]
fn test_export_packed_is_unsupported() {
    let tmp = setup_logdir(&[scalar_event("loss", 1700000000.0, 0, 1.0)]);
    let logdir = tmp.path().join("runs").join("baseline");
    let out = tmp.path().join("scalars.bin");

    let (_, stderr, success) = run_rled(&[
        "export",
        "packed",
        "--logdir",
        logdir.to_str().unwrap(),
        "--out",
        out.to_str().unwrap(),
    ]);
    assert!(!success);
    assert!(stderr.contains("not implemented"), "stderr: {}", stderr);
}
