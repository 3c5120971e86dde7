#![cfg(all(unix, feature = "cli"))]

use std::io::Write;
use std::process::{Command, Output, Stdio};

fn framed(tag: u8, payload: &[u8]) -> Vec<u8> {
    let mut out = vec![tag, 0, 0, 0];
    out.extend_from_slice(&(payload.len() as u32).to_be_bytes());
    out.extend_from_slice(payload);
    out
}

fn mediaharness(args: &[&str], stdin: &[u8]) -> Output {
    let mut child = Command::new(env!("CARGO_BIN_EXE_mediaharness"))
        .args(["--log-level", "error"])
        .args(args)
        .env_remove("MEDIAHARNESS_DEMUX_MODE")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("mediaharness should start");
    child
        .stdin
        .take()
        .expect("stdin should be piped")
        .write_all(stdin)
        .expect("stdin should accept input");
    child.wait_with_output().expect("mediaharness should exit")
}

#[test]
fn unframe_strips_headers_from_stdin() {
    let mut raw = framed(1, b"{\"format\":");
    raw.extend(framed(2, b"{}}"));

    let output = mediaharness(&["unframe"], &raw);
    assert!(output.status.success());
    assert_eq!(output.stdout, b"{\"format\":{}}");
}

#[test]
fn unframe_selects_one_stream() {
    let mut raw = framed(1, b"out\n");
    raw.extend(framed(2, b"err\n"));
    raw.extend(framed(1, b"more\n"));

    let output = mediaharness(&["unframe", "--stream", "stdout"], &raw);
    assert!(output.status.success());
    assert_eq!(output.stdout, b"out\nmore\n");

    let output = mediaharness(&["unframe", "--stream", "stderr"], &raw);
    assert_eq!(output.stdout, b"err\n");
}

#[test]
fn modes_differ_on_header_like_payload() {
    let mut payload = vec![2, 0, 0, 0, 0, 0, 0, 0];
    payload.extend_from_slice(b"tail");
    let raw = framed(1, &payload);

    let length = mediaharness(&["unframe", "--mode", "length"], &raw);
    assert_eq!(length.stdout, payload);

    let heuristic = mediaharness(&["unframe", "--mode", "heuristic"], &raw);
    assert_eq!(heuristic.stdout, b"tail");
}

#[test]
fn unframed_input_passes_through() {
    let output = mediaharness(&["unframe"], b"plain text, no headers\n");
    assert!(output.status.success());
    assert_eq!(output.stdout, b"plain text, no headers\n");
}

#[test]
fn strict_unframe_rejects_plain_text() {
    let output = mediaharness(&["unframe", "--strict"], b"plain text, no headers\n");
    assert_eq!(output.status.code(), Some(60));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("unframe"), "{stderr}");
}

#[test]
fn strict_unframe_selects_stream() {
    let mut raw = framed(2, b"warn\n");
    raw.extend(framed(1, b"{}"));
    raw.extend(framed(2, b"done\n"));

    let output = mediaharness(&["unframe", "--strict", "--stream", "stderr"], &raw);
    assert!(output.status.success());
    assert_eq!(output.stdout, b"warn\ndone\n");

    let output = mediaharness(&["unframe", "--strict"], &raw);
    assert_eq!(output.stdout, b"warn\n{}done\n");
}

#[test]
fn frame_then_unframe() {
    let framed_out = mediaharness(&["frame", "--stream", "stderr", "--chunk", "4"], b"abcdefghij");
    assert!(framed_out.status.success());
    assert_eq!(framed_out.stdout.len(), 3 * 8 + 10);
    assert_eq!(&framed_out.stdout[..8], &[2, 0, 0, 0, 0, 0, 0, 4]);

    let output = mediaharness(&["unframe", "--stream", "stderr"], &framed_out.stdout);
    assert_eq!(output.stdout, b"abcdefghij");
}

#[test]
fn missing_input_file_is_reported() {
    let output = mediaharness(&["unframe", "--input", "/nonexistent/logs.bin"], b"");
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("read /nonexistent/logs.bin"), "{stderr}");
}

#[test]
fn list_outputs_catalog_as_json() {
    let output = mediaharness(&["--format", "json", "list", "--tool", "ffprobe"], b"");
    assert!(output.status.success());

    let entries: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("list output should be JSON");
    let names: Vec<&str> = entries
        .as_array()
        .expect("list output should be an array")
        .iter()
        .filter_map(|e| e["name"].as_str())
        .collect();
    assert_eq!(
        names,
        vec!["ffprobe/basic-info", "ffprobe/json-output", "ffprobe/stream-info"]
    );
    assert_eq!(entries[0]["image"], "ghcr.io/veloxpack/ffprobe:latest");
}

#[test]
fn list_honours_image_override() {
    let output = Command::new(env!("CARGO_BIN_EXE_mediaharness"))
        .args(["--format", "raw", "list", "--tool", "shaka-packager"])
        .env("MEDIAHARNESS_SHAKA_PACKAGER_IMAGE", "google/shaka-packager:v3.4.2")
        .output()
        .expect("list should run");
    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout).lines().count(), 8);

    let output = Command::new(env!("CARGO_BIN_EXE_mediaharness"))
        .args(["--format", "json", "list", "--tool", "shaka-packager"])
        .env("MEDIAHARNESS_SHAKA_PACKAGER_IMAGE", "google/shaka-packager:v3.4.2")
        .output()
        .expect("list should run");
    let entries: serde_json::Value = serde_json::from_slice(&output.stdout).expect("json");
    assert_eq!(entries[0]["image"], "google/shaka-packager:v3.4.2");
}

#[test]
fn run_without_daemon_exits_3() {
    let dir = tempfile::tempdir().expect("temp dir");
    let socket = dir.path().join("missing.sock");
    let host = format!("unix://{}", socket.display());

    let output = Command::new(env!("CARGO_BIN_EXE_mediaharness"))
        .args(["--log-level", "error", "run", "ffprobe", "--docker-host", &host])
        .output()
        .expect("run should start");
    assert_eq!(output.status.code(), Some(3));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("docker daemon unreachable"), "{stderr}");
}

#[test]
fn run_unknown_scenario_exits_64() {
    let output = mediaharness(&["run", "ffprobe/does-not-exist"], b"");
    assert_eq!(output.status.code(), Some(64));
}

#[test]
fn version_prints_package_version() {
    let output = mediaharness(&["version"], b"");
    assert!(output.status.success());
    assert_eq!(
        String::from_utf8_lossy(&output.stdout).trim(),
        format!("mediaharness {}", env!("CARGO_PKG_VERSION"))
    );
}
