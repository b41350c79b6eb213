// e2e/cli_integration.rs — black-box tests of the `btf` binary.
//
// Drives the inspector CLI with std::process::Command over files staged in
// a TempDir: exit codes, check/stat output, limit flags, UTF-8 validation.

use std::fs;
use std::path::PathBuf;
use std::process::Command;

use tempfile::TempDir;

use btf::Writer;

/// Locate the `btf` binary produced by Cargo.
fn btf_bin() -> PathBuf {
    if let Ok(p) = std::env::var("CARGO_BIN_EXE_btf") {
        return PathBuf::from(p);
    }
    let mut p = std::env::current_exe().unwrap();
    p.pop();
    if p.ends_with("deps") {
        p.pop();
    }
    p.push("btf");
    p
}

/// Stage one encoded document in a temp dir.
fn stage(bytes: &[u8]) -> (TempDir, PathBuf) {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("doc.btf");
    fs::write(&path, bytes).unwrap();
    (dir, path)
}

fn sample_doc() -> Vec<u8> {
    let mut w = Writer::new();
    w.start_map(2);
    w.write_str("name");
    w.write_str("example");
    w.write_str("values");
    w.start_array(3);
    w.write_int(1);
    w.write_int(2);
    w.write_int(3);
    w.finish_array();
    w.finish_map();
    w.into_bytes().unwrap()
}

/// check on a well-formed file exits 0 and reports size and node count.
#[test]
fn check_accepts_valid_file() {
    let (_dir, path) = stage(&sample_doc());
    let out = Command::new(btf_bin())
        .args(["check", path.to_str().unwrap()])
        .output()
        .expect("failed to run btf check");
    assert!(out.status.success(), "stderr: {}", String::from_utf8_lossy(&out.stderr));
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("ok"), "{stdout}");
    assert!(stdout.contains("8 nodes"), "{stdout}");
}

/// check on malformed bytes exits 1 and names the error kind.
#[test]
fn check_rejects_malformed_file() {
    let (_dir, path) = stage(&[0xc1]);
    let out = Command::new(btf_bin())
        .args(["check", path.to_str().unwrap()])
        .output()
        .expect("failed to run btf check");
    assert!(!out.status.success());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("invalid"), "{stderr}");
}

/// check flags trailing bytes after the message.
#[test]
fn check_rejects_trailing_bytes() {
    let mut bytes = sample_doc();
    bytes.push(0x00);
    let (_dir, path) = stage(&bytes);
    let out = Command::new(btf_bin())
        .args(["check", path.to_str().unwrap()])
        .output()
        .expect("failed to run btf check");
    assert!(!out.status.success());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("trailing"), "{stderr}");
}

/// --max-nodes surfaces the too_big kind through the CLI.
#[test]
fn check_applies_node_limit() {
    let (_dir, path) = stage(&sample_doc());
    let out = Command::new(btf_bin())
        .args(["check", "--max-nodes", "3", path.to_str().unwrap()])
        .output()
        .expect("failed to run btf check");
    assert!(!out.status.success());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("too_big"), "{stderr}");
}

/// --utf8 rejects documents holding invalid string payloads.
#[test]
fn check_utf8_flag() {
    // A map with one key whose payload is invalid UTF-8.
    let bytes = vec![0x81, 0xa2, 0xff, 0xfe, 0xc0];
    let (_dir, path) = stage(&bytes);

    let ok = Command::new(btf_bin())
        .args(["check", path.to_str().unwrap()])
        .output()
        .expect("failed to run btf check");
    assert!(ok.status.success(), "without --utf8 the bytes are fine");

    let strict = Command::new(btf_bin())
        .args(["check", "--utf8", path.to_str().unwrap()])
        .output()
        .expect("failed to run btf check");
    assert!(!strict.status.success());
    let stderr = String::from_utf8_lossy(&strict.stderr);
    assert!(stderr.contains("UTF-8"), "{stderr}");
}

/// stat prints size, node count, depth, and per-kind counts.
#[test]
fn stat_reports_structure() {
    let (_dir, path) = stage(&sample_doc());
    let out = Command::new(btf_bin())
        .args(["stat", path.to_str().unwrap()])
        .output()
        .expect("failed to run btf stat");
    assert!(out.status.success());
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("nodes:     8"), "{stdout}");
    assert!(stdout.contains("max depth: 3"), "{stdout}");
    assert!(stdout.contains("map"), "{stdout}");
    assert!(stdout.contains("array"), "{stdout}");
    assert!(stdout.contains("uint"), "{stdout}");
}

/// A missing file is an error with a readable message, not a panic.
#[test]
fn missing_file_fails_cleanly() {
    let out = Command::new(btf_bin())
        .args(["check", "/nonexistent/path.btf"])
        .output()
        .expect("failed to run btf check");
    assert!(!out.status.success());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("reading"), "{stderr}");
}
