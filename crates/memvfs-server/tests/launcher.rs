//! Exit-code tests for the `memvfs` binary.
//!
//! None of these reach an actual mount, so they run without FUSE.

use std::process::{Command, Output};

fn memvfs(args: &[&str], config: Option<&std::path::Path>) -> Output {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_memvfs"));
    cmd.args(args).env_remove("RUST_LOG");
    match config {
        Some(path) => cmd.env("MEMVFS_CONFIG", path),
        None => cmd.env_remove("MEMVFS_CONFIG"),
    };
    cmd.output().expect("failed to run memvfs")
}

#[test]
fn no_arguments_is_a_usage_error() {
    let out = memvfs(&[], None);
    assert_eq!(out.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&out.stderr).contains("USAGE"));
}

#[test]
fn two_arguments_is_a_usage_error() {
    let out = memvfs(&["/mnt/a", "/mnt/b"], None);
    assert_eq!(out.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&out.stderr).contains("exactly one"));
}

#[test]
fn help_exits_cleanly() {
    let out = memvfs(&["--help"], None);
    assert_eq!(out.status.code(), Some(0));
    assert!(String::from_utf8_lossy(&out.stderr).contains("memvfs <mountpoint>"));
}

#[test]
fn missing_mountpoint_fails() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("config.ron");
    std::fs::write(&config, "()").unwrap();

    let missing = dir.path().join("not-here");
    let out = memvfs(&[missing.to_str().unwrap()], Some(&config));
    assert_eq!(out.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("not an existing directory"));
    // Where the config came from is logged once tracing is up
    assert!(stderr.contains("config loaded"));
    assert!(stderr.contains("config.ron"));
}

#[test]
fn broken_explicit_config_fails() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("config.ron");
    std::fs::write(&config, "(fs_name: ").unwrap();

    let out = memvfs(&[dir.path().to_str().unwrap()], Some(&config));
    assert_eq!(out.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&out.stderr).contains("invalid config"));
}
