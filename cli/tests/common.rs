//! # Juspawn CLI Integration Test Common Helpers
//!
//! File: cli/tests/common.rs
//! Author: Christi Mahu
//!
//! ## Overview
//!
//! Shared helpers for the integration tests in `cli/tests/`. Each `.rs` file
//! in that directory is compiled as a separate test crate and runs the built
//! `juspawn` binary.
//!

// Different test files use different helpers.
#![allow(dead_code)]

pub use assert_cmd::Command;
use std::path::Path;

/// # Get Juspawn Command (`juspawn_cmd`)
///
/// Creates an `assert_cmd::Command` for the compiled `juspawn` binary with
/// environment overrides that could change its behaviour removed.
///
/// ## Panics
/// Panics if the `juspawn` binary cannot be found via `Command::cargo_bin`.
pub fn juspawn_cmd() -> Command {
    let mut cmd = Command::cargo_bin("juspawn").expect("Failed to find juspawn binary for testing");
    cmd.env_remove("JUSPAWN_IMAGE").env_remove("RUST_LOG");
    cmd
}

/// Writes `content` as a config file inside `dir` and returns its path.
pub fn write_config(dir: &Path, content: &str) -> std::path::PathBuf {
    let path = dir.join("config.toml");
    std::fs::write(&path, content).expect("Failed to write test config");
    path
}
