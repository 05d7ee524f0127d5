// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test utilities for CLI integration tests.

#![allow(dead_code)]

use assert_cmd::Command;
use serde_json::json;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Machine with one head and feeders for R0402 and C0603
pub const CONFIG: &str = r#"
[machine]
heads = ["H1"]

[[machine.feeders]]
id = "F1"
part = "R0402"
location = { x = 5.0, y = 5.0 }

[[machine.feeders]]
id = "F2"
part = "C0603"
location = { x = 5.0, y = 15.0 }
"#;

/// Temp directory holding `pnp.toml`
pub fn setup_test_env() -> TempDir {
    setup_with_config(CONFIG)
}

pub fn setup_with_config(config: &str) -> TempDir {
    let temp = TempDir::new().expect("Failed to create temp directory");
    fs::write(temp.path().join("pnp.toml"), config).expect("Failed to write config");
    temp
}

/// Write a one-board job using `parts` in order; placements are named R1, R2, ...
pub fn write_job(dir: &Path, name: &str, parts: &[&str]) {
    let placements: Vec<_> = parts
        .iter()
        .enumerate()
        .map(|(i, part)| {
            json!({
                "id": format!("R{}", i + 1),
                "part": { "id": part },
                "location": { "x": 10.0 * (i + 1) as f64, "y": 10.0 },
            })
        })
        .collect();
    let job = json!({
        "board_locations": [{
            "board": { "name": "main", "placements": placements },
            "location": { "x": 100.0, "y": 50.0 },
        }]
    });
    fs::write(dir.join(name), job.to_string()).expect("Failed to write job");
}

pub fn pnp(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("pnp").expect("pnp binary");
    cmd.current_dir(dir).env("RUST_LOG", "warn");
    cmd
}
