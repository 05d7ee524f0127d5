// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! CLI integration tests for `pnp check` and configuration loading

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(deprecated)]

mod common;

use common::{pnp, setup_test_env, setup_with_config};
use predicates::prelude::*;

#[test]
fn test_check_describes_machine() {
    let temp = setup_test_env();

    pnp(temp.path())
        .arg("check")
        .assert()
        .success()
        .stdout(predicate::str::contains("config ok"))
        .stdout(predicate::str::contains("heads: H1"))
        .stdout(predicate::str::contains("F1 R0402 at (5.000, 5.000"))
        .stdout(predicate::str::contains("pick failures: skip"));
}

#[test]
fn test_check_without_config_uses_defaults() {
    let temp = tempfile::TempDir::new().unwrap();

    pnp(temp.path())
        .arg("check")
        .assert()
        .success()
        .stdout(predicate::str::contains("heads: H1"))
        .stdout(predicate::str::contains("feeders: none"));
}

#[test]
fn test_check_json() {
    let temp = setup_with_config("[delegate]\npolicy = \"retry\"\nmax_retries = 2\n");

    let output = pnp(temp.path())
        .args(["check", "--format", "json"])
        .output()
        .unwrap();

    assert!(output.status.success());
    let config: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(config["delegate"]["policy"], "retry");
    assert_eq!(config["delegate"]["max_retries"], 2);
}

#[test]
fn test_explicit_missing_config_fails() {
    let temp = setup_test_env();

    pnp(temp.path())
        .args(["--config", "machine.toml", "check"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("config file not found: machine.toml"))
        .stderr(predicate::str::contains("suggestions:"));
}

#[test]
fn test_invalid_config_fails() {
    let temp = setup_with_config("[machine]\nheads = []\n");

    pnp(temp.path())
        .arg("check")
        .assert()
        .failure()
        .stderr(predicate::str::contains("machine has no heads"));
}

#[test]
fn test_unknown_policy_fails() {
    let temp = setup_with_config("[delegate]\npolicy = \"ignore\"\n");

    pnp(temp.path())
        .arg("check")
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid config"));
}
