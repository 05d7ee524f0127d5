// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! CLI integration tests for `pnp run`

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(deprecated)]

mod common;

use common::{pnp, setup_test_env, setup_with_config, write_job, CONFIG};
use predicates::prelude::*;
use std::fs;

#[test]
fn test_pnp_help() {
    let temp = setup_test_env();
    pnp(temp.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("pick-and-place"));
}

#[test]
fn test_pnp_version() {
    let temp = setup_test_env();
    pnp(temp.path())
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("pnp"));
}

#[test]
fn test_run_places_every_part() {
    let temp = setup_test_env();
    write_job(temp.path(), "job.json", &["R0402", "C0603", "R0402"]);

    pnp(temp.path())
        .args(["run", "--job", "job.json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("job stopped -> running"))
        .stdout(predicate::str::contains("main/R1 picked from F1"))
        .stdout(predicate::str::contains("main/R2 picked from F2"))
        .stdout(predicate::str::contains("main/R3 placed"))
        .stdout(predicate::str::contains("board main completed"))
        .stdout(predicate::str::contains("job completed: 3 placed, 0 skipped"));
}

#[test]
fn test_run_missing_feeder_fails() {
    let temp = setup_test_env();
    write_job(temp.path(), "job.json", &["R0402", "QFN-32"]);

    pnp(temp.path())
        .args(["run", "--job", "job.json"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("main/R1 placed"))
        .stdout(predicate::str::contains("job error (missing feeder)"))
        .stdout(predicate::str::contains("QFN-32"))
        .stdout(predicate::str::contains("job completed").not());
}

#[test]
fn test_run_skips_mis_fed_parts_by_default() {
    let temp = setup_with_config(
        r#"
        [[machine.feeders]]
        id = "F1"
        part = "R0402"
        fail_every = 2
        "#,
    );
    write_job(temp.path(), "job.json", &["R0402", "R0402", "R0402"]);

    pnp(temp.path())
        .args(["run", "--job", "job.json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("main/R2 skipped"))
        .stdout(predicate::str::contains("job completed: 2 placed, 1 skipped"));
}

#[test]
fn test_run_abort_policy_fails_on_mis_feed() {
    let temp = setup_with_config(
        r#"
        [delegate]
        policy = "abort"

        [[machine.feeders]]
        id = "F1"
        part = "R0402"
        fail_every = 2
        "#,
    );
    write_job(temp.path(), "job.json", &["R0402", "R0402", "R0402"]);

    pnp(temp.path())
        .args(["run", "--job", "job.json"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("job error (pick aborted)"))
        .stdout(predicate::str::contains("main/R3").not());
}

#[test]
fn test_run_json_output_is_one_event_per_line() {
    let temp = setup_test_env();
    write_job(temp.path(), "job.json", &["R0402"]);

    let output = pnp(temp.path())
        .args(["run", "--job", "job.json", "--format", "json"])
        .output()
        .unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    let events: Vec<serde_json::Value> = stdout
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert!(events
        .iter()
        .any(|e| e["JobCompleted"]["placed"] == serde_json::json!(1)));
    assert_eq!(
        events.last().unwrap()["JobStateChanged"]["to"],
        serde_json::json!("Stopped")
    );
}

#[test]
fn test_run_writes_event_log() {
    let temp = setup_with_config(&format!("{CONFIG}\n[log]\nevent_log = \"logs/events.jsonl\"\n"));
    write_job(temp.path(), "job.json", &["R0402", "C0603"]);

    pnp(temp.path())
        .args(["run", "--job", "job.json"])
        .assert()
        .success();

    let log = fs::read_to_string(temp.path().join("logs/events.jsonl")).unwrap();
    let names: Vec<String> = log
        .lines()
        .map(|line| {
            let record: serde_json::Value = serde_json::from_str(line).unwrap();
            record["name"].as_str().unwrap().to_string()
        })
        .collect();
    assert!(names.contains(&"machine:enabled".to_string()));
    assert_eq!(names.iter().filter(|n| *n == "part:placed").count(), 2);
    assert!(names.contains(&"job:completed".to_string()));
}

#[test]
fn test_run_missing_job_file() {
    let temp = setup_test_env();

    pnp(temp.path())
        .args(["run", "--job", "nope.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load job from nope.json"));
}

#[test]
fn test_run_rejects_malformed_job() {
    let temp = setup_test_env();
    fs::write(temp.path().join("job.json"), "{ \"board_locations\": 3 }").unwrap();

    pnp(temp.path())
        .args(["run", "--job", "job.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load job"));
}
