// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! CLI integration tests for `pnp console`

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(deprecated)]

mod common;

use common::{pnp, setup_test_env, write_job};
use predicates::prelude::*;

#[test]
fn test_console_runs_job_and_reports_state() {
    let temp = setup_test_env();
    write_job(temp.path(), "job.json", &["R0402", "R0402"]);

    pnp(temp.path())
        .args(["console", "--job", "job.json"])
        .write_stdin("state\nstart\nwait\nstate\nquit\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("stopped (placed 0, skipped 0, at -)"))
        .stdout(predicate::str::contains("job completed: 2 placed, 0 skipped"))
        .stdout(predicate::str::contains("stopped (placed 2, skipped 0, at -)"));
}

#[test]
fn test_console_step_pauses_after_one_placement() {
    let temp = setup_test_env();
    write_job(temp.path(), "job.json", &["R0402", "R0402", "R0402"]);

    pnp(temp.path())
        .args(["console", "--job", "job.json"])
        .write_stdin("step\n# let the single placement finish\nwait\ncontrols\nstop\nwait\nquit\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("main/R1 placed"))
        .stdout(predicate::str::contains("job running -> paused"))
        .stdout(predicate::str::contains("Resume, Step, Stop"))
        .stdout(predicate::str::contains("main/R2 placed").not());
}

#[test]
fn test_console_reports_rejected_commands() {
    let temp = setup_test_env();

    pnp(temp.path())
        .arg("console")
        .write_stdin("start\npause\nhome\nload\nquit\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("error: no job is loaded"))
        .stdout(predicate::str::contains("error: cannot pause while stopped"))
        .stdout(predicate::str::contains("error: unknown command: home"))
        .stdout(predicate::str::contains("error: usage: load <file>"));
}

#[test]
fn test_console_disable_blocks_start() {
    let temp = setup_test_env();
    write_job(temp.path(), "job.json", &["R0402"]);

    pnp(temp.path())
        .args(["console", "--job", "job.json"])
        .write_stdin("disable\nstart\nenable\nstart\nwait\nquit\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("error: machine is not enabled"))
        .stdout(predicate::str::contains("job completed: 1 placed, 0 skipped"));
}

#[test]
fn test_console_job_lifecycle() {
    let temp = setup_test_env();
    write_job(temp.path(), "panel.json", &["R0402", "C0603"]);

    pnp(temp.path())
        .arg("console")
        .write_stdin("new\nload panel.json\nclose\nstart\nquit\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("job loaded: 0 boards, 0 placements"))
        .stdout(predicate::str::contains("job loaded: 1 boards, 2 placements"))
        .stdout(predicate::str::contains("job closed"))
        .stdout(predicate::str::contains("error: no job is loaded"));
}

#[test]
fn test_console_eof_shuts_down() {
    let temp = setup_test_env();

    pnp(temp.path())
        .arg("console")
        .write_stdin("")
        .assert()
        .success();
}
