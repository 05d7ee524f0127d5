// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use yare::parameterized;

const READY: Preconditions = Preconditions {
    job_loaded: true,
    machine_enabled: true,
    run_in_progress: false,
    machine_claimed: false,
};

#[parameterized(
    start_from_stopped = { JobState::Stopped, Command::Start, JobState::Running, Directive::Launch { auto_pause: false } },
    step_from_stopped = { JobState::Stopped, Command::Step, JobState::Running, Directive::Launch { auto_pause: true } },
    pause_while_running = { JobState::Running, Command::Pause, JobState::Paused, Directive::Suspend },
    resume_while_paused = { JobState::Paused, Command::Resume, JobState::Running, Directive::Continue },
    step_while_paused = { JobState::Paused, Command::Step, JobState::Paused, Directive::StepOnce },
    stop_while_running = { JobState::Running, Command::Stop, JobState::Stopped, Directive::Halt },
    stop_while_paused = { JobState::Paused, Command::Stop, JobState::Stopped, Directive::Halt },
    stop_while_stopped = { JobState::Stopped, Command::Stop, JobState::Stopped, Directive::None },
    toggle_from_stopped = { JobState::Stopped, Command::Toggle, JobState::Running, Directive::Launch { auto_pause: false } },
    toggle_while_running = { JobState::Running, Command::Toggle, JobState::Paused, Directive::Suspend },
    toggle_while_paused = { JobState::Paused, Command::Toggle, JobState::Running, Directive::Continue },
)]
fn listed_transitions(from: JobState, command: Command, to: JobState, directive: Directive) {
    let transition = from.apply(command, &READY).unwrap();
    assert_eq!(transition.from, from);
    assert_eq!(transition.to, to);
    assert_eq!(transition.directive, directive);
}

#[parameterized(
    start_while_running = { JobState::Running, Command::Start },
    start_while_paused = { JobState::Paused, Command::Start },
    step_while_running = { JobState::Running, Command::Step },
    pause_while_stopped = { JobState::Stopped, Command::Pause },
    pause_while_paused = { JobState::Paused, Command::Pause },
    resume_while_stopped = { JobState::Stopped, Command::Resume },
    resume_while_running = { JobState::Running, Command::Resume },
)]
fn unlisted_transitions_are_rejected(from: JobState, command: Command) {
    let err = from.apply(command, &READY).unwrap_err();
    assert_eq!(
        err,
        CommandError::NotApplicable {
            command,
            state: from
        }
    );
}

#[parameterized(
    start = { Command::Start },
    step = { Command::Step },
)]
fn launch_requires_job(command: Command) {
    let pre = Preconditions {
        job_loaded: false,
        ..READY
    };
    assert_eq!(
        JobState::Stopped.apply(command, &pre).unwrap_err(),
        CommandError::NoJob
    );
}

#[test]
fn start_requires_enabled_machine() {
    let pre = Preconditions {
        machine_enabled: false,
        ..READY
    };
    assert_eq!(
        JobState::Stopped.apply(Command::Start, &pre).unwrap_err(),
        CommandError::MachineDisabled
    );
}

#[test]
fn start_refused_while_previous_run_finishes() {
    let pre = Preconditions {
        run_in_progress: true,
        ..READY
    };
    assert_eq!(
        JobState::Stopped.apply(Command::Start, &pre).unwrap_err(),
        CommandError::RunInProgress
    );
}

#[parameterized(
    start = { Command::Start },
    step = { Command::Step },
)]
fn launch_refused_while_machine_claimed(command: Command) {
    let pre = Preconditions {
        machine_claimed: true,
        ..READY
    };
    let err = JobState::Stopped.apply(command, &pre).unwrap_err();
    assert_eq!(err, CommandError::MachineInUse);
    assert_eq!(err.to_string(), "machine is in use by another coordinator");
}

#[test]
fn resume_requires_enabled_machine() {
    let pre = Preconditions {
        machine_enabled: false,
        ..READY
    };
    assert_eq!(
        JobState::Paused.apply(Command::Resume, &pre).unwrap_err(),
        CommandError::MachineDisabled
    );
}

#[test]
fn stop_ignores_preconditions() {
    let pre = Preconditions {
        job_loaded: false,
        machine_enabled: false,
        run_in_progress: true,
        machine_claimed: true,
    };
    let transition = JobState::Running.apply(Command::Stop, &pre).unwrap();
    assert_eq!(transition.to, JobState::Stopped);
    assert!(transition.changes_state());
}

#[parameterized(
    running = { JobState::Running, Directive::Halt },
    paused = { JobState::Paused, Directive::Halt },
    stopped = { JobState::Stopped, Directive::None },
)]
fn machine_disabled_forces_stopped(from: JobState, directive: Directive) {
    let transition = from.machine_disabled();
    assert_eq!(transition.to, JobState::Stopped);
    assert_eq!(transition.directive, directive);
}

#[test]
fn not_applicable_message_names_command_and_state() {
    let err = JobState::Running.apply(Command::Step, &READY).unwrap_err();
    assert_eq!(err.to_string(), "cannot step while running");
}
