// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job execution state machine
//!
//! Pure transition function for operator commands. The coordinator applies the
//! returned [`Directive`] to its execution loop; nothing here touches hardware.
//!
//! Commands with no listed transition from the current state are rejected with
//! [`CommandError::NotApplicable`], except `stop` while stopped, which is a no-op.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Externally visible state of job execution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum JobState {
    #[default]
    Stopped,
    Running,
    Paused,
}

impl JobState {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobState::Stopped => "stopped",
            JobState::Running => "running",
            JobState::Paused => "paused",
        }
    }

    /// Running or paused: a cursor exists and may advance
    pub fn is_active(&self) -> bool {
        !matches!(self, JobState::Stopped)
    }
}

impl std::fmt::Display for JobState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Operator commands against the state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Command {
    Start,
    Step,
    Pause,
    Resume,
    Stop,
    /// Start, pause or resume depending on the current state
    Toggle,
}

impl Command {
    pub fn as_str(&self) -> &'static str {
        match self {
            Command::Start => "start",
            Command::Step => "step",
            Command::Pause => "pause",
            Command::Resume => "resume",
            Command::Stop => "stop",
            Command::Toggle => "toggle",
        }
    }

    /// Resolve `Toggle` to the concrete command for `state`
    pub fn resolve(self, state: JobState) -> Command {
        match (self, state) {
            (Command::Toggle, JobState::Stopped) => Command::Start,
            (Command::Toggle, JobState::Running) => Command::Pause,
            (Command::Toggle, JobState::Paused) => Command::Resume,
            (command, _) => command,
        }
    }
}

impl std::fmt::Display for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Facts about the environment that gate `start`/`step`/`resume`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Preconditions {
    pub job_loaded: bool,
    pub machine_enabled: bool,
    /// A previous execution loop still holds the run token
    pub run_in_progress: bool,
    /// Another coordinator holds the machine's claim
    pub machine_claimed: bool,
}

/// What the execution loop must do as a result of a transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Directive {
    /// Reset the cursor and launch a new execution loop.
    /// With `auto_pause`, pause after the first placement.
    Launch { auto_pause: bool },
    /// Wake the loop and continue at the current cursor
    Continue,
    /// Grant exactly one more placement while staying paused
    StepOnce,
    /// Suspend at the next placement boundary
    Suspend,
    /// Discard the cursor and end the loop at the next safe point
    Halt,
    /// No effect
    None,
}

/// Result of applying a command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: JobState,
    pub to: JobState,
    pub directive: Directive,
}

impl Transition {
    pub fn changes_state(&self) -> bool {
        self.from != self.to
    }
}

/// Reasons a command is refused. The state is unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("no job is loaded")]
    NoJob,
    #[error("machine is not enabled")]
    MachineDisabled,
    #[error("previous run is still finishing")]
    RunInProgress,
    #[error("machine is in use by another coordinator")]
    MachineInUse,
    #[error("cannot {command} while {state}")]
    NotApplicable { command: Command, state: JobState },
}

impl JobState {
    /// Pure transition function for an operator command
    pub fn apply(self, command: Command, pre: &Preconditions) -> Result<Transition, CommandError> {
        let command = command.resolve(self);
        let to = |to: JobState, directive: Directive| {
            Ok(Transition {
                from: self,
                to,
                directive,
            })
        };

        match (self, command) {
            // Stopped → Running (optionally auto-pausing after one placement)
            (JobState::Stopped, Command::Start | Command::Step) => {
                check_launch(pre)?;
                to(
                    JobState::Running,
                    Directive::Launch {
                        auto_pause: command == Command::Step,
                    },
                )
            }

            // Running → Paused at the next boundary
            (JobState::Running, Command::Pause) => to(JobState::Paused, Directive::Suspend),

            // Paused → Running
            (JobState::Paused, Command::Resume) => {
                check_machine(pre)?;
                to(JobState::Running, Directive::Continue)
            }

            // Paused → Paused, one more placement
            (JobState::Paused, Command::Step) => {
                check_machine(pre)?;
                to(JobState::Paused, Directive::StepOnce)
            }

            // Running/Paused → Stopped
            (JobState::Running | JobState::Paused, Command::Stop) => {
                to(JobState::Stopped, Directive::Halt)
            }

            // Idempotent
            (JobState::Stopped, Command::Stop) => to(JobState::Stopped, Directive::None),

            (state, command) => Err(CommandError::NotApplicable { command, state }),
        }
    }

    /// Transition forced by the machine becoming disabled
    pub fn machine_disabled(self) -> Transition {
        Transition {
            from: self,
            to: JobState::Stopped,
            directive: if self.is_active() {
                Directive::Halt
            } else {
                Directive::None
            },
        }
    }
}

fn check_launch(pre: &Preconditions) -> Result<(), CommandError> {
    if !pre.job_loaded {
        return Err(CommandError::NoJob);
    }
    check_machine(pre)?;
    if pre.run_in_progress {
        return Err(CommandError::RunInProgress);
    }
    if pre.machine_claimed {
        return Err(CommandError::MachineInUse);
    }
    Ok(())
}

fn check_machine(pre: &Preconditions) -> Result<(), CommandError> {
    if pre.machine_enabled {
        Ok(())
    } else {
        Err(CommandError::MachineDisabled)
    }
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
