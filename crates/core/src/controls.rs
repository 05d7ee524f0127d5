// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Operator command availability
//!
//! Which job controls an operator surface should offer for a given job state
//! and machine enablement.

use crate::state::{Command, JobState};
use serde::Serialize;

/// The combined start/pause/resume control
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PrimaryAction {
    Start,
    Pause,
    Resume,
}

impl PrimaryAction {
    pub fn label(&self) -> &'static str {
        match self {
            PrimaryAction::Start => "Start",
            PrimaryAction::Pause => "Pause",
            PrimaryAction::Resume => "Resume",
        }
    }

    pub fn command(&self) -> Command {
        match self {
            PrimaryAction::Start => Command::Start,
            PrimaryAction::Pause => Command::Pause,
            PrimaryAction::Resume => Command::Resume,
        }
    }
}

/// Availability of the job controls
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct JobControls {
    pub primary: PrimaryAction,
    pub primary_enabled: bool,
    pub step_enabled: bool,
    pub stop_enabled: bool,
}

impl JobControls {
    pub fn for_state(state: JobState, machine_enabled: bool) -> Self {
        let (primary, step_enabled, stop_enabled) = match state {
            JobState::Stopped => (PrimaryAction::Start, true, false),
            JobState::Running => (PrimaryAction::Pause, false, true),
            JobState::Paused => (PrimaryAction::Resume, true, true),
        };

        // Nothing is actionable on a disabled machine, not even stop
        Self {
            primary,
            primary_enabled: machine_enabled,
            step_enabled: step_enabled && machine_enabled,
            stop_enabled: stop_enabled && machine_enabled,
        }
    }

    /// Whether `command` is currently offered
    pub fn allows(&self, command: Command) -> bool {
        match command {
            Command::Step => self.step_enabled,
            Command::Stop => self.stop_enabled,
            Command::Toggle => self.primary_enabled,
            other => self.primary_enabled && self.primary.command() == other,
        }
    }
}

impl std::fmt::Display for JobControls {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mark = |enabled: bool| if enabled { "" } else { " (disabled)" };
        write!(
            f,
            "{}{}, Step{}, Stop{}",
            self.primary.label(),
            mark(self.primary_enabled),
            mark(self.step_enabled),
            mark(self.stop_enabled)
        )
    }
}

#[cfg(test)]
#[path = "controls_tests.rs"]
mod tests;
