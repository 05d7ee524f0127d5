// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Events published by the coordinator and the machine coupling

use crate::job::{Cursor, Job, PartId};
use crate::state::JobState;
use serde::{Deserialize, Serialize};

/// Distinguishes reported job errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JobErrorKind {
    /// No feeder supplies the placement's part
    MissingFeeder,
    /// The machine exposes no head to pick with
    MissingHead,
    /// The pick failure policy chose to abort the job
    PickAborted,
    /// Moving to the placement target failed
    MovementFailed,
    /// Releasing the part at the target failed
    PlaceFailed,
    /// Homing before the first placement failed
    HomingFailed,
}

impl JobErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobErrorKind::MissingFeeder => "missing feeder",
            JobErrorKind::MissingHead => "missing head",
            JobErrorKind::PickAborted => "pick aborted",
            JobErrorKind::MovementFailed => "movement failed",
            JobErrorKind::PlaceFailed => "place failed",
            JobErrorKind::HomingFailed => "homing failed",
        }
    }
}

impl std::fmt::Display for JobErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identifies a board location in events
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardRef {
    pub index: usize,
    pub name: String,
}

/// Identifies a placement in events
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacementRef {
    pub cursor: Cursor,
    pub board: String,
    pub id: String,
    pub part: PartId,
}

impl BoardRef {
    pub fn of(job: &Job, index: usize) -> Option<Self> {
        let board_location = job.board_location(index)?;
        Some(Self {
            index,
            name: board_location.name().to_string(),
        })
    }
}

impl PlacementRef {
    pub fn of(job: &Job, cursor: Cursor) -> Option<Self> {
        let (board_location, placement) = job.resolve(cursor)?;
        Some(Self {
            cursor,
            board: board_location.name().to_string(),
            id: placement.id.clone(),
            part: placement.part.id.clone(),
        })
    }
}

/// How a placement finished
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlacementOutcome {
    Placed,
    Skipped,
}

/// Events fanned out on the [`EventBus`](crate::events::EventBus)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Event {
    // Job events
    JobLoaded {
        boards: usize,
        placements: usize,
    },
    JobClosed,
    JobStateChanged {
        from: JobState,
        to: JobState,
    },
    JobError {
        kind: JobErrorKind,
        description: String,
    },
    JobCompleted {
        placed: usize,
        skipped: usize,
    },
    /// Stop forced by the machine becoming disabled, as opposed to an operator stop
    ForcedStop {
        reason: String,
    },

    // Board events
    BoardProcessingStarted {
        board: BoardRef,
    },
    BoardProcessingCompleted {
        board: BoardRef,
    },

    // Part events
    PartProcessingStarted {
        placement: PlacementRef,
    },
    PartPicked {
        placement: PlacementRef,
        feeder: String,
    },
    PartPlaced {
        placement: PlacementRef,
    },
    PartProcessingCompleted {
        placement: PlacementRef,
        outcome: PlacementOutcome,
    },

    /// Free-form progress text
    DetailedStatus {
        message: String,
    },

    // Machine lifecycle events (reasons are passed through unmodified)
    MachineEnabled,
    MachineEnableFailed {
        reason: String,
    },
    MachineDisabled {
        reason: String,
    },
    MachineDisableFailed {
        reason: String,
    },
    HeadActivity {
        head: String,
    },
}

impl Event {
    /// Routing name used by [`EventPattern`](crate::events::EventPattern)
    pub fn name(&self) -> String {
        match self {
            Event::JobLoaded { .. } => "job:loaded".to_string(),
            Event::JobClosed => "job:closed".to_string(),
            Event::JobStateChanged { .. } => "job:state".to_string(),
            Event::JobError { .. } => "job:error".to_string(),
            Event::JobCompleted { .. } => "job:completed".to_string(),
            Event::ForcedStop { .. } => "job:forced-stop".to_string(),

            Event::BoardProcessingStarted { .. } => "board:started".to_string(),
            Event::BoardProcessingCompleted { .. } => "board:completed".to_string(),

            Event::PartProcessingStarted { .. } => "part:started".to_string(),
            Event::PartPicked { .. } => "part:picked".to_string(),
            Event::PartPlaced { .. } => "part:placed".to_string(),
            Event::PartProcessingCompleted { .. } => "part:completed".to_string(),

            Event::DetailedStatus { .. } => "status:detail".to_string(),

            Event::MachineEnabled => "machine:enabled".to_string(),
            Event::MachineEnableFailed { .. } => "machine:enable-failed".to_string(),
            Event::MachineDisabled { .. } => "machine:disabled".to_string(),
            Event::MachineDisableFailed { .. } => "machine:disable-failed".to_string(),
            Event::HeadActivity { .. } => "machine:head-activity".to_string(),
        }
    }

    pub fn status(message: impl Into<String>) -> Self {
        Event::DetailedStatus {
            message: message.into(),
        }
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
