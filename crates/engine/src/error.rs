// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for the coordinator

use pnp_core::{CommandError, JobState};
use thiserror::Error;

/// Errors returned synchronously to the caller of a coordinator operation.
/// The job state is unchanged when one is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoordinatorError {
    #[error(transparent)]
    Command(#[from] CommandError),
    #[error("job cannot be changed while {0}")]
    JobActive(JobState),
}

impl CoordinatorError {
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            CoordinatorError::Command(CommandError::NoJob | CommandError::MachineDisabled)
        )
    }
}
