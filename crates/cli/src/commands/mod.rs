// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! CLI command implementations

pub mod check;
pub mod console;
pub mod run;

use crate::error::CliError;
use pnp_core::Job;
use std::path::Path;

/// Read a job from its JSON file
pub fn load_job_file(path: &Path) -> Result<Job, CliError> {
    let content = std::fs::read_to_string(path).map_err(|e| CliError::job_file(path, e))?;
    serde_json::from_str(&content).map_err(|e| CliError::job_file(path, e))
}
