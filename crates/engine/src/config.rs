// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Coordinator and delegate settings

use crate::delegate::{AbortOnFailure, JobDelegate, RetryThenSkip, SkipAndContinue};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Execution loop behaviour
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoordinatorConfig {
    /// Home every head before the first placement of a run
    pub home_on_start: bool,
    /// Pause before retrying a failed pick
    #[serde(with = "humantime_serde")]
    pub pick_retry_delay: Duration,
    /// Poll machine enablement at every placement boundary, in addition to
    /// reacting to lifecycle notifications
    pub check_machine_each_placement: bool,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            home_on_start: true,
            pick_retry_delay: Duration::ZERO,
            check_machine_each_placement: true,
        }
    }
}

/// Built-in pick failure policies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DelegatePolicy {
    #[default]
    Skip,
    Abort,
    Retry,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DelegateConfig {
    pub policy: DelegatePolicy,
    /// Retries before falling back to skip (`retry` policy only)
    pub max_retries: u32,
}

impl DelegateConfig {
    pub fn build(&self) -> Arc<dyn JobDelegate> {
        match self.policy {
            DelegatePolicy::Skip => Arc::new(SkipAndContinue),
            DelegatePolicy::Abort => Arc::new(AbortOnFailure),
            DelegatePolicy::Retry => Arc::new(RetryThenSkip {
                max_retries: self.max_retries,
            }),
        }
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
