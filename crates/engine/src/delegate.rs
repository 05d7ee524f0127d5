// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pick failure policy hook

use pnp_adapters::MachineError;
use pnp_core::{BoardLocation, Part, Placement};
use std::sync::Arc;

/// What to do after a failed pick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickRetryAction {
    RetryPick,
    SkipAndContinue,
    AbortJob,
}

/// Context handed to the delegate for one failed pick
#[derive(Debug)]
pub struct PickFailure<'a> {
    pub board_location: &'a BoardLocation,
    pub placement: &'a Placement,
    pub part: &'a Part,
    pub feeder: &'a str,
    /// 1 for the first attempt
    pub attempt: u32,
    pub error: &'a MachineError,
}

/// Decides how a pick failure is resolved. Called synchronously from the
/// execution loop; it must only return a decision.
pub trait JobDelegate: Send + Sync {
    fn pick_failed(&self, failure: &PickFailure<'_>) -> PickRetryAction;
}

impl<F> JobDelegate for F
where
    F: Fn(&PickFailure<'_>) -> PickRetryAction + Send + Sync,
{
    fn pick_failed(&self, failure: &PickFailure<'_>) -> PickRetryAction {
        self(failure)
    }
}

/// Wrap a closure as a delegate
pub fn from_fn<F>(f: F) -> Arc<dyn JobDelegate>
where
    F: Fn(&PickFailure<'_>) -> PickRetryAction + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Skip the placement and continue. Used when no delegate is installed.
#[derive(Debug, Clone, Copy, Default)]
pub struct SkipAndContinue;

impl JobDelegate for SkipAndContinue {
    fn pick_failed(&self, _failure: &PickFailure<'_>) -> PickRetryAction {
        PickRetryAction::SkipAndContinue
    }
}

/// Abort the job on the first pick failure
#[derive(Debug, Clone, Copy, Default)]
pub struct AbortOnFailure;

impl JobDelegate for AbortOnFailure {
    fn pick_failed(&self, _failure: &PickFailure<'_>) -> PickRetryAction {
        PickRetryAction::AbortJob
    }
}

/// Retry up to `max_retries` times, then skip
#[derive(Debug, Clone, Copy)]
pub struct RetryThenSkip {
    pub max_retries: u32,
}

impl JobDelegate for RetryThenSkip {
    fn pick_failed(&self, failure: &PickFailure<'_>) -> PickRetryAction {
        if failure.attempt <= self.max_retries {
            PickRetryAction::RetryPick
        } else {
            PickRetryAction::SkipAndContinue
        }
    }
}

#[cfg(test)]
#[path = "delegate_tests.rs"]
mod tests;
