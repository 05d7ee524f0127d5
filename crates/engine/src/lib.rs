// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Pick-and-place job execution engine

mod config;
mod coordinator;
mod coupling;
mod delegate;
mod error;
mod executor;

pub use config::{CoordinatorConfig, DelegateConfig, DelegatePolicy};
pub use coordinator::{Coordinator, Progress};
pub use coupling::{apply as apply_machine_event, spawn_coupling};
pub use delegate::{
    from_fn as delegate_fn, AbortOnFailure, JobDelegate, PickFailure, PickRetryAction,
    RetryThenSkip, SkipAndContinue,
};
pub use error::CoordinatorError;
