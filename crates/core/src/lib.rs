// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! pnp-core: job model and state machine for pick-and-place job execution
//!
//! This crate provides:
//! - The job data model (parts, placements, boards, board locations, jobs)
//! - Table geometry for composing board and placement poses
//! - The pure job state machine and operator command availability
//! - Events and the event notification bus

pub mod controls;
pub mod event;
pub mod events;
pub mod geometry;
pub mod job;
pub mod state;

pub use controls::{JobControls, PrimaryAction};
pub use event::{BoardRef, Event, JobErrorKind, PlacementOutcome, PlacementRef};
pub use events::{
    EventBus, EventLog, EventPattern, EventReceiver, EventRecord, ObserverError, SubscriberId,
    Subscription,
};
pub use geometry::Location;
pub use job::{Board, BoardLocation, Cursor, Job, Part, PartId, Placement, Side};
pub use state::{Command, CommandError, Directive, JobState, Preconditions, Transition};
