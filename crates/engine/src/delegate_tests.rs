// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use pnp_core::{Board, Location};
use std::sync::Arc;
use yare::parameterized;

fn decide(delegate: &dyn JobDelegate, attempt: u32) -> PickRetryAction {
    let part = Arc::new(Part::new("R1"));
    let placement = Placement::new("R1", part.clone(), Location::ORIGIN);
    let board = Arc::new(Board::new("main").with_placement(placement.clone()));
    let board_location = BoardLocation::new(board, Location::ORIGIN);
    let error = MachineError::Pick {
        head: "H1".to_string(),
        reason: "vacuum".to_string(),
    };

    delegate.pick_failed(&PickFailure {
        board_location: &board_location,
        placement: &placement,
        part: &part,
        feeder: "F1",
        attempt,
        error: &error,
    })
}

#[parameterized(
    first = { 1, PickRetryAction::RetryPick },
    last_retry = { 3, PickRetryAction::RetryPick },
    exhausted = { 4, PickRetryAction::SkipAndContinue },
)]
fn retry_then_skip(attempt: u32, expected: PickRetryAction) {
    assert_eq!(decide(&RetryThenSkip { max_retries: 3 }, attempt), expected);
}

#[test]
fn retry_then_skip_with_zero_retries_skips_immediately() {
    assert_eq!(
        decide(&RetryThenSkip { max_retries: 0 }, 1),
        PickRetryAction::SkipAndContinue
    );
}

#[test]
fn fixed_policies() {
    assert_eq!(decide(&SkipAndContinue, 1), PickRetryAction::SkipAndContinue);
    assert_eq!(decide(&AbortOnFailure, 1), PickRetryAction::AbortJob);
}

#[test]
fn closures_are_delegates() {
    let delegate = from_fn(|failure| {
        if failure.feeder == "F1" && failure.part.id.0 == "R1" {
            PickRetryAction::AbortJob
        } else {
            PickRetryAction::RetryPick
        }
    });
    assert_eq!(decide(delegate.as_ref(), 7), PickRetryAction::AbortJob);
}
