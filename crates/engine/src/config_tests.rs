// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::delegate::PickRetryAction;

#[test]
fn empty_table_uses_defaults() {
    let config: CoordinatorConfig = toml::from_str("").unwrap();
    assert_eq!(config, CoordinatorConfig::default());
    assert!(config.home_on_start);
    assert!(config.check_machine_each_placement);
}

#[test]
fn parses_humantime_delay() {
    let config: CoordinatorConfig = toml::from_str(
        r#"
        home_on_start = false
        pick_retry_delay = "250ms"
        "#,
    )
    .unwrap();

    assert!(!config.home_on_start);
    assert_eq!(config.pick_retry_delay, Duration::from_millis(250));
    assert!(config.check_machine_each_placement);
}

#[test]
fn rejects_unknown_policy() {
    let result: Result<DelegateConfig, _> = toml::from_str(r#"policy = "ignore""#);
    assert!(result.is_err());
}

#[test]
fn builds_retry_policy() {
    let config: DelegateConfig = toml::from_str(
        r#"
        policy = "retry"
        max_retries = 2
        "#,
    )
    .unwrap();
    assert_eq!(config.policy, DelegatePolicy::Retry);

    let delegate = config.build();
    let part = std::sync::Arc::new(pnp_core::Part::new("R1"));
    let placement = pnp_core::Placement::new("R1", part.clone(), pnp_core::Location::ORIGIN);
    let board_location = pnp_core::BoardLocation::new(
        std::sync::Arc::new(pnp_core::Board::new("main")),
        pnp_core::Location::ORIGIN,
    );
    let error = pnp_adapters::MachineError::Disabled;
    let failure = |attempt| crate::delegate::PickFailure {
        board_location: &board_location,
        placement: &placement,
        part: &part,
        feeder: "F1",
        attempt,
        error: &error,
    };

    assert_eq!(delegate.pick_failed(&failure(2)), PickRetryAction::RetryPick);
    assert_eq!(
        delegate.pick_failed(&failure(3)),
        PickRetryAction::SkipAndContinue
    );
}
