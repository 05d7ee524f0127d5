// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::time::Duration;

fn machine() -> FakeMachine {
    FakeMachine::new()
        .with_feeder("F1", "R1")
        .with_camera("top", Looking::Down)
}

#[tokio::test]
async fn records_actuation_in_order() {
    let machine = machine();
    let head = machine.heads()[0].clone();
    let feeder = machine.feeders()[0].clone();

    head.home().await.unwrap();
    let at = feeder.feed("H1").await.unwrap();
    head.move_to(at).await.unwrap();
    head.pick(&Part::new("R1")).await.unwrap();
    head.place().await.unwrap();

    assert_eq!(
        machine.calls(),
        vec![
            MachineCall::Home {
                head: "H1".to_string()
            },
            MachineCall::Feed {
                feeder: "F1".to_string(),
                head: "H1".to_string()
            },
            MachineCall::MoveTo {
                head: "H1".to_string(),
                location: Location::ORIGIN
            },
            MachineCall::Pick {
                head: "H1".to_string(),
                part: PartId::from("R1")
            },
            MachineCall::Place {
                head: "H1".to_string()
            },
        ]
    );
    assert_eq!(machine.placed_parts(), vec![PartId::from("R1")]);
}

#[tokio::test]
async fn pick_failures_count_down() {
    let machine = machine();
    let head = machine.heads()[0].clone();
    machine.fail_picks("R1", 2);

    assert!(head.pick(&Part::new("R1")).await.is_err());
    assert!(head.pick(&Part::new("R1")).await.is_err());
    assert!(head.pick(&Part::new("R1")).await.is_ok());
    assert_eq!(machine.pick_count(), 3);
}

#[tokio::test]
async fn disabled_machine_records_nothing() {
    let machine = machine();
    let mut rx = machine.subscribe();
    machine.disable_with("e-stop");

    let head = machine.heads()[0].clone();
    assert_eq!(head.place().await, Err(MachineError::Disabled));
    assert!(machine.calls().is_empty());
    assert_eq!(
        rx.recv().await.unwrap(),
        MachineEvent::Disabled {
            reason: "e-stop".to_string()
        }
    );
}

#[tokio::test]
async fn enable_failure_is_reported_and_broadcast() {
    let machine = machine();
    machine.disable_with("start disabled");
    machine.fail_enable("interlock open");
    let mut rx = machine.subscribe();

    let err = machine.set_enabled(true).await.unwrap_err();

    assert_eq!(err, MachineError::EnableFailed("interlock open".to_string()));
    assert!(!machine.is_enabled());
    assert_eq!(
        rx.recv().await.unwrap(),
        MachineEvent::EnableFailed {
            reason: "interlock open".to_string()
        }
    );
}

#[tokio::test]
async fn set_enabled_same_state_is_silent() {
    let machine = machine();
    let mut rx = machine.subscribe();

    machine.set_enabled(true).await.unwrap();

    assert!(rx.try_recv().is_err());
    assert_eq!(
        machine.calls(),
        vec![MachineCall::SetEnabled { enabled: true }]
    );
}

#[tokio::test]
async fn held_pick_waits_for_release() {
    let machine = machine();
    machine.hold_picks();
    let head = machine.heads()[0].clone();

    let task = tokio::spawn(async move { head.pick(&Part::new("R1")).await });
    for _ in 0..100 {
        if machine.pick_count() == 1 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(1)).await;
    }
    assert_eq!(machine.pick_count(), 1);
    assert!(!task.is_finished());

    machine.release_picks(1);
    assert!(task.await.unwrap().is_ok());
}

#[tokio::test]
async fn held_pick_fails_if_disabled_before_release() {
    let machine = machine();
    machine.hold_picks();
    let head = machine.heads()[0].clone();

    let task = tokio::spawn(async move { head.pick(&Part::new("R1")).await });
    while machine.pick_count() == 0 {
        tokio::task::yield_now().await;
    }
    machine.disable_with("e-stop");
    machine.open_picks();

    assert_eq!(task.await.unwrap(), Err(MachineError::Disabled));
}

#[test]
fn actuation_excludes_enablement() {
    assert!(!MachineCall::SetEnabled { enabled: true }.is_actuation());
    assert!(MachineCall::Place {
        head: "H1".to_string()
    }
    .is_actuation());
}

#[test]
fn clones_share_one_run_token() {
    let machine = machine();
    let other = machine.clone();

    let permit = machine.run_token().try_acquire_owned().unwrap();
    assert!(other.run_token().try_acquire_owned().is_err());

    drop(permit);
    assert!(other.run_token().try_acquire_owned().is_ok());
}
