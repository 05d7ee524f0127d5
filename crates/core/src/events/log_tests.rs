// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::event::JobErrorKind;
use crate::state::JobState;
use tempfile::TempDir;

fn running() -> Event {
    Event::JobStateChanged {
        from: JobState::Stopped,
        to: JobState::Running,
    }
}

#[test]
fn append_and_read_back() {
    let tmp = TempDir::new().unwrap();
    let mut log = EventLog::open(tmp.path().join("events.jsonl")).unwrap();

    log.append(&running()).unwrap();
    log.append(&Event::status("Homing H1")).unwrap();

    let records = log.read_all().unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].sequence, 1);
    assert_eq!(records[0].name, "job:state");
    assert_eq!(records[0].event, running());
    assert_eq!(records[1].sequence, 2);
}

#[test]
fn reopen_continues_sequence() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("events.jsonl");

    {
        let mut log = EventLog::open(&path).unwrap();
        log.append(&Event::MachineEnabled).unwrap();
        log.append(&running()).unwrap();
    }

    let mut log = EventLog::open(&path).unwrap();
    assert_eq!(log.current_sequence(), 2);
    let record = log.append(&Event::status("again")).unwrap();
    assert_eq!(record.sequence, 3);
}

#[test]
fn query_filters_by_pattern() {
    let tmp = TempDir::new().unwrap();
    let mut log = EventLog::open(tmp.path().join("events.jsonl")).unwrap();

    log.append(&Event::MachineEnabled).unwrap();
    log.append(&running()).unwrap();
    log.append(&Event::JobError {
        kind: JobErrorKind::PickAborted,
        description: "vacuum sensor".to_string(),
    })
    .unwrap();

    let job_events = log.query(&EventPattern::new("job:*")).unwrap();
    assert_eq!(job_events.len(), 2);
    let errors = log.query(&EventPattern::new("job:error")).unwrap();
    assert_eq!(errors[0].sequence, 3);
}

#[test]
fn open_creates_missing_directories() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("logs").join("nested").join("events.jsonl");

    let log = EventLog::open(&path).unwrap();
    assert!(log.read_all().unwrap().is_empty());
    assert!(path.exists());
}
