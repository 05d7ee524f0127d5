// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use pnp_adapters::Looking;
use pnp_engine::DelegatePolicy;
use std::time::Duration;

const FULL: &str = r#"
[coordinator]
home_on_start = false
pick_retry_delay = "100ms"

[delegate]
policy = "retry"
max_retries = 3

[machine]
heads = ["H1", "H2"]
move_delay = "5ms"

[[machine.cameras]]
id = "bottom"
looking = "up"

[[machine.feeders]]
id = "F1"
part = "R0402-10K"
location = { x = 10.0, y = 20.0 }

[[machine.feeders]]
id = "F2"
part = "C0603-100N"
fail_every = 4

[log]
event_log = "events.jsonl"
"#;

fn parse(content: &str) -> Result<Config, ConfigError> {
    Config::parse(content, Path::new("pnp.toml"))
}

#[test]
fn parses_every_section() {
    let config = parse(FULL).unwrap();

    assert!(!config.coordinator.home_on_start);
    assert_eq!(
        config.coordinator.pick_retry_delay,
        Duration::from_millis(100)
    );
    assert_eq!(config.delegate.policy, DelegatePolicy::Retry);
    assert_eq!(config.delegate.max_retries, 3);
    assert_eq!(config.machine.heads, vec!["H1", "H2"]);
    assert_eq!(config.machine.move_delay, Duration::from_millis(5));
    assert_eq!(config.machine.cameras[0].looking, Looking::Up);
    assert_eq!(config.machine.feeders.len(), 2);
    assert_eq!(config.machine.feeders[0].location.x, 10.0);
    assert_eq!(config.machine.feeders[1].fail_every, Some(4));
    assert_eq!(config.log.event_log, Some(PathBuf::from("events.jsonl")));
    assert_eq!(config.log.file, None);
}

#[test]
fn empty_file_is_default() {
    assert_eq!(parse("").unwrap(), Config::default());
}

#[test]
fn unknown_section_is_rejected() {
    let err = parse("[daemon]\nport = 1\n").unwrap_err();
    assert!(matches!(err, ConfigError::Parse(..)));
}

#[test]
fn validation_errors() {
    assert!(matches!(
        parse("[machine]\nheads = []\n"),
        Err(ConfigError::NoHeads)
    ));
    assert!(matches!(
        parse("[machine]\nheads = [\"H1\", \"H1\"]\n"),
        Err(ConfigError::DuplicateHead(id)) if id == "H1"
    ));
    assert!(matches!(
        parse(
            r#"
            [[machine.feeders]]
            id = "F1"
            part = "A"
            [[machine.feeders]]
            id = "F1"
            part = "B"
            "#
        ),
        Err(ConfigError::DuplicateFeeder(id)) if id == "F1"
    ));
    assert!(matches!(
        parse(
            r#"
            [[machine.feeders]]
            id = "F1"
            part = "A"
            fail_every = 0
            "#
        ),
        Err(ConfigError::InvalidFailEvery(id)) if id == "F1"
    ));
}

#[test]
fn load_explicit_missing_file_fails() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing.toml");

    let err = Config::load(Some(&path)).unwrap_err();

    assert!(matches!(err, ConfigError::NotFound(p) if p == path));
}

#[test]
fn load_reads_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("machine.toml");
    std::fs::write(&path, FULL).unwrap();

    let config = Config::load(Some(&path)).unwrap();

    assert_eq!(config.machine.heads.len(), 2);
}
