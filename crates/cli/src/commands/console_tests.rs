// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[yare::parameterized(
    start = { "start", ConsoleCommand::Job(Command::Start) },
    step = { "step", ConsoleCommand::Job(Command::Step) },
    pause = { "pause", ConsoleCommand::Job(Command::Pause) },
    resume = { "  resume  ", ConsoleCommand::Job(Command::Resume) },
    stop = { "stop", ConsoleCommand::Job(Command::Stop) },
    toggle = { "toggle", ConsoleCommand::Job(Command::Toggle) },
    state = { "state", ConsoleCommand::State },
    controls = { "controls", ConsoleCommand::Controls },
    enable = { "enable", ConsoleCommand::Enable },
    disable = { "disable", ConsoleCommand::Disable },
    load = { "load jobs/panel.json", ConsoleCommand::Load(PathBuf::from("jobs/panel.json")) },
    load_spaces = { "load  my job.json ", ConsoleCommand::Load(PathBuf::from("my job.json")) },
    new = { "new", ConsoleCommand::New },
    close = { "close", ConsoleCommand::Close },
    wait = { "wait", ConsoleCommand::Wait },
    help = { "?", ConsoleCommand::Help },
    exit = { "exit", ConsoleCommand::Quit },
)]
fn parses(line: &str, expected: ConsoleCommand) {
    assert_eq!(ConsoleCommand::parse(line), Ok(Some(expected)));
}

#[yare::parameterized(
    blank = { "" },
    whitespace = { "   " },
    comment = { "# run the panel" },
)]
fn ignores(line: &str) {
    assert_eq!(ConsoleCommand::parse(line), Ok(None));
}

#[test]
fn rejects_unknown_and_malformed() {
    assert_eq!(
        ConsoleCommand::parse("home"),
        Err("unknown command: home (try `help`)".to_string())
    );
    assert_eq!(
        ConsoleCommand::parse("load"),
        Err("usage: load <file>".to_string())
    );
    assert_eq!(
        ConsoleCommand::parse("start now"),
        Err("start takes no arguments".to_string())
    );
}
