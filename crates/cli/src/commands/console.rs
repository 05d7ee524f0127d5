// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `pnp console` - line-driven operator console on stdin

use super::load_job_file;
use crate::context::Context;
use crate::output::{print, print_event, OutputFormat};
use anyhow::Result;
use clap::Args;
use pnp_adapters::MachineAdapter;
use pnp_core::{Command, EventPattern, JobState, SubscriberId, Subscription};
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader};

const PRINTER_SUBSCRIBER: &str = "console-output";
const WAIT_SUBSCRIBER: &str = "console-wait";

#[derive(Args)]
pub struct ConsoleArgs {
    /// Job file (JSON) to load before reading commands
    #[arg(long)]
    pub job: Option<PathBuf>,

    /// Event output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

/// One console line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    Job(Command),
    State,
    Controls,
    Enable,
    Disable,
    Load(PathBuf),
    New,
    Close,
    /// Block until the job is no longer running
    Wait,
    Help,
    Quit,
}

const HELP: &str = "\
commands:
  start | pause | resume | toggle | step | stop
  state | controls | wait
  enable | disable
  load <file> | new | close
  help | quit";

impl ConsoleCommand {
    /// Parse one input line; blank lines and `#` comments yield `None`
    pub fn parse(line: &str) -> Result<Option<Self>, String> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return Ok(None);
        }

        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };

        let command = match word {
            "start" => ConsoleCommand::Job(Command::Start),
            "step" => ConsoleCommand::Job(Command::Step),
            "pause" => ConsoleCommand::Job(Command::Pause),
            "resume" => ConsoleCommand::Job(Command::Resume),
            "stop" => ConsoleCommand::Job(Command::Stop),
            "toggle" => ConsoleCommand::Job(Command::Toggle),
            "state" => ConsoleCommand::State,
            "controls" => ConsoleCommand::Controls,
            "enable" => ConsoleCommand::Enable,
            "disable" => ConsoleCommand::Disable,
            "load" if rest.is_empty() => return Err("usage: load <file>".to_string()),
            "load" => return Ok(Some(ConsoleCommand::Load(PathBuf::from(rest)))),
            "new" => ConsoleCommand::New,
            "close" => ConsoleCommand::Close,
            "wait" => ConsoleCommand::Wait,
            "help" | "?" => ConsoleCommand::Help,
            "quit" | "exit" => ConsoleCommand::Quit,
            other => return Err(format!("unknown command: {other} (try `help`)")),
        };

        if !rest.is_empty() {
            return Err(format!("{word} takes no arguments"));
        }
        Ok(Some(command))
    }
}

pub async fn console(ctx: &Context, args: ConsoleArgs) -> Result<()> {
    let format = args.format;
    let mut events = ctx
        .bus()
        .subscribe(Subscription::all(PRINTER_SUBSCRIBER, "Console event printer"));
    let printer = tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            print_event(&event, format);
        }
    });

    if let Some(path) = &args.job {
        let job = load_job_file(path)?;
        ctx.coordinator().load_job(job)?;
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let command = match ConsoleCommand::parse(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(message) => {
                println!("error: {message}");
                continue;
            }
        };
        if command == ConsoleCommand::Quit {
            break;
        }
        execute(ctx, command, format).await;
    }

    ctx.bus()
        .unsubscribe(&SubscriberId(PRINTER_SUBSCRIBER.to_string()));
    if let Err(e) = printer.await {
        tracing::warn!(error = %e, "event printer ended abnormally");
    }
    Ok(())
}

async fn execute(ctx: &Context, command: ConsoleCommand, format: OutputFormat) {
    let coordinator = ctx.coordinator();
    let result: Result<()> = match command {
        ConsoleCommand::Job(command) => coordinator
            .command(command)
            .map(|_| ())
            .map_err(anyhow::Error::from),
        ConsoleCommand::State => {
            let progress = coordinator.progress();
            let cursor = progress
                .cursor
                .map_or_else(|| "-".to_string(), |c| c.to_string());
            println!(
                "{} (placed {}, skipped {}, at {})",
                coordinator.state(),
                progress.placed,
                progress.skipped,
                cursor
            );
            Ok(())
        }
        ConsoleCommand::Controls => {
            print(&coordinator.controls(), format);
            Ok(())
        }
        ConsoleCommand::Enable => ctx
            .machine()
            .set_enabled(true)
            .await
            .map_err(anyhow::Error::from),
        ConsoleCommand::Disable => ctx
            .machine()
            .set_enabled(false)
            .await
            .map_err(anyhow::Error::from),
        ConsoleCommand::Load(path) => load_job_file(&path)
            .map_err(anyhow::Error::from)
            .and_then(|job| coordinator.load_job(job).map_err(anyhow::Error::from)),
        ConsoleCommand::New => coordinator.new_job().map_err(anyhow::Error::from),
        ConsoleCommand::Close => coordinator.close_job().map_err(anyhow::Error::from),
        ConsoleCommand::Wait => {
            wait_until_idle(ctx).await;
            Ok(())
        }
        ConsoleCommand::Help => {
            println!("{HELP}");
            Ok(())
        }
        ConsoleCommand::Quit => Ok(()),
    };

    if let Err(e) = result {
        let message = e.to_string();
        println!("error: {}", message.trim_end().trim_start_matches("error: "));
    }
}

/// Wait for the job to pause or stop; a stopped job's worker is joined too
async fn wait_until_idle(ctx: &Context) {
    let coordinator = ctx.coordinator();
    let mut changes = ctx.bus().subscribe(Subscription::new(
        WAIT_SUBSCRIBER,
        vec![EventPattern::new("job:state")],
        "Console wait",
    ));
    while coordinator.state() == JobState::Running {
        if changes.recv().await.is_none() {
            break;
        }
    }
    ctx.bus()
        .unsubscribe(&SubscriberId(WAIT_SUBSCRIBER.to_string()));

    if coordinator.state() == JobState::Stopped {
        coordinator.join().await;
    }
}

#[cfg(test)]
#[path = "console_tests.rs"]
mod tests;
