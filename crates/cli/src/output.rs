// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Output formatting for CLI commands

use clap::ValueEnum;
use pnp_core::{Event, PlacementOutcome, PlacementRef};
use serde::Serialize;

#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Print one event as a single line
pub fn print_event(event: &Event, format: OutputFormat) {
    match format {
        OutputFormat::Text => println!("{}", format_event(event)),
        OutputFormat::Json => print_json_line(event),
    }
}

/// Print a value in the specified format
pub fn print<T: Serialize + std::fmt::Display>(value: &T, format: OutputFormat) {
    match format {
        OutputFormat::Text => println!("{}", value),
        OutputFormat::Json => print_json_line(value),
    }
}

fn print_json_line<T: Serialize + ?Sized>(value: &T) {
    match serde_json::to_string(value) {
        Ok(json) => println!("{}", json),
        Err(e) => tracing::warn!(error = %e, "failed to serialize output"),
    }
}

fn placement(p: &PlacementRef) -> String {
    format!("{}/{}", p.board, p.id)
}

/// Human-readable rendering of a bus event
pub fn format_event(event: &Event) -> String {
    match event {
        Event::JobLoaded { boards, placements } => {
            format!("job loaded: {boards} boards, {placements} placements")
        }
        Event::JobClosed => "job closed".to_string(),
        Event::JobStateChanged { from, to } => format!("job {from} -> {to}"),
        Event::JobError { kind, description } => format!("job error ({kind}): {description}"),
        Event::JobCompleted { placed, skipped } => {
            format!("job completed: {placed} placed, {skipped} skipped")
        }
        Event::ForcedStop { reason } => format!("job stopped by machine: {reason}"),

        Event::BoardProcessingStarted { board } => format!("board {} started", board.name),
        Event::BoardProcessingCompleted { board } => format!("board {} completed", board.name),

        Event::PartProcessingStarted { placement: p } => {
            format!("{} ({}) started", placement(p), p.part)
        }
        Event::PartPicked {
            placement: p,
            feeder,
        } => format!("{} picked from {feeder}", placement(p)),
        Event::PartPlaced { placement: p } => format!("{} placed", placement(p)),
        Event::PartProcessingCompleted {
            placement: p,
            outcome,
        } => match outcome {
            PlacementOutcome::Placed => format!("{} done", placement(p)),
            PlacementOutcome::Skipped => format!("{} skipped", placement(p)),
        },

        Event::DetailedStatus { message } => format!("  {message}"),

        Event::MachineEnabled => "machine enabled".to_string(),
        Event::MachineEnableFailed { reason } => format!("machine enable failed: {reason}"),
        Event::MachineDisabled { reason } => format!("machine disabled: {reason}"),
        Event::MachineDisableFailed { reason } => format!("machine disable failed: {reason}"),
        Event::HeadActivity { head } => format!("head {head} moved"),
    }
}

#[cfg(test)]
#[path = "output_tests.rs"]
mod tests;
