// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `pnp run --job <file>` - run one job to completion

use super::load_job_file;
use crate::context::Context;
use crate::output::{print_event, OutputFormat};
use anyhow::Result;
use clap::Args;
use pnp_core::{Event, JobErrorKind, JobState, Subscription};
use std::path::PathBuf;

#[derive(Args)]
pub struct RunArgs {
    /// Job file (JSON)
    #[arg(long)]
    pub job: PathBuf,

    /// Event output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

/// How a run ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Completed { placed: usize, skipped: usize },
    Failed { kind: JobErrorKind, description: String },
    ForcedStop { reason: String },
    Interrupted,
}

impl RunOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, RunOutcome::Completed { .. })
    }
}

pub async fn run(ctx: &Context, args: RunArgs) -> Result<RunOutcome> {
    let job = load_job_file(&args.job)?;
    let mut events = ctx
        .bus()
        .subscribe(Subscription::all("run-output", "Run event stream"));

    ctx.coordinator().load_job(job)?;
    ctx.coordinator().start()?;

    let mut outcome = RunOutcome::Interrupted;
    let mut interrupted = false;
    loop {
        let event = tokio::select! {
            event = events.recv() => event,
            result = tokio::signal::ctrl_c(), if !interrupted => {
                if let Err(e) = result {
                    tracing::warn!(error = %e, "failed to listen for ctrl-c");
                }
                interrupted = true;
                tracing::info!("interrupted, stopping job");
                if let Err(e) = ctx.coordinator().stop() {
                    tracing::warn!(error = %e, "failed to stop job");
                }
                continue;
            }
        };
        let Some(event) = event else {
            break;
        };

        print_event(&event, args.format);
        match event {
            Event::JobCompleted { placed, skipped } => {
                outcome = RunOutcome::Completed { placed, skipped }
            }
            Event::JobError { kind, description } => {
                outcome = RunOutcome::Failed { kind, description }
            }
            Event::ForcedStop { reason } => outcome = RunOutcome::ForcedStop { reason },
            Event::JobStateChanged {
                to: JobState::Stopped,
                ..
            } => break,
            _ => {}
        }
    }

    ctx.coordinator().join().await;
    Ok(outcome)
}
