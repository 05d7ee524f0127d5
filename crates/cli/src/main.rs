// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! pnp - pick-and-place job runner

mod commands;
mod config;
mod context;
mod error;
mod logging;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{check, console, run};
use std::path::PathBuf;
use std::process::ExitCode;

use crate::config::Config;
use crate::context::Context;
use crate::error::CliError;

#[derive(Parser)]
#[command(
    name = "pnp",
    version,
    about = "pnp - runs pick-and-place jobs on a simulated machine"
)]
struct Cli {
    /// Configuration file [default: pnp.toml if present]
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a job to completion, streaming events
    Run(run::RunArgs),
    /// Operator console reading commands from stdin
    Console(console::ConsoleArgs),
    /// Validate the configuration and describe the machine
    Check(check::CheckArgs),
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match Config::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprint!("{}", CliError::config(e));
            return ExitCode::FAILURE;
        }
    };

    // Held until exit so buffered log lines are flushed
    let _log_guard = match logging::setup(&config.log) {
        Ok(guard) => guard,
        Err(e) => {
            eprint!(
                "{}",
                CliError::new("Failed to set up logging")
                    .with_context(e.to_string())
                    .with_suggestion("Check the [log] file path")
            );
            return ExitCode::FAILURE;
        }
    };

    match dispatch(cli.command, &config).await {
        Ok(code) => code,
        Err(e) => {
            match e.downcast_ref::<CliError>() {
                Some(cli_error) => eprint!("{cli_error}"),
                None => eprintln!("error: {e:#}"),
            }
            ExitCode::FAILURE
        }
    }
}

async fn dispatch(command: Commands, config: &Config) -> Result<ExitCode> {
    if let Commands::Check(args) = command {
        check::check(config, args);
        return Ok(ExitCode::SUCCESS);
    }

    let ctx = Context::startup(config).await?;
    let result = match command {
        Commands::Run(args) => run::run(&ctx, args).await.map(|outcome| {
            tracing::info!(?outcome, "run finished");
            if outcome.is_success() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }),
        Commands::Console(args) => console::console(&ctx, args)
            .await
            .map(|()| ExitCode::SUCCESS),
        Commands::Check(_) => Ok(ExitCode::SUCCESS),
    };
    ctx.shutdown().await;
    result
}
