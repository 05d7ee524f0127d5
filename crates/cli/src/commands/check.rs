// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `pnp check` - validate configuration and describe the machine

use crate::config::Config;
use crate::output::{print, OutputFormat};
use clap::Args;
use pnp_adapters::Looking;
use pnp_engine::DelegatePolicy;
use serde::Serialize;
use std::fmt;

#[derive(Args)]
pub struct CheckArgs {
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

/// Validated configuration, printable as a summary
#[derive(Serialize)]
#[serde(transparent)]
pub struct Summary<'a>(pub &'a Config);

impl fmt::Display for Summary<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let config = self.0;
        let machine = &config.machine;

        writeln!(f, "config ok")?;
        writeln!(f, "heads: {}", machine.heads.join(", "))?;

        if machine.feeders.is_empty() {
            writeln!(f, "feeders: none")?;
        } else {
            writeln!(f, "feeders:")?;
            for feeder in &machine.feeders {
                write!(f, "  {} {} at {}", feeder.id, feeder.part, feeder.location)?;
                if !feeder.enabled {
                    write!(f, " (disabled)")?;
                }
                if let Some(every) = feeder.fail_every {
                    write!(f, " (mis-feeds every {every})")?;
                }
                writeln!(f)?;
            }
        }

        for camera in &machine.cameras {
            let looking = match camera.looking {
                Looking::Down => "down",
                Looking::Up => "up",
            };
            writeln!(f, "camera: {} looking {looking}", camera.id)?;
        }

        match config.delegate.policy {
            DelegatePolicy::Skip => writeln!(f, "pick failures: skip")?,
            DelegatePolicy::Abort => writeln!(f, "pick failures: abort")?,
            DelegatePolicy::Retry => writeln!(
                f,
                "pick failures: retry {} times, then skip",
                config.delegate.max_retries
            )?,
        }
        write!(
            f,
            "home on start: {}",
            if config.coordinator.home_on_start {
                "yes"
            } else {
                "no"
            }
        )
    }
}

pub fn check(config: &Config, args: CheckArgs) {
    print(&Summary(config), args.format);
}
