// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `pnp.toml` loading and validation
//!
//! Loaded once at startup and handed to [`Context`](crate::context::Context);
//! nothing reads configuration after that.

use pnp_adapters::SimMachineConfig;
use pnp_engine::{CoordinatorConfig, DelegateConfig};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Used when `--config` is not given
pub const DEFAULT_CONFIG: &str = "pnp.toml";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub coordinator: CoordinatorConfig,
    pub delegate: DelegateConfig,
    pub machine: SimMachineConfig,
    pub log: LogConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LogConfig {
    /// Write tracing output here instead of stderr
    pub file: Option<PathBuf>,
    /// JSON-lines audit of every bus event
    pub event_log: Option<PathBuf>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {0}")]
    NotFound(PathBuf),

    #[error("failed to read {0}: {1}")]
    Read(PathBuf, #[source] std::io::Error),

    #[error("invalid config {0}: {1}")]
    Parse(PathBuf, #[source] toml::de::Error),

    #[error("machine has no heads")]
    NoHeads,

    #[error("duplicate head id: {0}")]
    DuplicateHead(String),

    #[error("duplicate feeder id: {0}")]
    DuplicateFeeder(String),

    #[error("feeder {0}: fail_every must be at least 1")]
    InvalidFailEvery(String),
}

impl Config {
    /// Load from `path`, or from [`DEFAULT_CONFIG`] when no path is given.
    ///
    /// A missing default file yields the default configuration; a missing
    /// explicit file is an error.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let (path, explicit) = match path {
            Some(path) => (path.to_path_buf(), true),
            None => (PathBuf::from(DEFAULT_CONFIG), false),
        };

        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                if explicit {
                    return Err(ConfigError::NotFound(path));
                }
                tracing::debug!(path = %path.display(), "no config file, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Read(path, e)),
        };

        Self::parse(&content, &path)
    }

    pub fn parse(content: &str, path: &Path) -> Result<Self, ConfigError> {
        let config: Config =
            toml::from_str(content).map_err(|e| ConfigError::Parse(path.to_path_buf(), e))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.machine.heads.is_empty() {
            return Err(ConfigError::NoHeads);
        }

        let mut heads = HashSet::new();
        for head in &self.machine.heads {
            if !heads.insert(head.as_str()) {
                return Err(ConfigError::DuplicateHead(head.clone()));
            }
        }

        let mut feeders = HashSet::new();
        for feeder in &self.machine.feeders {
            if !feeders.insert(feeder.id.as_str()) {
                return Err(ConfigError::DuplicateFeeder(feeder.id.clone()));
            }
            if feeder.fail_every == Some(0) {
                return Err(ConfigError::InvalidFailEvery(feeder.id.clone()));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
