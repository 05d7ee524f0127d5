// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! User-facing error display with context and suggestions

use crate::config::ConfigError;
use std::fmt;
use std::path::Path;

/// Error with context and recovery suggestions for display on exit
#[derive(Debug)]
pub struct CliError {
    /// What went wrong
    pub message: String,
    /// Why it might have happened
    pub context: Vec<String>,
    /// How to fix it
    pub suggestions: Vec<String>,
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl CliError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            context: Vec::new(),
            suggestions: Vec::new(),
            source: None,
        }
    }

    pub fn with_context(mut self, ctx: impl Into<String>) -> Self {
        self.context.push(ctx.into());
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    pub fn with_source<E: std::error::Error + Send + Sync + 'static>(mut self, source: E) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Configuration could not be loaded or failed validation
    pub fn config(error: ConfigError) -> Self {
        let err = CliError::new(error.to_string());
        let err = match &error {
            ConfigError::NotFound(_) => err
                .with_suggestion("Check the --config path")
                .with_suggestion("Omit --config to run with the built-in defaults"),
            ConfigError::Parse(..) => err
                .with_context("Sections: [coordinator], [delegate], [machine], [log]")
                .with_suggestion("Validate the file with: pnp check"),
            ConfigError::NoHeads => err.with_suggestion("Add a head: heads = [\"H1\"]"),
            ConfigError::Read(..)
            | ConfigError::DuplicateHead(_)
            | ConfigError::DuplicateFeeder(_)
            | ConfigError::InvalidFailEvery(_) => err,
        };
        err.with_source(error)
    }

    /// A job file could not be read or parsed
    pub fn job_file(path: &Path, error: impl std::error::Error + Send + Sync + 'static) -> Self {
        CliError::new(format!("Failed to load job from {}", path.display()))
            .with_context(error.to_string())
            .with_context("Job files are the JSON form of the job model")
            .with_source(error)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "error: {}", self.message)?;

        if !self.context.is_empty() {
            writeln!(f)?;
            for ctx in &self.context {
                writeln!(f, "  -> {}", ctx)?;
            }
        }

        if !self.suggestions.is_empty() {
            writeln!(f)?;
            writeln!(f, "suggestions:")?;
            for (i, suggestion) in self.suggestions.iter().enumerate() {
                writeln!(f, "  {}. {}", i + 1, suggestion)?;
            }
        }

        Ok(())
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}
