// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! JSON-lines audit log of bus events

use super::subscription::EventPattern;
use crate::event::Event;
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

/// One logged event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    /// Monotonic sequence number, continuing across reopen
    pub sequence: u64,
    /// Milliseconds since the log was opened by this process
    pub elapsed_ms: u64,
    pub name: String,
    pub event: Event,
}

/// Append-only event log
pub struct EventLog {
    path: PathBuf,
    writer: BufWriter<File>,
    sequence: u64,
    opened_at: Instant,
}

impl EventLog {
    /// Open or create an event log, continuing the existing sequence
    pub fn open(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let sequence = match File::open(&path) {
            Ok(file) => BufReader::new(file)
                .lines()
                .map_while(Result::ok)
                .filter(|line| !line.trim().is_empty())
                .count() as u64,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => 0,
            Err(e) => return Err(e),
        };

        let file = OpenOptions::new().create(true).append(true).open(&path)?;

        Ok(Self {
            path,
            writer: BufWriter::new(file),
            sequence,
            opened_at: Instant::now(),
        })
    }

    /// Append an event; the record is flushed before returning
    pub fn append(&mut self, event: &Event) -> std::io::Result<EventRecord> {
        self.sequence += 1;
        let record = EventRecord {
            sequence: self.sequence,
            elapsed_ms: self.opened_at.elapsed().as_millis() as u64,
            name: event.name(),
            event: event.clone(),
        };

        serde_json::to_writer(&mut self.writer, &record)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;

        Ok(record)
    }

    /// Read every record from disk
    pub fn read_all(&self) -> std::io::Result<Vec<EventRecord>> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };

        let mut records = Vec::new();
        for line in BufReader::new(file).lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let record: EventRecord = serde_json::from_str(&line)
                .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
            records.push(record);
        }
        Ok(records)
    }

    /// Records whose event name matches `pattern`
    pub fn query(&self, pattern: &EventPattern) -> std::io::Result<Vec<EventRecord>> {
        Ok(self
            .read_all()?
            .into_iter()
            .filter(|r| pattern.matches(&r.name))
            .collect())
    }

    pub fn current_sequence(&self) -> u64 {
        self.sequence
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
#[path = "log_tests.rs"]
mod tests;
