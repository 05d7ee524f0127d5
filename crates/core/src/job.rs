// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job data model
//!
//! A [`Job`] is an ordered list of [`BoardLocation`]s; each binds a shared
//! [`Board`] (an ordered list of [`Placement`]s) to a pose on the machine table.
//! Nothing here is mutated by job execution. Processing progress is tracked by
//! the coordinator against [`Cursor`]s.

use crate::geometry::Location;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;

/// Unique identifier for a part
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PartId(pub String);

impl std::fmt::Display for PartId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for PartId {
    fn from(s: String) -> Self {
        PartId(s)
    }
}

impl From<&str> for PartId {
    fn from(s: &str) -> Self {
        PartId(s.to_string())
    }
}

/// A component that can be placed. Feeders are matched on `id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Part {
    pub id: PartId,
    #[serde(default)]
    pub package: Option<String>,
    /// Part height in millimetres
    #[serde(default)]
    pub height: f64,
}

impl Part {
    pub fn new(id: impl Into<PartId>) -> Self {
        Self {
            id: id.into(),
            package: None,
            height: 0.0,
        }
    }

    pub fn with_package(mut self, package: impl Into<String>) -> Self {
        self.package = Some(package.into());
        self
    }

    pub fn with_height(mut self, height: f64) -> Self {
        self.height = height;
        self
    }
}

/// Which face of the board a placement or board location refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    #[default]
    Top,
    Bottom,
}

fn enabled_by_default() -> bool {
    true
}

/// One part-to-position assignment on a board
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    /// Reference designator, e.g. "R12"
    pub id: String,
    pub part: Arc<Part>,
    /// Target pose relative to the board origin
    pub location: Location,
    #[serde(default)]
    pub side: Side,
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
}

impl Placement {
    pub fn new(id: impl Into<String>, part: Arc<Part>, location: Location) -> Self {
        Self {
            id: id.into(),
            part,
            location,
            side: Side::Top,
            enabled: true,
        }
    }

    pub fn on_side(mut self, side: Side) -> Self {
        self.side = side;
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }
}

/// An ordered set of placements. Order defines processing order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Board {
    pub name: String,
    /// Where the board definition was read from, if anywhere
    #[serde(default)]
    pub source: Option<PathBuf>,
    #[serde(default)]
    pub placements: Vec<Placement>,
}

impl Board {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source: None,
            placements: Vec::new(),
        }
    }

    pub fn with_placement(mut self, placement: Placement) -> Self {
        self.placements.push(placement);
        self
    }
}

/// A board instance on the machine table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoardLocation {
    pub board: Arc<Board>,
    /// Board origin on the machine table
    pub location: Location,
    #[serde(default)]
    pub side: Side,
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
}

impl BoardLocation {
    pub fn new(board: Arc<Board>, location: Location) -> Self {
        Self {
            board,
            location,
            side: Side::Top,
            enabled: true,
        }
    }

    pub fn on_side(mut self, side: Side) -> Self {
        self.side = side;
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    pub fn name(&self) -> &str {
        &self.board.name
    }

    /// Whether a placement of this board is processed at this location
    pub fn processes(&self, placement: &Placement) -> bool {
        self.enabled && placement.enabled && placement.side == self.side
    }

    /// Absolute machine pose for one of this board's placements
    pub fn target_of(&self, placement: &Placement) -> Location {
        let relative = match self.side {
            Side::Top => placement.location,
            Side::Bottom => placement.location.mirrored_x(),
        };
        self.location.compose(&relative)
    }
}

/// The full ordered work description for one production run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Job {
    #[serde(default)]
    pub board_locations: Vec<BoardLocation>,
}

impl Job {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_board_location(mut self, board_location: BoardLocation) -> Self {
        self.board_locations.push(board_location);
        self
    }

    pub fn add_board_location(&mut self, board_location: BoardLocation) {
        self.board_locations.push(board_location);
    }

    pub fn board_location(&self, index: usize) -> Option<&BoardLocation> {
        self.board_locations.get(index)
    }

    /// Resolve a cursor to its board location and placement
    pub fn resolve(&self, cursor: Cursor) -> Option<(&BoardLocation, &Placement)> {
        let board_location = self.board_locations.get(cursor.board)?;
        let placement = board_location.board.placements.get(cursor.placement)?;
        Some((board_location, placement))
    }

    /// All processable placements, in processing order
    pub fn cursors(&self) -> impl Iterator<Item = Cursor> + '_ {
        self.board_locations
            .iter()
            .enumerate()
            .filter(|(_, bl)| bl.enabled)
            .flat_map(|(board, bl)| {
                bl.board
                    .placements
                    .iter()
                    .enumerate()
                    .filter(move |(_, p)| bl.processes(p))
                    .map(move |(placement, _)| Cursor { board, placement })
            })
    }

    /// First processable placement
    pub fn first_cursor(&self) -> Option<Cursor> {
        self.cursors().next()
    }

    /// Next processable placement strictly after `after`
    pub fn next_cursor(&self, after: Cursor) -> Option<Cursor> {
        self.cursors().find(|c| *c > after)
    }

    /// Number of placements a full run would process
    pub fn placement_count(&self) -> usize {
        self.cursors().count()
    }

    /// Number of board locations with at least one processable placement
    pub fn board_count(&self) -> usize {
        self.board_locations
            .iter()
            .filter(|bl| bl.board.placements.iter().any(|p| bl.processes(p)))
            .count()
    }
}

/// Processing position: board location index, then placement index within its board.
///
/// Ordering is lexicographic on `(board, placement)`, matching processing order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Cursor {
    pub board: usize,
    pub placement: usize,
}

impl std::fmt::Display for Cursor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.board, self.placement)
    }
}

#[cfg(test)]
#[path = "job_tests.rs"]
mod tests;
