// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Machine-table coordinates
//!
//! All linear values are millimetres, rotation is degrees counter-clockwise.

use serde::{Deserialize, Serialize};

/// A pose on the machine table, or relative to a board origin
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Location {
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    #[serde(default)]
    pub z: f64,
    #[serde(default)]
    pub rotation: f64,
}

impl Location {
    pub const ORIGIN: Location = Location {
        x: 0.0,
        y: 0.0,
        z: 0.0,
        rotation: 0.0,
    };

    pub fn new(x: f64, y: f64, z: f64, rotation: f64) -> Self {
        Self { x, y, z, rotation }
    }

    /// Location in the XY plane with zero height and rotation
    pub fn xy(x: f64, y: f64) -> Self {
        Self::new(x, y, 0.0, 0.0)
    }

    /// Compose a location expressed relative to `self` into the frame `self` lives in.
    ///
    /// The relative XY offset is rotated by `self.rotation` before being translated,
    /// heights add, and rotations add (normalized to `(-180, 180]`).
    pub fn compose(&self, relative: &Location) -> Location {
        let (sin, cos) = self.rotation.to_radians().sin_cos();
        Location {
            x: self.x + relative.x * cos - relative.y * sin,
            y: self.y + relative.x * sin + relative.y * cos,
            z: self.z + relative.z,
            rotation: normalize_degrees(self.rotation + relative.rotation),
        }
    }

    /// Mirror across the board's Y axis (bottom-side placements)
    pub fn mirrored_x(&self) -> Location {
        Location {
            x: -self.x,
            ..*self
        }
    }

    /// Straight-line XY distance
    pub fn distance_xy(&self, other: &Location) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "({:.3}, {:.3}, {:.3}, {:.1}°)",
            self.x, self.y, self.z, self.rotation
        )
    }
}

fn normalize_degrees(degrees: f64) -> f64 {
    let wrapped = degrees.rem_euclid(360.0);
    if wrapped > 180.0 {
        wrapped - 360.0
    } else {
        wrapped
    }
}

#[cfg(test)]
#[path = "geometry_tests.rs"]
mod tests;
