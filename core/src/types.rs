//! Shared primitive types used across the entire simulation.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A simulation tick. One tick = one step of the global city clock.
pub type Tick = u64;

/// Stable identifier of a building in the city arena.
pub type BuildingId = u64;

/// Stable identifier of a walker in the walker registry.
pub type WalkerId = u64;

/// The canonical run identifier.
pub type RunId = String;

/// A tile coordinate on the city map.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TilePos {
    pub i: i32,
    pub j: i32,
}

impl TilePos {
    pub const fn new(i: i32, j: i32) -> Self {
        Self { i, j }
    }

    /// Chebyshev distance: the number of king moves between two tiles.
    pub fn distance(&self, other: &TilePos) -> i32 {
        (self.i - other.i).abs().max((self.j - other.j).abs())
    }
}

impl fmt::Display for TilePos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.i, self.j)
    }
}
