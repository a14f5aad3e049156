//! Tile flags for the city map.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::types::TilePos;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileFlags {
    pub tree:     bool,
    pub building: bool,
    pub road:     bool,
    pub rock:     bool,
}

/// Sparse map of tile flags. Tiles never touched read as open land.
///
/// Saved as a list of `(pos, flags)` pairs: JSON object keys must be
/// strings and `TilePos` is not one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<(TilePos, TileFlags)>", into = "Vec<(TilePos, TileFlags)>")]
pub struct TileMap {
    tiles: BTreeMap<TilePos, TileFlags>,
}

impl TileMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, pos: TilePos) -> TileFlags {
        self.tiles.get(&pos).copied().unwrap_or_default()
    }

    pub fn get_mut(&mut self, pos: TilePos) -> &mut TileFlags {
        self.tiles.entry(pos).or_default()
    }

    /// Reset the flags a building leaves behind when it is removed.
    pub fn clear_building(&mut self, pos: TilePos) {
        let flags = self.get_mut(pos);
        flags.building = false;
        flags.rock = false;
    }
}

impl From<Vec<(TilePos, TileFlags)>> for TileMap {
    fn from(pairs: Vec<(TilePos, TileFlags)>) -> Self {
        Self { tiles: pairs.into_iter().collect() }
    }
}

impl From<TileMap> for Vec<(TilePos, TileFlags)> {
    fn from(map: TileMap) -> Self {
        map.tiles.into_iter().collect()
    }
}
