use crate::types::{BuildingId, TilePos};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SimError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Building {id} not found")]
    BuildingNotFound { id: BuildingId },

    #[error("Building {id} has no workforce")]
    NotStaffed { id: BuildingId },

    #[error("Tile {pos} is already occupied by building {occupant}")]
    TileOccupied { pos: TilePos, occupant: BuildingId },

    #[error("Unknown building kind '{kind}' in saved data")]
    UnknownBuildingKind { kind: String },

    #[error("Malformed save data: {reason}")]
    MalformedSave { reason: String },

    #[error("No snapshot for run '{run_id}' at or before tick {tick}")]
    SnapshotNotFound { run_id: String, tick: u64 },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type SimResult<T> = Result<T, SimError>;
