use serde::{Deserialize, Serialize};
use crate::{
    building::BuildingKind,
    types::{BuildingId, RunId, Tick, TilePos},
};

/// All player-issued commands.
/// Variants are appended: never removed or reordered.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum PlayerCommand {
    // ── Clock control ─────────────────────────────
    Pause,
    Resume,
    SetSpeed { speed: crate::clock::SimSpeed },

    // ── Construction ──────────────────────────────
    Build {
        kind: BuildingKind,
        pos:  TilePos,
    },
    Destroy {
        building_id: BuildingId,
    },

    // ── Disasters ─────────────────────────────────
    Burn     { building_id: BuildingId },
    Collapse { building_id: BuildingId },
    Plague   { building_id: BuildingId },

    // ── Workforce ─────────────────────────────────
    SetWorkers {
        building_id: BuildingId,
        count:       u32,
    },
    SetActive {
        building_id: BuildingId,
        active:      bool,
    },
}

impl PlayerCommand {
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Pause             => "pause",
            Self::Resume            => "resume",
            Self::SetSpeed { .. }   => "set_speed",
            Self::Build { .. }      => "build",
            Self::Destroy { .. }    => "destroy",
            Self::Burn { .. }       => "burn",
            Self::Collapse { .. }   => "collapse",
            Self::Plague { .. }     => "plague",
            Self::SetWorkers { .. } => "set_workers",
            Self::SetActive { .. }  => "set_active",
        }
    }
}

/// A queued player command with its submission tick.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueuedCommand {
    pub run_id:     RunId,
    pub queued_at:  Tick,
    pub command:    PlayerCommand,
}
