//! The event bus: all cross-entity communication.
//!
//! RULE: Buildings and walkers never hold references to each other
//! or to the wider city. Effects outside the owning entity are
//! dispatched as events and consumed by a later subsystem, either
//! later in the same tick or at the start of the next one.

use crate::{
    building::BuildingKind,
    types::{BuildingId, RunId, Tick, TilePos, WalkerId},
    walker::Service,
};
use serde::{Deserialize, Serialize};

/// Every event emitted during simulation.
/// Variants are appended: never removed or reordered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SimEvent {
    // ── Engine events ──────────────────────────────
    TickStarted {
        tick: Tick,
    },
    TickCompleted {
        tick: Tick,
    },
    RunInitialized {
        run_id: RunId,
        seed: u64,
    },

    // ── Player command events ──────────────────────
    PlayerCommandReceived {
        tick: Tick,
        command_type: String,
    },

    // ── Building lifecycle ─────────────────────────
    /// Ask the construction system to place `kind` on `pos`.
    BuildRequested {
        tick: Tick,
        pos: TilePos,
        kind: BuildingKind,
    },
    BuildingConstructed {
        tick: Tick,
        building_id: BuildingId,
        pos: TilePos,
        kind: BuildingKind,
    },
    BuildingRemoved {
        tick: Tick,
        building_id: BuildingId,
        pos: TilePos,
        kind: BuildingKind,
    },

    // ── Workforce ──────────────────────────────────
    /// A staffed building was torn down; its workers need a new home.
    WorkersReturned {
        tick: Tick,
        pos: TilePos,
        count: u32,
    },
    WorkersReclaimed {
        tick: Tick,
        count: u32,
        idle_total: u32,
    },

    // ── Walkers ────────────────────────────────────
    WalkerSpawned {
        tick: Tick,
        walker_id: WalkerId,
        building_id: BuildingId,
        service: Service,
    },
    ServiceDelivered {
        tick: Tick,
        walker_id: WalkerId,
        building_id: BuildingId,
        service: Service,
    },
}

impl SimEvent {
    /// Stable string name of the variant.
    /// Used for the event_type column in event_log.
    pub fn type_name(&self) -> &'static str {
        match self {
            SimEvent::TickStarted { .. }           => "tick_started",
            SimEvent::TickCompleted { .. }         => "tick_completed",
            SimEvent::RunInitialized { .. }        => "run_initialized",
            SimEvent::PlayerCommandReceived { .. } => "player_command_received",
            SimEvent::BuildRequested { .. }        => "build_requested",
            SimEvent::BuildingConstructed { .. }   => "building_constructed",
            SimEvent::BuildingRemoved { .. }       => "building_removed",
            SimEvent::WorkersReturned { .. }       => "workers_returned",
            SimEvent::WorkersReclaimed { .. }      => "workers_reclaimed",
            SimEvent::WalkerSpawned { .. }         => "walker_spawned",
            SimEvent::ServiceDelivered { .. }      => "service_delivered",
        }
    }
}

/// The event log entry as persisted to SQLite.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventLogEntry {
    pub id: Option<i64>,
    pub run_id: RunId,
    pub tick: Tick,
    pub subsystem: String,
    pub event_type: String,
    pub payload: String, // JSON-serialized SimEvent
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_serialize_with_type_tag() {
        let event = SimEvent::WorkersReturned {
            tick: 32,
            pos: TilePos::new(4, 7),
            count: 6,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "workers_returned");
        assert_eq!(json["count"], 6);
        assert_eq!(json["pos"]["i"], 4);
        assert_eq!(event.type_name(), "workers_returned");
    }
}
