//! Snapshot serialization: full simulation state to/from JSON.
//!
//! A snapshot is taken every SNAPSHOT_INTERVAL ticks.
//! It captures the complete state needed to resume simulation
//! from that tick without replaying from tick 0.

use crate::{
    city::CitySave,
    clock::SimClock,
    types::{RunId, Tick},
};
use serde::{Deserialize, Serialize};

/// Four fire-decay steps.
pub const SNAPSHOT_INTERVAL: Tick = 64;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimSnapshot {
    pub run_id: RunId,
    pub tick:   Tick,
    pub clock:  SimClock,
    pub city:   CitySave,
}
