//! Building subsystem: drives every building's per-tick callback.
//!
//! Execution: every tick, first in registration order.
//! Emits: whatever buildings dispatch (BuildRequested, WorkersReturned,
//!   WalkerSpawned) plus BuildingRemoved for each reaped building.

use crate::{
    city::City,
    config::SimConfig,
    error::SimResult,
    event::SimEvent,
    rng::SubsystemRng,
    subsystem::SimSubsystem,
    types::Tick,
};

pub struct BuildingSubsystem {
    config: SimConfig,
}

impl BuildingSubsystem {
    pub fn new(config: SimConfig) -> Self {
        Self { config }
    }
}

impl SimSubsystem for BuildingSubsystem {
    fn name(&self) -> &'static str { "buildings" }

    fn update(
        &mut self,
        tick: Tick,
        city: &mut City,
        _events_in: &[SimEvent],
        _rng: &mut SubsystemRng,
    ) -> SimResult<Vec<SimEvent>> {
        let events = city.time_step(tick, &self.config);

        if !events.is_empty() {
            log::debug!(
                "tick={tick} buildings: {} live, {} events",
                city.building_count(),
                events.len()
            );
        }
        Ok(events)
    }

    fn as_any(&self) -> &dyn std::any::Any { self }
}
