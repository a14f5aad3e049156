//! Construction subsystem: turns BuildRequested events into buildings.
//!
//! Execution: every tick, after buildings and walkers, so a tile freed
//! by this tick's reap pass can be rebuilt in the same tick.
//! Depends on: events_in for BuildRequested (from ruins burning out and
//!   from disaster commands carried over from the previous command phase).

use crate::{
    city::City,
    config::SimConfig,
    error::{SimError, SimResult},
    event::SimEvent,
    rng::SubsystemRng,
    subsystem::SimSubsystem,
    types::Tick,
};

pub struct ConstructionSubsystem {
    config: SimConfig,
}

impl ConstructionSubsystem {
    pub fn new(config: SimConfig) -> Self {
        Self { config }
    }
}

impl SimSubsystem for ConstructionSubsystem {
    fn name(&self) -> &'static str { "construction" }

    fn update(
        &mut self,
        tick: Tick,
        city: &mut City,
        events_in: &[SimEvent],
        rng: &mut SubsystemRng,
    ) -> SimResult<Vec<SimEvent>> {
        let mut out = Vec::new();

        for event in events_in {
            let SimEvent::BuildRequested { pos, kind, .. } = event else {
                continue;
            };
            match city.build(*kind, *pos, &self.config, rng) {
                Ok(building_id) => out.push(SimEvent::BuildingConstructed {
                    tick,
                    building_id,
                    pos: *pos,
                    kind: *kind,
                }),
                Err(SimError::TileOccupied { occupant, .. }) => {
                    log::warn!(
                        "tick={tick} dropping {kind} request at {pos}: tile held by #{occupant}"
                    );
                }
                Err(e) => return Err(e),
            }
        }

        Ok(out)
    }

    fn as_any(&self) -> &dyn std::any::Any { self }
}
