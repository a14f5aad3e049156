//! Population subsystem: takes back workers from torn-down buildings.
//!
//! Execution: every tick, last in registration order.
//! Depends on: events_in for WorkersReturned.

use crate::{
    city::City,
    error::SimResult,
    event::SimEvent,
    rng::SubsystemRng,
    subsystem::SimSubsystem,
    types::Tick,
};

#[derive(Default)]
pub struct PopulationSubsystem;

impl PopulationSubsystem {
    pub fn new() -> Self {
        Self
    }
}

impl SimSubsystem for PopulationSubsystem {
    fn name(&self) -> &'static str { "population" }

    fn update(
        &mut self,
        tick: Tick,
        city: &mut City,
        events_in: &[SimEvent],
        _rng: &mut SubsystemRng,
    ) -> SimResult<Vec<SimEvent>> {
        let mut out = Vec::new();

        for event in events_in {
            let SimEvent::WorkersReturned { pos, count, .. } = event else {
                continue;
            };
            if *count == 0 {
                continue;
            }
            let idle_total = city.reclaim_workers(*count);
            log::debug!("tick={tick} population: {count} workers back from {pos}, {idle_total} idle");
            out.push(SimEvent::WorkersReclaimed { tick, count: *count, idle_total });
        }

        Ok(out)
    }

    fn as_any(&self) -> &dyn std::any::Any { self }
}
