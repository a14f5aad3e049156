//! Walker subsystem: service visits, ageing, and reaping of walkers.
//!
//! Execution: every tick, after buildings. A walker flagged during the
//! building pass (its home was torn down) is reaped here in the same
//! tick; its home's id list is pruned on the next building pass.

use crate::{
    city::City,
    config::WalkerConfig,
    error::SimResult,
    event::SimEvent,
    rng::SubsystemRng,
    subsystem::SimSubsystem,
    types::Tick,
};

pub struct WalkerSubsystem {
    config: WalkerConfig,
}

impl WalkerSubsystem {
    pub fn new(config: WalkerConfig) -> Self {
        Self { config }
    }
}

impl SimSubsystem for WalkerSubsystem {
    fn name(&self) -> &'static str { "walkers" }

    fn update(
        &mut self,
        tick: Tick,
        city: &mut City,
        _events_in: &[SimEvent],
        _rng: &mut SubsystemRng,
    ) -> SimResult<Vec<SimEvent>> {
        let events = city.deliver_services(tick, self.config.service_radius);

        for walker in city.walkers_mut().iter_mut() {
            walker.age();
        }
        let reaped = city.walkers_mut().reap();

        if reaped > 0 || !events.is_empty() {
            log::debug!(
                "tick={tick} walkers: {} visits, {reaped} retired, {} out",
                events.len(),
                city.walkers().len()
            );
        }
        Ok(events)
    }

    fn as_any(&self) -> &dyn std::any::Any { self }
}
