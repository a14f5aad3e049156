//! Worker-staffed buildings: prefectures, schools, colleges, libraries.
//!
//! The worker count always stays within [0, max_workers]. Setters
//! clamp instead of failing, so removing more workers than are present
//! leaves the building empty.

use serde_json::json;
use std::any::Any;

use super::{Building, BuildingBase, BuildingKind, TickContext};
use crate::{
    error::SimResult,
    event::SimEvent,
    types::{Tick, WalkerId},
    variant::{self, VariantMap},
    walker::{Walker, WalkerRegistry},
};

#[derive(Debug, Clone)]
pub struct WorkingBuilding {
    base:            BuildingBase,
    current_workers: u32,
    max_workers:     u32,
    active:          bool,
    walkers:         Vec<WalkerId>,
    last_spawn:      Option<Tick>,
}

impl WorkingBuilding {
    pub fn new(kind: BuildingKind, max_workers: u32) -> Self {
        Self {
            base: BuildingBase::new(kind),
            current_workers: 0,
            max_workers,
            active: true,
            walkers: Vec::new(),
            last_spawn: None,
        }
    }

    /// Changing the quota re-clamps the current staff.
    pub fn set_max_workers(&mut self, max_workers: u32) {
        self.max_workers = max_workers;
        self.current_workers = self.current_workers.min(max_workers);
    }

    pub fn max_workers(&self) -> u32 {
        self.max_workers
    }

    pub fn set_workers(&mut self, workers: u32) {
        self.current_workers = workers.min(self.max_workers);
    }

    pub fn workers(&self) -> u32 {
        self.current_workers
    }

    pub fn add_workers(&mut self, workers: u32) {
        self.set_workers(self.current_workers.saturating_add(workers));
    }

    pub fn remove_workers(&mut self, workers: u32) {
        self.set_workers(self.current_workers.saturating_sub(workers));
    }

    pub fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Attach a walker. Ids that are unknown or already retired are
    /// ignored; returns whether the walker was attached.
    pub fn add_walker(&mut self, registry: &WalkerRegistry, id: WalkerId) -> bool {
        if !registry.is_alive(id) {
            return false;
        }
        self.walkers.push(id);
        true
    }

    pub fn walkers(&self) -> &[WalkerId] {
        &self.walkers
    }

    /// Drop walkers that have been retired or reaped. Survivors keep
    /// their relative order.
    fn prune_walkers(&mut self, registry: &WalkerRegistry) {
        self.walkers.retain(|id| registry.is_alive(*id));
    }

    fn spawn_due(&self, tick: Tick, interval: Tick) -> bool {
        self.active
            && self.current_workers > 0
            && self.walkers.is_empty()
            && self.last_spawn.map_or(true, |last| tick >= last + interval)
    }

    fn send_walker(&mut self, ctx: &mut TickContext<'_>) {
        let Some(service) = self.base.kind.service() else {
            return;
        };
        if !self.spawn_due(ctx.tick, ctx.config.walkers.spawn_interval_ticks) {
            return;
        }

        let walker = Walker::new(
            service,
            ctx.config.walkers.service_value(service),
            self.base.pos,
            ctx.config.walkers.lifetime_ticks,
        )
        .with_home(self.base.id);
        let walker_id = ctx.walkers.spawn(walker);
        self.walkers.push(walker_id);
        self.last_spawn = Some(ctx.tick);

        ctx.dispatch(SimEvent::WalkerSpawned {
            tick: ctx.tick,
            walker_id,
            building_id: self.base.id,
            service,
        });
    }
}

impl Building for WorkingBuilding {
    fn base(&self) -> &BuildingBase { &self.base }
    fn base_mut(&mut self) -> &mut BuildingBase { &mut self.base }

    fn time_step(&mut self, ctx: &mut TickContext<'_>) {
        self.prune_walkers(ctx.walkers);
        self.send_walker(ctx);
    }

    fn destroy(&mut self, ctx: &mut TickContext<'_>) {
        for id in &self.walkers {
            ctx.walkers.delete_later(*id);
        }

        ctx.dispatch(SimEvent::WorkersReturned {
            tick:  ctx.tick,
            pos:   self.base.pos,
            count: self.current_workers,
        });
    }

    fn save(&self, stream: &mut VariantMap) {
        self.base.save(stream);
        stream.insert("currentWorkers".into(), json!(self.current_workers));
        stream.insert("active".into(), json!(self.active));
        stream.insert("maxWorkers".into(), json!(self.max_workers));
        stream.insert("walkers".into(), json!(self.walkers));
        stream.insert("lastSpawn".into(), json!(self.last_spawn));
    }

    fn load(&mut self, stream: &VariantMap) -> SimResult<()> {
        self.base.load(stream)?;
        if let Some(max_workers) = variant::get_u32(stream, "maxWorkers") {
            self.max_workers = max_workers;
        }
        let workers = variant::get_u32(stream, "currentWorkers").unwrap_or(0);
        if workers > self.max_workers {
            log::warn!(
                "building {} saved with {workers} workers over quota {}, clamping",
                self.base.id, self.max_workers
            );
        }
        self.set_workers(workers);
        self.active = variant::get_bool(stream, "active").unwrap_or(true);
        self.walkers = stream
            .get("walkers")
            .and_then(|v| v.as_array())
            .map(|ids| ids.iter().filter_map(|id| id.as_u64()).collect())
            .unwrap_or_default();
        self.last_spawn = stream.get("lastSpawn").and_then(|v| v.as_u64());
        Ok(())
    }

    fn as_working(&self) -> Option<&WorkingBuilding> { Some(self) }
    fn as_working_mut(&mut self) -> Option<&mut WorkingBuilding> { Some(self) }

    fn as_any(&self) -> &dyn Any { self }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::SimConfig,
        types::TilePos,
        walker::Service,
    };

    fn school(max: u32) -> WorkingBuilding {
        WorkingBuilding::new(BuildingKind::School, max)
    }

    fn idle_walker(registry: &mut WalkerRegistry) -> WalkerId {
        registry.spawn(Walker::new(Service::School, 1.0, TilePos::new(0, 0), 100))
    }

    #[test]
    fn new_building_is_active_and_empty() {
        let b = school(10);
        assert!(b.is_active());
        assert_eq!(b.workers(), 0);
        assert_eq!(b.max_workers(), 10);
    }

    #[test]
    fn set_workers_clamps_to_quota() {
        let mut b = school(10);
        b.set_workers(25);
        assert_eq!(b.workers(), 10);
        b.set_workers(4);
        assert_eq!(b.workers(), 4);
    }

    #[test]
    fn remove_past_zero_floors_at_zero() {
        let mut b = school(10);
        b.add_workers(3);
        b.remove_workers(7);
        assert_eq!(b.workers(), 0);
    }

    #[test]
    fn worker_count_stays_in_range_over_mixed_sequence() {
        let mut b = school(12);
        let ops: [(char, u32); 10] = [
            ('+', 5), ('+', 9), ('-', 3), ('=', 40), ('-', 100),
            ('+', u32::MAX), ('-', 1), ('=', 6), ('+', 0), ('-', 6),
        ];
        for (op, n) in ops {
            match op {
                '+' => b.add_workers(n),
                '-' => b.remove_workers(n),
                _ => b.set_workers(n),
            }
            assert!(b.workers() <= b.max_workers(), "after {op}{n}: {}", b.workers());
        }
        assert_eq!(b.workers(), 0);
    }

    #[test]
    fn lowering_quota_reclamps_staff() {
        let mut b = school(10);
        b.set_workers(10);
        b.set_max_workers(4);
        assert_eq!(b.workers(), 4);
    }

    #[test]
    fn prune_drops_only_deleted_and_keeps_order() {
        let config = SimConfig::default_test();
        let mut registry = WalkerRegistry::new();
        let mut b = school(10);
        b.set_active(false);

        let ids: Vec<WalkerId> = (0..5).map(|_| idle_walker(&mut registry)).collect();
        for id in &ids {
            assert!(b.add_walker(&registry, *id));
        }
        registry.delete_later(ids[1]);
        registry.delete_later(ids[3]);
        // A reaped walker vanishes from the registry entirely.
        registry.delete_later(ids[4]);
        registry.reap();

        let mut ctx = TickContext::new(1, &mut registry, &config);
        b.time_step(&mut ctx);
        assert_eq!(b.walkers(), &[ids[0], ids[2]]);
    }

    #[test]
    fn add_walker_skips_retired_ids() {
        let mut registry = WalkerRegistry::new();
        let mut b = school(10);
        let id = idle_walker(&mut registry);
        registry.delete_later(id);
        assert!(!b.add_walker(&registry, id));
        assert!(!b.add_walker(&registry, 999));
        assert!(b.walkers().is_empty());
    }

    #[test]
    fn destroy_flags_walkers_and_returns_workers_once() {
        let config = SimConfig::default_test();
        let mut registry = WalkerRegistry::new();
        let mut b = school(10);
        b.base_mut().pos = TilePos::new(2, 3);
        b.set_workers(7);
        let a = idle_walker(&mut registry);
        let c = idle_walker(&mut registry);
        b.add_walker(&registry, a);
        b.add_walker(&registry, c);

        let mut ctx = TickContext::new(40, &mut registry, &config);
        b.destroy(&mut ctx);
        let events = ctx.into_events();

        assert_eq!(
            events,
            vec![SimEvent::WorkersReturned { tick: 40, pos: TilePos::new(2, 3), count: 7 }]
        );
        assert!(registry.get(a).unwrap().is_deleted());
        assert!(registry.get(c).unwrap().is_deleted());
    }

    #[test]
    fn staffed_building_sends_one_walker_at_a_time() {
        let config = SimConfig::default_test();
        let mut registry = WalkerRegistry::new();
        let mut b = WorkingBuilding::new(BuildingKind::Prefecture, 6);
        b.set_workers(2);

        let mut spawned = 0;
        for tick in 1..=10 {
            let mut ctx = TickContext::new(tick, &mut registry, &config);
            b.time_step(&mut ctx);
            spawned += ctx.into_events().len();
        }
        assert_eq!(spawned, 1);
        let walker = registry.get(b.walkers()[0]).unwrap();
        assert_eq!(walker.service, Service::Prefect);
        assert_eq!(walker.service_value, config.walkers.prefect_service_value);
    }

    #[test]
    fn unstaffed_or_inactive_buildings_stay_home() {
        let config = SimConfig::default_test();
        let mut registry = WalkerRegistry::new();
        let mut empty = school(10);
        let mut closed = school(10);
        closed.set_workers(5);
        closed.set_active(false);

        for tick in 1..=100 {
            let mut ctx = TickContext::new(tick, &mut registry, &config);
            empty.time_step(&mut ctx);
            closed.time_step(&mut ctx);
        }
        assert!(registry.is_empty());
    }

    #[test]
    fn save_and_load_keep_staffing() {
        let mut b = school(10);
        b.base_mut().id = 3;
        b.set_workers(6);
        b.set_active(false);
        let mut stream = VariantMap::new();
        b.save(&mut stream);

        assert_eq!(stream["currentWorkers"], json!(6));
        assert_eq!(stream["active"], json!(false));
        assert_eq!(stream["maxWorkers"], json!(10));

        let mut restored = school(0);
        restored.load(&stream).unwrap();
        assert_eq!(restored.workers(), 6);
        assert_eq!(restored.max_workers(), 10);
        assert!(!restored.is_active());
    }

    #[test]
    fn save_and_load_keep_walkers_and_spawn_timer() {
        let config = SimConfig::default_test();
        let mut registry = WalkerRegistry::new();
        let mut b = WorkingBuilding::new(BuildingKind::Prefecture, 6);
        b.base_mut().id = 5;
        b.set_workers(6);
        let mut ctx = TickContext::new(10, &mut registry, &config);
        b.time_step(&mut ctx);
        let out = b.walkers().to_vec();
        assert_eq!(out.len(), 1);

        let mut stream = VariantMap::new();
        b.save(&mut stream);
        let mut restored = WorkingBuilding::new(BuildingKind::Prefecture, 6);
        restored.load(&stream).unwrap();
        assert_eq!(restored.walkers(), out.as_slice());

        // With the walker retired, the next one waits out the interval.
        registry.delete_later(out[0]);
        registry.reap();
        let mut ctx = TickContext::new(41, &mut registry, &config);
        restored.time_step(&mut ctx);
        assert!(ctx.into_events().is_empty());
        let mut ctx = TickContext::new(42, &mut registry, &config);
        restored.time_step(&mut ctx);
        assert_eq!(ctx.into_events().len(), 1);
    }

    #[test]
    fn load_falls_back_to_defaults() {
        let mut stream = VariantMap::new();
        stream.insert("type".into(), json!("school"));
        stream.insert("id".into(), json!(8));
        stream.insert("pos".into(), json!([0, 0]));

        let mut restored = school(10);
        restored.set_workers(9);
        restored.set_active(false);
        restored.load(&stream).unwrap();

        assert_eq!(restored.workers(), 0);
        assert!(restored.is_active());
        assert_eq!(restored.max_workers(), 10);
    }
}
