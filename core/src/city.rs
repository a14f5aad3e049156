//! The city: owner of every building, walker and tile.
//!
//! Buildings live in an arena keyed by stable ids. Nothing is removed
//! while a pass is walking the arena: entities flag themselves and the
//! city reaps them once the pass is over.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::{
    building::{
        create_building, load_building, Building, BuildingKind, Habitants, House, TickContext,
        WorkingBuilding,
    },
    config::SimConfig,
    error::{SimError, SimResult},
    event::SimEvent,
    rng::SubsystemRng,
    tile::TileMap,
    types::{BuildingId, Tick, TilePos},
    variant::VariantMap,
    walker::WalkerRegistry,
};

#[derive(Debug)]
pub struct City {
    buildings:        BTreeMap<BuildingId, Box<dyn Building>>,
    walkers:          WalkerRegistry,
    tiles:            TileMap,
    next_building_id: BuildingId,
    idle_workers:     u32,
}

/// Serializable image of a city.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CitySave {
    pub buildings:        Vec<VariantMap>,
    /// Walkers out on the streets, with the id counter.
    #[serde(default)]
    pub walkers:          WalkerRegistry,
    pub tiles:            TileMap,
    pub next_building_id: BuildingId,
    pub idle_workers:     u32,
}

impl City {
    pub fn new() -> Self {
        Self {
            buildings:        BTreeMap::new(),
            walkers:          WalkerRegistry::new(),
            tiles:            TileMap::new(),
            next_building_id: 1,
            idle_workers:     0,
        }
    }

    // ── Lookup ─────────────────────────────────────────────────

    pub fn get(&self, id: BuildingId) -> Option<&dyn Building> {
        self.buildings.get(&id).map(|b| b.as_ref())
    }

    pub fn get_mut(&mut self, id: BuildingId) -> Option<&mut (dyn Building + 'static)> {
        self.buildings.get_mut(&id).map(|b| b.as_mut())
    }

    pub fn building(&self, id: BuildingId) -> SimResult<&dyn Building> {
        self.get(id).ok_or(SimError::BuildingNotFound { id })
    }

    pub fn building_mut(&mut self, id: BuildingId) -> SimResult<&mut (dyn Building + 'static)> {
        self.get_mut(id).ok_or(SimError::BuildingNotFound { id })
    }

    pub fn working(&self, id: BuildingId) -> SimResult<&WorkingBuilding> {
        self.building(id)?
            .as_working()
            .ok_or(SimError::NotStaffed { id })
    }

    pub fn working_mut(&mut self, id: BuildingId) -> SimResult<&mut WorkingBuilding> {
        self.building_mut(id)?
            .as_working_mut()
            .ok_or(SimError::NotStaffed { id })
    }

    /// The live building standing on `pos`, if any.
    pub fn building_at(&self, pos: TilePos) -> Option<BuildingId> {
        self.buildings
            .values()
            .find(|b| b.pos() == pos && !b.is_deleted())
            .map(|b| b.id())
    }

    pub fn buildings(&self) -> impl Iterator<Item = &dyn Building> {
        self.buildings.values().map(|b| b.as_ref())
    }

    pub fn buildings_of(&self, kind: BuildingKind) -> impl Iterator<Item = &dyn Building> {
        self.buildings().filter(move |b| b.kind() == kind)
    }

    pub fn houses(&self) -> impl Iterator<Item = &House> {
        self.buildings().filter_map(|b| b.as_house())
    }

    pub fn building_count(&self) -> usize {
        self.buildings.len()
    }

    pub fn walkers(&self) -> &WalkerRegistry {
        &self.walkers
    }

    pub fn walkers_mut(&mut self) -> &mut WalkerRegistry {
        &mut self.walkers
    }

    pub fn tiles(&self) -> &TileMap {
        &self.tiles
    }

    /// Total habitants across every house, saturating at `u32::MAX`.
    pub fn population(&self) -> u32 {
        self.houses()
            .map(|h| h.habitants().total())
            .fold(0, u32::saturating_add)
    }

    /// Workers displaced from torn-down buildings, waiting for a job.
    pub fn idle_workers(&self) -> u32 {
        self.idle_workers
    }

    pub fn reclaim_workers(&mut self, count: u32) -> u32 {
        self.idle_workers = self.idle_workers.saturating_add(count);
        self.idle_workers
    }

    // ── Construction ───────────────────────────────────────────

    /// Place a new `kind` on `pos`. Fails if a live building stands there.
    pub fn build(
        &mut self,
        kind:   BuildingKind,
        pos:    TilePos,
        config: &SimConfig,
        rng:    &mut SubsystemRng,
    ) -> SimResult<BuildingId> {
        if let Some(occupant) = self.building_at(pos) {
            return Err(SimError::TileOccupied { pos, occupant });
        }

        let mut building = create_building(kind, config);
        let id = self.next_building_id;
        self.next_building_id += 1;
        building.base_mut().id = id;
        building.build(&mut self.tiles, pos, rng);
        self.buildings.insert(id, building);

        log::debug!("built {kind} #{id} at {pos}");
        Ok(id)
    }

    /// Insert an already-built house with habitants. Used by scenario
    /// setup and tests.
    pub fn add_house(
        &mut self,
        pos:       TilePos,
        habitants: Habitants,
        config:    &SimConfig,
        rng:       &mut SubsystemRng,
    ) -> SimResult<BuildingId> {
        let id = self.build(BuildingKind::House, pos, config, rng)?;
        if let Some(house) = self.buildings.get_mut(&id).and_then(|b| b.as_house_mut()) {
            house.set_habitants(habitants);
        }
        Ok(id)
    }

    // ── Tick ───────────────────────────────────────────────────

    /// Run every live building's callback, then reap the ones that
    /// flagged themselves.
    pub fn time_step(&mut self, tick: Tick, config: &SimConfig) -> Vec<SimEvent> {
        let mut ctx = TickContext::new(tick, &mut self.walkers, config);
        for building in self.buildings.values_mut() {
            if !building.is_deleted() {
                building.time_step(&mut ctx);
            }
        }
        Self::reap(&mut self.buildings, &mut self.tiles, &mut ctx);
        ctx.into_events()
    }

    fn reap(
        buildings: &mut BTreeMap<BuildingId, Box<dyn Building>>,
        tiles:     &mut TileMap,
        ctx:       &mut TickContext<'_>,
    ) {
        let doomed: Vec<BuildingId> = buildings
            .iter()
            .filter(|(_, b)| b.is_deleted())
            .map(|(id, _)| *id)
            .collect();

        for id in doomed {
            let Some(mut building) = buildings.remove(&id) else {
                continue;
            };
            let pos = building.pos();
            let kind = building.kind();
            building.destroy(ctx);
            tiles.clear_building(pos);
            ctx.dispatch(SimEvent::BuildingRemoved {
                tick: ctx.tick,
                building_id: id,
                pos,
                kind,
            });
        }
    }

    /// Every live walker serves the buildings within `radius` that want
    /// its service. Returns one event per visit.
    pub fn deliver_services(&mut self, tick: Tick, radius: i32) -> Vec<SimEvent> {
        let mut events = Vec::new();
        for walker in self.walkers.iter().filter(|w| !w.is_deleted()) {
            for building in self.buildings.values_mut() {
                if building.is_deleted() || building.pos().distance(&walker.pos) > radius {
                    continue;
                }
                if building.evaluate_service(walker) > 0.0 {
                    building.apply_service(walker);
                    events.push(SimEvent::ServiceDelivered {
                        tick,
                        walker_id: walker.id,
                        building_id: building.id(),
                        service: walker.service,
                    });
                }
            }
        }
        events
    }

    // ── Persistence ────────────────────────────────────────────

    pub fn save(&self) -> CitySave {
        let buildings = self
            .buildings
            .values()
            .filter(|b| !b.is_deleted())
            .map(|b| {
                let mut stream = VariantMap::new();
                b.save(&mut stream);
                stream
            })
            .collect();

        CitySave {
            buildings,
            walkers: self.walkers.clone(),
            tiles: self.tiles.clone(),
            next_building_id: self.next_building_id,
            idle_workers: self.idle_workers,
        }
    }

    pub fn load(save: &CitySave, config: &SimConfig) -> SimResult<Self> {
        let mut city = City::new();
        for record in &save.buildings {
            let building = load_building(record, config)?;
            let id = building.id();
            if city.buildings.insert(id, building).is_some() {
                return Err(SimError::MalformedSave { reason: format!("duplicate building id {id}") });
            }
        }
        let max_id = city.buildings.keys().max().copied().unwrap_or(0);
        city.next_building_id = save.next_building_id.max(max_id + 1);
        city.walkers = save.walkers.clone();
        city.tiles = save.tiles.clone();
        city.idle_workers = save.idle_workers;
        Ok(city)
    }
}

impl Default for City {
    fn default() -> Self { Self::new() }
}
