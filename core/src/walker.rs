//! Walkers: mobile agents sent out by buildings.
//!
//! Walkers live in a registry addressed by stable ids. Buildings hold
//! ids, never walkers, so a walker can be retired without touching the
//! building that spawned it. Retirement is deferred: `delete_later`
//! flags the walker and the registry drops it on the next reap pass.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::types::{BuildingId, Tick, TilePos, WalkerId};

/// The role a walker performs for the buildings it passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Service {
    Prefect,
    Engineer,
    School,
    College,
    Library,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Walker {
    pub id:            WalkerId,
    pub service:       Service,
    /// Strength of one visit, e.g. fire removed per prefect pass.
    pub service_value: f64,
    pub pos:           TilePos,
    pub home:          Option<BuildingId>,
    /// Ticks left before the walker retires on its own.
    pub lifetime:      Tick,
    deleted:           bool,
}

impl Walker {
    pub fn new(service: Service, service_value: f64, pos: TilePos, lifetime: Tick) -> Self {
        Self {
            id: 0,
            service,
            service_value,
            pos,
            home: None,
            lifetime,
            deleted: false,
        }
    }

    pub fn with_home(mut self, home: BuildingId) -> Self {
        self.home = Some(home);
        self
    }

    pub fn delete_later(&mut self) {
        self.deleted = true;
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted
    }

    /// Count down one tick of life; flags the walker once exhausted.
    pub fn age(&mut self) {
        self.lifetime = self.lifetime.saturating_sub(1);
        if self.lifetime == 0 {
            self.delete_later();
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalkerRegistry {
    walkers: BTreeMap<WalkerId, Walker>,
    next_id: WalkerId,
}

impl WalkerRegistry {
    pub fn new() -> Self {
        Self { walkers: BTreeMap::new(), next_id: 1 }
    }

    /// Insert a walker and return its freshly assigned id.
    pub fn spawn(&mut self, mut walker: Walker) -> WalkerId {
        let id = self.next_id;
        self.next_id += 1;
        walker.id = id;
        self.walkers.insert(id, walker);
        id
    }

    pub fn get(&self, id: WalkerId) -> Option<&Walker> {
        self.walkers.get(&id)
    }

    pub fn get_mut(&mut self, id: WalkerId) -> Option<&mut Walker> {
        self.walkers.get_mut(&id)
    }

    /// True when `id` names a walker that has not been flagged.
    pub fn is_alive(&self, id: WalkerId) -> bool {
        self.walkers.get(&id).is_some_and(|w| !w.is_deleted())
    }

    /// Flag a walker for removal. Unknown ids are ignored.
    pub fn delete_later(&mut self, id: WalkerId) {
        if let Some(walker) = self.walkers.get_mut(&id) {
            walker.delete_later();
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Walker> {
        self.walkers.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Walker> {
        self.walkers.values_mut()
    }

    pub fn len(&self) -> usize {
        self.walkers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.walkers.is_empty()
    }

    /// Drop every flagged walker. Returns how many were removed.
    pub fn reap(&mut self) -> usize {
        let before = self.walkers.len();
        self.walkers.retain(|_, w| !w.is_deleted());
        before - self.walkers.len()
    }
}

impl Default for WalkerRegistry {
    fn default() -> Self { Self::new() }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prefect() -> Walker {
        Walker::new(Service::Prefect, 5.0, TilePos::new(0, 0), 3)
    }

    #[test]
    fn spawn_assigns_increasing_ids() {
        let mut registry = WalkerRegistry::new();
        let a = registry.spawn(prefect());
        let b = registry.spawn(prefect());
        assert!(b > a);
        assert_eq!(registry.get(a).unwrap().id, a);
    }

    #[test]
    fn deleted_walkers_survive_until_reaped() {
        let mut registry = WalkerRegistry::new();
        let id = registry.spawn(prefect());
        registry.delete_later(id);
        assert!(!registry.is_alive(id));
        assert!(registry.get(id).is_some());
        assert_eq!(registry.reap(), 1);
        assert!(registry.get(id).is_none());
    }

    #[test]
    fn walker_retires_when_lifetime_runs_out() {
        let mut walker = prefect();
        walker.age();
        walker.age();
        assert!(!walker.is_deleted());
        walker.age();
        assert!(walker.is_deleted());
    }
}
