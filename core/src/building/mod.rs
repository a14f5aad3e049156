//! Buildings: the per-tile entities of the city.
//!
//! Every variant implements [`Building`]. The city calls `time_step`
//! on each live building once per tick; a building that wants to go
//! away calls `delete_later` on its base and the city reaps it after
//! the pass, calling `destroy` exactly once on the way out.

mod house;
mod ruins;
mod working;

pub use house::{CitizenGroup, Habitants, House};
pub use ruins::{BurnedRuins, BurningRuins, CollapsedRuins, PlagueRuins};
pub use working::WorkingBuilding;

use serde::{Deserialize, Serialize};
use serde_json::json;
use std::any::Any;
use std::fmt;

use crate::{
    config::SimConfig,
    construction::{ConstructionParam, ConstructionState},
    error::{SimError, SimResult},
    event::SimEvent,
    rng::SubsystemRng,
    tile::TileMap,
    types::{BuildingId, Tick, TilePos},
    variant::{self, VariantMap},
    visual::VisualState,
    walker::{Service, Walker, WalkerRegistry},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildingKind {
    House,
    Prefecture,
    School,
    College,
    Library,
    BurningRuins,
    BurnedRuins,
    CollapsedRuins,
    PlagueRuins,
}

impl BuildingKind {
    pub fn all() -> &'static [BuildingKind] {
        &[
            Self::House,
            Self::Prefecture,
            Self::School,
            Self::College,
            Self::Library,
            Self::BurningRuins,
            Self::BurnedRuins,
            Self::CollapsedRuins,
            Self::PlagueRuins,
        ]
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::House          => "house",
            Self::Prefecture     => "prefecture",
            Self::School         => "school",
            Self::College        => "college",
            Self::Library        => "library",
            Self::BurningRuins   => "burning_ruins",
            Self::BurnedRuins    => "burned_ruins",
            Self::CollapsedRuins => "collapsed_ruins",
            Self::PlagueRuins    => "plague_ruins",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::all().iter().copied().find(|k| k.name() == name)
    }

    /// Kinds that carry a worker quota.
    pub fn is_staffed(&self) -> bool {
        matches!(self, Self::Prefecture | Self::School | Self::College | Self::Library)
    }

    /// Role of the walkers this kind sends out, if any.
    pub fn service(&self) -> Option<Service> {
        match self {
            Self::Prefecture => Some(Service::Prefect),
            Self::School     => Some(Service::School),
            Self::College    => Some(Service::College),
            Self::Library    => Some(Service::Library),
            _ => None,
        }
    }

    pub fn is_ruins(&self) -> bool {
        matches!(
            self,
            Self::BurningRuins | Self::BurnedRuins | Self::CollapsedRuins | Self::PlagueRuins
        )
    }
}

impl fmt::Display for BuildingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// State shared by every building variant.
#[derive(Debug, Clone)]
pub struct BuildingBase {
    pub id:     BuildingId,
    pub kind:   BuildingKind,
    pub pos:    TilePos,
    pub state:  ConstructionState,
    pub visual: VisualState,
    deleted:    bool,
}

impl BuildingBase {
    pub fn new(kind: BuildingKind) -> Self {
        Self {
            id: 0,
            kind,
            pos: TilePos::default(),
            state: ConstructionState::new(),
            visual: VisualState::default(),
            deleted: false,
        }
    }

    /// Flag for removal; the city reaps flagged buildings after the pass.
    pub fn delete_later(&mut self) {
        self.deleted = true;
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted
    }

    pub fn save(&self, stream: &mut VariantMap) {
        stream.insert("type".into(), json!(self.kind.name()));
        stream.insert("id".into(), json!(self.id));
        stream.insert("pos".into(), json!([self.pos.i, self.pos.j]));
        stream.insert("fireLevel".into(), json!(self.state.get(ConstructionParam::Fire)));
        stream.insert("damageLevel".into(), json!(self.state.get(ConstructionParam::Damage)));
    }

    pub fn load(&mut self, stream: &VariantMap) -> SimResult<()> {
        self.id = variant::get_i64(stream, "id")
            .and_then(|id| BuildingId::try_from(id).ok())
            .ok_or_else(|| SimError::MalformedSave { reason: "building record without id".into() })?;

        let pos = stream
            .get("pos")
            .and_then(|v| v.as_array())
            .filter(|a| a.len() == 2)
            .and_then(|a| {
                let i = i32::try_from(a[0].as_i64()?).ok()?;
                let j = i32::try_from(a[1].as_i64()?).ok()?;
                Some(TilePos::new(i, j))
            })
            .ok_or_else(|| SimError::MalformedSave {
                reason: format!("building {} has no valid pos", self.id),
            })?;
        self.pos = pos;

        if let Some(fire) = variant::get_f64(stream, "fireLevel") {
            self.state.update(ConstructionParam::Fire, fire, false);
        }
        if let Some(damage) = variant::get_f64(stream, "damageLevel") {
            self.state.update(ConstructionParam::Damage, damage, false);
        }
        Ok(())
    }
}

/// What a building sees of the world during its own callback.
pub struct TickContext<'a> {
    pub tick:    Tick,
    pub walkers: &'a mut WalkerRegistry,
    pub config:  &'a SimConfig,
    events:      Vec<SimEvent>,
}

impl<'a> TickContext<'a> {
    pub fn new(tick: Tick, walkers: &'a mut WalkerRegistry, config: &'a SimConfig) -> Self {
        Self { tick, walkers, config, events: Vec::new() }
    }

    /// Queue a one-shot notification for the wider simulation.
    pub fn dispatch(&mut self, event: SimEvent) {
        self.events.push(event);
    }

    pub fn into_events(self) -> Vec<SimEvent> {
        self.events
    }
}

/// The contract every building variant fulfills.
pub trait Building: Send + fmt::Debug {
    fn base(&self) -> &BuildingBase;
    fn base_mut(&mut self) -> &mut BuildingBase;

    fn id(&self) -> BuildingId { self.base().id }
    fn kind(&self) -> BuildingKind { self.base().kind }
    fn pos(&self) -> TilePos { self.base().pos }
    fn is_deleted(&self) -> bool { self.base().is_deleted() }

    /// Place the building on `pos` and mark its tile.
    fn build(&mut self, tiles: &mut TileMap, pos: TilePos, _rng: &mut SubsystemRng) {
        self.base_mut().pos = pos;
        tiles.get_mut(pos).building = true;
    }

    /// Per-tick callback.
    fn time_step(&mut self, _ctx: &mut TickContext<'_>) {}

    /// Called once when the city reaps the building.
    fn destroy(&mut self, _ctx: &mut TickContext<'_>) {}

    fn is_walkable(&self) -> bool { false }

    fn needs_road_access(&self) -> bool { true }

    /// Priority with which `walker` wants to visit this building.
    fn evaluate_service(&self, _walker: &Walker) -> f64 { 0.0 }

    fn apply_service(&mut self, _walker: &Walker) {}

    /// Set the building alight. Returns false if it cannot burn; on
    /// success the building is flagged for removal.
    fn burn(&mut self) -> bool {
        self.base_mut().delete_later();
        true
    }

    /// Bring the building down. Same contract as `burn`.
    fn collapse(&mut self) -> bool {
        self.base_mut().delete_later();
        true
    }

    fn save(&self, stream: &mut VariantMap) {
        self.base().save(stream);
    }

    fn load(&mut self, stream: &VariantMap) -> SimResult<()> {
        self.base_mut().load(stream)
    }

    fn as_working(&self) -> Option<&WorkingBuilding> { None }
    fn as_working_mut(&mut self) -> Option<&mut WorkingBuilding> { None }
    fn as_house(&self) -> Option<&House> { None }
    fn as_house_mut(&mut self) -> Option<&mut House> { None }

    /// For downcasting in tests and tooling only.
    fn as_any(&self) -> &dyn Any;
}

/// Construct an unplaced building of `kind`.
pub fn create_building(kind: BuildingKind, config: &SimConfig) -> Box<dyn Building> {
    match kind {
        BuildingKind::House => Box::new(House::new()),
        BuildingKind::Prefecture
        | BuildingKind::School
        | BuildingKind::College
        | BuildingKind::Library => {
            Box::new(WorkingBuilding::new(kind, config.max_workers_for(kind)))
        }
        BuildingKind::BurningRuins   => Box::new(BurningRuins::new()),
        BuildingKind::BurnedRuins    => Box::new(BurnedRuins::new()),
        BuildingKind::CollapsedRuins => Box::new(CollapsedRuins::new()),
        BuildingKind::PlagueRuins    => Box::new(PlagueRuins::new()),
    }
}

/// Rebuild a saved building from its record.
pub fn load_building(stream: &VariantMap, config: &SimConfig) -> SimResult<Box<dyn Building>> {
    let name = variant::get_str(stream, "type")
        .ok_or_else(|| SimError::MalformedSave { reason: "building record without type".into() })?;
    let kind = BuildingKind::from_name(name)
        .ok_or_else(|| SimError::UnknownBuildingKind { kind: name.to_string() })?;
    let mut building = create_building(kind, config);
    building.load(stream)?;
    Ok(building)
}
