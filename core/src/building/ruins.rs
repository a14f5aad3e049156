//! Ruins left behind by fire, plague and collapse.
//!
//! Burning and plague ruins carry a fire level that burns down by one
//! point every `DECAY_INTERVAL` ticks. The picture switches to the
//! smouldering set at 50 and the embers set at 25. Once the fire is
//! out the ruin removes itself and asks for burned ruins in its place.
//! Burned and collapsed ruins are inert.

use std::any::Any;

use super::{Building, BuildingBase, BuildingKind, TickContext};
use crate::{
    construction::ConstructionParam,
    event::SimEvent,
    rng::SubsystemRng,
    tile::TileMap,
    types::{Tick, TilePos},
    visual::{Picture, ResourceGroup},
    walker::{Service, Walker},
};

pub const DECAY_INTERVAL: Tick = 16;
pub const INITIAL_FIRE: f64 = 99.0;
const SMOULDER_LEVEL: f64 = 50.0;
const EMBER_LEVEL: f64 = 25.0;

const BLAZE_PICTURE: u32 = 187;
const BLAZE_ANIMATION: u32 = 188;
const SMOULDER_PICTURE: u32 = 214;
const SMOULDER_ANIMATION: u32 = 215;
const EMBER_PICTURE: u32 = 223;
const EMBER_ANIMATION: u32 = 224;
const FIRE_FRAMES: u32 = 8;

/// Rubble pictures 111..=118 on land2a, one picked at random.
const RUBBLE_PICTURE: u32 = 111;
const RUBBLE_VARIANTS: u64 = 8;
const PLAGUE_SPRITE: u32 = 218;

fn ignite(base: &mut BuildingBase, fg_layers: usize) {
    base.state.update(ConstructionParam::Fire, INITIAL_FIRE, false);
    base.visual.set_picture(ResourceGroup::Land2a, BLAZE_PICTURE);
    base.visual
        .reload_animation(ResourceGroup::Land2a, BLAZE_ANIMATION, FIRE_FRAMES, (14, 26));
    base.visual.fg_pictures.resize(fg_layers, None);
}

/// Run the animation and mirror the current frame into fg slot 0.
fn animate(base: &mut BuildingBase, tick: Tick) {
    base.visual.animation.update(tick);
    let frame = base.visual.animation.frame();
    if let Some(slot) = base.visual.fg_pictures.get_mut(0) {
        *slot = frame;
    }
}

fn burn_down(base: &mut BuildingBase, tick: Tick) {
    if !tick.is_multiple_of(DECAY_INTERVAL) {
        return;
    }

    if base.state.get(ConstructionParam::Fire) > 0.0 {
        let fire = base.state.update(ConstructionParam::Fire, -1.0, true);
        if fire == SMOULDER_LEVEL {
            base.visual.set_picture(ResourceGroup::Land2a, SMOULDER_PICTURE);
            base.visual
                .reload_animation(ResourceGroup::Land2a, SMOULDER_ANIMATION, FIRE_FRAMES, (14, 26));
        } else if fire == EMBER_LEVEL {
            base.visual.set_picture(ResourceGroup::Land2a, EMBER_PICTURE);
            base.visual
                .reload_animation(ResourceGroup::Land2a, EMBER_ANIMATION, FIRE_FRAMES, (14, 18));
        }
    } else if !base.is_deleted() {
        log::info!("tick={tick} {} at {} burned out", base.kind, base.pos);
        base.delete_later();
        base.visual.clear_overlays();
    }
}

/// While burning, the tile is rock: nothing may be built or walked on it.
fn seal_tile(tiles: &mut TileMap, pos: TilePos) {
    let flags = tiles.get_mut(pos);
    flags.tree = false;
    flags.building = false;
    flags.road = false;
    flags.rock = true;
}

fn pick_rubble(rng: &mut SubsystemRng) -> u32 {
    RUBBLE_PICTURE + rng.next_u64_below(RUBBLE_VARIANTS) as u32
}

fn request_burned_ruins(base: &BuildingBase, ctx: &mut TickContext<'_>) {
    ctx.dispatch(SimEvent::BuildRequested {
        tick: ctx.tick,
        pos:  base.pos,
        kind: BuildingKind::BurnedRuins,
    });
}

// ── Burning ruins ──────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct BurningRuins {
    base: BuildingBase,
}

impl BurningRuins {
    pub fn new() -> Self {
        let mut base = BuildingBase::new(BuildingKind::BurningRuins);
        ignite(&mut base, 1);
        Self { base }
    }

    pub fn fire(&self) -> f64 {
        self.base.state.get(ConstructionParam::Fire)
    }
}

impl Default for BurningRuins {
    fn default() -> Self { Self::new() }
}

impl Building for BurningRuins {
    fn base(&self) -> &BuildingBase { &self.base }
    fn base_mut(&mut self) -> &mut BuildingBase { &mut self.base }

    fn build(&mut self, tiles: &mut TileMap, pos: TilePos, _rng: &mut SubsystemRng) {
        self.base.pos = pos;
        seal_tile(tiles, pos);
    }

    fn time_step(&mut self, ctx: &mut TickContext<'_>) {
        animate(&mut self.base, ctx.tick);
        burn_down(&mut self.base, ctx.tick);
    }

    fn destroy(&mut self, ctx: &mut TickContext<'_>) {
        request_burned_ruins(&self.base, ctx);
    }

    fn is_walkable(&self) -> bool {
        self.fire() == 0.0
    }

    fn needs_road_access(&self) -> bool { false }

    /// Prefects rank a fire by twice its remaining level.
    fn evaluate_service(&self, walker: &Walker) -> f64 {
        match walker.service {
            Service::Prefect => self.fire() * 2.0,
            _ => 0.0,
        }
    }

    fn apply_service(&mut self, walker: &Walker) {
        if walker.service == Service::Prefect {
            let remaining = self.fire() - walker.service_value;
            self.base.state.update(ConstructionParam::Fire, remaining, false);
        }
    }

    fn burn(&mut self) -> bool { false }
    fn collapse(&mut self) -> bool { false }

    fn as_any(&self) -> &dyn Any { self }
}

// ── Burned ruins ───────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct BurnedRuins {
    base: BuildingBase,
}

impl BurnedRuins {
    pub fn new() -> Self {
        Self { base: BuildingBase::new(BuildingKind::BurnedRuins) }
    }
}

impl Default for BurnedRuins {
    fn default() -> Self { Self::new() }
}

impl Building for BurnedRuins {
    fn base(&self) -> &BuildingBase { &self.base }
    fn base_mut(&mut self) -> &mut BuildingBase { &mut self.base }

    fn build(&mut self, tiles: &mut TileMap, pos: TilePos, rng: &mut SubsystemRng) {
        self.base.pos = pos;
        self.base.visual.set_picture(ResourceGroup::Land2a, pick_rubble(rng));
        let flags = tiles.get_mut(pos);
        flags.building = true;
        flags.rock = false;
    }

    fn is_walkable(&self) -> bool { true }
    fn needs_road_access(&self) -> bool { false }

    fn burn(&mut self) -> bool { false }
    fn collapse(&mut self) -> bool { false }

    fn as_any(&self) -> &dyn Any { self }
}

// ── Collapsed ruins ────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct CollapsedRuins {
    base: BuildingBase,
}

impl CollapsedRuins {
    pub fn new() -> Self {
        let mut base = BuildingBase::new(BuildingKind::CollapsedRuins);
        base.state.update(ConstructionParam::Damage, 1.0, false);

        // One pass of the dust cloud.
        let anim = &mut base.visual.animation;
        anim.load(ResourceGroup::Sprites, 1, 8);
        anim.set_offset(14, 26);
        anim.set_delay(4);
        anim.set_loop(false);
        base.visual.fg_pictures.resize(1, None);
        Self { base }
    }
}

impl Default for CollapsedRuins {
    fn default() -> Self { Self::new() }
}

impl Building for CollapsedRuins {
    fn base(&self) -> &BuildingBase { &self.base }
    fn base_mut(&mut self) -> &mut BuildingBase { &mut self.base }

    fn build(&mut self, tiles: &mut TileMap, pos: TilePos, rng: &mut SubsystemRng) {
        self.base.pos = pos;
        let flags = tiles.get_mut(pos);
        flags.tree = false;
        flags.building = true;
        flags.road = false;
        self.base.visual.set_picture(ResourceGroup::Land2a, pick_rubble(rng));
    }

    fn time_step(&mut self, ctx: &mut TickContext<'_>) {
        animate(&mut self.base, ctx.tick);
    }

    fn is_walkable(&self) -> bool { true }
    fn needs_road_access(&self) -> bool { false }

    fn burn(&mut self) -> bool { false }
    fn collapse(&mut self) -> bool { false }

    fn as_any(&self) -> &dyn Any { self }
}

// ── Plague ruins ───────────────────────────────────────────────────

/// A burning pyre left by plague. Decays like burning ruins but
/// prefects cannot put it out.
#[derive(Debug, Clone)]
pub struct PlagueRuins {
    base: BuildingBase,
}

impl PlagueRuins {
    pub fn new() -> Self {
        let mut base = BuildingBase::new(BuildingKind::PlagueRuins);
        ignite(&mut base, 2);
        base.visual.fg_pictures[1] =
            Some(Picture::new(ResourceGroup::Sprites, PLAGUE_SPRITE).with_offset(16, 32));
        Self { base }
    }

    pub fn fire(&self) -> f64 {
        self.base.state.get(ConstructionParam::Fire)
    }
}

impl Default for PlagueRuins {
    fn default() -> Self { Self::new() }
}

impl Building for PlagueRuins {
    fn base(&self) -> &BuildingBase { &self.base }
    fn base_mut(&mut self) -> &mut BuildingBase { &mut self.base }

    fn build(&mut self, tiles: &mut TileMap, pos: TilePos, _rng: &mut SubsystemRng) {
        self.base.pos = pos;
        seal_tile(tiles, pos);
    }

    fn time_step(&mut self, ctx: &mut TickContext<'_>) {
        animate(&mut self.base, ctx.tick);
        burn_down(&mut self.base, ctx.tick);
    }

    fn destroy(&mut self, ctx: &mut TickContext<'_>) {
        request_burned_ruins(&self.base, ctx);
    }

    fn is_walkable(&self) -> bool {
        self.fire() == 0.0
    }

    fn needs_road_access(&self) -> bool { false }

    fn burn(&mut self) -> bool { false }
    fn collapse(&mut self) -> bool { false }

    fn as_any(&self) -> &dyn Any { self }
}
