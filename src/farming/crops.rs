//! Crop growth-stage state machine.
//!
//! A crop grows through stages 0..=5 on its own timer. The timer runs faster
//! or slower depending on the last NDVI reading the crop received, and the
//! crop becomes harvestable at the final stage. Walking onto a harvestable
//! crop harvests it and removes it from the scene.

use bevy::prelude::*;

use crate::bus::{self, EventBus, ListenerError};
use crate::scene::{self, SceneNode};
use crate::shared::*;

pub const MAX_GROWTH_STAGE: u8 = 5;
pub const GROWTH_INTERVAL_MS: f32 = 3000.0;
/// NDVI readings broadcast farther away than this are not about this crop.
pub const NDVI_PROXIMITY: f32 = 50.0;
pub const STARTING_NDVI: f32 = 0.3;

#[derive(Component, Debug, Clone, PartialEq)]
pub struct Crop {
    pub kind: CropKind,
    pub growth_stage: u8,
    pub growth_timer: f32,
    pub ndvi_value: f32,
}

impl Crop {
    pub fn new(kind: CropKind) -> Self {
        Self {
            kind,
            growth_stage: 0,
            growth_timer: 0.0,
            ndvi_value: STARTING_NDVI,
        }
    }

    pub fn is_harvestable(&self) -> bool {
        self.growth_stage >= MAX_GROWTH_STAGE
    }

    /// Growth speed factor: half speed at worst, double at best.
    pub fn ndvi_multiplier(&self) -> f32 {
        (self.ndvi_value * 2.0).clamp(0.5, 2.0)
    }

    /// Advance the growth timer by `delta_ms`. Returns true when a new stage was reached.
    pub fn grow(&mut self, delta_ms: f32) -> bool {
        if self.is_harvestable() {
            return false;
        }

        self.growth_timer += delta_ms * self.ndvi_multiplier();
        if self.growth_timer >= GROWTH_INTERVAL_MS {
            self.growth_timer = 0.0;
            self.growth_stage = (self.growth_stage + 1).min(MAX_GROWTH_STAGE);
            return true;
        }
        false
    }
}

pub fn crop_bundle(kind: CropKind, position: Vec2) -> impl Bundle {
    (
        Name::new(format!("Crop:{}", kind.name())),
        SceneNode::new(position)
            .with_ready(crop_ready)
            .with_step(step_crop),
        Crop::new(kind),
    )
}

/// Plant a crop at `position` under `parent`.
pub fn plant_crop(world: &mut World, parent: Entity, kind: CropKind, position: Vec2) -> Entity {
    let entity = scene::spawn_child(world, parent, crop_bundle(kind, position));
    debug!("[Crop] Planted {} at ({}, {})", kind.name(), position.x, position.y);
    entity
}

fn crop_ready(world: &mut World, entity: Entity) {
    let Some(mut bus) = world.get_resource_mut::<EventBus>() else {
        return;
    };
    bus.subscribe(EventKind::NdviUpdate, Some(entity), move |world, event| {
        on_ndvi_update(world, entity, event)
    });
    bus.subscribe(EventKind::HeroPosition, Some(entity), move |world, event| {
        on_hero_position(world, entity, event)
    });
}

fn step_crop(world: &mut World, entity: Entity, delta_ms: f32) {
    let Some(position) = scene::position(world, entity) else {
        return;
    };
    let grown = world.get_mut::<Crop>(entity).and_then(|mut crop| {
        crop.grow(delta_ms).then(|| CropGrowth {
            position,
            stage: crop.growth_stage,
            kind: crop.kind,
            ndvi: crop.ndvi_value,
        })
    });

    if let Some(growth) = grown {
        debug!(
            "[Crop] {} reached stage {} (ndvi {:.2})",
            growth.kind.name(),
            growth.stage,
            growth.ndvi
        );
        bus::emit(world, GameEvent::CropGrowth(growth));
    }
}

fn on_ndvi_update(world: &mut World, entity: Entity, event: &GameEvent) -> Result<(), ListenerError> {
    let GameEvent::NdviUpdate(reading) = event else {
        return Ok(());
    };
    let position = scene::position(world, entity)
        .ok_or(ListenerError::MissingComponent(entity, "SceneNode"))?;
    let mut crop = world
        .get_mut::<Crop>(entity)
        .ok_or(ListenerError::MissingComponent(entity, "Crop"))?;

    if reading.position.distance(position) < NDVI_PROXIMITY {
        crop.ndvi_value = reading.value;
    }
    Ok(())
}

fn on_hero_position(world: &mut World, entity: Entity, event: &GameEvent) -> Result<(), ListenerError> {
    let GameEvent::HeroPosition(hero) = event else {
        return Ok(());
    };
    let position = scene::position(world, entity)
        .ok_or(ListenerError::MissingComponent(entity, "SceneNode"))?;
    let harvestable = world
        .get::<Crop>(entity)
        .ok_or(ListenerError::MissingComponent(entity, "Crop"))?
        .is_harvestable();

    if harvestable && hero.round() == position {
        harvest_crop(world, entity);
    }
    Ok(())
}

/// Publish `CROP_HARVESTED` for a mature crop and remove it from the scene.
/// Does nothing for crops that are not ready.
pub fn harvest_crop(world: &mut World, entity: Entity) -> bool {
    let Some(crop) = world.get::<Crop>(entity).cloned() else {
        return false;
    };
    if !crop.is_harvestable() {
        return false;
    }
    let position = scene::position(world, entity).unwrap_or(Vec2::ZERO);

    bus::emit(
        world,
        GameEvent::CropHarvested(CropHarvest {
            kind: crop.kind,
            harvest_amount: crop.kind.harvest_yield(),
            position,
            ndvi: crop.ndvi_value,
        }),
    );
    scene::destroy(world, entity);
    true
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
