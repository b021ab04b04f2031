//! Farming domain: the field: NDVI simulator, crops, harvest tally.
//!
//! Communicates with other domains exclusively through the event bus and
//! crate::shared types.

use bevy::prelude::*;

use crate::bus::EventBus;
use crate::data::CampaignConfig;
use crate::ndvi;
use crate::scene::{self, SceneGraph};
use crate::shared::*;

mod crops;
mod harvest;

pub use crops::{
    crop_bundle, harvest_crop, plant_crop, Crop, GROWTH_INTERVAL_MS, MAX_GROWTH_STAGE, NDVI_PROXIMITY,
    STARTING_NDVI,
};
pub use harvest::HarvestLedger;

pub struct FarmingPlugin;

impl Plugin for FarmingPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<EventBus>()
            .init_resource::<SceneGraph>()
            .init_resource::<HarvestLedger>()
            .add_systems(
                OnEnter(GameState::Loading),
                setup_field.in_set(SetupSet::Field),
            );

        app.world_mut()
            .resource_mut::<EventBus>()
            .subscribe(EventKind::CropHarvested, None, harvest::on_crop_harvested);
    }
}

/// Reset the scene and lay out a fresh field: the NDVI simulator at the
/// origin plus every configured crop.
pub fn setup_field(world: &mut World) {
    let config = world
        .get_resource::<CampaignConfig>()
        .cloned()
        .unwrap_or_default();

    scene::clear(world);
    world.resource_mut::<SceneGraph>().resume();
    let root = world.resource::<SceneGraph>().root();

    ndvi::spawn_ndvi_simulator(world, root, config.starting_condition);
    for placement in &config.field {
        let (x, y) = placement.cell;
        plant_crop(
            world,
            root,
            placement.kind,
            Vec2::new(grid_cells(x), grid_cells(y)),
        );
    }
    *world.resource_mut::<HarvestLedger>() = HarvestLedger::default();

    info!(
        "[Farming] Field ready: {} crops, NDVI condition {}",
        config.field.len(),
        config.starting_condition
    );
}
