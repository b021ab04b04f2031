//! Harvest ledger: tallies what the field produced.

use bevy::prelude::*;
use std::collections::HashMap;

use crate::bus::ListenerError;
use crate::shared::*;

#[derive(Resource, Debug, Clone, Default, PartialEq)]
pub struct HarvestLedger {
    pub by_kind: HashMap<CropKind, u32>,
    pub total: u32,
}

impl HarvestLedger {
    pub fn record(&mut self, kind: CropKind, amount: u32) {
        *self.by_kind.entry(kind).or_insert(0) += amount;
        self.total += amount;
    }

    pub fn amount(&self, kind: CropKind) -> u32 {
        self.by_kind.get(&kind).copied().unwrap_or(0)
    }
}

/// Bus listener for `CROP_HARVESTED`.
pub fn on_crop_harvested(world: &mut World, event: &GameEvent) -> Result<(), ListenerError> {
    let GameEvent::CropHarvested(harvest) = event else {
        return Ok(());
    };
    let mut ledger = world
        .get_resource_mut::<HarvestLedger>()
        .ok_or(ListenerError::MissingResource("HarvestLedger"))?;
    ledger.record(harvest.kind, harvest.harvest_amount);
    info!(
        "[Harvest] +{} {} (total {})",
        harvest.harvest_amount,
        harvest.kind.name(),
        ledger.total
    );
    Ok(())
}
