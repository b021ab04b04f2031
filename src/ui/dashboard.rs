//! NDVI dashboard: the latest vegetation reading and what to do about it.

use bevy::prelude::*;

use crate::bus::ListenerError;
use crate::shared::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NdviStatus {
    Healthy,
    Moderate,
    Stressed,
}

impl NdviStatus {
    pub fn from_value(value: f32) -> Self {
        if value > 0.6 {
            NdviStatus::Healthy
        } else if value > 0.4 {
            NdviStatus::Moderate
        } else {
            NdviStatus::Stressed
        }
    }

    pub fn recommendation(self) -> &'static str {
        match self {
            NdviStatus::Healthy => "Excellent vegetation health!",
            NdviStatus::Moderate => "Consider fertilizing or watering.",
            NdviStatus::Stressed => "Urgent: Crops need attention!",
        }
    }
}

#[derive(Resource, Debug, Clone, Default, PartialEq)]
pub struct NdviDashboard {
    pub latest: Option<NdviReading>,
    pub readings: u32,
}

impl NdviDashboard {
    pub fn status(&self) -> Option<NdviStatus> {
        self.latest.as_ref().map(|r| NdviStatus::from_value(r.value))
    }

    pub fn recommendation(&self) -> Option<&'static str> {
        self.status().map(NdviStatus::recommendation)
    }
}

/// Bus listener for `NDVI_UPDATE`.
pub fn on_ndvi_update(world: &mut World, event: &GameEvent) -> Result<(), ListenerError> {
    let GameEvent::NdviUpdate(reading) = event else {
        return Ok(());
    };
    let mut dashboard = world
        .get_resource_mut::<NdviDashboard>()
        .ok_or(ListenerError::MissingResource("NdviDashboard"))?;
    dashboard.latest = Some(reading.clone());
    dashboard.readings += 1;
    Ok(())
}
