//! Campaign domain: the 16-week irrigation season.
//!
//! `Campaign` is the authoritative state (week, money, crop health). Each week
//! two decision tiles are spawned in the scene; walking onto one publishes
//! `DECISION_MADE`, which the orchestrator in `decisions` applies:
//!
//! ```text
//! DECISION_MADE ─▶ irrigate / skip ─┬─ InsufficientFunds ─▶ respawn same week
//!                                   └─ applied ─▶ check_game_over ─┬─ Lost
//!                                                                  └─ advance_week ─┬─ Won
//!                                                                                   └─ next week's tiles
//! ```

use bevy::prelude::*;
use thiserror::Error;

use crate::bus::EventBus;
use crate::data::CampaignConfig;
use crate::scene::SceneGraph;
use crate::shared::*;

mod decisions;
mod tiles;

pub use decisions::{
    begin_campaign, on_decision_made, resolve_decision, restart_campaign, DecisionOutcome,
};
pub use tiles::{
    clear_decision_tiles, random_tile_position, spawn_decision_tiles, tile_bundle, ActiveTiles,
    DecisionTile, HOVER_RADIUS, PLACEMENT_ATTEMPTS,
};

pub const IRRIGATION_HEALTH_GAIN: u32 = 10;
pub const SKIP_HEALTH_PENALTY: u32 = 15;
/// Moisture band in which skipping irrigation is always safe.
pub const ADEQUATE_MOISTURE_BAND: (f32, f32) = (0.63, 0.67);
/// Below this, skipping irrigation costs crop health.
pub const DRY_THRESHOLD: f32 = 0.65;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CampaignError {
    #[error("not enough money to irrigate: cost {cost}, have {money}")]
    InsufficientFunds { cost: u32, money: u32 },
    #[error("the campaign has no weeks left")]
    CampaignComplete,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IrrigationReport {
    pub cost: u32,
    pub health_gain: u32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SkipReport {
    pub moisture: f32,
    pub health_loss: u32,
}

impl SkipReport {
    pub fn adequate(&self) -> bool {
        self.health_loss == 0
    }
}

/// Health lost by skipping irrigation at `moisture`.
///
/// The band check comes first, so 0.63..=0.65 is safe even though it is
/// below the dry threshold.
pub fn skip_penalty(moisture: f32) -> u32 {
    let (low, high) = ADEQUATE_MOISTURE_BAND;
    if (low..=high).contains(&moisture) {
        0
    } else if moisture < DRY_THRESHOLD {
        SKIP_HEALTH_PENALTY
    } else {
        0
    }
}

#[derive(Resource, Debug, Clone, PartialEq)]
pub struct Campaign {
    pub week_index: usize,
    pub money: u32,
    pub crop_health: u32,
    pub weekly_data: Vec<WeekRecord>,
    pub starting_money: u32,
    /// Set once the campaign reaches a terminal state.
    pub outcome: Option<CampaignOutcome>,
    /// Latest player-facing message from the orchestrator.
    pub last_message: Option<String>,
}

impl Default for Campaign {
    fn default() -> Self {
        Self::from_config(&CampaignConfig::default())
    }
}

impl Campaign {
    pub fn from_config(config: &CampaignConfig) -> Self {
        Self {
            week_index: 0,
            money: config.starting_money,
            crop_health: MAX_CROP_HEALTH,
            weekly_data: config.weeks.clone(),
            starting_money: config.starting_money,
            outcome: None,
            last_message: None,
        }
    }

    pub fn current_week(&self) -> Option<&WeekRecord> {
        self.weekly_data.get(self.week_index)
    }

    pub fn total_weeks(&self) -> usize {
        self.weekly_data.len()
    }

    pub fn is_final_week(&self) -> bool {
        self.week_index + 1 >= self.weekly_data.len()
    }

    pub fn is_over(&self) -> bool {
        self.outcome.is_some()
    }

    pub fn can_afford_irrigation(&self) -> bool {
        self.current_week().is_some_and(|week| self.money >= week.cost)
    }

    pub fn skip_would_penalize(&self) -> bool {
        self.current_week()
            .is_some_and(|week| skip_penalty(week.moisture) > 0)
    }

    /// Pay this week's irrigation cost for +10 crop health (capped at 100).
    /// Nothing changes when the money does not cover the cost.
    pub fn irrigate(&mut self) -> Result<IrrigationReport, CampaignError> {
        let cost = self
            .current_week()
            .ok_or(CampaignError::CampaignComplete)?
            .cost;
        if self.money < cost {
            return Err(CampaignError::InsufficientFunds {
                cost,
                money: self.money,
            });
        }

        self.money -= cost;
        self.crop_health = (self.crop_health + IRRIGATION_HEALTH_GAIN).min(MAX_CROP_HEALTH);
        Ok(IrrigationReport {
            cost,
            health_gain: IRRIGATION_HEALTH_GAIN,
        })
    }

    pub fn skip_irrigation(&mut self) -> Result<SkipReport, CampaignError> {
        let moisture = self
            .current_week()
            .ok_or(CampaignError::CampaignComplete)?
            .moisture;
        let health_loss = skip_penalty(moisture);
        self.crop_health = self.crop_health.saturating_sub(health_loss);
        Ok(SkipReport {
            moisture,
            health_loss,
        })
    }

    /// Move to the next week. Returns `Won` (and records it) once every week is played.
    pub fn advance_week(&mut self) -> Option<CampaignOutcome> {
        self.week_index += 1;
        if self.week_index >= self.weekly_data.len() {
            self.outcome = Some(CampaignOutcome::Won);
        }
        self.outcome
    }

    /// Crop death is checked before bankruptcy. Running out of money on the
    /// final week is not bankruptcy.
    pub fn check_game_over(&self) -> Option<LossReason> {
        if self.crop_health == 0 {
            return Some(LossReason::CropDeath);
        }

        let cheapest_remaining = self
            .weekly_data
            .get(self.week_index..)
            .and_then(|weeks| weeks.iter().map(|week| week.cost).min());
        match cheapest_remaining {
            Some(cost) if self.money < cost && !self.is_final_week() => Some(LossReason::Bankruptcy),
            _ => None,
        }
    }

    pub fn reset(&mut self) {
        self.week_index = 0;
        self.crop_health = MAX_CROP_HEALTH;
        self.money = self.starting_money;
        self.outcome = None;
        self.last_message = None;
    }
}

pub struct CampaignPlugin;

impl Plugin for CampaignPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<EventBus>()
            .init_resource::<SceneGraph>()
            .init_resource::<Campaign>()
            .init_resource::<ActiveTiles>()
            .add_event::<ToastEvent>()
            .add_event::<CampaignEndedEvent>()
            .configure_sets(
                OnEnter(GameState::Loading),
                (SetupSet::Field, SetupSet::Campaign).chain(),
            )
            .add_systems(
                OnEnter(GameState::Loading),
                begin_campaign.in_set(SetupSet::Campaign),
            );

        app.world_mut()
            .resource_mut::<EventBus>()
            .subscribe(EventKind::DecisionMade, None, on_decision_made);
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
