//! Decision orchestrator: applies `DECISION_MADE` to the campaign.
//!
//! Lives outside the scene: it owns no entity and outlives the weekly tiles.

use bevy::prelude::*;

use crate::bus::ListenerError;
use crate::data::CampaignConfig;
use crate::scene::SceneGraph;
use crate::shared::*;

use super::{clear_decision_tiles, spawn_decision_tiles, Campaign, CampaignError};

const TOAST_SECS: f32 = 3.0;

/// What a single decision did to the campaign.
#[derive(Debug, Clone, PartialEq)]
pub enum DecisionOutcome {
    /// Irrigation could not be paid for; the same week is offered again.
    Retry(CampaignError),
    /// Applied; the campaign moved on to `week_index`.
    NextWeek { week_index: usize },
    Ended(CampaignOutcome),
    /// The campaign was already over or missing.
    Ignored,
}

/// Bus listener for `DECISION_MADE`.
pub fn on_decision_made(world: &mut World, event: &GameEvent) -> Result<(), ListenerError> {
    let GameEvent::DecisionMade(made) = event else {
        return Ok(());
    };
    if !world.contains_resource::<Campaign>() {
        return Err(ListenerError::MissingResource("Campaign"));
    }
    resolve_decision(world, made.decision);
    Ok(())
}

/// Apply `decision` to the current week, then check for the end of the
/// campaign (against the pre-advance state) and move on to the next week.
pub fn resolve_decision(world: &mut World, decision: Decision) -> DecisionOutcome {
    let Some(mut campaign) = world.get_resource_mut::<Campaign>() else {
        warn!("[Campaign] Decision {} with no campaign running", decision);
        return DecisionOutcome::Ignored;
    };
    if campaign.is_over() {
        debug!("[Campaign] Ignoring {} after the campaign ended", decision);
        return DecisionOutcome::Ignored;
    }

    let applied = match decision {
        Decision::Yes => campaign.irrigate().map(|report| {
            format!(
                "Farm irrigated! Cost: -{} | Crop health +{}%",
                format_amount(report.cost),
                report.health_gain
            )
        }),
        Decision::No => campaign.skip_irrigation().map(|report| {
            let percent = (report.moisture * 100.0).round();
            if report.adequate() {
                format!(
                    "Irrigation skipped. Soil moisture at {}% is adequate, no health penalty",
                    percent
                )
            } else {
                format!(
                    "Warning: irrigation skipped. Soil moisture at {}% is too low! Crop health -{}%",
                    percent, report.health_loss
                )
            }
        }),
    };

    let message = match applied {
        Ok(message) => message,
        Err(err) => {
            warn!("[Campaign] {}", err);
            toast(world, "Not enough money to irrigate!".to_string());
            spawn_decision_tiles(world);
            return DecisionOutcome::Retry(err);
        }
    };
    toast(world, message);

    let Some(mut campaign) = world.get_resource_mut::<Campaign>() else {
        return DecisionOutcome::Ignored;
    };
    if let Some(loss) = campaign.check_game_over() {
        let outcome = CampaignOutcome::Lost(loss);
        finish(world, outcome);
        return DecisionOutcome::Ended(outcome);
    }
    if let Some(outcome) = campaign.advance_week() {
        finish(world, outcome);
        return DecisionOutcome::Ended(outcome);
    }

    let week_index = campaign.week_index;
    info!(
        "[Campaign] Week {} of {}: money {}, crop health {}%",
        week_index + 1,
        campaign.total_weeks(),
        campaign.money,
        campaign.crop_health
    );
    spawn_decision_tiles(world);
    DecisionOutcome::NextWeek { week_index }
}

/// Record a terminal outcome: announce it, stop the scene, drop the tiles
/// and move the game state to `Won`/`Lost`.
fn finish(world: &mut World, outcome: CampaignOutcome) {
    let Some(mut campaign) = world.get_resource_mut::<Campaign>() else {
        return;
    };
    campaign.outcome = Some(outcome);
    let ended = CampaignEndedEvent {
        outcome,
        week: campaign
            .current_week()
            .map_or(campaign.total_weeks() as u32, |week| week.week),
        money: campaign.money,
        crop_health: campaign.crop_health,
    };
    let message = match outcome {
        CampaignOutcome::Won => format!(
            "You win! Managed your farm for {} weeks. Final crop health: {}% | Money: {}",
            campaign.total_weeks(),
            ended.crop_health,
            format_amount(ended.money)
        ),
        CampaignOutcome::Lost(LossReason::CropDeath) => format!(
            "Game over! Your crops have died. Final crop health: {}% | Money: {}",
            ended.crop_health,
            format_amount(ended.money)
        ),
        CampaignOutcome::Lost(LossReason::Bankruptcy) => format!(
            "Game over! You ran out of money. Crop health: {}% | Money: {}",
            ended.crop_health,
            format_amount(ended.money)
        ),
    };
    info!("[Campaign] {}", message);
    toast(world, message);
    world.send_event(ended);

    if let Some(mut scene) = world.get_resource_mut::<SceneGraph>() {
        scene.halt();
    }
    clear_decision_tiles(world);

    if let Some(mut next) = world.get_resource_mut::<NextState<GameState>>() {
        next.set(match outcome {
            CampaignOutcome::Won => GameState::Won,
            CampaignOutcome::Lost(_) => GameState::Lost,
        });
    }
}

fn toast(world: &mut World, message: String) {
    if let Some(mut campaign) = world.get_resource_mut::<Campaign>() {
        campaign.last_message = Some(message.clone());
    }
    world.send_event(ToastEvent {
        message,
        duration_secs: TOAST_SECS,
    });
}

/// Thousands-separated amount, e.g. `12,000`.
fn format_amount(amount: u32) -> String {
    let digits = amount.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Restart the season: week 1, full crop health, starting money. Resumes the
/// scene and offers week 1.
pub fn restart_campaign(world: &mut World) {
    let (weeks, money) = match world.get_resource_mut::<Campaign>() {
        Some(mut campaign) => {
            campaign.reset();
            (campaign.total_weeks(), campaign.money)
        }
        None => {
            let campaign = world
                .get_resource::<CampaignConfig>()
                .map(Campaign::from_config)
                .unwrap_or_default();
            let summary = (campaign.total_weeks(), campaign.money);
            world.insert_resource(campaign);
            summary
        }
    };

    if let Some(mut scene) = world.get_resource_mut::<SceneGraph>() {
        scene.resume();
    }
    spawn_decision_tiles(world);
    info!("[Campaign] Season started: {} weeks, money {}", weeks, money);

    if let Some(mut next) = world.get_resource_mut::<NextState<GameState>>() {
        next.set(GameState::Playing);
    }
}

/// `OnEnter(Loading)`: the field is planted; load the configured season and start it.
pub fn begin_campaign(world: &mut World) {
    let campaign = world
        .get_resource::<CampaignConfig>()
        .map(Campaign::from_config)
        .unwrap_or_default();
    world.insert_resource(campaign);
    restart_campaign(world);
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
