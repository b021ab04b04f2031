//! Autopilot: plays the campaign by walking the avatar onto a tile each week.
//!
//! Irrigates only when skipping would hurt, health is down to 60 or less and
//! the week is affordable; otherwise skips.

use bevy::prelude::*;

use crate::avatar::Avatar;
use crate::campaign::{ActiveTiles, Campaign};
use crate::scene::SceneNode;
use crate::shared::*;

pub const IRRIGATE_BELOW_HEALTH: u32 = 60;

#[derive(Resource, Debug, Clone, Default)]
pub struct Autopilot {
    /// Tile the avatar is currently heading for.
    pub target: Option<Entity>,
}

pub fn choose_decision(campaign: &Campaign) -> Decision {
    if campaign.skip_would_penalize()
        && campaign.crop_health <= IRRIGATE_BELOW_HEALTH
        && campaign.can_afford_irrigation()
    {
        Decision::Yes
    } else {
        Decision::No
    }
}

fn other(decision: Decision) -> Decision {
    match decision {
        Decision::Yes => Decision::No,
        Decision::No => Decision::Yes,
    }
}

fn distance_to_segment(point: Vec2, start: Vec2, end: Vec2) -> f32 {
    let span = end - start;
    let length_sq = span.length_squared();
    if length_sq == 0.0 {
        return point.distance(start);
    }
    let t = ((point - start).dot(span) / length_sq).clamp(0.0, 1.0);
    point.distance(start + span * t)
}

pub fn drive_autopilot(
    campaign: Res<Campaign>,
    tiles: Res<ActiveTiles>,
    nodes: Query<&SceneNode>,
    mut avatar: ResMut<Avatar>,
    mut pilot: ResMut<Autopilot>,
) {
    if campaign.is_over() || !avatar.is_idle() {
        return;
    }

    let decision = choose_decision(&campaign);
    let Some(tile) = tiles.get(decision) else {
        return;
    };
    if pilot.target == Some(tile) {
        return;
    }
    let Ok(node) = nodes.get(tile) else {
        return;
    };
    let target = node.position;

    // Standing on the tile already: no position change would be reported.
    if avatar.position.round() == target {
        avatar.teleport(target + Vec2::X);
        return;
    }

    pilot.target = Some(tile);
    info!(
        "[Autopilot] Week {}: {} (health {}%, money {})",
        campaign.current_week().map_or(0, |w| w.week),
        decision,
        campaign.crop_health,
        campaign.money
    );

    let blocked = tiles
        .get(other(decision))
        .and_then(|e| nodes.get(e).ok())
        .is_some_and(|n| distance_to_segment(n.position, avatar.position, target) < 1.0);
    if blocked {
        avatar.teleport(target);
    } else {
        avatar.walk_to(target);
    }
}

pub struct AutopilotPlugin;

impl Plugin for AutopilotPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<Autopilot>().add_systems(
            Update,
            drive_autopilot.run_if(in_state(GameState::Playing)),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skips_while_crops_are_healthy() {
        let mut campaign = Campaign::default();
        campaign.week_index = 3; // dry week
        campaign.crop_health = 70;
        assert_eq!(choose_decision(&campaign), Decision::No);

        campaign.crop_health = 60;
        assert_eq!(choose_decision(&campaign), Decision::Yes);

        campaign.money = 1_000;
        assert_eq!(choose_decision(&campaign), Decision::No, "cannot afford it");
    }

    #[test]
    fn never_irrigates_a_wet_week() {
        let mut campaign = Campaign::default();
        campaign.crop_health = 10;
        assert_eq!(choose_decision(&campaign), Decision::No);
    }

    #[test]
    fn segment_distance() {
        let a = Vec2::ZERO;
        let b = Vec2::new(10.0, 0.0);
        assert_eq!(distance_to_segment(Vec2::new(5.0, 3.0), a, b), 3.0);
        assert_eq!(distance_to_segment(Vec2::new(-4.0, 3.0), a, b), 5.0);
        assert_eq!(distance_to_segment(Vec2::new(1.0, 1.0), a, a), 2f32.sqrt());
    }
}
