//! Avatar driver: the stand-in for player input.
//!
//! Holds the avatar position and walks it in a straight line toward a
//! destination. Publishes `HERO_POSITION` (rounded) whenever the rounded
//! position changes; crops and decision tiles react to that.

use bevy::prelude::*;

use crate::bus;
use crate::shared::*;

/// Walking speed in world units per millisecond (one unit per 60 Hz frame).
pub const AVATAR_SPEED: f32 = 0.06;
pub const AVATAR_START_CELL: (i32, i32) = (6, 5);

pub fn avatar_start() -> Vec2 {
    Vec2::new(grid_cells(AVATAR_START_CELL.0), grid_cells(AVATAR_START_CELL.1))
}

#[derive(Resource, Debug, Clone, PartialEq)]
pub struct Avatar {
    pub position: Vec2,
    pub destination: Option<Vec2>,
    pub speed: f32,
    last_reported: Option<Vec2>,
}

impl Default for Avatar {
    fn default() -> Self {
        let start = avatar_start();
        Self {
            position: start,
            destination: None,
            speed: AVATAR_SPEED,
            last_reported: Some(start.round()),
        }
    }
}

impl Avatar {
    pub fn walk_to(&mut self, destination: Vec2) {
        self.destination = Some(destination);
    }

    /// Jump straight to `position`; the move is reported on the next step.
    pub fn teleport(&mut self, position: Vec2) {
        self.position = position;
        self.destination = None;
    }

    pub fn is_idle(&self) -> bool {
        self.destination.is_none()
    }

    /// Move for `delta_ms`. Returns the rounded position when it differs from
    /// the last one reported.
    pub fn step(&mut self, delta_ms: f32) -> Option<Vec2> {
        if let Some(destination) = self.destination {
            let remaining = destination - self.position;
            let reach = self.speed * delta_ms;
            if remaining.length() <= reach {
                self.position = destination;
                self.destination = None;
            } else {
                self.position += remaining.normalize() * reach;
            }
        }

        let rounded = self.position.round();
        if self.last_reported == Some(rounded) {
            return None;
        }
        self.last_reported = Some(rounded);
        Some(rounded)
    }
}

pub struct AvatarPlugin;

impl Plugin for AvatarPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<Avatar>()
            .add_systems(OnEnter(GameState::Loading), reset_avatar)
            .add_systems(
                PreUpdate,
                move_avatar.run_if(in_state(GameState::Playing)),
            );
    }
}

fn reset_avatar(mut avatar: ResMut<Avatar>) {
    *avatar = Avatar::default();
}

fn move_avatar(world: &mut World) {
    let delta_ms = world.resource::<Time>().delta_secs() * 1000.0;
    let Some(moved) = world
        .get_resource_mut::<Avatar>()
        .and_then(|mut avatar| avatar.step(delta_ms))
    else {
        return;
    };
    debug!("[Avatar] At ({}, {})", moved.x, moved.y);
    bus::emit(world, GameEvent::HeroPosition(moved));
}
