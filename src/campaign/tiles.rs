//! Decision tiles: the YES/NO pads the avatar walks onto each week.

use bevy::prelude::*;
use rand::Rng;

use crate::bus::{self, EventBus, ListenerError};
use crate::scene::{self, SceneGraph, SceneNode};
use crate::shared::*;

use super::Campaign;

/// The avatar counts as hovering a tile within this distance.
pub const HOVER_RADIUS: f32 = 20.0;
pub const PLACEMENT_ATTEMPTS: u32 = 50;

#[derive(Component, Debug, Clone, PartialEq)]
pub struct DecisionTile {
    pub decision: Decision,
    pub week: WeekRecord,
    pub hovered: bool,
    activated: bool,
}

impl DecisionTile {
    pub fn new(decision: Decision, week: WeekRecord) -> Self {
        Self {
            decision,
            week,
            hovered: false,
            activated: false,
        }
    }

    pub fn is_activated(&self) -> bool {
        self.activated
    }

    /// Update hover state for an avatar at `hero`. Returns true exactly once:
    /// the first time the rounded avatar position lands on `tile`.
    pub fn observe_hero(&mut self, tile: Vec2, hero: Vec2) -> bool {
        let hero = hero.round();
        self.hovered = hero.distance(tile) < HOVER_RADIUS;

        if hero == tile && !self.activated {
            self.activated = true;
            return true;
        }
        false
    }
}

/// The current week's tiles, if spawned.
#[derive(Resource, Debug, Default, Clone)]
pub struct ActiveTiles {
    pub yes: Option<Entity>,
    pub no: Option<Entity>,
}

impl ActiveTiles {
    pub fn get(&self, decision: Decision) -> Option<Entity> {
        match decision {
            Decision::Yes => self.yes,
            Decision::No => self.no,
        }
    }
}

pub fn tile_bundle(decision: Decision, week: WeekRecord, position: Vec2) -> impl Bundle {
    (
        Name::new(format!("DecisionTile:{}", decision)),
        SceneNode::new(position).with_ready(tile_ready),
        DecisionTile::new(decision, week),
    )
}

fn tile_ready(world: &mut World, entity: Entity) {
    let Some(mut bus) = world.get_resource_mut::<EventBus>() else {
        return;
    };
    bus.subscribe(EventKind::HeroPosition, Some(entity), move |world, event| {
        on_hero_position(world, entity, event)
    });
}

fn on_hero_position(world: &mut World, entity: Entity, event: &GameEvent) -> Result<(), ListenerError> {
    let GameEvent::HeroPosition(hero) = event else {
        return Ok(());
    };
    let position = scene::position(world, entity)
        .ok_or(ListenerError::MissingComponent(entity, "SceneNode"))?;
    let mut tile = world
        .get_mut::<DecisionTile>(entity)
        .ok_or(ListenerError::MissingComponent(entity, "DecisionTile"))?;

    if !tile.observe_hero(position, *hero) {
        return Ok(());
    }
    let made = DecisionMade {
        decision: tile.decision,
        week: tile.week.clone(),
    };
    info!("[Campaign] Week {} decision: {}", made.week.week, made.decision);
    bus::emit(world, GameEvent::DecisionMade(made));
    Ok(())
}

/// Bounded rejection sampler over the tile area (cells x 3..=9, y 4..=8).
/// Falls back to the last candidate when nothing far enough from `avoid` turns up.
pub fn random_tile_position(rng: &mut impl Rng, avoid: Vec2, min_cells: i32) -> Vec2 {
    let min_distance = grid_cells(min_cells);
    let mut candidate = Vec2::ZERO;
    for _ in 0..PLACEMENT_ATTEMPTS {
        candidate = Vec2::new(
            grid_cells(rng.gen_range(3..=9)),
            grid_cells(rng.gen_range(4..=8)),
        );
        if candidate.distance(avoid) >= min_distance {
            return candidate;
        }
    }
    candidate
}

/// Destroy the current tiles, if any.
pub fn clear_decision_tiles(world: &mut World) {
    let Some(mut active) = world.get_resource_mut::<ActiveTiles>() else {
        return;
    };
    let tiles = std::mem::take(&mut *active);
    for entity in [tiles.yes, tiles.no].into_iter().flatten() {
        scene::destroy(world, entity);
    }
}

/// Replace the tiles with a fresh YES/NO pair for the campaign's current week.
/// YES keeps 3 cells from the origin; NO keeps 4 cells from YES.
pub fn spawn_decision_tiles(world: &mut World) -> Option<(Entity, Entity)> {
    clear_decision_tiles(world);

    let Some(week) = world
        .get_resource::<Campaign>()
        .and_then(|campaign| campaign.current_week().cloned())
    else {
        warn!("[Campaign] No current week; not spawning decision tiles");
        return None;
    };
    let root = world.get_resource::<SceneGraph>()?.root();

    let (yes_pos, no_pos) = {
        let mut rng = world.get_resource_or_insert_with(FarmRng::default);
        let yes_pos = random_tile_position(&mut rng.0, Vec2::ZERO, 3);
        let no_pos = random_tile_position(&mut rng.0, yes_pos, 4);
        (yes_pos, no_pos)
    };

    let yes = scene::spawn_child(world, root, tile_bundle(Decision::Yes, week.clone(), yes_pos));
    let no = scene::spawn_child(world, root, tile_bundle(Decision::No, week.clone(), no_pos));
    world.insert_resource(ActiveTiles {
        yes: Some(yes),
        no: Some(no),
    });

    debug!(
        "[Campaign] Week {} tiles: YES at ({}, {}), NO at ({}, {})",
        week.week, yes_pos.x, yes_pos.y, no_pos.x, no_pos.y
    );
    Some((yes, no))
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::Lifecycle;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[derive(Resource, Default)]
    struct Decisions(Vec<DecisionMade>);

    fn test_world() -> World {
        let mut world = World::new();
        world.init_resource::<EventBus>();
        world.init_resource::<SceneGraph>();
        world.init_resource::<Campaign>();
        world.init_resource::<ActiveTiles>();
        world.init_resource::<Decisions>();
        world.insert_resource(FarmRng::seeded(3));
        world
            .resource_mut::<EventBus>()
            .subscribe(EventKind::DecisionMade, None, |w, event| {
                if let GameEvent::DecisionMade(made) = event {
                    w.resource_mut::<Decisions>().0.push(made.clone());
                }
                Ok(())
            });
        world
    }

    #[test]
    fn tile_latches_after_first_activation() {
        let week = Campaign::default().weekly_data[0].clone();
        let mut tile = DecisionTile::new(Decision::Yes, week);
        let at = Vec2::new(48.0, 64.0);

        assert!(!tile.observe_hero(at, Vec2::new(80.0, 64.0)));
        assert!(!tile.hovered);
        assert!(!tile.observe_hero(at, Vec2::new(60.0, 64.0)));
        assert!(tile.hovered);

        assert!(tile.observe_hero(at, Vec2::new(48.3, 63.6)));
        assert!(tile.is_activated());
        assert!(!tile.observe_hero(at, at), "fires at most once");
    }

    #[test]
    fn placement_stays_in_bounds() {
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..200 {
            let yes = random_tile_position(&mut rng, Vec2::ZERO, 3);
            let no = random_tile_position(&mut rng, yes, 4);
            for pos in [yes, no] {
                assert!((grid_cells(3)..=grid_cells(9)).contains(&pos.x));
                assert!((grid_cells(4)..=grid_cells(8)).contains(&pos.y));
                assert_eq!(pos.x % TILE_SIZE, 0.0);
                assert_eq!(pos.y % TILE_SIZE, 0.0);
            }
            assert!(yes.length() >= grid_cells(3));
        }
    }

    #[test]
    fn placement_keeps_distance_when_possible() {
        let mut rng = StdRng::seed_from_u64(21);
        let corner = Vec2::new(grid_cells(3), grid_cells(4));
        for _ in 0..200 {
            let pos = random_tile_position(&mut rng, corner, 4);
            assert!(pos.distance(corner) >= grid_cells(4));
        }
    }

    #[test]
    fn placement_falls_back_to_last_candidate() {
        let mut rng = StdRng::seed_from_u64(5);
        // Nothing in the area is 100 cells from the origin.
        let pos = random_tile_position(&mut rng, Vec2::ZERO, 100);
        assert!((grid_cells(3)..=grid_cells(9)).contains(&pos.x));
        assert!((grid_cells(4)..=grid_cells(8)).contains(&pos.y));
    }

    #[test]
    fn stepping_on_a_tile_emits_one_decision() {
        let mut world = test_world();
        let (yes, no) = spawn_decision_tiles(&mut world).expect("tiles spawn");
        let yes_pos = scene::position(&world, yes).expect("yes tile positioned");

        bus::emit(&mut world, GameEvent::HeroPosition(yes_pos));
        bus::emit(&mut world, GameEvent::HeroPosition(yes_pos));

        let decisions = &world.resource::<Decisions>().0;
        assert_eq!(decisions.len(), 1);
        assert_eq!(decisions[0].decision, Decision::Yes);
        assert_eq!(decisions[0].week.date, "Jan 7");
        assert_eq!(
            world.get::<DecisionTile>(no).map(DecisionTile::is_activated),
            Some(false)
        );
    }

    #[test]
    fn respawning_replaces_the_old_pair() {
        let mut world = test_world();
        let (yes, no) = spawn_decision_tiles(&mut world).expect("tiles spawn");
        let (yes2, no2) = spawn_decision_tiles(&mut world).expect("tiles respawn");

        assert_eq!(scene::lifecycle(&world, yes), Lifecycle::Destroyed);
        assert_eq!(scene::lifecycle(&world, no), Lifecycle::Destroyed);
        assert_eq!(scene::lifecycle(&world, yes2), Lifecycle::Active);
        assert_eq!(scene::lifecycle(&world, no2), Lifecycle::Active);
        assert_eq!(world.resource::<EventBus>().subscriber_count(EventKind::HeroPosition), 2);

        clear_decision_tiles(&mut world);
        assert_eq!(world.resource::<EventBus>().subscriber_count(EventKind::HeroPosition), 0);
        assert_eq!(world.resource::<ActiveTiles>().get(Decision::Yes), None);
    }

    #[test]
    fn no_tiles_after_the_last_week() {
        let mut world = test_world();
        world.resource_mut::<Campaign>().week_index = CAMPAIGN_WEEKS;
        assert_eq!(spawn_decision_tiles(&mut world), None);
    }
}
