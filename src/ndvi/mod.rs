//! NDVI simulator: a stand-in for satellite vegetation-index data.
//!
//! A scene entity that accumulates frame time and, every
//! `NDVI_BROADCAST_INTERVAL_MS`, publishes an `NDVI_UPDATE` reading drawn
//! around the baseline of the current field condition. It never listens to
//! the bus itself.

use bevy::prelude::*;
use rand::Rng;

use crate::bus;
use crate::scene::{self, SceneGraph, SceneNode};
use crate::shared::*;

pub const NDVI_BROADCAST_INTERVAL_MS: f32 = 5000.0;
/// Readings vary uniformly by up to this much around the condition baseline.
pub const NDVI_VARIATION: f32 = 0.05;

#[derive(Component, Debug, Clone)]
pub struct NdviSimulator {
    pub timer: f32,
    pub interval: f32,
    condition: FieldCondition,
}

impl NdviSimulator {
    pub fn new(condition: FieldCondition) -> Self {
        Self {
            timer: 0.0,
            interval: NDVI_BROADCAST_INTERVAL_MS,
            condition,
        }
    }

    pub fn condition(&self) -> FieldCondition {
        self.condition
    }

    /// Switch the simulated field condition by name. Unknown names are ignored
    /// and the current condition is kept.
    pub fn set_condition(&mut self, name: &str) {
        if let Ok(condition) = name.parse::<FieldCondition>() {
            self.condition = condition;
            info!("[NDVI] Field condition changed to: {}", condition);
        }
    }

    /// Accumulate `delta_ms`; true when a broadcast is due (the timer restarts from zero).
    pub fn advance(&mut self, delta_ms: f32) -> bool {
        self.timer += delta_ms;
        if self.timer >= self.interval {
            self.timer = 0.0;
            true
        } else {
            false
        }
    }

    pub fn sample(&self, rng: &mut impl Rng) -> f32 {
        let variation = rng.gen_range(-NDVI_VARIATION..NDVI_VARIATION);
        (self.condition.baseline() + variation).clamp(0.0, 1.0)
    }
}

/// Spawn a simulator at the origin and attach it under `parent`.
pub fn spawn_ndvi_simulator(world: &mut World, parent: Entity, condition: FieldCondition) -> Entity {
    scene::spawn_child(
        world,
        parent,
        (
            Name::new("NdviSimulator"),
            SceneNode::new(Vec2::ZERO).with_step(step_simulator),
            NdviSimulator::new(condition),
        ),
    )
}

fn step_simulator(world: &mut World, entity: Entity, delta_ms: f32) {
    let due = world
        .get_mut::<NdviSimulator>(entity)
        .is_some_and(|mut sim| sim.advance(delta_ms));
    if due {
        broadcast(world, entity);
    }
}

/// Draw a reading from simulator `entity` and publish it as `NDVI_UPDATE`.
pub fn broadcast(world: &mut World, entity: Entity) {
    let Some(sim) = world.get::<NdviSimulator>(entity).cloned() else {
        return;
    };
    let position = scene::position(world, entity).unwrap_or(Vec2::ZERO);
    let timestamp = world
        .get_resource::<SceneGraph>()
        .map_or(0.0, |scene| scene.elapsed_ms());
    let value = {
        let mut rng = world.get_resource_or_insert_with(FarmRng::default);
        sim.sample(&mut rng.0)
    };

    info!("[NDVI] Update: {:.2} ({})", value, sim.condition());
    bus::emit(
        world,
        GameEvent::NdviUpdate(NdviReading {
            value,
            position,
            timestamp,
            condition: sim.condition(),
        }),
    );
}

/// Apply `set_condition(name)` to every simulator in the world.
pub fn set_field_condition(world: &mut World, name: &str) {
    let mut query = world.query::<&mut NdviSimulator>();
    for mut sim in query.iter_mut(world) {
        sim.set_condition(name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::EventBus;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[derive(Resource, Default)]
    struct Readings(Vec<NdviReading>);

    fn test_world() -> World {
        let mut world = World::new();
        world.init_resource::<EventBus>();
        world.init_resource::<SceneGraph>();
        world.init_resource::<Readings>();
        world.insert_resource(FarmRng::seeded(42));
        world
            .resource_mut::<EventBus>()
            .subscribe(EventKind::NdviUpdate, None, |w, event| {
                if let GameEvent::NdviUpdate(reading) = event {
                    w.resource_mut::<Readings>().0.push(reading.clone());
                }
                Ok(())
            });
        world
    }

    #[test]
    fn broadcasts_once_per_interval() {
        let mut world = test_world();
        let root = world.resource::<SceneGraph>().root();
        spawn_ndvi_simulator(&mut world, root, FieldCondition::Good);

        // 4 × 1000ms: not yet.
        for _ in 0..4 {
            scene::tick(&mut world, 1000.0);
        }
        assert!(world.resource::<Readings>().0.is_empty());

        scene::tick(&mut world, 1000.0);
        assert_eq!(world.resource::<Readings>().0.len(), 1);

        // Timer restarted from zero, so the next one needs a full interval.
        scene::tick(&mut world, 4999.0);
        assert_eq!(world.resource::<Readings>().0.len(), 1);
        scene::tick(&mut world, 1.0);
        assert_eq!(world.resource::<Readings>().0.len(), 2);

        let reading = &world.resource::<Readings>().0[0];
        assert_eq!(reading.position, Vec2::ZERO);
        assert_eq!(reading.condition, FieldCondition::Good);
        assert_eq!(reading.timestamp, 5000.0);
    }

    #[test]
    fn readings_stay_near_baseline() {
        let mut rng = StdRng::seed_from_u64(9);
        for condition in [
            FieldCondition::Optimal,
            FieldCondition::Good,
            FieldCondition::Stressed,
            FieldCondition::Poor,
        ] {
            let sim = NdviSimulator::new(condition);
            for _ in 0..200 {
                let value = sim.sample(&mut rng);
                assert!((0.0..=1.0).contains(&value));
                assert!(
                    (value - condition.baseline()).abs() <= NDVI_VARIATION + f32::EPSILON,
                    "{} reading {} too far from baseline",
                    condition,
                    value
                );
            }
        }
    }

    #[test]
    fn unknown_condition_is_ignored() {
        let mut sim = NdviSimulator::new(FieldCondition::Good);
        sim.set_condition("drought");
        assert_eq!(sim.condition(), FieldCondition::Good);
        sim.set_condition("");
        assert_eq!(sim.condition(), FieldCondition::Good);

        sim.set_condition("poor");
        assert_eq!(sim.condition(), FieldCondition::Poor);
    }

    #[test]
    fn condition_change_applies_to_live_simulators() {
        let mut world = test_world();
        let root = world.resource::<SceneGraph>().root();
        let sim = spawn_ndvi_simulator(&mut world, root, FieldCondition::Good);

        set_field_condition(&mut world, "stressed");
        assert_eq!(
            world.get::<NdviSimulator>(sim).map(|s| s.condition()),
            Some(FieldCondition::Stressed)
        );

        broadcast(&mut world, sim);
        let value = world.resource::<Readings>().0[0].value;
        assert!((value - 0.35).abs() <= NDVI_VARIATION + f32::EPSILON);
    }
}
