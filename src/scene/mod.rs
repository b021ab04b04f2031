//! Scene graph: entity lifecycle and the per-frame tick.
//!
//! Entities live in the Bevy `World` arena and are addressed by `Entity`
//! handles. Ownership is the Bevy hierarchy: a node's `Children` list is the
//! ordered set of nodes it owns, `Parent` is the non-owning back-reference.
//!
//! Every gameplay entity carries a `SceneNode`:
//!
//! ```text
//! Constructed ──attached under the root──▶ Active (ready hook once, step hook every frame)
//!                                 │
//!                              destroy ──▶ gone (subscriptions dropped, despawned)
//! ```
//!
//! A node attached under a parent that is not yet active stays `Constructed`.
//! When that parent is attached under the root, the whole subtree becomes
//! active, parents before children, siblings in attachment order.

use bevy::prelude::*;
use std::fmt;

use crate::bus::EventBus;
use crate::shared::*;

/// Runs once, right after the node becomes reachable from the root.
pub type ReadyHook = fn(&mut World, Entity);
/// Runs every frame while the node is active. Delta is in milliseconds.
pub type StepHook = fn(&mut World, Entity, f32);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    Constructed,
    Active,
    Destroyed,
}

#[derive(Component, Clone)]
pub struct SceneNode {
    pub position: Vec2,
    state: Lifecycle,
    on_ready: Option<ReadyHook>,
    on_step: Option<StepHook>,
}

impl SceneNode {
    pub fn new(position: Vec2) -> Self {
        Self {
            position,
            state: Lifecycle::Constructed,
            on_ready: None,
            on_step: None,
        }
    }

    pub fn with_ready(mut self, hook: ReadyHook) -> Self {
        self.on_ready = Some(hook);
        self
    }

    pub fn with_step(mut self, hook: StepHook) -> Self {
        self.on_step = Some(hook);
        self
    }

    pub fn state(&self) -> Lifecycle {
        self.state
    }
}

impl fmt::Debug for SceneNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SceneNode")
            .field("position", &self.position)
            .field("state", &self.state)
            .field("has_ready", &self.on_ready.is_some())
            .field("has_step", &self.on_step.is_some())
            .finish()
    }
}

/// Root of the entity tree plus the scene clock.
#[derive(Resource, Debug)]
pub struct SceneGraph {
    root: Entity,
    elapsed_ms: f64,
    frames: u64,
    halted: bool,
}

impl FromWorld for SceneGraph {
    fn from_world(world: &mut World) -> Self {
        let mut node = SceneNode::new(Vec2::ZERO);
        node.state = Lifecycle::Active;
        let root = world.spawn((Name::new("SceneRoot"), node)).id();
        Self {
            root,
            elapsed_ms: 0.0,
            frames: 0,
            halted: false,
        }
    }
}

impl SceneGraph {
    pub fn root(&self) -> Entity {
        self.root
    }

    /// Simulated milliseconds accumulated by `tick`.
    pub fn elapsed_ms(&self) -> f64 {
        self.elapsed_ms
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn is_halted(&self) -> bool {
        self.halted
    }

    /// Stop stepping entities. Used once the campaign reaches a terminal state.
    pub fn halt(&mut self) {
        self.halted = true;
    }

    pub fn resume(&mut self) {
        self.halted = false;
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Lifecycle operations
// ─────────────────────────────────────────────────────────────────────────────

/// Lifecycle of `entity`; anything without a live `SceneNode` counts as destroyed.
pub fn lifecycle(world: &World, entity: Entity) -> Lifecycle {
    world
        .get::<SceneNode>(entity)
        .map_or(Lifecycle::Destroyed, |node| node.state)
}

pub fn position(world: &World, entity: Entity) -> Option<Vec2> {
    world.get::<SceneNode>(entity).map(|node| node.position)
}

/// Attach `child` under `parent`. If the parent is active, the child's subtree
/// is activated and each node's ready hook fires once.
///
/// Re-parenting an already active node moves it without firing ready again.
pub fn add_child(world: &mut World, parent: Entity, child: Entity) {
    let parent_state = lifecycle(world, parent);
    if parent_state == Lifecycle::Destroyed || lifecycle(world, child) == Lifecycle::Destroyed {
        warn!("[Scene] Cannot attach {:?} under {:?}: one of them is gone", child, parent);
        return;
    }

    world.entity_mut(parent).add_child(child);

    if parent_state == Lifecycle::Active {
        activate(world, child);
    }
}

fn activate(world: &mut World, entity: Entity) {
    let Some(ready) = world.get_mut::<SceneNode>(entity).and_then(|mut node| {
        (node.state == Lifecycle::Constructed).then(|| {
            node.state = Lifecycle::Active;
            node.on_ready
        })
    }) else {
        // Already active (its subtree with it) or not a scene node.
        return;
    };
    if let Some(hook) = ready {
        hook(world, entity);
    }

    // Snapshot: ready hooks may attach or destroy children.
    let children: Vec<Entity> = world
        .get::<Children>(entity)
        .map(|children| children.iter().copied().collect())
        .unwrap_or_default();
    for child in children {
        if lifecycle(world, entity) != Lifecycle::Active {
            return;
        }
        activate(world, child);
    }
}

/// Spawn `bundle` and attach it under `parent` in one step.
pub fn spawn_child(world: &mut World, parent: Entity, bundle: impl Bundle) -> Entity {
    let child = world.spawn(bundle).id();
    add_child(world, parent, child);
    child
}

/// Destroy `entity` and its subtree: drop their bus subscriptions, detach from
/// the parent, despawn. Returns false if it was already gone.
pub fn destroy(world: &mut World, entity: Entity) -> bool {
    if lifecycle(world, entity) == Lifecycle::Destroyed {
        return false;
    }

    let doomed = subtree(world, entity);
    for &node in &doomed {
        if let Some(mut scene_node) = world.get_mut::<SceneNode>(node) {
            scene_node.state = Lifecycle::Destroyed;
        }
    }
    if let Some(mut bus) = world.get_resource_mut::<EventBus>() {
        for &node in &doomed {
            bus.unsubscribe_all(node);
        }
    }

    world.entity_mut(entity).despawn_recursive();
    true
}

fn subtree(world: &World, entity: Entity) -> Vec<Entity> {
    let mut out = vec![entity];
    let mut cursor = 0;
    while cursor < out.len() {
        if let Some(children) = world.get::<Children>(out[cursor]) {
            out.extend(children.iter().copied());
        }
        cursor += 1;
    }
    out
}

// ─────────────────────────────────────────────────────────────────────────────
// Frame tick
// ─────────────────────────────────────────────────────────────────────────────

/// Advance the whole scene by `delta_ms`: every active node runs its step hook,
/// parents before children, siblings in attachment order.
pub fn tick(world: &mut World, delta_ms: f32) {
    let root = {
        let Some(mut scene) = world.get_resource_mut::<SceneGraph>() else {
            return;
        };
        if scene.halted {
            return;
        }
        scene.elapsed_ms += delta_ms as f64;
        scene.frames += 1;
        scene.root
    };
    step_node(world, root, delta_ms);
}

fn step_node(world: &mut World, entity: Entity, delta_ms: f32) {
    if world.resource::<SceneGraph>().halted {
        return;
    }
    let Some((state, on_step)) = world
        .get::<SceneNode>(entity)
        .map(|node| (node.state, node.on_step))
    else {
        return;
    };
    if state != Lifecycle::Active {
        return;
    }
    if let Some(step) = on_step {
        step(world, entity, delta_ms);
    }

    // Snapshot: steps may spawn or destroy siblings.
    let children: Vec<Entity> = world
        .get::<Children>(entity)
        .map(|children| children.iter().copied().collect())
        .unwrap_or_default();
    for child in children {
        step_node(world, child, delta_ms);
    }
}

/// Destroy every child of the root, leaving an empty scene.
pub fn clear(world: &mut World) {
    let root = world.resource::<SceneGraph>().root;
    let children: Vec<Entity> = world
        .get::<Children>(root)
        .map(|children| children.iter().copied().collect())
        .unwrap_or_default();
    for child in children {
        destroy(world, child);
    }
}

/// Game-loop driver: converts Bevy's frame time to milliseconds and ticks the scene.
fn drive_scene(world: &mut World) {
    let delta_ms = world.resource::<Time>().delta_secs() * 1000.0;
    tick(world, delta_ms);
}

pub struct ScenePlugin;

impl Plugin for ScenePlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<EventBus>()
            .init_resource::<SceneGraph>()
            .add_systems(Update, drive_scene.run_if(in_state(GameState::Playing)));
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Resource, Default)]
    struct Trace(Vec<(&'static str, Entity)>);

    fn test_world() -> World {
        let mut world = World::new();
        world.init_resource::<EventBus>();
        world.init_resource::<SceneGraph>();
        world.init_resource::<Trace>();
        world
    }

    fn log_ready(world: &mut World, entity: Entity) {
        world.resource_mut::<Trace>().0.push(("ready", entity));
    }

    fn log_step(world: &mut World, entity: Entity, _delta: f32) {
        world.resource_mut::<Trace>().0.push(("step", entity));
    }

    fn self_destruct(world: &mut World, entity: Entity, _delta: f32) {
        world.resource_mut::<Trace>().0.push(("step", entity));
        destroy(world, entity);
    }

    fn node() -> SceneNode {
        SceneNode::new(Vec2::ZERO).with_ready(log_ready).with_step(log_step)
    }

    fn steps(world: &World) -> Vec<Entity> {
        world
            .resource::<Trace>()
            .0
            .iter()
            .filter(|(tag, _)| *tag == "step")
            .map(|(_, e)| *e)
            .collect()
    }

    #[test]
    fn ready_fires_once_on_attach() {
        let mut world = test_world();
        let root = world.resource::<SceneGraph>().root();
        let group = spawn_child(&mut world, root, SceneNode::new(Vec2::ZERO));
        let child = world.spawn(node()).id();

        assert_eq!(lifecycle(&world, child), Lifecycle::Constructed);
        add_child(&mut world, root, child);
        assert_eq!(lifecycle(&world, child), Lifecycle::Active);

        // Moving it under another parent does not re-fire ready.
        add_child(&mut world, group, child);

        let readies = world
            .resource::<Trace>()
            .0
            .iter()
            .filter(|(tag, _)| *tag == "ready")
            .count();
        assert_eq!(readies, 1);
        assert_eq!(world.get::<Parent>(child).map(|p| p.get()), Some(group));
        let root_children = world.get::<Children>(root).map(|c| c.to_vec()).unwrap_or_default();
        assert!(!root_children.contains(&child), "child appears under one parent only");
    }

    #[test]
    fn detached_subtree_readies_when_attached_to_root() {
        let mut world = test_world();
        let root = world.resource::<SceneGraph>().root();
        let group = world.spawn(node()).id();
        let first = world.spawn(node()).id();
        let second = world.spawn(node()).id();
        let nested = world.spawn(node()).id();

        add_child(&mut world, group, first);
        add_child(&mut world, first, nested);
        add_child(&mut world, group, second);
        assert!(world.resource::<Trace>().0.is_empty(), "nothing is reachable yet");
        assert_eq!(lifecycle(&world, first), Lifecycle::Constructed);

        tick(&mut world, 16.0);
        assert!(steps(&world).is_empty());

        add_child(&mut world, root, group);

        let readies: Vec<Entity> = world
            .resource::<Trace>()
            .0
            .iter()
            .filter(|(tag, _)| *tag == "ready")
            .map(|(_, e)| *e)
            .collect();
        assert_eq!(readies, vec![group, first, nested, second]);
        for entity in [group, first, nested, second] {
            assert_eq!(lifecycle(&world, entity), Lifecycle::Active);
        }

        tick(&mut world, 16.0);
        assert_eq!(steps(&world), vec![group, first, nested, second]);
    }

    #[test]
    fn tick_steps_depth_first_in_attachment_order() {
        let mut world = test_world();
        let root = world.resource::<SceneGraph>().root();
        let a = spawn_child(&mut world, root, node());
        let a1 = spawn_child(&mut world, a, node());
        let b = spawn_child(&mut world, root, node());
        let a2 = spawn_child(&mut world, a, node());

        tick(&mut world, 16.0);

        assert_eq!(steps(&world), vec![a, a1, a2, b]);
        assert_eq!(world.resource::<SceneGraph>().frames(), 1);
        assert_eq!(world.resource::<SceneGraph>().elapsed_ms(), 16.0);
    }

    #[test]
    fn unattached_nodes_are_not_stepped() {
        let mut world = test_world();
        let loose = world.spawn(node()).id();
        tick(&mut world, 16.0);
        assert!(!steps(&world).contains(&loose));
    }

    #[test]
    fn destroy_detaches_and_drops_subscriptions() {
        let mut world = test_world();
        let root = world.resource::<SceneGraph>().root();
        let parent = spawn_child(&mut world, root, node());
        let child = spawn_child(&mut world, parent, node());
        {
            let mut bus = world.resource_mut::<EventBus>();
            bus.subscribe(EventKind::HeroPosition, Some(parent), |_, _| Ok(()));
            bus.subscribe(EventKind::NdviUpdate, Some(child), |_, _| Ok(()));
        }

        assert!(destroy(&mut world, parent));

        assert_eq!(lifecycle(&world, parent), Lifecycle::Destroyed);
        assert_eq!(lifecycle(&world, child), Lifecycle::Destroyed);
        assert!(world.get::<Children>(root).map_or(true, |c| !c.contains(&parent)));
        let bus = world.resource::<EventBus>();
        assert_eq!(bus.owned_by(parent), 0);
        assert_eq!(bus.owned_by(child), 0);

        // Second destroy is a no-op.
        assert!(!destroy(&mut world, parent));
    }

    #[test]
    fn node_destroyed_mid_frame_is_not_stepped_again() {
        let mut world = test_world();
        let root = world.resource::<SceneGraph>().root();
        let first = spawn_child(
            &mut world,
            root,
            SceneNode::new(Vec2::ZERO).with_step(self_destruct),
        );
        let second = spawn_child(&mut world, root, node());

        tick(&mut world, 16.0);
        tick(&mut world, 16.0);

        assert_eq!(steps(&world), vec![first, second, second]);
    }

    #[test]
    fn halted_scene_does_not_step() {
        let mut world = test_world();
        let root = world.resource::<SceneGraph>().root();
        spawn_child(&mut world, root, node());

        world.resource_mut::<SceneGraph>().halt();
        tick(&mut world, 16.0);
        assert!(steps(&world).is_empty());
        assert_eq!(world.resource::<SceneGraph>().frames(), 0);

        world.resource_mut::<SceneGraph>().resume();
        tick(&mut world, 16.0);
        assert_eq!(steps(&world).len(), 1);
    }

    #[test]
    fn clear_empties_the_root() {
        let mut world = test_world();
        let root = world.resource::<SceneGraph>().root();
        let a = spawn_child(&mut world, root, node());
        let b = spawn_child(&mut world, root, node());

        clear(&mut world);

        assert_eq!(lifecycle(&world, a), Lifecycle::Destroyed);
        assert_eq!(lifecycle(&world, b), Lifecycle::Destroyed);
        assert_eq!(lifecycle(&world, root), Lifecycle::Active);
    }
}
