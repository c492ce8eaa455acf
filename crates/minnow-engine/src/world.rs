//! The world: entity storage, system scheduling and the tick loop.
//!
//! A [`World`] owns the [`EntityManager`], the two core systems (physics
//! then render, in that fixed order), any number of user [`System`]s that
//! run before the core pair, and world-level scripts. One call to
//! [`run`](World::run) is one tick:
//!
//! 1. user systems, in registration order
//! 2. physics pass
//! 3. render pass
//! 4. entity scripts' `update`, in entity insertion order
//! 5. world scripts' `update`, in registration order
//! 6. deferred commands (depth changes, despawns) are applied
//!
//! Scripts and systems never mutate entity storage directly mid-tick; they
//! queue despawns and depth changes on [`WorldCommands`] and the world
//! applies them at the end of the tick, keeping iteration stable and the
//! render index consistent.

use tracing::{debug, error};

use minnow_ecs::command::WorldCommands;
use minnow_ecs::component::{Collider, ImageHandle, Renderer, Transform};
use minnow_ecs::entity::EntityId;
use minnow_ecs::manager::EntityManager;
use minnow_ecs::script::{InputEvent, WorldScript};

use crate::physics::PhysicsSystem;
use crate::render::{RenderSystem, Surface};

// ---------------------------------------------------------------------------
// System
// ---------------------------------------------------------------------------

/// Per-tick context handed to systems.
pub struct TickContext<'a> {
    /// Seconds elapsed since the previous tick.
    pub dt: f32,
    /// Draw target for this tick.
    pub surface: &'a mut dyn Surface,
}

/// A unit of per-tick work over the entity set.
pub trait System {
    /// Stable name, used in logs.
    fn name(&self) -> &str;

    /// Run one tick of this system.
    fn process(
        &mut self,
        entities: &mut EntityManager,
        ctx: &mut TickContext<'_>,
        commands: &mut WorldCommands,
    );
}

// ---------------------------------------------------------------------------
// World
// ---------------------------------------------------------------------------

/// Owns all runtime state and drives the tick loop.
#[derive(Default)]
pub struct World {
    entities: EntityManager,
    physics: PhysicsSystem,
    render: RenderSystem,
    systems: Vec<Box<dyn System>>,
    scripts: Vec<Box<dyn WorldScript>>,
    commands: WorldCommands,
}

impl World {
    /// An empty world with default physics configuration.
    pub fn new() -> Self {
        Self::default()
    }

    // -- accessors -----------------------------------------------------------

    /// The entity storage.
    pub fn entities(&self) -> &EntityManager {
        &self.entities
    }

    /// Mutable entity storage.
    pub fn entities_mut(&mut self) -> &mut EntityManager {
        &mut self.entities
    }

    /// The physics system.
    pub fn physics(&self) -> &PhysicsSystem {
        &self.physics
    }

    /// Mutable physics system (configuration, mostly).
    pub fn physics_mut(&mut self) -> &mut PhysicsSystem {
        &mut self.physics
    }

    /// The render system.
    pub fn render(&self) -> &RenderSystem {
        &self.render
    }

    /// Mutable render system.
    pub fn render_mut(&mut self) -> &mut RenderSystem {
        &mut self.render
    }

    // -- registration --------------------------------------------------------

    /// Register a user system. User systems run before physics and render,
    /// in registration order.
    pub fn add_system(&mut self, system: Box<dyn System>) {
        debug!(name = system.name(), "registered system");
        self.systems.push(system);
    }

    /// Register a world-level script.
    pub fn add_script(&mut self, script: Box<dyn WorldScript>) {
        debug!(name = script.script_name(), "registered world script");
        self.scripts.push(script);
    }

    /// Remove a world-level script by name. Returns `false` if absent.
    pub fn remove_script(&mut self, name: &str) -> bool {
        let before = self.scripts.len();
        self.scripts.retain(|s| s.script_name() != name);
        before != self.scripts.len()
    }

    // -- entity construction -------------------------------------------------

    /// Create a bare entity.
    pub fn create_entity(&mut self) -> EntityId {
        self.entities.create().id()
    }

    /// Create a sprite-bearing entity: origin transform, centered renderer
    /// and a box collider matching the image dimensions.
    pub fn create_game_object(&mut self, image: ImageHandle) -> EntityId {
        let e = self.entities.create();
        e.transform = Some(Transform::default());
        e.renderer = Some(Renderer::centered(image));
        e.collider = Some(Collider::boxed(image.width, image.height));
        e.id()
    }

    /// Create an invisible entity with a transform and a box collider.
    pub fn create_box_collider_object(&mut self, width: f32, height: f32) -> EntityId {
        let e = self.entities.create();
        e.transform = Some(Transform::default());
        e.collider = Some(Collider::boxed(width, height));
        e.id()
    }

    /// Queue an entity for removal at the end of the tick.
    pub fn destroy_entity(&mut self, id: EntityId) {
        self.commands.despawn(id);
    }

    // -- scene ---------------------------------------------------------------

    /// Rebuild the render scene index over the current entity set. Call
    /// after batch-creating entities at setup time.
    pub fn construct_scene(&mut self) {
        self.render.construct_scene(self.entities.iter());
    }

    /// Select the camera entity.
    pub fn set_camera(&mut self, camera: Option<EntityId>) {
        self.render.set_camera(camera);
    }

    // -- tick ----------------------------------------------------------------

    /// Advance the world by one tick of `dt` seconds, drawing to `surface`.
    pub fn run(&mut self, dt: f32, surface: &mut dyn Surface) {
        let mut ctx = TickContext { dt, surface };

        for system in &mut self.systems {
            system.process(&mut self.entities, &mut ctx, &mut self.commands);
        }

        self.physics.step(&mut self.entities, dt, &mut self.commands);
        self.render.render_scene(&self.entities, ctx.surface);

        for entity in self.entities.iter_mut() {
            if entity.script_count() == 0 {
                continue;
            }
            let commands = &mut self.commands;
            entity.dispatch_scripts(|s, owner| s.update(owner, dt, commands));
        }

        // World scripts may register or remove siblings, so run them off a
        // temporarily detached list.
        let mut scripts = std::mem::take(&mut self.scripts);
        for script in &mut scripts {
            script.update(dt, &mut self.commands);
        }
        scripts.append(&mut self.scripts);
        self.scripts = scripts;

        self.apply_commands();
    }

    /// Fan an input event out to world scripts, then to every entity's
    /// scripts in insertion order.
    pub fn take_input(&mut self, event: &InputEvent) {
        let mut scripts = std::mem::take(&mut self.scripts);
        for script in &mut scripts {
            script.take_input(event, &mut self.commands);
        }
        scripts.append(&mut self.scripts);
        self.scripts = scripts;

        for entity in self.entities.iter_mut() {
            if entity.script_count() == 0 {
                continue;
            }
            let commands = &mut self.commands;
            entity.dispatch_scripts(|s, owner| s.take_input(owner, event, commands));
        }

        self.apply_commands();
    }

    /// Apply queued commands immediately instead of waiting for the end of
    /// the next tick.
    pub fn flush(&mut self) {
        self.apply_commands();
    }

    fn apply_commands(&mut self) {
        for (id, depth) in self.commands.drain_depth_changes() {
            let Some(entity) = self.entities.get_mut(id) else {
                continue;
            };
            if let Err(err) = self.render.update_depth(entity, depth) {
                error!(entity = %id, %err, "deferred depth change failed");
            }
        }

        let despawns = self.commands.drain_despawns();
        for id in despawns {
            if let Some(entity) = self.entities.get(id) {
                self.render.remove_from_scene(entity);
            }
            self.entities.despawn(id);
        }
        self.entities.apply_removals();
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
