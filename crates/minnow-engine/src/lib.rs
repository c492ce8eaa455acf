//! Minnow engine -- tick loop, physics and rendering over the Minnow ECS.
//!
//! A [`World`](world::World) owns entity storage and two core systems:
//! an O(n²) pairwise collision [`PhysicsSystem`](physics::PhysicsSystem)
//! and a depth-ordered [`RenderSystem`](render::RenderSystem). User systems
//! and scripts hook into the tick loop around them; all structural mutation
//! is deferred through command queues so each tick is deterministic.
//!
//! # Quick Start
//!
//! ```
//! use minnow_engine::prelude::*;
//! use glam::Vec2;
//!
//! let mut world = World::new();
//! let ball = world.create_box_collider_object(16.0, 16.0);
//! if let Some(body) = world
//!     .entities_mut()
//!     .get_mut(ball)
//!     .map(|e| e.rigid_body.insert(RigidBody::with_velocity(Vec2::new(60.0, 0.0))))
//! {
//!     body.gravity_enabled = false;
//! }
//! world.construct_scene();
//!
//! let mut surface = NullSurface;
//! world.run(1.0 / 60.0, &mut surface);
//! assert_eq!(
//!     world.entities().get(ball).and_then(|e| e.position()),
//!     Some(Vec2::new(1.0, 0.0))
//! );
//! ```

#![deny(unsafe_code)]

pub mod physics;
pub mod render;
pub mod telemetry;
pub mod world;

pub use minnow_ecs;

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use minnow_ecs::prelude::*;

    pub use crate::physics::{
        CollisionPair, CollisionSide, PhysicsConfig, PhysicsSystem, DEFAULT_GRAVITY,
    };
    pub use crate::render::{NullSurface, RenderError, RenderSystem, Surface};
    pub use crate::world::{System, TickContext, World};
}

// ---------------------------------------------------------------------------
// Integration Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use crate::prelude::*;
    use glam::Vec2;

    /// A paddle-and-brick scenario: the ball bounces off a static brick,
    /// the brick's script despawns its owner, and the next tick draws one
    /// sprite fewer.
    #[test]
    fn ball_breaks_brick() {
        struct Brick;
        impl Script for Brick {
            fn script_name(&self) -> &str {
                "brick"
            }
            fn collision_event(
                &mut self,
                owner: &mut Entity,
                _other: &Collider,
                commands: &mut WorldCommands,
            ) {
                commands.despawn(owner.id());
            }
        }

        let mut world = World::new();

        let ball = world.create_game_object(ImageHandle::new(1, 16.0, 16.0));
        {
            let e = world.entities_mut().get_mut(ball).unwrap();
            if let Some(t) = e.transform.as_mut() {
                t.position = Vec2::new(0.0, 0.0);
            }
            e.rigid_body = Some(RigidBody::with_velocity(Vec2::new(0.0, -100.0)));
        }

        let brick = world.create_game_object(ImageHandle::new(2, 32.0, 16.0));
        {
            let e = world.entities_mut().get_mut(brick).unwrap();
            if let Some(t) = e.transform.as_mut() {
                t.position = Vec2::new(0.0, -14.0);
            }
            e.add_script(Box::new(Brick));
        }

        world.construct_scene();
        assert_eq!(world.render().scene_len(), 2);

        let mut surface = NullSurface;
        world.run(0.0, &mut surface);

        // The ball hit the brick's underside and reflected downward.
        assert_eq!(world.physics().collisions().len(), 1);
        assert_eq!(world.physics().collisions()[0].side, CollisionSide::Top);
        let velocity = world
            .entities()
            .get(ball)
            .and_then(|e| e.rigid_body.as_ref())
            .map(|b| b.velocity);
        assert_eq!(velocity, Some(Vec2::new(0.0, 100.0)));

        // The brick's script ran and the deferred despawn was applied.
        assert!(!world.entities().is_alive(brick));
        assert_eq!(world.render().scene_len(), 1);
    }

    #[test]
    fn paddle_state_machine_follows_input_flags() {
        use std::cell::Cell;
        use std::rc::Rc;

        let moving = Rc::new(Cell::new(false));

        let mut sm = StateMachine::new();
        sm.add_state("idle");
        sm.add_state("moving");
        sm.set_current("idle");
        let flag = moving.clone();
        sm.add_transition_from("idle", "moving", Transition::new().when(move || flag.get()));
        let flag = moving.clone();
        sm.add_transition_from("moving", "idle", Transition::new().when(move || !flag.get()));
        sm.validate().unwrap();

        sm.update();
        assert_eq!(sm.current_state(), Some("idle"));
        moving.set(true);
        sm.update();
        assert_eq!(sm.current_state(), Some("moving"));
        moving.set(false);
        sm.update();
        assert_eq!(sm.current_state(), Some("idle"));
    }

    #[test]
    fn gravity_config_is_per_world() {
        let mut world = World::new();
        world.physics_mut().config_mut().gravity = Vec2::new(0.0, 100.0);

        let ball = world.create_box_collider_object(8.0, 8.0);
        {
            let e = world.entities_mut().get_mut(ball).unwrap();
            let mut body = RigidBody::default();
            body.gravity_enabled = true;
            body.gravity_scale = 1.0;
            e.rigid_body = Some(body);
        }

        let mut surface = NullSurface;
        world.run(0.1, &mut surface);

        let velocity = world
            .entities()
            .get(ball)
            .and_then(|e| e.rigid_body.as_ref())
            .map(|b| b.velocity);
        assert_eq!(velocity, Some(Vec2::new(0.0, 10.0)));
    }
}
