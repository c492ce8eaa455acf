//! Minnow ECS -- capability-slot entity/component model with behavior scripts.
//!
//! This crate is the data core of the Minnow runtime. An [`Entity`]
//! (`entity::Entity`) carries the closed capability set (Transform,
//! RigidBody, Collider, Renderer, Input) in explicit optional slots, a
//! generic tag-indexed list for arbitrary components, and an ordered list of
//! behavior [`Script`](script::Script)s. The
//! [`EntityManager`](manager::EntityManager) assigns monotonic ids and
//! guarantees insertion-ordered iteration with deferred removal. A
//! condition-guarded [`StateMachine`](state_machine::StateMachine) rides
//! along for tick-driven state progression.
//!
//! # Quick Start
//!
//! ```
//! use minnow_ecs::prelude::*;
//! use glam::Vec2;
//!
//! let mut entities = EntityManager::new();
//! let id = {
//!     let ball = entities.create();
//!     ball.tag = "ball".to_owned();
//!     ball.transform = Some(Transform::at(Vec2::new(100.0, 40.0)));
//!     ball.rigid_body = Some(RigidBody::with_velocity(Vec2::new(0.0, 120.0)));
//!     ball.collider = Some(Collider::boxed(16.0, 16.0));
//!     ball.id()
//! };
//!
//! assert!(entities.is_alive(id));
//! assert_eq!(entities.get(id).and_then(|e| e.position()), Some(Vec2::new(100.0, 40.0)));
//! ```

#![deny(unsafe_code)]

pub mod command;
pub mod component;
pub mod entity;
pub mod manager;
pub mod math;
pub mod script;
pub mod state_machine;

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::command::WorldCommands;
    pub use crate::component::{
        Collider, ColliderShape, Component, ImageHandle, Input, Renderer, RigidBody, Transform,
    };
    pub use crate::entity::{Entity, EntityId};
    pub use crate::manager::EntityManager;
    pub use crate::math::Aabb;
    pub use crate::script::{InputEvent, Script, WorldScript};
    pub use crate::state_machine::{StateMachine, StateMachineError, Transition};
}

// ---------------------------------------------------------------------------
// Integration Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use crate::prelude::*;
    use glam::Vec2;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn game_object_style_entity_setup() {
        let mut entities = EntityManager::new();
        let image = ImageHandle::new(7, 32.0, 32.0);

        let id = {
            let e = entities.create();
            e.tag = "player".to_owned();
            e.transform = Some(Transform::default());
            e.renderer = Some(Renderer::centered(image));
            e.collider = Some(Collider::boxed(image.width, image.height));
            e.input = Some(Input);
            e.id()
        };

        let e = entities.get(id).unwrap();
        assert_eq!(e.tag, "player");
        assert!(e.renderer.is_some());
        assert!(e.rigid_body.is_none());
        assert_eq!(
            e.world_collider_aabb().map(|b| b.size()),
            Some(Vec2::new(32.0, 32.0))
        );
    }

    #[test]
    fn scripts_drive_deferred_despawn_through_commands() {
        struct SelfDestruct;
        impl Script for SelfDestruct {
            fn script_name(&self) -> &str {
                "self_destruct"
            }
            fn update(&mut self, owner: &mut Entity, _dt: f32, commands: &mut WorldCommands) {
                commands.despawn(owner.id());
            }
        }

        let mut entities = EntityManager::new();
        let id = {
            let e = entities.create();
            e.add_script(Box::new(SelfDestruct));
            e.id()
        };

        let mut commands = WorldCommands::new();
        for e in entities.iter_mut() {
            e.dispatch_scripts(|s, owner| s.update(owner, 1.0 / 60.0, &mut commands));
        }

        // Nothing is removed until the world applies commands between passes.
        assert!(entities.is_alive(id));
        for victim in commands.drain_despawns() {
            entities.despawn(victim);
        }
        entities.apply_removals();
        assert!(!entities.is_alive(id));
    }

    #[test]
    fn input_fan_out_reaches_entity_scripts_in_order() {
        struct Listener(&'static str, Rc<RefCell<Vec<String>>>);
        impl Script for Listener {
            fn script_name(&self) -> &str {
                self.0
            }
            fn take_input(
                &mut self,
                _owner: &mut Entity,
                event: &InputEvent,
                _commands: &mut WorldCommands,
            ) {
                self.1.borrow_mut().push(format!("{}:{}", self.0, event.kind));
            }
        }

        let log = Rc::new(RefCell::new(Vec::new()));
        let mut entities = EntityManager::new();
        {
            let e = entities.create();
            e.add_script(Box::new(Listener("a", log.clone())));
        }
        {
            let e = entities.create();
            e.add_script(Box::new(Listener("b", log.clone())));
        }

        let event = InputEvent::new("key_down");
        let mut commands = WorldCommands::new();
        for e in entities.iter_mut() {
            e.dispatch_scripts(|s, owner| s.take_input(owner, &event, &mut commands));
        }

        assert_eq!(*log.borrow(), vec!["a:key_down", "b:key_down"]);
    }
}
