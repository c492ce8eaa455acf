//! Pairwise collision detection, resolution and motion integration.
//!
//! The [`PhysicsSystem`] runs one O(n²) pass per tick over the entity
//! manager's live set, in insertion order. For every ordered pair (A, B)
//! where A carries {Transform, Collider, RigidBody} and B carries
//! {Transform, Collider}:
//!
//! 1. Both colliders' world boxes are recomputed from the current transform
//!    positions (never cached; positions mutate mid-tick).
//! 2. Overlapping pairs are classified to one of four sides via the
//!    Minkowski-sum heuristic and, unless a trigger is involved, velocities
//!    are reflected on the detected axis and the penetration is resolved.
//! 3. The contact is recorded and `collision_event` is dispatched to both
//!    participants' scripts.
//!
//! After A's inner loop completes, A integrates once with semi-implicit
//! Euler. Responses are applied in place as pairs are discovered, so pairs
//! tested later in the pass observe already-corrected state; that ordering
//! dependency is part of the observable behavior.
//!
//! # Determinism
//!
//! The pass is free of randomness and iteration order is the manager's
//! insertion order, so identical initial state and `dt` produce bit-identical
//! results.

use glam::Vec2;
use serde::{Deserialize, Serialize};
use tracing::trace;

use minnow_ecs::command::WorldCommands;
use minnow_ecs::entity::{Entity, EntityId};
use minnow_ecs::manager::EntityManager;
use minnow_ecs::math::Aabb;

use crate::world::{System, TickContext};

/// System name used in logs.
pub const PHYSICS_SYSTEM_NAME: &str = "physics";

/// Default world gravity in units/s², screen coordinates (+y down).
pub const DEFAULT_GRAVITY: Vec2 = Vec2::new(0.0, 500.0);

// ---------------------------------------------------------------------------
// PhysicsConfig
// ---------------------------------------------------------------------------

/// Tunable physics parameters, carried by the system instance rather than
/// shared process-wide state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhysicsConfig {
    /// World gravity vector applied to gravity-enabled bodies.
    pub gravity: Vec2,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: DEFAULT_GRAVITY,
        }
    }
}

// ---------------------------------------------------------------------------
// CollisionSide / CollisionPair
// ---------------------------------------------------------------------------

/// Which side of A was hit, relative to A.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CollisionSide {
    /// Vertical collision, B above A.
    Top,
    /// Vertical collision, B below A.
    Bottom,
    /// Horizontal collision, B left of A.
    Left,
    /// Horizontal collision, B right of A.
    Right,
}

impl CollisionSide {
    /// True for Top/Bottom.
    pub fn is_vertical(self) -> bool {
        matches!(self, CollisionSide::Top | CollisionSide::Bottom)
    }
}

/// A collision detected between two entities during one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollisionPair {
    /// The entity whose pass detected the collision (always rigid).
    pub a: EntityId,
    /// The other participant.
    pub b: EntityId,
    /// Side of `a` that was hit.
    pub side: CollisionSide,
}

// ---------------------------------------------------------------------------
// Side classification
// ---------------------------------------------------------------------------

/// Classify the collision side from the participants' positions and the
/// full extents of their collider boxes, using the Minkowski-sum heuristic.
///
/// The operand order differs between axes (`dx` is B-minus-A, `dy` is
/// A-minus-B); the quadrant mapping depends on it. Together with the
/// comparison directions below this always yields exactly one side, even
/// for coincident centers (`wy == hx == 0` classifies Bottom).
pub fn collision_side(pos_a: Vec2, pos_b: Vec2, extents_a: Vec2, extents_b: Vec2) -> CollisionSide {
    let width = 0.5 * (extents_a.x + extents_b.x);
    let height = 0.5 * (extents_a.y + extents_b.y);

    let dx = pos_b.x - pos_a.x;
    let dy = pos_a.y - pos_b.y;

    let wy = width * dy;
    let hx = height * dx;

    if wy > hx {
        if wy > -hx {
            CollisionSide::Top
        } else {
            CollisionSide::Left
        }
    } else if wy > -hx {
        CollisionSide::Right
    } else {
        CollisionSide::Bottom
    }
}

// ---------------------------------------------------------------------------
// PhysicsSystem
// ---------------------------------------------------------------------------

/// The per-tick pairwise collision and motion pass.
#[derive(Debug, Default)]
pub struct PhysicsSystem {
    config: PhysicsConfig,
    /// Collisions detected during the most recent pass.
    collisions: Vec<CollisionPair>,
}

impl PhysicsSystem {
    /// A system with default configuration (gravity `(0, 500)`).
    pub fn new() -> Self {
        Self::default()
    }

    /// A system with explicit configuration.
    pub fn with_config(config: PhysicsConfig) -> Self {
        Self {
            config,
            collisions: Vec::new(),
        }
    }

    /// Current configuration.
    pub fn config(&self) -> &PhysicsConfig {
        &self.config
    }

    /// Mutable configuration access.
    pub fn config_mut(&mut self) -> &mut PhysicsConfig {
        &mut self.config
    }

    /// Collisions recorded by the most recent [`step`](PhysicsSystem::step).
    pub fn collisions(&self) -> &[CollisionPair] {
        &self.collisions
    }

    /// Run one physics pass over the live entity set.
    ///
    /// Entities missing a Transform are skipped silently. Trigger overlaps
    /// are detected and scripted but receive no reflection or separation.
    pub fn step(&mut self, entities: &mut EntityManager, dt: f32, commands: &mut WorldCommands) {
        self.collisions.clear();

        let slice = entities.as_mut_slice();
        let count = slice.len();

        for i in 0..count {
            {
                let a = &slice[i];
                if a.transform.is_none() || a.collider.is_none() || a.rigid_body.is_none() {
                    continue;
                }
            }

            for j in 0..count {
                if j == i {
                    continue;
                }
                let (a, b) = pair_mut(slice, i, j);
                if b.transform.is_none() || b.collider.is_none() {
                    continue;
                }

                // World boxes are rebuilt for every test; positions may have
                // changed since the previous pair.
                let (Some(box_a), Some(box_b)) = (a.world_collider_aabb(), b.world_collider_aabb())
                else {
                    continue;
                };
                if !box_a.overlaps(&box_b) {
                    continue;
                }
                let (Some(pos_a), Some(pos_b)) = (a.position(), b.position()) else {
                    continue;
                };

                let side = collision_side(pos_a, pos_b, box_a.size(), box_b.size());
                let trigger = a.collider.as_ref().is_some_and(|c| c.is_trigger)
                    || b.collider.as_ref().is_some_and(|c| c.is_trigger);

                if !trigger {
                    resolve(a, b, side, &box_a, &box_b);
                }

                let pair = CollisionPair {
                    a: a.id(),
                    b: b.id(),
                    side,
                };
                trace!(a = %pair.a, b = %pair.b, ?side, trigger, "collision");
                self.collisions.push(pair);

                // Each participant's scripts see the other's collider.
                let collider_b = b.collider.clone();
                if let Some(other) = collider_b.as_ref() {
                    a.dispatch_scripts(|s, owner| s.collision_event(owner, other, commands));
                }
                let collider_a = a.collider.clone();
                if let Some(other) = collider_a.as_ref() {
                    b.dispatch_scripts(|s, owner| s.collision_event(owner, other, commands));
                }
            }

            // One integration per entity per tick, after all of its
            // collision responses.
            integrate(&mut slice[i], dt, self.config.gravity);
        }
    }
}

impl System for PhysicsSystem {
    fn name(&self) -> &str {
        PHYSICS_SYSTEM_NAME
    }

    fn process(
        &mut self,
        entities: &mut EntityManager,
        ctx: &mut TickContext<'_>,
        commands: &mut WorldCommands,
    ) {
        self.step(entities, ctx.dt, commands);
    }
}

// ---------------------------------------------------------------------------
// Pass internals
// ---------------------------------------------------------------------------

/// Disjoint mutable borrows of two distinct slice elements.
fn pair_mut(slice: &mut [Entity], i: usize, j: usize) -> (&mut Entity, &mut Entity) {
    debug_assert_ne!(i, j);
    if i < j {
        let (left, right) = slice.split_at_mut(j);
        (&mut left[i], &mut right[0])
    } else {
        let (left, right) = slice.split_at_mut(i);
        (&mut right[0], &mut left[j])
    }
}

/// Reflect velocities and separate the pair along the detected axis.
///
/// Each participant's velocity is scaled by the *other* collider's
/// restitution, with the component on the detected axis negated; a bouncy
/// wall imparts bounce to a soft ball and vice versa. Penetration is split
/// half/half when both carry a rigid body, otherwise A takes the full delta.
/// Mass is deliberately not a weighting factor.
fn resolve(a: &mut Entity, b: &mut Entity, side: CollisionSide, box_a: &Aabb, box_b: &Aabb) {
    let restitution_a = a.collider.as_ref().map_or(1.0, |c| c.restitution);
    let restitution_b = b.collider.as_ref().map_or(1.0, |c| c.restitution);

    let (x_change, y_change) = if side.is_vertical() {
        (1.0, -1.0)
    } else {
        (-1.0, 1.0)
    };

    if let Some(body) = a.rigid_body.as_mut() {
        body.velocity.x *= x_change * restitution_b;
        body.velocity.y *= y_change * restitution_b;
    }

    let b_is_rigid = b.rigid_body.is_some();
    if let Some(body) = b.rigid_body.as_mut() {
        body.velocity.x *= x_change * restitution_a;
        body.velocity.y *= y_change * restitution_a;
    }

    // Penetration depth along the detected axis, and the direction that
    // pushes A out of B.
    let (delta, direction) = match side {
        CollisionSide::Top => (box_b.max.y - box_a.min.y, Vec2::new(0.0, 1.0)),
        CollisionSide::Bottom => (box_a.max.y - box_b.min.y, Vec2::new(0.0, -1.0)),
        CollisionSide::Left => (box_b.max.x - box_a.min.x, Vec2::new(1.0, 0.0)),
        CollisionSide::Right => (box_a.max.x - box_b.min.x, Vec2::new(-1.0, 0.0)),
    };

    if b_is_rigid {
        let half = 0.5 * delta;
        if let Some(t) = a.transform.as_mut() {
            t.position += half * direction;
        }
        if let Some(t) = b.transform.as_mut() {
            t.position -= half * direction;
        }
    } else if let Some(t) = a.transform.as_mut() {
        t.position += delta * direction;
    }
}

/// Semi-implicit Euler: gravity into velocity first, then velocity into
/// position.
fn integrate(entity: &mut Entity, dt: f32, gravity: Vec2) {
    if let (Some(transform), Some(body)) = (entity.transform.as_mut(), entity.rigid_body.as_mut())
    {
        if body.gravity_enabled {
            body.velocity += dt * body.gravity_scale * gravity;
        }
        transform.position += dt * body.velocity;
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
