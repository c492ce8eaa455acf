//! Plain-data components and the generic component trait.
//!
//! The closed capability set (Transform, RigidBody, Collider, Renderer,
//! Input) is stored in explicit slots on [`Entity`](crate::entity::Entity);
//! anything else implements [`Component`] and lives in the entity's generic
//! component list, looked up by string tag with first-match-wins semantics.

use std::any::Any;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::math::Aabb;

// ---------------------------------------------------------------------------
// Component trait
// ---------------------------------------------------------------------------

/// An arbitrary data component attached to an entity.
///
/// Implementors outside the closed capability set are kept in the entity's
/// generic list and retrieved by [`tag`](Component::tag). Tags are not
/// required to be unique; lookups return the first match.
pub trait Component: Any {
    /// Tag string used for lookup and removal.
    fn tag(&self) -> &str;

    /// Upcast for downcasting to the concrete type.
    fn as_any(&self) -> &dyn Any;

    /// Mutable upcast for downcasting to the concrete type.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

// ---------------------------------------------------------------------------
// Transform
// ---------------------------------------------------------------------------

/// Position, rotation and scale of an entity.
///
/// Rotation is in degrees and is currently ignored by the physics system.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    /// World-space position, screen coordinates (+y down).
    pub position: Vec2,
    /// Rotation in degrees.
    pub rotation: f32,
    /// Non-uniform scale.
    pub scale: Vec2,
}

impl Transform {
    /// A transform positioned at `position` with no rotation and unit scale.
    pub fn at(position: Vec2) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec2::ZERO,
            rotation: 0.0,
            scale: Vec2::ONE,
        }
    }
}

// ---------------------------------------------------------------------------
// ImageHandle
// ---------------------------------------------------------------------------

/// Opaque handle to an image owned by the (out-of-scope) asset provider.
///
/// The core never decodes pixels; it reads the dimensions for pivots and
/// collider defaults and hands the handle back to the display surface when
/// drawing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ImageHandle {
    /// Provider-assigned identifier.
    pub id: u64,
    /// Image width in world units.
    pub width: f32,
    /// Image height in world units.
    pub height: f32,
}

impl ImageHandle {
    /// Construct a handle with the given id and dimensions.
    pub fn new(id: u64, width: f32, height: f32) -> Self {
        Self { id, width, height }
    }

    /// Dimensions as a vector.
    #[inline]
    pub fn size(&self) -> Vec2 {
        Vec2::new(self.width, self.height)
    }
}

// ---------------------------------------------------------------------------
// Renderer
// ---------------------------------------------------------------------------

/// Drawable component: a source image, the sprite currently shown (identical
/// until re-skinned), a pivot offset and an integer depth.
///
/// Lower depth values draw last (foreground); larger values draw first
/// (background). Change depth through the render system so its buckets stay
/// consistent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Renderer {
    /// Original source image.
    pub image: ImageHandle,
    /// Image currently drawn. Starts identical to `image`.
    pub sprite: ImageHandle,
    /// Image-local point aligned to the transform's position.
    pub pivot: Vec2,
    /// Integer draw-order key. Default 0.
    pub depth: i32,
}

impl Renderer {
    /// Renderer drawing `image` from its top-left corner.
    pub fn new(image: ImageHandle) -> Self {
        Self {
            image,
            sprite: image,
            pivot: Vec2::ZERO,
            depth: 0,
        }
    }

    /// Renderer drawing `image` centered on the transform's position.
    pub fn centered(image: ImageHandle) -> Self {
        Self {
            pivot: 0.5 * image.size(),
            ..Self::new(image)
        }
    }
}

// ---------------------------------------------------------------------------
// RigidBody
// ---------------------------------------------------------------------------

/// Velocity, mass and gravity settings for a physically simulated entity.
///
/// Mass is stored but not currently used as a weighting factor in collision
/// resolution; presence or absence of the body is what matters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RigidBody {
    /// Linear velocity in units per second.
    pub velocity: Vec2,
    /// Positive mass. Default 1.0.
    pub mass: f32,
    /// Multiplier applied to the world gravity vector.
    pub gravity_scale: f32,
    /// Whether gravity is integrated for this body.
    pub gravity_enabled: bool,
}

impl RigidBody {
    /// A body with the given initial velocity and default mass/gravity.
    pub fn with_velocity(velocity: Vec2) -> Self {
        Self {
            velocity,
            ..Self::default()
        }
    }
}

impl Default for RigidBody {
    fn default() -> Self {
        Self {
            velocity: Vec2::ZERO,
            mass: 1.0,
            gravity_scale: 0.0,
            gravity_enabled: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Collider
// ---------------------------------------------------------------------------

/// Collider shape in entity-local space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ColliderShape {
    /// Axis-aligned box with full width/height.
    Box {
        /// Full width along the x-axis.
        width: f32,
        /// Full height along the y-axis.
        height: f32,
    },
    /// Circle with radius. Tested through its enclosing 2r x 2r box.
    Circle {
        /// Radius of the circle.
        radius: f32,
    },
}

/// Collision capability of an entity.
///
/// The spatial shape is local to the entity and translated to world space
/// (centered on the transform's position) before every pairwise test; the
/// world-space box is never cached because positions mutate mid-tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Collider {
    /// Local-space shape.
    pub shape: ColliderShape,
    /// Advisory dynamic friction coefficient, not enforced in resolution.
    pub dynamic_friction: f32,
    /// Advisory static friction coefficient, not enforced in resolution.
    pub static_friction: f32,
    /// Bounce elasticity: 0 inelastic, 1 fully elastic. Default 1.0.
    pub restitution: f32,
    /// Triggers report overlap events but receive no velocity or positional
    /// resolution.
    pub is_trigger: bool,
}

impl Collider {
    /// A box collider of the given full width and height.
    pub fn boxed(width: f32, height: f32) -> Self {
        Self {
            shape: ColliderShape::Box { width, height },
            dynamic_friction: 0.0,
            static_friction: 0.0,
            restitution: 1.0,
            is_trigger: false,
        }
    }

    /// A circle collider of the given radius.
    pub fn circle(radius: f32) -> Self {
        Self {
            shape: ColliderShape::Circle { radius },
            ..Self::boxed(0.0, 0.0)
        }
    }

    /// Full extents of the shape's enclosing box.
    pub fn extents(&self) -> Vec2 {
        match self.shape {
            ColliderShape::Box { width, height } => Vec2::new(width, height),
            ColliderShape::Circle { radius } => Vec2::splat(2.0 * radius),
        }
    }

    /// World-space box centered on the given transform position.
    pub fn world_aabb(&self, center: Vec2) -> Aabb {
        Aabb::from_center_size(center, self.extents())
    }
}

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// Marker component flagging an entity as input-receiving.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Input;

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
