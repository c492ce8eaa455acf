//! Small geometry helpers shared by the physics and render systems.
//!
//! The only type here is [`Aabb`], an axis-aligned bounding box stored as
//! min/max corners in screen coordinates (+y down). Colliders are defined in
//! entity-local space and translated into one of these every time they are
//! tested, so the box is deliberately cheap to build.

use glam::Vec2;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Aabb
// ---------------------------------------------------------------------------

/// An axis-aligned bounding box in world space.
///
/// `min` is the top-left corner and `max` the bottom-right corner (screen
/// coordinates, +y down).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    /// Top-left corner.
    pub min: Vec2,
    /// Bottom-right corner.
    pub max: Vec2,
}

impl Aabb {
    /// Build a box of the given `size` centered on `center`.
    pub fn from_center_size(center: Vec2, size: Vec2) -> Self {
        let half = 0.5 * size;
        Self {
            min: center - half,
            max: center + half,
        }
    }

    /// Width along the x-axis.
    #[inline]
    pub fn width(&self) -> f32 {
        self.max.x - self.min.x
    }

    /// Height along the y-axis.
    #[inline]
    pub fn height(&self) -> f32 {
        self.max.y - self.min.y
    }

    /// Full extents as a vector.
    #[inline]
    pub fn size(&self) -> Vec2 {
        self.max - self.min
    }

    /// Center of the box.
    #[inline]
    pub fn center(&self) -> Vec2 {
        0.5 * (self.min + self.max)
    }

    /// Strict interval-overlap test.
    ///
    /// Boxes that merely share an edge do not overlap, so a resolved pair
    /// that ends exactly touching is not re-detected on the next test.
    pub fn overlaps(&self, other: &Aabb) -> bool {
        self.min.x < other.max.x
            && self.max.x > other.min.x
            && self.min.y < other.max.y
            && self.max.y > other.min.y
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
