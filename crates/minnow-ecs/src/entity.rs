//! Entity identity and the capability-slot entity.
//!
//! An [`EntityId`] is an opaque `u64` assigned monotonically by the
//! [`EntityManager`](crate::manager::EntityManager); ids are never recycled,
//! so a held id stays unique for the manager's lifetime.
//!
//! [`Entity`] stores the closed capability set (Transform, RigidBody,
//! Collider, Renderer, Input) in explicit `Option` slots rather than a
//! type-scanned bag: at most one of each is active, and writing a slot
//! overwrites the previous value. Arbitrary further components live in a
//! generic tag-indexed list, and behavior scripts in an ordered list.

use std::fmt;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::component::{Collider, Component, Input, Renderer, RigidBody, Transform};
use crate::math::Aabb;
use crate::script::Script;

// ---------------------------------------------------------------------------
// EntityId
// ---------------------------------------------------------------------------

/// An opaque entity identifier, unique for the managed lifetime.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(u64);

impl EntityId {
    /// Raw `u64` representation.
    #[inline]
    pub fn to_raw(self) -> u64 {
        self.0
    }

    /// Reconstruct from a raw `u64`.
    #[inline]
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Debug for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityId({})", self.0)
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Entity
// ---------------------------------------------------------------------------

/// An identity plus its attached components and scripts.
///
/// The `tag` is a category label (e.g. `"player"`, `"wall"`) and is not
/// guaranteed unique; `name` is free-form and defaults to empty. Two
/// entities are equal iff their ids match.
pub struct Entity {
    id: EntityId,
    /// Category label, not unique.
    pub tag: String,
    /// Free-form name.
    pub name: String,
    /// Position/rotation/scale slot.
    pub transform: Option<Transform>,
    /// Velocity/mass/gravity slot.
    pub rigid_body: Option<RigidBody>,
    /// Collision capability slot.
    pub collider: Option<Collider>,
    /// Drawable capability slot.
    pub renderer: Option<Renderer>,
    /// Input-receiving marker slot.
    pub input: Option<Input>,
    extras: Vec<Box<dyn Component>>,
    scripts: Vec<Box<dyn Script>>,
}

impl Entity {
    /// A bare entity with the given id and no components.
    pub fn new(id: EntityId) -> Self {
        Self {
            id,
            tag: String::new(),
            name: String::new(),
            transform: None,
            rigid_body: None,
            collider: None,
            renderer: None,
            input: None,
            extras: Vec::new(),
            scripts: Vec::new(),
        }
    }

    /// This entity's id.
    #[inline]
    pub fn id(&self) -> EntityId {
        self.id
    }

    // -- generic components -------------------------------------------------

    /// Attach an arbitrary component to the generic list.
    ///
    /// The closed capability set has dedicated slots; this list is for
    /// everything else. Duplicate tags are allowed; lookups return the
    /// first match.
    pub fn add_component(&mut self, component: Box<dyn Component>) {
        self.extras.push(component);
    }

    /// First generic component with the given tag, or `None`.
    pub fn get_component(&self, tag: &str) -> Option<&dyn Component> {
        self.extras.iter().find(|c| c.tag() == tag).map(|c| c.as_ref())
    }

    /// Mutable variant of [`get_component`](Entity::get_component).
    pub fn get_component_mut(&mut self, tag: &str) -> Option<&mut (dyn Component + 'static)> {
        self.extras
            .iter_mut()
            .find(|c| c.tag() == tag)
            .map(|c| c.as_mut())
    }

    /// First generic component with the given tag, downcast to `T`.
    pub fn component_as<T: Component>(&self, tag: &str) -> Option<&T> {
        self.get_component(tag).and_then(|c| c.as_any().downcast_ref())
    }

    /// Remove the first generic component with the given tag.
    ///
    /// Returns `true` if one was removed. Capability slots are cleared by
    /// assigning `None` to the slot directly.
    pub fn remove_component(&mut self, tag: &str) -> bool {
        match self.extras.iter().position(|c| c.tag() == tag) {
            Some(idx) => {
                self.extras.remove(idx);
                true
            }
            None => false,
        }
    }

    // -- scripts ------------------------------------------------------------

    /// Attach a behavior script. Scripts run in attachment order.
    pub fn add_script(&mut self, script: Box<dyn Script>) {
        self.scripts.push(script);
    }

    /// Remove the first script whose name matches. Returns `true` if one
    /// was removed.
    pub fn remove_script(&mut self, name: &str) -> bool {
        match self.scripts.iter().position(|s| s.script_name() == name) {
            Some(idx) => {
                self.scripts.remove(idx);
                true
            }
            None => false,
        }
    }

    /// True if a script with the given name is attached.
    pub fn has_script(&self, name: &str) -> bool {
        self.scripts.iter().any(|s| s.script_name() == name)
    }

    /// Number of attached scripts.
    pub fn script_count(&self) -> usize {
        self.scripts.len()
    }

    /// Invoke `f` for each attached script in attachment order, passing a
    /// mutable borrow of this entity alongside the script.
    ///
    /// The script list is moved out for the duration of the call so the
    /// entity can be borrowed mutably; scripts attached during dispatch are
    /// appended after the existing ones and are not visited this pass.
    pub fn dispatch_scripts(&mut self, mut f: impl FnMut(&mut dyn Script, &mut Entity)) {
        let mut scripts = std::mem::take(&mut self.scripts);
        for script in &mut scripts {
            f(script.as_mut(), self);
        }
        // Keep any scripts added during dispatch, after the originals.
        scripts.append(&mut self.scripts);
        self.scripts = scripts;
    }

    // -- spatial helpers ----------------------------------------------------

    /// World-space collider box centered on this entity's transform, or
    /// `None` if either capability is missing.
    pub fn world_collider_aabb(&self) -> Option<Aabb> {
        let transform = self.transform.as_ref()?;
        let collider = self.collider.as_ref()?;
        Some(collider.world_aabb(transform.position))
    }

    /// Convenience accessor for the transform's position.
    pub fn position(&self) -> Option<Vec2> {
        self.transform.as_ref().map(|t| t.position)
    }
}

impl PartialEq for Entity {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Entity {}

impl fmt::Debug for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entity")
            .field("id", &self.id)
            .field("tag", &self.tag)
            .field("name", &self.name)
            .field("transform", &self.transform)
            .field("rigid_body", &self.rigid_body)
            .field("collider", &self.collider)
            .field("renderer", &self.renderer)
            .field("input", &self.input)
            .field("extras", &self.extras.len())
            .field("scripts", &self.scripts.len())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
