//! Behavior scripts and input events.
//!
//! Scripts are the polymorphic hook of the runtime: named trait objects with
//! default no-op methods, owned either by one entity ([`Script`]) or by the
//! world itself ([`WorldScript`]). The scheduler invokes `update` once per
//! tick, the physics system invokes `collision_event` once per detected
//! collision per participant, and `take_input` fans out from the world's
//! input entry point.
//!
//! Scripts mutate their owning entity directly; anything that reaches across
//! entities (despawning, depth changes) goes through the
//! [`WorldCommands`](crate::command::WorldCommands) buffer and is applied
//! after the current pass.

use serde::{Deserialize, Serialize};

use crate::command::WorldCommands;
use crate::component::Collider;
use crate::entity::Entity;

// ---------------------------------------------------------------------------
// InputEvent
// ---------------------------------------------------------------------------

/// A discrete input event produced by the (out-of-scope) input source.
///
/// The core defines no schema beyond a kind label and an opaque payload; the
/// event is passed through to scripts unmodified.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputEvent {
    /// Event kind label, e.g. `"key_down"` or `"mouse_moved"`.
    pub kind: String,
    /// Opaque payload.
    #[serde(default)]
    pub data: serde_json::Value,
}

impl InputEvent {
    /// An event of the given kind with no payload.
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            data: serde_json::Value::Null,
        }
    }

    /// Attach a payload.
    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = data;
        self
    }
}

// ---------------------------------------------------------------------------
// Script
// ---------------------------------------------------------------------------

/// Per-entity behavior hook.
///
/// All methods default to no-ops; implementors override the ones they need.
/// Two scripts with the same [`script_name`](Script::script_name) compare
/// equal for removal purposes.
pub trait Script {
    /// Name used for equality and removal.
    fn script_name(&self) -> &str;

    /// Called for every input event dispatched to the owning entity.
    fn take_input(&mut self, _owner: &mut Entity, _event: &InputEvent, _commands: &mut WorldCommands) {}

    /// Called once per tick, after all systems have processed.
    fn update(&mut self, _owner: &mut Entity, _dt: f32, _commands: &mut WorldCommands) {}

    /// Called by the physics system when the owning entity's collider
    /// overlaps another; `other` is the other participant's collider.
    fn collision_event(&mut self, _owner: &mut Entity, _other: &Collider, _commands: &mut WorldCommands) {}
}

// ---------------------------------------------------------------------------
// WorldScript
// ---------------------------------------------------------------------------

/// World-scoped behavior hook; like [`Script`] but with no owning entity.
pub trait WorldScript {
    /// Name used for equality and removal.
    fn script_name(&self) -> &str;

    /// Called first for every input event entering the world.
    fn take_input(&mut self, _event: &InputEvent, _commands: &mut WorldCommands) {}

    /// Called once per tick, after all entity scripts have updated.
    fn update(&mut self, _dt: f32, _commands: &mut WorldCommands) {}
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
