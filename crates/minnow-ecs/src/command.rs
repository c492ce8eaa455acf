//! Deferred world mutations.
//!
//! Scripts and user systems run while the entity list (or the render
//! system's bookkeeping) is being iterated, so cross-entity effects are not
//! applied in place. They are queued in a [`WorldCommands`] buffer and
//! applied by the world at the end of the current pass, in FIFO order per
//! command kind. The two effects the runtime needs are entity destruction
//! and render-depth changes.

use crate::entity::EntityId;

// ---------------------------------------------------------------------------
// WorldCommands
// ---------------------------------------------------------------------------

/// Buffer of deferred cross-entity mutations.
#[derive(Debug, Default)]
pub struct WorldCommands {
    despawns: Vec<EntityId>,
    depth_changes: Vec<(EntityId, i32)>,
}

impl WorldCommands {
    /// An empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue destruction of an entity. Applied after the current pass.
    pub fn despawn(&mut self, entity: EntityId) {
        self.despawns.push(entity);
    }

    /// Queue a render-depth change for an entity already in the scene.
    pub fn set_depth(&mut self, entity: EntityId, depth: i32) {
        self.depth_changes.push((entity, depth));
    }

    /// True if no commands are queued.
    pub fn is_empty(&self) -> bool {
        self.despawns.is_empty() && self.depth_changes.is_empty()
    }

    /// Take all queued despawns, leaving the buffer empty.
    pub fn drain_despawns(&mut self) -> Vec<EntityId> {
        std::mem::take(&mut self.despawns)
    }

    /// Take all queued depth changes, leaving the buffer empty.
    pub fn drain_depth_changes(&mut self) -> Vec<(EntityId, i32)> {
        std::mem::take(&mut self.depth_changes)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
