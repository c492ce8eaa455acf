//! Entity manager: monotonic id assignment and the insertion-ordered live
//! set.
//!
//! Systems iterate the live set in insertion order, and that order is part
//! of the runtime's observable behavior (collision resolution is applied in
//! place as pairs are discovered). Removal is therefore deferred: a despawn
//! marks the entity and [`apply_removals`](EntityManager::apply_removals)
//! compacts the list between passes, so no collection is ever mutated under
//! iteration.

use tracing::debug;

use crate::entity::{Entity, EntityId};

// ---------------------------------------------------------------------------
// EntityManager
// ---------------------------------------------------------------------------

/// Creates, stores and destroys entities.
#[derive(Debug, Default)]
pub struct EntityManager {
    next_id: u64,
    entities: Vec<Entity>,
    pending_removals: Vec<EntityId>,
}

impl EntityManager {
    /// An empty manager. Ids start at 0 and are never recycled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a fresh entity and return a mutable handle to it.
    pub fn create(&mut self) -> &mut Entity {
        let id = EntityId::from_raw(self.next_id);
        self.next_id += 1;
        let idx = self.entities.len();
        self.entities.push(Entity::new(id));
        &mut self.entities[idx]
    }

    /// Mark an entity for removal at the end of the current pass.
    ///
    /// The entity stays live (and iterable) until
    /// [`apply_removals`](EntityManager::apply_removals) runs. Returns
    /// `false` if the id is unknown or already marked.
    pub fn despawn(&mut self, id: EntityId) -> bool {
        if !self.is_alive(id) || self.pending_removals.contains(&id) {
            return false;
        }
        self.pending_removals.push(id);
        true
    }

    /// True if a despawn has been requested but not yet applied.
    pub fn is_pending_removal(&self, id: EntityId) -> bool {
        self.pending_removals.contains(&id)
    }

    /// Apply all pending removals, preserving the order of survivors.
    ///
    /// Returns the ids that were removed.
    pub fn apply_removals(&mut self) -> Vec<EntityId> {
        if self.pending_removals.is_empty() {
            return Vec::new();
        }
        let pending = std::mem::take(&mut self.pending_removals);
        self.entities.retain(|e| !pending.contains(&e.id()));
        debug!(count = pending.len(), "applied deferred entity removals");
        pending
    }

    /// True if the id refers to a currently stored entity.
    pub fn is_alive(&self, id: EntityId) -> bool {
        self.entities.iter().any(|e| e.id() == id)
    }

    /// Shared handle to an entity by id.
    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.entities.iter().find(|e| e.id() == id)
    }

    /// Mutable handle to an entity by id.
    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.iter_mut().find(|e| e.id() == id)
    }

    /// Number of live entities (including those pending removal).
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// True if no entities are stored.
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Insertion-ordered iteration over live entities.
    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.entities.iter()
    }

    /// Mutable insertion-ordered iteration.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Entity> {
        self.entities.iter_mut()
    }

    /// The live set as a mutable slice, for pairwise split borrows.
    pub fn as_mut_slice(&mut self) -> &mut [Entity] {
        &mut self.entities
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
