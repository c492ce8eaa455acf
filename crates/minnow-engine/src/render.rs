//! Depth-ordered scene rendering.
//!
//! The [`RenderSystem`] keeps a depth-bucketed scene index: a map from depth
//! key to the insertion-ordered list of entity ids at that depth, plus a
//! descending list of the occupied depth keys. Drawing walks depths from
//! highest to lowest so lower depth values land on top (painter's order,
//! back to front).
//!
//! The index stores ids, not entity data; [`render_scene`]
//! (RenderSystem::render_scene) resolves each id against the live set at
//! draw time and silently skips ids that have since despawned. Depth
//! changes go through [`update_depth`](RenderSystem::update_depth) so the
//! bucket structure stays consistent with each renderer's depth field.

use std::collections::HashMap;

use glam::Vec2;
use tracing::warn;

use minnow_ecs::command::WorldCommands;
use minnow_ecs::component::ImageHandle;
use minnow_ecs::entity::{Entity, EntityId};
use minnow_ecs::manager::EntityManager;

use crate::world::{System, TickContext};

/// System name used in logs.
pub const RENDER_SYSTEM_NAME: &str = "render";

// ---------------------------------------------------------------------------
// Surface
// ---------------------------------------------------------------------------

/// Something sprites can be drawn onto.
///
/// The runtime never talks to a real display; hosts implement this for
/// whatever backend they have, and tests record blits.
pub trait Surface {
    /// Draw an image with its top-left corner at `position`.
    fn blit(&mut self, image: &ImageHandle, position: Vec2);

    /// Surface dimensions in pixels.
    fn size(&self) -> Vec2;
}

/// A surface that discards all draws. Useful for headless ticking.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSurface;

impl Surface for NullSurface {
    fn blit(&mut self, _image: &ImageHandle, _position: Vec2) {}

    fn size(&self) -> Vec2 {
        Vec2::ZERO
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Scene-index inconsistencies surfaced by depth updates.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// The entity has a renderer but is missing from its depth bucket.
    #[error("entity {entity} not present in scene at depth {depth}")]
    NotInScene {
        /// The entity whose bucket entry is missing.
        entity: EntityId,
        /// The depth its renderer claims.
        depth: i32,
    },
}

// ---------------------------------------------------------------------------
// RenderSystem
// ---------------------------------------------------------------------------

/// Depth-bucketed scene index and draw pass.
#[derive(Debug, Default)]
pub struct RenderSystem {
    /// Depth key to ids at that depth, each bucket in insertion order.
    layers: HashMap<i32, Vec<EntityId>>,
    /// Occupied depth keys, kept descending.
    ordered_depths: Vec<i32>,
    camera: Option<EntityId>,
}

impl RenderSystem {
    /// An empty scene.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild the scene index from scratch over the given entities.
    ///
    /// Entities without a renderer are ignored. Bucket order follows the
    /// iteration order of `entities`.
    pub fn construct_scene<'a>(&mut self, entities: impl Iterator<Item = &'a Entity>) {
        self.layers.clear();
        self.ordered_depths.clear();
        for entity in entities {
            if let Some(renderer) = entity.renderer.as_ref() {
                self.layers
                    .entry(renderer.depth)
                    .or_default()
                    .push(entity.id());
            }
        }
        self.ordered_depths.extend(self.layers.keys().copied());
        self.ordered_depths.sort_unstable();
        self.ordered_depths.reverse();
    }

    /// Insert a single entity into the existing scene index.
    ///
    /// Appends to its depth bucket when one exists, otherwise creates the
    /// bucket and splices the depth key into the descending key list.
    /// Entities without a renderer are ignored.
    pub fn dynamic_insertion(&mut self, entity: &Entity) {
        let Some(renderer) = entity.renderer.as_ref() else {
            return;
        };
        let depth = renderer.depth;
        match self.layers.get_mut(&depth) {
            Some(bucket) => bucket.push(entity.id()),
            None => {
                self.layers.insert(depth, vec![entity.id()]);
                let at = self
                    .ordered_depths
                    .iter()
                    .position(|&d| d < depth)
                    .unwrap_or(self.ordered_depths.len());
                self.ordered_depths.insert(at, depth);
            }
        }
    }

    /// Move an entity to a new depth, updating its renderer and the index.
    ///
    /// No-op for entities without a renderer. Setting the current depth
    /// again is allowed (the entity moves to the back of its own bucket).
    pub fn update_depth(&mut self, entity: &mut Entity, depth: i32) -> Result<(), RenderError> {
        let id = entity.id();
        let Some(renderer) = entity.renderer.as_mut() else {
            return Ok(());
        };
        let old_depth = renderer.depth;

        let Some(bucket) = self.layers.get_mut(&old_depth) else {
            return Err(RenderError::NotInScene {
                entity: id,
                depth: old_depth,
            });
        };
        let Some(at) = bucket.iter().position(|&e| e == id) else {
            return Err(RenderError::NotInScene {
                entity: id,
                depth: old_depth,
            });
        };
        bucket.remove(at);
        if bucket.is_empty() {
            self.layers.remove(&old_depth);
            self.ordered_depths.retain(|&d| d != old_depth);
        }

        renderer.depth = depth;
        self.dynamic_insertion(entity);
        Ok(())
    }

    /// Drop an entity from the scene index. No-op if absent or without a
    /// renderer.
    pub fn remove_from_scene(&mut self, entity: &Entity) {
        let Some(renderer) = entity.renderer.as_ref() else {
            return;
        };
        let id = entity.id();
        if let Some(bucket) = self.layers.get_mut(&renderer.depth) {
            bucket.retain(|&e| e != id);
            if bucket.is_empty() {
                self.layers.remove(&renderer.depth);
                self.ordered_depths.retain(|&d| d != renderer.depth);
            }
        }
    }

    /// Use the given entity's position as the camera origin.
    pub fn set_camera(&mut self, camera: Option<EntityId>) {
        self.camera = camera;
    }

    /// Current camera entity, if any.
    pub fn camera(&self) -> Option<EntityId> {
        self.camera
    }

    /// Number of entities currently indexed.
    pub fn scene_len(&self) -> usize {
        self.layers.values().map(Vec::len).sum()
    }

    /// Ids at a given depth, in draw order.
    pub fn layer(&self, depth: i32) -> &[EntityId] {
        self.layers.get(&depth).map_or(&[], Vec::as_slice)
    }

    /// Draw the scene back to front.
    ///
    /// Each sprite is drawn at `position - pivot - camera_offset`. Stale ids
    /// (despawned since indexing) are skipped; indexed entities missing a
    /// transform are skipped with a warning.
    pub fn render_scene(&self, entities: &EntityManager, surface: &mut dyn Surface) {
        let camera_offset = self
            .camera
            .and_then(|id| entities.get(id))
            .and_then(|e| e.position())
            .unwrap_or(Vec2::ZERO);

        for depth in &self.ordered_depths {
            let Some(bucket) = self.layers.get(depth) else {
                continue;
            };
            for &id in bucket {
                let Some(entity) = entities.get(id) else {
                    continue;
                };
                let Some(renderer) = entity.renderer.as_ref() else {
                    continue;
                };
                let Some(transform) = entity.transform.as_ref() else {
                    warn!(entity = %id, "skipping renderable without a transform");
                    continue;
                };
                let position = transform.position - renderer.pivot - camera_offset;
                surface.blit(&renderer.sprite, position);
            }
        }
    }
}

impl System for RenderSystem {
    fn name(&self) -> &str {
        RENDER_SYSTEM_NAME
    }

    fn process(
        &mut self,
        entities: &mut EntityManager,
        ctx: &mut TickContext<'_>,
        _commands: &mut WorldCommands,
    ) {
        self.render_scene(entities, ctx.surface);
    }
}

// ---------------------------------------------------------------------------
// Test support
// ---------------------------------------------------------------------------

#[cfg(test)]
pub(crate) mod testing {
    use super::*;

    /// A surface that records every blit for assertions.
    #[derive(Debug, Default)]
    pub struct RecordingSurface {
        pub blits: Vec<(u64, Vec2)>,
    }

    impl Surface for RecordingSurface {
        fn blit(&mut self, image: &ImageHandle, position: Vec2) {
            self.blits.push((image.id, position));
        }

        fn size(&self) -> Vec2 {
            Vec2::new(800.0, 600.0)
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::testing::RecordingSurface;
    use super::*;
    use minnow_ecs::component::{Renderer, Transform};

    fn spawn_sprite(
        entities: &mut EntityManager,
        image_id: u64,
        position: Vec2,
        depth: i32,
    ) -> EntityId {
        let e = entities.create();
        e.transform = Some(Transform::at(position));
        let mut renderer = Renderer::new(ImageHandle::new(image_id, 16.0, 16.0));
        renderer.depth = depth;
        e.renderer = Some(renderer);
        e.id()
    }

    #[test]
    fn draws_highest_depth_first() {
        let mut entities = EntityManager::new();
        spawn_sprite(&mut entities, 1, Vec2::ZERO, 5);
        spawn_sprite(&mut entities, 2, Vec2::ZERO, -3);
        spawn_sprite(&mut entities, 3, Vec2::ZERO, 0);
        spawn_sprite(&mut entities, 4, Vec2::ZERO, 5);

        let mut render = RenderSystem::new();
        render.construct_scene(entities.iter());

        let mut surface = RecordingSurface::default();
        render.render_scene(&entities, &mut surface);

        let order: Vec<u64> = surface.blits.iter().map(|(id, _)| *id).collect();
        // Depth 5 first (insertion order inside the bucket), then 0, then -3.
        assert_eq!(order, vec![1, 4, 3, 2]);
    }

    #[test]
    fn dynamic_insertion_keeps_depth_keys_descending() {
        let mut entities = EntityManager::new();
        let ids = [
            spawn_sprite(&mut entities, 1, Vec2::ZERO, 0),
            spawn_sprite(&mut entities, 2, Vec2::ZERO, 7),
            spawn_sprite(&mut entities, 3, Vec2::ZERO, -2),
            spawn_sprite(&mut entities, 4, Vec2::ZERO, 3),
        ];

        let mut render = RenderSystem::new();
        for id in ids {
            render.dynamic_insertion(entities.get(id).unwrap());
        }

        let mut surface = RecordingSurface::default();
        render.render_scene(&entities, &mut surface);
        let order: Vec<u64> = surface.blits.iter().map(|(id, _)| *id).collect();
        assert_eq!(order, vec![2, 4, 1, 3]);
    }

    #[test]
    fn update_depth_moves_between_buckets() {
        let mut entities = EntityManager::new();
        let a = spawn_sprite(&mut entities, 1, Vec2::ZERO, 0);
        let b = spawn_sprite(&mut entities, 2, Vec2::ZERO, 0);

        let mut render = RenderSystem::new();
        render.construct_scene(entities.iter());

        render
            .update_depth(entities.get_mut(a).unwrap(), 10)
            .unwrap();

        assert_eq!(render.layer(10), &[a]);
        assert_eq!(render.layer(0), &[b]);
        assert_eq!(
            entities.get(a).unwrap().renderer.as_ref().unwrap().depth,
            10
        );

        let mut surface = RecordingSurface::default();
        render.render_scene(&entities, &mut surface);
        let order: Vec<u64> = surface.blits.iter().map(|(id, _)| *id).collect();
        assert_eq!(order, vec![1, 2]);
    }

    #[test]
    fn update_depth_same_depth_is_allowed() {
        let mut entities = EntityManager::new();
        let a = spawn_sprite(&mut entities, 1, Vec2::ZERO, 4);

        let mut render = RenderSystem::new();
        render.construct_scene(entities.iter());
        render.update_depth(entities.get_mut(a).unwrap(), 4).unwrap();
        assert_eq!(render.layer(4), &[a]);
        assert_eq!(render.scene_len(), 1);
    }

    #[test]
    fn repeated_same_depth_update_settles_bucket_order() {
        let mut entities = EntityManager::new();
        let a = spawn_sprite(&mut entities, 1, Vec2::ZERO, 4);
        let b = spawn_sprite(&mut entities, 2, Vec2::ZERO, 4);

        let mut render = RenderSystem::new();
        render.construct_scene(entities.iter());

        // Re-bucketing at the current depth moves the entity to the back of
        // its bucket; doing it again must not perturb the order further.
        render.update_depth(entities.get_mut(a).unwrap(), 4).unwrap();
        let after_one = render.layer(4).to_vec();
        assert_eq!(after_one, vec![b, a]);

        render.update_depth(entities.get_mut(a).unwrap(), 4).unwrap();
        assert_eq!(render.layer(4), after_one.as_slice());
        assert_eq!(render.scene_len(), 2);

        let mut surface = RecordingSurface::default();
        render.render_scene(&entities, &mut surface);
        let order: Vec<u64> = surface.blits.iter().map(|(id, _)| *id).collect();
        assert_eq!(order, vec![2, 1]);
    }

    #[test]
    fn update_depth_outside_scene_is_an_error() {
        let mut entities = EntityManager::new();
        let a = spawn_sprite(&mut entities, 1, Vec2::ZERO, 0);

        let mut render = RenderSystem::new();
        let err = render
            .update_depth(entities.get_mut(a).unwrap(), 5)
            .unwrap_err();
        assert!(matches!(err, RenderError::NotInScene { .. }));
    }

    #[test]
    fn remove_from_scene_drops_empty_buckets() {
        let mut entities = EntityManager::new();
        let a = spawn_sprite(&mut entities, 1, Vec2::ZERO, 2);

        let mut render = RenderSystem::new();
        render.construct_scene(entities.iter());
        assert_eq!(render.scene_len(), 1);

        render.remove_from_scene(entities.get(a).unwrap());
        assert_eq!(render.scene_len(), 0);
        assert_eq!(render.layer(2), &[] as &[EntityId]);
    }

    #[test]
    fn camera_offset_shifts_every_blit() {
        let mut entities = EntityManager::new();
        spawn_sprite(&mut entities, 1, Vec2::new(100.0, 50.0), 0);
        let camera = {
            let e = entities.create();
            e.transform = Some(Transform::at(Vec2::new(30.0, 20.0)));
            e.id()
        };

        let mut render = RenderSystem::new();
        render.construct_scene(entities.iter());
        render.set_camera(Some(camera));

        let mut surface = RecordingSurface::default();
        render.render_scene(&entities, &mut surface);
        assert_eq!(surface.blits, vec![(1, Vec2::new(70.0, 30.0))]);
    }

    #[test]
    fn pivot_offsets_the_draw_position() {
        let mut entities = EntityManager::new();
        {
            let e = entities.create();
            e.transform = Some(Transform::at(Vec2::new(100.0, 100.0)));
            e.renderer = Some(Renderer::centered(ImageHandle::new(9, 32.0, 16.0)));
        }

        let mut render = RenderSystem::new();
        render.construct_scene(entities.iter());

        let mut surface = RecordingSurface::default();
        render.render_scene(&entities, &mut surface);
        assert_eq!(surface.blits, vec![(9, Vec2::new(84.0, 92.0))]);
    }

    #[test]
    fn draws_the_current_sprite_not_the_source_image() {
        let mut entities = EntityManager::new();
        {
            let e = entities.create();
            e.transform = Some(Transform::default());
            let mut renderer = Renderer::new(ImageHandle::new(1, 16.0, 16.0));
            // Re-skin: the sprite diverges from the source image.
            renderer.sprite = ImageHandle::new(2, 16.0, 16.0);
            e.renderer = Some(renderer);
        }

        let mut render = RenderSystem::new();
        render.construct_scene(entities.iter());

        let mut surface = RecordingSurface::default();
        render.render_scene(&entities, &mut surface);
        let drawn: Vec<u64> = surface.blits.iter().map(|(id, _)| *id).collect();
        assert_eq!(drawn, vec![2]);
    }

    #[test]
    fn stale_ids_are_skipped_at_draw_time() {
        let mut entities = EntityManager::new();
        let a = spawn_sprite(&mut entities, 1, Vec2::ZERO, 0);
        spawn_sprite(&mut entities, 2, Vec2::ZERO, 0);

        let mut render = RenderSystem::new();
        render.construct_scene(entities.iter());

        entities.despawn(a);
        entities.apply_removals();

        let mut surface = RecordingSurface::default();
        render.render_scene(&entities, &mut surface);
        let order: Vec<u64> = surface.blits.iter().map(|(id, _)| *id).collect();
        assert_eq!(order, vec![2]);
    }

    #[test]
    fn renderable_without_transform_is_skipped() {
        let mut entities = EntityManager::new();
        {
            let e = entities.create();
            e.renderer = Some(Renderer::new(ImageHandle::new(1, 8.0, 8.0)));
        }

        let mut render = RenderSystem::new();
        render.construct_scene(entities.iter());

        let mut surface = RecordingSurface::default();
        render.render_scene(&entities, &mut surface);
        assert!(surface.blits.is_empty());
    }
}
