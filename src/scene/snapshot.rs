//! Serialisable view of the scene tree.
//!
//! Used by the demo binary to dump the final state as JSON and by tests to
//! compare trees without reaching into scene internals.

use serde::Serialize;

use crate::components::bounds::Bounds;
use crate::components::component::ComponentId;
use crate::math::Vec2;
use crate::scene::{EntityId, EntityState, Scene};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntitySnapshot {
    pub tag: String,
    pub state: EntityState,
    pub enabled: bool,
    /// World position as of the last transform refresh.
    pub position: Vec2,
    /// World rotation in degrees.
    pub rotation: f32,
    pub scale: Vec2,
    pub global_bounds: Bounds,
    /// Component IDs in storage order.
    pub components: Vec<ComponentId>,
    pub children: Vec<EntitySnapshot>,
}

impl EntitySnapshot {
    /// Number of entities in this subtree, self included.
    pub fn count(&self) -> usize {
        1 + self.children.iter().map(EntitySnapshot::count).sum::<usize>()
    }
}

impl Scene {
    /// Snapshot of every root subtree, in root order.
    pub fn snapshot(&self) -> Vec<EntitySnapshot> {
        self.roots.iter().filter_map(|r| self.snapshot_of(*r)).collect()
    }

    /// Snapshot of the subtree under `id`; `None` for unknown or disposed ids.
    pub fn snapshot_of(&self, id: EntityId) -> Option<EntitySnapshot> {
        let entity = self.entities.get(id).filter(|e| !e.disposed)?;
        let t = &entity.transform;
        Some(EntitySnapshot {
            tag: entity.tag.clone(),
            state: entity.state(),
            enabled: entity.enabled,
            position: t.position(),
            rotation: t.rotation(),
            scale: t.scale(),
            global_bounds: entity.global_bounds,
            components: entity
                .components
                .iter()
                .filter_map(|k| self.components.get(*k).map(|c| c.id()))
                .collect(),
            children: t
                .children()
                .iter()
                .filter_map(|c| self.snapshot_of(*c))
                .collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::component::{Component, SHAPE_ID};

    #[test]
    fn test_snapshot_tree_shape() {
        let mut scene = Scene::new();
        let root = scene.create_entity("root");
        let child = scene.create_entity("child");
        scene.add_child(root, child).unwrap();
        scene.add_component(child, Component::shape(Default::default())).unwrap();
        scene.transform_mut(root).unwrap().set_local_position(Vec2::new(2.0, 3.0));
        scene.refresh_transforms();

        let snap = scene.snapshot();
        assert_eq!(snap.len(), 1);
        assert_eq!(snap[0].count(), 2);
        assert_eq!(snap[0].position, Vec2::new(2.0, 3.0));
        assert_eq!(snap[0].children[0].components, vec![SHAPE_ID]);
        assert_eq!(snap[0].children[0].state, EntityState::Created);
    }

    #[test]
    fn test_snapshot_serialises() {
        let mut scene = Scene::new();
        scene.create_entity("solo");
        let json = serde_json::to_string(&scene.snapshot()).unwrap();
        assert!(json.contains("\"tag\":\"solo\""));
    }
}
