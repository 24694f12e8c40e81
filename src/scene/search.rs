//! Component-by-ID and tag queries.
//!
//! Each entity keeps its component handles sorted by component ID, so the
//! matches for one ID form a contiguous run found by binary search. An ID
//! outside an entity's `[first, last]` range skips that entity's list
//! without searching; its children are still visited by the `*_in_children`
//! variants.

use std::ops::Range;

use crate::components::component::ComponentId;
use crate::error::Result;
use crate::scene::{ComponentKey, Entity, EntityId, Scene};

impl Scene {
    fn id_of(&self, key: ComponentKey) -> Option<ComponentId> {
        self.components.get(key).map(|c| c.id())
    }

    /// Index range of `component_id` in the entity's sorted list.
    fn id_range(&self, entity: &Entity, component_id: ComponentId) -> Range<usize> {
        let list = &entity.components;
        let (Some(first), Some(last)) = (
            list.first().and_then(|k| self.id_of(*k)),
            list.last().and_then(|k| self.id_of(*k)),
        ) else {
            return 0..0;
        };
        if component_id < first || component_id > last {
            return 0..0;
        }
        let lo = list.partition_point(|k| self.id_of(*k).is_some_and(|id| id < component_id));
        let hi = list.partition_point(|k| self.id_of(*k).is_some_and(|id| id <= component_id));
        lo..hi
    }

    /// First component of `id` with `component_id`.
    pub fn component_with_id(
        &self,
        id: EntityId,
        component_id: ComponentId,
    ) -> Result<Option<ComponentKey>> {
        let entity = self.live(id, "component_with_id")?;
        let range = self.id_range(entity, component_id);
        Ok(entity.components[range].first().copied())
    }

    /// Every component of `id` with `component_id`, in attach order.
    pub fn components_with_id(
        &self,
        id: EntityId,
        component_id: ComponentId,
    ) -> Result<Vec<ComponentKey>> {
        let entity = self.live(id, "components_with_id")?;
        let range = self.id_range(entity, component_id);
        Ok(entity.components[range].to_vec())
    }

    /// Like [`component_with_id`](Self::component_with_id), falling back to
    /// descendants depth-first.
    pub fn component_with_id_in_children(
        &self,
        id: EntityId,
        component_id: ComponentId,
    ) -> Result<Option<ComponentKey>> {
        self.live(id, "component_with_id_in_children")?;
        Ok(self.first_in_subtree(id, component_id))
    }

    /// Matches of `id` followed by those of its descendants, depth-first.
    pub fn components_with_id_in_children(
        &self,
        id: EntityId,
        component_id: ComponentId,
    ) -> Result<Vec<ComponentKey>> {
        self.live(id, "components_with_id_in_children")?;
        let mut found = Vec::new();
        self.collect_in_subtree(id, component_id, &mut found);
        Ok(found)
    }

    fn first_in_subtree(&self, id: EntityId, component_id: ComponentId) -> Option<ComponentKey> {
        let entity = self.entities.get(id).filter(|e| !e.disposed)?;
        let range = self.id_range(entity, component_id);
        if let Some(key) = entity.components[range].first() {
            return Some(*key);
        }
        entity
            .transform
            .children()
            .iter()
            .find_map(|child| self.first_in_subtree(*child, component_id))
    }

    fn collect_in_subtree(&self, id: EntityId, component_id: ComponentId, out: &mut Vec<ComponentKey>) {
        let Some(entity) = self.entities.get(id).filter(|e| !e.disposed) else {
            return;
        };
        let range = self.id_range(entity, component_id);
        out.extend_from_slice(&entity.components[range]);
        for child in entity.transform.children() {
            self.collect_in_subtree(*child, component_id, out);
        }
    }

    // ==================== TAGS ====================

    /// First descendant of `id` (not `id` itself) tagged `tag`, depth-first.
    pub fn find_child_with_tag(
        &self,
        id: EntityId,
        tag: &str,
        include_disabled: bool,
    ) -> Result<Option<EntityId>> {
        let entity = self.live(id, "find_child_with_tag")?;
        let mut found = Vec::new();
        for child in entity.transform.children() {
            self.collect_tagged(*child, tag, include_disabled, true, &mut found);
            if !found.is_empty() {
                break;
            }
        }
        Ok(found.first().copied())
    }

    /// Every descendant of `id` tagged `tag`, depth-first.
    pub fn find_children_with_tag(
        &self,
        id: EntityId,
        tag: &str,
        include_disabled: bool,
    ) -> Result<Vec<EntityId>> {
        let entity = self.live(id, "find_children_with_tag")?;
        let mut found = Vec::new();
        for child in entity.transform.children() {
            self.collect_tagged(*child, tag, include_disabled, false, &mut found);
        }
        Ok(found)
    }

    /// First live entity in the scene tree tagged `tag`.
    pub fn find_with_tag(&self, tag: &str) -> Option<EntityId> {
        let mut found = Vec::new();
        for root in &self.roots {
            self.collect_tagged(*root, tag, true, true, &mut found);
            if !found.is_empty() {
                break;
            }
        }
        found.first().copied()
    }

    /// Every live entity in the scene tree tagged `tag`, depth-first.
    pub fn find_all_with_tag(&self, tag: &str) -> Vec<EntityId> {
        let mut found = Vec::new();
        for root in &self.roots {
            self.collect_tagged(*root, tag, true, false, &mut found);
        }
        found
    }

    /// Pre-order walk. Disabled entities are never reported unless
    /// `include_disabled`, but their subtrees are still walked.
    fn collect_tagged(
        &self,
        id: EntityId,
        tag: &str,
        include_disabled: bool,
        first_only: bool,
        out: &mut Vec<EntityId>,
    ) {
        let Some(entity) = self.entities.get(id).filter(|e| !e.disposed) else {
            return;
        };
        if entity.tag == tag && (include_disabled || entity.enabled) {
            out.push(id);
            if first_only {
                return;
            }
        }
        for child in entity.transform.children() {
            self.collect_tagged(*child, tag, include_disabled, first_only, out);
            if first_only && !out.is_empty() {
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::component::{Component, ComponentBehavior, PHYSICS_ID, SHAPE_ID};
    use std::any::Any;

    struct Tagged(u32);

    impl ComponentBehavior for Tagged {
        fn as_any(&self) -> &dyn Any {
            self
        }
        fn as_any_mut(&mut self) -> &mut dyn Any {
            self
        }
    }

    fn custom(id: ComponentId, n: u32) -> Component {
        Component::custom(id, Tagged(n)).unwrap()
    }

    #[test]
    fn test_components_kept_sorted() {
        let mut scene = Scene::new();
        let e = scene.create_entity("e");
        scene.add_component(e, custom(9, 0)).unwrap();
        scene.add_component(e, Component::shape(Default::default())).unwrap();
        scene.add_component(e, custom(0, 0)).unwrap();
        let ids: Vec<_> = scene
            .entity(e)
            .unwrap()
            .components()
            .iter()
            .map(|k| scene.component(*k).unwrap().id())
            .collect();
        assert_eq!(ids, vec![SHAPE_ID, 0, 9]);
    }

    #[test]
    fn test_out_of_range_id_is_none() {
        let mut scene = Scene::new();
        let e = scene.create_entity("e");
        scene.add_component(e, custom(3, 0)).unwrap();
        assert_eq!(scene.component_with_id(e, PHYSICS_ID).unwrap(), None);
        assert_eq!(scene.component_with_id(e, 4).unwrap(), None);
        assert!(scene.components_with_id(e, 100).unwrap().is_empty());
    }

    #[test]
    fn test_in_children_prefers_self_then_depth_first() {
        let mut scene = Scene::new();
        let root = scene.create_entity("root");
        let a = scene.create_entity("a");
        let a1 = scene.create_entity("a1");
        let b = scene.create_entity("b");
        scene.add_child(root, a).unwrap();
        scene.add_child(a, a1).unwrap();
        scene.add_child(root, b).unwrap();

        let deep = scene.add_component(a1, custom(1, 1)).unwrap();
        let shallow = scene.add_component(b, custom(1, 2)).unwrap();
        assert_eq!(scene.component_with_id_in_children(root, 1).unwrap(), Some(deep));
        assert_eq!(
            scene.components_with_id_in_children(root, 1).unwrap(),
            vec![deep, shallow]
        );

        let own = scene.add_component(root, custom(1, 3)).unwrap();
        assert_eq!(scene.component_with_id_in_children(root, 1).unwrap(), Some(own));
    }

    #[test]
    fn test_find_child_with_tag_skips_self_and_disabled() {
        let mut scene = Scene::new();
        let root = scene.create_entity("enemy");
        let a = scene.create_entity("enemy");
        let b = scene.create_entity("enemy");
        scene.add_child(root, a).unwrap();
        scene.add_child(root, b).unwrap();
        scene.set_enabled(a, false).unwrap();

        assert_eq!(scene.find_child_with_tag(root, "enemy", false).unwrap(), Some(b));
        assert_eq!(scene.find_child_with_tag(root, "enemy", true).unwrap(), Some(a));
        assert_eq!(scene.find_children_with_tag(root, "enemy", true).unwrap(), vec![a, b]);
        assert_eq!(scene.find_children_with_tag(root, "enemy", false).unwrap(), vec![b]);
    }

    #[test]
    fn test_scene_tag_search() {
        let mut scene = Scene::new();
        let a = scene.create_entity("a");
        let b = scene.create_entity("b");
        let b2 = scene.create_entity("b");
        scene.add_child(a, b2).unwrap();
        assert_eq!(scene.find_with_tag("b"), Some(b2));
        assert_eq!(scene.find_all_with_tag("b"), vec![b2, b]);
        assert_eq!(scene.find_with_tag("zzz"), None);
    }
}
