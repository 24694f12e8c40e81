//! Parenting operations.
//!
//! Re-parenting keeps the child's world pose: its current world matrix is
//! computed from the local values up the chain (independent of when the
//! last refresh ran) and re-expressed in the new parent's space. Under a
//! non-uniformly scaled parent the decomposition drops any skew.

use log::debug;

use crate::error::{EngineError, Result};
use crate::math::{Mat3, compose, try_inverse};
use crate::scene::{EntityId, Scene};

impl Scene {
    /// Current world matrix of `id`, composed from local values up the chain.
    pub fn world_matrix(&self, id: EntityId) -> Result<Mat3> {
        self.live(id, "world_matrix")?;
        let mut matrix = Mat3::IDENTITY;
        let mut current = Some(id);
        while let Some(node) = current {
            let Some(entity) = self.entities.get(node) else {
                break;
            };
            let t = &entity.transform;
            matrix = compose(t.local_position(), t.local_rotation(), t.local_scale()) * matrix;
            current = t.parent();
        }
        Ok(matrix)
    }

    pub fn parent(&self, id: EntityId) -> Result<Option<EntityId>> {
        Ok(self.live(id, "parent")?.transform.parent())
    }

    pub fn children(&self, id: EntityId) -> Result<&[EntityId]> {
        Ok(self.live(id, "children")?.transform.children())
    }

    /// True when `ancestor` is on the parent chain of `id`.
    pub fn is_ancestor(&self, ancestor: EntityId, id: EntityId) -> bool {
        let mut current = self.entities.get(id).and_then(|e| e.transform.parent());
        while let Some(node) = current {
            if node == ancestor {
                return true;
            }
            current = self.entities.get(node).and_then(|e| e.transform.parent());
        }
        false
    }

    /// Make `child` a child of `parent`, keeping its world pose. Under a
    /// disabled parent the child's subtree is disabled too.
    ///
    /// Returns `Ok(false)` when `parent` already is the parent.
    pub fn add_child(&mut self, parent: EntityId, child: EntityId) -> Result<bool> {
        self.live(parent, "add_child")?;
        let child_entity = self.live(child, "add_child")?;
        if parent == child {
            return Err(EngineError::SelfParenting {
                tag: child_entity.tag.clone(),
            });
        }
        if child_entity.transform.parent() == Some(parent) {
            return Ok(false);
        }
        if self.is_ancestor(child, parent) {
            return Err(EngineError::HierarchyCycle {
                tag: child_entity.tag.clone(),
            });
        }

        let saved = self.world_matrix(child)?;
        let parent_world = self.world_matrix(parent)?;
        let inverse = try_inverse(&parent_world).ok_or(EngineError::SingularMatrix { op: "add_child" })?;

        self.unlink(child);
        let entity = self.live_mut(child, "add_child")?;
        entity.transform.set_parent_link(Some(parent), parent_world);
        entity.transform.set_local_matrix(inverse * saved);
        entity.transform.refresh(true);
        let child_tag = entity.tag.clone();

        let parent_entity = self.live_mut(parent, "add_child")?;
        parent_entity.transform.push_child(child);
        parent_entity.bounds_dirty = true;
        let parent_enabled = parent_entity.enabled;
        debug!("'{}' is now a child of '{}'", child_tag, parent_entity.tag);
        // a disabled parent disables the whole incoming subtree
        if !parent_enabled {
            self.set_enabled(child, false)?;
        }
        Ok(true)
    }

    /// Detach `child` from `parent` into root space, keeping its world pose.
    pub fn remove_child(&mut self, parent: EntityId, child: EntityId) -> Result<()> {
        let parent_tag = self.live(parent, "remove_child")?.tag.clone();
        let child_entity = self.live(child, "remove_child")?;
        if child_entity.transform.parent() != Some(parent) {
            return Err(EngineError::NotAChild {
                parent: parent_tag,
                child: child_entity.tag.clone(),
            });
        }

        let saved = self.world_matrix(child)?;
        self.unlink(child);
        let entity = self.live_mut(child, "remove_child")?;
        entity.transform.set_parent_link(None, Mat3::IDENTITY);
        entity.transform.set_local_matrix(saved);
        entity.transform.refresh(true);
        debug!("'{}' detached from '{}'", entity.tag, parent_tag);
        self.roots.push(child);
        Ok(())
    }

    /// Re-parent `child` under `parent`, or to the root with `None`.
    ///
    /// Returns `Ok(false)` when nothing changed.
    pub fn set_parent(&mut self, child: EntityId, parent: Option<EntityId>) -> Result<bool> {
        match parent {
            Some(parent) => self.add_child(parent, child),
            None => match self.live(child, "set_parent")?.transform.parent() {
                Some(old) => {
                    self.remove_child(old, child)?;
                    Ok(true)
                }
                None => Ok(false),
            },
        }
    }

    /// Make `id` a root of the scene, detaching it from its parent.
    ///
    /// Returns `Ok(false)` when it already is a root.
    pub fn add_root(&mut self, id: EntityId) -> Result<bool> {
        match self.live(id, "add_root")?.transform.parent() {
            Some(parent) => {
                self.remove_child(parent, id)?;
                Ok(true)
            }
            None if self.roots.contains(&id) => Ok(false),
            None => {
                self.roots.push(id);
                Ok(true)
            }
        }
    }

    /// Remove `id` from its parent's child list or from the roots.
    pub(crate) fn unlink(&mut self, id: EntityId) {
        let parent = self.entities.get(id).and_then(|e| e.transform.parent());
        match parent {
            Some(parent) => {
                if let Some(parent) = self.entities.get_mut(parent) {
                    parent.transform.remove_child_link(id);
                    parent.bounds_dirty = true;
                }
            }
            None => self.roots.retain(|r| *r != id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Vec2;

    const EPSILON: f32 = 1e-4;

    fn approx_eq(a: f32, b: f32) -> bool {
        (a - b).abs() < EPSILON
    }

    fn vec_approx_eq(a: Vec2, b: Vec2) -> bool {
        approx_eq(a.x, b.x) && approx_eq(a.y, b.y)
    }

    #[test]
    fn test_add_child_moves_out_of_roots() {
        let mut scene = Scene::new();
        let p = scene.create_entity("p");
        let c = scene.create_entity("c");
        assert!(scene.add_child(p, c).unwrap());
        assert_eq!(scene.roots(), &[p]);
        assert_eq!(scene.children(p).unwrap(), &[c]);
        assert_eq!(scene.parent(c).unwrap(), Some(p));
        assert!(!scene.add_child(p, c).unwrap());
    }

    #[test]
    fn test_self_parenting_rejected() {
        let mut scene = Scene::new();
        let a = scene.create_entity("a");
        assert!(matches!(scene.add_child(a, a), Err(EngineError::SelfParenting { .. })));
    }

    #[test]
    fn test_cycle_rejected() {
        let mut scene = Scene::new();
        let a = scene.create_entity("a");
        let b = scene.create_entity("b");
        let c = scene.create_entity("c");
        scene.add_child(a, b).unwrap();
        scene.add_child(b, c).unwrap();
        assert!(matches!(scene.add_child(c, a), Err(EngineError::HierarchyCycle { .. })));
        assert_eq!(scene.parent(a).unwrap(), None);
    }

    #[test]
    fn test_remove_child_requires_parent() {
        let mut scene = Scene::new();
        let a = scene.create_entity("a");
        let b = scene.create_entity("b");
        assert!(matches!(scene.remove_child(a, b), Err(EngineError::NotAChild { .. })));
    }

    #[test]
    fn test_world_matrix_without_refresh() {
        let mut scene = Scene::new();
        let p = scene.create_entity("p");
        let c = scene.create_entity("c");
        scene.add_child(p, c).unwrap();
        scene.transform_mut(p).unwrap().set_local_position(Vec2::new(5.0, 0.0));
        scene.transform_mut(c).unwrap().set_local_position(Vec2::new(1.0, 1.0));
        let m = scene.world_matrix(c).unwrap();
        assert!(vec_approx_eq(m.transform_point2(Vec2::ZERO), Vec2::new(6.0, 1.0)));
    }

    #[test]
    fn test_singular_parent_rejected_before_mutation() {
        let mut scene = Scene::new();
        let p = scene.create_entity("p");
        let c = scene.create_entity("c");
        scene.transform_mut(p).unwrap().set_local_scale(Vec2::new(0.0, 1.0));
        assert!(matches!(
            scene.add_child(p, c),
            Err(EngineError::SingularMatrix { op: "add_child" })
        ));
        assert_eq!(scene.roots(), &[p, c]);
    }

    #[test]
    fn test_disabled_parent_disables_new_subtree() {
        let mut scene = Scene::new();
        let p = scene.create_entity("p");
        let c = scene.create_entity("c");
        let g = scene.create_entity("g");
        scene.add_child(c, g).unwrap();
        scene.set_enabled(p, false).unwrap();
        scene.add_child(p, c).unwrap();
        assert!(!scene.is_enabled(c).unwrap());
        assert!(!scene.is_enabled(g).unwrap());

        // an enabled parent leaves a disabled child alone
        let q = scene.create_entity("q");
        scene.add_child(q, c).unwrap();
        assert!(!scene.is_enabled(c).unwrap());
    }

    #[test]
    fn test_add_root_detaches() {
        let mut scene = Scene::new();
        let p = scene.create_entity("p");
        let c = scene.create_entity("c");
        scene.add_child(p, c).unwrap();
        assert!(scene.add_root(c).unwrap());
        assert!(!scene.add_root(c).unwrap());
        assert_eq!(scene.roots(), &[p, c]);
        assert!(scene.children(p).unwrap().is_empty());
    }

    #[test]
    fn test_set_parent_none() {
        let mut scene = Scene::new();
        let p = scene.create_entity("p");
        let c = scene.create_entity("c");
        assert!(!scene.set_parent(c, None).unwrap());
        scene.set_parent(c, Some(p)).unwrap();
        assert!(scene.set_parent(c, None).unwrap());
        assert_eq!(scene.parent(c).unwrap(), None);
    }
}
