//! Transform propagation and bounds aggregation for the scene tree.
//!
//! Walks every root top-down, handing each entity its parent's freshly
//! computed global matrix (identity for roots) so that global-space reads in
//! later phases are consistent within the frame.
//!
//! On the way back up, local bounds are re-aggregated where needed:
//!
//! ```text
//! local_bounds = union(component bounds, child.local_bounds mapped by child.local)
//! ```
//!
//! and global bounds are re-derived whenever the local bounds or the global
//! matrix changed.
//!
//! # Schedule position
//!
//! Runs **after** every phase that can move an entity (hooks, physics
//! write-back) and **before** drawing.

use smallvec::SmallVec;

use crate::components::bounds::Bounds;
use crate::math::Mat3;
use crate::scene::{EntityId, Scene};

/// Refresh every transform and aggregated bounds in the scene.
pub fn propagate_transforms(scene: &mut Scene) {
    let roots: SmallVec<[EntityId; 8]> = SmallVec::from_slice(&scene.roots);
    for root in roots {
        propagate(scene, root, Mat3::IDENTITY);
    }
}

/// Returns true when the parent must re-aggregate its local bounds: this
/// entity's local bounds or local matrix changed.
fn propagate(scene: &mut Scene, id: EntityId, parent_global: Mat3) -> bool {
    let Some(entity) = scene.entities.get_mut(id) else {
        return false;
    };
    if entity.disposed {
        return false;
    }

    let transform = &mut entity.transform;
    let parent_moved =
        transform.parent().is_some() && transform.parent_global() != parent_global;
    if parent_moved {
        transform.set_parent_global(parent_global);
    }
    let change = transform.refresh(parent_moved);
    let global = transform.global_matrix();
    let children: SmallVec<[EntityId; 8]> = SmallVec::from_slice(transform.children());

    let mut child_changed = false;
    for child in children {
        child_changed |= propagate(scene, child, global);
    }

    let mut local_changed = false;
    let needs_aggregate = scene.entities.get(id).is_some_and(|e| e.bounds_dirty) || child_changed;
    if needs_aggregate {
        let fresh = aggregate_local_bounds(scene, id);
        if let Some(entity) = scene.entities.get_mut(id) {
            local_changed = fresh != entity.local_bounds;
            entity.local_bounds = fresh;
            entity.bounds_dirty = false;
        }
    }

    if let Some(entity) = scene.entities.get_mut(id)
        && (local_changed || change.global)
    {
        entity.global_bounds = entity.local_bounds.global_bounds(&global);
    }

    local_changed || change.local
}

/// Union of the entity's component bounds and its children's bounds in the
/// entity's local space. Collapses onto the origin when there is nothing.
fn aggregate_local_bounds(scene: &Scene, id: EntityId) -> Bounds {
    let Some(entity) = scene.entities.get(id) else {
        return Bounds::default();
    };
    let component_bounds = entity
        .components
        .iter()
        .filter_map(|k| scene.components.get(*k))
        .map(|c| *c.local_bounds());
    let child_bounds = entity
        .transform
        .children()
        .iter()
        .filter_map(|k| scene.entities.get(*k).filter(|c| !c.disposed))
        .map(|c| c.local_bounds.global_bounds(&c.transform.local_matrix()));

    let mut acc: Option<Bounds> = None;
    for b in component_bounds.chain(child_bounds) {
        acc = Some(match acc {
            Some(mut a) => {
                a.encapsulate(&b);
                a
            }
            None => b,
        });
    }
    acc.unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::component::Component;
    use crate::components::shape::{ShapeComponent, ShapeType};
    use crate::math::Vec2;

    const EPSILON: f32 = 1e-4;

    fn approx_eq(a: f32, b: f32) -> bool {
        (a - b).abs() < EPSILON
    }

    fn vec_approx_eq(a: Vec2, b: Vec2) -> bool {
        approx_eq(a.x, b.x) && approx_eq(a.y, b.y)
    }

    fn square(size: f32) -> Component {
        let mut shape = ShapeComponent::primitive(ShapeType::Square, size);
        shape.set_outline_width(0.0);
        Component::shape(shape)
    }

    #[test]
    fn test_child_global_is_parent_times_local() {
        let mut scene = Scene::new();
        let p = scene.create_entity("p");
        let c = scene.create_entity("c");
        scene.add_child(p, c).unwrap();
        {
            let t = scene.transform_mut(p).unwrap();
            t.set_local_position(Vec2::new(3.0, -1.0));
            t.set_local_rotation(30.0);
            t.set_local_scale(Vec2::new(2.0, 0.5));
        }
        scene.transform_mut(c).unwrap().set_local_position(Vec2::new(1.0, 2.0));
        propagate_transforms(&mut scene);

        let gp = scene.transform(p).unwrap().global_matrix();
        let lc = scene.transform(c).unwrap().local_matrix();
        let gc = scene.transform(c).unwrap().global_matrix();
        let expected = gp * lc;
        for i in 0..3 {
            assert!(vec_approx_eq(gc.col(i).truncate(), expected.col(i).truncate()));
        }
    }

    #[test]
    fn test_parent_bounds_cover_children() {
        let mut scene = Scene::new();
        let p = scene.create_entity("p");
        let c = scene.create_entity("c");
        scene.add_child(p, c).unwrap();
        scene.add_component(c, square(2.0)).unwrap();
        scene.transform_mut(c).unwrap().set_local_position(Vec2::new(10.0, 0.0));

        // component bounds are refit by the late component pass
        scene.update(0.0).unwrap();

        let bounds = *scene.entity(p).unwrap().local_bounds();
        assert!(vec_approx_eq(bounds.min, Vec2::new(9.0, -1.0)));
        assert!(vec_approx_eq(bounds.max, Vec2::new(11.0, 1.0)));
    }

    #[test]
    fn test_global_bounds_follow_moves() {
        let mut scene = Scene::new();
        let e = scene.create_entity("e");
        scene.add_component(e, square(2.0)).unwrap();
        scene.update(0.0).unwrap();
        scene.transform_mut(e).unwrap().set_local_position(Vec2::new(5.0, 5.0));
        scene.refresh_transforms();
        let g = *scene.entity(e).unwrap().global_bounds();
        assert!(vec_approx_eq(g.center(), Vec2::new(5.0, 5.0)));
    }

    #[test]
    fn test_moving_parent_moves_child() {
        let mut scene = Scene::new();
        let p = scene.create_entity("p");
        let c = scene.create_entity("c");
        scene.add_child(p, c).unwrap();
        scene.transform_mut(c).unwrap().set_local_position(Vec2::new(1.0, 0.0));
        scene.refresh_transforms();
        scene.transform_mut(p).unwrap().set_local_position(Vec2::new(0.0, 4.0));
        scene.refresh_transforms();
        assert!(vec_approx_eq(scene.transform(c).unwrap().position(), Vec2::new(1.0, 4.0)));
    }
}
