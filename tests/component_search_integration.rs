//! Component-by-ID search across entities and subtrees.
//!
//! The randomised checks use a seeded `fastrand::Rng` so failures replay.

use std::any::Any;

use scenegraph2d::components::component::{
    Component, ComponentBehavior, ComponentId, ComponentType, PARTICLES_ID, PHYSICS_ID, SHAPE_ID,
};
use scenegraph2d::scene::{ComponentKey, EntityId, Scene};

struct Mark(u32);

impl ComponentBehavior for Mark {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

fn mark(scene: &Scene, key: ComponentKey) -> u32 {
    scene
        .component(key)
        .unwrap()
        .downcast_ref::<Mark>()
        .map_or(u32::MAX, |m| m.0)
}

fn ids_of(scene: &Scene, id: EntityId) -> Vec<ComponentId> {
    scene
        .entity(id)
        .unwrap()
        .components()
        .iter()
        .map(|k| scene.component(*k).unwrap().id())
        .collect()
}

// =============================================================================
// Single entity
// =============================================================================

#[test]
fn mixed_ids_are_sorted_and_searchable() {
    let mut scene = Scene::new();
    let e = scene.create_entity("e");
    scene.add_component(e, Component::custom(5, Mark(1)).unwrap()).unwrap();
    scene.create_component(e, ComponentType::Physics).unwrap();
    scene.add_component(e, Component::custom(9, Mark(2)).unwrap()).unwrap();
    scene.create_component(e, ComponentType::Shape).unwrap();
    scene.add_component(e, Component::custom(0, Mark(3)).unwrap()).unwrap();
    scene.add_component(e, Component::custom(5, Mark(4)).unwrap()).unwrap();
    scene.create_component(e, ComponentType::Particles).unwrap();

    assert_eq!(
        ids_of(&scene, e),
        vec![PARTICLES_ID, PHYSICS_ID, SHAPE_ID, 0, 5, 5, 9]
    );

    let fives = scene.components_with_id(e, 5).unwrap();
    assert_eq!(fives.iter().map(|k| mark(&scene, *k)).collect::<Vec<_>>(), vec![1, 4]);
    assert_eq!(scene.component_with_id(e, 5).unwrap(), Some(fives[0]));

    assert_eq!(scene.component_with_id(e, 7).unwrap(), None);
    assert!(scene.components_with_id(e, 7).unwrap().is_empty());
    assert_eq!(scene.component_with_id(e, 10).unwrap(), None);
    assert_eq!(scene.component_with_id(e, -4).unwrap(), None);
    assert!(scene.component_with_id(e, PHYSICS_ID).unwrap().is_some());
}

#[test]
fn removing_by_id_keeps_order() {
    let mut scene = Scene::new();
    let e = scene.create_entity("e");
    for (id, m) in [(2, 0), (1, 1), (2, 2), (3, 3)] {
        scene.add_component(e, Component::custom(id, Mark(m)).unwrap()).unwrap();
    }
    let removed = scene.remove_component_with_id(e, 2).unwrap().unwrap();
    assert_eq!(mark(&scene, removed), 0);
    assert_eq!(scene.component(removed).unwrap().owner(), None);
    assert_eq!(ids_of(&scene, e), vec![1, 2, 3]);
    let left = scene.component_with_id(e, 2).unwrap().unwrap();
    assert_eq!(mark(&scene, left), 2);

    assert_eq!(scene.remove_components_with_id(e, 2).unwrap(), vec![left]);
    assert_eq!(ids_of(&scene, e), vec![1, 3]);
}

// =============================================================================
// Subtrees
// =============================================================================

#[test]
fn pruned_parent_still_searches_children() {
    let mut scene = Scene::new();
    let root = scene.create_entity("root");
    let child = scene.create_entity("child");
    scene.add_child(root, child).unwrap();
    // root's range is [0, 1]; 8 is outside it
    scene.add_component(root, Component::custom(0, Mark(0)).unwrap()).unwrap();
    scene.add_component(root, Component::custom(1, Mark(1)).unwrap()).unwrap();
    let deep = scene.add_component(child, Component::custom(8, Mark(8)).unwrap()).unwrap();

    assert_eq!(scene.component_with_id(root, 8).unwrap(), None);
    assert_eq!(scene.component_with_id_in_children(root, 8).unwrap(), Some(deep));
}

/// Pre-order reference walk: the entity's own matches in list order, then
/// each child subtree.
fn brute_force(scene: &Scene, id: EntityId, component_id: ComponentId, out: &mut Vec<ComponentKey>) {
    let entity = scene.entity(id).unwrap();
    for key in entity.components() {
        if scene.component(*key).unwrap().id() == component_id {
            out.push(*key);
        }
    }
    for child in scene.children(id).unwrap() {
        brute_force(scene, *child, component_id, out);
    }
}

#[test]
fn randomised_trees_match_brute_force() {
    let mut rng = fastrand::Rng::with_seed(0x5eed_2d);
    for _ in 0..50 {
        let mut scene = Scene::new();
        let root = scene.create_entity("root");
        let mut nodes = vec![root];
        for i in 0..rng.usize(1..20) {
            let node = scene.create_entity(format!("n{i}"));
            let parent = nodes[rng.usize(..nodes.len())];
            scene.add_child(parent, node).unwrap();
            nodes.push(node);
        }

        let mut serial = 0;
        for &node in &nodes {
            for _ in 0..rng.usize(0..6) {
                let component = match rng.u8(0..5) {
                    0 => Component::from_type(ComponentType::Shape),
                    _ => Component::custom(rng.i32(0..8), Mark(serial)).unwrap(),
                };
                serial += 1;
                scene.add_component(node, component).unwrap();
            }
            let ids = ids_of(&scene, node);
            assert!(ids.windows(2).all(|w| w[0] <= w[1]));
        }

        for query in -2..10 {
            for &node in &nodes {
                let mut expected = Vec::new();
                brute_force(&scene, node, query, &mut expected);
                assert_eq!(scene.components_with_id_in_children(node, query).unwrap(), expected);
                assert_eq!(
                    scene.component_with_id_in_children(node, query).unwrap(),
                    expected.first().copied()
                );

                let own: Vec<_> = scene
                    .entity(node)
                    .unwrap()
                    .components()
                    .iter()
                    .copied()
                    .filter(|k| scene.component(*k).unwrap().id() == query)
                    .collect();
                assert_eq!(scene.components_with_id(node, query).unwrap(), own);
            }
        }
    }
}

// =============================================================================
// Tags
// =============================================================================

#[test]
fn tag_search_walks_disabled_subtrees() {
    let mut scene = Scene::new();
    let root = scene.create_entity("root");
    let off = scene.create_entity("group");
    let inner = scene.create_entity("target");
    scene.add_child(root, off).unwrap();
    scene.add_child(off, inner).unwrap();
    scene.set_enabled(off, false).unwrap();
    scene.set_enabled(inner, true).unwrap();

    assert_eq!(scene.find_child_with_tag(root, "target", false).unwrap(), Some(inner));
    assert_eq!(scene.find_child_with_tag(root, "group", false).unwrap(), None);
    assert_eq!(scene.find_child_with_tag(root, "group", true).unwrap(), Some(off));
    assert_eq!(scene.find_child_with_tag(root, "root", true).unwrap(), None);
}
