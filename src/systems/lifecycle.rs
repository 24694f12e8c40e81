//! Per-frame entity and component lifecycle.
//!
//! # Schedule
//!
//! [`run_frame`] is the body of [`Scene::update`]:
//!
//! 1. [`update_entities`] – lazy `start`, `update` hooks, deferred disposal
//!    of children flagged with `destroy`
//! 2. [`late_update_entities`] – `late_update` hooks
//! 3. [`update_components`] – disposal of flagged components, `update` hooks
//! 4. [`step_physics`] – fixed-step integration, trigger/collision dispatch
//! 5. [`late_update_components`] – `late_update` hooks, bounds refits
//! 6. [`propagate_transforms`] – matrices top-down, bounds bottom-up
//!
//! Disabled entities keep being walked so their descendants' pending
//! destroys are still processed, but none of their hooks run.

use log::debug;
use smallvec::SmallVec;

use crate::components::component::ComponentContext;
use crate::error::Result;
use crate::events::collision::PhysicsEvent;
use crate::scene::{EntityId, Scene};
use crate::systems::propagate_transforms::propagate_transforms;

type Children = SmallVec<[EntityId; 8]>;

fn children_of(scene: &Scene, id: EntityId) -> Children {
    scene
        .entities
        .get(id)
        .map(|e| SmallVec::from_slice(e.transform.children()))
        .unwrap_or_default()
}

/// Copy of the root list; hooks may change it while it is walked.
fn roots_of(scene: &Scene) -> Children {
    SmallVec::from_slice(&scene.roots)
}

fn still_root(scene: &Scene, id: EntityId) -> bool {
    scene
        .entities
        .get(id)
        .is_some_and(|e| e.transform.parent().is_none())
}

fn is_active(scene: &Scene, id: EntityId) -> bool {
    scene
        .entities
        .get(id)
        .is_some_and(|e| e.enabled && !e.disposed)
}

pub fn run_frame(scene: &mut Scene, delta: f32) -> Result<()> {
    update_entities(scene, delta)?;
    late_update_entities(scene, delta)?;
    update_components(scene, delta)?;
    step_physics(scene, delta)?;
    late_update_components(scene, delta)?;
    propagate_transforms(scene);
    Ok(())
}

// ==================== ENTITY HOOKS ====================

fn ensure_started(scene: &mut Scene, id: EntityId) -> Result<()> {
    let Some(entity) = scene.entities.get_mut(id) else {
        return Ok(());
    };
    if entity.initialised {
        return Ok(());
    }
    entity.initialised = true;
    scene.with_behavior(id, |b, s| b.start(s, id))
}

pub fn update_entities(scene: &mut Scene, delta: f32) -> Result<()> {
    for root in roots_of(scene) {
        let Some(entity) = scene.entities.get(root) else {
            continue;
        };
        if entity.disposed || entity.transform.parent().is_some() {
            continue;
        }
        if entity.destroy_pending {
            dispose_entity(scene, root)?;
        } else {
            update_entity(scene, root, delta)?;
        }
    }
    Ok(())
}

/// Update `id`, then dispose its children flagged for destruction and
/// recurse into the rest.
pub fn update_entity(scene: &mut Scene, id: EntityId, delta: f32) -> Result<()> {
    if is_active(scene, id) {
        ensure_started(scene, id)?;
        scene.with_behavior(id, |b, s| b.update(s, id, delta))?;
    }
    for child in children_of(scene, id) {
        let Some(entity) = scene.entities.get(child) else {
            continue;
        };
        if entity.disposed {
            continue;
        }
        if entity.destroy_pending {
            dispose_entity(scene, child)?;
        } else {
            update_entity(scene, child, delta)?;
        }
    }
    Ok(())
}

pub fn late_update_entities(scene: &mut Scene, delta: f32) -> Result<()> {
    for root in roots_of(scene) {
        if still_root(scene, root) {
            late_update_entity(scene, root, delta)?;
        }
    }
    Ok(())
}

fn late_update_entity(scene: &mut Scene, id: EntityId, delta: f32) -> Result<()> {
    if scene.entities.get(id).is_none_or(|e| e.disposed) {
        return Ok(());
    }
    if is_active(scene, id) {
        ensure_started(scene, id)?;
        scene.with_behavior(id, |b, s| b.late_update(s, id, delta))?;
    }
    for child in children_of(scene, id) {
        late_update_entity(scene, child, delta)?;
    }
    Ok(())
}

/// Dispose `id` now: children first, then components, then `on_destroy`.
///
/// The entity is unlinked from its parent (or the roots) and left as a
/// tombstone. Fails if it is already disposed.
pub fn dispose_entity(scene: &mut Scene, id: EntityId) -> Result<()> {
    scene.live(id, "dispose")?;
    for child in children_of(scene, id) {
        if scene.is_alive(child) {
            dispose_entity(scene, child)?;
        }
    }

    {
        let Scene {
            entities,
            components,
            physics,
            ..
        } = &mut *scene;
        if let Some(entity) = entities.get_mut(id) {
            for key in entity.components.drain(..) {
                if let Some(component) = components.get_mut(key) {
                    component.internal_dispose(physics);
                }
            }
        }
    }

    let hook = scene.with_behavior(id, |b, s| b.on_destroy(s, id));

    scene.unlink(id);
    if let Some(entity) = scene.entities.get_mut(id) {
        entity.transform.clear_children();
        entity.behavior = None;
        entity.disposed = true;
        debug!("disposed entity '{}'", entity.tag);
    }
    hook
}

// ==================== COMPONENT HOOKS ====================

pub fn update_components(scene: &mut Scene, delta: f32) -> Result<()> {
    for root in roots_of(scene) {
        if still_root(scene, root) {
            update_entity_components(scene, root, delta)?;
        }
    }
    Ok(())
}

fn update_entity_components(scene: &mut Scene, id: EntityId, delta: f32) -> Result<()> {
    {
        let Scene {
            entities,
            components,
            physics,
            ..
        } = &mut *scene;
        let Some(entity) = entities.get_mut(id) else {
            return Ok(());
        };
        if entity.disposed {
            return Ok(());
        }

        let before = entity.components.len();
        entity.components.retain(|key| match components.get_mut(*key) {
            Some(c) if c.is_destroy_pending() => {
                c.internal_dispose(physics);
                false
            }
            Some(_) => true,
            None => false,
        });
        if entity.components.len() != before {
            entity.bounds_dirty = true;
        }

        if entity.enabled {
            for key in &entity.components {
                let Some(component) = components.get_mut(*key) else {
                    continue;
                };
                if !component.is_enabled() {
                    continue;
                }
                let mut ctx = ComponentContext {
                    owner: id,
                    transform: &mut entity.transform,
                    physics: &mut *physics,
                    delta,
                };
                component.run_update(&mut ctx)?;
            }
        }
    }
    for child in children_of(scene, id) {
        update_entity_components(scene, child, delta)?;
    }
    Ok(())
}

pub fn late_update_components(scene: &mut Scene, delta: f32) -> Result<()> {
    for root in roots_of(scene) {
        if still_root(scene, root) {
            late_update_entity_components(scene, root, delta)?;
        }
    }
    Ok(())
}

fn late_update_entity_components(scene: &mut Scene, id: EntityId, delta: f32) -> Result<()> {
    {
        let Scene {
            entities,
            components,
            physics,
            ..
        } = &mut *scene;
        let Some(entity) = entities.get_mut(id) else {
            return Ok(());
        };
        if !entity.disposed && entity.enabled {
            let mut refit = false;
            for key in &entity.components {
                let Some(component) = components.get_mut(*key) else {
                    continue;
                };
                if component.is_enabled() {
                    let mut ctx = ComponentContext {
                        owner: id,
                        transform: &mut entity.transform,
                        physics: &mut *physics,
                        delta,
                    };
                    component.run_late_update(&mut ctx)?;
                }
                refit |= component.run_update_bounds(&entity.transform);
            }
            if refit {
                entity.bounds_dirty = true;
            }
        }
    }
    for child in children_of(scene, id) {
        late_update_entity_components(scene, child, delta)?;
    }
    Ok(())
}

// ==================== PHYSICS ====================

/// Advance the physics registry and route its events to both owners.
/// Returns the number of fixed steps run.
pub fn step_physics(scene: &mut Scene, delta: f32) -> Result<u32> {
    let steps = scene.physics.advance(delta);
    for event in scene.physics.drain_events() {
        match event {
            PhysicsEvent::Trigger(e) => {
                if let Some(a) = e.owner_a {
                    notify_trigger(scene, a, e.owner_b)?;
                }
                if let Some(b) = e.owner_b {
                    notify_trigger(scene, b, e.owner_a)?;
                }
            }
            PhysicsEvent::Collision(e) => {
                if let Some(a) = e.owner_a
                    && is_active(scene, a)
                {
                    scene.with_behavior(a, |h, s| h.on_collision(s, a, e.owner_b, e.contact))?;
                }
                if let Some(b) = e.owner_b
                    && is_active(scene, b)
                {
                    let contact = e.contact.flipped();
                    scene.with_behavior(b, |h, s| h.on_collision(s, b, e.owner_a, contact))?;
                }
            }
        }
    }
    Ok(steps)
}

fn notify_trigger(scene: &mut Scene, me: EntityId, other: Option<EntityId>) -> Result<()> {
    if !is_active(scene, me) {
        return Ok(());
    }
    scene.with_behavior(me, |h, s| h.on_trigger(s, me, other))
}
