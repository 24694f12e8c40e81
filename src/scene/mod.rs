//! Scene: the entity arena and everything that operates on it.
//!
//! A [`Scene`] owns three tables:
//! - `entities`: every [`Entity`], keyed by [`EntityId`],
//! - `components`: every [`Component`], keyed by [`ComponentKey`],
//! - `physics`: the [`Physics`] registry of rigid bodies.
//!
//! Parent/child links are handles stored in each entity's
//! [`Transform`](crate::components::transform::Transform); ownership of
//! every node stays with the scene, so disposing an entity never leaves a
//! dangling reference behind. Disposed entities and components are kept as
//! tombstones (any use reports an error naming the operation) until
//! [`Scene::collect_garbage`] drops them.
//!
//! # Frame
//!
//! [`Scene::update`] runs, in order:
//! 1. entity `update` hooks (lazy `start`, deferred child disposal),
//! 2. entity `late_update` hooks,
//! 3. component `update` hooks (deferred component disposal),
//! 4. the physics step and trigger/collision dispatch,
//! 5. component `late_update` hooks and bounds refits,
//! 6. the top-down transform refresh with bottom-up bounds aggregation.
//!
//! [`Scene::draw`] then culls and draws against a
//! [`ViewProvider`].
//!
//! # Submodules
//! - [`entity`] – entity record, lifecycle state and [`EntityBehavior`]
//! - `hierarchy` – parenting operations
//! - `search` – component-by-ID and tag queries
//! - [`snapshot`] – serialisable view of the tree
//! - [`manager`] – [`SceneManager`] and [`SceneLogic`]

pub mod entity;
mod hierarchy;
pub mod manager;
mod search;
pub mod snapshot;

use log::{debug, info};
use slotmap::{SlotMap, new_key_type};

use crate::components::component::{Component, ComponentId, ComponentType};
use crate::components::rigidbody::RigidBody;
use crate::components::transform::Transform;
use crate::error::{EngineError, Result};
use crate::resources::camera::ViewProvider;
use crate::resources::physics::Physics;
use crate::systems::lifecycle;
use crate::systems::propagate_transforms::propagate_transforms;
use crate::systems::render::{Renderer, render_pass};

pub use entity::{Entity, EntityBehavior, EntityState};
pub use manager::{SceneLogic, SceneManager, SceneRef};
pub use snapshot::EntitySnapshot;

new_key_type! {
    /// Handle to an entity of a [`Scene`].
    pub struct EntityId;
    /// Handle to a component of a [`Scene`].
    pub struct ComponentKey;
}

#[derive(Debug, Default)]
pub struct Scene {
    pub(crate) entities: SlotMap<EntityId, Entity>,
    pub(crate) components: SlotMap<ComponentKey, Component>,
    pub(crate) roots: Vec<EntityId>,
    pub(crate) physics: Physics,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_physics(physics: Physics) -> Self {
        Self {
            physics,
            ..Self::default()
        }
    }

    pub fn physics(&self) -> &Physics {
        &self.physics
    }

    pub fn physics_mut(&mut self) -> &mut Physics {
        &mut self.physics
    }

    // ==================== HANDLE CHECKS ====================

    pub(crate) fn live(&self, id: EntityId, op: &'static str) -> Result<&Entity> {
        let entity = self.entities.get(id).ok_or(EngineError::UnknownEntity { op })?;
        if entity.disposed {
            return Err(EngineError::EntityDisposed {
                tag: entity.tag.clone(),
                op,
            });
        }
        Ok(entity)
    }

    pub(crate) fn live_mut(&mut self, id: EntityId, op: &'static str) -> Result<&mut Entity> {
        let entity = self
            .entities
            .get_mut(id)
            .ok_or(EngineError::UnknownEntity { op })?;
        if entity.disposed {
            return Err(EngineError::EntityDisposed {
                tag: entity.tag.clone(),
                op,
            });
        }
        Ok(entity)
    }

    pub(crate) fn live_component(&self, key: ComponentKey, op: &'static str) -> Result<&Component> {
        let component = self
            .components
            .get(key)
            .ok_or(EngineError::UnknownComponent { op })?;
        if component.is_disposed() {
            return Err(EngineError::ComponentDisposed {
                id: component.id(),
                op,
            });
        }
        Ok(component)
    }

    pub(crate) fn live_component_mut(
        &mut self,
        key: ComponentKey,
        op: &'static str,
    ) -> Result<&mut Component> {
        let component = self
            .components
            .get_mut(key)
            .ok_or(EngineError::UnknownComponent { op })?;
        if component.is_disposed() {
            return Err(EngineError::ComponentDisposed {
                id: component.id(),
                op,
            });
        }
        Ok(component)
    }

    /// Run `f` with the entity's behaviour taken out of the table.
    ///
    /// The behaviour is put back afterwards unless the hook installed a new
    /// one or the entity was garbage-collected meanwhile.
    pub(crate) fn with_behavior<F>(&mut self, id: EntityId, f: F) -> Result<()>
    where
        F: FnOnce(&mut Box<dyn EntityBehavior>, &mut Scene) -> Result<()>,
    {
        let Some(mut behavior) = self.entities.get_mut(id).and_then(|e| e.behavior.take()) else {
            return Ok(());
        };
        let result = f(&mut behavior, self);
        if let Some(entity) = self.entities.get_mut(id)
            && entity.behavior.is_none()
            && !entity.disposed
        {
            entity.behavior = Some(behavior);
        }
        result
    }

    // ==================== ENTITIES ====================

    /// Create a root entity.
    pub fn create_entity(&mut self, tag: impl Into<String>) -> EntityId {
        let entity = Entity::new(tag);
        debug!("created entity '{}'", entity.tag);
        let id = self.entities.insert(entity);
        self.roots.push(id);
        id
    }

    /// Create a root entity driven by `behavior`.
    pub fn create_entity_with(
        &mut self,
        tag: impl Into<String>,
        behavior: impl EntityBehavior,
    ) -> EntityId {
        let id = self.create_entity(tag);
        if let Some(entity) = self.entities.get_mut(id) {
            entity.behavior = Some(Box::new(behavior));
        }
        id
    }

    pub fn entity(&self, id: EntityId) -> Result<&Entity> {
        self.live(id, "entity")
    }

    pub fn transform(&self, id: EntityId) -> Result<&Transform> {
        Ok(&self.live(id, "transform")?.transform)
    }

    pub fn transform_mut(&mut self, id: EntityId) -> Result<&mut Transform> {
        Ok(&mut self.live_mut(id, "transform_mut")?.transform)
    }

    pub fn tag(&self, id: EntityId) -> Result<&str> {
        Ok(&self.live(id, "tag")?.tag)
    }

    pub fn set_tag(&mut self, id: EntityId, tag: impl Into<String>) -> Result<()> {
        self.live_mut(id, "set_tag")?.tag = tag.into();
        Ok(())
    }

    /// Known and not disposed.
    pub fn is_alive(&self, id: EntityId) -> bool {
        self.entities.get(id).is_some_and(|e| !e.disposed)
    }

    /// Disposed but not yet garbage-collected.
    pub fn is_disposed(&self, id: EntityId) -> bool {
        self.entities.get(id).is_some_and(|e| e.disposed)
    }

    pub fn roots(&self) -> &[EntityId] {
        &self.roots
    }

    /// Live entities, in table order.
    pub fn entity_ids(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.entities
            .iter()
            .filter(|(_, e)| !e.disposed)
            .map(|(id, _)| id)
    }

    pub fn entity_count(&self) -> usize {
        self.entities.values().filter(|e| !e.disposed).count()
    }

    pub fn is_enabled(&self, id: EntityId) -> Result<bool> {
        Ok(self.live(id, "is_enabled")?.enabled)
    }

    /// Enable or disable `id` and every descendant, overwriting their own
    /// flags. Components keep their individual enabled state.
    pub fn set_enabled(&mut self, id: EntityId, enabled: bool) -> Result<()> {
        self.live(id, "set_enabled")?;
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let Some(entity) = self.entities.get_mut(current) else {
                continue;
            };
            if entity.disposed {
                continue;
            }
            entity.enabled = enabled;
            stack.extend_from_slice(entity.transform.children());
        }
        Ok(())
    }

    /// Flag `id` for disposal. The parent's next update pass (or the scene's,
    /// for a root) disposes it.
    pub fn destroy(&mut self, id: EntityId) -> Result<()> {
        self.live_mut(id, "destroy")?.destroy_pending = true;
        Ok(())
    }

    /// Dispose `id` and its subtree now.
    pub fn dispose_entity(&mut self, id: EntityId) -> Result<()> {
        lifecycle::dispose_entity(self, id)
    }

    /// Install `behavior`, returning the previous one.
    pub fn set_behavior(
        &mut self,
        id: EntityId,
        behavior: impl EntityBehavior,
    ) -> Result<Option<Box<dyn EntityBehavior>>> {
        Ok(self
            .live_mut(id, "set_behavior")?
            .behavior
            .replace(Box::new(behavior)))
    }

    /// Borrow the behaviour as its concrete type. `None` while one of its own
    /// hooks is running.
    pub fn behavior<T: EntityBehavior>(&self, id: EntityId) -> Option<&T> {
        self.entities
            .get(id)?
            .behavior
            .as_ref()?
            .as_any()
            .downcast_ref::<T>()
    }

    pub fn behavior_mut<T: EntityBehavior>(&mut self, id: EntityId) -> Option<&mut T> {
        self.entities
            .get_mut(id)?
            .behavior
            .as_mut()?
            .as_any_mut()
            .downcast_mut::<T>()
    }

    // ==================== COMPONENTS ====================

    /// Store `component` and attach it to `id`.
    pub fn add_component(&mut self, id: EntityId, component: Component) -> Result<ComponentKey> {
        self.live(id, "add_component")?;
        let key = self.components.insert(component);
        if let Err(err) = self.attach_component(id, key) {
            self.components.remove(key);
            return Err(err);
        }
        Ok(key)
    }

    /// Default-configured built-in component, attached to `id`.
    pub fn create_component(&mut self, id: EntityId, kind: ComponentType) -> Result<ComponentKey> {
        self.add_component(id, Component::from_type(kind))
    }

    /// Attach an existing detached component to `id`.
    ///
    /// Returns `Ok(false)` when it is already attached to `id`. A component
    /// owned by another entity must be removed from it first.
    pub fn attach_component(&mut self, id: EntityId, key: ComponentKey) -> Result<bool> {
        self.live(id, "attach_component")?;
        let component = self.live_component(key, "attach_component")?;
        match component.owner() {
            Some(owner) if owner == id => return Ok(false),
            Some(_) => return Err(EngineError::ComponentAlreadyOwned { id: component.id() }),
            None => {}
        }
        let component_id = component.id();

        let Scene {
            entities,
            components,
            physics,
            ..
        } = self;
        let Some(component) = components.get_mut(key) else {
            return Err(EngineError::UnknownComponent { op: "attach_component" });
        };
        component.transfer_ownership(Some(id), physics)?;

        let Some(entity) = entities.get_mut(id) else {
            return Err(EngineError::UnknownEntity { op: "attach_component" });
        };
        // after existing components with the same ID
        let at = entity
            .components
            .partition_point(|k| components.get(*k).is_some_and(|c| c.id() <= component_id));
        entity.components.insert(at, key);
        entity.bounds_dirty = true;
        Ok(true)
    }

    /// Detach `key` from `id` without disposing it.
    ///
    /// Returns `Ok(false)` when `id` does not own it.
    pub fn remove_component(&mut self, id: EntityId, key: ComponentKey) -> Result<bool> {
        self.live(id, "remove_component")?;
        if self.live_component(key, "remove_component")?.owner() != Some(id) {
            return Ok(false);
        }
        let Scene {
            entities,
            components,
            physics,
            ..
        } = self;
        if let Some(entity) = entities.get_mut(id) {
            entity.components.retain(|k| *k != key);
            entity.bounds_dirty = true;
        }
        if let Some(component) = components.get_mut(key) {
            component.transfer_ownership(None, physics)?;
        }
        Ok(true)
    }

    /// Detach the first component with `component_id`.
    pub fn remove_component_with_id(
        &mut self,
        id: EntityId,
        component_id: ComponentId,
    ) -> Result<Option<ComponentKey>> {
        let Some(key) = self.component_with_id(id, component_id)? else {
            return Ok(None);
        };
        self.remove_component(id, key)?;
        Ok(Some(key))
    }

    /// Detach every component with `component_id`.
    pub fn remove_components_with_id(
        &mut self,
        id: EntityId,
        component_id: ComponentId,
    ) -> Result<Vec<ComponentKey>> {
        let keys = self.components_with_id(id, component_id)?;
        for key in &keys {
            self.remove_component(id, *key)?;
        }
        Ok(keys)
    }

    pub fn component(&self, key: ComponentKey) -> Result<&Component> {
        self.live_component(key, "component")
    }

    pub fn component_mut(&mut self, key: ComponentKey) -> Result<&mut Component> {
        self.live_component_mut(key, "component_mut")
    }

    pub fn component_count(&self) -> usize {
        self.components.values().filter(|c| !c.is_disposed()).count()
    }

    pub fn set_component_enabled(&mut self, key: ComponentKey, enabled: bool) -> Result<()> {
        self.live_component(key, "set_component_enabled")?;
        let Scene {
            components, physics, ..
        } = self;
        if let Some(component) = components.get_mut(key) {
            component.set_enabled(enabled, physics);
        }
        Ok(())
    }

    /// Flag `key` for disposal on its owner's next component pass.
    pub fn destroy_component(&mut self, key: ComponentKey) -> Result<()> {
        self.live_component_mut(key, "destroy_component")?.destroy();
        Ok(())
    }

    /// Dispose `key` now, detaching it from its owner.
    pub fn dispose_component(&mut self, key: ComponentKey) -> Result<()> {
        let owner = self.live_component(key, "dispose_component")?.owner();
        let Scene {
            entities,
            components,
            physics,
            ..
        } = self;
        if let Some(entity) = owner.and_then(|o| entities.get_mut(o)) {
            entity.components.retain(|k| *k != key);
            entity.bounds_dirty = true;
        }
        if let Some(component) = components.get_mut(key) {
            component.internal_dispose(physics);
        }
        Ok(())
    }

    /// Rigid body behind a physics component; `None` for other kinds.
    pub fn rigid_body(&self, key: ComponentKey) -> Result<Option<&RigidBody>> {
        let component = self.live_component(key, "rigid_body")?;
        match component.as_physics() {
            Some(physics) => Ok(Some(physics.body(&self.physics)?)),
            None => Ok(None),
        }
    }

    pub fn rigid_body_mut(&mut self, key: ComponentKey) -> Result<Option<&mut RigidBody>> {
        self.live_component(key, "rigid_body_mut")?;
        let Scene {
            components, physics, ..
        } = self;
        match components.get_mut(key).and_then(|c| c.as_physics_mut()) {
            Some(component) => Ok(Some(component.body_mut(physics)?)),
            None => Ok(None),
        }
    }

    // ==================== FRAME ====================

    /// Advance the scene by `delta` seconds.
    pub fn update(&mut self, delta: f32) -> Result<()> {
        lifecycle::run_frame(self, delta)
    }

    /// Refresh every transform and aggregated bounds without running hooks.
    pub fn refresh_transforms(&mut self) {
        propagate_transforms(self);
    }

    /// Draw visible entities. Returns the number of component draws.
    pub fn draw(&self, renderer: &mut dyn Renderer, view: &dyn ViewProvider) -> usize {
        render_pass(self, renderer, view)
    }

    /// Drop tombstones of disposed entities and components. Returns how many
    /// were removed; their handles report `Unknown*` afterwards.
    pub fn collect_garbage(&mut self) -> usize {
        let before = self.entities.len() + self.components.len();
        self.entities.retain(|_, e| !e.disposed);
        self.components.retain(|_, c| !c.is_disposed());
        let removed = before - self.entities.len() - self.components.len();
        if removed > 0 {
            debug!("collected {} disposed entries", removed);
        }
        removed
    }

    /// Dispose every root (and so every attached entity) and clear physics.
    pub fn dispose(&mut self) -> Result<()> {
        let roots = self.roots.clone();
        for root in roots {
            if self.is_alive(root) {
                lifecycle::dispose_entity(self, root)?;
            }
        }
        self.roots.clear();
        self.physics.clear();
        info!("scene disposed");
        Ok(())
    }
}
