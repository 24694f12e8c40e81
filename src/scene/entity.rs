//! Entity record and user behaviour hooks.
//!
//! An [`Entity`] is a node of the scene tree. It owns exactly one
//! [`Transform`] (which carries the parent/child links), the handles of its
//! components sorted by component ID, lifecycle flags, and the cached local
//! and global bounds aggregated from its components and children.
//!
//! # Lifecycle
//!
//! ```text
//! created -> started (first update) -> active -> destroy pending -> disposed
//! ```
//!
//! Disposed entities stay in the scene table as tombstones so stale handles
//! report [`EntityDisposed`](crate::error::EngineError::EntityDisposed) until
//! [`Scene::collect_garbage`] drops them.

use std::any::Any;

use serde::Serialize;

use crate::components::bounds::Bounds;
use crate::components::transform::Transform;
use crate::error::Result;
use crate::events::collision::Contact;
use crate::scene::{ComponentKey, EntityId, Scene};

/// Per-entity game logic. Every hook defaults to a no-op.
///
/// Hooks receive the whole scene plus the handle of the entity they belong
/// to. While a hook runs the behaviour is taken out of its entity, so
/// `scene.behavior::<T>(me)` returns `None` from inside its own hooks.
pub trait EntityBehavior: Any {
    /// Runs once, before the first `update` or `late_update`.
    fn start(&mut self, _scene: &mut Scene, _me: EntityId) -> Result<()> {
        Ok(())
    }

    fn update(&mut self, _scene: &mut Scene, _me: EntityId, _delta: f32) -> Result<()> {
        Ok(())
    }

    fn late_update(&mut self, _scene: &mut Scene, _me: EntityId, _delta: f32) -> Result<()> {
        Ok(())
    }

    /// Runs during disposal, after children and components are gone.
    fn on_destroy(&mut self, _scene: &mut Scene, _me: EntityId) -> Result<()> {
        Ok(())
    }

    /// A trigger collider of this entity (or the other one) overlaps.
    fn on_trigger(&mut self, _scene: &mut Scene, _me: EntityId, _other: Option<EntityId>) -> Result<()> {
        Ok(())
    }

    /// Two solid colliders overlap. `contact.normal` points away from `me`.
    fn on_collision(
        &mut self,
        _scene: &mut Scene,
        _me: EntityId,
        _other: Option<EntityId>,
        _contact: Contact,
    ) -> Result<()> {
        Ok(())
    }

    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Where an entity is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EntityState {
    Created,
    Active,
    DestroyPending,
    Disposed,
}

pub struct Entity {
    pub(crate) tag: String,
    pub(crate) transform: Transform,
    /// Sorted ascending by component ID; equal IDs keep insertion order.
    pub(crate) components: Vec<ComponentKey>,
    pub(crate) enabled: bool,
    pub(crate) initialised: bool,
    pub(crate) destroy_pending: bool,
    pub(crate) disposed: bool,
    pub(crate) local_bounds: Bounds,
    pub(crate) global_bounds: Bounds,
    pub(crate) bounds_dirty: bool,
    pub(crate) behavior: Option<Box<dyn EntityBehavior>>,
}

impl Entity {
    pub(crate) fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            transform: Transform::new(),
            components: Vec::new(),
            enabled: true,
            initialised: false,
            destroy_pending: false,
            disposed: false,
            local_bounds: Bounds::default(),
            global_bounds: Bounds::default(),
            bounds_dirty: true,
            behavior: None,
        }
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    pub fn components(&self) -> &[ComponentKey] {
        &self.components
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn is_initialised(&self) -> bool {
        self.initialised
    }

    pub fn is_destroy_pending(&self) -> bool {
        self.destroy_pending
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    pub fn state(&self) -> EntityState {
        if self.disposed {
            EntityState::Disposed
        } else if self.destroy_pending {
            EntityState::DestroyPending
        } else if self.initialised {
            EntityState::Active
        } else {
            EntityState::Created
        }
    }

    /// Aggregate bounds in the entity's local space.
    pub fn local_bounds(&self) -> &Bounds {
        &self.local_bounds
    }

    /// Aggregate bounds in world space, as of the last transform refresh.
    pub fn global_bounds(&self) -> &Bounds {
        &self.global_bounds
    }

    pub fn has_behavior(&self) -> bool {
        self.behavior.is_some()
    }
}

impl std::fmt::Debug for Entity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Entity")
            .field("tag", &self.tag)
            .field("state", &self.state())
            .field("enabled", &self.enabled)
            .field("components", &self.components.len())
            .field("children", &self.transform.children().len())
            .finish()
    }
}
