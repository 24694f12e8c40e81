//! Component base: identity, ownership, lifecycle flags and hook dispatch.
//!
//! A [`Component`] is a unit of behaviour attached to one entity at a time.
//! The concrete behaviour is a closed set of variants ([`ComponentKind`]):
//! the three built-ins plus `Custom` for user types. All variants implement
//! the small [`ComponentBehavior`] capability trait whose hooks default to
//! no-ops, so a component only implements what it needs.
//!
//! # IDs
//!
//! Each component carries a type ID. Built-ins use negative IDs
//! ([`SHAPE_ID`], [`PHYSICS_ID`], [`PARTICLES_ID`]); custom components must
//! use IDs `>= 0`. An entity keeps its components sorted by ID so that
//! searching by ID can stop early.
//!
//! # Lifecycle
//!
//! - [`Component::destroy`] only flags the component; the owning entity
//!   disposes it during its next component-update pass.
//! - Disposal runs the `dispose` hook, clears the owner and marks the
//!   component disposed. Any later use through the scene is an error.

use std::any::Any;

use crate::components::bounds::Bounds;
use crate::components::particle::ParticleComponent;
use crate::components::physics::PhysicsComponent;
use crate::components::shape::ShapeComponent;
use crate::components::transform::Transform;
use crate::error::{EngineError, Result};
use crate::math::Mat3;
use crate::resources::physics::Physics;
use crate::scene::EntityId;
use crate::systems::render::Renderer;

/// Type identifier of a component.
pub type ComponentId = i32;

pub const SHAPE_ID: ComponentId = -1;
pub const PHYSICS_ID: ComponentId = -2;
pub const PARTICLES_ID: ComponentId = -3;

/// Built-in component types that can be created by type token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentType {
    Shape,
    Physics,
    Particles,
}

impl ComponentType {
    pub fn id(self) -> ComponentId {
        match self {
            ComponentType::Shape => SHAPE_ID,
            ComponentType::Physics => PHYSICS_ID,
            ComponentType::Particles => PARTICLES_ID,
        }
    }
}

/// Everything an update hook may touch: the owner's transform, the physics
/// registry of the scene and the frame delta.
pub struct ComponentContext<'a> {
    pub owner: EntityId,
    pub transform: &'a mut Transform,
    pub physics: &'a mut Physics,
    pub delta: f32,
}

/// Hooks a component can implement. All default to no-ops.
pub trait ComponentBehavior: Any {
    /// Called once per frame while the component is enabled.
    fn update(&mut self, _ctx: &mut ComponentContext<'_>) -> Result<()> {
        Ok(())
    }

    /// Called after the physics step, once per frame while enabled.
    fn late_update(&mut self, _ctx: &mut ComponentContext<'_>) -> Result<()> {
        Ok(())
    }

    /// Refit `bounds` (owner-local space). Return true when it changed.
    fn update_bounds(&mut self, _bounds: &mut Bounds, _owner: &Transform) -> bool {
        false
    }

    /// Draw with the combined projection * view * world matrix of the owner.
    fn draw(&self, _renderer: &mut dyn Renderer, _proj_world_view: Mat3, _owner: &Transform) {}

    /// The component was attached to `owner`.
    fn on_attach(&mut self, _owner: EntityId, _physics: &mut Physics) -> Result<()> {
        Ok(())
    }

    /// The component was detached from its owner (not disposed).
    fn on_detach(&mut self, _physics: &mut Physics) {}

    /// The enabled flag changed.
    fn on_enabled(&mut self, _enabled: bool, _physics: &mut Physics) {}

    /// Release resources before the component is marked disposed.
    fn dispose(&mut self, _physics: &mut Physics) {}

    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// The closed set of component variants.
pub enum ComponentKind {
    Shape(ShapeComponent),
    Physics(PhysicsComponent),
    Particles(ParticleComponent),
    Custom(Box<dyn ComponentBehavior>),
}

impl ComponentKind {
    fn behavior(&self) -> &dyn ComponentBehavior {
        match self {
            ComponentKind::Shape(c) => c,
            ComponentKind::Physics(c) => c,
            ComponentKind::Particles(c) => c,
            ComponentKind::Custom(c) => c.as_ref(),
        }
    }

    fn behavior_mut(&mut self) -> &mut dyn ComponentBehavior {
        match self {
            ComponentKind::Shape(c) => c,
            ComponentKind::Physics(c) => c,
            ComponentKind::Particles(c) => c,
            ComponentKind::Custom(c) => c.as_mut(),
        }
    }
}

impl std::fmt::Debug for ComponentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ComponentKind::Shape(_) => "Shape",
            ComponentKind::Physics(_) => "Physics",
            ComponentKind::Particles(_) => "Particles",
            ComponentKind::Custom(_) => "Custom",
        };
        f.write_str(name)
    }
}

#[derive(Debug)]
pub struct Component {
    id: ComponentId,
    owner: Option<EntityId>,
    local_bounds: Bounds,
    enabled: bool,
    destroy: bool,
    disposed: bool,
    kind: ComponentKind,
}

impl Component {
    fn with_kind(id: ComponentId, kind: ComponentKind) -> Self {
        Self {
            id,
            owner: None,
            local_bounds: Bounds::default(),
            enabled: true,
            destroy: false,
            disposed: false,
            kind,
        }
    }

    pub fn shape(shape: ShapeComponent) -> Self {
        Self::with_kind(SHAPE_ID, ComponentKind::Shape(shape))
    }

    pub fn physics(physics: PhysicsComponent) -> Self {
        Self::with_kind(PHYSICS_ID, ComponentKind::Physics(physics))
    }

    pub fn particles(particles: ParticleComponent) -> Self {
        Self::with_kind(PARTICLES_ID, ComponentKind::Particles(particles))
    }

    /// Wrap a user behaviour. `id` must be `>= 0`.
    pub fn custom(id: ComponentId, behavior: impl ComponentBehavior) -> Result<Self> {
        if id < 0 {
            return Err(EngineError::ReservedComponentId { id });
        }
        Ok(Self::with_kind(id, ComponentKind::Custom(Box::new(behavior))))
    }

    /// Default-configured built-in component.
    pub fn from_type(kind: ComponentType) -> Self {
        match kind {
            ComponentType::Shape => Self::shape(ShapeComponent::new()),
            ComponentType::Physics => Self::physics(PhysicsComponent::new()),
            ComponentType::Particles => Self::particles(ParticleComponent::new()),
        }
    }

    pub fn id(&self) -> ComponentId {
        self.id
    }

    pub fn owner(&self) -> Option<EntityId> {
        self.owner
    }

    /// Bounds in the owner's local space.
    pub fn local_bounds(&self) -> &Bounds {
        &self.local_bounds
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn is_destroy_pending(&self) -> bool {
        self.destroy
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Flag for disposal on the owner's next component-update pass.
    pub fn destroy(&mut self) {
        self.destroy = true;
    }

    pub fn kind(&self) -> &ComponentKind {
        &self.kind
    }

    pub fn as_shape(&self) -> Option<&ShapeComponent> {
        match &self.kind {
            ComponentKind::Shape(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_shape_mut(&mut self) -> Option<&mut ShapeComponent> {
        match &mut self.kind {
            ComponentKind::Shape(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_physics(&self) -> Option<&PhysicsComponent> {
        match &self.kind {
            ComponentKind::Physics(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_physics_mut(&mut self) -> Option<&mut PhysicsComponent> {
        match &mut self.kind {
            ComponentKind::Physics(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_particles(&self) -> Option<&ParticleComponent> {
        match &self.kind {
            ComponentKind::Particles(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_particles_mut(&mut self) -> Option<&mut ParticleComponent> {
        match &mut self.kind {
            ComponentKind::Particles(c) => Some(c),
            _ => None,
        }
    }

    /// Borrow a custom behaviour as its concrete type.
    pub fn downcast_ref<T: ComponentBehavior>(&self) -> Option<&T> {
        self.kind.behavior().as_any().downcast_ref::<T>()
    }

    pub fn downcast_mut<T: ComponentBehavior>(&mut self) -> Option<&mut T> {
        self.kind.behavior_mut().as_any_mut().downcast_mut::<T>()
    }

    // ==================== SCENE INTERNALS ====================

    pub(crate) fn set_enabled(&mut self, enabled: bool, physics: &mut Physics) {
        self.enabled = enabled;
        self.kind.behavior_mut().on_enabled(enabled, physics);
    }

    /// Move ownership to `owner` (or detach with `None`).
    pub(crate) fn transfer_ownership(
        &mut self,
        owner: Option<EntityId>,
        physics: &mut Physics,
    ) -> Result<()> {
        if self.owner.is_some() {
            self.kind.behavior_mut().on_detach(physics);
        }
        self.owner = owner;
        if let Some(owner) = owner {
            self.kind.behavior_mut().on_attach(owner, physics)?;
        }
        Ok(())
    }

    pub(crate) fn internal_dispose(&mut self, physics: &mut Physics) {
        self.kind.behavior_mut().dispose(physics);
        self.owner = None;
        self.disposed = true;
    }

    pub(crate) fn run_update(&mut self, ctx: &mut ComponentContext<'_>) -> Result<()> {
        self.kind.behavior_mut().update(ctx)
    }

    pub(crate) fn run_late_update(&mut self, ctx: &mut ComponentContext<'_>) -> Result<()> {
        self.kind.behavior_mut().late_update(ctx)
    }

    pub(crate) fn run_update_bounds(&mut self, owner: &Transform) -> bool {
        self.kind
            .behavior_mut()
            .update_bounds(&mut self.local_bounds, owner)
    }

    pub(crate) fn run_draw(&self, renderer: &mut dyn Renderer, proj_world_view: Mat3, owner: &Transform) {
        self.kind.behavior().draw(renderer, proj_world_view, owner);
    }
}
