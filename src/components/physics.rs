//! Rigid-body component.
//!
//! Binds an entity to a [`RigidBody`] registered in the scene's [`Physics`]
//! registry. The body lives in the registry while the component is attached;
//! detached components hold the body themselves so settings survive moving
//! the component between entities.
//!
//! Every frame:
//! - `update` pushes the owner's global position and rotation into the body,
//! - the physics step integrates and detects contacts,
//! - `late_update` pulls the integrated position and rotation back into the
//!   owner's transform.

use std::any::Any;

use log::warn;

use crate::components::bounds::Bounds;
use crate::components::component::{ComponentBehavior, ComponentContext};
use crate::components::rigidbody::RigidBody;
use crate::components::transform::Transform;
use crate::error::Result;
use crate::resources::physics::{BodyId, Physics};
use crate::scene::EntityId;

#[derive(Debug)]
enum BodySlot {
    Detached(Box<RigidBody>),
    Registered(BodyId),
}

#[derive(Debug)]
pub struct PhysicsComponent {
    slot: BodySlot,
    /// Collider bounds as of the last hook that could read the registry.
    cached_bounds: Option<Bounds>,
}

impl Default for PhysicsComponent {
    fn default() -> Self {
        Self::new()
    }
}

impl PhysicsComponent {
    pub fn new() -> Self {
        Self::with_body(RigidBody::new())
    }

    pub fn with_body(body: RigidBody) -> Self {
        Self {
            slot: BodySlot::Detached(Box::new(body)),
            cached_bounds: None,
        }
    }

    /// Registry handle while attached.
    pub fn body_id(&self) -> Option<BodyId> {
        match self.slot {
            BodySlot::Registered(id) => Some(id),
            BodySlot::Detached(_) => None,
        }
    }

    pub fn body<'a>(&'a self, physics: &'a Physics) -> Result<&'a RigidBody> {
        match &self.slot {
            BodySlot::Detached(body) => Ok(body.as_ref()),
            BodySlot::Registered(id) => physics.body(*id),
        }
    }

    pub fn body_mut<'a>(&'a mut self, physics: &'a mut Physics) -> Result<&'a mut RigidBody> {
        match &mut self.slot {
            BodySlot::Detached(body) => Ok(body.as_mut()),
            BodySlot::Registered(id) => physics.body_mut(*id),
        }
    }

    fn release(&mut self, physics: &mut Physics) {
        let BodySlot::Registered(id) = self.slot else {
            return;
        };
        match physics.remove_body(id) {
            Ok(body) => self.slot = BodySlot::Detached(Box::new(body)),
            Err(_) => {
                warn!("physics body vanished from the registry; resetting to defaults");
                self.slot = BodySlot::Detached(Box::new(RigidBody::new()));
            }
        }
    }
}

impl ComponentBehavior for PhysicsComponent {
    fn update(&mut self, ctx: &mut ComponentContext<'_>) -> Result<()> {
        let body = self.body_mut(ctx.physics)?;
        body.set_position(ctx.transform.position());
        body.set_rotation(ctx.transform.rotation());
        let bounds = collider_bounds(body);
        self.cached_bounds = bounds;
        Ok(())
    }

    fn late_update(&mut self, ctx: &mut ComponentContext<'_>) -> Result<()> {
        let body = self.body(ctx.physics)?;
        let (position, rotation) = (body.position(), body.rotation());
        let bounds = collider_bounds(body);
        self.cached_bounds = bounds;
        ctx.transform.set_position(position)?;
        ctx.transform.set_rotation(rotation)?;
        Ok(())
    }

    fn update_bounds(&mut self, bounds: &mut Bounds, _owner: &Transform) -> bool {
        let refit = match &self.slot {
            BodySlot::Detached(body) => collider_bounds(body),
            BodySlot::Registered(_) => self.cached_bounds,
        }
        .unwrap_or_default();
        if refit == *bounds {
            return false;
        }
        *bounds = refit;
        true
    }

    fn on_attach(&mut self, owner: EntityId, physics: &mut Physics) -> Result<()> {
        self.release(physics);
        let slot = std::mem::replace(&mut self.slot, BodySlot::Detached(Box::default()));
        if let BodySlot::Detached(body) = slot {
            self.cached_bounds = collider_bounds(&body);
            self.slot = BodySlot::Registered(physics.add_body(*body, Some(owner)));
        }
        Ok(())
    }

    fn on_detach(&mut self, physics: &mut Physics) {
        self.release(physics);
    }

    fn on_enabled(&mut self, enabled: bool, physics: &mut Physics) {
        if let Ok(body) = self.body_mut(physics) {
            body.set_enabled(enabled);
        }
    }

    fn dispose(&mut self, physics: &mut Physics) {
        self.release(physics);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Collider bounds in body space, offset included.
fn collider_bounds(body: &RigidBody) -> Option<Bounds> {
    body.collider().map(|c| {
        let local = c.local_bounds();
        Bounds {
            min: local.min + c.offset(),
            max: local.max + c.offset(),
        }
    })
}
