//! Collision event types.
//!
//! The physics step emits one [`PhysicsEvent`] per overlapping collider pair
//! that survives the narrow phase. The scene drains them after stepping and
//! routes each one to the `on_trigger` / `on_collision` hooks of both owners.
//!
//! If either collider of a pair is a trigger the pair produces a
//! [`TriggerEvent`]; otherwise it produces a [`CollisionEvent`]. Neither
//! changes body velocity or position: contact resolution is left to the
//! owners' hooks.

use serde::Serialize;

use crate::math::Vec2;
use crate::resources::physics::BodyId;
use crate::scene::EntityId;

/// Narrow-phase result for a pair `(a, b)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Contact {
    /// Unit vector pointing from `a` towards `b`.
    pub normal: Vec2,
    /// Penetration depth along `normal`, always positive.
    pub depth: f32,
}

impl Contact {
    /// The same contact seen from `b`.
    pub fn flipped(self) -> Self {
        Self {
            normal: -self.normal,
            depth: self.depth,
        }
    }
}

/// Two overlapping bodies where at least one collider is a trigger.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TriggerEvent {
    pub a: BodyId,
    pub b: BodyId,
    pub owner_a: Option<EntityId>,
    pub owner_b: Option<EntityId>,
}

/// Two overlapping solid bodies.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CollisionEvent {
    pub a: BodyId,
    pub b: BodyId,
    pub owner_a: Option<EntityId>,
    pub owner_b: Option<EntityId>,
    pub contact: Contact,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PhysicsEvent {
    Trigger(TriggerEvent),
    Collision(CollisionEvent),
}
