//! Physics registry owned by a scene.
//!
//! [`Physics`] stores every registered [`RigidBody`] together with the entity
//! that owns it, the gravity vector and the fixed time step. The scene calls
//! [`Physics::advance`] once per frame with the frame delta; the registry runs
//! zero or more fixed steps depending on the accumulated time.
//!
//! A step integrates every enabled body, then tests every pair of enabled
//! bodies: [`broad_phase`] first, [`narrow_phase`] for the survivors. Each
//! contact becomes a [`PhysicsEvent`] that the scene drains with
//! [`Physics::drain_events`].
//!
//! # Time step
//!
//! - `time_step > 0`: fixed steps of that length, leftover time carried over.
//! - `time_step == 0`: exactly one step per `advance` call using the frame delta.

use log::{debug, trace, warn};
use serde::Serialize;
use slotmap::{SlotMap, new_key_type};

use crate::components::rigidbody::RigidBody;
use crate::error::{EngineError, Result};
use crate::events::collision::{CollisionEvent, PhysicsEvent, TriggerEvent};
use crate::math::Vec2;
use crate::resources::engineconfig::EngineConfig;
use crate::scene::EntityId;
use crate::systems::collision::{broad_phase, narrow_phase};

new_key_type! {
    /// Handle to a body registered in [`Physics`].
    pub struct BodyId;
}

/// Default fixed step (30 Hz).
pub const DEFAULT_TIME_STEP: f32 = 1.0 / 30.0;

/// Counters for instrumentation. Reset with [`Physics::reset_stats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PhysicsStats {
    pub steps: u64,
    /// Pairs that passed the broad phase.
    pub broad_phase_pairs: u64,
    pub narrow_phase_tests: u64,
    pub contacts: u64,
    pub triggers: u64,
}

#[derive(Debug)]
struct BodyEntry {
    registration: u64,
    owner: Option<EntityId>,
    body: RigidBody,
}

#[derive(Debug)]
pub struct Physics {
    bodies: SlotMap<BodyId, BodyEntry>,
    next_registration: u64,
    gravity: Vec2,
    time_step: f32,
    accumulator: f32,
    events: Vec<PhysicsEvent>,
    stats: PhysicsStats,
}

impl Default for Physics {
    fn default() -> Self {
        Self::new()
    }
}

impl Physics {
    pub fn new() -> Self {
        Self {
            bodies: SlotMap::with_key(),
            next_registration: 0,
            gravity: Vec2::ZERO,
            time_step: DEFAULT_TIME_STEP,
            accumulator: 0.0,
            events: Vec::new(),
            stats: PhysicsStats::default(),
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        let mut physics = Self::new();
        physics.set_gravity(config.gravity());
        physics.set_time_step(config.time_step);
        physics
    }

    pub fn gravity(&self) -> Vec2 {
        self.gravity
    }

    pub fn set_gravity(&mut self, gravity: Vec2) {
        self.gravity = gravity;
    }

    pub fn time_step(&self) -> f32 {
        self.time_step
    }

    /// Negative values are clamped to zero (one step per frame).
    pub fn set_time_step(&mut self, time_step: f32) {
        if time_step < 0.0 || time_step.is_nan() {
            warn!("physics time step {} is negative; using 0", time_step);
            self.time_step = 0.0;
        } else {
            self.time_step = time_step;
        }
        self.accumulator = 0.0;
    }

    /// Time carried over to the next [`advance`](Self::advance).
    pub fn accumulated(&self) -> f32 {
        self.accumulator
    }

    // ==================== REGISTRY ====================

    /// Register a body. `owner` receives trigger and collision callbacks.
    pub fn add_body(&mut self, body: RigidBody, owner: Option<EntityId>) -> BodyId {
        let registration = self.next_registration;
        self.next_registration += 1;
        let id = self.bodies.insert(BodyEntry {
            registration,
            owner,
            body,
        });
        debug!("physics: registered body #{} ({:?})", registration, id);
        id
    }

    pub fn remove_body(&mut self, id: BodyId) -> Result<RigidBody> {
        let entry = self.bodies.remove(id).ok_or(EngineError::UnknownBody)?;
        debug!("physics: removed body #{}", entry.registration);
        Ok(entry.body)
    }

    pub fn contains(&self, id: BodyId) -> bool {
        self.bodies.contains_key(id)
    }

    pub fn body(&self, id: BodyId) -> Result<&RigidBody> {
        self.bodies
            .get(id)
            .map(|e| &e.body)
            .ok_or(EngineError::UnknownBody)
    }

    pub fn body_mut(&mut self, id: BodyId) -> Result<&mut RigidBody> {
        self.bodies
            .get_mut(id)
            .map(|e| &mut e.body)
            .ok_or(EngineError::UnknownBody)
    }

    pub fn owner(&self, id: BodyId) -> Option<EntityId> {
        self.bodies.get(id).and_then(|e| e.owner)
    }

    /// Monotonic registration number, never reused.
    pub fn registration_id(&self, id: BodyId) -> Option<u64> {
        self.bodies.get(id).map(|e| e.registration)
    }

    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    pub fn body_ids(&self) -> impl Iterator<Item = BodyId> + '_ {
        self.bodies.keys()
    }

    /// Drop every body, pending event and accumulated time.
    pub fn clear(&mut self) {
        self.bodies.clear();
        self.events.clear();
        self.accumulator = 0.0;
    }

    // ==================== SIMULATION ====================

    /// Run as many fixed steps as `frame_delta` (plus carried-over time)
    /// allows. Returns the number of steps run.
    pub fn advance(&mut self, frame_delta: f32) -> u32 {
        if self.time_step <= 0.0 {
            self.step(frame_delta);
            return 1;
        }
        self.accumulator += frame_delta.max(0.0);
        let mut steps = 0;
        while self.accumulator >= self.time_step {
            self.step(self.time_step);
            self.accumulator -= self.time_step;
            steps += 1;
        }
        steps
    }

    /// Integrate all enabled bodies by `dt` and detect contacts.
    pub fn step(&mut self, dt: f32) {
        let gravity = self.gravity;
        for entry in self.bodies.values_mut() {
            if entry.body.is_enabled() {
                entry.body.integrate(dt, gravity);
            }
        }
        self.detect_contacts();
        self.stats.steps += 1;
    }

    fn detect_contacts(&mut self) {
        let ids: Vec<BodyId> = self
            .bodies
            .iter()
            .filter(|(_, e)| e.body.is_enabled())
            .map(|(id, _)| id)
            .collect();

        let (mut pairs, mut tests) = (0u64, 0u64);
        for (i, &a) in ids.iter().enumerate() {
            for &b in &ids[i + 1..] {
                let (ea, eb) = (&self.bodies[a], &self.bodies[b]);
                if !broad_phase(&ea.body, &eb.body) {
                    continue;
                }
                pairs += 1;
                tests += 1;
                let Some(contact) = narrow_phase(&ea.body, &eb.body) else {
                    continue;
                };
                let trigger = ea.body.collider().is_some_and(|c| c.is_trigger())
                    || eb.body.collider().is_some_and(|c| c.is_trigger());
                let (owner_a, owner_b) = (ea.owner, eb.owner);
                if trigger {
                    self.stats.triggers += 1;
                    self.events.push(PhysicsEvent::Trigger(TriggerEvent {
                        a,
                        b,
                        owner_a,
                        owner_b,
                    }));
                } else {
                    self.stats.contacts += 1;
                    self.events.push(PhysicsEvent::Collision(CollisionEvent {
                        a,
                        b,
                        owner_a,
                        owner_b,
                        contact,
                    }));
                }
            }
        }
        self.stats.broad_phase_pairs += pairs;
        self.stats.narrow_phase_tests += tests;
        trace!(
            "physics step: {} bodies, {} broad-phase pairs, {} narrow-phase tests",
            ids.len(),
            pairs,
            tests
        );
    }

    /// Take the events produced since the last drain.
    pub fn drain_events(&mut self) -> Vec<PhysicsEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn stats(&self) -> PhysicsStats {
        self.stats
    }

    pub fn reset_stats(&mut self) {
        self.stats = PhysicsStats::default();
    }
}
