//! Simulated point mass with an optional collider.
//!
//! The [`RigidBody`] stores position, rotation, linear and angular velocity
//! and the acceleration accumulated since the last step. Bodies live in the
//! [`Physics`](crate::resources::physics::Physics) registry, which integrates
//! them once per fixed step.
//!
//! Integration per step (non-kinematic bodies):
//!
//! ```text
//! acc += -vel * drag + gravity
//! vel += acc * dt
//! pos += vel * dt
//! ```
//!
//! and the same pattern for the angular terms. Kinematic bodies skip forces,
//! gravity and drag but still move by their velocity. After integrating, the
//! global bounds are refit from the collider and the accumulators reset.

use log::warn;

use crate::components::bounds::Bounds;
use crate::components::collider::Collider;
use crate::error::{EngineError, Result};
use crate::math::{Vec2, clean_rotation};

/// How [`RigidBody::add_force`] treats its argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ForceMode {
    /// Accumulated as acceleration (scaled by inverse mass); effect scales with `dt`.
    #[default]
    Force,
    /// Added straight to velocity; independent of `dt` and mass.
    Impulse,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RigidBody {
    position: Vec2,
    rotation: f32,
    velocity: Vec2,
    angular_velocity: f32,
    acceleration: Vec2,
    angular_acceleration: f32,
    mass: f32,
    inv_mass: f32,
    drag: f32,
    angular_drag: f32,
    enabled: bool,
    kinematic: bool,
    collider: Option<Collider>,
    global_bounds: Option<Bounds>,
}

impl Default for RigidBody {
    fn default() -> Self {
        Self::new()
    }
}

impl RigidBody {
    /// Unit mass at the origin with light drag and no collider.
    pub fn new() -> Self {
        Self {
            position: Vec2::ZERO,
            rotation: 0.0,
            velocity: Vec2::ZERO,
            angular_velocity: 0.0,
            acceleration: Vec2::ZERO,
            angular_acceleration: 0.0,
            mass: 1.0,
            inv_mass: 1.0,
            drag: 0.1,
            angular_drag: 0.05,
            enabled: true,
            kinematic: false,
            collider: None,
            global_bounds: None,
        }
    }

    /// Builder-style collider.
    pub fn with_collider(mut self, collider: Collider) -> Self {
        self.set_collider(Some(collider));
        self
    }

    /// Builder-style drag for both linear and angular terms.
    pub fn with_drag(mut self, drag: f32, angular_drag: f32) -> Self {
        self.set_drag(drag);
        self.set_angular_drag(angular_drag);
        self
    }

    pub fn with_position(mut self, position: Vec2) -> Self {
        self.set_position(position);
        self
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn set_position(&mut self, position: Vec2) {
        self.position = position;
        self.refresh_bounds();
    }

    /// Rotation in degrees, wrapped into `[0, 360)`.
    pub fn rotation(&self) -> f32 {
        self.rotation
    }

    pub fn set_rotation(&mut self, degrees: f32) {
        self.rotation = clean_rotation(degrees);
    }

    pub fn velocity(&self) -> Vec2 {
        self.velocity
    }

    pub fn set_velocity(&mut self, velocity: Vec2) {
        self.velocity = velocity;
    }

    /// Degrees per second.
    pub fn angular_velocity(&self) -> f32 {
        self.angular_velocity
    }

    pub fn set_angular_velocity(&mut self, degrees_per_second: f32) {
        self.angular_velocity = degrees_per_second;
    }

    pub fn mass(&self) -> f32 {
        self.mass
    }

    pub fn inverse_mass(&self) -> f32 {
        self.inv_mass
    }

    /// Mass must be finite and greater than zero.
    pub fn set_mass(&mut self, mass: f32) -> Result<()> {
        if !(mass.is_finite() && mass > 0.0) {
            return Err(EngineError::InvalidMass(mass));
        }
        self.mass = mass;
        self.inv_mass = 1.0 / mass;
        Ok(())
    }

    pub fn drag(&self) -> f32 {
        self.drag
    }

    /// Drag scale in `[0, 1]`; values outside are clamped.
    pub fn set_drag(&mut self, drag: f32) {
        self.drag = clamp_unit("drag", drag);
    }

    pub fn angular_drag(&self) -> f32 {
        self.angular_drag
    }

    pub fn set_angular_drag(&mut self, drag: f32) {
        self.angular_drag = clamp_unit("angular drag", drag);
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn is_kinematic(&self) -> bool {
        self.kinematic
    }

    pub fn set_kinematic(&mut self, kinematic: bool) {
        self.kinematic = kinematic;
    }

    pub fn collider(&self) -> Option<&Collider> {
        self.collider.as_ref()
    }

    /// Mutable collider access. Global bounds catch up on the next step.
    pub fn collider_mut(&mut self) -> Option<&mut Collider> {
        self.collider.as_mut()
    }

    /// Replace (or remove with `None`) the collider.
    pub fn set_collider(&mut self, collider: Option<Collider>) {
        self.collider = collider;
        self.refresh_bounds();
    }

    /// World-space bounds of the collider, `None` without one.
    pub fn global_bounds(&self) -> Option<&Bounds> {
        self.global_bounds.as_ref()
    }

    /// Acceleration queued for the next step.
    pub fn pending_acceleration(&self) -> Vec2 {
        self.acceleration
    }

    pub fn add_force(&mut self, force: Vec2, mode: ForceMode) {
        match mode {
            ForceMode::Force => self.acceleration += force * self.inv_mass,
            ForceMode::Impulse => self.velocity += force,
        }
    }

    pub fn add_torque(&mut self, torque: f32, mode: ForceMode) {
        match mode {
            ForceMode::Force => self.angular_acceleration += torque * self.inv_mass,
            ForceMode::Impulse => self.angular_velocity += torque,
        }
    }

    /// Set speed while keeping the current direction. No-op for a body at rest.
    pub fn set_speed(&mut self, speed: f32) {
        if self.velocity.length_squared() > 0.0 {
            self.velocity = self.velocity.normalize() * speed;
        } else {
            warn!("RigidBody::set_speed called with zero velocity - operation ignored");
        }
    }

    /// Advance one step of `dt` seconds.
    pub(crate) fn integrate(&mut self, dt: f32, gravity: Vec2) {
        if self.kinematic {
            self.acceleration = Vec2::ZERO;
            self.angular_acceleration = 0.0;
        } else {
            self.acceleration += -self.velocity * self.drag + gravity;
            self.angular_acceleration += -self.angular_velocity * self.angular_drag;
        }

        self.velocity += self.acceleration * dt;
        self.angular_velocity += self.angular_acceleration * dt;

        self.position += self.velocity * dt;
        self.rotation = clean_rotation(self.rotation + self.angular_velocity * dt);

        self.refresh_bounds();

        self.acceleration = Vec2::ZERO;
        self.angular_acceleration = 0.0;
    }

    fn refresh_bounds(&mut self) {
        self.global_bounds = self
            .collider
            .as_ref()
            .map(|c| c.world_bounds(self.position));
    }
}

fn clamp_unit(what: &str, value: f32) -> f32 {
    let clamped = if value.is_nan() { 0.0 } else { value.clamp(0.0, 1.0) };
    if clamped != value {
        warn!("{} {} is outside [0, 1]; clamped to {}", what, value, clamped);
    }
    clamped
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 1e-5;

    fn approx_eq(a: f32, b: f32) -> bool {
        (a - b).abs() < EPSILON
    }

    fn vec_approx_eq(a: Vec2, b: Vec2) -> bool {
        approx_eq(a.x, b.x) && approx_eq(a.y, b.y)
    }

    fn frictionless() -> RigidBody {
        RigidBody::new().with_drag(0.0, 0.0)
    }

    // ==================== CONSTRUCTOR TESTS ====================

    #[test]
    fn test_rigidbody_new() {
        let rb = RigidBody::new();
        assert!(vec_approx_eq(rb.velocity(), Vec2::ZERO));
        assert!(approx_eq(rb.mass(), 1.0));
        assert!(approx_eq(rb.drag(), 0.1));
        assert!(approx_eq(rb.angular_drag(), 0.05));
        assert!(rb.is_enabled());
        assert!(!rb.is_kinematic());
        assert!(rb.global_bounds().is_none());
    }

    // ==================== MASS AND DRAG TESTS ====================

    #[test]
    fn test_set_mass_rejects_non_positive() {
        let mut rb = RigidBody::new();
        assert_eq!(rb.set_mass(0.0), Err(EngineError::InvalidMass(0.0)));
        assert!(rb.set_mass(-1.0).is_err());
        assert!(rb.set_mass(f32::NAN).is_err());
        rb.set_mass(4.0).unwrap();
        assert!(approx_eq(rb.inverse_mass(), 0.25));
    }

    #[test]
    fn test_drag_is_clamped() {
        let mut rb = RigidBody::new();
        rb.set_drag(2.0);
        assert!(approx_eq(rb.drag(), 1.0));
        rb.set_angular_drag(-0.5);
        assert!(approx_eq(rb.angular_drag(), 0.0));
    }

    // ==================== FORCE TESTS ====================

    #[test]
    fn test_impulse_is_dt_independent() {
        let mut rb = frictionless();
        rb.add_force(Vec2::new(3.0, -1.0), ForceMode::Impulse);
        rb.integrate(0.5, Vec2::ZERO);
        assert!(vec_approx_eq(rb.velocity(), Vec2::new(3.0, -1.0)));
        assert!(vec_approx_eq(rb.position(), Vec2::new(1.5, -0.5)));
    }

    #[test]
    fn test_force_scales_with_dt() {
        let mut rb = frictionless();
        rb.add_force(Vec2::new(4.0, 0.0), ForceMode::Force);
        rb.integrate(0.25, Vec2::ZERO);
        assert!(vec_approx_eq(rb.velocity(), Vec2::new(1.0, 0.0)));
    }

    #[test]
    fn test_force_scaled_by_inverse_mass() {
        let mut rb = frictionless();
        rb.set_mass(2.0).unwrap();
        rb.add_force(Vec2::new(4.0, 0.0), ForceMode::Force);
        rb.integrate(1.0, Vec2::ZERO);
        assert!(vec_approx_eq(rb.velocity(), Vec2::new(2.0, 0.0)));
    }

    #[test]
    fn test_accumulators_reset_after_step() {
        let mut rb = frictionless();
        rb.add_force(Vec2::new(1.0, 0.0), ForceMode::Force);
        rb.add_torque(10.0, ForceMode::Force);
        rb.integrate(1.0, Vec2::ZERO);
        assert!(vec_approx_eq(rb.pending_acceleration(), Vec2::ZERO));
        let v = rb.velocity();
        let w = rb.angular_velocity();
        rb.integrate(1.0, Vec2::ZERO);
        assert!(vec_approx_eq(rb.velocity(), v));
        assert!(approx_eq(rb.angular_velocity(), w));
    }

    #[test]
    fn test_torque_impulse_rotates() {
        let mut rb = frictionless();
        rb.add_torque(90.0, ForceMode::Impulse);
        rb.integrate(1.0, Vec2::ZERO);
        assert!(approx_eq(rb.rotation(), 90.0));
        rb.integrate(3.0, Vec2::ZERO);
        assert!(approx_eq(rb.rotation(), 0.0));
    }

    #[test]
    fn test_drag_opposes_velocity() {
        let mut rb = RigidBody::new().with_drag(0.5, 0.0);
        rb.set_velocity(Vec2::new(10.0, 0.0));
        rb.integrate(1.0, Vec2::ZERO);
        assert!(approx_eq(rb.velocity().x, 5.0));
    }

    #[test]
    fn test_gravity_applies() {
        let mut rb = frictionless();
        rb.integrate(0.5, Vec2::new(0.0, -10.0));
        assert!(vec_approx_eq(rb.velocity(), Vec2::new(0.0, -5.0)));
    }

    // ==================== KINEMATIC TESTS ====================

    #[test]
    fn test_kinematic_ignores_forces_but_moves() {
        let mut rb = RigidBody::new();
        rb.set_kinematic(true);
        rb.set_velocity(Vec2::new(2.0, 0.0));
        rb.add_force(Vec2::new(100.0, 0.0), ForceMode::Force);
        rb.integrate(1.0, Vec2::new(0.0, -10.0));
        assert!(vec_approx_eq(rb.velocity(), Vec2::new(2.0, 0.0)));
        assert!(vec_approx_eq(rb.position(), Vec2::new(2.0, 0.0)));
    }

    // ==================== BOUNDS TESTS ====================

    #[test]
    fn test_bounds_follow_position() {
        let mut rb = frictionless().with_collider(Collider::circle(1.0));
        rb.set_velocity(Vec2::new(1.0, 0.0));
        rb.integrate(2.0, Vec2::ZERO);
        let b = rb.global_bounds().unwrap();
        assert!(vec_approx_eq(b.min, Vec2::new(1.0, -1.0)));
        assert!(vec_approx_eq(b.max, Vec2::new(3.0, 1.0)));
    }

    #[test]
    fn test_removing_collider_clears_bounds() {
        let mut rb = RigidBody::new().with_collider(Collider::circle(1.0));
        assert!(rb.global_bounds().is_some());
        rb.set_collider(None);
        assert!(rb.global_bounds().is_none());
    }

    // ==================== SET SPEED TESTS ====================

    #[test]
    fn test_set_speed_maintains_direction() {
        let mut rb = RigidBody::new();
        rb.set_velocity(Vec2::new(3.0, 4.0));
        rb.set_speed(10.0);
        assert!(vec_approx_eq(rb.velocity(), Vec2::new(6.0, 8.0)));
    }

    #[test]
    fn test_set_speed_with_zero_velocity() {
        let mut rb = RigidBody::new();
        rb.set_speed(10.0);
        assert!(vec_approx_eq(rb.velocity(), Vec2::ZERO));
    }
}
