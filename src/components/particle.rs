//! Particle emitter component.
//!
//! The [`ParticleComponent`] owns a fixed pool of [`Particle`] values and
//! emits them from its owner's position at a configurable rate.
//!
//! # How It Works
//!
//! 1. [`start`](ParticleComponent::start) allocates `maximum` particles and
//!    begins emitting.
//! 2. Each update:
//!    - advances `run_time` progress and stops the emitter when it runs out
//!      (a negative run time runs forever)
//!    - ages every live particle; dead ones are swap-removed to the tail of
//!      the pool
//!    - moves live particles, interpolating size and colour over their life
//!    - emits as many new particles as the elapsed time allows (catch-up)
//! 3. Bounds are a square around the owner reaching the furthest particle.
//!
//! Particles live in world space: moving the owner does not drag particles
//! already emitted.
//!
//! # Emitter types
//!
//! - `Point`: random direction from the owner's position.
//! - `Direction`: along `direction`, rotated by the owner's rotation.
//! - `Line`: like `Direction`, spawned along a segment of `line_length`
//!   perpendicular to `direction`.

use std::any::Any;

use fastrand::Rng;
use log::warn;

use crate::components::bounds::Bounds;
use crate::components::color::Color;
use crate::components::component::{ComponentBehavior, ComponentContext};
use crate::components::transform::Transform;
use crate::error::Result;
use crate::math::{Mat3, Vec2, compose, normalized, right, rotate_degrees, try_inverse};
use crate::systems::render::Renderer;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EmitterType {
    #[default]
    Point,
    Direction,
    Line,
}

/// One pooled particle, in world space.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Particle {
    pub position: Vec2,
    pub velocity: Vec2,
    pub color: Color,
    pub size: f32,
    /// Degrees.
    pub rotation: f32,
    /// Degrees per second.
    pub rotation_speed: f32,
    pub lifetime: f32,
    pub lifespan: f32,
}

#[derive(Debug, Clone)]
pub struct ParticleComponent {
    running: bool,
    kind: EmitterType,
    maximum: usize,
    alive: usize,
    emit_timer: f32,
    /// Seconds between emissions.
    emit_interval: f32,
    direction: Vec2,
    line_length: f32,
    run_time: f32,
    progress: f32,
    min_life: f32,
    max_life: f32,
    min_velocity: f32,
    max_velocity: f32,
    negative_rotation: f32,
    positive_rotation: f32,
    start_size: f32,
    end_size: f32,
    start_color: Color,
    end_color: Color,
    particles: Vec<Particle>,
    furthest: Option<f32>,
    owner_scale: f32,
    rng: Rng,
}

impl Default for ParticleComponent {
    fn default() -> Self {
        Self::new()
    }
}

impl ParticleComponent {
    pub fn new() -> Self {
        Self::with_rng(Rng::new())
    }

    /// Deterministic emitter for reproducible runs.
    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(Rng::with_seed(seed))
    }

    fn with_rng(rng: Rng) -> Self {
        Self {
            running: false,
            kind: EmitterType::Point,
            maximum: 25,
            alive: 0,
            emit_timer: 0.0,
            emit_interval: 1.0 / 25.0,
            direction: Vec2::new(0.0, -1.0),
            line_length: 100.0,
            run_time: -1.0,
            progress: 0.0,
            min_life: 0.0,
            max_life: 5.0,
            min_velocity: 100.0,
            max_velocity: 500.0,
            negative_rotation: -360.0,
            positive_rotation: 360.0,
            start_size: 50.0,
            end_size: 0.0,
            start_color: Color::WHITE,
            end_color: Color::TRANSPARENT,
            particles: Vec::new(),
            furthest: None,
            owner_scale: 1.0,
            rng,
        }
    }

    // ==================== CONTROL ====================

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Fill the pool and begin emitting. No-op while running.
    pub fn start(&mut self) {
        if self.running {
            return;
        }
        self.particles.resize(self.maximum, Particle::default());
        self.alive = self.alive.min(self.maximum);
        self.emit_timer = 0.0;
        self.progress = 0.0;
        self.furthest = None;
        self.running = true;
    }

    /// Stop emitting. With `force` every live particle is dropped too.
    pub fn stop(&mut self, force: bool) {
        self.running = false;
        if force {
            self.particles.clear();
            self.alive = 0;
            self.furthest = None;
        }
    }

    pub fn active_particles(&self) -> usize {
        self.alive
    }

    /// Live particles, in pool order.
    pub fn particles(&self) -> &[Particle] {
        &self.particles[..self.alive]
    }

    // ==================== CONFIGURATION ====================

    pub fn emitter_type(&self) -> EmitterType {
        self.kind
    }

    pub fn set_emitter_type(&mut self, kind: EmitterType) {
        self.kind = kind;
    }

    pub fn maximum(&self) -> usize {
        self.maximum
    }

    /// Pool size. Ignored while the emitter runs.
    pub fn set_maximum(&mut self, maximum: usize) {
        if !self.running {
            self.maximum = maximum;
        }
    }

    /// Particles per second.
    pub fn emit_rate(&self) -> f32 {
        1.0 / self.emit_interval
    }

    /// A non-positive rate stops the emitter. Non-finite rates are ignored.
    pub fn set_emit_rate(&mut self, per_second: f32) {
        if !per_second.is_finite() {
            warn!("ignoring non-finite emit rate {per_second}");
        } else if per_second > 0.0 {
            self.emit_interval = 1.0 / per_second;
        } else {
            self.stop(false);
        }
    }

    pub fn direction(&self) -> Vec2 {
        self.direction
    }

    pub fn set_direction(&mut self, direction: Vec2) {
        self.direction = normalized(direction);
    }

    pub fn line_length(&self) -> f32 {
        self.line_length
    }

    pub fn set_line_length(&mut self, length: f32) {
        self.line_length = length;
    }

    pub fn run_time(&self) -> f32 {
        self.run_time
    }

    /// Seconds to emit for; negative runs forever.
    pub fn set_run_time(&mut self, seconds: f32) {
        self.run_time = seconds;
    }

    pub fn life_range(&self) -> (f32, f32) {
        (self.min_life, self.max_life)
    }

    /// Raising the minimum above the maximum pushes the maximum to `min + 1`.
    pub fn set_min_life(&mut self, value: f32) {
        self.min_life = value;
        if self.max_life < value {
            self.max_life = value + 1.0;
        }
    }

    /// Lowering the maximum below the minimum pulls the minimum to `max - 1`.
    pub fn set_max_life(&mut self, value: f32) {
        self.max_life = value;
        if self.min_life > value {
            self.min_life = value - 1.0;
        }
    }

    pub fn velocity_range(&self) -> (f32, f32) {
        (self.min_velocity, self.max_velocity)
    }

    pub fn set_min_velocity(&mut self, value: f32) {
        self.min_velocity = value;
        if self.max_velocity < value {
            self.max_velocity = value + 1.0;
        }
    }

    pub fn set_max_velocity(&mut self, value: f32) {
        self.max_velocity = value;
        if self.min_velocity > value {
            self.min_velocity = value - 1.0;
        }
    }

    /// Spin range in degrees per second as `(negative, positive)`.
    pub fn rotation_range(&self) -> (f32, f32) {
        (self.negative_rotation, self.positive_rotation)
    }

    /// Clamped to `<= 0`.
    pub fn set_negative_rotation(&mut self, value: f32) {
        self.negative_rotation = value.min(0.0);
    }

    /// Clamped to `>= 0`.
    pub fn set_positive_rotation(&mut self, value: f32) {
        self.positive_rotation = value.max(0.0);
    }

    pub fn size_range(&self) -> (f32, f32) {
        (self.start_size, self.end_size)
    }

    pub fn set_sizes(&mut self, start: f32, end: f32) {
        self.start_size = start;
        self.end_size = end;
    }

    pub fn colors(&self) -> (Color, Color) {
        (self.start_color, self.end_color)
    }

    pub fn set_colors(&mut self, start: Color, end: Color) {
        self.start_color = start;
        self.end_color = end;
    }

    // ==================== SIMULATION ====================

    fn random_between(&mut self, lo: f32, hi: f32) -> f32 {
        self.rng.f32() * (hi - lo) + lo
    }

    /// Emit one particle from `owner`.
    ///
    /// Returns `false` when the pool is full; the emission is dropped, not
    /// queued.
    pub fn emit(&mut self, owner: &Transform) -> bool {
        if self.alive >= self.particles.len() {
            return false;
        }
        let lifespan = self.random_between(self.min_life, self.max_life);
        let spin = self.random_between(self.negative_rotation, self.positive_rotation);
        let speed = self.random_between(self.min_velocity, self.max_velocity);

        let local_origin = match self.kind {
            EmitterType::Point | EmitterType::Direction => Vec2::ZERO,
            EmitterType::Line => {
                let across = right(self.direction);
                let t = self.rng.f32();
                across * (t * self.line_length - self.line_length * 0.5)
            }
        };
        let heading = match self.kind {
            EmitterType::Point => {
                let v = Vec2::new(self.rng.f32() * 2.0 - 1.0, self.rng.f32() * 2.0 - 1.0);
                normalized(v)
            }
            EmitterType::Direction | EmitterType::Line => {
                rotate_degrees(self.direction, owner.rotation())
            }
        };

        self.particles[self.alive] = Particle {
            position: owner.transform_point(local_origin),
            velocity: heading * speed,
            color: self.start_color,
            size: self.start_size * self.owner_scale,
            rotation: 0.0,
            rotation_speed: spin,
            lifetime: 0.0,
            lifespan,
        };
        self.alive += 1;
        true
    }

    /// Advance the emitter by `delta` seconds for an owner at `owner`.
    ///
    /// Emissions owed by the elapsed time that do not fit in the pool are
    /// dropped and the emission timer restarts.
    pub fn simulate(&mut self, owner: &Transform, delta: f32) {
        if self.running && self.run_time >= 0.0 {
            self.progress += delta;
            if self.progress >= self.run_time {
                self.stop(false);
            }
        }

        let scale = owner.scale().abs();
        self.owner_scale = scale.x.max(scale.y);
        let start = self.start_size * self.owner_scale;
        let end = self.end_size * self.owner_scale;
        let center = owner.position();

        let mut furthest: Option<f32> = None;
        let mut i = 0;
        while i < self.alive {
            let p = &mut self.particles[i];
            p.lifetime += delta;
            if p.lifetime > p.lifespan {
                self.particles.swap(i, self.alive - 1);
                self.alive -= 1;
                continue;
            }
            let t = if p.lifespan > 0.0 { p.lifetime / p.lifespan } else { 1.0 };
            p.position += p.velocity * delta;
            p.size = start + (end - start) * t;
            p.color = Color::lerp(self.start_color, self.end_color, t);
            p.rotation += p.rotation_speed * delta;

            let reach = (p.position - center).length() + p.size.abs();
            if furthest.is_none_or(|f| reach > f) {
                furthest = Some(reach);
            }
            i += 1;
        }
        self.furthest = furthest;

        if self.running {
            self.emit_timer += delta;
            let owed = (self.emit_timer / self.emit_interval).floor();
            if owed >= 1.0 {
                let free = self.particles.len() - self.alive;
                if owed > free as f32 {
                    for _ in 0..free {
                        self.emit(owner);
                    }
                    self.emit_timer = 0.0;
                } else {
                    for _ in 0..owed as usize {
                        self.emit(owner);
                    }
                    self.emit_timer -= owed * self.emit_interval;
                }
            }
        }
    }
}

impl ComponentBehavior for ParticleComponent {
    fn update(&mut self, ctx: &mut ComponentContext<'_>) -> Result<()> {
        self.simulate(ctx.transform, ctx.delta);
        Ok(())
    }

    fn update_bounds(&mut self, bounds: &mut Bounds, _owner: &Transform) -> bool {
        let Some(reach) = self.furthest else {
            if bounds.is_empty_at_origin() {
                return false;
            }
            *bounds = Bounds::default();
            return true;
        };
        // world distance to owner-local units
        let local = if self.owner_scale > 0.0 { reach / self.owner_scale } else { reach };
        let refit = Bounds::from_center(Vec2::ZERO, Vec2::splat(local));
        if refit == *bounds {
            return false;
        }
        *bounds = refit;
        true
    }

    fn draw(&self, renderer: &mut dyn Renderer, proj_world_view: Mat3, owner: &Transform) {
        let Some(to_world) = try_inverse(&owner.global_matrix()) else {
            return;
        };
        let proj_view = proj_world_view * to_world;
        for p in self.particles() {
            renderer.set_transform(proj_view * compose(p.position, p.rotation, Vec2::splat(p.size)));
            renderer.fill_rect(Vec2::splat(-0.5), Vec2::ONE, p.color);
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
