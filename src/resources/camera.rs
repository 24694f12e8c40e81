//! 2D camera used as the scene's view provider.
//!
//! The scene does not know about screen coordinates. Each frame it asks a
//! [`ViewProvider`] for two things: the combined projection * view matrix that
//! is multiplied with each entity's global matrix before drawing, and the
//! world-space [`Bounds`] currently visible, used for culling.
//!
//! [`Camera`] is the stock provider: the projection scales world units by
//! `2 / distance` pixels and places the world origin at the viewport centre;
//! the view is the inverse of the camera's own position/rotation transform.

use crate::components::bounds::Bounds;
use crate::error::{EngineError, Result};
use crate::math::{Mat3, Vec2, compose, try_inverse};
use crate::resources::engineconfig::EngineConfig;

/// Supplies the per-frame view inputs of the draw traversal.
pub trait ViewProvider {
    fn projection_view(&self) -> Mat3;
    /// World-space area on screen.
    fn visible_bounds(&self) -> Bounds;
}

#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    pub position: Vec2,
    /// Degrees.
    pub rotation: f32,
    width: f32,
    height: f32,
    distance: f32,
}

impl Camera {
    /// Camera for a `width` x `height` pixel viewport. `distance` must be > 0.
    pub fn new(width: f32, height: f32, distance: f32) -> Result<Self> {
        let mut camera = Self {
            position: Vec2::ZERO,
            rotation: 0.0,
            width,
            height,
            distance: 1.0,
        };
        camera.set_distance(distance)?;
        Ok(camera)
    }

    pub fn from_config(config: &EngineConfig) -> Result<Self> {
        Self::new(
            config.view_width as f32,
            config.view_height as f32,
            config.view_distance,
        )
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    pub fn height(&self) -> f32 {
        self.height
    }

    /// Viewport resize notification.
    pub fn resize(&mut self, width: f32, height: f32) {
        self.width = width;
        self.height = height;
    }

    pub fn distance(&self) -> f32 {
        self.distance
    }

    pub fn set_distance(&mut self, distance: f32) -> Result<()> {
        if !(distance.is_finite() && distance > 0.0) {
            return Err(EngineError::Config(format!(
                "camera distance must be greater than zero, got {}",
                distance
            )));
        }
        self.distance = distance;
        Ok(())
    }

    pub fn projection(&self) -> Mat3 {
        compose(
            Vec2::new(self.width * 0.5, self.height * 0.5),
            0.0,
            Vec2::splat(2.0 / self.distance),
        )
    }

    /// Camera placement in the world.
    pub fn transform(&self) -> Mat3 {
        compose(self.position, self.rotation, Vec2::ONE)
    }

    pub fn view(&self) -> Mat3 {
        // rigid transform: always invertible
        self.transform().inverse()
    }

    /// Map a viewport pixel back to world space.
    pub fn screen_to_world(&self, screen: Vec2) -> Vec2 {
        match try_inverse(&self.projection_view()) {
            Some(inv) => inv.transform_point2(screen),
            None => self.position,
        }
    }

    pub fn world_to_screen(&self, world: Vec2) -> Vec2 {
        self.projection_view().transform_point2(world)
    }
}

impl ViewProvider for Camera {
    fn projection_view(&self) -> Mat3 {
        self.projection() * self.view()
    }

    fn visible_bounds(&self) -> Bounds {
        let corners = [
            Vec2::ZERO,
            Vec2::new(self.width, 0.0),
            Vec2::new(self.width, self.height),
            Vec2::new(0.0, self.height),
        ]
        .map(|c| self.screen_to_world(c));
        Bounds::from_points(&corners).unwrap_or_default()
    }
}
