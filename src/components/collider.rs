//! Collision geometry attached to a [`RigidBody`](super::rigidbody::RigidBody).
//!
//! A [`Collider`] is one of three shapes ([`ColliderShape`]) plus the flags
//! shared by all of them: `enabled`, `trigger` and a local `offset` from the
//! body origin. The collider keeps its local [`Bounds`] current: every shape
//! mutation refits them immediately.
//!
//! Collider geometry lives in an axis-aligned frame centred on
//! `body position + offset`; body rotation does not rotate the collider.

use crate::components::bounds::Bounds;
use crate::error::{EngineError, Result};
use crate::math::Vec2;

/// Collider type flags. Narrow-phase dispatch keys off `a.bits() | b.bits()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ColliderType {
    Box = 1,
    Circle = 2,
    Shape = 4,
}

impl ColliderType {
    pub fn bits(self) -> u8 {
        self as u8
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ColliderShape {
    /// Full width/height of the box, centred on the collider origin.
    Box { extents: Vec2 },
    Circle { radius: f32 },
    /// Convex polygon in collider space, at least three points.
    Shape { points: Vec<Vec2> },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Collider {
    shape: ColliderShape,
    offset: Vec2,
    enabled: bool,
    trigger: bool,
    bounds: Bounds,
    com_offset: Vec2,
}

impl Collider {
    fn from_shape(shape: ColliderShape) -> Self {
        let mut collider = Self {
            shape,
            offset: Vec2::ZERO,
            enabled: true,
            trigger: false,
            bounds: Bounds::default(),
            com_offset: Vec2::ZERO,
        };
        collider.update_bounds();
        collider
    }

    /// Box collider; negative extents are clamped to zero.
    pub fn cuboid(extents: Vec2) -> Self {
        Self::from_shape(ColliderShape::Box {
            extents: extents.max(Vec2::ZERO),
        })
    }

    /// Circle collider; a negative radius is clamped to zero.
    pub fn circle(radius: f32) -> Self {
        Self::from_shape(ColliderShape::Circle {
            radius: radius.max(0.0),
        })
    }

    /// Polygon collider. Fails with fewer than three points.
    pub fn polygon(points: Vec<Vec2>) -> Result<Self> {
        check_points(&points)?;
        Ok(Self::from_shape(ColliderShape::Shape { points }))
    }

    /// Builder-style offset.
    pub fn with_offset(mut self, offset: Vec2) -> Self {
        self.offset = offset;
        self
    }

    /// Builder-style trigger flag.
    pub fn with_trigger(mut self, trigger: bool) -> Self {
        self.trigger = trigger;
        self
    }

    pub fn collider_type(&self) -> ColliderType {
        match self.shape {
            ColliderShape::Box { .. } => ColliderType::Box,
            ColliderShape::Circle { .. } => ColliderType::Circle,
            ColliderShape::Shape { .. } => ColliderType::Shape,
        }
    }

    pub fn shape(&self) -> &ColliderShape {
        &self.shape
    }

    pub fn extents(&self) -> Option<Vec2> {
        match self.shape {
            ColliderShape::Box { extents } => Some(extents),
            _ => None,
        }
    }

    pub fn set_extents(&mut self, value: Vec2) -> Result<()> {
        match &mut self.shape {
            ColliderShape::Box { extents } => *extents = value.max(Vec2::ZERO),
            _ => return Err(self.wrong_type("set_extents")),
        }
        self.update_bounds();
        Ok(())
    }

    pub fn radius(&self) -> Option<f32> {
        match self.shape {
            ColliderShape::Circle { radius } => Some(radius),
            _ => None,
        }
    }

    pub fn set_radius(&mut self, value: f32) -> Result<()> {
        match &mut self.shape {
            ColliderShape::Circle { radius } => *radius = value.max(0.0),
            _ => return Err(self.wrong_type("set_radius")),
        }
        self.update_bounds();
        Ok(())
    }

    pub fn points(&self) -> Option<&[Vec2]> {
        match &self.shape {
            ColliderShape::Shape { points } => Some(points),
            _ => None,
        }
    }

    pub fn set_points(&mut self, value: Vec<Vec2>) -> Result<()> {
        check_points(&value)?;
        match &mut self.shape {
            ColliderShape::Shape { points } => *points = value,
            _ => return Err(self.wrong_type("set_points")),
        }
        self.update_bounds();
        Ok(())
    }

    pub fn offset(&self) -> Vec2 {
        self.offset
    }

    pub fn set_offset(&mut self, offset: Vec2) {
        self.offset = offset;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn is_trigger(&self) -> bool {
        self.trigger
    }

    pub fn set_trigger(&mut self, trigger: bool) {
        self.trigger = trigger;
    }

    /// Bounds in collider space (before offset and body position).
    pub fn local_bounds(&self) -> &Bounds {
        &self.bounds
    }

    /// Centre of mass relative to the collider origin. Zero except for polygons.
    pub fn com_offset(&self) -> Vec2 {
        self.com_offset
    }

    /// Collider-space bounds moved to world space for a body at `position`.
    pub fn world_bounds(&self, position: Vec2) -> Bounds {
        let origin = position + self.offset;
        Bounds {
            min: self.bounds.min + origin,
            max: self.bounds.max + origin,
        }
    }

    /// Polygon points moved to world space for a body at `position`.
    pub fn world_points(&self, position: Vec2) -> Vec<Vec2> {
        let origin = position + self.offset;
        match &self.shape {
            ColliderShape::Shape { points } => points.iter().map(|p| *p + origin).collect(),
            ColliderShape::Box { extents } => {
                Bounds::from_center(origin, *extents * 0.5).corners().to_vec()
            }
            ColliderShape::Circle { .. } => vec![origin],
        }
    }

    fn update_bounds(&mut self) {
        match &self.shape {
            ColliderShape::Box { extents } => {
                self.bounds = Bounds::from_center(Vec2::ZERO, *extents * 0.5);
                self.com_offset = Vec2::ZERO;
            }
            ColliderShape::Circle { radius } => {
                self.bounds = Bounds::from_center(Vec2::ZERO, Vec2::splat(*radius));
                self.com_offset = Vec2::ZERO;
            }
            ColliderShape::Shape { points } => {
                self.bounds.set_points(points);
                let sum: Vec2 = points.iter().copied().sum();
                self.com_offset = sum / points.len().max(1) as f32;
            }
        }
    }

    fn wrong_type(&self, op: &str) -> EngineError {
        EngineError::InvalidShape(format!(
            "'{}' is not valid on a {:?} collider",
            op,
            self.collider_type()
        ))
    }
}

fn check_points(points: &[Vec2]) -> Result<()> {
    if points.len() < 3 {
        return Err(EngineError::InvalidShape(format!(
            "a polygon collider needs at least 3 points, got {}",
            points.len()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 1e-6;

    fn approx_eq(a: f32, b: f32) -> bool {
        (a - b).abs() < EPSILON
    }

    fn vec_approx_eq(a: Vec2, b: Vec2) -> bool {
        approx_eq(a.x, b.x) && approx_eq(a.y, b.y)
    }

    // ==================== BOUNDS ====================

    #[test]
    fn test_box_bounds_are_half_extents() {
        let c = Collider::cuboid(Vec2::new(4.0, 2.0));
        assert!(vec_approx_eq(c.local_bounds().min, Vec2::new(-2.0, -1.0)));
        assert!(vec_approx_eq(c.local_bounds().max, Vec2::new(2.0, 1.0)));
        assert_eq!(c.collider_type(), ColliderType::Box);
    }

    #[test]
    fn test_circle_bounds_follow_radius_eagerly() {
        let mut c = Collider::circle(1.0);
        c.set_radius(3.0).unwrap();
        assert!(vec_approx_eq(c.local_bounds().max, Vec2::splat(3.0)));
        assert!(vec_approx_eq(c.local_bounds().min, Vec2::splat(-3.0)));
    }

    #[test]
    fn test_negative_sizes_clamped() {
        let c = Collider::circle(-2.0);
        assert_eq!(c.radius(), Some(0.0));
        let b = Collider::cuboid(Vec2::new(-1.0, 2.0));
        assert_eq!(b.extents(), Some(Vec2::new(0.0, 2.0)));
    }

    #[test]
    fn test_polygon_center_of_mass() {
        let c = Collider::polygon(vec![
            Vec2::new(0.0, 0.0),
            Vec2::new(3.0, 0.0),
            Vec2::new(0.0, 3.0),
        ])
        .unwrap();
        assert!(vec_approx_eq(c.com_offset(), Vec2::new(1.0, 1.0)));
        assert!(vec_approx_eq(c.local_bounds().max, Vec2::new(3.0, 3.0)));
    }

    #[test]
    fn test_polygon_needs_three_points() {
        assert!(matches!(
            Collider::polygon(vec![Vec2::ZERO, Vec2::ONE]),
            Err(EngineError::InvalidShape(_))
        ));
    }

    #[test]
    fn test_wrong_setter_is_error() {
        let mut c = Collider::circle(1.0);
        assert!(c.set_extents(Vec2::ONE).is_err());
        assert!(c.set_points(vec![Vec2::ZERO; 3]).is_err());
    }

    #[test]
    fn test_world_bounds_include_offset() {
        let c = Collider::circle(1.0).with_offset(Vec2::new(0.0, 2.0));
        let w = c.world_bounds(Vec2::new(5.0, 0.0));
        assert!(vec_approx_eq(w.min, Vec2::new(4.0, 1.0)));
        assert!(vec_approx_eq(w.max, Vec2::new(6.0, 3.0)));
    }

    #[test]
    fn test_type_bits() {
        assert_eq!(ColliderType::Box.bits() | ColliderType::Circle.bits(), 3);
        assert_eq!(ColliderType::Shape.bits(), 4);
    }
}
