//! Static polygon with optional fill and border colours.
//!
//! Points are in the owner's local space. The component's bounds cover the
//! points pushed outward from their centroid by the outline width, so the
//! stroke is never culled early.

use std::any::Any;

use crate::components::bounds::Bounds;
use crate::components::color::Color;
use crate::components::component::ComponentBehavior;
use crate::components::transform::Transform;
use crate::math::{Mat3, Vec2};
use crate::systems::render::Renderer;

/// Sides used by [`primitive_points`] for [`ShapeType::Circle`].
pub const CIRCLE_SIDES: usize = 25;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeType {
    Square,
    Circle,
    Triangle,
}

/// Points of a primitive of `size` local units, centred on the origin.
pub fn primitive_points(kind: ShapeType, size: f32) -> Vec<Vec2> {
    let half = size * 0.5;
    match kind {
        ShapeType::Square => vec![
            Vec2::new(-half, -half),
            Vec2::new(half, -half),
            Vec2::new(half, half),
            Vec2::new(-half, half),
        ],
        ShapeType::Circle => {
            let step = std::f32::consts::TAU / CIRCLE_SIDES as f32;
            (0..CIRCLE_SIDES)
                .map(|i| Vec2::from_angle(i as f32 * step).rotate(Vec2::new(0.0, -half)))
                .collect()
        }
        ShapeType::Triangle => vec![
            Vec2::new(-half, -half),
            Vec2::new(half, -half),
            Vec2::new(0.0, half),
        ],
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ShapeComponent {
    points: Vec<Vec2>,
    outline_width: f32,
    fill: Option<Color>,
    border: Option<Color>,
    bounds_outdated: bool,
}

impl Default for ShapeComponent {
    fn default() -> Self {
        Self::new()
    }
}

impl ShapeComponent {
    /// Empty shape with a white fill, black border and 1 unit outline.
    pub fn new() -> Self {
        Self {
            points: Vec::new(),
            outline_width: 1.0,
            fill: Some(Color::WHITE),
            border: Some(Color::BLACK),
            bounds_outdated: true,
        }
    }

    pub fn primitive(kind: ShapeType, size: f32) -> Self {
        let mut shape = Self::new();
        shape.set_points(primitive_points(kind, size));
        shape
    }

    pub fn points(&self) -> &[Vec2] {
        &self.points
    }

    pub fn set_points(&mut self, points: Vec<Vec2>) {
        self.points = points;
        self.bounds_outdated = true;
    }

    pub fn outline_width(&self) -> f32 {
        self.outline_width
    }

    pub fn set_outline_width(&mut self, width: f32) {
        self.outline_width = width;
        self.bounds_outdated = true;
    }

    pub fn fill_color(&self) -> Option<Color> {
        self.fill
    }

    /// `None` disables filling.
    pub fn set_fill_color(&mut self, color: Option<Color>) {
        self.fill = color;
    }

    pub fn border_color(&self) -> Option<Color> {
        self.border
    }

    /// `None` disables the outline.
    pub fn set_border_color(&mut self, color: Option<Color>) {
        self.border = color;
    }
}

impl ComponentBehavior for ShapeComponent {
    fn update_bounds(&mut self, bounds: &mut Bounds, _owner: &Transform) -> bool {
        if !self.bounds_outdated {
            return false;
        }
        self.bounds_outdated = false;
        if self.points.is_empty() {
            bounds.set_points(&[]);
            return true;
        }
        let sum: Vec2 = self.points.iter().copied().sum();
        let center = sum / self.points.len() as f32;
        let grow = self.outline_width.abs();
        let inflated: Vec<Vec2> = self
            .points
            .iter()
            .map(|p| *p + (*p - center).normalize_or_zero() * grow)
            .collect();
        bounds.set_points(&inflated);
        true
    }

    fn draw(&self, renderer: &mut dyn Renderer, proj_world_view: Mat3, _owner: &Transform) {
        if self.points.is_empty() || (self.fill.is_none() && self.border.is_none()) {
            return;
        }
        renderer.set_transform(proj_world_view);
        renderer.draw_polygon(
            &self.points,
            self.fill,
            self.border.map(|c| (c, self.outline_width)),
        );
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 1e-5;

    fn approx_eq(a: f32, b: f32) -> bool {
        (a - b).abs() < EPSILON
    }

    #[test]
    fn test_primitive_point_counts() {
        assert_eq!(primitive_points(ShapeType::Square, 1.0).len(), 4);
        assert_eq!(primitive_points(ShapeType::Triangle, 1.0).len(), 3);
        assert_eq!(primitive_points(ShapeType::Circle, 1.0).len(), CIRCLE_SIDES);
    }

    #[test]
    fn test_circle_points_on_radius() {
        for p in primitive_points(ShapeType::Circle, 4.0) {
            assert!(approx_eq(p.length(), 2.0));
        }
        let first = primitive_points(ShapeType::Circle, 4.0)[0];
        assert!(approx_eq(first.x, 0.0) && approx_eq(first.y, -2.0));
    }

    #[test]
    fn test_bounds_inflated_by_outline() {
        let mut shape = ShapeComponent::primitive(ShapeType::Square, 2.0);
        shape.set_outline_width(0.0);
        let mut bounds = Bounds::default();
        let t = Transform::new();
        assert!(shape.update_bounds(&mut bounds, &t));
        assert!(approx_eq(bounds.max.x, 1.0));

        shape.set_outline_width(-2f32.sqrt());
        assert!(shape.update_bounds(&mut bounds, &t));
        assert!(approx_eq(bounds.max.x, 2.0));
        assert!(approx_eq(bounds.min.y, -2.0));
    }

    #[test]
    fn test_bounds_only_refit_when_outdated() {
        let mut shape = ShapeComponent::primitive(ShapeType::Triangle, 1.0);
        let mut bounds = Bounds::default();
        let t = Transform::new();
        assert!(shape.update_bounds(&mut bounds, &t));
        assert!(!shape.update_bounds(&mut bounds, &t));
        shape.set_fill_color(None);
        assert!(!shape.update_bounds(&mut bounds, &t));
        shape.set_points(vec![Vec2::ZERO]);
        assert!(shape.update_bounds(&mut bounds, &t));
    }
}
