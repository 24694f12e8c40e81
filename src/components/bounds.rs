//! Axis-aligned bounding box.
//!
//! [`Bounds`] is used for two things: visibility culling of entities against
//! the camera's visible area, and broad-phase rejection in the physics step.
//!
//! Local bounds are aggregated bottom-up: an entity's local bounds cover its
//! components' bounds plus each child's bounds mapped through that child's
//! local matrix. Global bounds are derived by [`Bounds::global_bounds`].

use serde::{Deserialize, Serialize};

use crate::math::{Mat3, Vec2};

/// Min/max corners of an axis-aligned box.
///
/// After [`clean`](Bounds::clean) (or any constructor in this module)
/// `min.x <= max.x` and `min.y <= max.y` hold.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Bounds {
    pub min: Vec2,
    pub max: Vec2,
}

impl Bounds {
    pub fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }.clean()
    }

    /// Box centred on `center` with half-size `half_extents`.
    pub fn from_center(center: Vec2, half_extents: Vec2) -> Self {
        Self::new(center - half_extents, center + half_extents)
    }

    /// Tightest box around `points`, or `None` for an empty slice.
    pub fn from_points(points: &[Vec2]) -> Option<Self> {
        let (first, rest) = points.split_first()?;
        let mut bounds = Self {
            min: *first,
            max: *first,
        };
        for p in rest {
            bounds.min = bounds.min.min(*p);
            bounds.max = bounds.max.max(*p);
        }
        Some(bounds)
    }

    /// Refit to `points`. The first point seeds both corners; an empty slice
    /// collapses the box onto the origin.
    pub fn set_points(&mut self, points: &[Vec2]) {
        *self = Self::from_points(points).unwrap_or_default();
    }

    /// Reorder the corners so that min is component-wise below max.
    pub fn clean(self) -> Self {
        Self {
            min: self.min.min(self.max),
            max: self.min.max(self.max),
        }
    }

    /// The four corners, counter-clockwise starting at `min`.
    pub fn corners(&self) -> [Vec2; 4] {
        [
            self.min,
            Vec2::new(self.max.x, self.min.y),
            self.max,
            Vec2::new(self.min.x, self.max.y),
        ]
    }

    /// Project this box through `matrix` and refit an axis-aligned box.
    ///
    /// All four corners are transformed: under rotation the extrema of the
    /// result need not come from the transformed min/max corners.
    pub fn global_bounds(&self, matrix: &Mat3) -> Bounds {
        let corners = self.corners().map(|c| matrix.transform_point2(c));
        // corners is never empty
        Self::from_points(&corners).unwrap_or_default()
    }

    /// Grow to cover `other`.
    pub fn encapsulate(&mut self, other: &Bounds) -> &mut Self {
        self.min = self.min.min(other.min);
        self.max = self.max.max(other.max);
        self
    }

    /// Grow to cover `point`.
    pub fn encapsulate_point(&mut self, point: Vec2) -> &mut Self {
        self.min = self.min.min(point);
        self.max = self.max.max(point);
        self
    }

    /// Separating-axis test. Touching edges count as intersecting.
    pub fn is_intersecting(&self, other: &Bounds) -> bool {
        !(other.min.x > self.max.x
            || other.min.y > self.max.y
            || self.min.x > other.max.x
            || self.min.y > other.max.y)
    }

    pub fn contains_point(&self, point: Vec2) -> bool {
        point.x >= self.min.x && point.x <= self.max.x && point.y >= self.min.y && point.y <= self.max.y
    }

    pub fn size(&self) -> Vec2 {
        self.max - self.min
    }

    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }

    /// True when the box is a single point at the origin.
    pub fn is_empty_at_origin(&self) -> bool {
        self.min == Vec2::ZERO && self.max == Vec2::ZERO
    }
}
