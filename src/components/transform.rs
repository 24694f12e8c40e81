//! Hierarchical 2D transform.
//!
//! Every entity owns exactly one [`Transform`]. It stores the local
//! position/rotation/scale, the cached local and global matrices, and the
//! links of the hierarchy: a non-owning parent handle and the ordered list of
//! child handles (the children themselves are owned by the scene's entity
//! table).
//!
//! # Dirty flag
//!
//! Any local-space mutation marks the transform dirty. The matrices are only
//! rebuilt by the scene's transform refresh, which walks the tree top-down:
//!
//! ```text
//! local  = T(position) * R(rotation) * S(scale)
//! global = parent.global * local      (or just local for a root)
//! ```
//!
//! # Global-space setters
//!
//! `set_position`, `set_rotation`, `set_scale`, `set_x`, ... solve for the
//! local value that produces the requested global value, using the parent's
//! global matrix as of the last refresh. Callers must therefore refresh
//! parents before children (the scene traversal does this); reading or
//! writing global state of a child whose parent moved since the last refresh
//! uses the stale parent matrix.

use smallvec::SmallVec;

use crate::error::{EngineError, Result};
use crate::math::{Mat3, Vec2, compose, decompose, rotation_degrees, scale_of, translation_of, try_inverse};
use crate::scene::EntityId;

/// What changed during a [`Transform::refresh`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TransformChange {
    /// The local matrix was rebuilt from position/rotation/scale.
    pub local: bool,
    /// The global matrix now differs from its previous value.
    pub global: bool,
}

#[derive(Debug, Clone)]
pub struct Transform {
    position: Vec2,
    rotation: f32,
    scale: Vec2,
    local: Mat3,
    global: Mat3,
    /// Copy of the parent's global matrix, identity for roots.
    parent_global: Mat3,
    parent: Option<EntityId>,
    children: SmallVec<[EntityId; 4]>,
    dirty: bool,
}

impl Default for Transform {
    fn default() -> Self {
        Self::new()
    }
}

impl Transform {
    /// Identity transform with no parent.
    pub fn new() -> Self {
        Self {
            position: Vec2::ZERO,
            rotation: 0.0,
            scale: Vec2::ONE,
            local: Mat3::IDENTITY,
            global: Mat3::IDENTITY,
            parent_global: Mat3::IDENTITY,
            parent: None,
            children: SmallVec::new(),
            dirty: false,
        }
    }

    // ==================== LOCAL SPACE ====================

    pub fn local_position(&self) -> Vec2 {
        self.position
    }

    pub fn set_local_position(&mut self, position: Vec2) {
        self.position = position;
        self.dirty = true;
    }

    pub fn local_x(&self) -> f32 {
        self.position.x
    }

    pub fn set_local_x(&mut self, x: f32) {
        self.position.x = x;
        self.dirty = true;
    }

    pub fn local_y(&self) -> f32 {
        self.position.y
    }

    pub fn set_local_y(&mut self, y: f32) {
        self.position.y = y;
        self.dirty = true;
    }

    /// Local rotation in degrees.
    pub fn local_rotation(&self) -> f32 {
        self.rotation
    }

    pub fn set_local_rotation(&mut self, degrees: f32) {
        self.rotation = degrees;
        self.dirty = true;
    }

    pub fn local_scale(&self) -> Vec2 {
        self.scale
    }

    pub fn set_local_scale(&mut self, scale: Vec2) {
        self.scale = scale;
        self.dirty = true;
    }

    pub fn local_scale_x(&self) -> f32 {
        self.scale.x
    }

    pub fn set_local_scale_x(&mut self, x: f32) {
        self.scale.x = x;
        self.dirty = true;
    }

    pub fn local_scale_y(&self) -> f32 {
        self.scale.y
    }

    pub fn set_local_scale_y(&mut self, y: f32) {
        self.scale.y = y;
        self.dirty = true;
    }

    /// Cached local matrix (as of the last refresh).
    pub fn local_matrix(&self) -> Mat3 {
        self.local
    }

    /// Replace position/rotation/scale with the decomposition of `m`.
    pub fn set_local_matrix(&mut self, m: Mat3) {
        let (position, rotation, scale) = decompose(&m);
        self.position = position;
        self.rotation = rotation;
        self.scale = scale;
        self.dirty = true;
    }

    // ==================== GLOBAL SPACE ====================

    /// Cached global matrix (as of the last refresh).
    pub fn global_matrix(&self) -> Mat3 {
        self.global
    }

    /// Set the local matrix so that the global matrix becomes `m`.
    pub fn set_global_matrix(&mut self, m: Mat3) -> Result<()> {
        let local = match self.parent_inverse("set_global_matrix")? {
            Some(inv) => inv * m,
            None => m,
        };
        self.set_local_matrix(local);
        Ok(())
    }

    pub fn position(&self) -> Vec2 {
        translation_of(&self.global)
    }

    pub fn set_position(&mut self, position: Vec2) -> Result<()> {
        self.position = match self.parent_inverse("set_position")? {
            Some(inv) => inv.transform_point2(position),
            None => position,
        };
        self.dirty = true;
        Ok(())
    }

    pub fn x(&self) -> f32 {
        self.global.z_axis.x
    }

    pub fn set_x(&mut self, x: f32) -> Result<()> {
        self.set_position(Vec2::new(x, self.y()))
    }

    pub fn y(&self) -> f32 {
        self.global.z_axis.y
    }

    pub fn set_y(&mut self, y: f32) -> Result<()> {
        self.set_position(Vec2::new(self.x(), y))
    }

    /// Global rotation in degrees.
    pub fn rotation(&self) -> f32 {
        let degrees = rotation_degrees(&self.global);
        if self.global_sign().x < 0.0 {
            if degrees > 0.0 { degrees - 180.0 } else { degrees + 180.0 }
        } else {
            degrees
        }
    }

    pub fn set_rotation(&mut self, degrees: f32) -> Result<()> {
        self.rotation = match self.parent_inverse("set_rotation")? {
            Some(inv) => rotation_degrees(&(inv * Mat3::from_angle(degrees.to_radians()))),
            None => degrees,
        };
        self.dirty = true;
        Ok(())
    }

    /// Global scale. Axis signs follow the local scale, with Y flipped under
    /// a mirrored parent.
    pub fn scale(&self) -> Vec2 {
        scale_of(&self.global).abs() * self.global_sign()
    }

    pub fn set_scale(&mut self, scale: Vec2) -> Result<()> {
        self.scale = self.solve_local_scale(scale, "set_scale")?;
        self.dirty = true;
        Ok(())
    }

    pub fn scale_x(&self) -> f32 {
        self.scale().x
    }

    pub fn set_scale_x(&mut self, x: f32) -> Result<()> {
        let wanted = Vec2::new(x, self.scale_y());
        self.scale.x = self.solve_local_scale(wanted, "set_scale_x")?.x;
        self.dirty = true;
        Ok(())
    }

    pub fn scale_y(&self) -> f32 {
        self.scale().y
    }

    pub fn set_scale_y(&mut self, y: f32) -> Result<()> {
        let wanted = Vec2::new(self.scale_x(), y);
        self.scale.y = self.solve_local_scale(wanted, "set_scale_y")?.y;
        self.dirty = true;
        Ok(())
    }

    /// Unit vector along the global X axis.
    pub fn right(&self) -> Vec2 {
        self.global.x_axis.truncate().normalize_or_zero()
    }

    /// Unit vector along the global Y axis.
    pub fn forward(&self) -> Vec2 {
        self.global.y_axis.truncate().normalize_or_zero()
    }

    /// Map a point from this transform's space into world space.
    pub fn transform_point(&self, point: Vec2) -> Vec2 {
        self.global.transform_point2(point)
    }

    /// Map a world-space point into this transform's space.
    pub fn inverse_transform_point(&self, point: Vec2) -> Result<Vec2> {
        try_inverse(&self.global)
            .map(|inv| inv.transform_point2(point))
            .ok_or(EngineError::SingularMatrix {
                op: "inverse_transform_point",
            })
    }

    // ==================== HIERARCHY ====================

    pub fn parent(&self) -> Option<EntityId> {
        self.parent
    }

    pub fn children(&self) -> &[EntityId] {
        &self.children
    }

    /// True when a local-space value changed since the last refresh.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    // ==================== SCENE INTERNALS ====================

    pub(crate) fn parent_global(&self) -> Mat3 {
        self.parent_global
    }

    pub(crate) fn set_parent_global(&mut self, m: Mat3) {
        self.parent_global = m;
    }

    pub(crate) fn set_parent_link(&mut self, parent: Option<EntityId>, parent_global: Mat3) {
        self.parent = parent;
        self.parent_global = parent_global;
    }

    pub(crate) fn push_child(&mut self, child: EntityId) {
        self.children.push(child);
    }

    /// Unlink `child`; returns false when it was not listed.
    pub(crate) fn remove_child_link(&mut self, child: EntityId) -> bool {
        match self.children.iter().position(|c| *c == child) {
            Some(i) => {
                self.children.remove(i);
                true
            }
            None => false,
        }
    }

    pub(crate) fn clear_children(&mut self) {
        self.children.clear();
    }

    /// Rebuild the cached matrices.
    ///
    /// The local matrix is rebuilt when dirty; the global matrix is rebuilt
    /// when dirty or `force` is set.
    pub(crate) fn refresh(&mut self, force: bool) -> TransformChange {
        let mut change = TransformChange::default();
        if self.dirty {
            self.local = compose(self.position, self.rotation, self.scale);
            change.local = true;
        }
        if force || self.dirty {
            let global = if self.parent.is_some() {
                self.parent_global * self.local
            } else {
                self.local
            };
            change.global = global != self.global;
            self.global = global;
        }
        self.dirty = false;
        change
    }

    fn parent_inverse(&self, op: &'static str) -> Result<Option<Mat3>> {
        if self.parent.is_none() {
            return Ok(None);
        }
        try_inverse(&self.parent_global)
            .map(Some)
            .ok_or(EngineError::SingularMatrix { op })
    }

    fn global_sign(&self) -> Vec2 {
        let mut sign = Vec2::new(self.scale.x.signum(), self.scale.y.signum());
        if self.parent.is_some() && self.parent_global.determinant() < 0.0 {
            sign.y = -sign.y;
        }
        sign
    }

    /// Local scale whose magnitudes give `wanted` under the parent. The
    /// sign of each requested axis is kept; a mirrored parent flips Y.
    fn solve_local_scale(&self, wanted: Vec2, op: &'static str) -> Result<Vec2> {
        Ok(match self.parent_inverse(op)? {
            Some(inv) => {
                let m = inv * Mat3::from_scale(wanted);
                let magnitude = Vec2::new(m.x_axis.truncate().length(), m.y_axis.truncate().length());
                let mut sign = Vec2::new(wanted.x.signum(), wanted.y.signum());
                if self.parent_global.determinant() < 0.0 {
                    sign.y = -sign.y;
                }
                magnitude * sign
            }
            None => wanted,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 1e-4;

    fn approx_eq(a: f32, b: f32) -> bool {
        (a - b).abs() < EPSILON
    }

    fn vec_approx_eq(a: Vec2, b: Vec2) -> bool {
        approx_eq(a.x, b.x) && approx_eq(a.y, b.y)
    }

    fn fake_parent() -> EntityId {
        use slotmap::SlotMap;
        let mut map: SlotMap<EntityId, ()> = SlotMap::with_key();
        map.insert(())
    }

    #[test]
    fn test_new_is_identity_and_clean() {
        let t = Transform::new();
        assert_eq!(t.local_matrix(), Mat3::IDENTITY);
        assert_eq!(t.global_matrix(), Mat3::IDENTITY);
        assert!(!t.is_dirty());
        assert!(t.parent().is_none());
    }

    #[test]
    fn test_local_setters_mark_dirty() {
        let mut t = Transform::new();
        t.set_local_rotation(45.0);
        assert!(t.is_dirty());
        t.refresh(false);
        assert!(!t.is_dirty());
        assert!(approx_eq(t.rotation(), 45.0));
    }

    #[test]
    fn test_refresh_reports_changes() {
        let mut t = Transform::new();
        assert_eq!(t.refresh(false), TransformChange::default());
        t.set_local_position(Vec2::new(3.0, 4.0));
        let change = t.refresh(false);
        assert!(change.local && change.global);
        // forced but unchanged
        let change = t.refresh(true);
        assert!(!change.local && !change.global);
    }

    #[test]
    fn test_root_global_setters_write_local() {
        let mut t = Transform::new();
        t.set_position(Vec2::new(1.0, 2.0)).unwrap();
        t.set_rotation(30.0).unwrap();
        t.set_scale(Vec2::new(2.0, 2.0)).unwrap();
        assert_eq!(t.local_position(), Vec2::new(1.0, 2.0));
        assert!(approx_eq(t.local_rotation(), 30.0));
        assert_eq!(t.local_scale(), Vec2::new(2.0, 2.0));
    }

    #[test]
    fn test_child_global_setters_solve_against_parent() {
        let parent_global = compose(Vec2::new(10.0, 0.0), 90.0, Vec2::splat(2.0));
        let mut t = Transform::new();
        t.set_parent_link(Some(fake_parent()), parent_global);

        t.set_position(Vec2::new(10.0, 4.0)).unwrap();
        t.set_rotation(135.0).unwrap();
        t.set_scale(Vec2::new(3.0, 3.0)).unwrap();
        t.refresh(false);

        assert!(vec_approx_eq(t.position(), Vec2::new(10.0, 4.0)));
        assert!(approx_eq(t.rotation(), 135.0));
        assert!(vec_approx_eq(t.scale(), Vec2::new(3.0, 3.0)));
        assert!(approx_eq(t.local_rotation(), 45.0));
        assert!(vec_approx_eq(t.local_scale(), Vec2::new(1.5, 1.5)));
    }

    #[test]
    fn test_global_scale_keeps_mirror_sign() {
        let mut t = Transform::new();
        t.set_scale(Vec2::new(-2.0, 1.0)).unwrap();
        t.refresh(false);
        assert!(vec_approx_eq(t.scale(), Vec2::new(-2.0, 1.0)));
        assert!(approx_eq(t.rotation(), 0.0));
        assert!(t.global_matrix().determinant() < 0.0);

        t.set_scale_x(3.0).unwrap();
        t.refresh(false);
        assert!(vec_approx_eq(t.local_scale(), Vec2::new(3.0, 1.0)));
    }

    #[test]
    fn test_scale_under_mirrored_parent() {
        let parent_global = compose(Vec2::ZERO, 0.0, Vec2::new(1.0, -2.0));
        let mut t = Transform::new();
        t.set_parent_link(Some(fake_parent()), parent_global);
        t.set_scale(Vec2::new(4.0, 4.0)).unwrap();
        t.refresh(false);

        assert!(vec_approx_eq(t.scale(), Vec2::new(4.0, 4.0)));
        assert!(vec_approx_eq(t.local_scale(), Vec2::new(4.0, -2.0)));
        assert!(t.global_matrix().determinant() > 0.0);
    }

    #[test]
    fn test_set_x_keeps_y() {
        let mut t = Transform::new();
        t.set_local_position(Vec2::new(1.0, 7.0));
        t.refresh(false);
        t.set_x(5.0).unwrap();
        t.refresh(false);
        assert!(vec_approx_eq(t.position(), Vec2::new(5.0, 7.0)));
    }

    #[test]
    fn test_singular_parent_is_rejected() {
        let parent_global = compose(Vec2::ZERO, 0.0, Vec2::new(0.0, 1.0));
        let mut t = Transform::new();
        t.set_parent_link(Some(fake_parent()), parent_global);
        assert_eq!(
            t.set_position(Vec2::ONE),
            Err(EngineError::SingularMatrix { op: "set_position" })
        );
    }

    #[test]
    fn test_set_local_matrix_decomposes() {
        let mut t = Transform::new();
        t.set_local_matrix(compose(Vec2::new(-3.0, 2.0), -60.0, Vec2::new(1.0, 4.0)));
        assert!(vec_approx_eq(t.local_position(), Vec2::new(-3.0, 2.0)));
        assert!(approx_eq(t.local_rotation(), -60.0));
        assert!(vec_approx_eq(t.local_scale(), Vec2::new(1.0, 4.0)));
    }

    #[test]
    fn test_right_and_forward() {
        let mut t = Transform::new();
        t.set_local_rotation(90.0);
        t.set_local_scale(Vec2::splat(5.0));
        t.refresh(false);
        assert!(vec_approx_eq(t.right(), Vec2::new(0.0, 1.0)));
        assert!(vec_approx_eq(t.forward(), Vec2::new(-1.0, 0.0)));
    }

    #[test]
    fn test_transform_point_round_trip() {
        let mut t = Transform::new();
        t.set_local_position(Vec2::new(4.0, -1.0));
        t.set_local_rotation(30.0);
        t.refresh(false);
        let p = Vec2::new(2.0, 3.0);
        let world = t.transform_point(p);
        let back = t.inverse_transform_point(world).unwrap();
        assert!(vec_approx_eq(back, p));
    }
}
