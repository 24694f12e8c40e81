//! 2D vector and affine matrix helpers.
//!
//! [`Vec2`] and [`Mat3`] are `glam` types. A `Mat3` here is always a 2D affine
//! transform in homogeneous form: the first two columns are the scaled and
//! rotated basis axes, the third column holds the translation. Composition
//! follows `global = parent_global * local`.
//!
//! Rotations are expressed in degrees throughout the engine and are
//! counter-clockwise for positive values (a point on +X rotated by 90° lands
//! on +Y).

pub use glam::{Mat3, Vec2};

/// Tolerance used when deciding whether a matrix can be inverted.
pub const SINGULAR_EPSILON: f32 = 1e-8;

/// Build `translation * rotation * scale`.
pub fn compose(position: Vec2, rotation_degrees: f32, scale: Vec2) -> Mat3 {
    Mat3::from_scale_angle_translation(scale, rotation_degrees.to_radians(), position)
}

/// Translation column of an affine matrix.
pub fn translation_of(m: &Mat3) -> Vec2 {
    m.z_axis.truncate()
}

/// Rotation in degrees encoded in the X basis axis.
pub fn rotation_degrees(m: &Mat3) -> f32 {
    m.x_axis.y.atan2(m.x_axis.x).to_degrees()
}

/// Per-axis scale (length of each basis axis).
///
/// A mirrored matrix (negative determinant) reports a negative Y scale, so
/// that together with [`rotation_degrees`] it recomposes to the same matrix.
pub fn scale_of(m: &Mat3) -> Vec2 {
    let sx = m.x_axis.truncate().length();
    let sy = m.y_axis.truncate().length();
    if m.determinant() < 0.0 {
        Vec2::new(sx, -sy)
    } else {
        Vec2::new(sx, sy)
    }
}

/// Split an affine matrix into position, rotation (degrees) and scale.
pub fn decompose(m: &Mat3) -> (Vec2, f32, Vec2) {
    (translation_of(m), rotation_degrees(m), scale_of(m))
}

/// Inverse of `m`, or `None` when the determinant is (nearly) zero.
pub fn try_inverse(m: &Mat3) -> Option<Mat3> {
    if m.determinant().abs() < SINGULAR_EPSILON {
        None
    } else {
        Some(m.inverse())
    }
}

/// Rotate `v` counter-clockwise by `degrees`.
pub fn rotate_degrees(v: Vec2, degrees: f32) -> Vec2 {
    Vec2::from_angle(degrees.to_radians()).rotate(v)
}

/// Unit vector of `v`; a zero-length input yields [`Vec2::ZERO`].
pub fn normalized(v: Vec2) -> Vec2 {
    v.normalize_or_zero()
}

/// Vector perpendicular to `v`, pointing to its right (clockwise quarter turn).
pub fn right(v: Vec2) -> Vec2 {
    Vec2::new(v.y, -v.x)
}

/// Wrap an angle in degrees into `[0, 360)`.
pub fn clean_rotation(degrees: f32) -> f32 {
    let wrapped = degrees.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360.0 for tiny negative inputs
    if wrapped >= 360.0 { 0.0 } else { wrapped }
}

/// Linear interpolation between two scalars.
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}
