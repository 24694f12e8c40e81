//! Broad and narrow phase collision tests.
//!
//! [`broad_phase`] rejects a pair when either body has no collider, either
//! collider is disabled, or their world bounds do not intersect. Surviving
//! pairs go to [`narrow_phase`], which dispatches on the OR of the two
//! collider type bits:
//!
//! | bits | pair            | test                         |
//! |------|-----------------|------------------------------|
//! | 1    | box / box       | AABB overlap                 |
//! | 2    | circle / circle | centre distance vs radii     |
//! | 3    | box / circle    | closest point on box         |
//! | 4    | shape / shape   | separating axes              |
//! | 5    | box / shape     | separating axes (box corners)|
//! | 6    | circle / shape  | separating axes + vertex axis|
//!
//! Polygons are treated as convex. Every test returns a [`Contact`] whose
//! normal points from the first body to the second, or `None` when the
//! shapes do not strictly overlap.

use crate::components::bounds::Bounds;
use crate::components::collider::{Collider, ColliderShape};
use crate::components::rigidbody::RigidBody;
use crate::events::collision::Contact;
use crate::math::{Vec2, right};

/// Cheap rejection test run before [`narrow_phase`].
pub fn broad_phase(a: &RigidBody, b: &RigidBody) -> bool {
    let (Some(ca), Some(cb)) = (a.collider(), b.collider()) else {
        return false;
    };
    if !ca.is_enabled() || !cb.is_enabled() {
        return false;
    }
    match (a.global_bounds(), b.global_bounds()) {
        (Some(ba), Some(bb)) => ba.is_intersecting(bb),
        _ => false,
    }
}

/// Exact test for a pair that passed [`broad_phase`].
pub fn narrow_phase(a: &RigidBody, b: &RigidBody) -> Option<Contact> {
    let (ca, cb) = (a.collider()?, b.collider()?);
    let (pa, pb) = (a.position(), b.position());
    let bits = ca.collider_type().bits() | cb.collider_type().bits();
    match bits {
        1 => box_box(&ca.world_bounds(pa), &cb.world_bounds(pb)),
        2 => circle_circle(center(ca, pa), radius(ca), center(cb, pb), radius(cb)),
        3 => match (ca.shape(), cb.shape()) {
            (ColliderShape::Box { .. }, _) => {
                box_circle(&ca.world_bounds(pa), center(cb, pb), radius(cb))
            }
            _ => box_circle(&cb.world_bounds(pb), center(ca, pa), radius(ca)).map(Contact::flipped),
        },
        4 | 5 => polygon_polygon(&ca.world_points(pa), &cb.world_points(pb)),
        6 => match ca.shape() {
            ColliderShape::Circle { radius } => {
                polygon_circle(&cb.world_points(pb), center(ca, pa), *radius).map(Contact::flipped)
            }
            _ => polygon_circle(&ca.world_points(pa), center(cb, pb), radius(cb)),
        },
        _ => None,
    }
}

fn center(collider: &Collider, position: Vec2) -> Vec2 {
    position + collider.offset()
}

fn radius(collider: &Collider) -> f32 {
    collider.radius().unwrap_or(0.0)
}

/// Overlap of two axis-aligned boxes, resolved along the shallower axis.
pub fn box_box(a: &Bounds, b: &Bounds) -> Option<Contact> {
    let overlap_x = a.max.x.min(b.max.x) - a.min.x.max(b.min.x);
    let overlap_y = a.max.y.min(b.max.y) - a.min.y.max(b.min.y);
    if overlap_x <= 0.0 || overlap_y <= 0.0 {
        return None;
    }
    let d = b.center() - a.center();
    if overlap_x < overlap_y {
        Some(Contact {
            normal: Vec2::new(if d.x < 0.0 { -1.0 } else { 1.0 }, 0.0),
            depth: overlap_x,
        })
    } else {
        Some(Contact {
            normal: Vec2::new(0.0, if d.y < 0.0 { -1.0 } else { 1.0 }),
            depth: overlap_y,
        })
    }
}

pub fn circle_circle(ca: Vec2, ra: f32, cb: Vec2, rb: f32) -> Option<Contact> {
    let d = cb - ca;
    let sum = ra + rb;
    let dist_sq = d.length_squared();
    if dist_sq >= sum * sum {
        return None;
    }
    let dist = dist_sq.sqrt();
    let normal = if dist > 0.0 { d / dist } else { Vec2::X };
    Some(Contact {
        normal,
        depth: sum - dist,
    })
}

/// Box first, circle second.
pub fn box_circle(bx: &Bounds, c: Vec2, r: f32) -> Option<Contact> {
    let closest = c.clamp(bx.min, bx.max);
    let d = c - closest;
    let dist_sq = d.length_squared();

    if dist_sq > 0.0 {
        if dist_sq >= r * r {
            return None;
        }
        let dist = dist_sq.sqrt();
        return Some(Contact {
            normal: d / dist,
            depth: r - dist,
        });
    }

    // centre inside the box: push out through the nearest face
    let faces = [
        (c.x - bx.min.x, Vec2::NEG_X),
        (bx.max.x - c.x, Vec2::X),
        (c.y - bx.min.y, Vec2::NEG_Y),
        (bx.max.y - c.y, Vec2::Y),
    ];
    let (dist, normal) = faces
        .into_iter()
        .fold((f32::INFINITY, Vec2::X), |best, face| {
            if face.0 < best.0 { face } else { best }
        });
    Some(Contact {
        normal,
        depth: dist + r,
    })
}

fn project(points: &[Vec2], axis: Vec2) -> (f32, f32) {
    points
        .iter()
        .map(|p| p.dot(axis))
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        })
}

fn edge_axes(points: &[Vec2]) -> impl Iterator<Item = Vec2> + '_ {
    points
        .iter()
        .zip(points.iter().cycle().skip(1))
        .map(|(p, q)| right(*q - *p).normalize_or_zero())
        .filter(|axis| *axis != Vec2::ZERO)
}

fn centroid(points: &[Vec2]) -> Vec2 {
    let sum: Vec2 = points.iter().copied().sum();
    sum / points.len().max(1) as f32
}

/// Separating-axis test for two convex polygons.
pub fn polygon_polygon(a: &[Vec2], b: &[Vec2]) -> Option<Contact> {
    let mut best: Option<Contact> = None;
    for axis in edge_axes(a).chain(edge_axes(b)) {
        let (min_a, max_a) = project(a, axis);
        let (min_b, max_b) = project(b, axis);
        let overlap = max_a.min(max_b) - min_a.max(min_b);
        if overlap <= 0.0 {
            return None;
        }
        if best.is_none_or(|c| overlap < c.depth) {
            best = Some(Contact {
                normal: axis,
                depth: overlap,
            });
        }
    }
    best.map(|mut contact| {
        if (centroid(b) - centroid(a)).dot(contact.normal) < 0.0 {
            contact.normal = -contact.normal;
        }
        contact
    })
}

/// Polygon first, circle second.
pub fn polygon_circle(poly: &[Vec2], c: Vec2, r: f32) -> Option<Contact> {
    let nearest_vertex = poly
        .iter()
        .copied()
        .min_by(|p, q| p.distance_squared(c).total_cmp(&q.distance_squared(c)))?;
    let vertex_axis = (c - nearest_vertex).normalize_or_zero();

    let mut best: Option<Contact> = None;
    let axes = edge_axes(poly).chain((vertex_axis != Vec2::ZERO).then_some(vertex_axis));
    for axis in axes {
        let (min_p, max_p) = project(poly, axis);
        let cc = c.dot(axis);
        let overlap = max_p.min(cc + r) - min_p.max(cc - r);
        if overlap <= 0.0 {
            return None;
        }
        if best.is_none_or(|b| overlap < b.depth) {
            best = Some(Contact {
                normal: axis,
                depth: overlap,
            });
        }
    }
    best.map(|mut contact| {
        if (c - centroid(poly)).dot(contact.normal) < 0.0 {
            contact.normal = -contact.normal;
        }
        contact
    })
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

    fn square(center: Vec2, half: f32) -> Vec<Vec2> {
        Bounds::from_center(center, Vec2::splat(half)).corners().to_vec()
    }

    fn body(collider: Collider, position: Vec2) -> RigidBody {
        RigidBody::new().with_collider(collider).with_position(position)
    }

    // ==================== BROAD PHASE ====================

    #[test]
    fn test_broad_phase_requires_colliders() {
        let a = RigidBody::new();
        let b = body(Collider::circle(1.0), Vec2::ZERO);
        assert!(!broad_phase(&a, &b));
        assert!(!broad_phase(&b, &a));
    }

    #[test]
    fn test_broad_phase_rejects_disabled_collider() {
        let a = body(Collider::circle(1.0), Vec2::ZERO);
        let mut b = body(Collider::circle(1.0), Vec2::new(0.5, 0.0));
        assert!(broad_phase(&a, &b));
        b.collider_mut().unwrap().set_enabled(false);
        assert!(!broad_phase(&a, &b));
    }

    #[test]
    fn test_broad_phase_rejects_distant() {
        let a = body(Collider::circle(1.0), Vec2::ZERO);
        let b = body(Collider::circle(1.0), Vec2::new(5.0, 0.0));
        assert!(!broad_phase(&a, &b));
    }

    // ==================== PRIMITIVES ====================

    #[test]
    fn test_box_box_shallow_axis() {
        let a = Bounds::from_center(Vec2::ZERO, Vec2::ONE);
        let b = Bounds::from_center(Vec2::new(1.5, 0.2), Vec2::ONE);
        let c = box_box(&a, &b).unwrap();
        assert!(vec_approx_eq(c.normal, Vec2::X));
        assert!(approx_eq(c.depth, 0.5));
        let far = Bounds::from_center(Vec2::new(3.0, 0.0), Vec2::ONE);
        assert!(box_box(&a, &far).is_none());
    }

    #[test]
    fn test_circle_circle() {
        let c = circle_circle(Vec2::ZERO, 1.0, Vec2::new(0.0, 1.5), 1.0).unwrap();
        assert!(vec_approx_eq(c.normal, Vec2::Y));
        assert!(approx_eq(c.depth, 0.5));
        assert!(circle_circle(Vec2::ZERO, 1.0, Vec2::new(2.0, 0.0), 1.0).is_none());
    }

    #[test]
    fn test_circle_circle_coincident_centres() {
        let c = circle_circle(Vec2::ONE, 1.0, Vec2::ONE, 2.0).unwrap();
        assert!(vec_approx_eq(c.normal, Vec2::X));
        assert!(approx_eq(c.depth, 3.0));
    }

    #[test]
    fn test_box_circle_outside_corner() {
        let bx = Bounds::from_center(Vec2::ZERO, Vec2::ONE);
        assert!(box_circle(&bx, Vec2::new(2.0, 2.0), 1.0).is_none());
        let c = box_circle(&bx, Vec2::new(1.5, 0.0), 1.0).unwrap();
        assert!(vec_approx_eq(c.normal, Vec2::X));
        assert!(approx_eq(c.depth, 0.5));
    }

    #[test]
    fn test_box_circle_centre_inside() {
        let bx = Bounds::from_center(Vec2::ZERO, Vec2::ONE);
        let c = box_circle(&bx, Vec2::new(0.0, 0.8), 0.5).unwrap();
        assert!(vec_approx_eq(c.normal, Vec2::Y));
        assert!(approx_eq(c.depth, 0.7));
    }

    #[test]
    fn test_polygon_polygon() {
        let a = square(Vec2::ZERO, 1.0);
        let b = square(Vec2::new(0.0, -1.5), 1.0);
        let c = polygon_polygon(&a, &b).unwrap();
        assert!(vec_approx_eq(c.normal, Vec2::NEG_Y));
        assert!(approx_eq(c.depth, 0.5));
        assert!(polygon_polygon(&a, &square(Vec2::new(0.0, 3.0), 1.0)).is_none());
    }

    #[test]
    fn test_polygon_polygon_triangle_gap() {
        // bounding boxes overlap but the hypotenuse separates them
        let tri = vec![Vec2::new(0.0, 0.0), Vec2::new(2.0, 0.0), Vec2::new(0.0, 2.0)];
        let other = square(Vec2::new(1.8, 1.8), 0.5);
        assert!(polygon_polygon(&tri, &other).is_none());
    }

    #[test]
    fn test_polygon_circle() {
        let poly = square(Vec2::ZERO, 1.0);
        let c = polygon_circle(&poly, Vec2::new(-1.5, 0.0), 1.0).unwrap();
        assert!(vec_approx_eq(c.normal, Vec2::NEG_X));
        assert!(approx_eq(c.depth, 0.5));
        assert!(polygon_circle(&poly, Vec2::new(1.8, 1.8), 1.0).is_none());
    }

    // ==================== DISPATCH ====================

    #[test]
    fn test_dispatch_orients_normal_from_first_body() {
        let circle = body(Collider::circle(1.0), Vec2::new(1.5, 0.0));
        let bx = body(Collider::cuboid(Vec2::splat(2.0)), Vec2::ZERO);
        let c1 = narrow_phase(&bx, &circle).unwrap();
        let c2 = narrow_phase(&circle, &bx).unwrap();
        assert!(vec_approx_eq(c1.normal, Vec2::X));
        assert!(vec_approx_eq(c2.normal, Vec2::NEG_X));
        assert!(approx_eq(c1.depth, c2.depth));
    }

    #[test]
    fn test_dispatch_box_shape() {
        let shape = Collider::polygon(square(Vec2::ZERO, 1.0)).unwrap();
        let a = body(shape, Vec2::ZERO);
        let b = body(Collider::cuboid(Vec2::splat(2.0)), Vec2::new(1.0, 0.0));
        let c = narrow_phase(&a, &b).unwrap();
        assert!(vec_approx_eq(c.normal, Vec2::X));
        assert!(approx_eq(c.depth, 1.0));
    }

    #[test]
    fn test_dispatch_circle_shape() {
        let shape = Collider::polygon(square(Vec2::ZERO, 1.0)).unwrap();
        let poly = body(shape, Vec2::ZERO);
        let circle = body(Collider::circle(0.5), Vec2::new(0.0, 1.25));
        let c = narrow_phase(&circle, &poly).unwrap();
        assert!(vec_approx_eq(c.normal, Vec2::NEG_Y));
        assert!(approx_eq(c.depth, 0.25));
    }
}
