//! Scene components and the data they carry.
//!
//! Every entity owns a [`transform::Transform`]; everything else is attached
//! as a [`component::Component`] and stored in the scene's component arena.
//!
//! Submodules overview:
//! - [`bounds`] – axis-aligned bounding box with union and intersection tests
//! - [`collider`] – polygon or circle geometry for rigid bodies
//! - [`color`] – RGBA colour with hex parsing and interpolation
//! - [`component`] – component base, IDs and hook dispatch
//! - [`particle`] – point, direction and line particle emitters
//! - [`physics`] – component binding a rigid body to its owner
//! - [`rigidbody`] – point mass with velocity, forces and damping
//! - [`shape`] – static polygons and primitive shapes
//! - [`transform`] – local and global placement in the hierarchy

pub mod bounds;
pub mod collider;
pub mod color;
pub mod component;
pub mod particle;
pub mod physics;
pub mod rigidbody;
pub mod shape;
pub mod transform;
