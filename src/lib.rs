//! Scenegraph 2D library.
//!
//! A small 2D engine core: a scene tree of entities with hierarchical
//! transforms and attached components, a per-frame lifecycle, a fixed-step
//! physics registry and a renderer-agnostic draw traversal.

pub mod components;
pub mod error;
pub mod events;
pub mod math;
pub mod resources;
pub mod scene;
pub mod systems;
