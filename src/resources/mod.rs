//! Long-lived state shared by a scene or by the scene manager.
//!
//! Overview
//! - `camera` – view provider mapping world space to the viewport
//! - `engineconfig` – INI-backed engine settings
//! - `physics` – rigid-body registry with fixed-step integration
//! - `worldtime` – scaled simulation clock
pub mod camera;
pub mod engineconfig;
pub mod physics;
pub mod worldtime;
