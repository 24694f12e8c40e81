//! Event types used by the engine.
//!
//! Submodules:
//! - [`collision`] – trigger and collision notifications produced by the physics step
pub mod collision;
