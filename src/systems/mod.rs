//! Engine systems.
//!
//! Free functions that walk the scene tree once per frame. Each one takes the
//! [`Scene`](crate::scene::Scene) it works on explicitly and is run in a fixed
//! order by [`lifecycle::run_frame`] (and [`render::render_pass`] by the scene
//! manager); there is no scheduler, the order listed there is the schedule.
//!
//! Submodules overview
//! - [`collision`] – broad phase bounds checks and SAT/circle narrow phase
//! - [`lifecycle`] – entity and component hooks, deferred disposal, physics dispatch
//! - [`propagate_transforms`] – global matrices top-down, bounds bottom-up
//! - [`render`] – culled draw traversal through a [`render::Renderer`]

pub mod collision;
pub mod lifecycle;
pub mod propagate_transforms;
pub mod render;
