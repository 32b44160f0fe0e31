//! Fiber Geometry Model.
//!
//! Purpose
//! - Describe the fibers (`Fiber`, `Cable`) and the positioner constants
//!   (`InstrumentCfg`).
//! - Compute the physical footprint of a fiber reaching a target and reject
//!   positions beyond the bend or extension limits (`fiber_pose`).
//! - Load fibers from a concentricity document (`catalog`).
//!
//! Code cross-refs: `geom2::{Polygon, Shape}`, `collision::FootprintTable`.

pub mod catalog;
mod geometry;
mod types;

pub use catalog::{activate, load_fibers, FiberCatalogError};
pub use geometry::{bend_profile, button, fiber_pose, fiber_pose_with_button, FiberPose};
pub use types::{Cable, Fiber, FiberId, InstrumentCfg};
