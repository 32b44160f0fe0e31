//! Fiber placement for a multi-object spectrograph focal plate.
//!
//! Layers, bottom-up:
//! - `geom2`: polygons, shapes, bounding boxes.
//! - `fiber`: fibers, positioner constants, fiber footprints.
//! - `catalog`: targets, field header, matrix cache key.
//! - `collision`: pairwise target collision matrix (parallel build, O(N)
//!   extend, persistence).
//! - `configuration`: fiber → target state with incremental score.
//! - `placer`: greedy initialization plus two-phase simulated annealing;
//!   manual edits.
//! - `progress`: observer callbacks shared by long-running operations.
//!
//! API Policy
//! - `api` is the curated surface for the CLI and scripts. Module paths may
//!   move between versions.

pub mod api;
pub mod catalog;
pub mod collision;
pub mod configuration;
pub mod fiber;
pub mod geom2;
pub mod placer;
pub mod progress;

/// Library version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub use nalgebra::Vector2 as Vec2;

/// Common exports for quick imports in callers.
pub mod prelude {
    pub use crate::catalog::{CatalogEntry, FieldHeader, Target, TargetId, TargetKind};
    pub use crate::collision::{CollisionEntry, CollisionMatrix, MatrixBuilder};
    pub use crate::configuration::Configuration;
    pub use crate::fiber::{Cable, Fiber, FiberId, InstrumentCfg};
    pub use crate::placer::{optimize, Field, Outcome};
    pub use crate::progress::{NoopObserver, Observer};
    pub use nalgebra::Vector2 as Vec2;
}
