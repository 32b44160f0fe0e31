//! Collision Matrix Builder.
//!
//! Purpose
//! - Precompute, for every pair of targets, whether fibers placed on them can
//!   physically collide, so the optimizer answers collision queries by lookup.
//!
//! Model
//! - `FootprintTable`: per target, the shape of every active fiber that can
//!   reach it (same class only: guide fibers ↔ guide stars).
//! - `CollisionEntry`: `AlwaysCollide` (buttons overlap), `NeverCollide`, or
//!   `Conditional` rows `fiber on i → fibers on j that collide`.
//! - `CollisionMatrix`: upper triangle over N targets, append-only.
//!
//! Construction is parallel over rows (`MatrixBuilder`); a single appended
//! target costs O(N) (`MatrixBuilder::extend`). Matrices persist through a
//! `MatrixStore` keyed by `catalog::cache_key`.
//!
//! Code cross-refs: `fiber::fiber_pose`, `geom2::Shape::intersects`,
//! `placer::Field`.

mod build;
mod classify;
mod footprint;
pub mod store;
mod types;

pub use build::{default_workers, MatrixBuilder, RowWork};
pub use classify::classify;
pub use footprint::{FootprintTable, TargetFootprint};
pub use store::{load_or_build, MatrixSource, MatrixStore, MemoryStore};
pub use types::{CollisionEntry, CollisionMatrix, FiberMask, Overlap};

#[cfg(test)]
mod tests;
