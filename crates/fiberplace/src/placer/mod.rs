//! Assignment Optimizer.
//!
//! Purpose
//! - Choose, for every active fiber, at most one target so that no two chosen
//!   fibers collide, at least `min_guides` guide stars are held, pinned
//!   assignments stay put, and the summed weight is as high as possible.
//!
//! Model
//! - `Field`: read-only context (slots, targets, candidates, collision matrix).
//! - `Configuration` (crate root) is the mutable state; the optimizer works on
//!   it through `Mover::add_object` with a `ForceCode`.
//! - `Placer::optimize`: greedy initialization, then two simulated-annealing
//!   phases; returns the best configuration seen.
//! - `manual`: user edits and prior assignments.
//!
//! Code cross-refs: `collision::CollisionMatrix::collides`,
//! `progress::Observer`.

mod anneal;
mod field;
pub mod manual;
mod moves;
mod types;

pub use anneal::{optimize, Placer};
pub use field::{Field, SlotInfo};
pub use moves::Mover;
pub use types::{AnnealCfg, ForceCode, MoveRejected, Outcome, Phase, PlacerState, Schedule};
