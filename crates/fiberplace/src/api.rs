//! Curated API for the CLI and scripts (UNSTABLE).
//!
//! Prefer these re-exports over deep module paths; they are grouped by the
//! step of a placement run they belong to.

// Inputs
pub use crate::catalog::{
    cache_key, project_catalog, weight_guides, CatalogEntry, FieldHeader, PlatePosition,
    PriorAssignment, SkyToPlate, Target, TargetId, TargetKind,
};
pub use crate::fiber::{activate, load_fibers, Cable, Fiber, FiberCatalogError, FiberId, InstrumentCfg};
// Collision matrix
pub use crate::collision::{
    default_workers, load_or_build, CollisionEntry, CollisionMatrix, FootprintTable,
    MatrixBuilder, MatrixSource, MatrixStore, MemoryStore,
};
// Optimization
pub use crate::configuration::{Configuration, Slot, Snapshot};
pub use crate::placer::manual::{
    apply_prior_assignments, assign, remove_lowest_weighted, reset, unassign_fiber,
    unassign_object, AssignError,
};
pub use crate::placer::{
    optimize, AnnealCfg, Field, ForceCode, MoveRejected, Outcome, Placer, SlotInfo,
};
// Progress
pub use crate::progress::{ChannelObserver, NoopObserver, Observer, ProgressEvent};
