//! Manual edits on a configuration.
//!
//! These run outside annealing: a pinned assignment evicts whatever collides
//! with it, an unpinned one must fit as is. Prior assignments from a saved
//! configuration are applied with guide checks suspended.

use std::fmt;

use super::field::Field;
use super::moves::Mover;
use super::types::{ForceCode, MoveRejected};
use crate::catalog::CatalogEntry;
use crate::configuration::Configuration;
use crate::fiber::FiberId;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AssignError {
    UnknownFiber(FiberId),
    UnknownObject(u64),
    Rejected(MoveRejected),
}

impl fmt::Display for AssignError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssignError::UnknownFiber(id) => write!(f, "fiber {} is not active", id.0),
            AssignError::UnknownObject(obj) => write!(f, "object {obj} is not in the field"),
            AssignError::Rejected(why) => write!(f, "{why}"),
        }
    }
}

impl std::error::Error for AssignError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AssignError::Rejected(why) => Some(why),
            _ => None,
        }
    }
}

impl From<MoveRejected> for AssignError {
    fn from(e: MoveRejected) -> Self {
        AssignError::Rejected(e)
    }
}

fn assign_with(
    mover: Mover<'_>,
    config: &mut Configuration,
    obj_id: u64,
    fiber: FiberId,
    pinned: bool,
) -> Result<Vec<usize>, AssignError> {
    let field = mover.field();
    let slot = field.slot_of_fiber(fiber).ok_or(AssignError::UnknownFiber(fiber))?;
    let target = field.target_by_obj(obj_id).ok_or(AssignError::UnknownObject(obj_id))?;
    if !field.can_reach(slot, target) {
        return Err(MoveRejected::Unreachable.into());
    }
    let force = if pinned {
        ForceCode::ForceAlways
    } else {
        ForceCode::Never
    };
    Ok(mover.add_object(config, slot, target, force)?)
}

/// Assign object `obj_id` to `fiber`. Pinned assignments evict conflicts;
/// returns the evicted slots.
pub fn assign(
    field: &Field,
    config: &mut Configuration,
    min_guides: usize,
    obj_id: u64,
    fiber: FiberId,
    pinned: bool,
) -> Result<Vec<usize>, AssignError> {
    let res = assign_with(Mover::new(field, min_guides), config, obj_id, fiber, pinned);
    if let Err(err) = &res {
        tracing::debug!(fiber = fiber.0, obj_id, error = %err, "manual assignment rejected");
    }
    res
}

/// Clear the slot of `fiber`; false if it held nothing.
pub fn unassign_fiber(field: &Field, config: &mut Configuration, fiber: FiberId) -> bool {
    field
        .slot_of_fiber(fiber)
        .and_then(|s| config.unassign(s))
        .is_some()
}

/// Remove object `obj_id` from whichever slot holds it.
pub fn unassign_object(field: &Field, config: &mut Configuration, obj_id: u64) -> bool {
    field
        .target_by_obj(obj_id)
        .and_then(|t| config.index_of_target(t))
        .and_then(|s| config.unassign(s))
        .is_some()
}

/// Apply saved assignments carried by catalog entries. Failures are logged
/// and skipped; returns how many were applied.
pub fn apply_prior_assignments(
    field: &Field,
    config: &mut Configuration,
    entries: &[CatalogEntry],
) -> usize {
    let mover = Mover::new(field, 0).initializing(true);
    let mut applied = 0;
    for e in entries {
        let Some(prior) = e.prior else { continue };
        match assign_with(mover, config, e.obj_id, prior.fiber, prior.pinned) {
            Ok(_) => applied += 1,
            Err(err) => {
                tracing::warn!(
                    fiber = prior.fiber.0,
                    obj_id = e.obj_id,
                    error = %err,
                    "fiber could not be assigned"
                );
            }
        }
    }
    applied
}

/// Unassign up to `n` of the lowest-weighted assignments, skipping pinned
/// and guide slots. Returns the cleared slots.
pub fn remove_lowest_weighted(config: &mut Configuration, n: usize) -> Vec<usize> {
    let mut pool: Vec<(u32, usize)> = config
        .assigned()
        .filter(|&(s, _)| !config.is_pinned(s) && !config.is_guide(s))
        .map(|(s, _)| (config.get(s).weight, s))
        .collect();
    pool.sort_unstable();
    let removed: Vec<usize> = pool.into_iter().take(n).map(|(_, s)| s).collect();
    for &s in &removed {
        config.unassign(s);
    }
    removed
}

/// Clear the configuration; pinned slots survive unless `remove_pinned`.
pub fn reset(config: &mut Configuration, remove_pinned: bool) {
    if remove_pinned {
        config.clear_all();
    } else {
        config.clear_unpinned();
    }
}
