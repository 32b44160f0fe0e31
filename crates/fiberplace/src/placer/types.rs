use std::fmt;

use serde::{Deserialize, Serialize};

use crate::configuration::Configuration;

/// How hard `add_object` may push existing assignments aside.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ForceCode {
    /// Reject on any conflict.
    Never,
    /// Evict conflicting non-pinned assignments; the new one is not pinned.
    ForceUnpinned,
    /// Evict every conflicting assignment; the new one is pinned.
    ForceAlways,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Explore,
    Refine,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlacerState {
    Idle,
    /// Guide-minimum checks are suspended.
    Initializing,
    Annealing(Phase),
    Finalizing,
}

/// Why a move was refused. The configuration is unchanged.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MoveRejected {
    /// Target already in this slot.
    AlreadyThere,
    /// Target held by another slot that may not be evicted.
    HeldElsewhere,
    /// A colliding assignment may not be evicted.
    Collision,
    /// The move would drop the guide count below the minimum.
    GuideMinimum,
    /// The slot cannot reach the target.
    Unreachable,
}

impl fmt::Display for MoveRejected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            MoveRejected::AlreadyThere => "target already assigned to this fiber",
            MoveRejected::HeldElsewhere => "target is assigned to another fiber",
            MoveRejected::Collision => "collides with an existing assignment",
            MoveRejected::GuideMinimum => "would drop below the minimum number of guide stars",
            MoveRejected::Unreachable => "fiber cannot reach the target",
        };
        f.write_str(msg)
    }
}

impl std::error::Error for MoveRejected {}

/// Power-law cooling `T(k) = t1·(1 − k/M)^power + t0`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Schedule {
    pub t1: f64,
    pub t0: f64,
    pub power: f64,
}

impl Schedule {
    #[inline]
    pub fn temperature(&self, step: usize, max: usize) -> f64 {
        if max == 0 {
            return self.t0;
        }
        let frac = (1.0 - step as f64 / max as f64).max(0.0);
        self.t1 * frac.powf(self.power) + self.t0
    }
}

/// Annealing schedules. Phase 1 runs `k ∈ [0, M)`, phase 2 `k ∈ [M/2, M)`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnnealCfg {
    pub explore: Schedule,
    pub refine: Schedule,
}

impl Default for AnnealCfg {
    fn default() -> Self {
        Self {
            explore: Schedule {
                t1: 100.0,
                t0: 0.0,
                power: 4.0,
            },
            refine: Schedule {
                t1: 60.0,
                t0: 0.0,
                power: 2.0,
            },
        }
    }
}

/// Result of `optimize`. On failure `best` is the configuration as it was
/// before the run.
#[derive(Clone, Debug)]
pub struct Outcome {
    pub best: Configuration,
    pub success: bool,
}
