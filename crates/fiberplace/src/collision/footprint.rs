//! Per-target fiber footprints.
//!
//! For every target we keep the shapes of all active fibers that can legally
//! reach it, keyed by slot (index into the active-fiber list). Guide fibers
//! only see guide stars and vice versa. Off-plate targets get no footprints.

use rayon::prelude::*;

use crate::catalog::{Target, TargetId};
use crate::fiber::{button, fiber_pose_with_button, Fiber, InstrumentCfg};
use crate::geom2::{Bbox, Point2, Shape};

/// Every legal fiber pose on one target.
#[derive(Clone, Debug)]
pub struct TargetFootprint {
    pub target: TargetId,
    pub pos: Point2,
    /// `(slot, shape)`, sorted by slot.
    pub poses: Vec<(usize, Shape)>,
    /// Bounding box of all poses.
    pub envelope: Bbox,
}

impl TargetFootprint {
    pub fn compute(cfg: &InstrumentCfg, fibers: &[Fiber], target: &Target) -> Self {
        let mut poses = Vec::new();
        if cfg.on_plate(target.pos) {
            let btn = button(cfg, target.pos);
            for (slot, fiber) in fibers.iter().enumerate() {
                if fiber.is_guide() != target.kind.is_guide() {
                    continue;
                }
                if let Some(pose) = fiber_pose_with_button(cfg, fiber, target.pos, btn.clone()) {
                    poses.push((slot, pose.shape));
                }
            }
        }
        let envelope = poses
            .iter()
            .fold(Bbox::empty(), |b, (_, s)| b.union(&s.bbox()));
        Self {
            target: target.id,
            pos: target.pos,
            poses,
            envelope,
        }
    }

    /// Slots that can reach this target.
    pub fn slots(&self) -> impl Iterator<Item = usize> + '_ {
        self.poses.iter().map(|(s, _)| *s)
    }

    /// Does any pose on this target touch `shape`?
    pub fn touches(&self, shape: &Shape) -> bool {
        self.envelope.overlaps(&shape.bbox()) && self.poses.iter().any(|(_, s)| s.intersects(shape))
    }
}

/// Footprints of all targets against the active fibers.
#[derive(Clone, Debug)]
pub struct FootprintTable {
    cfg: InstrumentCfg,
    fibers: Vec<Fiber>,
    footprints: Vec<TargetFootprint>,
}

impl FootprintTable {
    /// Inactive fibers are dropped; the remaining order defines the slots.
    pub fn prepare(cfg: &InstrumentCfg, fibers: &[Fiber], targets: &[Target]) -> Self {
        let fibers: Vec<Fiber> = fibers.iter().filter(|f| f.active).cloned().collect();
        for t in targets.iter().filter(|t| !cfg.on_plate(t.pos)) {
            tracing::warn!(obj_id = t.obj_id, "target off the plate, no fiber can reach it");
        }
        let footprints = targets
            .par_iter()
            .map(|t| TargetFootprint::compute(cfg, &fibers, t))
            .collect();
        Self {
            cfg: cfg.clone(),
            fibers,
            footprints,
        }
    }

    /// Append the footprint of a new target (its id must be `len()`).
    pub fn push(&mut self, target: &Target) -> &TargetFootprint {
        debug_assert_eq!(target.id.0, self.footprints.len());
        let fp = TargetFootprint::compute(&self.cfg, &self.fibers, target);
        self.footprints.push(fp);
        &self.footprints[self.footprints.len() - 1]
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.footprints.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.footprints.is_empty()
    }

    pub fn footprints(&self) -> &[TargetFootprint] {
        &self.footprints
    }

    /// Active fibers in slot order.
    pub fn fibers(&self) -> &[Fiber] {
        &self.fibers
    }

    pub fn cfg(&self) -> &InstrumentCfg {
        &self.cfg
    }
}
