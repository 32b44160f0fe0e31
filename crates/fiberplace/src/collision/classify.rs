//! Pairwise target classification.
//!
//! Cheapest test first:
//! 1. buttons closer than one button diameter → `AlwaysCollide`;
//! 2. footprint envelopes disjoint → `NeverCollide`;
//! 3. otherwise test every pose on `a` against every pose on `b` that touches
//!    it and record the colliding fiber pairs. No pairs → `NeverCollide`.

use super::footprint::TargetFootprint;
use super::types::{CollisionEntry, FiberMask, Overlap};

/// Entry for the pair (`a`, `b`), rows keyed by `a`'s fibers.
pub fn classify(a: &TargetFootprint, b: &TargetFootprint, button_diameter: f64) -> CollisionEntry {
    if (a.pos - b.pos).norm() < button_diameter {
        return CollisionEntry::AlwaysCollide;
    }
    if !a.envelope.overlaps(&b.envelope) {
        return CollisionEntry::NeverCollide;
    }
    let a_hits: Vec<_> = a.poses.iter().filter(|(_, s)| b.touches(s)).collect();
    if a_hits.is_empty() {
        return CollisionEntry::NeverCollide;
    }
    let b_hits: Vec<_> = b.poses.iter().filter(|(_, s)| a.touches(s)).collect();

    let mut rows = Vec::new();
    for (fa, sa) in a_hits {
        let blocked: FiberMask = b_hits
            .iter()
            .filter(|(_, sb)| sa.intersects(sb))
            .map(|(fb, _)| *fb)
            .collect();
        if !blocked.is_empty() {
            rows.push(Overlap {
                fiber: *fa,
                blocked,
            });
        }
    }
    if rows.is_empty() {
        CollisionEntry::NeverCollide
    } else {
        CollisionEntry::Conditional(rows)
    }
}
