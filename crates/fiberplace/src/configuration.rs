//! Fiber configuration: which target each fiber slot holds.
//!
//! Maintains, alongside the slot array, a target → slot index, the total
//! weight (score) and the number of guide slots in use, so the optimizer's
//! inner loop never rescans. A target occupies at most one slot. Collision
//! legality is the placer's job, not this type's.

use serde::Serialize;

use crate::catalog::TargetId;

/// Contents of one fiber slot.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Slot {
    pub target: Option<TargetId>,
    pub weight: u32,
    /// Manually locked; the optimizer never moves it.
    pub pinned: bool,
}

/// Saved slot state; restoring brings back score and guide count too.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Snapshot {
    slots: Vec<Slot>,
    by_target: Vec<Option<usize>>,
    score: u64,
    guide_count: usize,
}

impl Snapshot {
    pub fn score(&self) -> u64 {
        self.score
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Configuration {
    slots: Vec<Slot>,
    guide: Vec<bool>,
    by_target: Vec<Option<usize>>,
    score: u64,
    guide_count: usize,
}

impl Configuration {
    /// Empty configuration; `guide[s]` marks guide-fiber slots.
    pub fn new(guide: Vec<bool>, n_targets: usize) -> Self {
        Self {
            slots: vec![Slot::default(); guide.len()],
            guide,
            by_target: vec![None; n_targets],
            score: 0,
            guide_count: 0,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    #[inline]
    pub fn get(&self, slot: usize) -> Slot {
        self.slots[slot]
    }

    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    #[inline]
    pub fn is_guide(&self, slot: usize) -> bool {
        self.guide[slot]
    }

    #[inline]
    pub fn is_pinned(&self, slot: usize) -> bool {
        self.slots[slot].pinned
    }

    /// Sum of assigned weights.
    #[inline]
    pub fn score(&self) -> u64 {
        self.score
    }

    /// Guide slots currently holding a target.
    #[inline]
    pub fn guide_count(&self) -> usize {
        self.guide_count
    }

    /// Slot holding `target`, if any.
    #[inline]
    pub fn index_of_target(&self, target: TargetId) -> Option<usize> {
        self.by_target.get(target.0).copied().flatten()
    }

    /// `(slot, target)` for every occupied slot.
    pub fn assigned(&self) -> impl Iterator<Item = (usize, TargetId)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(s, slot)| slot.target.map(|t| (s, t)))
    }

    /// Room for targets appended to the catalog.
    pub fn grow_targets(&mut self, n_targets: usize) {
        if self.by_target.len() < n_targets {
            self.by_target.resize(n_targets, None);
        }
    }

    /// Put `target` in `slot`, replacing what was there. If `target` sat in
    /// another slot, that slot is cleared.
    pub fn assign(&mut self, slot: usize, target: TargetId, weight: u32, pinned: bool) {
        if let Some(other) = self.index_of_target(target) {
            if other != slot {
                self.unassign(other);
            }
        }
        self.unassign(slot);
        self.grow_targets(target.0 + 1);
        self.slots[slot] = Slot {
            target: Some(target),
            weight,
            pinned,
        };
        self.by_target[target.0] = Some(slot);
        self.score += u64::from(weight);
        if self.guide[slot] {
            self.guide_count += 1;
        }
    }

    /// Clear `slot`; returns what it held.
    pub fn unassign(&mut self, slot: usize) -> Option<TargetId> {
        let old = std::mem::take(&mut self.slots[slot]);
        let t = old.target?;
        self.by_target[t.0] = None;
        self.score -= u64::from(old.weight);
        if self.guide[slot] {
            self.guide_count -= 1;
        }
        Some(t)
    }

    /// Clear every slot that is not pinned.
    pub fn clear_unpinned(&mut self) {
        for s in 0..self.slots.len() {
            if !self.slots[s].pinned {
                self.unassign(s);
            }
        }
    }

    pub fn clear_all(&mut self) {
        for s in 0..self.slots.len() {
            self.unassign(s);
        }
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            slots: self.slots.clone(),
            by_target: self.by_target.clone(),
            score: self.score,
            guide_count: self.guide_count,
        }
    }

    /// As `snapshot`, reusing `out`'s buffers.
    pub fn snapshot_into(&self, out: &mut Snapshot) {
        out.slots.clone_from(&self.slots);
        out.by_target.clone_from(&self.by_target);
        out.score = self.score;
        out.guide_count = self.guide_count;
    }

    pub fn restore(&mut self, snap: &Snapshot) {
        debug_assert_eq!(snap.slots.len(), self.slots.len());
        self.slots.clone_from(&snap.slots);
        self.by_target.clone_from(&snap.by_target);
        self.score = snap.score;
        self.guide_count = snap.guide_count;
    }
}
