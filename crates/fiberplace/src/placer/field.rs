//! Field context: everything the placer reads but never changes during a run.
//!
//! - slots: active fibers in order, with their guide flag;
//! - targets and weights;
//! - per slot the reachable targets, highest weight first, plus a weighted
//!   sampler over them;
//! - the collision matrix.

use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;

use crate::catalog::{Target, TargetId};
use crate::collision::{
    load_or_build, CollisionMatrix, FootprintTable, MatrixBuilder, MatrixSource, MatrixStore,
};
use crate::configuration::Configuration;
use crate::fiber::{Fiber, FiberId, InstrumentCfg};
use crate::progress::Observer;

/// One fiber slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SlotInfo {
    pub fiber: FiberId,
    pub guide: bool,
}

#[derive(Clone, Debug)]
pub struct Field {
    slots: Vec<SlotInfo>,
    targets: Vec<Target>,
    candidates: Vec<Vec<TargetId>>,
    samplers: Vec<Option<WeightedIndex<f64>>>,
    matrix: CollisionMatrix,
    table: Option<FootprintTable>,
}

impl Field {
    /// Field from explicit parts. `reach[s]` lists the targets slot `s` can
    /// reach (any order); target ids must equal their index.
    pub fn from_parts(
        slots: Vec<SlotInfo>,
        targets: Vec<Target>,
        reach: Vec<Vec<TargetId>>,
        matrix: CollisionMatrix,
    ) -> Self {
        debug_assert_eq!(slots.len(), reach.len());
        debug_assert_eq!(targets.len(), matrix.len());
        debug_assert!(targets.iter().enumerate().all(|(i, t)| t.id.0 == i));
        let mut field = Self {
            slots,
            targets,
            candidates: reach,
            samplers: Vec::new(),
            matrix,
            table: None,
        };
        for s in 0..field.candidates.len() {
            field.sort_candidates(s);
        }
        field.samplers = (0..field.candidates.len())
            .map(|s| field.sampler_for(s))
            .collect();
        field
    }

    /// Compute footprints and the collision matrix for `fibers` (inactive
    /// ones are skipped) and `targets`.
    pub fn build(
        cfg: &InstrumentCfg,
        fibers: &[Fiber],
        targets: Vec<Target>,
        builder: &MatrixBuilder,
        observer: &mut dyn Observer,
    ) -> Self {
        let table = FootprintTable::prepare(cfg, fibers, &targets);
        let matrix = builder.build(&table, observer);
        Self::assemble(targets, table, matrix)
    }

    /// As `build`, reusing a stored matrix under `key` when it fits.
    pub fn build_cached(
        cfg: &InstrumentCfg,
        fibers: &[Fiber],
        targets: Vec<Target>,
        builder: &MatrixBuilder,
        store: &mut dyn MatrixStore,
        key: &str,
        observer: &mut dyn Observer,
    ) -> (Self, MatrixSource) {
        let table = FootprintTable::prepare(cfg, fibers, &targets);
        let (matrix, source) = load_or_build(store, key, &table, builder, observer);
        (Self::assemble(targets, table, matrix), source)
    }

    fn assemble(targets: Vec<Target>, table: FootprintTable, matrix: CollisionMatrix) -> Self {
        let slots = table
            .fibers()
            .iter()
            .map(|f| SlotInfo {
                fiber: f.id,
                guide: f.is_guide(),
            })
            .collect::<Vec<_>>();
        let mut reach = vec![Vec::new(); slots.len()];
        for fp in table.footprints() {
            for s in fp.slots() {
                reach[s].push(fp.target);
            }
        }
        let mut field = Self::from_parts(slots, targets, reach, matrix);
        field.table = Some(table);
        field
    }

    fn sort_candidates(&mut self, slot: usize) {
        let targets = &self.targets;
        self.candidates[slot].sort_by(|a, b| targets[b.0].weight.cmp(&targets[a.0].weight));
    }

    fn sampler_for(&self, slot: usize) -> Option<WeightedIndex<f64>> {
        let weights = self.candidates[slot]
            .iter()
            .map(|t| f64::from(self.targets[t.0].weight));
        WeightedIndex::new(weights).ok()
    }

    /// Append a target; footprints and the matrix grow in O(N). Returns the
    /// new id, or None for fields assembled from parts.
    pub fn add_target(&mut self, mut target: Target, builder: &MatrixBuilder) -> Option<TargetId> {
        let table = self.table.as_mut()?;
        let id = TargetId(self.targets.len());
        target.id = id;
        let reached: Vec<usize> = table.push(&target).slots().collect();
        builder.extend(&mut self.matrix, table);
        self.targets.push(target);
        for s in reached {
            self.candidates[s].push(id);
            self.sort_candidates(s);
            self.samplers[s] = self.sampler_for(s);
        }
        Some(id)
    }

    /// Empty configuration sized for this field.
    pub fn new_configuration(&self) -> Configuration {
        Configuration::new(self.slots.iter().map(|s| s.guide).collect(), self.targets.len())
    }

    #[inline]
    pub fn n_slots(&self) -> usize {
        self.slots.len()
    }

    pub fn slots(&self) -> &[SlotInfo] {
        &self.slots
    }

    #[inline]
    pub fn is_guide_slot(&self, slot: usize) -> bool {
        self.slots[slot].guide
    }

    pub fn guide_slots(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.slots.len()).filter(|&s| self.slots[s].guide)
    }

    pub fn slot_of_fiber(&self, fiber: FiberId) -> Option<usize> {
        self.slots.iter().position(|s| s.fiber == fiber)
    }

    pub fn targets(&self) -> &[Target] {
        &self.targets
    }

    #[inline]
    pub fn target(&self, id: TargetId) -> &Target {
        &self.targets[id.0]
    }

    #[inline]
    pub fn weight(&self, id: TargetId) -> u32 {
        self.targets[id.0].weight
    }

    pub fn target_by_obj(&self, obj_id: u64) -> Option<TargetId> {
        self.targets.iter().find(|t| t.obj_id == obj_id).map(|t| t.id)
    }

    /// Reachable targets of `slot`, highest weight first.
    #[inline]
    pub fn candidates(&self, slot: usize) -> &[TargetId] {
        &self.candidates[slot]
    }

    pub fn can_reach(&self, slot: usize, target: TargetId) -> bool {
        self.candidates[slot].contains(&target)
    }

    pub fn matrix(&self) -> &CollisionMatrix {
        &self.matrix
    }

    pub fn footprints(&self) -> Option<&FootprintTable> {
        self.table.as_ref()
    }

    #[inline]
    pub fn collides(&self, slot_a: usize, a: TargetId, slot_b: usize, b: TargetId) -> bool {
        self.matrix.collides(slot_a, a, slot_b, b)
    }

    /// Random reachable target, proportional to weight. Uniform when every
    /// weight is zero.
    pub fn sample_candidate<R: Rng>(&self, slot: usize, rng: &mut R) -> Option<TargetId> {
        let cands = &self.candidates[slot];
        if cands.is_empty() {
            return None;
        }
        let k = match &self.samplers[slot] {
            Some(w) => w.sample(rng),
            None => rng.gen_range(0..cands.len()),
        };
        Some(cands[k])
    }

    /// Every pair of occupied slots whose assignments collide.
    pub fn conflicts(&self, config: &Configuration) -> Vec<(usize, usize)> {
        let used: Vec<(usize, TargetId)> = config.assigned().collect();
        let mut out = Vec::new();
        for (k, &(sa, ta)) in used.iter().enumerate() {
            for &(sb, tb) in &used[k + 1..] {
                if self.collides(sa, ta, sb, tb) {
                    out.push((sa, sb));
                }
            }
        }
        out
    }

    /// Slots holding a target they cannot reach.
    pub fn unreachable(&self, config: &Configuration) -> Vec<usize> {
        config
            .assigned()
            .filter(|&(s, t)| !self.can_reach(s, t))
            .map(|(s, _)| s)
            .collect()
    }
}
