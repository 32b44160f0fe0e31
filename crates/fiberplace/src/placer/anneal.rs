//! Two-phase simulated annealing.
//!
//! Model
//! - Initialize: clear non-pinned slots, greedily fill guide slots, then the
//!   rest, each with its best-weight non-conflicting candidate. Fails when the
//!   guide minimum cannot be met.
//! - Step: pick a random movable slot and a weight-proportional candidate,
//!   force it in (evicting non-pinned conflicts), refill evicted slots
//!   greedily, then accept by Metropolis on the score delta.
//! - Phase 1 runs `k ∈ [0, M)` on the explore schedule, phase 2 `k ∈ [M/2, M)`
//!   on the refine schedule; progress counts `1.5·M` steps in total.
//! - The best configuration seen (strictly higher score) is restored at the
//!   end.

use std::collections::HashSet;
use std::ops::Range;

use rand::Rng;

use super::field::Field;
use super::moves::Mover;
use super::types::{AnnealCfg, ForceCode, Outcome, Phase, PlacerState, Schedule};
use crate::configuration::{Configuration, Snapshot};
use crate::progress::{Observer, StepReporter};

/// Per-run annealing state.
struct Run {
    /// Non-pinned slots with at least one candidate.
    movable: Vec<usize>,
    best: Snapshot,
    scratch: Snapshot,
    report: StepReporter,
}

pub struct Placer<'f, R: Rng> {
    field: &'f Field,
    min_guides: usize,
    cfg: AnnealCfg,
    rng: R,
    state: PlacerState,
}

impl<'f, R: Rng> Placer<'f, R> {
    pub fn new(field: &'f Field, min_guides: usize, rng: R) -> Self {
        Self {
            field,
            min_guides,
            cfg: AnnealCfg::default(),
            rng,
            state: PlacerState::Idle,
        }
    }

    pub fn with_cfg(mut self, cfg: AnnealCfg) -> Self {
        self.cfg = cfg;
        self
    }

    pub fn state(&self) -> PlacerState {
        self.state
    }

    fn mover(&self) -> Mover<'f> {
        Mover::new(self.field, self.min_guides)
            .initializing(self.state == PlacerState::Initializing)
    }

    /// Run initialization and both annealing phases on `config`.
    pub fn optimize(
        &mut self,
        config: &mut Configuration,
        steps: usize,
        observer: &mut dyn Observer,
    ) -> Outcome {
        let prior = config.snapshot();
        self.state = PlacerState::Initializing;
        if !self.initialize(config) {
            tracing::warn!(
                guides = config.guide_count(),
                min = self.min_guides,
                "not enough guide stars available to create a configuration"
            );
            config.restore(&prior);
            self.state = PlacerState::Idle;
            observer.on_progress(100);
            return Outcome {
                best: config.clone(),
                success: false,
            };
        }
        tracing::debug!(
            score = config.score(),
            guides = config.guide_count(),
            "initial configuration"
        );

        let mut run = Run {
            movable: (0..config.len())
                .filter(|&s| !config.is_pinned(s) && !self.field.candidates(s).is_empty())
                .collect(),
            best: config.snapshot(),
            scratch: Snapshot::default(),
            report: StepReporter::new(steps + (steps - steps / 2)),
        };

        self.state = PlacerState::Annealing(Phase::Explore);
        let explore = self.cfg.explore;
        self.run_phase(config, explore, 0..steps, steps, &mut run, observer);

        self.state = PlacerState::Annealing(Phase::Refine);
        let refine = self.cfg.refine;
        self.run_phase(config, refine, steps / 2..steps, steps, &mut run, observer);

        self.state = PlacerState::Finalizing;
        config.restore(&run.best);
        observer.on_progress(100);
        observer.on_score_update(config.score());
        tracing::info!(
            score = config.score(),
            guides = config.guide_count(),
            steps,
            "annealing finished"
        );
        self.state = PlacerState::Idle;
        Outcome {
            best: config.clone(),
            success: true,
        }
    }

    fn run_phase(
        &mut self,
        config: &mut Configuration,
        schedule: Schedule,
        range: Range<usize>,
        max: usize,
        run: &mut Run,
        observer: &mut dyn Observer,
    ) {
        for k in range {
            let t = schedule.temperature(k, max);
            self.step(config, t, run);
            run.report.tick(observer, config.score());
        }
    }

    /// Clear, then fill guide slots before the rest. False when the guide
    /// minimum is out of reach.
    fn initialize(&mut self, config: &mut Configuration) -> bool {
        if !self.guide_minimum_reachable(config) {
            return false;
        }
        config.clear_unpinned();
        let mover = self.mover();
        for s in self.field.guide_slots() {
            if config.get(s).target.is_none() {
                mover.select_object_for_fiber(config, s);
            }
        }
        for s in 0..config.len() {
            if !self.field.is_guide_slot(s) && config.get(s).target.is_none() {
                mover.select_object_for_fiber(config, s);
            }
        }
        config.guide_count() >= self.min_guides
    }

    /// Upper bound on guide stars: usable guide slots and distinct reachable
    /// guide targets, counting pinned ones.
    fn guide_minimum_reachable(&self, config: &Configuration) -> bool {
        let mut slots = 0;
        let mut targets = HashSet::new();
        for s in self.field.guide_slots() {
            let slot = config.get(s);
            match slot.target {
                Some(t) if slot.pinned => {
                    slots += 1;
                    targets.insert(t);
                }
                _ => {
                    let cands = self.field.candidates(s);
                    if !cands.is_empty() {
                        slots += 1;
                        targets.extend(cands.iter().copied());
                    }
                }
            }
        }
        slots.min(targets.len()) >= self.min_guides
    }

    fn step(&mut self, config: &mut Configuration, temperature: f64, run: &mut Run) {
        if run.movable.is_empty() {
            return;
        }
        let slot = run.movable[self.rng.gen_range(0..run.movable.len())];
        let Some(target) = self.field.sample_candidate(slot, &mut self.rng) else {
            return;
        };
        config.snapshot_into(&mut run.scratch);
        let before = config.score();
        let mover = self.mover();
        match mover.add_object(config, slot, target, ForceCode::ForceUnpinned) {
            Ok(evicted) => {
                for s in evicted {
                    mover.select_object_for_fiber(config, s);
                }
            }
            Err(_) => return,
        }
        let delta = config.score() as f64 - before as f64;
        if accept(delta, temperature, &mut self.rng) {
            if config.score() > run.best.score() {
                config.snapshot_into(&mut run.best);
            }
        } else {
            config.restore(&run.scratch);
        }
    }
}

/// Metropolis criterion; at zero temperature only non-worsening moves pass.
fn accept<R: Rng>(delta: f64, temperature: f64, rng: &mut R) -> bool {
    if delta >= 0.0 {
        return true;
    }
    if temperature <= 0.0 {
        return false;
    }
    let u: f64 = rng.gen();
    delta / temperature > u.ln()
}

/// Convenience entry point with the default schedules.
pub fn optimize<R: Rng>(
    field: &Field,
    config: &mut Configuration,
    min_guides: usize,
    steps: usize,
    rng: R,
    observer: &mut dyn Observer,
) -> Outcome {
    Placer::new(field, min_guides, rng).optimize(config, steps, observer)
}
