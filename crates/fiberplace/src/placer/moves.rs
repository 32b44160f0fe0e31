//! Single-slot moves shared by the optimizer and manual edits.

use super::field::Field;
use super::types::{ForceCode, MoveRejected};
use crate::catalog::TargetId;
use crate::configuration::Configuration;

/// Applies moves against one field under a guide-star minimum.
#[derive(Clone, Copy, Debug)]
pub struct Mover<'f> {
    field: &'f Field,
    min_guides: usize,
    /// Guide-minimum check suspended.
    initializing: bool,
}

impl<'f> Mover<'f> {
    pub fn new(field: &'f Field, min_guides: usize) -> Self {
        Self {
            field,
            min_guides,
            initializing: false,
        }
    }

    pub fn initializing(mut self, on: bool) -> Self {
        self.initializing = on;
        self
    }

    pub fn field(&self) -> &'f Field {
        self.field
    }

    pub fn min_guides(&self) -> usize {
        self.min_guides
    }

    /// Put `target` in `slot` under `force`. All-or-nothing: on success the
    /// evicted slots are returned, on failure `config` is unchanged.
    ///
    /// Reachability is not checked here; callers draw from `candidates`.
    pub fn add_object(
        &self,
        config: &mut Configuration,
        slot: usize,
        target: TargetId,
        force: ForceCode,
    ) -> Result<Vec<usize>, MoveRejected> {
        let current = config.get(slot).target;
        if current == Some(target) && force != ForceCode::ForceAlways {
            return Err(MoveRejected::AlreadyThere);
        }

        let mut evict = Vec::new();
        if let Some(other) = config.index_of_target(target) {
            if other != slot {
                match force {
                    ForceCode::Never => return Err(MoveRejected::HeldElsewhere),
                    ForceCode::ForceUnpinned if config.is_pinned(other) => {
                        return Err(MoveRejected::HeldElsewhere)
                    }
                    _ => evict.push(other),
                }
            }
        }

        for (s, t) in config.assigned() {
            if s == slot || t == target {
                continue;
            }
            if self.field.collides(slot, target, s, t) {
                match force {
                    ForceCode::Never => return Err(MoveRejected::Collision),
                    ForceCode::ForceUnpinned if config.is_pinned(s) => {
                        return Err(MoveRejected::Collision)
                    }
                    _ => evict.push(s),
                }
            }
        }

        if !self.initializing {
            let before = config.guide_count();
            let lost = evict.iter().filter(|&&s| config.is_guide(s)).count();
            let gained = usize::from(config.is_guide(slot) && current.is_none());
            let after = (before + gained).saturating_sub(lost);
            if after < self.min_guides && after < before {
                return Err(MoveRejected::GuideMinimum);
            }
        }

        for &s in &evict {
            config.unassign(s);
        }
        config.assign(
            slot,
            target,
            self.field.weight(target),
            force == ForceCode::ForceAlways,
        );
        Ok(evict)
    }

    /// Best-weight target that fits `slot` without disturbing anything.
    pub fn select_object_for_fiber(&self, config: &mut Configuration, slot: usize) -> Option<TargetId> {
        self.field
            .candidates(slot)
            .iter()
            .copied()
            .find(|&t| self.add_object(config, slot, t, ForceCode::Never).is_ok())
    }
}
