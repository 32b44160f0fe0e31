//! Collision matrix data types.
//!
//! Kept small and explicit so `classify`, `build` and the placer read the
//! same vocabulary: fibers are slot indices into the active-fiber list,
//! targets are `TargetId`s.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::catalog::TargetId;

/// Growable bitset over fiber slots.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FiberMask(Vec<u64>);

impl FiberMask {
    #[inline]
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn insert(&mut self, slot: usize) {
        let (w, b) = (slot / 64, slot % 64);
        if self.0.len() <= w {
            self.0.resize(w + 1, 0);
        }
        self.0[w] |= 1u64 << b;
    }

    #[inline]
    pub fn contains(&self, slot: usize) -> bool {
        let (w, b) = (slot / 64, slot % 64);
        self.0.get(w).is_some_and(|word| word & (1u64 << b) != 0)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.iter().all(|w| *w == 0)
    }

    /// Set slots in increasing order.
    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.0.iter().enumerate().flat_map(|(w, &word)| {
            (0..64).filter_map(move |b| (word & (1u64 << b) != 0).then_some(w * 64 + b))
        })
    }

    /// One past the highest set slot (0 when empty).
    pub fn bound(&self) -> usize {
        self.iter().last().map_or(0, |s| s + 1)
    }
}

impl FromIterator<usize> for FiberMask {
    fn from_iter<I: IntoIterator<Item = usize>>(iter: I) -> Self {
        let mut m = FiberMask::new();
        for s in iter {
            m.insert(s);
        }
        m
    }
}

/// Fiber `fiber` on the row target collides with every fiber in `blocked` on
/// the column target.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Overlap {
    pub fiber: usize,
    pub blocked: FiberMask,
}

/// Pairwise relationship of two targets.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CollisionEntry {
    /// Buttons overlap: never assignable together.
    AlwaysCollide,
    NeverCollide,
    /// Collides only for the listed fiber combinations. Rows are sorted by
    /// fiber and never empty.
    Conditional(Vec<Overlap>),
}

impl CollisionEntry {
    /// Does `row_fiber` on the row target collide with `col_fiber` on the
    /// column target?
    pub fn collides(&self, row_fiber: usize, col_fiber: usize) -> bool {
        match self {
            CollisionEntry::AlwaysCollide => true,
            CollisionEntry::NeverCollide => false,
            CollisionEntry::Conditional(rows) => rows
                .binary_search_by_key(&row_fiber, |o| o.fiber)
                .is_ok_and(|k| rows[k].blocked.contains(col_fiber)),
        }
    }

    /// Same relationship seen from the column target.
    pub fn transposed(&self) -> CollisionEntry {
        match self {
            CollisionEntry::Conditional(rows) => {
                let mut cols: BTreeMap<usize, FiberMask> = BTreeMap::new();
                for o in rows {
                    for b in o.blocked.iter() {
                        cols.entry(b).or_default().insert(o.fiber);
                    }
                }
                CollisionEntry::Conditional(
                    cols.into_iter()
                        .map(|(fiber, blocked)| Overlap { fiber, blocked })
                        .collect(),
                )
            }
            other => other.clone(),
        }
    }

    /// One past the highest fiber slot mentioned.
    fn fiber_bound(&self) -> usize {
        match self {
            CollisionEntry::Conditional(rows) => rows
                .iter()
                .map(|o| (o.fiber + 1).max(o.blocked.bound()))
                .max()
                .unwrap_or(0),
            _ => 0,
        }
    }
}

/// Upper-triangular table of `CollisionEntry` over N targets.
///
/// Invariants:
/// - `rows[i]` holds the entries `(i, j)` for `j = i+1 .. N`, in order.
/// - Append-only: adding a target appends one entry to every existing row and
///   one empty row; existing entries never change.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollisionMatrix {
    rows: Vec<Vec<CollisionEntry>>,
}

impl CollisionMatrix {
    /// Matrix over `n` targets with every pair `NeverCollide`.
    pub fn with_targets(n: usize) -> Self {
        Self {
            rows: (0..n)
                .map(|i| vec![CollisionEntry::NeverCollide; n - i - 1])
                .collect(),
        }
    }

    /// Adopt prebuilt rows; None if the rows are not triangular.
    pub fn from_rows(rows: Vec<Vec<CollisionEntry>>) -> Option<Self> {
        let m = Self { rows };
        m.is_well_formed().then_some(m)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[Vec<CollisionEntry>] {
        &self.rows
    }

    pub fn is_well_formed(&self) -> bool {
        let n = self.rows.len();
        self.rows.iter().enumerate().all(|(i, r)| r.len() == n - i - 1)
    }

    /// True when every conditional entry only mentions slots below `n_fibers`.
    pub fn fits_fibers(&self, n_fibers: usize) -> bool {
        self.rows
            .iter()
            .flatten()
            .all(|e| e.fiber_bound() <= n_fibers)
    }

    /// Entry for `i < j < N`.
    pub fn entry(&self, i: TargetId, j: TargetId) -> Option<&CollisionEntry> {
        if i.0 >= j.0 {
            return None;
        }
        self.rows.get(i.0)?.get(j.0 - i.0 - 1)
    }

    /// Store the relationship of `a` and `b` in either order.
    ///
    /// Panics when `a == b` or either index is out of range.
    pub fn set(&mut self, a: TargetId, b: TargetId, entry: CollisionEntry) {
        assert!(a != b, "a target does not collide with itself");
        let (i, j, e) = if a.0 < b.0 {
            (a.0, b.0, entry)
        } else {
            (b.0, a.0, entry.transposed())
        };
        assert!(j < self.rows.len(), "target index out of range");
        self.rows[i][j - i - 1] = e;
    }

    /// Append a target; `column[i]` is the entry `(i, new)` for every
    /// existing target `i`.
    pub fn push_target(&mut self, column: Vec<CollisionEntry>) {
        debug_assert_eq!(column.len(), self.rows.len());
        for (row, e) in self.rows.iter_mut().zip(column) {
            row.push(e);
        }
        self.rows.push(Vec::new());
    }

    /// Do fiber `fa` on target `a` and fiber `fb` on target `b` collide?
    /// A target never shares the plate with itself, so `a == b` collides.
    pub fn collides(&self, fa: usize, a: TargetId, fb: usize, b: TargetId) -> bool {
        if a == b {
            return true;
        }
        let (lo, row_fiber, hi, col_fiber) = if a.0 < b.0 {
            (a, fa, b, fb)
        } else {
            (b, fb, a, fa)
        };
        self.entry(lo, hi)
            .is_some_and(|e| e.collides(row_fiber, col_fiber))
    }
}
