//! Parallel matrix construction.
//!
//! Rows are independent: row `i` classifies target `i` against every later
//! target. Each row is one `RowWork` item run on a dedicated rayon pool; rows
//! come back indexed, so the result does not depend on scheduling. The caller
//! thread polls a completion counter and reports 10 % milestones.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use rayon::prelude::*;
use rayon::ThreadPoolBuilder;

use super::classify::classify;
use super::footprint::{FootprintTable, TargetFootprint};
use super::types::{CollisionEntry, CollisionMatrix};
use crate::progress::{percent, Milestones, Observer};

const POLL: Duration = Duration::from_millis(20);
const MAX_WORKERS: usize = 8;

/// Worker count: leave two cores for the caller, at least 1, at most 8.
pub fn default_workers() -> usize {
    let cores = std::thread::available_parallelism().map_or(1, |n| n.get());
    if cores <= 2 {
        1
    } else {
        (cores - 2).min(MAX_WORKERS)
    }
}

/// All entries of one matrix row.
#[derive(Clone, Copy, Debug)]
pub struct RowWork<'a> {
    pub row: usize,
    pub footprints: &'a [TargetFootprint],
    pub button_diameter: f64,
}

impl RowWork<'_> {
    pub fn run(&self) -> Vec<CollisionEntry> {
        let a = &self.footprints[self.row];
        self.footprints[self.row + 1..]
            .iter()
            .map(|b| classify(a, b, self.button_diameter))
            .collect()
    }
}

#[derive(Clone, Debug)]
pub struct MatrixBuilder {
    workers: usize,
}

impl Default for MatrixBuilder {
    fn default() -> Self {
        Self {
            workers: default_workers(),
        }
    }
}

impl MatrixBuilder {
    pub fn with_workers(workers: usize) -> Self {
        Self {
            workers: workers.max(1),
        }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Full matrix over every target in `table`. Progress ends with 100.
    pub fn build(&self, table: &FootprintTable, observer: &mut dyn Observer) -> CollisionMatrix {
        let start = Instant::now();
        let n = table.len();
        let d = table.cfg().button_diameter();
        let jobs: Vec<RowWork<'_>> = (0..n)
            .map(|row| RowWork {
                row,
                footprints: table.footprints(),
                button_diameter: d,
            })
            .collect();
        let done = AtomicUsize::new(0);

        let joined = std::thread::scope(|s| {
            let handle = s.spawn(|| self.run_rows(&jobs, &done));
            let mut milestones = Milestones::new(10);
            while !handle.is_finished() {
                if let Some(p) = milestones.reach(percent(done.load(Ordering::Relaxed), n)) {
                    observer.on_progress(p);
                }
                std::thread::sleep(POLL);
            }
            handle.join()
        });
        let rows = match joined {
            Ok(rows) => rows,
            Err(panic) => std::panic::resume_unwind(panic),
        };
        observer.on_progress(100);

        tracing::info!(
            targets = n,
            workers = self.workers,
            elapsed_s = start.elapsed().as_secs_f64(),
            "collision matrix created"
        );
        CollisionMatrix::from_rows(rows).unwrap_or_else(|| CollisionMatrix::with_targets(n))
    }

    fn run_rows(&self, jobs: &[RowWork<'_>], done: &AtomicUsize) -> Vec<Vec<CollisionEntry>> {
        let run = |job: &RowWork<'_>| {
            let row = job.run();
            done.fetch_add(1, Ordering::Relaxed);
            row
        };
        match ThreadPoolBuilder::new().num_threads(self.workers).build() {
            Ok(pool) => pool.install(|| jobs.par_iter().map(run).collect()),
            Err(e) => {
                tracing::warn!(error = %e, "worker pool unavailable, building rows sequentially");
                jobs.iter().map(run).collect()
            }
        }
    }

    /// Bring `matrix` up to date with targets appended to `table` since it
    /// was built. O(N) per new target; existing entries are untouched.
    pub fn extend(&self, matrix: &mut CollisionMatrix, table: &FootprintTable) {
        let fps = table.footprints();
        let d = table.cfg().button_diameter();
        while matrix.len() < fps.len() {
            let new = matrix.len();
            let column = fps[..new]
                .iter()
                .map(|a| classify(a, &fps[new], d))
                .collect();
            matrix.push_target(column);
        }
    }
}
