//! Progress reporting for long-running operations.
//!
//! Matrix construction and the optimizer report percent complete at 10 %
//! milestones and (optimizer only) the current score at most every 100 ms.
//! Observers are plain callbacks; `ChannelObserver` forwards events to
//! another thread.

use std::time::{Duration, Instant};

use crossbeam_channel::Sender;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProgressEvent {
    Progress(u8),
    Score(u64),
}

/// Receives progress callbacks. Both methods default to no-ops.
pub trait Observer {
    fn on_progress(&mut self, _percent: u8) {}
    fn on_score_update(&mut self, _score: u64) {}
}

/// Ignores everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopObserver;

impl Observer for NoopObserver {}

/// Records events in order.
impl Observer for Vec<ProgressEvent> {
    fn on_progress(&mut self, percent: u8) {
        self.push(ProgressEvent::Progress(percent));
    }

    fn on_score_update(&mut self, score: u64) {
        self.push(ProgressEvent::Score(score));
    }
}

/// Sends events over a channel. A dropped receiver is not an error.
#[derive(Clone, Debug)]
pub struct ChannelObserver {
    tx: Sender<ProgressEvent>,
}

impl ChannelObserver {
    pub fn new(tx: Sender<ProgressEvent>) -> Self {
        Self { tx }
    }
}

impl Observer for ChannelObserver {
    fn on_progress(&mut self, percent: u8) {
        let _ = self.tx.send(ProgressEvent::Progress(percent));
    }

    fn on_score_update(&mut self, score: u64) {
        let _ = self.tx.send(ProgressEvent::Score(score));
    }
}

/// Integer percent of `done / total`, clamped to 100. Empty work is complete.
#[inline]
pub(crate) fn percent(done: usize, total: usize) -> u8 {
    if total == 0 {
        return 100;
    }
    ((done.min(total) as u128 * 100) / total as u128) as u8
}

/// Emits a percentage only when it reaches the next milestone.
#[derive(Clone, Debug)]
pub(crate) struct Milestones {
    step: u8,
    next: u8,
}

impl Milestones {
    pub(crate) fn new(step: u8) -> Self {
        Self {
            step: step.max(1),
            next: step.max(1),
        }
    }

    pub(crate) fn reach(&mut self, pct: u8) -> Option<u8> {
        if pct < self.next || pct >= 100 {
            return None;
        }
        self.next = (pct / self.step + 1).saturating_mul(self.step);
        Some(pct)
    }
}

#[derive(Clone, Debug)]
pub(crate) struct RateLimit {
    interval: Duration,
    last: Option<Instant>,
}

impl RateLimit {
    pub(crate) fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: None,
        }
    }

    /// True at most once per interval.
    pub(crate) fn ready(&mut self) -> bool {
        let now = Instant::now();
        match self.last {
            Some(t) if now.duration_since(t) < self.interval => false,
            _ => {
                self.last = Some(now);
                true
            }
        }
    }
}

pub(crate) const SCORE_INTERVAL: Duration = Duration::from_millis(100);

/// Step counter for the optimizer: milestones plus rate-limited score.
pub(crate) struct StepReporter {
    total: usize,
    done: usize,
    milestones: Milestones,
    scores: RateLimit,
}

impl StepReporter {
    pub(crate) fn new(total: usize) -> Self {
        Self {
            total,
            done: 0,
            milestones: Milestones::new(10),
            scores: RateLimit::new(SCORE_INTERVAL),
        }
    }

    pub(crate) fn tick(&mut self, observer: &mut dyn Observer, score: u64) {
        self.done += 1;
        if let Some(p) = self.milestones.reach(percent(self.done, self.total)) {
            observer.on_progress(p);
        }
        if self.scores.ready() {
            observer.on_score_update(score);
        }
    }
}
