//! Cosmetic progress simulation.
//!
//! The backends report nothing while they work, so each tool shows a
//! percentage that advances on a fixed tick. [`ProgressSimulator`] owns the
//! one timer task a tool may have: `start` cancels any previous task before
//! spawning a new one, `stop` is idempotent, and dropping the simulator
//! cancels the task too.
//!
//! A generation counter guards the shared percentage, so a tick that was
//! already running when `stop` was called cannot overwrite the value that
//! `stop` or `complete` left behind.

use crate::config::ToolKind;
use crate::observer::SharedObserver;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::task::{AbortHandle, JoinHandle};
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::debug;

/// Shape of the simulated progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressCurve {
    /// Constant `step` per tick up to 100, then the timer stops itself.
    Linear { step: u8 },
    /// Large steps first, shrinking as `ceiling` approaches; the timer stops
    /// at the ceiling and waits for [`ProgressSimulator::complete`].
    Decelerating { ceiling: u8 },
}

impl ProgressCurve {
    /// Value after one tick from `current`.
    pub fn next(self, current: u8) -> u8 {
        match self {
            ProgressCurve::Linear { step } => current.saturating_add(step.max(1)).min(100),
            ProgressCurve::Decelerating { ceiling } => {
                let ceiling = ceiling.min(100);
                if current >= ceiling {
                    return ceiling;
                }
                let step = ((ceiling - current) / 8).max(1);
                current + step
            }
        }
    }

    /// Value at which the timer cancels itself.
    pub fn limit(self) -> u8 {
        match self {
            ProgressCurve::Linear { .. } => 100,
            ProgressCurve::Decelerating { ceiling } => ceiling.min(100),
        }
    }
}

#[derive(Debug, Default)]
struct Shared {
    generation: u64,
    percent: u8,
}

/// The single repeating progress task of one tool session.
///
/// `start` must be called from inside a tokio runtime.
pub struct ProgressSimulator {
    tool: ToolKind,
    period: Duration,
    curve: ProgressCurve,
    shared: Arc<Mutex<Shared>>,
    handle: Option<JoinHandle<()>>,
    observer: SharedObserver,
}

fn lock(shared: &Mutex<Shared>) -> MutexGuard<'_, Shared> {
    shared.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl ProgressSimulator {
    pub fn new(
        tool: ToolKind,
        period: Duration,
        curve: ProgressCurve,
        observer: SharedObserver,
    ) -> Self {
        Self {
            tool,
            period: period.max(Duration::from_millis(1)),
            curve,
            shared: Arc::new(Mutex::new(Shared::default())),
            handle: None,
            observer,
        }
    }

    /// Cancel any running timer, reset to 0 and start ticking.
    pub fn start(&mut self) {
        self.stop();
        let generation = {
            let mut s = lock(&self.shared);
            s.percent = 0;
            s.generation
        };
        self.observer.on_progress(self.tool, 0);

        let shared = Arc::clone(&self.shared);
        let observer = Arc::clone(&self.observer);
        let (tool, period, curve) = (self.tool, self.period, self.curve);

        debug!("{tool}: progress timer started ({}ms tick)", period.as_millis());
        self.handle = Some(tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let next = {
                    let mut s = lock(&shared);
                    if s.generation != generation {
                        return;
                    }
                    s.percent = curve.next(s.percent);
                    s.percent
                };
                observer.on_progress(tool, next);
                if next >= curve.limit() {
                    debug!("{tool}: progress timer reached {next}%");
                    return;
                }
            }
        }));
    }

    /// Cancel the timer. Safe to call any number of times.
    pub fn stop(&mut self) {
        lock(&self.shared).generation += 1;
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }

    /// Stop the timer and jump to 100.
    pub fn complete(&mut self) {
        self.stop();
        lock(&self.shared).percent = 100;
        self.observer.on_progress(self.tool, 100);
    }

    /// Stop the timer and return to 0.
    pub fn reset(&mut self) {
        self.stop();
        lock(&self.shared).percent = 0;
        self.observer.on_progress(self.tool, 0);
    }

    pub fn progress(&self) -> u8 {
        lock(&self.shared).percent
    }

    /// Guard that cancels the current timer if the caller is dropped
    /// mid-flight.
    pub fn stop_on_drop(&self) -> StopOnDrop {
        StopOnDrop {
            shared: Arc::clone(&self.shared),
            generation: lock(&self.shared).generation,
            abort: self.handle.as_ref().map(JoinHandle::abort_handle),
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }
}

/// Stops the timer it was taken from when dropped, unless the timer was
/// already stopped, completed or restarted in the meantime.
pub struct StopOnDrop {
    shared: Arc<Mutex<Shared>>,
    generation: u64,
    abort: Option<AbortHandle>,
}

impl Drop for StopOnDrop {
    fn drop(&mut self) {
        let mut s = lock(&self.shared);
        if s.generation == self.generation {
            s.generation += 1;
            if let Some(ref abort) = self.abort {
                abort.abort();
            }
        }
    }
}

impl Drop for ProgressSimulator {
    fn drop(&mut self) {
        self.stop();
    }
}
