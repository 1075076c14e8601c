//! Cancellable one-shot timers.
//!
//! The gate debounces its lock decision through [`DelayScheduler`] so the
//! same logic runs against the tokio clock in production and a hand-cranked
//! clock in tests.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// One-shot deferred callback.
pub type TimerFn = Box<dyn FnOnce() + Send + 'static>;

/// Schedules a callback to run once after a delay, without blocking the
/// caller.
pub trait DelayScheduler: Send + Sync {
    /// Schedule `f` to run after `delay`. The returned handle cancels the
    /// callback if it has not fired yet.
    fn schedule(&self, delay: Duration, f: TimerFn) -> TimerHandle;
}

/// Handle to a scheduled callback.
///
/// Cancellation is best-effort idempotent: cancelling a timer that already
/// fired, or cancelling twice, is a no-op.
pub struct TimerHandle {
    cancel: Box<dyn Fn() + Send + Sync>,
}

impl TimerHandle {
    /// Build a handle from a cancellation closure. The closure must itself
    /// tolerate repeated invocation.
    pub fn from_cancel_fn(cancel: impl Fn() + Send + Sync + 'static) -> Self {
        Self {
            cancel: Box::new(cancel),
        }
    }

    /// Cancel the callback if it has not fired yet.
    pub fn cancel(&self) {
        (self.cancel)();
    }
}

impl std::fmt::Debug for TimerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimerHandle").finish_non_exhaustive()
    }
}

/// Scheduler backed by the tokio runtime clock.
///
/// Must be used from within a runtime context; the callback runs on a
/// spawned task once the delay elapses. Under `#[tokio::test(start_paused =
/// true)]` the delay follows the paused test clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioScheduler;

impl DelayScheduler for TokioScheduler {
    fn schedule(&self, delay: Duration, f: TimerFn) -> TimerHandle {
        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            f();
        });
        // JoinHandle::abort is already an idempotent no-op after completion.
        TimerHandle::from_cancel_fn(move || task.abort())
    }
}

struct ManualEntry {
    due: Duration,
    seq: u64,
    cancelled: Arc<AtomicBool>,
    f: TimerFn,
}

#[derive(Default)]
struct ManualInner {
    now: Duration,
    next_seq: u64,
    entries: Vec<ManualEntry>,
}

/// Deterministic scheduler with an explicit fake clock.
///
/// Nothing fires until [`ManualScheduler::advance`] moves the clock; due
/// callbacks then run on the caller's thread in deadline order (insertion
/// order for equal deadlines). Intended for tests and runtime-free hosts.
#[derive(Clone, Default)]
pub struct ManualScheduler {
    inner: Arc<Mutex<ManualInner>>,
}

impl ManualScheduler {
    /// New scheduler with the clock at zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn inner(&self) -> MutexGuard<'_, ManualInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Number of scheduled, not-yet-fired, not-cancelled callbacks.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.inner()
            .entries
            .iter()
            .filter(|e| !e.cancelled.load(Ordering::SeqCst))
            .count()
    }

    /// Move the clock forward and fire everything that came due.
    ///
    /// Callbacks run outside the scheduler lock, so they may schedule or
    /// cancel further timers.
    pub fn advance(&self, by: Duration) {
        let target = self.inner().now + by;
        loop {
            let entry = {
                let mut inner = self.inner();
                let next = inner
                    .entries
                    .iter()
                    .enumerate()
                    .filter(|(_, e)| e.due <= target)
                    .min_by_key(|(_, e)| (e.due, e.seq))
                    .map(|(i, _)| i);
                match next {
                    Some(i) => {
                        let entry = inner.entries.swap_remove(i);
                        inner.now = inner.now.max(entry.due);
                        entry
                    }
                    None => {
                        inner.now = target;
                        break;
                    }
                }
            };
            if !entry.cancelled.load(Ordering::SeqCst) {
                (entry.f)();
            }
        }
    }
}

impl DelayScheduler for ManualScheduler {
    fn schedule(&self, delay: Duration, f: TimerFn) -> TimerHandle {
        let cancelled = Arc::new(AtomicBool::new(false));
        let mut inner = self.inner();
        let seq = inner.next_seq;
        inner.next_seq += 1;
        let due = inner.now + delay;
        inner.entries.push(ManualEntry {
            due,
            seq,
            cancelled: Arc::clone(&cancelled),
            f,
        });
        drop(inner);
        TimerHandle::from_cancel_fn(move || cancelled.store(true, Ordering::SeqCst))
    }
}

impl std::fmt::Debug for ManualScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ManualScheduler")
            .field("pending", &self.pending())
            .finish()
    }
}
