//! Schedulers for time-based effect operators
//!
//! [`Effect::delay`](crate::effect::Effect::delay), `debounce` and `throttle`
//! take an `Arc<dyn Scheduler>` so tests can substitute virtual time
//! (`TestScheduler` in the testing crate) for the tokio clock.

use crate::disposable::Disposable;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::runtime::Handle;

/// Unit of scheduled work
pub type Work = Box<dyn FnOnce() + Send>;

/// Runs work after a delay and reports the current time
pub trait Scheduler: Send + Sync + 'static {
    /// Time elapsed since the scheduler's origin
    fn now(&self) -> Duration;

    /// Run `work` once `delay` has elapsed
    ///
    /// Disposing the returned handle before the deadline cancels the work.
    fn schedule_after(&self, delay: Duration, work: Work) -> Disposable;

    /// Run `work` as soon as possible
    fn schedule(&self, work: Work) -> Disposable {
        self.schedule_after(Duration::ZERO, work)
    }

    /// Identity of the clock behind [`now`](Self::now)
    ///
    /// Handles sharing one clock return the same id. Readings of different
    /// clocks are not comparable. `None` when the scheduler cannot tell.
    fn clock_id(&self) -> Option<u64> {
        None
    }
}

static NEXT_CLOCK: AtomicU64 = AtomicU64::new(1);

/// A clock id no other scheduler has been given
#[must_use]
pub fn fresh_clock_id() -> u64 {
    NEXT_CLOCK.fetch_add(1, Ordering::Relaxed)
}

/// Runs work synchronously, ignoring delays
#[derive(Debug, Clone, Copy)]
pub struct ImmediateScheduler {
    origin: std::time::Instant,
    clock: u64,
}

impl ImmediateScheduler {
    /// Create an immediate scheduler
    #[must_use]
    pub fn new() -> Self {
        Self {
            origin: std::time::Instant::now(),
            clock: fresh_clock_id(),
        }
    }

    /// Shared handle for use with time-based operators
    #[must_use]
    pub fn shared() -> Arc<dyn Scheduler> {
        Arc::new(Self::new())
    }
}

impl Default for ImmediateScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler for ImmediateScheduler {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }

    fn schedule_after(&self, _delay: Duration, work: Work) -> Disposable {
        work();
        Disposable::empty()
    }

    fn clock_id(&self) -> Option<u64> {
        Some(self.clock)
    }
}

/// Schedules work as tokio tasks sleeping on the tokio clock
///
/// Work scheduled outside a tokio runtime is dropped with an error log.
#[derive(Debug, Clone, Copy)]
pub struct TokioScheduler {
    origin: tokio::time::Instant,
    clock: u64,
}

impl TokioScheduler {
    /// Create a scheduler whose origin is now
    #[must_use]
    pub fn new() -> Self {
        Self {
            origin: tokio::time::Instant::now(),
            clock: fresh_clock_id(),
        }
    }

    /// Shared handle for use with time-based operators
    #[must_use]
    pub fn shared() -> Arc<dyn Scheduler> {
        Arc::new(Self::new())
    }
}

impl Default for TokioScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler for TokioScheduler {
    fn now(&self) -> Duration {
        tokio::time::Instant::now().duration_since(self.origin)
    }

    fn schedule_after(&self, delay: Duration, work: Work) -> Disposable {
        let Ok(handle) = Handle::try_current() else {
            tracing::error!(?delay, "work scheduled outside a tokio runtime was dropped");
            return Disposable::empty();
        };
        let task = handle.spawn(async move {
            tokio::time::sleep(delay).await;
            work();
        });
        Disposable::new(move || task.abort())
    }

    fn clock_id(&self) -> Option<u64> {
        Some(self.clock)
    }
}
