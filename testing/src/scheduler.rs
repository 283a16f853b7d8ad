//! Virtual-time scheduler
//!
//! Time only moves when the test calls [`TestScheduler::advance`] (or
//! [`run`](TestScheduler::run)). Work due at the same instant runs in the
//! order it was scheduled.

use composable_store_core::disposable::Disposable;
use composable_store_core::scheduler::{Scheduler, Work, fresh_clock_id};
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

#[derive(Default)]
struct Timeline {
    now: Duration,
    next_seq: u64,
    pending: BTreeMap<(Duration, u64), Work>,
}

/// A [`Scheduler`] driven manually by tests
///
/// # Example
///
/// ```
/// use composable_store_core::effect::Effect;
/// use composable_store_testing::TestScheduler;
/// use std::sync::{Arc, Mutex};
/// use std::time::Duration;
///
/// let scheduler = TestScheduler::new();
/// let seen = Arc::new(Mutex::new(Vec::new()));
/// let sink = Arc::clone(&seen);
///
/// let _subscription = Effect::just(1)
///     .delay(Duration::from_secs(1), scheduler.shared())
///     .subscribe(move |value| sink.lock().unwrap().push(value), || {});
///
/// scheduler.advance(Duration::from_millis(999));
/// assert!(seen.lock().unwrap().is_empty());
/// scheduler.advance(Duration::from_millis(1));
/// assert_eq!(*seen.lock().unwrap(), vec![1]);
/// ```
#[derive(Clone)]
pub struct TestScheduler {
    timeline: Arc<Mutex<Timeline>>,
    clock: u64,
}

impl Default for TestScheduler {
    fn default() -> Self {
        Self {
            timeline: Arc::default(),
            clock: fresh_clock_id(),
        }
    }
}

impl std::fmt::Debug for TestScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let timeline = self.timeline.lock();
        f.debug_struct("TestScheduler")
            .field("now", &timeline.now)
            .field("pending", &timeline.pending.len())
            .finish()
    }
}

impl TestScheduler {
    /// Create a scheduler at time zero
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle for passing to time-based operators
    #[must_use]
    pub fn shared(&self) -> Arc<dyn Scheduler> {
        Arc::new(self.clone())
    }

    /// Number of scheduled, not yet run, work items
    #[must_use]
    pub fn pending(&self) -> usize {
        self.timeline.lock().pending.len()
    }

    /// Move time forward by `by`, running everything that becomes due
    pub fn advance(&self, by: Duration) {
        let target = self.timeline.lock().now + by;
        self.advance_to(target);
    }

    /// Move time forward to `instant`, running everything that becomes due
    ///
    /// Work scheduled by running work is honoured if it falls due before
    /// `instant`. Moving backwards is a no-op.
    pub fn advance_to(&self, instant: Duration) {
        loop {
            let due = {
                let mut timeline = self.timeline.lock();
                match timeline.pending.first_key_value() {
                    Some((&(at, _), _)) if at <= instant => {
                        timeline.now = timeline.now.max(at);
                        timeline.pending.pop_first().map(|(_, work)| work)
                    },
                    _ => None,
                }
            };
            match due {
                Some(work) => work(),
                None => break,
            }
        }
        let mut timeline = self.timeline.lock();
        timeline.now = timeline.now.max(instant);
    }

    /// Run until nothing is scheduled
    pub fn run(&self) {
        loop {
            let last = self
                .timeline
                .lock()
                .pending
                .last_key_value()
                .map(|(&(at, _), _)| at);
            match last {
                Some(at) => self.advance_to(at),
                None => break,
            }
        }
    }
}

impl Scheduler for TestScheduler {
    fn now(&self) -> Duration {
        self.timeline.lock().now
    }

    fn clock_id(&self) -> Option<u64> {
        Some(self.clock)
    }

    fn schedule_after(&self, delay: Duration, work: Work) -> Disposable {
        let key = {
            let mut timeline = self.timeline.lock();
            let key = (timeline.now + delay, timeline.next_seq);
            timeline.next_seq += 1;
            timeline.pending.insert(key, work);
            key
        };
        let timeline = Arc::downgrade(&self.timeline);
        Disposable::new(move || {
            if let Some(timeline) = timeline.upgrade() {
                let removed = timeline.lock().pending.remove(&key);
                drop(removed);
            }
        })
    }
}
