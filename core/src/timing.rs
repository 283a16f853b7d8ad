//! Debounce and throttle
//!
//! Both operators are built from cancellation: each new effect registered
//! under the same id with `cancel_in_flight` replaces the previous pending
//! one. A reducer returns `Effect::just(action).debounce(..)` on every
//! keystroke and only the last survives the quiet period.

use crate::cancellation::EffectId;
use crate::effect::Effect;
use crate::scheduler::Scheduler;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::fmt;
use std::hash::Hash;
use std::sync::{Arc, LazyLock};
use std::time::Duration;

/// An open throttle window for one id
#[derive(Debug, Clone, Copy)]
struct Window {
    clock: Option<u64>,
    opened: Duration,
    interval: Duration,
}

impl Window {
    fn open(scheduler: &dyn Scheduler, interval: Duration) -> Self {
        Self {
            clock: scheduler.clock_id(),
            opened: scheduler.now(),
            interval,
        }
    }

    /// Time spent in the window, if `now` was read from the window's clock
    fn elapsed(&self, clock: Option<u64>, now: Duration) -> Option<Duration> {
        (self.clock == clock).then(|| now.checked_sub(self.opened)).flatten()
    }

    /// Whether a value read at `now` on `clock` falls inside the window
    fn contains(&self, clock: Option<u64>, now: Duration) -> bool {
        self.elapsed(clock, now).is_some_and(|elapsed| elapsed < self.interval)
    }
}

static THROTTLE: LazyLock<Mutex<HashMap<EffectId, Window>>> = LazyLock::new(|| Mutex::new(HashMap::new()));

impl<A: Send + 'static> Effect<A> {
    /// Delay subscription by `due`; a newer effect with the same id cancels
    /// the pending one
    pub fn debounce<I>(self, id: I, due: Duration, scheduler: Arc<dyn Scheduler>) -> Self
    where
        I: Hash + Eq + fmt::Debug + Send + Sync + 'static,
    {
        self.delay_subscription(due, scheduler).cancellable(id, true)
    }

    /// Emit at most one value per `interval` for `id`
    ///
    /// The first value in a window emits immediately. With `latest`, values
    /// arriving inside the window replace each other and the last one emits
    /// when the window elapses; without it they are dropped.
    pub fn throttle<I>(self, id: I, interval: Duration, scheduler: Arc<dyn Scheduler>, latest: bool) -> Self
    where
        I: Hash + Eq + fmt::Debug + Send + Sync + 'static,
    {
        let id = EffectId::new(id);
        let throttle_id = id.clone();
        self.flat_map(move |value: A| {
            let clock = scheduler.clock_id();
            let now = scheduler.now();
            let mut table = THROTTLE.lock();
            // Windows of this clock that have run out hold nothing back.
            table.retain(|_, window| window.clock != clock || window.contains(clock, now));

            let elapsed = match table.entry(throttle_id.clone()) {
                Entry::Occupied(slot) if slot.get().contains(clock, now) => {
                    slot.get().elapsed(clock, now).unwrap_or_default()
                },
                // A window opened on another clock cannot be measured here.
                Entry::Occupied(mut slot) => {
                    slot.insert(Window::open(scheduler.as_ref(), interval));
                    return Self::just(value);
                },
                Entry::Vacant(slot) => {
                    slot.insert(Window::open(scheduler.as_ref(), interval));
                    return Self::just(value);
                },
            };
            drop(table);

            if !latest {
                tracing::trace!(id = ?throttle_id, "throttled value dropped");
                return Self::none();
            }

            let reset_id = throttle_id.clone();
            let clock = Arc::clone(&scheduler);
            Self::just(value)
                .delay(interval - elapsed, Arc::clone(&scheduler))
                .inspect(move |_| {
                    THROTTLE.lock().insert(reset_id.clone(), Window::open(clock.as_ref(), interval));
                })
        })
        .cancellable(id, true)
    }
}
