//! Exhaustive store assertions
//!
//! A [`TestStore`] runs a reducer like a store does, but every state change
//! and every action fed back by an effect must be asserted by the test.
//! Anything left unasserted when the test store is finished (or dropped)
//! fails the test.

#![allow(clippy::panic)] // Assertion failures are panics
#![allow(clippy::module_name_repetitions)]

use composable_store_core::debug::diff_lines;
use composable_store_core::disposable::{CompositeDisposable, DisposeKey};
use composable_store_core::reducer::Reducer;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::fmt::Debug;
use std::sync::Arc;
use std::time::Duration;

#[derive(Default)]
struct EffectSlot {
    completed: bool,
    key: Option<DisposeKey>,
}

/// Step-by-step store harness with exhaustive assertions
///
/// # Example
///
/// ```
/// use composable_store_core::prelude::*;
/// use composable_store_testing::TestStore;
///
/// #[derive(Debug, Clone, PartialEq)]
/// enum Action { Tap, Tapped }
///
/// let reducer = from_fn(|count: &mut u32, action: Action, _: &()| match action {
///     Action::Tap => Effect::just(Action::Tapped),
///     Action::Tapped => {
///         *count += 1;
///         Effect::none()
///     },
/// });
///
/// let mut store = TestStore::new(reducer, 0, ());
/// store.send(Action::Tap, |_| {});
/// store.receive(Action::Tapped, |count| *count = 1);
/// store.finish();
/// ```
pub struct TestStore<R: Reducer> {
    reducer: R,
    environment: R::Environment,
    state: R::State,
    received: Arc<Mutex<VecDeque<R::Action>>>,
    effects: CompositeDisposable,
    finished: bool,
}

impl<R> TestStore<R>
where
    R: Reducer,
    R::State: Clone + PartialEq + Debug,
    R::Action: PartialEq + Debug + Send + 'static,
{
    /// Create a test store with initial state and environment
    pub fn new(reducer: R, initial_state: R::State, environment: R::Environment) -> Self {
        Self {
            reducer,
            environment,
            state: initial_state,
            received: Arc::new(Mutex::new(VecDeque::new())),
            effects: CompositeDisposable::new(),
            finished: false,
        }
    }

    /// Current state
    #[must_use]
    pub const fn state(&self) -> &R::State {
        &self.state
    }

    /// Actions emitted by effects and not yet asserted
    #[must_use]
    pub fn pending_actions(&self) -> usize {
        self.received.lock().len()
    }

    /// Effects still running
    #[must_use]
    pub fn in_flight_effects(&self) -> usize {
        self.effects.len()
    }

    /// Send an action and assert the resulting state
    ///
    /// `update` receives a copy of the previous state and must turn it into
    /// the expected state.
    ///
    /// # Panics
    ///
    /// Panics if effect output is waiting to be received, or if the state
    /// after reduction differs from the expected state.
    pub fn send(&mut self, action: R::Action, update: impl FnOnce(&mut R::State)) {
        let waiting = self.pending_actions();
        if waiting > 0 {
            let queued: Vec<String> = self.received.lock().iter().map(|a| format!("{a:?}")).collect();
            panic!(
                "Must handle {waiting} received action(s) before sending {action:?}:\n{}",
                queued.join("\n")
            );
        }
        self.step(action, update);
    }

    /// Assert that the next effect output is `expected`, reduce it, and
    /// assert the resulting state
    ///
    /// # Panics
    ///
    /// Panics if no action was received, if the next received action is not
    /// `expected`, or if the state differs from the expected state.
    pub fn receive(&mut self, expected: R::Action, update: impl FnOnce(&mut R::State)) {
        let next = self.received.lock().pop_front();
        let Some(action) = next else {
            panic!("Expected to receive {expected:?}, but no action was received");
        };
        assert!(
            action == expected,
            "Received unexpected action:\n  expected: {expected:?}\n  received: {action:?}"
        );
        self.step(action, update);
    }

    /// Wait for effect output produced on other tasks
    ///
    /// Returns `true` once at least `count` actions are waiting, `false` if
    /// `timeout` elapses first.
    pub async fn wait_for_actions(&self, count: usize, timeout: Duration) -> bool {
        let received = Arc::clone(&self.received);
        let wait = async move {
            while received.lock().len() < count {
                tokio::time::sleep(Duration::from_millis(1)).await;
            }
        };
        tokio::time::timeout(timeout, wait).await.is_ok()
    }

    /// Dispose every running effect
    pub fn cancel_effects(&mut self) {
        let running = std::mem::take(&mut self.effects);
        tracing::debug!(disposed = running.len(), "test store effects cancelled");
        running.dispose();
    }

    /// Assert that nothing is left to receive and no effect is running
    ///
    /// # Panics
    ///
    /// Panics if actions are waiting or effects are still in flight.
    pub fn finish(&mut self) {
        self.finished = true;
        let waiting = self.pending_actions();
        assert!(
            waiting == 0,
            "TestStore finished with {waiting} unhandled action(s): {:?}",
            self.received.lock()
        );
        let running = self.in_flight_effects();
        assert!(
            running == 0,
            "TestStore finished with {running} effect(s) still running; \
             cancel them or advance the scheduler until they complete"
        );
    }

    fn step(&mut self, action: R::Action, update: impl FnOnce(&mut R::State)) {
        let mut expected = self.state.clone();
        update(&mut expected);

        tracing::trace!(?action, "test store reducing");
        let effect = self.reducer.reduce(&mut self.state, action, &self.environment);

        if self.state != expected {
            let diff = diff_lines(&format!("{expected:#?}"), &format!("{:#?}", self.state))
                .unwrap_or_default();
            panic!("State mismatch (- expected, + actual):\n{diff}");
        }

        let slot = Arc::new(Mutex::new(EffectSlot::default()));
        let received = Arc::clone(&self.received);
        let effects = self.effects.clone();
        let on_complete = {
            let slot = Arc::clone(&slot);
            move || {
                let key = {
                    let mut slot = slot.lock();
                    slot.completed = true;
                    slot.key.take()
                };
                if let Some(key) = key {
                    effects.remove(key);
                }
            }
        };
        let subscription = effect.subscribe(move |action| received.lock().push_back(action), on_complete);

        let mut slot = slot.lock();
        if !slot.completed {
            slot.key = self.effects.insert(subscription);
        }
    }
}

impl<R: Reducer> Drop for TestStore<R> {
    fn drop(&mut self) {
        if self.finished || std::thread::panicking() {
            self.effects.dispose();
            return;
        }
        let waiting = self.received.lock().len();
        let running = self.effects.len();
        self.effects.dispose();
        if waiting > 0 || running > 0 {
            panic!(
                "TestStore dropped with {waiting} unhandled action(s) and {running} running effect(s)"
            );
        }
    }
}
