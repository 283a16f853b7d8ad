//! Helper assertions for effects
//!
//! Effects are opaque producers, so assertions work on what an effect does
//! when subscribed: the actions it emits synchronously and whether it
//! completes.

#![allow(clippy::panic)] // Test assertions

use composable_store_core::disposable::Disposable;
use composable_store_core::effect::Effect;
use parking_lot::Mutex;
use std::fmt::Debug;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// What an effect did during its subscription call
#[derive(Debug)]
pub struct EffectOutput<A> {
    /// Actions emitted before `subscribe` returned
    pub actions: Vec<A>,
    /// Whether the effect completed before `subscribe` returned
    pub completed: bool,
    /// The live subscription, for effects that are still running
    pub subscription: Disposable,
}

/// Subscribe to `effect` and capture its synchronous output
///
/// The subscription is left running; dispose it when done.
pub fn run_synchronously<A: Send + 'static>(effect: Effect<A>) -> EffectOutput<A> {
    let actions = Arc::new(Mutex::new(Vec::new()));
    let completed = Arc::new(AtomicBool::new(false));

    let sink = Arc::clone(&actions);
    let done = Arc::clone(&completed);
    let subscription = effect.subscribe(
        move |action| sink.lock().push(action),
        move || done.store(true, Ordering::Release),
    );

    let emitted = std::mem::take(&mut *actions.lock());
    EffectOutput {
        actions: emitted,
        completed: completed.load(Ordering::Acquire),
        subscription,
    }
}

/// Assert that the effect emitted nothing and completed
///
/// # Panics
///
/// Panics if any action was emitted or the effect is still running.
pub fn assert_no_actions<A: Debug>(output: &EffectOutput<A>) {
    assert!(
        output.actions.is_empty(),
        "Expected no actions, but found {}: {:?}",
        output.actions.len(),
        output.actions
    );
    assert_completed(output);
}

/// Assert the number of synchronously emitted actions
///
/// # Panics
///
/// Panics if the number of actions doesn't match expected.
pub fn assert_actions_count<A>(output: &EffectOutput<A>, expected: usize) {
    assert_eq!(
        output.actions.len(),
        expected,
        "Expected {} actions, but found {}",
        expected,
        output.actions.len()
    );
}

/// Assert that the effect completed during subscription
///
/// # Panics
///
/// Panics if the effect is still running.
pub fn assert_completed<A>(output: &EffectOutput<A>) {
    assert!(output.completed, "Expected the effect to complete synchronously");
}

/// Assert that the effect is still running after subscription
///
/// Useful for long-lived effects such as timers and subscriptions.
///
/// # Panics
///
/// Panics if the effect already completed.
pub fn assert_running<A>(output: &EffectOutput<A>) {
    assert!(
        !output.completed,
        "Expected the effect to keep running, but it completed"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_synchronously_captures_merge_output() {
        let output = run_synchronously(Effect::merge([Effect::just(1), Effect::just(2)]));
        assert_eq!(output.actions, vec![1, 2]);
        assert_completed(&output);
    }

    #[test]
    fn test_never_keeps_running() {
        let output = run_synchronously(Effect::<()>::never());
        assert_actions_count(&output, 0);
        assert_running(&output);
        output.subscription.dispose();
    }

    #[test]
    fn test_assertions_no_actions() {
        assert_no_actions(&run_synchronously(Effect::<u8>::none()));
    }

    #[test]
    #[should_panic(expected = "Expected no actions")]
    fn test_assertions_no_actions_fails_on_output() {
        assert_no_actions(&run_synchronously(Effect::just("unexpected")));
    }
}
