//! Deduplicated observation of a store
//!
//! A [`ViewStore`] wraps a [`Store`] and republishes its state only when the
//! state changes according to a duplicate predicate. It is the type UI code
//! holds: read state, send actions, subscribe to projections.

use crate::relay::StateRelay;
use crate::store::Store;
use composable_store_core::disposable::Disposable;
use composable_store_core::effect::Effect;
use composable_store_core::never_equal::NeverEqual;
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;

type DuplicateFn<S> = Arc<dyn Fn(&S, &S) -> bool + Send + Sync>;

/// Read-and-send facade over a [`Store`] with duplicate suppression
///
/// # Example
///
/// ```
/// use composable_store_core::prelude::*;
/// use composable_store_runtime::{Store, ViewStore};
///
/// let reducer = from_fn(|count: &mut i32, delta: i32, _: &()| {
///     *count += delta;
///     Effect::none()
/// });
/// let view = ViewStore::new(Store::new(0, reducer, ()));
///
/// view.send(2);
/// view.send(3);
/// assert_eq!(view.state(), 5);
/// ```
pub struct ViewStore<S, A> {
    store: Store<S, A>,
    relay: StateRelay<S>,
    is_duplicate: DuplicateFn<S>,
    subscription: Disposable,
}

impl<S, A> Drop for ViewStore<S, A> {
    fn drop(&mut self) {
        self.subscription.dispose();
    }
}

impl<S, A> fmt::Debug for ViewStore<S, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewStore")
            .field("store", &self.store)
            .finish_non_exhaustive()
    }
}

impl<S, A> ViewStore<S, A>
where
    S: Clone + Send + Sync + 'static,
    A: fmt::Debug + Send + 'static,
{
    /// View a store, skipping states equal to the previous one
    pub fn new(store: Store<S, A>) -> Self
    where
        S: PartialEq,
    {
        Self::with_dedup(store, |lhs: &S, rhs: &S| lhs == rhs)
    }

    /// View a store with a custom duplicate predicate
    pub fn with_dedup<F>(store: Store<S, A>, is_duplicate: F) -> Self
    where
        F: Fn(&S, &S) -> bool + Send + Sync + 'static,
    {
        let is_duplicate: DuplicateFn<S> = Arc::new(is_duplicate);
        let relay = StateRelay::new(store.current_state());

        let sink = relay.clone();
        let check = Arc::clone(&is_duplicate);
        let subscription = store.subscribe_state(move |state: &S| {
            if !check(&sink.value(), state) {
                sink.accept(state.clone());
            }
        });

        Self {
            store,
            relay,
            is_duplicate,
            subscription,
        }
    }

    /// The underlying store
    #[must_use]
    pub const fn store(&self) -> &Store<S, A> {
        &self.store
    }

    /// A copy of the last published state
    #[must_use]
    pub fn state(&self) -> S {
        S::clone(&self.relay.value())
    }

    /// Read the last published state
    pub fn state_with<R>(&self, read: impl FnOnce(&S) -> R) -> R {
        read(&self.relay.value())
    }

    /// Send an action to the underlying store
    pub fn send(&self, action: A) {
        self.store.send(action);
    }

    /// An effect emitting the current state, then every non-duplicate state
    pub fn publisher(&self) -> Effect<S> {
        let relay = self.relay.clone();
        Effect::create(move |subscriber| {
            subscriber.send(S::clone(&relay.value()));
            relay.observe(move |state: &S| subscriber.send(state.clone()))
        })
    }

    /// Whether two states would be treated as the same by this view
    #[must_use]
    pub fn is_duplicate(&self, lhs: &S, rhs: &S) -> bool {
        (self.is_duplicate)(lhs, rhs)
    }

    /// Observe a projection of the state, skipping duplicate projections
    ///
    /// Emits the current projection on subscription. The effect never
    /// completes; dispose it to stop observing.
    pub fn subscribe<T, P, D>(&self, projection: P, is_duplicate: D) -> Effect<T>
    where
        T: Clone + Send + Sync + 'static,
        P: Fn(&S) -> T + Send + Sync + 'static,
        D: Fn(&T, &T) -> bool + Send + Sync + 'static,
    {
        let relay = self.relay.clone();
        Effect::create(move |subscriber| {
            let last: Arc<Mutex<Option<T>>> = Arc::new(Mutex::new(None));
            let emit = Arc::new(move |value: T| {
                {
                    let mut last = last.lock();
                    if last.as_ref().is_some_and(|previous| is_duplicate(previous, &value)) {
                        return;
                    }
                    *last = Some(value.clone());
                }
                subscriber.send(value);
            });

            emit(projection(&relay.value()));
            let emit_next = Arc::clone(&emit);
            relay.observe(move |state: &S| emit_next(projection(state)))
        })
    }

    /// Observe a projection, skipping values equal to the previous one
    pub fn subscribe_eq<T, P>(&self, projection: P) -> Effect<T>
    where
        T: Clone + PartialEq + Send + Sync + 'static,
        P: Fn(&S) -> T + Send + Sync + 'static,
    {
        self.subscribe(projection, |lhs: &T, rhs: &T| lhs == rhs)
    }

    /// Observe a projection wrapped in [`NeverEqual`]
    ///
    /// Every published state produces a value, even when the wrapped payload
    /// is unchanged. Used for one-shot signals carried in state.
    pub fn subscribe_never_equal<T, P>(&self, projection: P) -> Effect<T>
    where
        T: Clone + Send + Sync + 'static,
        P: Fn(&S) -> NeverEqual<T> + Send + Sync + 'static,
    {
        self.subscribe(
            move |state: &S| projection(state).into_inner(),
            |_: &T, _: &T| false,
        )
    }
}
