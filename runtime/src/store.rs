//! The Store - runtime coordinator for a reducer
//!
//! A store owns one value of state, runs the reducer for every action, and
//! subscribes to the effect the reducer returns. Actions that effect emits
//! come back into the same store.
//!
//! # Action processing
//!
//! [`Store::send`] appends the action to a FIFO queue and drains it. For each
//! action the reducer runs, the new state is published, and the returned
//! effect is subscribed. Values the effect emits *during* that subscription
//! call join the queue behind the current batch; values emitted later go
//! through a fresh `send`. `send` returns once the queue is empty.
//!
//! Stores are single-writer: call `send` from one logical thread. A `send`
//! made while the reducer is running is reported as a
//! [`ProtocolViolation`](crate::error::ProtocolViolation).
//!
//! # Scoping
//!
//! [`Store::scope`] derives a child store over a projection of the state.
//! The child forwards its actions to the parent and follows the parent's
//! state; it runs no effects of its own. Children keep their parent alive;
//! parents only hold a weak link to children.

use crate::StoreConfig;
use crate::error::{ProtocolViolation, ViolationPolicy};
use crate::metrics::StoreMetrics;
use crate::relay::StateRelay;
use composable_store_core::disposable::{CompositeDisposable, Disposable, DisposeKey};
use composable_store_core::effect::Effect;
use composable_store_core::identified::{Identifiable, IdentifiedCollection};
use composable_store_core::reducer::Reducer;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::convert::Infallible;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::thread::{self, ThreadId};
use std::time::Instant;

type ReduceFn<S, A> = Box<dyn Fn(&mut S, A) -> Effect<A> + Send + Sync>;

struct StoreInner<S, A> {
    config: StoreConfig,
    reducer: ReduceFn<S, A>,
    relay: StateRelay<S>,
    queue: Mutex<VecDeque<A>>,
    is_sending: AtomicBool,
    reducing_thread: Mutex<Option<ThreadId>>,
    effects: CompositeDisposable,
    parent: Mutex<Option<Disposable>>,
}

impl<S, A> Drop for StoreInner<S, A> {
    fn drop(&mut self) {
        if let Some(parent) = self.parent.lock().take() {
            parent.dispose();
        }
        StoreMetrics::record_effects_finished(self.effects.len());
        self.effects.dispose();
    }
}

#[derive(Default)]
struct EffectSlot {
    completed: bool,
    key: Option<DisposeKey>,
}

/// The Store - owns state and drives a reducer
///
/// Cloning a `Store` yields another handle to the same store. The store is
/// torn down, disposing its in-flight effects and its link to a parent,
/// when the last handle is dropped.
///
/// # Type Parameters
///
/// - `S`: State type
/// - `A`: Action type
///
/// # Example
///
/// ```
/// use composable_store_core::prelude::*;
/// use composable_store_runtime::Store;
///
/// #[derive(Debug)]
/// enum Action { Start, Step(u8) }
///
/// let reducer = from_fn(|log: &mut Vec<String>, action: Action, _: &()| match action {
///     Action::Start => {
///         log.push("start".into());
///         Effect::merge([Effect::just(Action::Step(1)), Effect::just(Action::Step(2))])
///     },
///     Action::Step(n) => {
///         log.push(format!("step {n}"));
///         Effect::none()
///     },
/// });
///
/// let store = Store::new(Vec::new(), reducer, ());
/// store.send(Action::Start);
/// assert_eq!(store.current_state(), vec!["start", "step 1", "step 2"]);
/// ```
pub struct Store<S, A> {
    inner: Arc<StoreInner<S, A>>,
}

impl<S, A> Clone for Store<S, A> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S, A> fmt::Debug for Store<S, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("label", &self.inner.config.label)
            .field("in_flight_effects", &self.inner.effects.len())
            .field("observers", &self.inner.relay.observer_count())
            .finish_non_exhaustive()
    }
}

impl<S, A> Store<S, A>
where
    S: Clone + Send + Sync + 'static,
    A: fmt::Debug + Send + 'static,
{
    /// Create a root store with initial state, reducer, and environment
    pub fn new<R, E>(initial_state: S, reducer: R, environment: E) -> Self
    where
        R: Reducer<State = S, Action = A, Environment = E> + Send + Sync + 'static,
        E: Send + Sync + 'static,
    {
        Self::with_config(initial_state, reducer, environment, StoreConfig::default())
    }

    /// Create a root store with custom configuration
    ///
    /// # Example
    ///
    /// ```
    /// use composable_store_core::prelude::*;
    /// use composable_store_runtime::{Store, StoreConfig, ViolationPolicy};
    ///
    /// let reducer = from_fn(|_: &mut (), _: (), _: &()| Effect::none());
    /// let config = StoreConfig::default()
    ///     .with_label("settings")
    ///     .with_violation_policy(ViolationPolicy::Log);
    /// let store = Store::with_config((), reducer, (), config);
    /// assert_eq!(store.label(), "settings");
    /// ```
    pub fn with_config<R, E>(initial_state: S, reducer: R, environment: E, config: StoreConfig) -> Self
    where
        R: Reducer<State = S, Action = A, Environment = E> + Send + Sync + 'static,
        E: Send + Sync + 'static,
    {
        Self::from_parts(
            initial_state,
            config,
            Box::new(move |state: &mut S, action: A| reducer.reduce(state, action, &environment)),
        )
    }

    fn from_parts(initial_state: S, config: StoreConfig, reducer: ReduceFn<S, A>) -> Self {
        tracing::debug!(store = %config.label, "store created");
        Self {
            inner: Arc::new(StoreInner {
                config,
                reducer,
                relay: StateRelay::new(initial_state),
                queue: Mutex::new(VecDeque::new()),
                is_sending: AtomicBool::new(false),
                reducing_thread: Mutex::new(None),
                effects: CompositeDisposable::new(),
                parent: Mutex::new(None),
            }),
        }
    }

    /// The label from this store's configuration
    #[must_use]
    pub fn label(&self) -> &str {
        &self.inner.config.label
    }

    /// Send an action and process it, plus everything it synchronously causes
    ///
    /// Returns once the action queue is empty.
    pub fn send(&self, action: A) {
        if self.inner.is_sending.load(Ordering::Acquire) {
            let store = self.inner.config.label.clone();
            let action_text = format!("{action:?}");
            let reentrant = *self.inner.reducing_thread.lock() == Some(thread::current().id());
            let violation = if reentrant {
                ProtocolViolation::ReentrantSend {
                    store,
                    action: action_text,
                }
            } else {
                ProtocolViolation::ConcurrentSend {
                    store,
                    action: action_text,
                }
            };
            // The running drain loop picks the action up after the current reduction.
            self.inner.queue.lock().push_back(action);
            self.policy().report(&violation);
            if !reentrant && !self.inner.is_sending.load(Ordering::Acquire) {
                // The other thread may have finished draining before the push.
                self.drain();
            }
            return;
        }
        self.inner.queue.lock().push_back(action);
        self.drain();
    }

    fn policy(&self) -> ViolationPolicy {
        self.inner.config.violation_policy
    }

    fn drain(&self) {
        loop {
            let next = self.inner.queue.lock().pop_front();
            let Some(action) = next else {
                break;
            };

            if self.inner.is_sending.swap(true, Ordering::AcqRel) {
                let violation = ProtocolViolation::ConcurrentSend {
                    store: self.inner.config.label.clone(),
                    action: format!("{action:?}"),
                };
                self.inner.queue.lock().push_front(action);
                self.policy().report(&violation);
                return;
            }

            *self.inner.reducing_thread.lock() = Some(thread::current().id());
            let effect = self.reduce(action);
            self.subscribe_effect(effect);
        }
    }

    /// Run the reducer with the sending flag held, publishing the new state
    fn reduce(&self, action: A) -> Effect<A> {
        tracing::trace!(store = %self.inner.config.label, ?action, "reducing action");
        let started = Instant::now();

        let mut state = S::clone(&self.inner.relay.value());
        let effect = (self.inner.reducer)(&mut state, action);
        self.inner.relay.accept(state);

        *self.inner.reducing_thread.lock() = None;
        self.inner.is_sending.store(false, Ordering::Release);
        StoreMetrics::record_action(started.elapsed());
        effect
    }

    fn subscribe_effect(&self, effect: Effect<A>) {
        let is_processing = Arc::new(AtomicBool::new(true));
        let slot = Arc::new(Mutex::new(EffectSlot::default()));
        let store = Arc::downgrade(&self.inner);

        let on_next = {
            let is_processing = Arc::clone(&is_processing);
            let store = Weak::clone(&store);
            move |action: A| {
                let Some(inner) = store.upgrade() else {
                    return;
                };
                if is_processing.load(Ordering::Acquire) {
                    inner.queue.lock().push_back(action);
                } else {
                    Self { inner }.send(action);
                }
            }
        };

        let on_complete = {
            let slot = Arc::clone(&slot);
            move || {
                let key = {
                    let mut slot = slot.lock();
                    slot.completed = true;
                    slot.key.take()
                };
                if let (Some(key), Some(inner)) = (key, store.upgrade()) {
                    if inner.effects.remove(key).is_some() {
                        StoreMetrics::record_effects_finished(1);
                    }
                }
            }
        };

        let subscription = effect.subscribe(on_next, on_complete);
        is_processing.store(false, Ordering::Release);

        let mut slot = slot.lock();
        if !slot.completed {
            slot.key = self.inner.effects.insert(subscription);
            if slot.key.is_some() {
                StoreMetrics::record_effect_started();
            }
        }
    }

    /// Read the current state
    pub fn state<R>(&self, read: impl FnOnce(&S) -> R) -> R {
        read(&self.inner.relay.value())
    }

    /// A copy of the current state
    #[must_use]
    pub fn current_state(&self) -> S {
        S::clone(&self.inner.relay.value())
    }

    /// Observe future states; the current state is not replayed
    pub fn subscribe_state<F>(&self, observer: F) -> Disposable
    where
        F: Fn(&S) + Send + Sync + 'static,
    {
        self.inner.relay.observe(observer)
    }

    /// An effect emitting the current state, then every new state
    ///
    /// The effect never completes; dispose it to stop observing.
    pub fn publisher(&self) -> Effect<S> {
        let relay = self.inner.relay.clone();
        Effect::create(move |subscriber| {
            subscriber.send(S::clone(&relay.value()));
            relay.observe(move |state: &S| subscriber.send(state.clone()))
        })
    }

    /// Number of effect subscriptions still running
    #[must_use]
    pub fn in_flight_effects(&self) -> usize {
        self.inner.effects.len()
    }

    /// Number of state observers registered on this store
    ///
    /// Counts [`subscribe_state`](Self::subscribe_state) callbacks, live
    /// view stores and scoped children that still observe this store.
    #[must_use]
    pub fn observer_count(&self) -> usize {
        self.inner.relay.observer_count()
    }

    /// Derive a child store over a projection of this store's state
    ///
    /// The child's actions are embedded with `from_local` and sent to this
    /// store; the child's state is `to_local` of this store's state, kept
    /// current on every parent update.
    pub fn scope<LS, LA, TS, FA>(&self, to_local: TS, from_local: FA) -> Store<LS, LA>
    where
        LS: Clone + Send + Sync + 'static,
        LA: fmt::Debug + Send + 'static,
        TS: Fn(&S) -> LS + Send + Sync + 'static,
        FA: Fn(LA) -> A + Send + Sync + 'static,
    {
        let to_local = Arc::new(to_local);
        let parent = self.clone();
        let project = Arc::clone(&to_local);
        let child = Store::from_parts(
            self.state(|state| to_local(state)),
            self.inner.config.child("scope"),
            Box::new(move |local: &mut LS, action: LA| {
                parent.send(from_local(action));
                *local = parent.state(|state| project(state));
                Effect::none()
            }),
        );

        let weak_child = Arc::downgrade(&child.inner);
        let link = self.inner.relay.observe(move |state: &S| {
            if let Some(child) = weak_child.upgrade() {
                child.relay.accept(to_local(state));
            }
        });
        child.link_parent(link);
        child
    }

    /// Derive a child store over the same actions
    pub fn scope_state<LS, TS>(&self, to_local: TS) -> Store<LS, A>
    where
        LS: Clone + Send + Sync + 'static,
        TS: Fn(&S) -> LS + Send + Sync + 'static,
    {
        self.scope(to_local, |action| action)
    }

    /// Derive a child store over one element of an identified collection
    ///
    /// `collection` borrows the collection out of this store's state. Returns
    /// `None` when no element has `id`. Once created, the child keeps its
    /// last known element if the element is later removed, and only updates
    /// when the element actually changes.
    pub fn scope_element<C, LA, F, FA>(
        &self,
        collection: F,
        id: <C::Element as Identifiable>::Id,
        from_local: FA,
    ) -> Option<Store<C::Element, LA>>
    where
        C: IdentifiedCollection,
        C::Element: Clone + PartialEq + Send + Sync + 'static,
        LA: fmt::Debug + Send + 'static,
        F: Fn(&S) -> &C + Send + Sync + 'static,
        FA: Fn(<C::Element as Identifiable>::Id, LA) -> A + Send + Sync + 'static,
    {
        let initial = self.state(|state| collection(state).element(&id).cloned())?;
        let collection = Arc::new(collection);

        let parent = self.clone();
        let lookup = Arc::clone(&collection);
        let reducer_id = id.clone();
        let child = Store::from_parts(
            initial,
            self.inner.config.child(&format!("element({id:?})")),
            Box::new(move |local: &mut C::Element, action: LA| {
                parent.send(from_local(reducer_id.clone(), action));
                if let Some(element) = parent.state(|state| lookup(state).element(&reducer_id).cloned()) {
                    *local = element;
                }
                Effect::none()
            }),
        );

        let weak_child = Arc::downgrade(&child.inner);
        let link = self.inner.relay.observe(move |state: &S| {
            let Some(child) = weak_child.upgrade() else {
                return;
            };
            let Some(element) = collection(state).element(&id) else {
                return;
            };
            if *child.relay.value() != *element {
                child.relay.accept(element.clone());
            }
        });
        child.link_parent(link);
        Some(child)
    }

    /// Child stores for an optional part of this store's state
    ///
    /// The effect emits a fresh child every time `to_local` goes from `None`
    /// to `Some`, starting with the current state. A child follows the parent
    /// while `to_local` is `Some` and keeps its last value once it turns
    /// `None`; actions sent to it then reach the parent, where an
    /// [`optional`](composable_store_core::reducer::ReducerExt::optional)
    /// reducer ignores them. The effect never completes; dispose it to stop
    /// receiving children.
    pub fn scope_optional<LS, LA, TS, FA>(&self, to_local: TS, from_local: FA) -> Effect<Store<LS, LA>>
    where
        LS: Clone + Send + Sync + 'static,
        LA: fmt::Debug + Send + 'static,
        TS: Fn(&S) -> Option<LS> + Send + Sync + 'static,
        FA: Fn(LA) -> A + Send + Sync + 'static,
    {
        let to_local = Arc::new(to_local);
        let from_local = Arc::new(from_local);
        let parent = Arc::downgrade(&self.inner);

        Effect::create(move |subscriber| {
            let Some(inner) = parent.upgrade() else {
                subscriber.complete();
                return Disposable::empty();
            };
            let store = Self { inner };
            let present = Arc::new(AtomicBool::new(false));
            if let Some(local) = store.state(|state| to_local(state)) {
                present.store(true, Ordering::Release);
                subscriber.send(store.optional_child(local, Arc::clone(&to_local), Arc::clone(&from_local)));
            }

            let relay = store.inner.relay.clone();
            drop(store);
            relay.observe(move |state: &S| {
                let local = to_local(state);
                let was_present = present.swap(local.is_some(), Ordering::AcqRel);
                let (Some(local), false) = (local, was_present) else {
                    return;
                };
                if let Some(inner) = parent.upgrade() {
                    let store = Self { inner };
                    subscriber.send(store.optional_child(local, Arc::clone(&to_local), Arc::clone(&from_local)));
                }
            })
        })
    }

    fn optional_child<LS, LA, TS, FA>(&self, initial: LS, to_local: Arc<TS>, from_local: Arc<FA>) -> Store<LS, LA>
    where
        LS: Clone + Send + Sync + 'static,
        LA: fmt::Debug + Send + 'static,
        TS: Fn(&S) -> Option<LS> + Send + Sync + 'static,
        FA: Fn(LA) -> A + Send + Sync + 'static,
    {
        let parent = self.clone();
        let project = Arc::clone(&to_local);
        let child = Store::from_parts(
            initial,
            self.inner.config.child("optional"),
            Box::new(move |local: &mut LS, action: LA| {
                parent.send(from_local(action));
                if let Some(current) = parent.state(|state| project(state)) {
                    *local = current;
                }
                Effect::none()
            }),
        );

        let weak_child = Arc::downgrade(&child.inner);
        let link = self.inner.relay.observe(move |state: &S| {
            let Some(child) = weak_child.upgrade() else {
                return;
            };
            if let Some(local) = to_local(state) {
                child.relay.accept(local);
            }
        });
        child.link_parent(link);
        child
    }

    /// A view of this store that ignores state
    pub fn stateless(&self) -> Store<(), A> {
        self.scope(|_| (), |action| action)
    }

    /// A view of this store that cannot send actions
    pub fn actionless(&self) -> Store<S, Infallible> {
        self.scope(S::clone, |never: Infallible| match never {})
    }

    fn link_parent(&self, link: Disposable) {
        *self.inner.parent.lock() = Some(link);
    }
}
