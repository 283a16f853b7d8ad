//! Identity-based effect cancellation
//!
//! A [`CancellationRegistry`] maps an [`EffectId`] to the subscriptions
//! currently running under it. [`Effect::cancellable`] registers a
//! subscription and removes it again on completion or disposal;
//! [`Effect::cancel`] disposes everything registered under an id.
//!
//! The effect operators use the process-wide [`CancellationRegistry::shared`]
//! instance.

use crate::disposable::{Disposable, SerialDisposable};
use crate::effect::Effect;
use parking_lot::Mutex;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, LazyLock};

trait Token: Send + Sync + 'static {
    fn as_any(&self) -> &dyn Any;
    fn token_eq(&self, other: &dyn Token) -> bool;
    fn token_hash(&self, state: &mut dyn Hasher);
    fn token_fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result;
}

impl<T> Token for T
where
    T: Hash + Eq + fmt::Debug + Send + Sync + 'static,
{
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn token_eq(&self, other: &dyn Token) -> bool {
        other.as_any().downcast_ref::<T>().is_some_and(|other| other == self)
    }

    fn token_hash(&self, mut state: &mut dyn Hasher) {
        TypeId::of::<T>().hash(&mut state);
        self.hash(&mut state);
    }

    fn token_fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Type-erased cancellation token
///
/// Any `Hash + Eq + Debug` value can serve as an id. Two ids are equal when
/// their concrete types and values are equal, so `"search"` and
/// `String::from("search")` are distinct ids.
#[derive(Clone)]
pub struct EffectId(Arc<dyn Token>);

impl EffectId {
    /// Wrap a token; wrapping an existing `EffectId` returns it unchanged
    pub fn new<T>(token: T) -> Self
    where
        T: Hash + Eq + fmt::Debug + Send + Sync + 'static,
    {
        if let Some(id) = (&token as &dyn Any).downcast_ref::<Self>() {
            return id.clone();
        }
        Self(Arc::new(token))
    }
}

impl PartialEq for EffectId {
    fn eq(&self, other: &Self) -> bool {
        (*self.0).token_eq(&*other.0)
    }
}

impl Eq for EffectId {}

impl Hash for EffectId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        (*self.0).token_hash(state);
    }
}

impl fmt::Debug for EffectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("EffectId(")?;
        (*self.0).token_fmt(f)?;
        f.write_str(")")
    }
}

/// Identifies one registration under an id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RegistrationKey(u64);

/// Table of in-flight subscriptions keyed by [`EffectId`]
///
/// All operations lock internally; disposal always happens outside the
/// lock so teardown code may re-enter the registry.
#[derive(Debug, Default)]
pub struct CancellationRegistry {
    entries: Mutex<HashMap<EffectId, Vec<(RegistrationKey, Disposable)>>>,
    next_key: AtomicU64,
}

static SHARED: LazyLock<CancellationRegistry> = LazyLock::new(CancellationRegistry::new);

impl CancellationRegistry {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide registry used by the effect operators
    pub fn shared() -> &'static Self {
        &SHARED
    }

    /// Allocate a key for a new registration
    pub fn next_key(&self) -> RegistrationKey {
        RegistrationKey(self.next_key.fetch_add(1, Ordering::Relaxed))
    }

    /// Record `handle` under `id`
    ///
    /// With `cancel_in_flight`, every registration already present for `id`
    /// is removed and disposed before this call returns.
    pub fn register(
        &self,
        id: EffectId,
        key: RegistrationKey,
        handle: Disposable,
        cancel_in_flight: bool,
    ) {
        let replaced = {
            let mut entries = self.entries.lock();
            let registrations = entries.entry(id.clone()).or_default();
            let replaced = if cancel_in_flight {
                std::mem::take(registrations)
            } else {
                Vec::new()
            };
            registrations.push((key, handle));
            replaced
        };
        if !replaced.is_empty() {
            tracing::trace!(?id, count = replaced.len(), "cancelling in-flight effects");
            metrics::counter!("effects.cancelled.total").increment(replaced.len() as u64);
        }
        for (_, disposable) in replaced {
            disposable.dispose();
        }
    }

    /// Dispose and remove every registration for `id`
    ///
    /// Returns whether anything was registered. Cancelling an unknown id is
    /// a no-op.
    pub fn cancel(&self, id: &EffectId) -> bool {
        let removed = self.entries.lock().remove(id);
        let Some(registrations) = removed else {
            tracing::trace!(?id, "cancel for unknown id");
            return false;
        };
        tracing::trace!(?id, count = registrations.len(), "cancelling effects");
        metrics::counter!("effects.cancelled.total").increment(registrations.len() as u64);
        for (_, disposable) in registrations {
            disposable.dispose();
        }
        true
    }

    /// Remove the registration `key` without disposing it
    ///
    /// Leaves other registrations for `id` untouched, so a completion
    /// arriving after a replacement cannot erase the replacement.
    pub fn remove(&self, id: &EffectId, key: RegistrationKey) -> bool {
        let mut entries = self.entries.lock();
        let Some(registrations) = entries.get_mut(id) else {
            return false;
        };
        let before = registrations.len();
        registrations.retain(|(existing, _)| *existing != key);
        let removed = registrations.len() != before;
        if registrations.is_empty() {
            entries.remove(id);
        }
        removed
    }

    /// Whether anything is registered under `id`
    #[must_use]
    pub fn contains(&self, id: &EffectId) -> bool {
        self.entries.lock().contains_key(id)
    }

    /// Number of registrations under `id`
    #[must_use]
    pub fn registrations(&self, id: &EffectId) -> usize {
        self.entries.lock().get(id).map_or(0, Vec::len)
    }

    /// Number of ids with at least one registration
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Whether the registry holds nothing
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl<A: Send + 'static> Effect<A> {
    /// Make the effect cancellable through [`Effect::cancel`] with `id`
    ///
    /// With `cancel_in_flight`, subscribing first disposes any effect still
    /// running under the same id. The registration is removed when the
    /// effect completes or is disposed.
    pub fn cancellable<I>(self, id: I, cancel_in_flight: bool) -> Self
    where
        I: Hash + Eq + fmt::Debug + Send + Sync + 'static,
    {
        let id = EffectId::new(id);
        Self::create(move |downstream| {
            let registry = CancellationRegistry::shared();
            let key = registry.next_key();
            let upstream = SerialDisposable::new();

            // Cancellation through the registry completes downstream; when
            // downstream disposed us its subscriber is closed and this is a no-op.
            let handle = {
                let upstream = upstream.clone();
                let id = id.clone();
                let downstream = downstream.clone();
                Disposable::new(move || {
                    upstream.dispose();
                    CancellationRegistry::shared().remove(&id, key);
                    downstream.complete();
                })
            };
            registry.register(id, key, handle.clone(), cancel_in_flight);

            let next = downstream.clone();
            let cleanup = handle.clone();
            let subscription = self.subscribe(
                move |value| next.send(value),
                move || {
                    downstream.complete();
                    cleanup.dispose();
                },
            );
            upstream.set(subscription);
            handle
        })
    }

    /// An effect that cancels everything running under `id`, then completes
    pub fn cancel<I>(id: I) -> Self
    where
        I: Hash + Eq + fmt::Debug + Send + Sync + 'static,
    {
        let id = EffectId::new(id);
        Self::create(move |subscriber| {
            CancellationRegistry::shared().cancel(&id);
            subscriber.complete();
            Disposable::empty()
        })
    }

    /// Cancel several ids at once
    pub fn cancel_all<I, T>(ids: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Hash + Eq + fmt::Debug + Send + Sync + 'static,
    {
        let ids: Vec<EffectId> = ids.into_iter().map(EffectId::new).collect();
        Self::create(move |subscriber| {
            let registry = CancellationRegistry::shared();
            for id in &ids {
                registry.cancel(id);
            }
            subscriber.complete();
            Disposable::empty()
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::effect::PassthroughSubject;
    use proptest::prelude::*;
    use std::sync::atomic::AtomicBool;

    #[derive(Debug, Clone, PartialEq, Eq, Hash)]
    struct Search;

    #[test]
    fn test_effect_id_equality_is_typed() {
        assert_eq!(EffectId::new("a"), EffectId::new("a"));
        assert_ne!(EffectId::new("a"), EffectId::new(String::from("a")));
        assert_ne!(EffectId::new(1_u8), EffectId::new(1_u16));
        assert_eq!(EffectId::new(Search), EffectId::new(EffectId::new(Search)));
    }

    #[test]
    fn test_registry_register_and_remove() {
        let registry = CancellationRegistry::new();
        let id = EffectId::new("registry");
        let first = registry.next_key();
        let second = registry.next_key();

        registry.register(id.clone(), first, Disposable::empty(), false);
        registry.register(id.clone(), second, Disposable::empty(), false);
        assert_eq!(registry.registrations(&id), 2);

        assert!(registry.remove(&id, first));
        assert!(!registry.remove(&id, first));
        assert!(registry.contains(&id));

        assert!(registry.remove(&id, second));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_registry_cancel_in_flight_disposes_previous() {
        let registry = CancellationRegistry::new();
        let id = EffectId::new("replace");
        let disposed = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&disposed);

        registry.register(
            id.clone(),
            registry.next_key(),
            Disposable::new(move || flag.store(true, Ordering::SeqCst)),
            false,
        );
        registry.register(id.clone(), registry.next_key(), Disposable::empty(), true);

        assert!(disposed.load(Ordering::SeqCst));
        assert_eq!(registry.registrations(&id), 1);
    }

    #[test]
    fn test_cancel_unknown_id_is_noop() {
        let registry = CancellationRegistry::new();
        assert!(!registry.cancel(&EffectId::new("missing")));

        let completed = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&completed);
        let _d = Effect::<i32>::cancel("cancellation::missing")
            .subscribe(|_| {}, move || flag.store(true, Ordering::SeqCst));
        assert!(completed.load(Ordering::SeqCst));
    }

    #[test]
    fn test_cancellable_completion_removes_entry() {
        let id = EffectId::new("cancellation::completes");
        let _d = Effect::just(1).cancellable(id.clone(), false).subscribe(|_| {}, || {});
        assert!(!CancellationRegistry::shared().contains(&id));
    }

    #[test]
    fn test_cancel_stops_running_effect() {
        let id = EffectId::new("cancellation::stops");
        let subject = PassthroughSubject::new();
        let values = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&values);

        let _d = subject
            .effect()
            .cancellable(id.clone(), false)
            .subscribe(move |v| sink.lock().push(v), || {});
        subject.send(1);
        assert!(CancellationRegistry::shared().contains(&id));

        let _c = Effect::<i32>::cancel(id.clone()).subscribe(|_| {}, || {});
        subject.send(2);

        assert_eq!(*values.lock(), vec![1]);
        assert!(!CancellationRegistry::shared().contains(&id));
        assert_eq!(subject.subscriber_count(), 0);
    }

    #[test]
    fn test_cancel_completes_downstream() {
        let id = EffectId::new("cancellation::completes_downstream");
        let subject = PassthroughSubject::<i32>::new();
        let completed = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&completed);

        let _d = subject
            .effect()
            .cancellable(id.clone(), false)
            .subscribe(|_| {}, move || flag.store(true, Ordering::SeqCst));
        assert!(!completed.load(Ordering::SeqCst));

        let _c = Effect::<i32>::cancel(id).subscribe(|_| {}, || {});
        assert!(completed.load(Ordering::SeqCst));
    }

    #[test]
    fn test_disposing_does_not_complete() {
        let id = EffectId::new("cancellation::dispose_silent");
        let completed = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&completed);

        let subscription = Effect::<i32>::never()
            .cancellable(id.clone(), false)
            .subscribe(|_| {}, move || flag.store(true, Ordering::SeqCst));
        subscription.dispose();

        assert!(!completed.load(Ordering::SeqCst));
        assert!(!CancellationRegistry::shared().contains(&id));
    }

    #[test]
    fn test_cancel_in_flight_silences_first_effect() {
        let id = EffectId::new("cancellation::in_flight");
        let subject = PassthroughSubject::new();
        let values = Arc::new(Mutex::new(Vec::new()));

        let first_sink = Arc::clone(&values);
        let _first = subject
            .effect()
            .map(|v| ("first", v))
            .cancellable(id.clone(), true)
            .subscribe(move |v| first_sink.lock().push(v), || {});
        let second_sink = Arc::clone(&values);
        let _second = subject
            .effect()
            .map(|v| ("second", v))
            .cancellable(id.clone(), true)
            .subscribe(move |v| second_sink.lock().push(v), || {});

        subject.send(1);
        assert_eq!(*values.lock(), vec![("second", 1)]);
        assert_eq!(CancellationRegistry::shared().registrations(&id), 1);
    }

    #[test]
    fn test_without_cancel_in_flight_both_run() {
        let id = EffectId::new("cancellation::both");
        let subject = PassthroughSubject::new();
        let values = Arc::new(Mutex::new(Vec::new()));

        let first_sink = Arc::clone(&values);
        let _first = subject
            .effect()
            .cancellable(id.clone(), false)
            .subscribe(move |v| first_sink.lock().push(v), || {});
        let second_sink = Arc::clone(&values);
        let _second = subject
            .effect()
            .cancellable(id.clone(), false)
            .subscribe(move |v| second_sink.lock().push(v), || {});

        subject.send(7);
        assert_eq!(*values.lock(), vec![7, 7]);

        subject.complete();
        assert!(!CancellationRegistry::shared().contains(&id));
    }

    #[test]
    fn test_cancel_all_cancels_each_id() {
        let subject = PassthroughSubject::<i32>::new();
        let ids = ["cancellation::all::a", "cancellation::all::b"];
        let _a = subject.effect().cancellable(ids[0], false).subscribe(|_| {}, || {});
        let _b = subject.effect().cancellable(ids[1], false).subscribe(|_| {}, || {});
        assert_eq!(subject.subscriber_count(), 2);

        let _c = Effect::<i32>::cancel_all(ids).subscribe(|_| {}, || {});
        assert_eq!(subject.subscriber_count(), 0);
    }

    proptest! {
        #[test]
        fn prop_registry_converges_to_empty(ops in prop::collection::vec((0_u8..3, any::<bool>()), 1..40), tag in any::<u64>()) {
            let id = EffectId::new(("cancellation::prop", tag));
            let subjects: Vec<PassthroughSubject<u8>> = ops.iter().map(|_| PassthroughSubject::new()).collect();
            let mut handles = Vec::new();

            for ((op, flag), subject) in ops.iter().zip(&subjects) {
                match op {
                    0 => handles.push(subject.effect().cancellable(id.clone(), *flag).subscribe(|_| {}, || {})),
                    1 => subject.complete(),
                    _ => {
                        let _ = Effect::<u8>::cancel(id.clone()).subscribe(|_| {}, || {});
                    },
                }
            }
            for subject in &subjects {
                subject.complete();
            }

            prop_assert!(!CancellationRegistry::shared().contains(&id));
        }
    }
}
