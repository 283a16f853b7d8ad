//! Subscription handles
//!
//! Every subscription to an [`Effect`](crate::effect::Effect) yields a
//! [`Disposable`]. Disposing it stops further emissions and releases whatever
//! the producer holds (spawned tasks, scheduled timers, nested subscriptions).
//!
//! - [`Disposable`]: idempotent, cloneable handle around a teardown closure
//! - [`CompositeDisposable`]: keyed set of handles disposed together
//! - [`SerialDisposable`]: slot whose current handle is disposed on replacement
//! - [`DisposeBag`]: owner that disposes everything it holds when dropped

use parking_lot::Mutex;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

type Teardown = Box<dyn FnOnce() + Send>;

struct DisposableInner {
    teardown: Mutex<Option<Teardown>>,
    disposed: AtomicBool,
}

/// Handle to an active subscription
///
/// Cloning shares the handle; disposing any clone disposes all of them.
/// Disposal runs the teardown closure at most once.
#[derive(Clone)]
pub struct Disposable {
    inner: Arc<DisposableInner>,
}

impl Disposable {
    /// Create a handle that runs `teardown` on first disposal
    pub fn new<F>(teardown: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self {
            inner: Arc::new(DisposableInner {
                teardown: Mutex::new(Some(Box::new(teardown))),
                disposed: AtomicBool::new(false),
            }),
        }
    }

    /// Create a handle with nothing to tear down
    #[must_use]
    pub fn empty() -> Self {
        Self {
            inner: Arc::new(DisposableInner {
                teardown: Mutex::new(None),
                disposed: AtomicBool::new(false),
            }),
        }
    }

    /// Dispose the subscription
    ///
    /// Idempotent: only the first call runs the teardown.
    pub fn dispose(&self) {
        if self.inner.disposed.swap(true, Ordering::AcqRel) {
            return;
        }
        let teardown = self.inner.teardown.lock().take();
        if let Some(teardown) = teardown {
            teardown();
        }
    }

    /// Whether [`dispose`](Self::dispose) has been called
    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.inner.disposed.load(Ordering::Acquire)
    }

    /// Hand the handle to a [`DisposeBag`]
    pub fn disposed_by(self, bag: &mut DisposeBag) {
        bag.insert(self);
    }
}

impl fmt::Debug for Disposable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Disposable")
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

/// Key returned by [`CompositeDisposable::insert`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DisposeKey(u64);

#[derive(Default)]
struct CompositeState {
    disposed: bool,
    next_key: u64,
    entries: HashMap<u64, Disposable>,
}

/// A set of disposables torn down together
///
/// Inserting into an already disposed composite disposes the new handle
/// immediately.
#[derive(Clone, Default)]
pub struct CompositeDisposable {
    state: Arc<Mutex<CompositeState>>,
}

impl CompositeDisposable {
    /// Create an empty composite
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a handle, returning its key, or `None` if the composite is already disposed
    pub fn insert(&self, disposable: Disposable) -> Option<DisposeKey> {
        let mut state = self.state.lock();
        if state.disposed {
            drop(state);
            disposable.dispose();
            return None;
        }
        let key = state.next_key;
        state.next_key += 1;
        state.entries.insert(key, disposable);
        Some(DisposeKey(key))
    }

    /// Remove a handle without disposing it
    pub fn remove(&self, key: DisposeKey) -> Option<Disposable> {
        self.state.lock().entries.remove(&key.0)
    }

    /// Number of handles currently held
    #[must_use]
    pub fn len(&self) -> usize {
        self.state.lock().entries.len()
    }

    /// Whether no handles are held
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether the composite has been disposed
    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.state.lock().disposed
    }

    /// Dispose every held handle and reject future insertions
    pub fn dispose(&self) {
        let entries = {
            let mut state = self.state.lock();
            state.disposed = true;
            std::mem::take(&mut state.entries)
        };
        for disposable in entries.into_values() {
            disposable.dispose();
        }
    }

    /// A single handle that disposes the whole composite
    #[must_use]
    pub fn to_disposable(&self) -> Disposable {
        let composite = self.clone();
        Disposable::new(move || composite.dispose())
    }
}

impl fmt::Debug for CompositeDisposable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("CompositeDisposable")
            .field("disposed", &state.disposed)
            .field("len", &state.entries.len())
            .finish()
    }
}

#[derive(Default)]
struct SerialState {
    disposed: bool,
    current: Option<Disposable>,
}

/// A slot holding at most one handle
///
/// Setting a new handle disposes the previous one. Once the slot itself is
/// disposed, anything set afterwards is disposed on arrival, which makes it
/// safe to assign a subscription that finished before it could be stored.
#[derive(Clone, Default)]
pub struct SerialDisposable {
    state: Arc<Mutex<SerialState>>,
}

impl SerialDisposable {
    /// Create an empty slot
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the held handle
    pub fn set(&self, disposable: Disposable) {
        let previous = {
            let mut state = self.state.lock();
            if state.disposed {
                None
            } else {
                Some(state.current.replace(disposable.clone()))
            }
        };
        match previous {
            None => disposable.dispose(),
            Some(Some(previous)) => previous.dispose(),
            Some(None) => {},
        }
    }

    /// Whether the slot has been disposed
    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.state.lock().disposed
    }

    /// Dispose the held handle and every handle set afterwards
    pub fn dispose(&self) {
        let current = {
            let mut state = self.state.lock();
            state.disposed = true;
            state.current.take()
        };
        if let Some(current) = current {
            current.dispose();
        }
    }

    /// A single handle that disposes the slot
    #[must_use]
    pub fn to_disposable(&self) -> Disposable {
        let serial = self.clone();
        Disposable::new(move || serial.dispose())
    }
}

/// Owns disposables and disposes them when dropped
#[derive(Debug, Default)]
pub struct DisposeBag {
    disposables: Vec<Disposable>,
}

impl DisposeBag {
    /// Create an empty bag
    #[must_use]
    pub const fn new() -> Self {
        Self {
            disposables: Vec::new(),
        }
    }

    /// Take ownership of a handle
    pub fn insert(&mut self, disposable: Disposable) {
        self.disposables.push(disposable);
    }

    /// Number of handles in the bag
    #[must_use]
    pub fn len(&self) -> usize {
        self.disposables.len()
    }

    /// Whether the bag is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.disposables.is_empty()
    }
}

impl Drop for DisposeBag {
    fn drop(&mut self) {
        for disposable in self.disposables.drain(..) {
            disposable.dispose();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn counting() -> (Disposable, Arc<AtomicUsize>) {
        let count = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&count);
        let disposable = Disposable::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        (disposable, count)
    }

    #[test]
    fn test_dispose_runs_teardown_once() {
        let (disposable, count) = counting();
        let clone = disposable.clone();

        disposable.dispose();
        clone.dispose();

        assert!(clone.is_disposed());
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_composite_disposes_members() {
        let composite = CompositeDisposable::new();
        let (a, a_count) = counting();
        let (b, b_count) = counting();
        composite.insert(a);
        let key = composite.insert(b);
        assert_eq!(composite.len(), 2);

        // Removed handles are not disposed by the composite
        assert!(key.and_then(|k| composite.remove(k)).is_some());
        composite.dispose();

        assert_eq!(a_count.load(Ordering::SeqCst), 1);
        assert_eq!(b_count.load(Ordering::SeqCst), 0);
        assert!(composite.is_empty());
    }

    #[test]
    fn test_composite_rejects_after_dispose() {
        let composite = CompositeDisposable::new();
        composite.dispose();

        let (late, count) = counting();
        assert!(composite.insert(late).is_none());
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_serial_replaces_and_disposes_previous() {
        let serial = SerialDisposable::new();
        let (first, first_count) = counting();
        let (second, second_count) = counting();

        serial.set(first);
        serial.set(second);
        assert_eq!(first_count.load(Ordering::SeqCst), 1);
        assert_eq!(second_count.load(Ordering::SeqCst), 0);

        serial.dispose();
        assert_eq!(second_count.load(Ordering::SeqCst), 1);

        let (late, late_count) = counting();
        serial.set(late);
        assert_eq!(late_count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_dispose_bag_disposes_on_drop() {
        let (disposable, count) = counting();
        {
            let mut bag = DisposeBag::new();
            disposable.disposed_by(&mut bag);
            assert_eq!(bag.len(), 1);
        }
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }
}
