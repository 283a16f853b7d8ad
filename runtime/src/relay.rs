//! Current-value broadcaster backing store and view-store state
//!
//! A relay holds the latest value and notifies observers synchronously on
//! every [`accept`](StateRelay::accept). Observers are called outside the
//! relay's locks, so an observer may read the relay or accept into another
//! relay (which is how scoped stores follow their parent).

use composable_store_core::disposable::Disposable;
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

type Observer<S> = Arc<dyn Fn(&S) + Send + Sync>;

struct RelayInner<S> {
    value: Mutex<Arc<S>>,
    observers: Mutex<Vec<(u64, Observer<S>)>>,
    next_id: AtomicU64,
}

pub(crate) struct StateRelay<S> {
    inner: Arc<RelayInner<S>>,
}

impl<S> Clone for StateRelay<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: Send + Sync + 'static> StateRelay<S> {
    pub(crate) fn new(initial: S) -> Self {
        Self {
            inner: Arc::new(RelayInner {
                value: Mutex::new(Arc::new(initial)),
                observers: Mutex::new(Vec::new()),
                next_id: AtomicU64::new(0),
            }),
        }
    }

    pub(crate) fn value(&self) -> Arc<S> {
        Arc::clone(&self.inner.value.lock())
    }

    /// Replace the value and notify every observer
    pub(crate) fn accept(&self, value: S) {
        let value = Arc::new(value);
        *self.inner.value.lock() = Arc::clone(&value);
        let observers: Vec<Observer<S>> = self
            .inner
            .observers
            .lock()
            .iter()
            .map(|(_, observer)| Arc::clone(observer))
            .collect();
        for observer in observers {
            observer(&value);
        }
    }

    /// Register `observer` for future values only
    pub(crate) fn observe<F>(&self, observer: F) -> Disposable
    where
        F: Fn(&S) + Send + Sync + 'static,
    {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        self.inner.observers.lock().push((id, Arc::new(observer)));
        let relay = Arc::downgrade(&self.inner);
        Disposable::new(move || {
            if let Some(relay) = relay.upgrade() {
                relay.observers.lock().retain(|(existing, _)| *existing != id);
            }
        })
    }

}

impl<S> StateRelay<S> {
    pub(crate) fn observer_count(&self) -> usize {
        self.inner.observers.lock().len()
    }
}
