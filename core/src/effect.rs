//! Effects: cold, cancellable producers of actions
//!
//! An [`Effect`] does nothing until it is subscribed. Subscribing hands the
//! producer a [`Subscriber`] and returns a [`Disposable`]; the producer
//! emits zero or more values through the subscriber and then completes, or
//! stops early when the disposable is disposed.
//!
//! Effects never fail. Faults inside asynchronous work are logged and the
//! effect completes without emitting (see [`Effect::try_future`]).
//!
//! # Example
//!
//! ```
//! use composable_store_core::effect::Effect;
//! use std::sync::{Arc, Mutex};
//!
//! let seen = Arc::new(Mutex::new(Vec::new()));
//! let sink = Arc::clone(&seen);
//!
//! let _subscription = Effect::concatenate([Effect::just(1), Effect::just(2)])
//!     .map(|n| n * 10)
//!     .subscribe(move |n| sink.lock().unwrap().push(n), || {});
//!
//! assert_eq!(*seen.lock().unwrap(), vec![10, 20]);
//! ```

use crate::disposable::{CompositeDisposable, Disposable, SerialDisposable};
use crate::scheduler::Scheduler;
use futures::{Stream, StreamExt};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU8, AtomicUsize, Ordering};
use std::time::Duration;
use tokio::runtime::Handle;

type Producer<A> = Box<dyn FnOnce(Subscriber<A>) -> Disposable + Send>;
type Completion = Box<dyn FnOnce() + Send>;

struct SubscriberInner<A> {
    on_next: Box<dyn Fn(A) + Send + Sync>,
    on_complete: Mutex<Option<Completion>>,
    closed: AtomicBool,
}

/// The receiving end handed to an effect's producer
///
/// Values sent after completion or after the subscription was disposed are
/// dropped. Completion is delivered at most once.
pub struct Subscriber<A> {
    inner: Arc<SubscriberInner<A>>,
}

impl<A> Clone for Subscriber<A> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<A> Subscriber<A> {
    /// Build a subscriber from callbacks
    pub fn new<N, C>(on_next: N, on_complete: C) -> Self
    where
        N: Fn(A) + Send + Sync + 'static,
        C: FnOnce() + Send + 'static,
    {
        Self {
            inner: Arc::new(SubscriberInner {
                on_next: Box::new(on_next),
                on_complete: Mutex::new(Some(Box::new(on_complete))),
                closed: AtomicBool::new(false),
            }),
        }
    }

    /// Deliver a value
    pub fn send(&self, value: A) {
        if !self.inner.closed.load(Ordering::Acquire) {
            (self.inner.on_next)(value);
        }
    }

    /// Signal that no more values follow
    pub fn complete(&self) {
        if self.inner.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        let on_complete = self.inner.on_complete.lock().take();
        if let Some(on_complete) = on_complete {
            on_complete();
        }
    }

    /// Stop delivery without signalling completion
    pub fn close(&self) {
        self.inner.closed.store(true, Ordering::Release);
        let on_complete = self.inner.on_complete.lock().take();
        drop(on_complete);
    }

    /// Whether the subscriber still accepts values
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::Acquire)
    }
}

impl<A> fmt::Debug for Subscriber<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscriber")
            .field("closed", &self.is_closed())
            .finish()
    }
}

/// A lazily started, cancellable producer of values
///
/// # Type Parameters
///
/// - `A`: The value type, usually a reducer's action
#[must_use = "effects do nothing unless subscribed or returned from a reducer"]
pub struct Effect<A> {
    producer: Producer<A>,
}

impl<A> fmt::Debug for Effect<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Effect(<producer>)")
    }
}

impl<A: Send + 'static> Default for Effect<A> {
    fn default() -> Self {
        Self::none()
    }
}

impl<A: Send + 'static> Effect<A> {
    /// Build an effect from a producer function
    ///
    /// The producer runs once per subscription. It must eventually call
    /// [`Subscriber::complete`] unless the effect is meant to run forever,
    /// and return a [`Disposable`] that stops the work.
    pub fn create<F>(producer: F) -> Self
    where
        F: FnOnce(Subscriber<A>) -> Disposable + Send + 'static,
    {
        Self {
            producer: Box::new(producer),
        }
    }

    /// An effect that completes immediately without emitting
    pub fn none() -> Self {
        Self::create(|subscriber| {
            subscriber.complete();
            Disposable::empty()
        })
    }

    /// An effect that emits `value` synchronously and completes
    pub fn just(value: A) -> Self {
        Self::create(move |subscriber| {
            subscriber.send(value);
            subscriber.complete();
            Disposable::empty()
        })
    }

    /// An effect that never emits and never completes
    pub fn never() -> Self {
        Self::create(|_subscriber| Disposable::empty())
    }

    /// Build the effect at subscription time
    pub fn deferred<F>(make: F) -> Self
    where
        F: FnOnce() -> Self + Send + 'static,
    {
        Self::create(move |subscriber| make().subscribe_with(subscriber))
    }

    /// Run `work` synchronously on subscription, emit nothing, complete
    pub fn fire_and_forget<F>(work: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self::create(move |subscriber| {
            work();
            subscriber.complete();
            Disposable::empty()
        })
    }

    /// Run a future on the ambient tokio runtime and emit its output once
    ///
    /// Disposing the subscription aborts the task. Subscribed outside a
    /// runtime, the effect logs an error and completes without emitting.
    pub fn future<F>(future: F) -> Self
    where
        F: Future<Output = A> + Send + 'static,
    {
        Self::spawn(async move { Some(future.await) })
    }

    /// Like [`future`](Self::future) for fallible work
    ///
    /// An `Err` is logged and the effect completes without emitting; the
    /// failure never reaches the reducer.
    pub fn try_future<F, E>(future: F) -> Self
    where
        F: Future<Output = Result<A, E>> + Send + 'static,
        E: fmt::Display + Send + 'static,
    {
        Self::spawn(async move {
            match future.await {
                Ok(value) => Some(value),
                Err(error) => {
                    tracing::error!(error = %error, "effect failed, completing without a value");
                    None
                },
            }
        })
    }

    fn spawn<F>(work: F) -> Self
    where
        F: Future<Output = Option<A>> + Send + 'static,
    {
        Self::create(move |subscriber| {
            let Ok(handle) = Handle::try_current() else {
                tracing::error!("async effect subscribed outside a tokio runtime, completing");
                subscriber.complete();
                return Disposable::empty();
            };
            let task = handle.spawn(async move {
                if let Some(value) = work.await {
                    subscriber.send(value);
                }
                subscriber.complete();
            });
            Disposable::new(move || task.abort())
        })
    }

    /// Forward every item of a stream, completing when the stream ends
    pub fn from_stream<S>(stream: S) -> Self
    where
        S: Stream<Item = A> + Send + 'static,
    {
        Self::create(move |subscriber| {
            let Ok(handle) = Handle::try_current() else {
                tracing::error!("stream effect subscribed outside a tokio runtime, completing");
                subscriber.complete();
                return Disposable::empty();
            };
            let task = handle.spawn(async move {
                let mut stream = Box::pin(stream);
                while let Some(item) = stream.next().await {
                    if subscriber.is_closed() {
                        return;
                    }
                    subscriber.send(item);
                }
                subscriber.complete();
            });
            Disposable::new(move || task.abort())
        })
    }

    /// Run all effects concurrently
    ///
    /// Completes once every constituent has completed. Values from one
    /// constituent keep their order; values from different constituents
    /// interleave as they arrive.
    pub fn merge<I>(effects: I) -> Self
    where
        I: IntoIterator<Item = Self>,
    {
        let effects: Vec<Self> = effects.into_iter().collect();
        match effects.len() {
            0 => Self::none(),
            1 => effects.into_iter().next().unwrap_or_else(Self::none),
            count => Self::create(move |downstream| {
                let remaining = Arc::new(AtomicUsize::new(count));
                let composite = CompositeDisposable::new();
                for effect in effects {
                    let next = downstream.clone();
                    let done = downstream.clone();
                    let remaining = Arc::clone(&remaining);
                    composite.insert(effect.subscribe(
                        move |value| next.send(value),
                        move || {
                            if remaining.fetch_sub(1, Ordering::AcqRel) == 1 {
                                done.complete();
                            }
                        },
                    ));
                }
                composite.to_disposable()
            }),
        }
    }

    /// Run effects one after another
    ///
    /// Each effect is subscribed only after the previous one completed.
    pub fn concatenate<I>(effects: I) -> Self
    where
        I: IntoIterator<Item = Self>,
    {
        let queue: VecDeque<Self> = effects.into_iter().collect();
        if queue.is_empty() {
            return Self::none();
        }
        Self::create(move |downstream| {
            let serial = SerialDisposable::new();
            subscribe_next(Arc::new(Mutex::new(queue)), downstream, serial.clone());
            serial.to_disposable()
        })
    }

    /// Subscribe with callbacks
    ///
    /// The returned handle stops delivery to both callbacks and tears down
    /// the producer.
    pub fn subscribe<N, C>(self, on_next: N, on_complete: C) -> Disposable
    where
        N: Fn(A) + Send + Sync + 'static,
        C: FnOnce() + Send + 'static,
    {
        let subscriber = Subscriber::new(on_next, on_complete);
        let upstream = self.subscribe_with(subscriber.clone());
        Disposable::new(move || {
            subscriber.close();
            upstream.dispose();
        })
    }

    /// Run the producer against an existing subscriber
    pub fn subscribe_with(self, subscriber: Subscriber<A>) -> Disposable {
        (self.producer)(subscriber)
    }

    /// Transform every value
    pub fn map<B, F>(self, transform: F) -> Effect<B>
    where
        B: Send + 'static,
        F: Fn(A) -> B + Send + Sync + 'static,
    {
        Effect::create(move |downstream: Subscriber<B>| {
            let next = downstream.clone();
            self.subscribe(
                move |value| next.send(transform(value)),
                move || downstream.complete(),
            )
        })
    }

    /// Observe every value without changing it
    pub fn inspect<F>(self, observe: F) -> Self
    where
        F: Fn(&A) + Send + Sync + 'static,
    {
        self.map(move |value| {
            observe(&value);
            value
        })
    }

    /// Replace every value by an effect and merge the results
    ///
    /// Completes once the upstream and every produced effect have completed.
    pub fn flat_map<B, F>(self, transform: F) -> Effect<B>
    where
        B: Send + 'static,
        F: Fn(A) -> Effect<B> + Send + Sync + 'static,
    {
        Effect::create(move |downstream: Subscriber<B>| {
            let composite = CompositeDisposable::new();
            let active = Arc::new(AtomicUsize::new(1));
            let finish_one = {
                let active = Arc::clone(&active);
                let downstream = downstream.clone();
                Arc::new(move || {
                    if active.fetch_sub(1, Ordering::AcqRel) == 1 {
                        downstream.complete();
                    }
                })
            };

            let inner = composite.clone();
            let inner_finish = Arc::clone(&finish_one);
            let outer = self.subscribe(
                move |value| {
                    active.fetch_add(1, Ordering::AcqRel);
                    let next = downstream.clone();
                    let finish = Arc::clone(&inner_finish);
                    inner.insert(transform(value).subscribe(move |item| next.send(item), move || finish()));
                },
                move || finish_one(),
            );
            composite.insert(outer);
            composite.to_disposable()
        })
    }

    /// Shift every value and the completion by `due` on `scheduler`
    pub fn delay(self, due: Duration, scheduler: Arc<dyn Scheduler>) -> Self {
        Self::create(move |downstream| {
            let timers = CompositeDisposable::new();
            // (values scheduled but not yet delivered, upstream completed)
            let progress = Arc::new(Mutex::new((0_usize, false)));

            let on_next = {
                let downstream = downstream.clone();
                let timers = timers.clone();
                let scheduler = Arc::clone(&scheduler);
                let progress = Arc::clone(&progress);
                move |value: A| {
                    progress.lock().0 += 1;
                    let next = downstream.clone();
                    let progress = Arc::clone(&progress);
                    timers.insert(scheduler.schedule_after(
                        due,
                        Box::new(move || {
                            next.send(value);
                            let finished = {
                                let mut progress = progress.lock();
                                progress.0 -= 1;
                                progress.0 == 0 && progress.1
                            };
                            if finished {
                                next.complete();
                            }
                        }),
                    ));
                }
            };

            let on_complete = {
                let timers = timers.clone();
                move || {
                    timers.insert(scheduler.schedule_after(
                        due,
                        Box::new(move || {
                            let finished = {
                                let mut progress = progress.lock();
                                progress.1 = true;
                                progress.0 == 0
                            };
                            if finished {
                                downstream.complete();
                            }
                        }),
                    ));
                }
            };

            timers.insert(self.subscribe(on_next, on_complete));
            timers.to_disposable()
        })
    }

    /// Subscribe to the upstream only after `due` has elapsed on `scheduler`
    pub fn delay_subscription(self, due: Duration, scheduler: Arc<dyn Scheduler>) -> Self {
        Self::create(move |downstream| {
            let upstream = SerialDisposable::new();
            let slot = upstream.clone();
            let timer = scheduler.schedule_after(
                due,
                Box::new(move || slot.set(self.subscribe_with(downstream))),
            );
            Disposable::new(move || {
                timer.dispose();
                upstream.dispose();
            })
        })
    }
}

const SUBSCRIBING: u8 = 0;
const COMPLETED_DURING_SUBSCRIBE: u8 = 1;
const RUNNING: u8 = 2;

/// Subscribe the queued effects in order
///
/// Constituents that complete during their own subscribe call are followed
/// by the next one in this loop; only a later, asynchronous completion
/// re-enters. The stack depth stays constant however many effects finish
/// synchronously.
fn subscribe_next<A: Send + 'static>(
    queue: Arc<Mutex<VecDeque<Effect<A>>>>,
    downstream: Subscriber<A>,
    serial: SerialDisposable,
) {
    loop {
        if serial.is_disposed() {
            return;
        }
        let next_effect = queue.lock().pop_front();
        let Some(effect) = next_effect else {
            downstream.complete();
            return;
        };

        // The slot is installed before subscribing so a synchronous completion
        // can replace it and the finished subscription gets disposed on arrival.
        let slot = SerialDisposable::new();
        serial.set(slot.to_disposable());

        let phase = Arc::new(AtomicU8::new(SUBSCRIBING));
        let next = downstream.clone();
        let on_complete = {
            let phase = Arc::clone(&phase);
            let queue = Arc::clone(&queue);
            let downstream = downstream.clone();
            let serial = serial.clone();
            move || {
                let finished_inline = phase
                    .compare_exchange(SUBSCRIBING, COMPLETED_DURING_SUBSCRIBE, Ordering::AcqRel, Ordering::Acquire)
                    .is_ok();
                if !finished_inline {
                    subscribe_next(queue, downstream, serial);
                }
            }
        };
        slot.set(effect.subscribe(move |value| next.send(value), on_complete));

        let still_running = phase
            .compare_exchange(SUBSCRIBING, RUNNING, Ordering::AcqRel, Ordering::Acquire)
            .is_ok();
        if still_running {
            return;
        }
    }
}

/// A hot, multicast source of values
///
/// Every [`effect`](Self::effect) subscribed before a [`send`](Self::send)
/// receives the value. Useful for bridging callback-style APIs into effects.
pub struct PassthroughSubject<A> {
    state: Arc<Mutex<SubjectState<A>>>,
}

struct SubjectState<A> {
    completed: bool,
    next_id: u64,
    subscribers: Vec<(u64, Subscriber<A>)>,
}

impl<A> Clone for PassthroughSubject<A> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
        }
    }
}

impl<A: Clone + Send + 'static> Default for PassthroughSubject<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A: Clone + Send + 'static> PassthroughSubject<A> {
    /// Create a subject with no subscribers
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(SubjectState {
                completed: false,
                next_id: 0,
                subscribers: Vec::new(),
            })),
        }
    }

    /// Deliver `value` to every current subscriber
    pub fn send(&self, value: A) {
        let subscribers: Vec<Subscriber<A>> = {
            let state = self.state.lock();
            if state.completed {
                return;
            }
            state.subscribers.iter().map(|(_, s)| s.clone()).collect()
        };
        for subscriber in subscribers {
            subscriber.send(value.clone());
        }
    }

    /// Complete every current and future subscriber
    pub fn complete(&self) {
        let subscribers = {
            let mut state = self.state.lock();
            state.completed = true;
            std::mem::take(&mut state.subscribers)
        };
        for (_, subscriber) in subscribers {
            subscriber.complete();
        }
    }

    /// Number of live subscribers
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.state.lock().subscribers.len()
    }

    /// An effect emitting whatever is sent after subscription
    pub fn effect(&self) -> Effect<A> {
        let state = Arc::downgrade(&self.state);
        Effect::create(move |subscriber| {
            let Some(shared) = state.upgrade() else {
                subscriber.complete();
                return Disposable::empty();
            };
            let id = {
                let mut guard = shared.lock();
                if guard.completed {
                    None
                } else {
                    let id = guard.next_id;
                    guard.next_id += 1;
                    guard.subscribers.push((id, subscriber.clone()));
                    Some(id)
                }
            };
            let Some(id) = id else {
                subscriber.complete();
                return Disposable::empty();
            };
            Disposable::new(move || {
                if let Some(shared) = state.upgrade() {
                    shared.lock().subscribers.retain(|(existing, _)| *existing != id);
                }
            })
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::scheduler::ImmediateScheduler;

    fn collect<A: Send + 'static>(effect: Effect<A>) -> (Arc<Mutex<Vec<A>>>, Arc<AtomicBool>, Disposable) {
        let values = Arc::new(Mutex::new(Vec::new()));
        let completed = Arc::new(AtomicBool::new(false));
        let sink = Arc::clone(&values);
        let done = Arc::clone(&completed);
        let disposable = effect.subscribe(
            move |value| sink.lock().push(value),
            move || done.store(true, Ordering::SeqCst),
        );
        (values, completed, disposable)
    }

    #[test]
    fn test_none_completes_without_values() {
        let (values, completed, _d) = collect(Effect::<i32>::none());
        assert!(values.lock().is_empty());
        assert!(completed.load(Ordering::SeqCst));
    }

    #[test]
    fn test_never_does_not_complete() {
        let (values, completed, _d) = collect(Effect::<i32>::never());
        assert!(values.lock().is_empty());
        assert!(!completed.load(Ordering::SeqCst));
    }

    #[test]
    fn test_fire_and_forget_runs_work_on_subscribe() {
        let ran = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&ran);
        let effect = Effect::<i32>::fire_and_forget(move || flag.store(true, Ordering::SeqCst));
        assert!(!ran.load(Ordering::SeqCst));

        let (values, completed, _d) = collect(effect);
        assert!(ran.load(Ordering::SeqCst));
        assert!(values.lock().is_empty());
        assert!(completed.load(Ordering::SeqCst));
    }

    #[test]
    fn test_merge_completes_after_all_constituents() {
        let subject = PassthroughSubject::new();
        let effect = Effect::merge([Effect::just(1), subject.effect(), Effect::just(2)]);
        let (values, completed, _d) = collect(effect);

        assert_eq!(*values.lock(), vec![1, 2]);
        assert!(!completed.load(Ordering::SeqCst));

        subject.send(3);
        subject.complete();
        assert_eq!(*values.lock(), vec![1, 2, 3]);
        assert!(completed.load(Ordering::SeqCst));
    }

    #[test]
    fn test_concatenate_waits_for_previous_completion() {
        let first = PassthroughSubject::new();
        let effect = Effect::concatenate([first.effect(), Effect::just(2), Effect::just(3)]);
        let (values, completed, _d) = collect(effect);

        first.send(1);
        assert_eq!(*values.lock(), vec![1]);

        first.complete();
        assert_eq!(*values.lock(), vec![1, 2, 3]);
        assert!(completed.load(Ordering::SeqCst));
    }

    #[test]
    fn test_concatenate_many_synchronous_effects() {
        let count: usize = 100_000;
        let effect = Effect::concatenate((0..count).map(|n| match n % 3 {
            0 => Effect::just(n),
            1 => Effect::none(),
            _ => Effect::fire_and_forget(|| {}),
        }));
        let (values, completed, _d) = collect(effect);

        assert_eq!(values.lock().len(), count.div_ceil(3));
        assert!(completed.load(Ordering::SeqCst));
    }

    #[test]
    fn test_concatenate_resumes_after_asynchronous_completion() {
        let first = PassthroughSubject::new();
        let second = PassthroughSubject::new();
        let effects = std::iter::once(first.effect())
            .chain((0..10_000).map(|_| Effect::just(0)))
            .chain([second.effect(), Effect::just(9)]);
        let (values, completed, _d) = collect(Effect::concatenate(effects));

        assert!(values.lock().is_empty());
        first.complete();
        assert_eq!(values.lock().len(), 10_000);
        assert_eq!(second.subscriber_count(), 1);
        assert!(!completed.load(Ordering::SeqCst));

        second.send(5);
        second.complete();
        assert_eq!(values.lock()[10_000..], [5, 9]);
        assert!(completed.load(Ordering::SeqCst));
    }

    #[test]
    fn test_dispose_stops_delivery() {
        let subject = PassthroughSubject::new();
        let (values, completed, disposable) = collect(subject.effect());

        subject.send(1);
        disposable.dispose();
        subject.send(2);
        subject.complete();

        assert_eq!(*values.lock(), vec![1]);
        assert!(!completed.load(Ordering::SeqCst));
        assert_eq!(subject.subscriber_count(), 0);
    }

    #[test]
    fn test_flat_map_completes_after_inner_effects() {
        let inner = PassthroughSubject::new();
        let source = inner.clone();
        let effect = Effect::concatenate([Effect::just(1), Effect::just(2)])
            .flat_map(move |n| Effect::merge([Effect::just(n * 10), source.effect()]));
        let (values, completed, _d) = collect(effect);

        assert_eq!(*values.lock(), vec![10, 20]);
        assert!(!completed.load(Ordering::SeqCst));

        inner.send(7);
        assert_eq!(*values.lock(), vec![10, 20, 7, 7]);
        inner.complete();
        assert!(completed.load(Ordering::SeqCst));
    }

    #[test]
    fn test_deferred_builds_at_subscription() {
        let built = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&built);
        let effect = Effect::deferred(move || {
            flag.store(true, Ordering::SeqCst);
            Effect::just("ready")
        });
        assert!(!built.load(Ordering::SeqCst));

        let (values, _, _d) = collect(effect);
        assert!(built.load(Ordering::SeqCst));
        assert_eq!(*values.lock(), vec!["ready"]);
    }

    #[test]
    fn test_delay_on_immediate_scheduler_is_synchronous() {
        let scheduler: Arc<dyn Scheduler> = Arc::new(ImmediateScheduler::new());
        let effect = Effect::just(5).delay(Duration::from_secs(1), scheduler);
        let (values, completed, _d) = collect(effect);
        assert_eq!(*values.lock(), vec![5]);
        assert!(completed.load(Ordering::SeqCst));
    }

    #[test]
    fn test_future_outside_runtime_completes_without_value() {
        let (values, completed, _d) = collect(Effect::future(async { 1 }));
        assert!(values.lock().is_empty());
        assert!(completed.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_future_emits_once() {
        let (tx, rx) = tokio::sync::oneshot::channel();
        let tx = Mutex::new(Some(tx));
        let _d = Effect::future(async { 42 }).subscribe(
            move |value| {
                if let Some(tx) = tx.lock().take() {
                    let _ = tx.send(value);
                }
            },
            || {},
        );
        assert_eq!(rx.await.unwrap(), 42);
    }

    #[tokio::test]
    async fn test_try_future_error_completes_silently() {
        let (tx, rx) = tokio::sync::oneshot::channel::<usize>();
        let values = Arc::new(Mutex::new(Vec::<i32>::new()));
        let sink = Arc::clone(&values);
        let _d = Effect::try_future(async { Err::<i32, _>("boom") }).subscribe(
            move |value| sink.lock().push(value),
            move || {
                let _ = tx.send(0);
            },
        );
        rx.await.unwrap();
        assert!(values.lock().is_empty());
    }

    #[tokio::test]
    async fn test_from_stream_forwards_items() {
        let stream = async_stream::stream! {
            for n in 1..=3 {
                yield n;
            }
        };
        let (tx, rx) = tokio::sync::oneshot::channel::<()>();
        let values = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&values);
        let _d = Effect::from_stream(stream).subscribe(
            move |value| sink.lock().push(value),
            move || {
                let _ = tx.send(());
            },
        );
        rx.await.unwrap();
        assert_eq!(*values.lock(), vec![1, 2, 3]);
    }
}
