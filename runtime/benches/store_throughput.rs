//! Store throughput benchmarks
//!
//! Measures the cost of the send loop, synchronous effect feedback, and
//! state propagation through scoped stores.
//!
//! Run with: `cargo bench -p composable-store-runtime`

#![allow(missing_docs)]
#![allow(clippy::expect_used)]

use composable_store_core::{effect::Effect, reducer::Reducer};
use composable_store_runtime::{Store, ViewStore};
use criterion::{Criterion, Throughput, black_box, criterion_group, criterion_main};

#[derive(Clone, Debug)]
struct BenchState {
    counter: i64,
    data: Vec<u8>,
}

impl Default for BenchState {
    fn default() -> Self {
        Self {
            counter: 0,
            data: vec![0; 1024],
        }
    }
}

#[derive(Clone, Debug)]
enum BenchAction {
    Increment,
    Chain(u8),
    Fanout(u8),
}

struct BenchReducer;

impl Reducer for BenchReducer {
    type State = BenchState;
    type Action = BenchAction;
    type Environment = ();

    fn reduce(&self, state: &mut BenchState, action: BenchAction, _env: &()) -> Effect<BenchAction> {
        match action {
            BenchAction::Increment => {
                state.counter += 1;
                Effect::none()
            },
            BenchAction::Chain(0) | BenchAction::Fanout(0) => Effect::none(),
            BenchAction::Chain(remaining) => {
                state.counter += 1;
                Effect::just(BenchAction::Chain(remaining - 1))
            },
            BenchAction::Fanout(width) => {
                state.data[0] = state.data[0].wrapping_add(1);
                Effect::merge((0..width).map(|_| Effect::just(BenchAction::Increment)))
            },
        }
    }
}

/// Reducer execution in isolation (no Store overhead)
fn benchmark_reducer(c: &mut Criterion) {
    let mut group = c.benchmark_group("reducer");
    group.throughput(Throughput::Elements(1));

    group.bench_function("increment", |b| {
        let mut state = BenchState::default();
        b.iter(|| {
            let _effect = BenchReducer.reduce(&mut state, black_box(BenchAction::Increment), &());
        });
    });

    group.finish();
}

/// Actions per second through the send loop
fn benchmark_send(c: &mut Criterion) {
    let mut group = c.benchmark_group("store_send");
    group.throughput(Throughput::Elements(1));

    group.bench_function("send_action", |b| {
        let store = Store::new(BenchState::default(), BenchReducer, ());
        b.iter(|| store.send(black_box(BenchAction::Increment)));
    });

    group.bench_function("send_and_read_state", |b| {
        let store = Store::new(BenchState::default(), BenchReducer, ());
        b.iter(|| {
            store.send(black_box(BenchAction::Increment));
            black_box(store.state(|s| s.counter));
        });
    });

    group.finish();
}

/// Synchronous effect feedback
fn benchmark_effect_feedback(c: &mut Criterion) {
    let mut group = c.benchmark_group("effect_feedback");

    for depth in [8_u8, 64] {
        group.throughput(Throughput::Elements(u64::from(depth)));
        group.bench_function(format!("chain_{depth}"), |b| {
            let store = Store::new(BenchState::default(), BenchReducer, ());
            b.iter(|| store.send(BenchAction::Chain(depth)));
        });
        group.bench_function(format!("fanout_{depth}"), |b| {
            let store = Store::new(BenchState::default(), BenchReducer, ());
            b.iter(|| store.send(BenchAction::Fanout(depth)));
        });
    }

    group.finish();
}

/// State propagation to scoped stores and view stores
fn benchmark_scoping(c: &mut Criterion) {
    let mut group = c.benchmark_group("scoping");
    group.throughput(Throughput::Elements(1));

    group.bench_function("send_through_child", |b| {
        let store = Store::new(BenchState::default(), BenchReducer, ());
        let child = store.scope(|s: &BenchState| s.counter, |action: BenchAction| action);
        b.iter(|| child.send(black_box(BenchAction::Increment)));
    });

    group.bench_function("send_with_ten_views", |b| {
        let store = Store::new(BenchState::default(), BenchReducer, ());
        let views: Vec<_> = (0..10)
            .map(|_| ViewStore::with_dedup(store.clone(), |l: &BenchState, r: &BenchState| l.counter == r.counter))
            .collect();
        b.iter(|| store.send(black_box(BenchAction::Increment)));
        drop(views);
    });

    group.finish();
}

criterion_group!(
    benches,
    benchmark_reducer,
    benchmark_send,
    benchmark_effect_feedback,
    benchmark_scoping
);
criterion_main!(benches);
