//! Store send loop, scoping and ownership

#![allow(clippy::unwrap_used)]

use composable_store_core::prelude::*;
use composable_store_runtime::{Store, StoreConfig, ViewStore, ViolationPolicy};
use composable_store_testing::TestScheduler;
use proptest::prelude::*;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
struct Todo {
    id: u32,
    title: String,
    done: bool,
}

impl Identifiable for Todo {
    type Id = u32;

    fn id(&self) -> u32 {
        self.id
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
struct AppState {
    todos: IdentifiedArray<Todo>,
    log: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
enum TodoAction {
    Toggle,
    Rename(String),
}

#[derive(Debug, Clone, PartialEq)]
enum AppAction {
    Add(u32, &'static str),
    Remove(u32),
    Todo(u32, TodoAction),
    Chain,
    Note(&'static str),
}

fn todo_reducer() -> impl Reducer<State = Todo, Action = TodoAction, Environment = ()> {
    from_fn(|todo: &mut Todo, action: TodoAction, _: &()| {
        match action {
            TodoAction::Toggle => todo.done = !todo.done,
            TodoAction::Rename(title) => todo.title = title,
        }
        Effect::none()
    })
}

fn app_reducer() -> impl Reducer<State = AppState, Action = AppAction, Environment = ()> {
    let app = from_fn(|state: &mut AppState, action: AppAction, _: &()| match action {
        AppAction::Add(id, title) => {
            state.todos.push(Todo {
                id,
                title: title.to_string(),
                done: false,
            });
            Effect::none()
        },
        AppAction::Remove(id) => {
            state.todos.remove(&id);
            Effect::none()
        },
        AppAction::Chain => {
            state.log.push("chain".into());
            Effect::merge([
                Effect::just(AppAction::Note("b")),
                Effect::concatenate([Effect::just(AppAction::Note("c")), Effect::just(AppAction::Note("d"))]),
            ])
        },
        AppAction::Note(note) => {
            state.log.push(note.into());
            Effect::none()
        },
        AppAction::Todo(..) => Effect::none(),
    });

    let todos = todo_reducer().for_each(
        StatePath::key(|state: &mut AppState| &mut state.todos),
        ActionPath::new(
            |(id, action): (u32, TodoAction)| AppAction::Todo(id, action),
            |action: AppAction| match action {
                AppAction::Todo(id, action) => Some((id, action)),
                _ => None,
            },
        ),
        |env: &()| env,
    );

    app.combined(todos)
}

fn app_store() -> Store<AppState, AppAction> {
    Store::new(AppState::default(), app_reducer(), ())
}

#[test]
fn test_synchronous_effects_are_processed_in_fifo_order() {
    let store = app_store();
    store.send(AppAction::Chain);
    assert_eq!(store.state(|s| s.log.clone()), vec!["chain", "b", "c", "d"]);
}

#[test]
fn test_counter_subscriber_sees_every_update() {
    let counter = from_fn(|count: &mut i32, (): (), _: &()| {
        *count += 1;
        Effect::none()
    });
    let store = Store::new(0, counter, ());
    let updates = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&updates);
    let _subscription = store.subscribe_state(move |count| sink.lock().push(*count));

    for _ in 0..5 {
        store.send(());
    }

    assert_eq!(store.current_state(), 5);
    assert_eq!(updates.lock().len(), 5);
}

#[test]
fn test_view_store_with_bucketed_dedup_fires_once() {
    let counter = from_fn(|count: &mut i32, (): (), _: &()| {
        *count += 1;
        Effect::none()
    });
    let store = Store::new(0, counter, ());
    // Everything above one lands in the same bucket.
    let view = ViewStore::with_dedup(store, |lhs: &i32, rhs: &i32| (*lhs > 1) == (*rhs > 1));
    let updates = Arc::new(Mutex::new(0));
    let sink = Arc::clone(&updates);
    let _subscription = view
        .publisher()
        .subscribe(move |_| *sink.lock() += 1, || {});
    *updates.lock() = 0;

    for _ in 0..5 {
        view.send(());
    }

    assert_eq!(*updates.lock(), 1);
    assert_eq!(view.store().current_state(), 5);
}

#[test]
fn test_scoped_children_follow_parent_state() {
    let store = app_store();
    let early = store.scope_state(|s: &AppState| s.todos.len());

    store.send(AppAction::Add(1, "write tests"));
    let late = store.scope_state(|s: &AppState| s.todos.len());
    store.send(AppAction::Add(2, "ship"));

    let expected = store.state(|s| s.todos.len());
    assert_eq!(early.current_state(), expected);
    assert_eq!(late.current_state(), expected);
}

#[test]
fn test_child_actions_reach_the_parent() {
    let store = app_store();
    store.send(AppAction::Add(1, "draft"));

    let titles = store.scope(
        |s: &AppState| s.todos.iter().map(|t| t.title.clone()).collect::<Vec<_>>(),
        |(id, title): (u32, String)| AppAction::Todo(id, TodoAction::Rename(title)),
    );
    titles.send((1, "final".into()));

    assert_eq!(titles.current_state(), vec!["final".to_string()]);
    assert_eq!(store.state(|s| s.todos[0].title.clone()), "final");
}

#[test]
fn test_scope_element_for_missing_id_is_none() {
    let store = app_store();
    store.send(AppAction::Add(1, "present"));

    let missing = store.scope_element(|s: &AppState| &s.todos, 42, AppAction::Todo);
    assert!(missing.is_none());
}

#[test]
fn test_scope_element_tracks_and_forwards() {
    let store = app_store();
    store.send(AppAction::Add(1, "one"));
    store.send(AppAction::Add(2, "two"));

    let second = store
        .scope_element(|s: &AppState| &s.todos, 2, AppAction::Todo)
        .unwrap();
    assert_eq!(second.current_state().title, "two");

    second.send(TodoAction::Toggle);
    assert!(second.current_state().done);
    assert!(store.state(|s| s.todos[1].done));

    // Updates to a sibling leave the element store untouched
    let updates = Arc::new(Mutex::new(0));
    let sink = Arc::clone(&updates);
    let _subscription = second.subscribe_state(move |_| *sink.lock() += 1);
    store.send(AppAction::Todo(1, TodoAction::Toggle));
    assert_eq!(*updates.lock(), 0);

    // Removal keeps the last known element
    store.send(AppAction::Remove(2));
    assert_eq!(second.current_state().title, "two");
    second.send(TodoAction::Rename("gone".into()));
    assert_eq!(store.state(|s| s.todos.len()), 1);
    assert_eq!(second.current_state().title, "two");
}

#[test]
fn test_dropping_child_leaves_parent_running() {
    let store = app_store();
    let child = store.stateless();
    child.send(AppAction::Add(1, "from child"));
    drop(child);

    store.send(AppAction::Add(2, "from parent"));
    assert_eq!(store.state(|s| s.todos.len()), 2);
}

#[test]
fn test_child_keeps_parent_alive() {
    let child = {
        let store = app_store();
        store.scope_state(|s: &AppState| s.log.clone())
    };
    child.send(AppAction::Note("still here"));
    assert_eq!(child.current_state(), vec!["still here".to_string()]);
}

#[test]
fn test_actionless_store_observes_state() {
    let store = app_store();
    let reader = store.actionless();
    store.send(AppAction::Add(7, "seven"));
    assert_eq!(reader.state(|s| s.todos.len()), 1);
}

#[test]
fn test_delayed_effects_resend_through_the_store() {
    let scheduler = TestScheduler::new();
    let clock = scheduler.shared();
    let reducer = from_fn(move |log: &mut Vec<&'static str>, action: &'static str, _: &()| {
        log.push(action);
        if action == "start" {
            Effect::just("tick").delay(Duration::from_secs(1), Arc::clone(&clock))
        } else {
            Effect::none()
        }
    });
    let store = Store::new(Vec::new(), reducer, ());

    store.send("start");
    assert_eq!(store.in_flight_effects(), 1);

    scheduler.advance(Duration::from_secs(1));
    assert_eq!(store.current_state(), vec!["start", "tick"]);
    assert_eq!(store.in_flight_effects(), 0);
}

#[tokio::test]
async fn test_future_effects_feed_back_into_the_store() {
    let reducer = from_fn(|total: &mut u64, action: Option<u64>, _: &()| match action {
        None => Effect::future(async {
            tokio::task::yield_now().await;
            Some(40)
        }),
        Some(value) => {
            *total += value;
            Effect::none()
        },
    });
    let store = Store::new(2, reducer, ());
    let (sender, mut receiver) = tokio::sync::mpsc::unbounded_channel();
    let _subscription = store.publisher().subscribe(
        move |total| {
            let _ = sender.send(total);
        },
        || {},
    );

    store.send(None);
    while let Some(total) = receiver.recv().await {
        if total == 42 {
            break;
        }
    }
    assert_eq!(store.current_state(), 42);
    assert_eq!(store.in_flight_effects(), 0);
}

#[test]
fn test_log_policy_defers_reentrant_sends() {
    let slot: Arc<Mutex<Option<Store<Vec<u8>, u8>>>> = Arc::new(Mutex::new(None));
    let handle = Arc::clone(&slot);
    let reducer = from_fn(move |log: &mut Vec<u8>, action: u8, _: &()| {
        log.push(action);
        if action == 1 {
            let store = handle.lock().clone();
            if let Some(store) = store {
                store.send(2);
            }
        }
        Effect::none()
    });
    let config = StoreConfig::new("reentrant", ViolationPolicy::Log);
    let store = Store::with_config(Vec::new(), reducer, (), config);
    *slot.lock() = Some(store.clone());

    store.send(1);
    store.send(3);
    assert_eq!(store.current_state(), vec![1, 2, 3]);
    slot.lock().take();
}

#[derive(Debug, Clone)]
enum RowOp {
    ToggleThroughChild(u32),
    RenameThroughParent(u32),
    Remove(u32),
    Add(u32),
}

fn row_op() -> impl Strategy<Value = RowOp> {
    (0..4u8, 0..4u32).prop_map(|(kind, id)| match kind {
        0 => RowOp::ToggleThroughChild(id),
        1 => RowOp::RenameThroughParent(id),
        2 => RowOp::Remove(id),
        _ => RowOp::Add(id),
    })
}

proptest! {
    #[test]
    fn prop_element_stores_mirror_present_rows(ops in proptest::collection::vec(row_op(), 0..40)) {
        let store = app_store();
        for id in 0..4 {
            store.send(AppAction::Add(id, "row"));
        }
        let rows: Vec<_> = (0..4)
            .map(|id| store.scope_element(|s: &AppState| &s.todos, id, AppAction::Todo).unwrap())
            .collect();

        for op in ops {
            match op {
                RowOp::ToggleThroughChild(id) => rows[id as usize].send(TodoAction::Toggle),
                RowOp::RenameThroughParent(id) => {
                    store.send(AppAction::Todo(id, TodoAction::Rename(format!("renamed {id}"))));
                },
                RowOp::Remove(id) => store.send(AppAction::Remove(id)),
                RowOp::Add(id) => {
                    if !store.state(|s| s.todos.contains(&id)) {
                        store.send(AppAction::Add(id, "again"));
                    }
                },
            }

            for (id, row) in (0..4u32).zip(&rows) {
                if let Some(todo) = store.state(|s| s.todos.element(&id).cloned()) {
                    prop_assert_eq!(row.current_state(), todo);
                }
            }
        }
        prop_assert_eq!(store.in_flight_effects(), 0);
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Profile {
    name: String,
    visits: u32,
}

#[derive(Debug, Clone, Default, PartialEq)]
struct Session {
    user: Option<Profile>,
}

#[derive(Debug, Clone, PartialEq)]
enum ProfileAction {
    Visit,
}

#[derive(Debug, Clone, PartialEq)]
enum SessionAction {
    LogIn(&'static str),
    LogOut,
    Profile(ProfileAction),
}

fn session_store() -> Store<Session, SessionAction> {
    let auth = from_fn(|session: &mut Session, action: SessionAction, _: &()| {
        match action {
            SessionAction::LogIn(name) => {
                session.user = Some(Profile {
                    name: name.to_string(),
                    visits: 0,
                });
            },
            SessionAction::LogOut => session.user = None,
            SessionAction::Profile(_) => {},
        }
        Effect::none()
    });
    let profile = from_fn(|profile: &mut Profile, action: ProfileAction, _: &()| {
        match action {
            ProfileAction::Visit => profile.visits += 1,
        }
        Effect::none()
    })
    .optional()
    .pullback(
        StatePath::key(|session: &mut Session| &mut session.user),
        ActionPath::new(SessionAction::Profile, |action: SessionAction| match action {
            SessionAction::Profile(action) => Some(action),
            _ => None,
        }),
        |env: &()| env,
    );
    Store::new(Session::default(), auth.combined(profile), ())
}

type Children = Arc<Mutex<Vec<Store<Profile, ProfileAction>>>>;

fn watch_profiles(store: &Store<Session, SessionAction>) -> (Children, Disposable) {
    let children: Children = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&children);
    let subscription = store
        .scope_optional(|session: &Session| session.user.clone(), SessionAction::Profile)
        .subscribe(move |child| sink.lock().push(child), || {});
    (children, subscription)
}

#[test]
fn test_scope_optional_emits_a_child_when_state_appears() {
    let store = session_store();
    let (children, subscription) = watch_profiles(&store);
    assert!(children.lock().is_empty());

    store.send(SessionAction::LogIn("ada"));
    assert_eq!(children.lock().len(), 1);
    let child = children.lock()[0].clone();

    child.send(ProfileAction::Visit);
    assert_eq!(child.current_state().visits, 1);
    assert_eq!(store.state(|s| s.user.as_ref().map(|p| p.visits)), Some(1));

    store.send(SessionAction::Profile(ProfileAction::Visit));
    assert_eq!(child.current_state().visits, 2);
    // Still present: no new child
    assert_eq!(children.lock().len(), 1);

    subscription.dispose();
}

#[test]
fn test_scope_optional_child_keeps_last_state_after_none() {
    let store = session_store();
    let (children, subscription) = watch_profiles(&store);
    store.send(SessionAction::LogIn("ada"));
    let child = children.lock()[0].clone();
    child.send(ProfileAction::Visit);

    store.send(SessionAction::LogOut);
    assert_eq!(
        child.current_state(),
        Profile {
            name: "ada".into(),
            visits: 1,
        }
    );

    // The optional reducer ignores actions while the state is gone.
    child.send(ProfileAction::Visit);
    assert_eq!(store.current_state(), Session::default());
    assert_eq!(child.current_state().visits, 1);

    store.send(SessionAction::LogIn("grace"));
    assert_eq!(children.lock().len(), 2);
    assert_eq!(children.lock()[1].current_state().name, "grace");

    subscription.dispose();
    store.send(SessionAction::LogOut);
    store.send(SessionAction::LogIn("hopper"));
    assert_eq!(children.lock().len(), 2);
}

#[test]
fn test_scope_optional_replays_present_state() {
    let store = session_store();
    store.send(SessionAction::LogIn("ada"));

    let (children, subscription) = watch_profiles(&store);
    assert_eq!(children.lock().len(), 1);
    assert_eq!(children.lock()[0].label(), "store.optional");

    subscription.dispose();
}

#[test]
fn test_send_from_another_thread_is_queued_behind_running_reduction() {
    let reducing = Arc::new(std::sync::Barrier::new(2));
    let sent = Arc::new(std::sync::Barrier::new(2));
    let (entered, released) = (Arc::clone(&reducing), Arc::clone(&sent));
    let reducer = from_fn(move |log: &mut Vec<u8>, action: u8, _: &()| {
        log.push(action);
        if action == 1 {
            entered.wait();
            released.wait();
        }
        Effect::none()
    });
    let config = StoreConfig::new("threads", ViolationPolicy::Log);
    let store = Store::with_config(Vec::new(), reducer, (), config);

    let first = {
        let store = store.clone();
        std::thread::spawn(move || store.send(1))
    };
    let second = {
        let store = store.clone();
        std::thread::spawn(move || {
            reducing.wait();
            store.send(2);
            sent.wait();
        })
    };
    first.join().unwrap();
    second.join().unwrap();

    assert_eq!(store.current_state(), vec![1, 2]);
}
