//! Reducer logic for the Todos demo.
//!
//! The row reducer runs on one todo through `for_each`; the list reducer
//! handles everything else, including the debounced re-sort after a
//! checkbox toggle.

use crate::types::{Todo, TodoAction, TodoId, TodosAction, TodosState};
use composable_store_core::effect::Effect;
use composable_store_core::identified::IdentifiedArray;
use composable_store_core::reducer::{Reducer, ReducerExt};
use composable_store_core::scheduler::Scheduler;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// How long the list waits after the last toggle before re-sorting
pub const SORT_DELAY: Duration = Duration::from_secs(1);

static INSTANCES: AtomicU64 = AtomicU64::new(0);

/// Cancellation id for the pending re-sort of one list
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
struct SortCompletedId(u64);

/// Environment dependencies for the Todos reducer
pub struct TodosEnvironment {
    /// Scheduler for the debounced re-sort
    pub scheduler: Arc<dyn Scheduler>,
    next_id: AtomicU64,
    instance: u64,
}

impl TodosEnvironment {
    /// Creates an environment whose todo ids start at zero
    #[must_use]
    pub fn new(scheduler: Arc<dyn Scheduler>) -> Self {
        Self {
            scheduler,
            next_id: AtomicU64::new(0),
            instance: INSTANCES.fetch_add(1, Ordering::Relaxed),
        }
    }

    fn next_id(&self) -> TodoId {
        TodoId(self.next_id.fetch_add(1, Ordering::Relaxed))
    }
}

/// Reducer for a single todo row
#[derive(Clone, Copy, Debug, Default)]
pub struct TodoReducer;

impl Reducer for TodoReducer {
    type State = Todo;
    type Action = TodoAction;
    type Environment = ();

    fn reduce(&self, todo: &mut Todo, action: TodoAction, _env: &()) -> Effect<TodoAction> {
        match action {
            TodoAction::CheckBoxToggled => todo.complete = !todo.complete,
            TodoAction::TextFieldChanged(description) => todo.description = description,
        }
        Effect::none()
    }
}

/// Reducer for list-level actions
#[derive(Clone, Copy, Debug, Default)]
pub struct ListReducer;

impl Reducer for ListReducer {
    type State = TodosState;
    type Action = TodosAction;
    type Environment = TodosEnvironment;

    fn reduce(&self, state: &mut TodosState, action: TodosAction, env: &TodosEnvironment) -> Effect<TodosAction> {
        match action {
            TodosAction::AddTodoButtonTapped => {
                state.todos.insert(0, Todo::new(env.next_id()));
                Effect::none()
            },
            TodosAction::ClearCompletedButtonTapped => {
                state.todos.retain(|todo| !todo.complete);
                Effect::none()
            },
            TodosAction::Delete(ids) => {
                for id in &ids {
                    state.todos.remove(id);
                }
                Effect::none()
            },
            TodosAction::FilterPicked(filter) => {
                state.filter = filter;
                Effect::none()
            },
            TodosAction::SortCompletedTodos => {
                let mut todos: Vec<Todo> = state.todos.iter().cloned().collect();
                todos.sort_by_key(|todo| todo.complete);
                state.todos = IdentifiedArray::from(todos);
                Effect::none()
            },
            TodosAction::Todo(_, TodoAction::CheckBoxToggled) => Effect::just(TodosAction::SortCompletedTodos)
                .debounce(SortCompletedId(env.instance), SORT_DELAY, Arc::clone(&env.scheduler)),
            TodosAction::Todo(..) => Effect::none(),
        }
    }
}

/// The full Todos reducer: rows, then the list, with debug logging
pub fn todos_reducer()
-> impl Reducer<State = TodosState, Action = TodosAction, Environment = TodosEnvironment> + Send + Sync + 'static {
    TodoReducer
        .for_each(
            TodosState::todos_path(),
            TodosAction::todo_case(),
            |_: &TodosEnvironment| &(),
        )
        .combined(ListReducer)
        .debug("todos")
}
