//! Todos demo for the Composable Store architecture.
//!
//! A todo list where each row is its own store scoped out of the list. It
//! demonstrates:
//!
//! - `for_each` to run a row reducer on one element of an identified array
//! - `#[derive(CasePaths)]` and `#[derive(StatePaths)]` for the paths
//! - `scope_element` to hand each row its own store
//! - `debounce` to re-sort completed todos once toggling settles
//! - `ViewStore` to observe the visible rows without duplicates
//!
//! # Quick Start
//!
//! ```
//! use composable_store_core::scheduler::ImmediateScheduler;
//! use composable_store_runtime::Store;
//! use todos::{TodoAction, TodosAction, TodosEnvironment, TodosState, todos_reducer};
//!
//! let env = TodosEnvironment::new(ImmediateScheduler::shared());
//! let store = Store::new(TodosState::default(), todos_reducer(), env);
//!
//! store.send(TodosAction::AddTodoButtonTapped);
//! let id = store.state(|s| s.todos[0].id);
//!
//! let row = store
//!     .scope_element(|s: &TodosState| &s.todos, id, TodosAction::Todo)
//!     .expect("todo was just added");
//! row.send(TodoAction::TextFieldChanged("Buy milk".into()));
//!
//! assert_eq!(store.state(|s| s.todos[0].description.clone()), "Buy milk");
//! ```

pub mod reducer;
pub mod types;

// Re-export commonly used types
pub use reducer::{ListReducer, SORT_DELAY, TodoReducer, TodosEnvironment, todos_reducer};
pub use types::{Filter, Todo, TodoAction, TodoId, TodosAction, TodosState};
