//! Domain types for the Todos demo.

use composable_store_core::identified::{Identifiable, IdentifiedArray};
use composable_store_macros::{CasePaths, StatePaths};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for a todo
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TodoId(pub u64);

impl fmt::Display for TodoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A single todo row
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Todo {
    /// Unique identifier
    pub id: TodoId,
    /// What needs doing
    pub description: String,
    /// Whether it's done
    pub complete: bool,
}

impl Todo {
    /// Creates an empty, incomplete todo
    #[must_use]
    pub const fn new(id: TodoId) -> Self {
        Self {
            id,
            description: String::new(),
            complete: false,
        }
    }
}

impl Identifiable for Todo {
    type Id = TodoId;

    fn id(&self) -> TodoId {
        self.id
    }
}

/// Actions a single row can send
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TodoAction {
    /// The checkbox was toggled
    CheckBoxToggled,
    /// The description was edited
    TextFieldChanged(String),
}

/// Which todos the list shows
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Filter {
    /// Every todo
    #[default]
    All,
    /// Incomplete todos
    Active,
    /// Complete todos
    Completed,
}

impl Filter {
    /// Whether `todo` is visible under this filter
    #[must_use]
    pub const fn includes(self, todo: &Todo) -> bool {
        match self {
            Self::All => true,
            Self::Active => !todo.complete,
            Self::Completed => todo.complete,
        }
    }
}

/// State of the whole list
#[derive(StatePaths, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodosState {
    /// Todos in display order
    pub todos: IdentifiedArray<Todo>,
    /// Active filter
    pub filter: Filter,
}

impl TodosState {
    /// Todos visible under the current filter
    #[must_use]
    pub fn filtered_todos(&self) -> Vec<&Todo> {
        self.todos.iter().filter(|todo| self.filter.includes(todo)).collect()
    }

    /// Number of incomplete todos
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.todos.iter().filter(|todo| !todo.complete).count()
    }
}

/// Actions for the whole list
#[derive(CasePaths, Clone, Debug, PartialEq, Eq)]
pub enum TodosAction {
    /// Add a blank todo at the top
    AddTodoButtonTapped,
    /// Remove every completed todo
    ClearCompletedButtonTapped,
    /// Remove the given todos
    Delete(Vec<TodoId>),
    /// Change the filter
    FilterPicked(Filter),
    /// Move completed todos below incomplete ones
    SortCompletedTodos,
    /// A row action
    Todo(TodoId, TodoAction),
}
