//! State and action paths
//!
//! A [`StatePath`] focuses a mutable borrow of a child value inside a parent
//! state, possibly failing (an `Option` field, a missing collection element).
//! An [`ActionPath`] embeds a child action into a parent action and extracts
//! it back out, usually one enum variant.
//!
//! Both are plain closures behind `Arc` so they clone cheaply and compose.
//!
//! ```
//! use composable_store_core::case_path;
//! use composable_store_core::paths::{ActionPath, StatePath};
//!
//! struct App { count: i32 }
//! #[derive(Debug, PartialEq)]
//! enum AppAction { Counter(i32), Reset }
//!
//! let count: StatePath<App, i32> = StatePath::key(|app: &mut App| &mut app.count);
//! let counter: ActionPath<AppAction, i32> = case_path!(AppAction::Counter);
//!
//! let mut app = App { count: 1 };
//! *count.focus(&mut app).unwrap() += 1;
//! assert_eq!(app.count, 2);
//! assert_eq!(counter.extract(AppAction::Counter(3)), Some(3));
//! assert_eq!(counter.extract(AppAction::Reset), None);
//! assert_eq!(counter.embed(4), AppAction::Counter(4));
//! ```

use std::fmt;
use std::sync::Arc;

type Focus<Root, Value> = dyn Fn(&mut Root) -> Option<&mut Value> + Send + Sync;

/// Fallible mutable projection from `Root` into `Value`
pub struct StatePath<Root, Value> {
    focus: Arc<Focus<Root, Value>>,
}

impl<Root, Value> Clone for StatePath<Root, Value> {
    fn clone(&self) -> Self {
        Self {
            focus: Arc::clone(&self.focus),
        }
    }
}

impl<Root, Value> fmt::Debug for StatePath<Root, Value> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "StatePath<{}, {}>",
            std::any::type_name::<Root>(),
            std::any::type_name::<Value>()
        )
    }
}

impl<Root: 'static, Value: 'static> StatePath<Root, Value> {
    /// A path that may fail to find its value
    pub fn optional<F>(focus: F) -> Self
    where
        F: Fn(&mut Root) -> Option<&mut Value> + Send + Sync + 'static,
    {
        Self {
            focus: Arc::new(focus),
        }
    }

    /// A path that always finds its value, typically a struct field
    pub fn key<F>(focus: F) -> Self
    where
        F: Fn(&mut Root) -> &mut Value + Send + Sync + 'static,
    {
        Self::optional(move |root| Some(focus(root)))
    }

    /// Borrow the focused value
    pub fn focus<'a>(&self, root: &'a mut Root) -> Option<&'a mut Value> {
        (self.focus)(root)
    }

    /// Read a copy of the focused value
    pub fn get(&self, root: &Root) -> Option<Value>
    where
        Root: Clone,
        Value: Clone,
    {
        let mut scratch = root.clone();
        self.focus(&mut scratch).cloned()
    }

    /// Apply `update` to the focused value if present
    pub fn modify<R>(&self, root: &mut Root, update: impl FnOnce(&mut Value) -> R) -> Option<R> {
        self.focus(root).map(update)
    }

    /// Continue the path into a child of `Value`
    #[must_use]
    pub fn appending<Child: 'static>(&self, next: StatePath<Value, Child>) -> StatePath<Root, Child> {
        let outer = Arc::clone(&self.focus);
        let inner = next.focus;
        StatePath::optional(move |root: &mut Root| match outer(root) {
            Some(value) => inner(value),
            None => None,
        })
    }
}

impl<Value: 'static> StatePath<Option<Value>, Value> {
    /// Path into the contents of an `Option`
    #[must_use]
    pub fn some() -> Self {
        Self::optional(Option::as_mut)
    }
}

/// Embedding of a child action into a parent action, with extraction back
pub struct ActionPath<Root, Value> {
    embed: Arc<dyn Fn(Value) -> Root + Send + Sync>,
    extract: Arc<dyn Fn(Root) -> Option<Value> + Send + Sync>,
}

impl<Root, Value> Clone for ActionPath<Root, Value> {
    fn clone(&self) -> Self {
        Self {
            embed: Arc::clone(&self.embed),
            extract: Arc::clone(&self.extract),
        }
    }
}

impl<Root, Value> fmt::Debug for ActionPath<Root, Value> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ActionPath<{}, {}>",
            std::any::type_name::<Root>(),
            std::any::type_name::<Value>()
        )
    }
}

impl<Root: 'static, Value: 'static> ActionPath<Root, Value> {
    /// Build a path from its two directions
    pub fn new<E, X>(embed: E, extract: X) -> Self
    where
        E: Fn(Value) -> Root + Send + Sync + 'static,
        X: Fn(Root) -> Option<Value> + Send + Sync + 'static,
    {
        Self {
            embed: Arc::new(embed),
            extract: Arc::new(extract),
        }
    }

    /// Wrap a child action
    pub fn embed(&self, value: Value) -> Root {
        (self.embed)(value)
    }

    /// Unwrap a child action, or `None` for any other action
    pub fn extract(&self, root: Root) -> Option<Value> {
        (self.extract)(root)
    }

    /// Continue the path into a nested action
    #[must_use]
    pub fn appending<Child: 'static>(&self, next: ActionPath<Value, Child>) -> ActionPath<Root, Child> {
        let (outer_embed, outer_extract) = (Arc::clone(&self.embed), Arc::clone(&self.extract));
        let (inner_embed, inner_extract) = (next.embed, next.extract);
        ActionPath::new(
            move |child| outer_embed(inner_embed(child)),
            move |root| outer_extract(root).and_then(|value| inner_extract(value)),
        )
    }
}

impl<Value: 'static> ActionPath<Value, Value> {
    /// The path that embeds and extracts everything unchanged
    #[must_use]
    pub fn identity() -> Self {
        Self::new(|value| value, Some)
    }
}

/// Build an [`ActionPath`] for a single-field tuple variant
///
/// ```
/// use composable_store_core::case_path;
///
/// #[derive(Debug, PartialEq)]
/// enum Action { Child(u8), Other }
///
/// let path = case_path!(Action::Child);
/// assert_eq!(path.extract(Action::Child(1)), Some(1));
/// assert_eq!(path.extract(Action::Other), None);
/// ```
#[macro_export]
macro_rules! case_path {
    ($($segment:ident)::+) => {
        $crate::paths::ActionPath::new($($segment)::+, |root| match root {
            $($segment)::+(value) => ::core::option::Option::Some(value),
            #[allow(unreachable_patterns)]
            _ => ::core::option::Option::None,
        })
    };
}
