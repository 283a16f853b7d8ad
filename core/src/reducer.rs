//! The Reducer trait and its extension methods
//!
//! Reducers are functions `(State, Action, Environment) → Effect<Action>`:
//! they mutate state in place and describe follow-up work as an effect.
//! Composition lives in [`crate::composition`]; [`ReducerExt`] exposes it as
//! methods.
//!
//! # Example
//!
//! ```
//! use composable_store_core::effect::Effect;
//! use composable_store_core::reducer::{from_fn, Reducer};
//!
//! let counter = from_fn(|count: &mut i32, delta: i32, _env: &()| {
//!     *count += delta;
//!     Effect::none()
//! });
//!
//! let mut count = 0;
//! let _ = counter.reduce(&mut count, 3, &());
//! assert_eq!(count, 3);
//! ```

use crate::composition::{Combined, ForEachReducer, OptionalReducer, Pullback};
use crate::debug::DebugReducer;
use crate::effect::Effect;
use crate::identified::{Identifiable, IdentifiedCollection};
use crate::paths::{ActionPath, StatePath};
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

/// The Reducer trait - core abstraction for feature logic
///
/// # Type Parameters
///
/// - `State`: The state this reducer mutates
/// - `Action`: The actions it handles and its effects produce
/// - `Environment`: Read-only dependencies
///
/// # Example
///
/// ```
/// use composable_store_core::effect::Effect;
/// use composable_store_core::reducer::Reducer;
///
/// #[derive(Debug, Clone)]
/// enum TimerAction { Start, Tick }
///
/// struct TimerReducer;
///
/// impl Reducer for TimerReducer {
///     type State = u32;
///     type Action = TimerAction;
///     type Environment = ();
///
///     fn reduce(&self, ticks: &mut u32, action: TimerAction, _env: &()) -> Effect<TimerAction> {
///         match action {
///             TimerAction::Start => Effect::just(TimerAction::Tick),
///             TimerAction::Tick => {
///                 *ticks += 1;
///                 Effect::none()
///             },
///         }
///     }
/// }
/// ```
pub trait Reducer {
    /// The state type this reducer operates on
    type State;

    /// The action type this reducer processes
    type Action;

    /// The environment type with injected dependencies
    type Environment;

    /// Reduce an action into state changes and an effect
    ///
    /// Runs synchronously. Asynchronous follow-up work belongs in the
    /// returned effect, never in the body.
    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> Effect<Self::Action>;
}

impl<R: Reducer + ?Sized> Reducer for Box<R> {
    type State = R::State;
    type Action = R::Action;
    type Environment = R::Environment;

    fn reduce(&self, state: &mut R::State, action: R::Action, env: &R::Environment) -> Effect<R::Action> {
        (**self).reduce(state, action, env)
    }
}

impl<R: Reducer + ?Sized> Reducer for Arc<R> {
    type State = R::State;
    type Action = R::Action;
    type Environment = R::Environment;

    fn reduce(&self, state: &mut R::State, action: R::Action, env: &R::Environment) -> Effect<R::Action> {
        (**self).reduce(state, action, env)
    }
}

/// A reducer backed by a closure
///
/// Created by [`from_fn`].
pub struct FnReducer<S, A, E, F> {
    reduce: F,
    _phantom: PhantomData<fn(&mut S, A, &E)>,
}

/// Build a reducer from a closure
pub const fn from_fn<S, A, E, F>(reduce: F) -> FnReducer<S, A, E, F>
where
    F: Fn(&mut S, A, &E) -> Effect<A>,
{
    FnReducer {
        reduce,
        _phantom: PhantomData,
    }
}

impl<S, A, E, F> Reducer for FnReducer<S, A, E, F>
where
    F: Fn(&mut S, A, &E) -> Effect<A>,
{
    type State = S;
    type Action = A;
    type Environment = E;

    fn reduce(&self, state: &mut S, action: A, env: &E) -> Effect<A> {
        (self.reduce)(state, action, env)
    }
}

impl<S, A, E, F> fmt::Debug for FnReducer<S, A, E, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FnReducer")
    }
}

/// Composition methods available on every reducer
pub trait ReducerExt: Reducer + Sized {
    /// Run `self`, then `other`, against the same state and merge their effects
    fn combined<R>(self, other: R) -> Combined<Self, R>
    where
        R: Reducer<State = Self::State, Action = Self::Action, Environment = Self::Environment>,
    {
        Combined::new(self, other)
    }

    /// Lift this reducer into a parent domain
    ///
    /// Actions the path cannot extract, and states the path cannot focus,
    /// short-circuit to [`Effect::none`]. Effects are mapped back through
    /// `action.embed`.
    fn pullback<GS, GA, GE, F>(
        self,
        state: StatePath<GS, Self::State>,
        action: ActionPath<GA, Self::Action>,
        to_local_env: F,
    ) -> Pullback<Self, GS, GA, GE, F>
    where
        F: Fn(&GE) -> &Self::Environment,
    {
        Pullback::new(self, state, action, to_local_env)
    }

    /// Lift this reducer over optional state; `None` does nothing
    fn optional(self) -> OptionalReducer<Self> {
        OptionalReducer::new(self)
    }

    /// Run this reducer on one element of an identified collection
    ///
    /// The parent action carries the element id. A missing id is a silent
    /// no-op.
    fn for_each<GS, GA, GE, C, F>(
        self,
        state: StatePath<GS, C>,
        action: ActionPath<GA, (<Self::State as Identifiable>::Id, Self::Action)>,
        to_local_env: F,
    ) -> ForEachReducer<Self, GS, GA, GE, C, F>
    where
        Self::State: Identifiable,
        C: IdentifiedCollection<Element = Self::State>,
        F: Fn(&GE) -> &Self::Environment,
    {
        ForEachReducer::new(self, state, action, to_local_env)
    }

    /// Log every action and the resulting state diff through `tracing`
    fn debug(self, prefix: impl Into<String>) -> DebugReducer<Self>
    where
        Self::State: fmt::Debug,
        Self::Action: fmt::Debug,
    {
        DebugReducer::new(self, prefix.into())
    }
}

impl<R: Reducer> ReducerExt for R {}
