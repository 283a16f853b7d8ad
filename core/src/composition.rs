//! Reducer composition utilities
//!
//! This module provides utilities for composing reducers in various ways:
//! - **`combine_reducers`** / **`Combined`**: Run several reducers on the same state and action
//! - **`scope_reducer`**: Focus a reducer on a field of a larger state
//! - **`Pullback`**: Embed a child domain (state path + action path) into a parent
//! - **`OptionalReducer`**: Run a reducer only while its state exists
//! - **`ForEachReducer`**: Run a reducer on one element of an identified collection
//!
//! # Examples
//!
//! ## Combining Reducers
//!
//! ```
//! use composable_store_core::composition::combine_reducers;
//! use composable_store_core::effect::Effect;
//! use composable_store_core::reducer::{from_fn, Reducer};
//!
//! #[derive(Clone, Debug)]
//! enum Action { Increment }
//!
//! let counter = from_fn(|state: &mut (i32, u32), _: Action, _: &()| {
//!     state.0 += 1;
//!     Effect::none()
//! });
//! let audit = from_fn(|state: &mut (i32, u32), _: Action, _: &()| {
//!     state.1 += 1;
//!     Effect::none()
//! });
//!
//! let combined = combine_reducers(vec![Box::new(counter), Box::new(audit)]);
//! let mut state = (0, 0);
//! let _ = combined.reduce(&mut state, Action::Increment, &());
//! assert_eq!(state, (1, 1));
//! ```

use crate::effect::Effect;
use crate::identified::{Identifiable, IdentifiedCollection};
use crate::paths::{ActionPath, StatePath};
use crate::reducer::Reducer;
use smallvec::SmallVec;
use std::marker::PhantomData;

/// Boxed reducer accepted by [`combine_reducers`]
pub type BoxedReducer<S, A, E> = Box<dyn Reducer<State = S, Action = A, Environment = E> + Send + Sync>;

/// Combines multiple reducers that operate on the same state and action types.
///
/// Each reducer runs in order against the same state; none of them sees the
/// others' effects. The effects are merged into one.
#[must_use]
pub fn combine_reducers<S, A, E>(reducers: Vec<BoxedReducer<S, A, E>>) -> CombinedReducer<S, A, E>
where
    S: 'static,
    A: Clone + Send + 'static,
    E: 'static,
{
    CombinedReducer { reducers }
}

/// A combined reducer that runs multiple reducers in sequence.
///
/// Created by [`combine_reducers`].
pub struct CombinedReducer<S, A, E>
where
    S: 'static,
    A: Clone + Send + 'static,
    E: 'static,
{
    reducers: Vec<BoxedReducer<S, A, E>>,
}

impl<S, A, E> Reducer for CombinedReducer<S, A, E>
where
    S: 'static,
    A: Clone + Send + 'static,
    E: 'static,
{
    type State = S;
    type Action = A;
    type Environment = E;

    fn reduce(&self, state: &mut S, action: A, env: &E) -> Effect<A> {
        let mut effects: SmallVec<[Effect<A>; 4]> = SmallVec::new();

        for reducer in &self.reducers {
            effects.push(reducer.reduce(state, action.clone(), env));
        }

        Effect::merge(effects)
    }
}

/// Two reducers run one after the other.
///
/// Created by [`ReducerExt::combined`](crate::reducer::ReducerExt::combined).
#[derive(Debug, Clone)]
pub struct Combined<R1, R2> {
    first: R1,
    second: R2,
}

impl<R1, R2> Combined<R1, R2> {
    pub(crate) const fn new(first: R1, second: R2) -> Self {
        Self { first, second }
    }
}

impl<R1, R2> Reducer for Combined<R1, R2>
where
    R1: Reducer,
    R2: Reducer<State = R1::State, Action = R1::Action, Environment = R1::Environment>,
    R1::Action: Clone + Send + 'static,
{
    type State = R1::State;
    type Action = R1::Action;
    type Environment = R1::Environment;

    fn reduce(&self, state: &mut Self::State, action: Self::Action, env: &Self::Environment) -> Effect<Self::Action> {
        let first = self.first.reduce(state, action.clone(), env);
        let second = self.second.reduce(state, action, env);
        Effect::merge([first, second])
    }
}

/// Scopes a reducer to operate on a subset of a larger state.
///
/// The child state is copied out, reduced, and written back; actions pass
/// through unchanged. For optional children or embedded actions use
/// [`ReducerExt::pullback`](crate::reducer::ReducerExt::pullback).
///
/// # Examples
///
/// ```
/// use composable_store_core::composition::scope_reducer;
/// use composable_store_core::effect::Effect;
/// use composable_store_core::reducer::{from_fn, Reducer};
///
/// #[derive(Clone, Default)]
/// struct AppState {
///     counter: i32,
///     other_data: String,
/// }
///
/// let counter = from_fn(|count: &mut i32, delta: i32, _: &()| {
///     *count += delta;
///     Effect::none()
/// });
///
/// let scoped = scope_reducer(
///     counter,
///     |app: &AppState| &app.counter,
///     |app: &mut AppState, counter: i32| app.counter = counter,
/// );
///
/// let mut state = AppState::default();
/// let _ = scoped.reduce(&mut state, 2, &());
/// assert_eq!(state.counter, 2);
/// ```
pub fn scope_reducer<S, SubS, A, E, R>(
    reducer: R,
    get_state: fn(&S) -> &SubS,
    set_state: fn(&mut S, SubS),
) -> ScopedReducer<S, SubS, A, E, R>
where
    S: 'static,
    SubS: Clone + 'static,
    A: 'static,
    E: 'static,
    R: Reducer<State = SubS, Action = A, Environment = E>,
{
    ScopedReducer {
        reducer,
        get_state,
        set_state,
        _phantom: PhantomData,
    }
}

/// A scoped reducer that operates on a subset of state.
///
/// Created by [`scope_reducer`].
pub struct ScopedReducer<S, SubS, A, E, R>
where
    S: 'static,
    SubS: Clone + 'static,
    A: 'static,
    E: 'static,
    R: Reducer<State = SubS, Action = A, Environment = E>,
{
    reducer: R,
    get_state: fn(&S) -> &SubS,
    set_state: fn(&mut S, SubS),
    _phantom: PhantomData<fn(A, &E)>,
}

impl<S, SubS, A, E, R> Reducer for ScopedReducer<S, SubS, A, E, R>
where
    S: 'static,
    SubS: Clone + 'static,
    A: 'static,
    E: 'static,
    R: Reducer<State = SubS, Action = A, Environment = E>,
{
    type State = S;
    type Action = A;
    type Environment = E;

    fn reduce(&self, state: &mut S, action: A, env: &E) -> Effect<A> {
        let mut sub_state = (self.get_state)(state).clone();
        let effect = self.reducer.reduce(&mut sub_state, action, env);
        (self.set_state)(state, sub_state);
        effect
    }
}

/// A child reducer embedded into a parent domain.
///
/// Created by [`ReducerExt::pullback`](crate::reducer::ReducerExt::pullback).
pub struct Pullback<R: Reducer, GS, GA, GE, F> {
    reducer: R,
    state: StatePath<GS, R::State>,
    action: ActionPath<GA, R::Action>,
    to_local_env: F,
    _phantom: PhantomData<fn(&GE)>,
}

impl<R: Reducer, GS, GA, GE, F> Pullback<R, GS, GA, GE, F> {
    pub(crate) fn new(
        reducer: R,
        state: StatePath<GS, R::State>,
        action: ActionPath<GA, R::Action>,
        to_local_env: F,
    ) -> Self {
        Self {
            reducer,
            state,
            action,
            to_local_env,
            _phantom: PhantomData,
        }
    }
}

impl<R, GS, GA, GE, F> Reducer for Pullback<R, GS, GA, GE, F>
where
    R: Reducer,
    R::State: 'static,
    R::Action: Send + 'static,
    GS: 'static,
    GA: Send + 'static,
    F: Fn(&GE) -> &R::Environment,
{
    type State = GS;
    type Action = GA;
    type Environment = GE;

    fn reduce(&self, state: &mut GS, action: GA, env: &GE) -> Effect<GA> {
        let Some(local_action) = self.action.extract(action) else {
            return Effect::none();
        };
        let Some(local_state) = self.state.focus(state) else {
            return Effect::none();
        };
        let embed = self.action.clone();
        self.reducer
            .reduce(local_state, local_action, (self.to_local_env)(env))
            .map(move |local| embed.embed(local))
    }
}

/// A reducer lifted over `Option<State>`.
///
/// Created by [`ReducerExt::optional`](crate::reducer::ReducerExt::optional).
#[derive(Debug, Clone)]
pub struct OptionalReducer<R> {
    reducer: R,
}

impl<R> OptionalReducer<R> {
    pub(crate) const fn new(reducer: R) -> Self {
        Self { reducer }
    }
}

impl<R> Reducer for OptionalReducer<R>
where
    R: Reducer,
    R::Action: Send + 'static,
{
    type State = Option<R::State>;
    type Action = R::Action;
    type Environment = R::Environment;

    fn reduce(&self, state: &mut Self::State, action: R::Action, env: &R::Environment) -> Effect<R::Action> {
        match state {
            Some(state) => self.reducer.reduce(state, action, env),
            None => Effect::none(),
        }
    }
}

/// A reducer applied to the element of a collection named by the action.
///
/// Created by [`ReducerExt::for_each`](crate::reducer::ReducerExt::for_each).
pub struct ForEachReducer<R, GS, GA, GE, C, F>
where
    R: Reducer,
    R::State: Identifiable,
{
    reducer: R,
    state: StatePath<GS, C>,
    action: ActionPath<GA, (<R::State as Identifiable>::Id, R::Action)>,
    to_local_env: F,
    _phantom: PhantomData<fn(&GE)>,
}

impl<R, GS, GA, GE, C, F> ForEachReducer<R, GS, GA, GE, C, F>
where
    R: Reducer,
    R::State: Identifiable,
{
    pub(crate) fn new(
        reducer: R,
        state: StatePath<GS, C>,
        action: ActionPath<GA, (<R::State as Identifiable>::Id, R::Action)>,
        to_local_env: F,
    ) -> Self {
        Self {
            reducer,
            state,
            action,
            to_local_env,
            _phantom: PhantomData,
        }
    }
}

impl<R, GS, GA, GE, C, F> Reducer for ForEachReducer<R, GS, GA, GE, C, F>
where
    R: Reducer,
    R::State: Identifiable + 'static,
    R::Action: Send + 'static,
    GS: 'static,
    GA: Send + 'static,
    C: IdentifiedCollection<Element = R::State> + 'static,
    F: Fn(&GE) -> &R::Environment,
{
    type State = GS;
    type Action = GA;
    type Environment = GE;

    fn reduce(&self, state: &mut GS, action: GA, env: &GE) -> Effect<GA> {
        let Some((id, local_action)) = self.action.extract(action) else {
            return Effect::none();
        };
        let Some(element) = self
            .state
            .focus(state)
            .and_then(|collection| collection.element_mut(&id))
        else {
            tracing::debug!(?id, "no element for id, action ignored");
            return Effect::none();
        };
        let embed = self.action.clone();
        self.reducer
            .reduce(element, local_action, (self.to_local_env)(env))
            .map(move |local| embed.embed((id.clone(), local)))
    }
}
