//! # Composable Store Core
//!
//! Core traits and types for the Composable Store architecture.
//!
//! This crate provides the building blocks of a unidirectional state
//! container: reducers that mutate state in place, effects that feed actions
//! back into the store, identity-based cancellation, and the paths used to
//! embed child domains into parents. The store itself lives in
//! `composable-store-runtime`.
//!
//! ## Core Concepts
//!
//! - **State**: Value owned by exactly one store
//! - **Action**: Every input to a reducer (user events and effect results)
//! - **Reducer**: `(State, Action, Environment) → Effect<Action>`
//! - **Effect**: Cold, cancellable producer of actions
//! - **Environment**: Read-only dependencies passed to every reduction
//!
//! ## Example
//!
//! ```
//! use composable_store_core::prelude::*;
//! use std::time::Duration;
//!
//! #[derive(Clone, Debug, Default)]
//! struct SearchState {
//!     query: String,
//!     results: Vec<String>,
//! }
//!
//! #[derive(Clone, Debug)]
//! enum SearchAction {
//!     QueryChanged(String),
//!     Results(Vec<String>),
//! }
//!
//! struct SearchEnvironment {
//!     scheduler: std::sync::Arc<dyn Scheduler>,
//! }
//!
//! struct SearchReducer;
//!
//! impl Reducer for SearchReducer {
//!     type State = SearchState;
//!     type Action = SearchAction;
//!     type Environment = SearchEnvironment;
//!
//!     fn reduce(
//!         &self,
//!         state: &mut SearchState,
//!         action: SearchAction,
//!         env: &SearchEnvironment,
//!     ) -> Effect<SearchAction> {
//!         match action {
//!             SearchAction::QueryChanged(query) => {
//!                 state.query = query.clone();
//!                 Effect::just(SearchAction::Results(vec![query]))
//!                     .debounce("search", Duration::from_millis(300), env.scheduler.clone())
//!             },
//!             SearchAction::Results(results) => {
//!                 state.results = results;
//!                 Effect::none()
//!             },
//!         }
//!     }
//! }
//! ```

pub mod cancellation;
pub mod composition;
pub mod debug;
pub mod disposable;
pub mod effect;
pub mod effect_macros;
pub mod identified;
pub mod never_equal;
pub mod paths;
pub mod reducer;
pub mod scheduler;
pub mod timing;

// Re-export commonly used types
pub use cancellation::{CancellationRegistry, EffectId};
pub use disposable::{CompositeDisposable, Disposable, DisposeBag, SerialDisposable};
pub use effect::{Effect, PassthroughSubject, Subscriber};
pub use identified::{Identifiable, IdentifiedArray, IdentifiedCollection};
pub use never_equal::NeverEqual;
pub use paths::{ActionPath, StatePath};
pub use reducer::{Reducer, ReducerExt, from_fn};
pub use scheduler::{ImmediateScheduler, Scheduler, TokioScheduler};
pub use serde::{Deserialize, Serialize};
pub use smallvec::{SmallVec, smallvec};

/// Everything a feature module usually needs
pub mod prelude {
    pub use crate::cancellation::EffectId;
    pub use crate::case_path;
    pub use crate::composition::combine_reducers;
    pub use crate::disposable::Disposable;
    pub use crate::effect::Effect;
    pub use crate::identified::{Identifiable, IdentifiedArray, IdentifiedCollection};
    pub use crate::never_equal::NeverEqual;
    pub use crate::paths::{ActionPath, StatePath};
    pub use crate::reducer::{Reducer, ReducerExt, from_fn};
    pub use crate::scheduler::{Scheduler, TokioScheduler};
}
