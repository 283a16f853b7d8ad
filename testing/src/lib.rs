//! # Composable Store Testing
//!
//! Testing utilities and helpers for the Composable Store architecture.
//!
//! This crate provides:
//! - [`TestScheduler`]: virtual time for `delay`, `debounce` and `throttle`
//! - [`TestStore`]: exhaustive step-by-step store assertions
//! - [`ReducerTest`]: Given-When-Then reducer tests
//! - Assertion helpers for effect output
//!
//! ## Example
//!
//! ```
//! use composable_store_core::prelude::*;
//! use composable_store_testing::{TestScheduler, TestStore};
//! use std::time::Duration;
//!
//! #[derive(Debug, Clone, PartialEq)]
//! enum Action { QueryChanged(String), Search(String) }
//!
//! let scheduler = TestScheduler::new();
//! let clock = scheduler.shared();
//! let reducer = from_fn(move |query: &mut String, action: Action, _: &()| match action {
//!     Action::QueryChanged(text) => {
//!         *query = text.clone();
//!         Effect::just(Action::Search(text))
//!             .debounce("lib-doc-search", Duration::from_millis(300), clock.clone())
//!     },
//!     Action::Search(_) => Effect::none(),
//! });
//!
//! let mut store = TestStore::new(reducer, String::new(), ());
//! store.send(Action::QueryChanged("r".into()), |q| *q = "r".into());
//! store.send(Action::QueryChanged("rust".into()), |q| *q = "rust".into());
//!
//! scheduler.advance(Duration::from_millis(300));
//! store.receive(Action::Search("rust".into()), |_| {});
//! store.finish();
//! ```

pub mod assertions;
pub mod scheduler;
pub mod test_store;

// Re-export commonly used items
pub use reducer_test::ReducerTest;
pub use scheduler::TestScheduler;
pub use test_store::TestStore;

/// Test helpers and utilities
pub mod helpers {
    use tracing_subscriber::EnvFilter;

    /// Route `tracing` output to the test harness
    ///
    /// Honours `RUST_LOG`; defaults to `warn`. Safe to call from every test.
    pub fn init_test_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
            .with_test_writer()
            .try_init();
    }
}
