//! # Composable Store Runtime
//!
//! Runtime implementation for the Composable Store architecture.
//!
//! This crate provides the [`Store`](store::Store) that owns state, drives a
//! reducer, and feeds effect output back into itself, plus the
//! [`ViewStore`](view_store::ViewStore) observation facade.
//!
//! ## Core Components
//!
//! - **Store**: Serialised action processing, effect subscription, scoping
//! - **`ViewStore`**: Deduplicated state observation and action sending
//! - **Diagnostics**: Protocol-violation reporting and metrics
//!
//! ## Example
//!
//! ```
//! use composable_store_core::prelude::*;
//! use composable_store_runtime::Store;
//!
//! let counter = from_fn(|count: &mut i32, _: (), _: &()| {
//!     *count += 1;
//!     Effect::none()
//! });
//!
//! let store = Store::new(0, counter, ());
//! for _ in 0..5 {
//!     store.send(());
//! }
//! assert_eq!(store.state(|count| *count), 5);
//! ```

mod relay;

/// Prometheus metrics for observability
pub mod metrics;

/// The Store and its scoping operations
pub mod store;

/// Deduplicated observation facade over a Store
pub mod view_store;

pub use error::{ProtocolViolation, ViolationPolicy};
pub use store::Store;
pub use view_store::ViewStore;

/// Error types for the Store runtime
pub mod error {
    use thiserror::Error;

    /// Misuse of a store that would corrupt action ordering
    ///
    /// These are programmer errors. They are never returned to callers; they
    /// are reported according to the store's [`ViolationPolicy`].
    #[derive(Error, Debug, Clone, PartialEq, Eq)]
    pub enum ProtocolViolation {
        /// `send` was called while the store was running its reducer
        ///
        /// Usually an effect was run directly inside the reducer, or a state
        /// observer sent an action synchronously. Return effects instead.
        #[error("store `{store}` received {action} while reducing; return an effect instead of sending from the reducer")]
        ReentrantSend {
            /// Store label
            store: String,
            /// Debug rendering of the action
            action: String,
        },

        /// `send` was called from another thread while the store was reducing
        ///
        /// Stores expect every `send` to come from one logical thread.
        #[error("store `{store}` received {action} while another thread was reducing; send from a single thread")]
        ConcurrentSend {
            /// Store label
            store: String,
            /// Debug rendering of the action
            action: String,
        },
    }

    /// What a store does after detecting a [`ProtocolViolation`]
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum ViolationPolicy {
        /// Log, then panic (default in debug builds)
        Panic,
        /// Log and continue; the offending action is processed later
        Log,
    }

    impl Default for ViolationPolicy {
        fn default() -> Self {
            if cfg!(debug_assertions) {
                Self::Panic
            } else {
                Self::Log
            }
        }
    }

    impl ViolationPolicy {
        /// Report a violation: always logs and counts it, panics under [`ViolationPolicy::Panic`]
        ///
        /// # Panics
        ///
        /// Panics when the policy is [`ViolationPolicy::Panic`].
        #[allow(clippy::panic)]
        pub fn report(self, violation: &ProtocolViolation) {
            tracing::error!(%violation, "store protocol violation");
            crate::metrics::StoreMetrics::record_violation();
            if self == Self::Panic {
                panic!("{violation}");
            }
        }
    }
}

/// Configuration for Store instances
///
/// # Example
///
/// ```
/// use composable_store_runtime::{StoreConfig, ViolationPolicy};
///
/// let config = StoreConfig::default()
///     .with_label("app")
///     .with_violation_policy(ViolationPolicy::Log);
/// assert_eq!(config.label, "app");
/// ```
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Name used in logs and violation reports
    pub label: String,
    /// Reaction to protocol violations
    pub violation_policy: ViolationPolicy,
}

impl StoreConfig {
    /// Create a new configuration with custom values
    #[must_use]
    pub fn new(label: impl Into<String>, violation_policy: ViolationPolicy) -> Self {
        Self {
            label: label.into(),
            violation_policy,
        }
    }

    /// Set the label
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Set the violation policy
    #[must_use]
    pub const fn with_violation_policy(mut self, policy: ViolationPolicy) -> Self {
        self.violation_policy = policy;
        self
    }

    /// Configuration for a store scoped from one using `self`
    #[must_use]
    pub(crate) fn child(&self, suffix: &str) -> Self {
        Self {
            label: format!("{}.{suffix}", self.label),
            violation_policy: self.violation_policy,
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            label: "store".to_string(),
            violation_policy: ViolationPolicy::default(),
        }
    }
}
