//! Prometheus metrics for observability and monitoring.
//!
//! Stores and effect operators record through the `metrics` facade whether
//! or not a recorder is installed. [`MetricsExporter`] installs a Prometheus
//! recorder and renders the collected values:
//! - Actions processed and reducer latency
//! - Effects in flight
//! - Effects cancelled through the cancellation registry
//! - Protocol violations
//!
//! # Example
//!
//! ```rust,no_run
//! use composable_store_runtime::metrics::MetricsExporter;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut exporter = MetricsExporter::new();
//! exporter.install()?;
//!
//! // ... run stores ...
//!
//! if let Some(text) = exporter.render() {
//!     println!("{text}");
//! }
//! # Ok(())
//! # }
//! ```

use metrics::{describe_counter, describe_gauge, describe_histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::time::Duration;
use thiserror::Error;

// Re-export metrics macros for use in other modules
pub use metrics::{counter, gauge, histogram};

/// Errors from metrics operations.
#[derive(Error, Debug)]
pub enum MetricsError {
    /// Failed to build metrics exporter
    #[error("Failed to build metrics exporter: {0}")]
    Build(String),
    /// Failed to install metrics exporter
    #[error("Failed to install metrics exporter: {0}")]
    Install(String),
}

/// Prometheus recorder installer.
#[derive(Default)]
pub struct MetricsExporter {
    handle: Option<PrometheusHandle>,
}

impl MetricsExporter {
    /// Create an exporter that has not been installed yet.
    #[must_use]
    pub const fn new() -> Self {
        Self { handle: None }
    }

    /// Describe the store metrics and install the Prometheus recorder.
    ///
    /// # Errors
    ///
    /// Returns error if the exporter cannot be built or installed.
    ///
    /// # Note
    ///
    /// Only one recorder can be installed per process. If one already is
    /// (e.g., in tests), this succeeds without a handle and
    /// [`render`](Self::render) returns `None`.
    pub fn install(&mut self) -> Result<(), MetricsError> {
        register_metrics();

        let builder = PrometheusBuilder::new()
            .set_buckets_for_metric(
                Matcher::Suffix("duration_seconds".to_string()),
                &[
                    0.000_01, 0.000_05, 0.000_1, 0.000_5, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0,
                ],
            )
            .map_err(|e| MetricsError::Build(e.to_string()))?;

        match builder.install_recorder() {
            Ok(handle) => {
                self.handle = Some(handle);
                tracing::info!("Prometheus metrics recorder installed");
                Ok(())
            },
            Err(e) => {
                let err_msg = e.to_string();
                if err_msg.contains("already") {
                    tracing::warn!("Metrics recorder already initialized, skipping re-initialization");
                    Ok(())
                } else {
                    Err(MetricsError::Install(err_msg))
                }
            },
        }
    }

    /// Get the metrics handle for rendering.
    #[must_use]
    pub const fn handle(&self) -> Option<&PrometheusHandle> {
        self.handle.as_ref()
    }

    /// Render current metrics in Prometheus format.
    ///
    /// Returns `None` if this exporter did not install the recorder.
    #[must_use]
    pub fn render(&self) -> Option<String> {
        self.handle.as_ref().map(PrometheusHandle::render)
    }
}

/// Register all metric descriptions.
fn register_metrics() {
    describe_counter!("store.actions.total", "Total number of actions reduced by stores");
    describe_histogram!(
        "store.reducer.duration_seconds",
        "Time taken by a single reducer invocation"
    );
    describe_gauge!(
        "store.effects.in_flight",
        "Effect subscriptions currently held by stores"
    );
    describe_counter!(
        "store.violations.total",
        "Protocol violations detected (re-entrant or concurrent send)"
    );
    describe_counter!(
        "effects.cancelled.total",
        "Effect subscriptions disposed through the cancellation registry"
    );
}

/// Store metrics recorder.
pub struct StoreMetrics;

impl StoreMetrics {
    /// Record an action processed.
    pub fn record_action(duration: Duration) {
        counter!("store.actions.total").increment(1);
        histogram!("store.reducer.duration_seconds").record(duration.as_secs_f64());
    }

    /// Record an effect subscription retained by a store.
    pub fn record_effect_started() {
        gauge!("store.effects.in_flight").increment(1.0);
    }

    /// Record retained effect subscriptions that finished or were disposed.
    #[allow(clippy::cast_precision_loss)]
    pub fn record_effects_finished(count: usize) {
        if count > 0 {
            gauge!("store.effects.in_flight").decrement(count as f64);
        }
    }

    /// Record a protocol violation.
    pub fn record_violation() {
        counter!("store.violations.total").increment(1);
    }
}
