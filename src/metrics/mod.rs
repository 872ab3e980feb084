//! Prometheus metrics for the lookup service
//!
//! This module provides metrics instrumentation for tracking:
//! - Requests currently in flight, globally and per entity
//! - Path identifier conversions and their outcome
//! - Request duration by method and entity
//!
//! Metrics are exposed via the `/metrics` endpoint in Prometheus text format.
//! The `Metrics` facade is what handlers and middleware talk to; it owns the
//! registry and applies the recording failure policy so that a metrics bug
//! never fails a request.

pub mod labels;
pub mod registry;
pub mod defs;

pub use labels::LabelSet;
pub use registry::{
    CounterHandle, GaugeHandle, HistogramHandle, HistogramSnapshot, MetricHandle, Registry,
    RegistryError, SeriesSnapshot, SeriesValue, Snapshot,
};
pub use defs::{MetricKind, MetricSpec};

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::config::MetricsConfig;

/// What the `result` label of the conversion success counter carries
///
/// `Outcome` keeps cardinality bounded (`"ok"`). `RawId` writes the parsed
/// identifier itself, one series per distinct id; only enable it when a
/// dashboard needs the per-id breakdown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LabelPolicy {
    #[default]
    Outcome,
    RawId,
}

/// How recording errors (unknown metric, label schema, kind mismatch) are surfaced
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Log a warning, count the failure and carry on
    #[default]
    Warn,
    /// Panic at the call site (development builds and tests)
    Panic,
}

/// Outcome tag of an identifier conversion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversionResult {
    Ok,
    Err,
}

impl ConversionResult {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConversionResult::Ok => "ok",
            ConversionResult::Err => "err",
        }
    }
}

/// Metrics collector for the lookup service
#[derive(Clone)]
pub struct Metrics {
    registry: Arc<Registry>,
    namespace: String,
    label_policy: LabelPolicy,
    failure_policy: FailurePolicy,
    in_flight: GaugeHandle,
    entity_in_flight: GaugeHandle,
    conversions: CounterHandle,
    conversion_errors: CounterHandle,
    request_duration: HistogramHandle,
    requests_total: CounterHandle,
    recording_failures: CounterHandle,
}

impl Metrics {
    /// Register the full catalogue in a fresh registry
    ///
    /// # Errors
    ///
    /// Returns an error if registration fails (duplicate names, invalid
    /// namespace, unsorted buckets). This is a startup-time failure.
    pub fn new(settings: &MetricsConfig) -> Result<Self, RegistryError> {
        let namespace = settings.namespace.as_str();
        let mut registry = Registry::new();

        for metric in defs::catalogue(namespace, settings.duration_buckets()) {
            registry.register(metric)?;
        }

        let handle = |suffix: &str| -> Result<MetricHandle, RegistryError> {
            let name = defs::full_name(namespace, suffix);
            registry
                .get(&name)
                .cloned()
                .ok_or(RegistryError::UnknownMetric { name })
        };

        let in_flight = handle(defs::REQUESTS_IN_FLIGHT)?.into_gauge()?;
        let entity_in_flight = handle(defs::ENTITY_REQUESTS_IN_FLIGHT)?.into_gauge()?;
        let conversions = handle(defs::CONVERSIONS)?.into_counter()?;
        let conversion_errors = handle(defs::CONVERSION_ERRORS)?.into_counter()?;
        let request_duration = handle(defs::REQUEST_DURATION)?.into_histogram()?;
        let requests_total = handle(defs::REQUESTS_TOTAL)?.into_counter()?;
        let recording_failures = handle(defs::RECORDING_FAILURES)?.into_counter()?;

        tracing::info!(
            namespace,
            metric_count = registry.len(),
            label_policy = ?settings.label_policy,
            failure_policy = ?settings.failure_policy,
            "Metrics registry initialized"
        );

        Ok(Self {
            registry: Arc::new(registry),
            namespace: namespace.to_string(),
            label_policy: settings.label_policy,
            failure_policy: settings.failure_policy,
            in_flight,
            entity_in_flight,
            conversions,
            conversion_errors,
            request_duration,
            requests_total,
            recording_failures,
        })
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn label_policy(&self) -> LabelPolicy {
        self.label_policy
    }

    /// Fully qualified name of a catalogue metric (see `defs` constants)
    pub fn name(&self, suffix: &str) -> String {
        defs::full_name(&self.namespace, suffix)
    }

    /// Increment the global and per-entity in-flight gauges
    pub fn request_started(&self, entity: &str) {
        self.record("request_started", self.in_flight.inc(&LabelSet::new()));
        self.record(
            "request_started",
            self.entity_in_flight
                .inc(&LabelSet::new().with("entity", entity)),
        );
    }

    /// Close out a request started with `request_started`
    ///
    /// Observes the elapsed duration, decrements both in-flight gauges and,
    /// when a response was produced, counts it by status code and outcome.
    pub fn request_finished(
        &self,
        method: &str,
        entity: &str,
        elapsed: Duration,
        response: Option<(u16, &str)>,
    ) {
        self.record(
            "request_finished",
            self.request_duration.observe(
                &LabelSet::new()
                    .with("method", method)
                    .with("entity", entity),
                elapsed.as_secs_f64(),
            ),
        );
        self.record("request_finished", self.in_flight.dec(&LabelSet::new()));
        self.record(
            "request_finished",
            self.entity_in_flight
                .dec(&LabelSet::new().with("entity", entity)),
        );

        if let Some((code, outcome)) = response {
            self.record(
                "request_finished",
                self.requests_total.inc(
                    &LabelSet::new()
                        .with("method", method)
                        .with("entity", entity)
                        .with("code", code.to_string())
                        .with("outcome", outcome),
                ),
            );
        }
    }

    /// Count a successful identifier conversion
    ///
    /// The `result` label follows the configured `LabelPolicy`.
    pub fn conversion_succeeded(&self, conv_type: &str, entity: &str, raw_id: &str) {
        let result = match self.label_policy {
            LabelPolicy::Outcome => ConversionResult::Ok.as_str(),
            LabelPolicy::RawId => raw_id,
        };
        self.record(
            "conversion_succeeded",
            self.conversions.inc(&conversion_labels(conv_type, entity, result)),
        );
    }

    /// Count a failed identifier conversion
    pub fn conversion_failed(&self, conv_type: &str, entity: &str) {
        self.record(
            "conversion_failed",
            self.conversion_errors.inc(&conversion_labels(
                conv_type,
                entity,
                ConversionResult::Err.as_str(),
            )),
        );
    }

    /// Total number of recording failures since startup, across operations
    pub fn recording_failures_count(&self) -> u64 {
        let name = self.recording_failures.spec().name();
        self.registry
            .snapshot()
            .iter()
            .filter(|series| series.spec().name() == name)
            .filter_map(|series| series.value().as_f64())
            .sum::<f64>() as u64
    }

    /// Gather all metrics and encode them in Prometheus text format
    pub fn gather(&self) -> Result<String, RegistryError> {
        self.registry.gather()
    }

    pub(crate) fn record(&self, operation: &'static str, result: Result<(), RegistryError>) {
        let Err(error) = result else {
            return;
        };

        // A second panic while unwinding (drop guards) would abort the process
        match self.failure_policy {
            FailurePolicy::Panic if !std::thread::panicking() => {
                panic!("metric recording failed in {}: {}", operation, error);
            }
            FailurePolicy::Panic | FailurePolicy::Warn => {
                tracing::warn!(
                    operation,
                    error = %error,
                    "Failed to record metric; request processing continues"
                );
                if let Err(e) = self
                    .recording_failures
                    .inc(&LabelSet::new().with("operation", operation))
                {
                    tracing::error!(
                        operation,
                        error = %e,
                        "Failed to count metric recording failure"
                    );
                }
            }
        }
    }
}

fn conversion_labels(conv_type: &str, entity: &str, result: &str) -> LabelSet {
    LabelSet::new()
        .with("conv_type", conv_type)
        .with("entity", entity)
        .with("result", result)
}
