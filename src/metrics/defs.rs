//! Metric definition table
//!
//! Declares every metric the service exports. The catalogue is a versioned
//! contract with dashboards and alert rules: renaming a metric or changing
//! its label schema is a breaking change.

use std::fmt;

/// Label value used for the conversion kind of path identifiers
pub const CONV_TYPE_INT: &str = "int";

pub const REQUESTS_IN_FLIGHT: &str = "requests_in_flight";
pub const ENTITY_REQUESTS_IN_FLIGHT: &str = "entity_requests_in_flight";
pub const CONVERSIONS: &str = "conversions_count";
pub const CONVERSION_ERRORS: &str = "conversions_err_count";
pub const REQUEST_DURATION: &str = "request_duration_seconds";
pub const REQUESTS_TOTAL: &str = "requests_total";
pub const RECORDING_FAILURES: &str = "metrics_recording_failures_total";

/// The kind of aggregate a metric maintains
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    /// Monotonically increasing total
    Counter,
    /// Value that can go up and down
    Gauge,
    /// Bucketed distribution with sum and count
    Histogram,
}

impl MetricKind {
    /// Name used in the `# TYPE` exposition line
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricKind::Counter => "counter",
            MetricKind::Gauge => "gauge",
            MetricKind::Histogram => "histogram",
        }
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Static declaration of a single metric
///
/// Immutable once built. Bucket bounds exist only for histograms.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricSpec {
    name: String,
    help: String,
    kind: MetricKind,
    label_names: Vec<String>,
    buckets: Option<Vec<f64>>,
}

impl MetricSpec {
    fn new(
        name: &str,
        help: &str,
        kind: MetricKind,
        labels: &[&str],
        buckets: Option<Vec<f64>>,
    ) -> Self {
        Self {
            name: name.to_string(),
            help: help.to_string(),
            kind,
            label_names: labels.iter().map(|l| l.to_string()).collect(),
            buckets,
        }
    }

    /// Declare a counter
    pub fn counter(name: &str, help: &str, labels: &[&str]) -> Self {
        Self::new(name, help, MetricKind::Counter, labels, None)
    }

    /// Declare a gauge
    pub fn gauge(name: &str, help: &str, labels: &[&str]) -> Self {
        Self::new(name, help, MetricKind::Gauge, labels, None)
    }

    /// Declare a histogram with explicit upper bounds (the `+Inf` bucket is implicit)
    pub fn histogram(name: &str, help: &str, labels: &[&str], buckets: Vec<f64>) -> Self {
        Self::new(name, help, MetricKind::Histogram, labels, Some(buckets))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn help(&self) -> &str {
        &self.help
    }

    pub fn kind(&self) -> MetricKind {
        self.kind
    }

    /// Ordered label schema
    pub fn label_names(&self) -> &[String] {
        &self.label_names
    }

    /// Bucket upper bounds, `None` unless this is a histogram
    pub fn buckets(&self) -> Option<&[f64]> {
        self.buckets.as_deref()
    }
}

/// Prefix a catalogue suffix with the configured namespace
pub fn full_name(namespace: &str, suffix: &str) -> String {
    format!("{}_{}", namespace, suffix)
}

/// Build the full catalogue for a namespace
///
/// Cardinality: the entity label is bounded by the routes the service
/// mounts, `method` by the standard HTTP methods plus `other`, `outcome` by
/// the request outcomes, `result` by the configured label policy.
pub fn catalogue(namespace: &str, duration_buckets: &[f64]) -> Vec<MetricSpec> {
    vec![
        MetricSpec::gauge(
            &full_name(namespace, REQUESTS_IN_FLIGHT),
            "Number of requests currently being processed",
            &[],
        ),
        MetricSpec::gauge(
            &full_name(namespace, ENTITY_REQUESTS_IN_FLIGHT),
            "Number of requests currently being processed, by entity",
            &["entity"],
        ),
        MetricSpec::counter(
            &full_name(namespace, CONVERSIONS),
            "id URL param conversions count",
            &["conv_type", "entity", "result"],
        ),
        MetricSpec::counter(
            &full_name(namespace, CONVERSION_ERRORS),
            "id URL param conversions err count",
            &["conv_type", "entity", "result"],
        ),
        MetricSpec::histogram(
            &full_name(namespace, REQUEST_DURATION),
            "Request duration in seconds, by method and entity",
            &["method", "entity"],
            duration_buckets.to_vec(),
        ),
        MetricSpec::counter(
            &full_name(namespace, REQUESTS_TOTAL),
            "Total number of completed requests by method, entity, status code and outcome",
            &["method", "entity", "code", "outcome"],
        ),
        MetricSpec::counter(
            &full_name(namespace, RECORDING_FAILURES),
            "Total number of metric recording failures by operation. \
            Any increment indicates a registration or label schema bug.",
            &["operation"],
        ),
    ]
}
