//! Metric registry
//!
//! Owns one collector per registered `MetricSpec` and resolves label sets to
//! concrete series. Series live inside the `prometheus` vec collectors, which
//! update them atomically, so recording needs no lock here. The name → family
//! map is only written by `register`, which takes `&mut self` and therefore
//! runs before the registry is shared.

use std::collections::BTreeMap;
use std::collections::btree_map;
use std::sync::Arc;

use prometheus::core::Collector;
use prometheus::proto;
use prometheus::{CounterVec, Encoder, GaugeVec, HistogramOpts, HistogramVec, Opts, TextEncoder};
use thiserror::Error;

use super::labels::LabelSet;
use super::defs::{MetricKind, MetricSpec};

/// Errors raised by registration and recording
#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("metric '{name}' is already registered")]
    DuplicateMetric { name: String },

    #[error("metric '{name}' is not registered")]
    UnknownMetric { name: String },

    #[error(
        "labels for metric '{metric}' do not match its schema (missing: {missing:?}, unexpected: {unexpected:?})"
    )]
    LabelSchema {
        metric: String,
        missing: Vec<String>,
        unexpected: Vec<String>,
    },

    #[error("{operation} is not supported by {actual} metric '{metric}'")]
    InvalidKind {
        metric: String,
        operation: &'static str,
        actual: MetricKind,
    },

    #[error("invalid value {value} for metric '{metric}': {reason}")]
    InvalidValue {
        metric: String,
        value: f64,
        reason: &'static str,
    },

    #[error("prometheus error: {0}")]
    Prometheus(#[from] prometheus::Error),
}

/// Handle to a registered counter
#[derive(Debug, Clone)]
pub struct CounterHandle {
    spec: Arc<MetricSpec>,
    vec: CounterVec,
}

impl CounterHandle {
    pub fn spec(&self) -> &MetricSpec {
        &self.spec
    }

    /// Add one to the series selected by `labels`
    pub fn inc(&self, labels: &LabelSet) -> Result<(), RegistryError> {
        self.inc_by(labels, 1.0)
    }

    /// Add `delta` to the series selected by `labels`
    ///
    /// # Errors
    ///
    /// `InvalidValue` if `delta` is negative or not finite (counters only go
    /// up), `LabelSchema` if the labels do not match. Nothing is recorded on
    /// error.
    pub fn inc_by(&self, labels: &LabelSet, delta: f64) -> Result<(), RegistryError> {
        if !delta.is_finite() || delta < 0.0 {
            return Err(RegistryError::InvalidValue {
                metric: self.spec.name().to_string(),
                value: delta,
                reason: "counter increments must be finite and non-negative",
            });
        }
        let values = labels.values_for(&self.spec)?;
        self.vec.get_metric_with_label_values(values.as_slice())?.inc_by(delta);
        Ok(())
    }
}

/// Handle to a registered gauge
#[derive(Debug, Clone)]
pub struct GaugeHandle {
    spec: Arc<MetricSpec>,
    vec: GaugeVec,
}

impl GaugeHandle {
    pub fn spec(&self) -> &MetricSpec {
        &self.spec
    }

    pub fn inc(&self, labels: &LabelSet) -> Result<(), RegistryError> {
        self.add(labels, 1.0)
    }

    pub fn dec(&self, labels: &LabelSet) -> Result<(), RegistryError> {
        self.add(labels, -1.0)
    }

    /// Add a signed `delta` to the series selected by `labels`
    pub fn add(&self, labels: &LabelSet, delta: f64) -> Result<(), RegistryError> {
        if !delta.is_finite() {
            return Err(RegistryError::InvalidValue {
                metric: self.spec.name().to_string(),
                value: delta,
                reason: "gauge deltas must be finite",
            });
        }
        let values = labels.values_for(&self.spec)?;
        self.vec.get_metric_with_label_values(values.as_slice())?.add(delta);
        Ok(())
    }
}

/// Handle to a registered histogram
#[derive(Debug, Clone)]
pub struct HistogramHandle {
    spec: Arc<MetricSpec>,
    vec: HistogramVec,
}

impl HistogramHandle {
    pub fn spec(&self) -> &MetricSpec {
        &self.spec
    }

    /// Record one observation
    ///
    /// Every bucket whose upper bound is `>= value` is incremented, as is the
    /// implicit `+Inf` bucket, the sum and the count.
    ///
    /// # Errors
    ///
    /// NaN and infinite values are rejected: they would turn `_sum` into NaN
    /// for the rest of the process lifetime.
    pub fn observe(&self, labels: &LabelSet, value: f64) -> Result<(), RegistryError> {
        if !value.is_finite() {
            return Err(RegistryError::InvalidValue {
                metric: self.spec.name().to_string(),
                value,
                reason: "histogram observations must be finite",
            });
        }
        let values = labels.values_for(&self.spec)?;
        self.vec.get_metric_with_label_values(values.as_slice())?.observe(value);
        Ok(())
    }
}

/// A registered metric, tagged with its kind
#[derive(Debug, Clone)]
pub enum MetricHandle {
    Counter(CounterHandle),
    Gauge(GaugeHandle),
    Histogram(HistogramHandle),
}

impl MetricHandle {
    pub fn spec(&self) -> &MetricSpec {
        self.spec_arc()
    }

    pub fn kind(&self) -> MetricKind {
        self.spec().kind()
    }

    pub fn into_counter(self) -> Result<CounterHandle, RegistryError> {
        match self {
            MetricHandle::Counter(c) => Ok(c),
            other => Err(other.invalid_kind("counter access")),
        }
    }

    pub fn into_gauge(self) -> Result<GaugeHandle, RegistryError> {
        match self {
            MetricHandle::Gauge(g) => Ok(g),
            other => Err(other.invalid_kind("gauge access")),
        }
    }

    pub fn into_histogram(self) -> Result<HistogramHandle, RegistryError> {
        match self {
            MetricHandle::Histogram(h) => Ok(h),
            other => Err(other.invalid_kind("histogram access")),
        }
    }

    fn invalid_kind(&self, operation: &'static str) -> RegistryError {
        RegistryError::InvalidKind {
            metric: self.spec().name().to_string(),
            operation,
            actual: self.kind(),
        }
    }

    fn spec_arc(&self) -> &Arc<MetricSpec> {
        match self {
            MetricHandle::Counter(c) => &c.spec,
            MetricHandle::Gauge(g) => &g.spec,
            MetricHandle::Histogram(h) => &h.spec,
        }
    }

    fn collect(&self) -> Vec<proto::MetricFamily> {
        match self {
            MetricHandle::Counter(c) => c.vec.collect(),
            MetricHandle::Gauge(g) => g.vec.collect(),
            MetricHandle::Histogram(h) => h.vec.collect(),
        }
    }

    /// Read every live series of this metric
    fn read_series(&self) -> Vec<SeriesSnapshot> {
        let families = self.collect();
        let mut series = Vec::new();

        for family in &families {
            for metric in family.get_metric() {
                let labels: LabelSet = metric
                    .get_label()
                    .iter()
                    .map(|pair| (pair.name(), pair.value()))
                    .collect();

                let value = match self {
                    MetricHandle::Counter(_) => {
                        SeriesValue::Counter(metric.get_counter().value.unwrap_or(0.0))
                    }
                    MetricHandle::Gauge(_) => {
                        SeriesValue::Gauge(metric.get_gauge().value.unwrap_or(0.0))
                    }
                    MetricHandle::Histogram(_) => {
                        let histogram = metric.get_histogram();
                        let count = histogram.sample_count.unwrap_or(0);
                        let mut buckets: Vec<(f64, u64)> = histogram
                            .bucket
                            .iter()
                            .map(|b| {
                                (
                                    b.upper_bound.unwrap_or(f64::INFINITY),
                                    b.cumulative_count.unwrap_or(0),
                                )
                            })
                            .collect();
                        buckets.push((f64::INFINITY, count));

                        SeriesValue::Histogram(HistogramSnapshot {
                            buckets,
                            sum: histogram.sample_sum.unwrap_or(0.0),
                            count,
                        })
                    }
                };

                series.push(SeriesSnapshot {
                    spec: Arc::clone(self.spec_arc()),
                    labels,
                    value,
                });
            }
        }

        series
    }
}

/// Point-in-time state of a histogram series
#[derive(Debug, Clone, PartialEq)]
pub struct HistogramSnapshot {
    buckets: Vec<(f64, u64)>,
    sum: f64,
    count: u64,
}

impl HistogramSnapshot {
    /// Cumulative `(upper_bound, count)` pairs ending with `(+Inf, count)`
    pub fn buckets(&self) -> &[(f64, u64)] {
        &self.buckets
    }

    pub fn sum(&self) -> f64 {
        self.sum
    }

    pub fn count(&self) -> u64 {
        self.count
    }
}

/// Aggregated value of one series
#[derive(Debug, Clone, PartialEq)]
pub enum SeriesValue {
    Counter(f64),
    Gauge(f64),
    Histogram(HistogramSnapshot),
}

impl SeriesValue {
    /// Counter or gauge value, `None` for histograms
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            SeriesValue::Counter(v) | SeriesValue::Gauge(v) => Some(*v),
            SeriesValue::Histogram(_) => None,
        }
    }

    pub fn as_histogram(&self) -> Option<&HistogramSnapshot> {
        match self {
            SeriesValue::Histogram(h) => Some(h),
            _ => None,
        }
    }
}

/// One series as seen by a snapshot
#[derive(Debug, Clone)]
pub struct SeriesSnapshot {
    spec: Arc<MetricSpec>,
    labels: LabelSet,
    value: SeriesValue,
}

impl SeriesSnapshot {
    pub fn spec(&self) -> &MetricSpec {
        &self.spec
    }

    pub fn labels(&self) -> &LabelSet {
        &self.labels
    }

    pub fn value(&self) -> &SeriesValue {
        &self.value
    }
}

/// Lazy, restartable view over every series in a registry
///
/// Nothing is read until iteration starts; each call to `iter` starts over
/// and reads current values, one metric family at a time.
#[derive(Clone, Copy)]
pub struct Snapshot<'a> {
    registry: &'a Registry,
}

impl<'a> Snapshot<'a> {
    pub fn iter(&self) -> SnapshotIter<'a> {
        SnapshotIter {
            families: self.registry.families.values(),
            pending: Vec::new().into_iter(),
        }
    }
}

impl<'a> IntoIterator for Snapshot<'a> {
    type Item = SeriesSnapshot;
    type IntoIter = SnapshotIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a> IntoIterator for &Snapshot<'a> {
    type Item = SeriesSnapshot;
    type IntoIter = SnapshotIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator returned by `Snapshot::iter`
pub struct SnapshotIter<'a> {
    families: btree_map::Values<'a, String, MetricHandle>,
    pending: std::vec::IntoIter<SeriesSnapshot>,
}

impl Iterator for SnapshotIter<'_> {
    type Item = SeriesSnapshot;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(series) = self.pending.next() {
                return Some(series);
            }
            let family = self.families.next()?;
            self.pending = family.read_series().into_iter();
        }
    }
}

/// Registry of named, labeled metrics
pub struct Registry {
    inner: prometheus::Registry,
    families: BTreeMap<String, MetricHandle>,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    pub fn new() -> Self {
        Self {
            inner: prometheus::Registry::new(),
            families: BTreeMap::new(),
        }
    }

    /// Register a metric and return its kind-specific handle
    ///
    /// # Errors
    ///
    /// `DuplicateMetric` if the name is taken; the existing metric and its
    /// series are left untouched. `Prometheus` if the collector rejects the
    /// spec (invalid name, label name or bucket layout).
    pub fn register(&mut self, spec: MetricSpec) -> Result<MetricHandle, RegistryError> {
        if self.families.contains_key(spec.name()) {
            return Err(RegistryError::DuplicateMetric {
                name: spec.name().to_string(),
            });
        }

        let spec = Arc::new(spec);
        let label_names: Vec<&str> = spec.label_names().iter().map(String::as_str).collect();

        let handle = match spec.kind() {
            MetricKind::Counter => {
                let vec = CounterVec::new(Opts::new(spec.name(), spec.help()), &label_names)?;
                self.inner.register(Box::new(vec.clone()))?;
                MetricHandle::Counter(CounterHandle {
                    spec: Arc::clone(&spec),
                    vec,
                })
            }
            MetricKind::Gauge => {
                let vec = GaugeVec::new(Opts::new(spec.name(), spec.help()), &label_names)?;
                self.inner.register(Box::new(vec.clone()))?;
                MetricHandle::Gauge(GaugeHandle {
                    spec: Arc::clone(&spec),
                    vec,
                })
            }
            MetricKind::Histogram => {
                let buckets = spec
                    .buckets()
                    .map(<[f64]>::to_vec)
                    .unwrap_or_else(|| prometheus::DEFAULT_BUCKETS.to_vec());
                let vec = HistogramVec::new(
                    HistogramOpts::new(spec.name(), spec.help()).buckets(buckets),
                    &label_names,
                )?;
                self.inner.register(Box::new(vec.clone()))?;
                MetricHandle::Histogram(HistogramHandle {
                    spec: Arc::clone(&spec),
                    vec,
                })
            }
        };

        tracing::debug!(
            metric = %spec.name(),
            kind = %spec.kind(),
            labels = ?spec.label_names(),
            "Registered metric"
        );

        self.families
            .insert(spec.name().to_string(), handle.clone());
        Ok(handle)
    }

    pub fn get(&self, name: &str) -> Option<&MetricHandle> {
        self.families.get(name)
    }

    /// Registered metric names in sorted order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.families.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.families.len()
    }

    pub fn is_empty(&self) -> bool {
        self.families.is_empty()
    }

    fn family(&self, name: &str) -> Result<&MetricHandle, RegistryError> {
        self.families
            .get(name)
            .ok_or_else(|| RegistryError::UnknownMetric {
                name: name.to_string(),
            })
    }

    /// Add `delta` to a counter or gauge series
    pub fn increment(
        &self,
        name: &str,
        labels: &LabelSet,
        delta: f64,
    ) -> Result<(), RegistryError> {
        match self.family(name)? {
            MetricHandle::Counter(c) => c.inc_by(labels, delta),
            MetricHandle::Gauge(g) => g.add(labels, delta),
            other => Err(other.invalid_kind("increment")),
        }
    }

    /// Subtract one from a gauge series
    pub fn decrement(&self, name: &str, labels: &LabelSet) -> Result<(), RegistryError> {
        self.decrement_by(name, labels, 1.0)
    }

    /// Subtract `delta` from a gauge series
    pub fn decrement_by(
        &self,
        name: &str,
        labels: &LabelSet,
        delta: f64,
    ) -> Result<(), RegistryError> {
        match self.family(name)? {
            MetricHandle::Gauge(g) => g.add(labels, -delta),
            other => Err(other.invalid_kind("decrement")),
        }
    }

    /// Record an observation into a histogram series
    pub fn observe(
        &self,
        name: &str,
        labels: &LabelSet,
        value: f64,
    ) -> Result<(), RegistryError> {
        match self.family(name)? {
            MetricHandle::Histogram(h) => h.observe(labels, value),
            other => Err(other.invalid_kind("observe")),
        }
    }

    /// Lazy view over all series
    pub fn snapshot(&self) -> Snapshot<'_> {
        Snapshot { registry: self }
    }

    /// Current value of one series, `None` if it has never been recorded
    pub fn series_value(&self, name: &str, labels: &LabelSet) -> Option<SeriesValue> {
        self.families
            .get(name)?
            .read_series()
            .into_iter()
            .find(|series| series.labels == *labels)
            .map(|series| series.value)
    }

    /// Encode all metrics in the Prometheus text exposition format
    pub fn gather(&self) -> Result<String, RegistryError> {
        let metric_families = self.inner.gather();
        let metric_count = metric_families.len();

        tracing::debug!(
            metric_family_count = metric_count,
            "Encoding metrics to Prometheus text format"
        );

        let mut buffer = Vec::new();
        TextEncoder::new()
            .encode(&metric_families, &mut buffer)
            .map_err(|e| {
                tracing::error!(
                    error = %e,
                    metric_family_count = metric_count,
                    "Prometheus text encoder failed"
                );
                e
            })?;

        String::from_utf8(buffer).map_err(|e| {
            let valid_up_to = e.utf8_error().valid_up_to();
            tracing::error!(
                invalid_byte_index = valid_up_to,
                "Prometheus encoder produced invalid UTF-8"
            );
            RegistryError::Prometheus(prometheus::Error::Msg(format!(
                "metrics output is not valid UTF-8 at byte {}",
                valid_up_to
            )))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry_with_defaults() -> Registry {
        let mut registry = Registry::new();
        registry
            .register(MetricSpec::counter("test_events_total", "events", &["result"]))
            .expect("counter registers");
        registry
            .register(MetricSpec::gauge("test_in_flight", "in flight", &["id"]))
            .expect("gauge registers");
        registry
            .register(MetricSpec::histogram(
                "test_duration_seconds",
                "duration",
                &["method"],
                vec![0.1, 0.5, 1.0],
            ))
            .expect("histogram registers");
        registry
    }

    fn gauge_value(registry: &Registry, labels: &LabelSet) -> f64 {
        registry
            .series_value("test_in_flight", labels)
            .and_then(|v| v.as_f64())
            .unwrap_or(0.0)
    }

    #[test]
    fn test_register_returns_kind_specific_handle() {
        let mut registry = Registry::new();
        let handle = registry
            .register(MetricSpec::gauge("test_gauge", "g", &[]))
            .expect("gauge registers");

        assert_eq!(handle.kind(), MetricKind::Gauge);
        assert!(handle.clone().into_gauge().is_ok());
        assert!(matches!(
            handle.into_counter(),
            Err(RegistryError::InvalidKind { .. })
        ));
    }

    #[test]
    fn test_duplicate_registration_fails_and_keeps_series() {
        let mut registry = registry_with_defaults();
        let labels = LabelSet::new().with("result", "ok");
        registry
            .increment("test_events_total", &labels, 3.0)
            .expect("increment succeeds");

        let err = registry
            .register(MetricSpec::counter("test_events_total", "events", &["result"]))
            .expect_err("duplicate must fail");
        assert!(matches!(err, RegistryError::DuplicateMetric { ref name } if name == "test_events_total"));

        let value = registry
            .series_value("test_events_total", &labels)
            .and_then(|v| v.as_f64());
        assert_eq!(value, Some(3.0));
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn test_duplicate_name_with_different_kind_fails() {
        let mut registry = registry_with_defaults();
        let err = registry
            .register(MetricSpec::gauge("test_events_total", "gauge now", &[]))
            .expect_err("duplicate must fail");
        assert!(matches!(err, RegistryError::DuplicateMetric { .. }));
        assert_eq!(
            registry.get("test_events_total").map(|h| h.kind()),
            Some(MetricKind::Counter)
        );
    }

    #[test]
    fn test_gauge_increment_then_decrement_is_zero() {
        let registry = registry_with_defaults();
        let labels = LabelSet::new().with("id", "1");

        registry
            .increment("test_in_flight", &labels, 1.0)
            .expect("increment succeeds");
        assert_eq!(gauge_value(&registry, &labels), 1.0);

        registry
            .decrement("test_in_flight", &labels)
            .expect("decrement succeeds");
        assert_eq!(gauge_value(&registry, &labels), 0.0);

        registry
            .increment("test_in_flight", &labels, 5.0)
            .expect("increment succeeds");
        registry
            .decrement_by("test_in_flight", &labels, 2.0)
            .expect("decrement succeeds");
        assert_eq!(gauge_value(&registry, &labels), 3.0);
    }

    #[test]
    fn test_unknown_metric_is_rejected() {
        let registry = registry_with_defaults();
        let err = registry
            .increment("missing_total", &LabelSet::new(), 1.0)
            .expect_err("unknown metric must fail");
        assert!(matches!(err, RegistryError::UnknownMetric { ref name } if name == "missing_total"));
    }

    #[test]
    fn test_label_schema_violation_performs_no_mutation() {
        let registry = registry_with_defaults();

        let missing = LabelSet::new();
        let extra = LabelSet::new().with("result", "ok").with("id", "42");

        for labels in [&missing, &extra] {
            let err = registry
                .increment("test_events_total", labels, 1.0)
                .expect_err("schema mismatch must fail");
            assert!(matches!(err, RegistryError::LabelSchema { .. }));
        }

        assert_eq!(registry.snapshot().iter().count(), 0);
    }

    #[test]
    fn test_decrement_rejects_counter_and_histogram() {
        let registry = registry_with_defaults();

        let err = registry
            .decrement("test_events_total", &LabelSet::new().with("result", "ok"))
            .expect_err("counters cannot decrement");
        assert!(matches!(
            err,
            RegistryError::InvalidKind {
                actual: MetricKind::Counter,
                ..
            }
        ));

        let err = registry
            .decrement("test_duration_seconds", &LabelSet::new().with("method", "GET"))
            .expect_err("histograms cannot decrement");
        assert!(matches!(
            err,
            RegistryError::InvalidKind {
                actual: MetricKind::Histogram,
                ..
            }
        ));
    }

    #[test]
    fn test_increment_rejects_histogram_and_observe_rejects_counter() {
        let registry = registry_with_defaults();

        assert!(matches!(
            registry.increment(
                "test_duration_seconds",
                &LabelSet::new().with("method", "GET"),
                1.0
            ),
            Err(RegistryError::InvalidKind { .. })
        ));
        assert!(matches!(
            registry.observe(
                "test_events_total",
                &LabelSet::new().with("result", "ok"),
                1.0
            ),
            Err(RegistryError::InvalidKind { .. })
        ));
    }

    #[test]
    fn test_counter_rejects_negative_delta() {
        let registry = registry_with_defaults();
        let labels = LabelSet::new().with("result", "ok");

        let err = registry
            .increment("test_events_total", &labels, -1.0)
            .expect_err("negative counter delta must fail");
        assert!(matches!(err, RegistryError::InvalidValue { .. }));
        assert!(registry.series_value("test_events_total", &labels).is_none());
    }

    #[test]
    fn test_histogram_rejects_non_finite_values() {
        let registry = registry_with_defaults();
        let labels = LabelSet::new().with("method", "GET");

        for value in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            assert!(matches!(
                registry.observe("test_duration_seconds", &labels, value),
                Err(RegistryError::InvalidValue { .. })
            ));
        }
        assert!(registry.series_value("test_duration_seconds", &labels).is_none());
    }

    #[test]
    fn test_histogram_bucket_assignment_uses_less_or_equal() {
        let registry = registry_with_defaults();
        let labels = LabelSet::new().with("method", "GET");

        for value in [0.05, 0.1, 0.3, 1.0, 7.0] {
            registry
                .observe("test_duration_seconds", &labels, value)
                .expect("observe succeeds");
        }

        let value = registry
            .series_value("test_duration_seconds", &labels)
            .expect("series exists");
        let histogram = value.as_histogram().expect("histogram value");

        let counts: Vec<u64> = histogram.buckets().iter().map(|(_, c)| *c).collect();
        // 0.1 lands in the 0.1 bucket, 1.0 in the 1.0 bucket, 7.0 only in +Inf
        assert_eq!(counts, vec![2, 3, 4, 5]);
        assert_eq!(histogram.buckets().last().map(|(b, _)| *b), Some(f64::INFINITY));
        assert_eq!(histogram.count(), 5);
        assert!((histogram.sum() - 8.45).abs() < 1e-9);
    }

    #[test]
    fn test_snapshot_is_lazy_and_restartable() {
        let registry = registry_with_defaults();
        let snapshot = registry.snapshot();
        assert_eq!(snapshot.iter().count(), 0);

        registry
            .increment("test_events_total", &LabelSet::new().with("result", "ok"), 1.0)
            .expect("increment succeeds");
        registry
            .increment("test_events_total", &LabelSet::new().with("result", "err"), 1.0)
            .expect("increment succeeds");

        let first: Vec<_> = snapshot.iter().collect();
        assert_eq!(first.len(), 2);
        assert!(first.iter().all(|s| s.spec().name() == "test_events_total"));

        registry
            .increment("test_in_flight", &LabelSet::new().with("id", "7"), 1.0)
            .expect("increment succeeds");
        assert_eq!((&snapshot).into_iter().count(), 3);
    }

    #[test]
    fn test_snapshot_reports_labels_and_values() {
        let registry = registry_with_defaults();
        let labels = LabelSet::new().with("result", "ok");
        registry
            .increment("test_events_total", &labels, 2.5)
            .expect("increment succeeds");

        let series = registry
            .snapshot()
            .iter()
            .next()
            .expect("one series recorded");
        assert_eq!(series.labels(), &labels);
        assert_eq!(series.value(), &SeriesValue::Counter(2.5));
        assert_eq!(series.spec().kind(), MetricKind::Counter);
    }

    #[test]
    fn test_register_rejects_unsorted_buckets() {
        let mut registry = Registry::new();
        let result = registry.register(MetricSpec::histogram(
            "test_bad_buckets",
            "bad",
            &[],
            vec![1.0, 0.5],
        ));
        assert!(matches!(result, Err(RegistryError::Prometheus(_))));
        assert!(registry.get("test_bad_buckets").is_none());
    }

    #[test]
    fn test_gather_produces_prometheus_text_format() {
        let registry = registry_with_defaults();
        registry
            .increment("test_events_total", &LabelSet::new().with("result", "ok"), 1.0)
            .expect("increment succeeds");
        registry
            .observe("test_duration_seconds", &LabelSet::new().with("method", "GET"), 0.2)
            .expect("observe succeeds");

        let output = registry.gather().expect("gather succeeds");
        assert!(output.contains("# TYPE test_events_total counter"));
        assert!(output.contains("test_events_total{result=\"ok\"} 1"));
        assert!(output.contains("# TYPE test_duration_seconds histogram"));
        assert!(output.contains("test_duration_seconds_bucket{method=\"GET\",le=\"+Inf\"} 1"));
        assert!(output.contains("test_duration_seconds_sum{method=\"GET\"}"));
        assert!(output.contains("test_duration_seconds_count{method=\"GET\"} 1"));
    }

    #[test]
    fn test_concurrent_gauge_updates_net_to_zero() {
        use std::thread;

        let registry = Arc::new(registry_with_defaults());
        let labels = LabelSet::new().with("id", "shared");

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let registry = Arc::clone(&registry);
                let labels = labels.clone();
                thread::spawn(move || {
                    for _ in 0..500 {
                        registry
                            .increment("test_in_flight", &labels, 1.0)
                            .expect("increment succeeds");
                        registry
                            .decrement("test_in_flight", &labels)
                            .expect("decrement succeeds");
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().expect("thread should not panic");
        }

        assert_eq!(gauge_value(&registry, &labels), 0.0);
    }
}
