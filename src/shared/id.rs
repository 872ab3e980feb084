//! Identifier conversion guard
//!
//! Lookup routes carry their key as a path segment (`/user/get/{id}`). The
//! guard parses it and records exactly one conversion event per call, which
//! is the only place the `ok`/`err` outcome of a lookup request is decided.

use thiserror::Error;

use crate::metrics::Metrics;
use crate::metrics::defs::CONV_TYPE_INT;

/// The raw path value was not a base-10 integer
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("'{raw}' is not a valid integer id")]
pub struct ParseError {
    raw: String,
}

impl ParseError {
    pub fn new(raw: impl Into<String>) -> Self {
        Self { raw: raw.into() }
    }

    /// The offending input, unchanged
    pub fn raw(&self) -> &str {
        &self.raw
    }
}

/// Parse a base-10 integer literal with an optional leading sign
///
/// No surrounding whitespace, no radix prefixes. Values outside the `i64`
/// range are rejected like any other malformed input.
pub fn parse_id(raw: &str) -> Result<i64, ParseError> {
    raw.parse::<i64>().map_err(|_| ParseError::new(raw))
}

/// Parses identifiers for one entity and records the outcome
pub struct IdGuard<'a> {
    metrics: &'a Metrics,
    entity: &'a str,
}

impl<'a> IdGuard<'a> {
    pub fn new(metrics: &'a Metrics, entity: &'a str) -> Self {
        Self { metrics, entity }
    }

    /// Parse `raw`, counting success or failure
    pub fn convert(&self, raw: &str) -> Result<i64, ParseError> {
        match parse_id(raw) {
            Ok(id) => {
                self.metrics
                    .conversion_succeeded(CONV_TYPE_INT, self.entity, raw);
                Ok(id)
            }
            Err(e) => {
                tracing::debug!(
                    entity = %self.entity,
                    raw_id = %raw,
                    "Rejected non-numeric id"
                );
                self.metrics.conversion_failed(CONV_TYPE_INT, self.entity);
                Err(e)
            }
        }
    }

    /// Count an identifier that could not be extracted from the request
    ///
    /// Used when the path segment never reaches `convert`, e.g. when it does
    /// not percent-decode to UTF-8.
    pub fn reject(&self, raw: &str) -> ParseError {
        tracing::debug!(
            entity = %self.entity,
            raw_id = %raw,
            "Rejected undecodable id"
        );
        self.metrics.conversion_failed(CONV_TYPE_INT, self.entity);
        ParseError::new(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MetricsConfig;
    use crate::metrics::{FailurePolicy, LabelSet, defs};

    fn test_metrics() -> Metrics {
        let settings = MetricsConfig {
            failure_policy: FailurePolicy::Panic,
            ..MetricsConfig::default()
        };
        Metrics::new(&settings).expect("metrics should build")
    }

    fn counter(metrics: &Metrics, suffix: &str, entity: &str, result: &str) -> f64 {
        let labels = LabelSet::new()
            .with("conv_type", defs::CONV_TYPE_INT)
            .with("entity", entity)
            .with("result", result);
        metrics
            .registry()
            .series_value(&metrics.name(suffix), &labels)
            .and_then(|v| v.as_f64())
            .unwrap_or(0.0)
    }

    #[test]
    fn test_parse_id_accepts_signed_integers() {
        assert_eq!(parse_id("42"), Ok(42));
        assert_eq!(parse_id("-7"), Ok(-7));
        assert_eq!(parse_id("+3"), Ok(3));
        assert_eq!(parse_id("007"), Ok(7));
    }

    #[test]
    fn test_parse_id_rejects_malformed_input() {
        for raw in ["", "abc", "4 2", " 1", "1.5", "0x10", "+", "-", "99999999999999999999"] {
            let err = parse_id(raw).expect_err("input should be rejected");
            assert_eq!(err.raw(), raw);
        }
    }

    #[test]
    fn test_guard_counts_success_once() {
        let metrics = test_metrics();
        let guard = IdGuard::new(&metrics, "user");

        assert_eq!(guard.convert("42"), Ok(42));

        assert_eq!(counter(&metrics, defs::CONVERSIONS, "user", "ok"), 1.0);
        assert_eq!(counter(&metrics, defs::CONVERSION_ERRORS, "user", "err"), 0.0);
    }

    #[test]
    fn test_guard_counts_failure_once() {
        let metrics = test_metrics();
        let guard = IdGuard::new(&metrics, "note");

        let err = guard.convert("abc").expect_err("abc is not an id");
        assert_eq!(err.raw(), "abc");

        assert_eq!(counter(&metrics, defs::CONVERSION_ERRORS, "note", "err"), 1.0);
        assert_eq!(counter(&metrics, defs::CONVERSIONS, "note", "ok"), 0.0);
    }

    #[test]
    fn test_guard_reject_counts_failure_once() {
        let metrics = test_metrics();
        let guard = IdGuard::new(&metrics, "user");

        let err = guard.reject("%FF");
        assert_eq!(err.raw(), "%FF");

        assert_eq!(counter(&metrics, defs::CONVERSION_ERRORS, "user", "err"), 1.0);
        assert_eq!(counter(&metrics, defs::CONVERSIONS, "user", "ok"), 0.0);
    }
}
