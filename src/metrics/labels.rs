//! Label sets
//!
//! A `LabelSet` names one series of a metric. Keys must match the owning
//! metric's label schema exactly; the registry checks this before touching
//! any series.

use std::collections::BTreeMap;

use super::registry::RegistryError;
use super::defs::MetricSpec;

/// Mapping from label name to label value
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LabelSet(BTreeMap<String, String>);

impl LabelSet {
    /// Create an empty label set (valid for metrics without labels)
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Add a label, replacing any previous value for the same name
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.insert(name.into(), value.into());
        self
    }

    /// Build from `(name, value)` pairs
    pub fn from_pairs(pairs: &[(&str, &str)]) -> Self {
        pairs
            .iter()
            .fold(Self::new(), |labels, (name, value)| labels.with(*name, *value))
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate `(name, value)` pairs in name order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Resolve label values in the spec's schema order
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::LabelSchema` listing missing and unexpected
    /// names when the keys differ from `spec.label_names()`.
    pub(crate) fn values_for<'a>(
        &'a self,
        spec: &MetricSpec,
    ) -> Result<Vec<&'a str>, RegistryError> {
        let schema = spec.label_names();

        let missing: Vec<String> = schema
            .iter()
            .filter(|name| !self.0.contains_key(name.as_str()))
            .cloned()
            .collect();
        let unexpected: Vec<String> = self
            .0
            .keys()
            .filter(|name| !schema.contains(*name))
            .cloned()
            .collect();

        if !missing.is_empty() || !unexpected.is_empty() {
            return Err(RegistryError::LabelSchema {
                metric: spec.name().to_string(),
                missing,
                unexpected,
            });
        }

        Ok(schema
            .iter()
            .filter_map(|name| self.0.get(name).map(String::as_str))
            .collect())
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for LabelSet {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}
