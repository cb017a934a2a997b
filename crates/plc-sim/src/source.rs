//! Raw sensor data seam
//!
//! Controllers never generate values themselves: each scan pulls the current
//! raw values for a namespace from a [`SensorSource`] in a single batch.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock};

use plc_types::{namespace_contains, RawValue};

/// Provider of raw field values
///
/// Implementations must return promptly. A faulted sensor is reported as an
/// already-faulted raw value (for example NaN), not as an error.
pub trait SensorSource: Send + Sync {
    /// Current raw values of every sensor inside `namespace`
    fn current_values(&self, namespace: &str) -> HashMap<String, RawValue>;

    /// Current raw value of a single sensor, used for unfiltered reads
    fn current_value(&self, sensor_id: &str) -> Option<RawValue>;
}

/// Sensor source backed by a map, for tests and the command-line harness
#[derive(Debug, Default)]
pub struct InMemorySensorSource {
    values: RwLock<BTreeMap<String, RawValue>>,
    batch_calls: AtomicU64,
}

impl InMemorySensorSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a source pre-populated with `values`
    pub fn with_values<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = (S, RawValue)>,
        S: Into<String>,
    {
        let source = Self::new();
        for (id, value) in values {
            source.set(id, value);
        }
        source
    }

    /// Set (or add) a sensor's raw value
    pub fn set(&self, sensor_id: impl Into<String>, value: RawValue) {
        self.values
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(sensor_id.into(), value);
    }

    /// Remove a sensor, as if it stopped reporting
    pub fn remove(&self, sensor_id: &str) -> Option<RawValue> {
        self.values
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(sensor_id)
    }

    /// Number of batch queries served so far
    pub fn batch_calls(&self) -> u64 {
        self.batch_calls.load(Ordering::Relaxed)
    }

    pub fn len(&self) -> usize {
        self.values
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SensorSource for InMemorySensorSource {
    fn current_values(&self, namespace: &str) -> HashMap<String, RawValue> {
        self.batch_calls.fetch_add(1, Ordering::Relaxed);
        self.values
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|(id, _)| namespace_contains(namespace, id))
            .map(|(id, value)| (id.clone(), *value))
            .collect()
    }

    fn current_value(&self, sensor_id: &str) -> Option<RawValue> {
        self.values
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(sensor_id)
            .copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_is_filtered_by_namespace() {
        let source = InMemorySensorSource::with_values([
            ("mining/x", 1.0),
            ("mining/y", 2.0),
            ("miningx/z", 3.0),
            ("utilities/grid", 4.0),
        ]);

        let batch = source.current_values("mining");
        assert_eq!(batch.len(), 2);
        assert_eq!(batch.get("mining/x"), Some(&1.0));
        assert!(!batch.contains_key("miningx/z"));
        assert_eq!(source.batch_calls(), 1);
    }

    #[test]
    fn test_single_value_lookup() {
        let source = InMemorySensorSource::new();
        assert!(source.is_empty());

        source.set("utilities/grid", 230.0);
        assert_eq!(source.current_value("utilities/grid"), Some(230.0));

        source.remove("utilities/grid");
        assert_eq!(source.current_value("utilities/grid"), None);
        assert_eq!(source.batch_calls(), 0);
    }
}
