//! Sensor namespace index
//!
//! Built once from the enabled controllers and never modified afterwards, so
//! concurrent lookups need no synchronization.

use std::collections::HashMap;

/// Maps namespace prefixes to controller positions
#[derive(Debug, Clone, Default)]
pub struct NamespaceIndex {
    prefixes: HashMap<String, usize>,
}

impl NamespaceIndex {
    /// Build from `(prefix, controller position)` pairs
    ///
    /// Prefixes must not overlap across controllers; configuration validation
    /// guarantees that before the index is built.
    pub fn build<'a, I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, usize)>,
    {
        let prefixes = entries
            .into_iter()
            .map(|(prefix, position)| (prefix.trim_matches('/').to_string(), position))
            .filter(|(prefix, _)| !prefix.is_empty())
            .collect();
        Self { prefixes }
    }

    /// Position of the controller owning `sensor_id`
    ///
    /// Candidate prefixes are tried segment by segment from the shortest, so
    /// `mining/pump/flow` checks `mining`, `mining/pump`, `mining/pump/flow`.
    pub fn lookup(&self, sensor_id: &str) -> Option<usize> {
        let sensor_id = sensor_id.trim_start_matches('/');
        sensor_id
            .match_indices('/')
            .map(|(end, _)| &sensor_id[..end])
            .chain(std::iter::once(sensor_id))
            .find_map(|candidate| self.prefixes.get(candidate).copied())
    }

    pub fn len(&self) -> usize {
        self.prefixes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prefixes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index() -> NamespaceIndex {
        NamespaceIndex::build([("mining", 0), ("utilities/grid/", 1), ("oil_gas", 2)])
    }

    #[test]
    fn test_lookup_by_segment() {
        let index = index();
        assert_eq!(index.lookup("mining/x"), Some(0));
        assert_eq!(index.lookup("mining"), Some(0));
        assert_eq!(index.lookup("/mining/pump/flow"), Some(0));
        assert_eq!(index.lookup("utilities/grid/voltage"), Some(1));
        assert_eq!(index.lookup("oil_gas/well/3/pressure"), Some(2));
    }

    #[test]
    fn test_no_partial_segment_match() {
        let index = index();
        assert_eq!(index.lookup("miningx/y"), None);
        assert_eq!(index.lookup("utilities/water/flow"), None);
        assert_eq!(index.lookup("utilities"), None);
        assert_eq!(index.lookup(""), None);
    }

    #[test]
    fn test_empty_prefixes_ignored() {
        let index = NamespaceIndex::build([("/", 0), ("", 1)]);
        assert!(index.is_empty());
        assert_eq!(index.lookup("anything"), None);
    }
}
