//! Controller configuration

use serde::{Deserialize, Serialize};

use crate::catalog::Catalog;
use crate::error::ConfigError;

/// Default probability of an injected communication error per sensor per scan
pub const DEFAULT_COMM_ERROR_PROBABILITY: f64 = 0.0005;

/// Default probability of an injected sensor-quality error per sensor per scan
pub const DEFAULT_QUALITY_ERROR_PROBABILITY: f64 = 0.0005;

/// Upper bound on simulated processing plus jitter, in milliseconds
pub const MAX_PROCESSING_MS: u64 = 60_000;

/// Upper bound on simulated processing plus jitter, in scan cycles
pub const MAX_PROCESSING_CYCLES: u64 = 10;

/// Probabilities used by the quality pipeline
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FaultProfile {
    /// Chance of a communication error (`Bad_NotConnected`/`Bad_DeviceFailure`)
    pub comm_error_probability: f64,
    /// Chance of a sensor error (`Uncertain_SensorNotAccurate`/`Bad_SensorFailure`)
    pub quality_error_probability: f64,
}

impl FaultProfile {
    /// A profile that never injects errors
    pub const NONE: FaultProfile = FaultProfile {
        comm_error_probability: 0.0,
        quality_error_probability: 0.0,
    };

    pub fn new(comm_error_probability: f64, quality_error_probability: f64) -> Self {
        Self {
            comm_error_probability,
            quality_error_probability,
        }
    }
}

impl Default for FaultProfile {
    fn default() -> Self {
        Self {
            comm_error_probability: DEFAULT_COMM_ERROR_PROBABILITY,
            quality_error_probability: DEFAULT_QUALITY_ERROR_PROBABILITY,
        }
    }
}

/// Configuration of one simulated controller
///
/// Immutable once loaded. Build one with [`ControllerConfig::from_catalog`],
/// adjust it with the `with_*` methods and check it with
/// [`ControllerConfig::validate`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControllerConfig {
    /// Unique identifier
    pub id: String,
    /// Manufacturer label
    pub vendor: String,
    /// Model label
    pub model: String,
    /// Scan cycle in milliseconds
    pub scan_cycle_ms: u64,
    /// Rack number (cosmetic)
    pub rack: u16,
    /// Slot number (cosmetic)
    pub slot: u16,
    /// Namespace prefixes owned by this controller
    pub namespaces: Vec<String>,
    /// Disabled controllers own nothing for routing purposes
    pub enabled: bool,
    /// Whether operators may force values
    pub supports_forcing: bool,
    /// Quality pipeline probabilities
    pub faults: FaultProfile,
    /// Simulated processing time per scan, in milliseconds
    pub processing_ms: u64,
    /// Upper bound of uniform jitter added to the processing time
    pub jitter_ms: u64,
    /// Seed for the controller's random source (entropy when `None`)
    pub seed: Option<u64>,
}

impl ControllerConfig {
    /// Create a configuration with the catalog defaults for `vendor`/`model`
    pub fn from_catalog(
        id: impl Into<String>,
        vendor: &str,
        model: &str,
    ) -> Result<Self, ConfigError> {
        let record = Catalog::lookup(vendor, model).ok_or_else(|| ConfigError::UnknownModel {
            vendor: vendor.to_string(),
            model: model.to_string(),
        })?;

        Ok(Self {
            id: id.into(),
            vendor: record.vendor,
            model: record.model,
            scan_cycle_ms: record.default_scan_cycle_ms,
            rack: 0,
            slot: 1,
            namespaces: Vec::new(),
            enabled: true,
            supports_forcing: record.supports_forcing,
            faults: FaultProfile::default(),
            processing_ms: record.typical_processing_ms,
            jitter_ms: 0,
            seed: None,
        })
    }

    pub fn with_namespace(mut self, prefix: impl Into<String>) -> Self {
        self.namespaces.push(prefix.into());
        self
    }

    pub fn with_scan_cycle_ms(mut self, ms: u64) -> Self {
        self.scan_cycle_ms = ms;
        self
    }

    pub fn with_faults(mut self, faults: FaultProfile) -> Self {
        self.faults = faults;
        self
    }

    pub fn with_processing(mut self, processing_ms: u64, jitter_ms: u64) -> Self {
        self.processing_ms = processing_ms;
        self.jitter_ms = jitter_ms;
        self
    }

    pub fn with_forcing(mut self, supports_forcing: bool) -> Self {
        self.supports_forcing = supports_forcing;
        self
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_address(mut self, rack: u16, slot: u16) -> Self {
        self.rack = rack;
        self.slot = slot;
        self
    }

    /// Check the invariants of a single controller
    ///
    /// Cross-controller rules (duplicate ids, overlapping namespaces) are
    /// checked by whoever owns the full controller set.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if Catalog::lookup(&self.vendor, &self.model).is_none() {
            return Err(ConfigError::UnknownModel {
                vendor: self.vendor.clone(),
                model: self.model.clone(),
            });
        }
        if self.scan_cycle_ms == 0 {
            return Err(ConfigError::InvalidScanCycle(self.id.clone()));
        }
        if self.namespaces.is_empty() || self.namespaces.iter().any(|ns| normalize(ns).is_empty())
        {
            return Err(ConfigError::EmptyNamespace(self.id.clone()));
        }
        let limit_ms = self
            .scan_cycle_ms
            .saturating_mul(MAX_PROCESSING_CYCLES)
            .min(MAX_PROCESSING_MS);
        match self.processing_ms.checked_add(self.jitter_ms) {
            Some(cost) if cost <= limit_ms => {}
            _ => {
                return Err(ConfigError::InvalidProcessing {
                    controller: self.id.clone(),
                    processing_ms: self.processing_ms,
                    jitter_ms: self.jitter_ms,
                    limit_ms,
                })
            }
        }
        for (field, value) in [
            ("comm_error_probability", self.faults.comm_error_probability),
            ("quality_error_probability", self.faults.quality_error_probability),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::InvalidProbability {
                    controller: self.id.clone(),
                    field,
                    value,
                });
            }
        }
        Ok(())
    }

    /// Whether this controller's namespaces contain `sensor_id`
    pub fn owns(&self, sensor_id: &str) -> bool {
        self.namespaces
            .iter()
            .any(|ns| namespace_contains(ns, sensor_id))
    }

    /// Simulated processing cost of one scan with `jitter_ms` added
    pub fn processing(&self, jitter_ms: u64) -> std::time::Duration {
        std::time::Duration::from_millis(self.processing_ms.saturating_add(jitter_ms))
    }

    pub fn scan_cycle(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.scan_cycle_ms)
    }
}

fn normalize(prefix: &str) -> &str {
    prefix.trim_matches('/')
}

/// Whether `sensor_id` lies inside the namespace `prefix`
///
/// Matching is by whole path segment: `mining` contains `mining` and
/// `mining/x`, but not `miningx`.
pub fn namespace_contains(prefix: &str, sensor_id: &str) -> bool {
    let prefix = normalize(prefix);
    let sensor_id = sensor_id.trim_start_matches('/');
    match sensor_id.strip_prefix(prefix) {
        Some(rest) => !prefix.is_empty() && (rest.is_empty() || rest.starts_with('/')),
        None => false,
    }
}

/// Whether two namespace prefixes could both match some sensor id
pub fn namespaces_overlap(a: &str, b: &str) -> bool {
    namespace_contains(a, b) || namespace_contains(b, a)
}
