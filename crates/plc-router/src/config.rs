//! Declarative simulation configuration
//!
//! The file format is JSON. Only `id`, `vendor`, `model` and `namespaces` are
//! required per controller; everything else falls back to the catalog record
//! for the model or to the defaults below.
//!
//! ```json
//! {
//!   "enabled": true,
//!   "controllers": [
//!     {
//!       "id": "PLC-MINING-01",
//!       "vendor": "Allen-Bradley",
//!       "model": "ControlLogix 5580",
//!       "scan_cycle_ms": 50,
//!       "namespaces": ["mining"],
//!       "comm_error_probability": 0.0005
//!     }
//!   ]
//! }
//! ```

use std::collections::HashSet;
use std::path::Path;

use plc_types::config::{DEFAULT_COMM_ERROR_PROBABILITY, DEFAULT_QUALITY_ERROR_PROBABILITY};
use plc_types::{namespaces_overlap, Catalog, ConfigError, ControllerConfig, FaultProfile};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::RoutingError;

/// Top-level simulation configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlcSimConfig {
    /// Global switch; when false every sensor bypasses the PLC layer
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Controllers, in the order they are listed to observers
    #[serde(default)]
    pub controllers: Vec<ControllerSettings>,
}

/// Per-controller settings as written in the configuration file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControllerSettings {
    pub id: String,
    pub vendor: String,
    pub model: String,
    /// Defaults to the model's catalog scan cycle
    #[serde(default)]
    pub scan_cycle_ms: Option<u64>,
    #[serde(default)]
    pub rack: u16,
    #[serde(default = "default_slot")]
    pub slot: u16,
    pub namespaces: Vec<String>,
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Can only narrow what the model supports, never widen it
    #[serde(default)]
    pub supports_forcing: Option<bool>,
    #[serde(default = "default_comm_error_probability")]
    pub comm_error_probability: f64,
    #[serde(default = "default_quality_error_probability")]
    pub quality_error_probability: f64,
    /// Defaults to the model's typical processing time
    #[serde(default)]
    pub processing_ms: Option<u64>,
    #[serde(default)]
    pub jitter_ms: u64,
    #[serde(default)]
    pub seed: Option<u64>,
}

fn default_true() -> bool {
    true
}

fn default_slot() -> u16 {
    1
}

fn default_comm_error_probability() -> f64 {
    DEFAULT_COMM_ERROR_PROBABILITY
}

fn default_quality_error_probability() -> f64 {
    DEFAULT_QUALITY_ERROR_PROBABILITY
}

impl Default for PlcSimConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            controllers: Vec::new(),
        }
    }
}

impl ControllerSettings {
    /// Settings for a catalog model with every optional field defaulted
    pub fn new(
        id: impl Into<String>,
        vendor: impl Into<String>,
        model: impl Into<String>,
        namespaces: Vec<String>,
    ) -> Self {
        Self {
            id: id.into(),
            vendor: vendor.into(),
            model: model.into(),
            scan_cycle_ms: None,
            rack: 0,
            slot: default_slot(),
            namespaces,
            enabled: true,
            supports_forcing: None,
            comm_error_probability: DEFAULT_COMM_ERROR_PROBABILITY,
            quality_error_probability: DEFAULT_QUALITY_ERROR_PROBABILITY,
            processing_ms: None,
            jitter_ms: 0,
            seed: None,
        }
    }

    /// Resolve against the catalog and validate
    pub fn to_config(&self) -> Result<ControllerConfig, ConfigError> {
        let record = Catalog::lookup(&self.vendor, &self.model).ok_or_else(|| {
            ConfigError::UnknownModel {
                vendor: self.vendor.clone(),
                model: self.model.clone(),
            }
        })?;

        let config = ControllerConfig {
            id: self.id.clone(),
            vendor: record.vendor,
            model: record.model,
            scan_cycle_ms: self.scan_cycle_ms.unwrap_or(record.default_scan_cycle_ms),
            rack: self.rack,
            slot: self.slot,
            namespaces: self.namespaces.clone(),
            enabled: self.enabled,
            supports_forcing: record.supports_forcing && self.supports_forcing.unwrap_or(true),
            faults: FaultProfile::new(self.comm_error_probability, self.quality_error_probability),
            processing_ms: self.processing_ms.unwrap_or(record.typical_processing_ms),
            jitter_ms: self.jitter_ms,
            seed: self.seed,
        };
        config.validate()?;
        Ok(config)
    }
}

impl PlcSimConfig {
    /// Parse from a JSON string
    pub fn from_json_str(json: &str) -> Result<Self, RoutingError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, RoutingError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| RoutingError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        debug!("Loaded simulation configuration from {}", path.display());
        Self::from_json_str(&contents)
    }

    /// Resolve every controller and check the set as a whole
    pub fn validate(&self) -> Result<Vec<ControllerConfig>, ConfigError> {
        let configs = self
            .controllers
            .iter()
            .map(ControllerSettings::to_config)
            .collect::<Result<Vec<_>, _>>()?;
        validate_controller_set(&configs)?;
        Ok(configs)
    }
}

/// Check rules that span controllers
///
/// Ids must be unique, and no two enabled controllers may claim overlapping
/// namespaces. Overlap includes nesting (`mining` and `mining/north`), since
/// either would make routing ambiguous.
pub fn validate_controller_set(configs: &[ControllerConfig]) -> Result<(), ConfigError> {
    let mut ids = HashSet::new();
    for config in configs {
        config.validate()?;
        if !ids.insert(config.id.as_str()) {
            return Err(ConfigError::DuplicateController(config.id.clone()));
        }
    }

    let enabled: Vec<&ControllerConfig> = configs.iter().filter(|c| c.enabled).collect();
    for (i, a) in enabled.iter().enumerate() {
        for b in &enabled[i + 1..] {
            for ns_a in &a.namespaces {
                if let Some(ns_b) = b.namespaces.iter().find(|ns_b| namespaces_overlap(ns_a, ns_b)) {
                    return Err(ConfigError::OverlappingNamespace {
                        controller: b.id.clone(),
                        namespace: ns_b.clone(),
                        other: a.id.clone(),
                        other_namespace: ns_a.clone(),
                    });
                }
            }
        }
    }
    Ok(())
}
