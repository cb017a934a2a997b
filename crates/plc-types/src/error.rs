//! Error types for controller configuration

use thiserror::Error;

/// Errors found while validating declarative controller configuration
///
/// All of these are fatal at load time.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    /// Two enabled controllers claim the same (or a nested) namespace
    #[error("namespace {namespace:?} of {controller} overlaps {other_namespace:?} of {other}")]
    OverlappingNamespace {
        controller: String,
        namespace: String,
        other: String,
        other_namespace: String,
    },

    /// Vendor/model pair not present in the catalog
    #[error("unknown controller model: {vendor} {model}")]
    UnknownModel { vendor: String, model: String },

    /// Scan cycle must be a positive number of milliseconds
    #[error("controller {0}: scan cycle must be positive")]
    InvalidScanCycle(String),

    /// Simulated processing cost is unbounded or far beyond the scan cycle
    #[error(
        "controller {controller}: processing {processing_ms}ms + jitter {jitter_ms}ms exceeds the {limit_ms}ms limit"
    )]
    InvalidProcessing {
        controller: String,
        processing_ms: u64,
        jitter_ms: u64,
        limit_ms: u64,
    },

    /// Fault probability outside [0, 1]
    #[error("controller {controller}: {field} must be within [0, 1], got {value}")]
    InvalidProbability {
        controller: String,
        field: &'static str,
        value: f64,
    },

    /// Controller id used more than once
    #[error("duplicate controller id: {0}")]
    DuplicateController(String),

    /// Controller owns no namespace, or an empty prefix
    #[error("controller {0}: namespace prefixes must be non-empty")]
    EmptyNamespace(String),
}
