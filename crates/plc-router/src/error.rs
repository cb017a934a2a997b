//! Error types for the routing layer

use std::path::PathBuf;

use plc_sim::ControllerError;
use plc_types::ConfigError;
use thiserror::Error;

/// Errors returned to protocol surfaces by the routing layer
#[derive(Debug, Error)]
pub enum RoutingError {
    /// No enabled controller owns the sensor; read it directly instead
    #[error("sensor {0} is not routed to any enabled controller")]
    NotRouted(String),

    /// Controller id not present in the configuration
    #[error("unknown controller: {0}")]
    UnknownController(String),

    /// Controller rejected the operation
    #[error(transparent)]
    Controller(#[from] ControllerError),

    /// Declarative configuration is invalid
    #[error("invalid configuration: {0}")]
    Configuration(#[from] ConfigError),

    /// Configuration file could not be read
    #[error("failed to read configuration {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Configuration file is not valid JSON for the schema
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),
}

impl RoutingError {
    /// Whether the caller should fall back to an unfiltered read
    pub fn is_not_routed(&self) -> bool {
        matches!(self, Self::NotRouted(_))
    }

    /// Whether the operation is not available on the owning controller's model
    pub fn is_unsupported(&self) -> bool {
        matches!(
            self,
            Self::Controller(ControllerError::UnsupportedOperation { .. })
        )
    }
}
