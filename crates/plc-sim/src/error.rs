//! Error types for a simulated controller

use thiserror::Error;

/// Errors returned by controller operations
///
/// Degraded data is never an error: it is a successful read carrying a
/// `Bad*` or `Uncertain*` quality.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ControllerError {
    /// The controller model does not allow forcing
    #[error("forcing is not supported by {controller} ({model})")]
    UnsupportedOperation { controller: String, model: String },

    /// The scan task ended without producing a result (runtime shutting down)
    #[error("scan on {controller} aborted: {reason}")]
    ScanAborted { controller: String, reason: String },
}
