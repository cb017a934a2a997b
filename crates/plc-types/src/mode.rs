//! Controller run mode

use serde::{Deserialize, Serialize};

use crate::quality::QualityCode;

/// Operational state of a simulated controller
///
/// A controller starts in `Startup` and moves to `Run` after its first scan.
/// `Stop`, `Program` and `Fault` are only ever entered by an explicit
/// administrative transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum RunMode {
    #[default]
    Startup,
    Run,
    Stop,
    Program,
    Fault,
}

impl RunMode {
    /// Get human-readable name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Startup => "Startup",
            Self::Run => "Run",
            Self::Stop => "Stop",
            Self::Program => "Program",
            Self::Fault => "Fault",
        }
    }

    /// Whether the controller is updating its input image in this mode
    pub fn is_scanning(&self) -> bool {
        matches!(self, Self::Startup | Self::Run)
    }

    /// Quality imposed by this mode regardless of the scanned value
    ///
    /// Returns `None` for modes that let scan-derived quality through.
    pub fn imposed_quality(&self) -> Option<QualityCode> {
        match self {
            Self::Stop | Self::Program => Some(QualityCode::BadOutOfService),
            Self::Fault => Some(QualityCode::BadDeviceFailure),
            Self::Startup | Self::Run => None,
        }
    }
}

impl std::fmt::Display for RunMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
