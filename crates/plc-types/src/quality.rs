//! Data-quality codes
//!
//! Every value handed to a protocol surface carries a quality annotation.
//! The numeric codes are the OPC UA status code values and are part of the
//! external contract: consumers on other protocols rely on them being stable.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Top-level family of a quality code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QualityFamily {
    Good,
    Uncertain,
    Bad,
}

/// Quality annotation attached to every reading
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QualityCode {
    /// Value is trustworthy
    #[serde(rename = "Good")]
    Good,
    /// Value was substituted by an operator force
    #[serde(rename = "Good_LocalOverride")]
    GoodLocalOverride,
    /// Value may be usable but its accuracy is not known
    #[serde(rename = "Uncertain")]
    Uncertain,
    /// Sensor is reporting but is known to be inaccurate
    #[serde(rename = "Uncertain_SensorNotAccurate")]
    UncertainSensorNotAccurate,
    /// Communication with the field device is lost
    #[serde(rename = "Bad_NotConnected")]
    BadNotConnected,
    /// The I/O device itself has failed
    #[serde(rename = "Bad_DeviceFailure")]
    BadDeviceFailure,
    /// The sensor has failed
    #[serde(rename = "Bad_SensorFailure")]
    BadSensorFailure,
    /// The controller is not scanning (stopped or in program mode)
    #[serde(rename = "Bad_OutOfService")]
    BadOutOfService,
}

impl QualityCode {
    /// Every code, in ascending numeric order within each family
    pub const ALL: [QualityCode; 8] = [
        QualityCode::Good,
        QualityCode::GoodLocalOverride,
        QualityCode::Uncertain,
        QualityCode::UncertainSensorNotAccurate,
        QualityCode::BadNotConnected,
        QualityCode::BadDeviceFailure,
        QualityCode::BadSensorFailure,
        QualityCode::BadOutOfService,
    ];

    /// Stable numeric code (OPC UA status code)
    pub fn code(&self) -> u32 {
        match self {
            Self::Good => 0x0000_0000,
            Self::GoodLocalOverride => 0x00D8_0000,
            Self::Uncertain => 0x4000_0000,
            Self::UncertainSensorNotAccurate => 0x4093_0000,
            Self::BadNotConnected => 0x808A_0000,
            Self::BadDeviceFailure => 0x808B_0000,
            Self::BadSensorFailure => 0x808C_0000,
            Self::BadOutOfService => 0x808D_0000,
        }
    }

    /// Look up a quality by its numeric code
    pub fn from_code(code: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|q| q.code() == code)
    }

    /// Canonical name, e.g. `Good_LocalOverride`
    pub fn name(&self) -> &'static str {
        match self {
            Self::Good => "Good",
            Self::GoodLocalOverride => "Good_LocalOverride",
            Self::Uncertain => "Uncertain",
            Self::UncertainSensorNotAccurate => "Uncertain_SensorNotAccurate",
            Self::BadNotConnected => "Bad_NotConnected",
            Self::BadDeviceFailure => "Bad_DeviceFailure",
            Self::BadSensorFailure => "Bad_SensorFailure",
            Self::BadOutOfService => "Bad_OutOfService",
        }
    }

    /// Family this code belongs to
    ///
    /// Derived from the severity bits of the status code, so it can never
    /// disagree with [`QualityCode::code`].
    pub fn family(&self) -> QualityFamily {
        match self.code() >> 30 {
            0 => QualityFamily::Good,
            1 => QualityFamily::Uncertain,
            _ => QualityFamily::Bad,
        }
    }

    pub fn is_good(&self) -> bool {
        self.family() == QualityFamily::Good
    }

    pub fn is_bad(&self) -> bool {
        self.family() == QualityFamily::Bad
    }
}

impl fmt::Display for QualityCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (0x{:08X})", self.name(), self.code())
    }
}
