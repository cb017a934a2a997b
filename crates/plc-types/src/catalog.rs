//! Vendor/model catalog
//!
//! Each supported controller model is a data record rather than a type.
//! The record drives the default scan cadence and whether the model lets an
//! operator force values.

/// Information about a specific controller model (static version)
#[derive(Debug, Clone, Copy)]
pub struct ModelRecordStatic {
    pub vendor: &'static str,
    pub model: &'static str,
    /// Default scan cycle in milliseconds
    pub default_scan_cycle_ms: u64,
    /// Whether forcing I/O is available on this model
    pub supports_forcing: bool,
    /// Typical time spent processing one scan, in milliseconds
    pub typical_processing_ms: u64,
}

/// Information about a specific controller model (owned version)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelRecord {
    /// Manufacturer name
    pub vendor: String,
    /// Model name/number
    pub model: String,
    /// Default scan cycle in milliseconds
    pub default_scan_cycle_ms: u64,
    /// Whether forcing I/O is available on this model
    pub supports_forcing: bool,
    /// Typical time spent processing one scan, in milliseconds
    pub typical_processing_ms: u64,
}

impl From<&ModelRecordStatic> for ModelRecord {
    fn from(s: &ModelRecordStatic) -> Self {
        Self {
            vendor: s.vendor.to_string(),
            model: s.model.to_string(),
            default_scan_cycle_ms: s.default_scan_cycle_ms,
            supports_forcing: s.supports_forcing,
            typical_processing_ms: s.typical_processing_ms,
        }
    }
}

/// Database of known controller models
pub struct Catalog;

impl Catalog {
    /// Look up a model by vendor and model name (case-insensitive)
    pub fn lookup(vendor: &str, model: &str) -> Option<ModelRecord> {
        MODELS
            .iter()
            .find(|m| m.vendor.eq_ignore_ascii_case(vendor) && m.model.eq_ignore_ascii_case(model))
            .map(ModelRecord::from)
    }

    /// Get all known models
    pub fn models() -> impl Iterator<Item = ModelRecord> {
        MODELS.iter().map(ModelRecord::from)
    }

    /// Get all models for a vendor
    pub fn models_for_vendor(vendor: &str) -> Vec<ModelRecord> {
        MODELS
            .iter()
            .filter(|m| m.vendor.eq_ignore_ascii_case(vendor))
            .map(ModelRecord::from)
            .collect()
    }

    /// Get the distinct vendor names
    pub fn vendors() -> Vec<&'static str> {
        let mut vendors: Vec<&'static str> = MODELS.iter().map(|m| m.vendor).collect();
        vendors.dedup();
        vendors
    }
}

// Grouped by vendor; `vendors()` relies on that ordering.
static MODELS: &[ModelRecordStatic] = &[
    ModelRecordStatic {
        vendor: "Siemens",
        model: "S7-1500",
        default_scan_cycle_ms: 10,
        supports_forcing: true,
        typical_processing_ms: 2,
    },
    ModelRecordStatic {
        vendor: "Siemens",
        model: "S7-1200",
        default_scan_cycle_ms: 50,
        supports_forcing: true,
        typical_processing_ms: 8,
    },
    ModelRecordStatic {
        vendor: "Siemens",
        model: "S7-300",
        default_scan_cycle_ms: 100,
        supports_forcing: true,
        typical_processing_ms: 20,
    },
    ModelRecordStatic {
        vendor: "Siemens",
        model: "LOGO!",
        default_scan_cycle_ms: 100,
        supports_forcing: false,
        typical_processing_ms: 15,
    },
    ModelRecordStatic {
        vendor: "Allen-Bradley",
        model: "ControlLogix 5580",
        default_scan_cycle_ms: 10,
        supports_forcing: true,
        typical_processing_ms: 2,
    },
    ModelRecordStatic {
        vendor: "Allen-Bradley",
        model: "CompactLogix 5380",
        default_scan_cycle_ms: 20,
        supports_forcing: true,
        typical_processing_ms: 4,
    },
    ModelRecordStatic {
        vendor: "Allen-Bradley",
        model: "Micro820",
        default_scan_cycle_ms: 100,
        supports_forcing: false,
        typical_processing_ms: 15,
    },
    ModelRecordStatic {
        vendor: "Schneider Electric",
        model: "Modicon M580",
        default_scan_cycle_ms: 20,
        supports_forcing: true,
        typical_processing_ms: 4,
    },
    ModelRecordStatic {
        vendor: "Schneider Electric",
        model: "Modicon M221",
        default_scan_cycle_ms: 100,
        supports_forcing: false,
        typical_processing_ms: 12,
    },
    ModelRecordStatic {
        vendor: "Mitsubishi",
        model: "MELSEC iQ-R",
        default_scan_cycle_ms: 10,
        supports_forcing: true,
        typical_processing_ms: 2,
    },
    ModelRecordStatic {
        vendor: "Omron",
        model: "NX1P2",
        default_scan_cycle_ms: 20,
        supports_forcing: true,
        typical_processing_ms: 4,
    },
    ModelRecordStatic {
        vendor: "Beckhoff",
        model: "CX9020",
        default_scan_cycle_ms: 10,
        supports_forcing: true,
        typical_processing_ms: 1,
    },
];
