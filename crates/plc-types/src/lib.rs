//! PLC Simulation Types
//!
//! This crate provides the value types shared by the scan-cycle simulation
//! and the routing layer:
//!
//! - **QualityCode**: Data-quality annotation with stable OPC UA status codes
//! - **RunMode**: Operational state of a simulated controller
//! - **ControllerConfig**: Immutable per-controller configuration
//! - **Catalog**: Vendor/model records that drive default scan cadence and forcing support
//!
//! # Example
//!
//! ```rust
//! use plc_types::{Catalog, QualityCode, QualityFamily};
//!
//! let model = Catalog::lookup("Siemens", "S7-1500").unwrap();
//! assert!(model.supports_forcing);
//!
//! let quality = QualityCode::from_code(0x808D_0000).unwrap();
//! assert_eq!(quality, QualityCode::BadOutOfService);
//! assert_eq!(quality.family(), QualityFamily::Bad);
//! ```

pub mod catalog;
pub mod config;
pub mod error;
pub mod mode;
pub mod quality;

pub use catalog::{Catalog, ModelRecord};
pub use config::{namespace_contains, namespaces_overlap, ControllerConfig, FaultProfile};
pub use error::ConfigError;
pub use mode::RunMode;
pub use quality::{QualityCode, QualityFamily};

/// Raw value reported by a field sensor
pub type RawValue = f64;
