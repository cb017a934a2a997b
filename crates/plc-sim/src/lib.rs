//! PLC Scan-Cycle Simulation Library
//!
//! This crate simulates the scanned-I/O behaviour of a single controller.
//! It includes:
//!
//! - **Controller**: Input image buffered on a scan cadence, run mode, forcing and diagnostics
//! - **Quality pipeline**: Injected communication and sensor errors, driven by a supplied random source
//! - **SensorSource**: The seam through which raw field values are pulled, one batch per scan
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use plc_sim::{Controller, InMemorySensorSource};
//! use plc_types::{ControllerConfig, FaultProfile, QualityCode};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let source = Arc::new(InMemorySensorSource::new());
//! source.set("mining/conveyor/speed", 1.8);
//!
//! let config = ControllerConfig::from_catalog("C1", "Siemens", "S7-1200")
//!     .unwrap()
//!     .with_namespace("mining")
//!     .with_faults(FaultProfile::NONE)
//!     .with_processing(0, 0);
//! let controller = Controller::new(config, source);
//!
//! // The first read scans the input image and brings the controller into Run
//! let reading = controller.read("mining/conveyor/speed").await.unwrap();
//! assert_eq!(reading.quality, QualityCode::Uncertain);
//!
//! controller.force("mining/conveyor/speed", 0.0).unwrap();
//! let reading = controller.read("mining/conveyor/speed").await.unwrap();
//! assert_eq!(reading.quality, QualityCode::GoodLocalOverride);
//! # }
//! ```

pub mod buffer;
pub mod controller;
pub mod diagnostics;
pub mod error;
pub mod events;
pub mod quality;
pub mod source;

pub use buffer::ScanSnapshot;
pub use controller::{Controller, ForceEntry, TagReading};
pub use diagnostics::DiagnosticsSnapshot;
pub use error::ControllerError;
pub use events::PlcEvent;
pub use quality::{assess, Assessment, Outcome};
pub use source::{InMemorySensorSource, SensorSource};
