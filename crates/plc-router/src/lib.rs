//! PLC Routing Layer
//!
//! This crate owns the set of simulated controllers and resolves each sensor
//! tag to the one controller that scans it. Every protocol surface (node
//! tree, topic feed, register poll, UI feed) reads through the same
//! [`RoutingManager`], so they all observe the same value, quality and scan
//! sequence for a tag.
//!
//! # Routing
//!
//! A sensor id such as `mining/conveyor/speed` belongs to the enabled
//! controller owning the `mining` (or `mining/conveyor`) namespace. A sensor
//! no enabled controller owns is *not routed*: callers must read it directly
//! from the sensor source instead, which [`SensorGateway`] does for them.
//! Switching global simulation off makes every sensor not routed, which is
//! equivalent to removing this layer.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use plc_router::{PlcSimConfig, RoutingManager};
//! use plc_sim::InMemorySensorSource;
//!
//! let config = PlcSimConfig::from_json_str(r#"{
//!     "controllers": [
//!         { "id": "C1", "vendor": "Siemens", "model": "S7-1200", "namespaces": ["mining"] }
//!     ]
//! }"#).unwrap();
//!
//! let source = Arc::new(InMemorySensorSource::with_values([("mining/x", 1.5)]));
//! let manager = RoutingManager::new(&config, source).unwrap();
//!
//! assert_eq!(manager.resolve("mining/x").map(|c| c.id()), Some("C1"));
//! assert!(manager.resolve("utilities/grid").is_none());
//! ```

pub mod config;
pub mod error;
pub mod gateway;
pub mod index;
pub mod manager;

pub use config::{validate_controller_set, ControllerSettings, PlcSimConfig};
pub use error::RoutingError;
pub use gateway::{DirectReading, SensorGateway, SensorReading};
pub use index::NamespaceIndex;
pub use manager::{ControllerSummary, RoutingManager};

// Re-export the types callers need alongside the manager
pub use plc_sim::{DiagnosticsSnapshot, PlcEvent, SensorSource, TagReading};
pub use plc_types::{QualityCode, QualityFamily, RunMode};
