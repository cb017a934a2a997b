//! Protocol-facing read path
//!
//! Protocol surfaces should not each reimplement the "routed or direct"
//! decision. [`SensorGateway`] reads routed sensors through their controller
//! and everything else straight from the sensor source, so a tag's value is
//! identical across surfaces whether or not the PLC layer is active.

use std::sync::Arc;

use chrono::Utc;
use plc_sim::TagReading;
use plc_types::{QualityCode, RawValue};
use serde::Serialize;
use tracing::trace;

use crate::error::RoutingError;
use crate::manager::RoutingManager;

/// A value read without PLC filtering
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DirectReading {
    pub sensor_id: String,
    pub value: RawValue,
    pub quality: QualityCode,
    pub quality_code: u32,
    pub timestamp_utc_ms: i64,
}

/// Result of a gateway read
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "path", rename_all = "snake_case")]
pub enum SensorReading {
    /// Served by a simulated controller
    Routed(TagReading),
    /// Served straight from the sensor source
    Direct(DirectReading),
}

impl SensorReading {
    pub fn sensor_id(&self) -> &str {
        match self {
            SensorReading::Routed(r) => &r.sensor_id,
            SensorReading::Direct(r) => &r.sensor_id,
        }
    }

    pub fn value(&self) -> RawValue {
        match self {
            SensorReading::Routed(r) => r.value,
            SensorReading::Direct(r) => r.value,
        }
    }

    pub fn quality(&self) -> QualityCode {
        match self {
            SensorReading::Routed(r) => r.quality,
            SensorReading::Direct(r) => r.quality,
        }
    }

    pub fn is_routed(&self) -> bool {
        matches!(self, SensorReading::Routed(_))
    }
}

/// Single read entry point for protocol surfaces
#[derive(Debug, Clone)]
pub struct SensorGateway {
    manager: Arc<RoutingManager>,
}

impl SensorGateway {
    pub fn new(manager: Arc<RoutingManager>) -> Self {
        Self { manager }
    }

    pub fn manager(&self) -> &Arc<RoutingManager> {
        &self.manager
    }

    /// Read a sensor, through its controller when routed
    ///
    /// Controller failures are returned as errors; only "not routed" falls
    /// back to the direct path.
    pub async fn read(&self, sensor_id: &str) -> Result<SensorReading, RoutingError> {
        match self.manager.read(sensor_id).await {
            Ok(reading) => Ok(SensorReading::Routed(reading)),
            Err(RoutingError::NotRouted(_)) => Ok(SensorReading::Direct(self.read_direct(sensor_id))),
            Err(e) => Err(e),
        }
    }

    /// Read a sensor from the source, ignoring the PLC layer
    pub fn read_direct(&self, sensor_id: &str) -> DirectReading {
        let (value, quality) = match self.manager.source().current_value(sensor_id) {
            Some(value) => (value, QualityCode::Good),
            None => (0.0, QualityCode::BadNotConnected),
        };
        trace!("Direct read {} = {} ({})", sensor_id, value, quality.name());

        DirectReading {
            sensor_id: sensor_id.to_string(),
            value,
            quality,
            quality_code: quality.code(),
            timestamp_utc_ms: Utc::now().timestamp_millis(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use plc_sim::InMemorySensorSource;
    use plc_types::{ControllerConfig, FaultProfile};

    fn gateway(enabled: bool) -> SensorGateway {
        let config = ControllerConfig::from_catalog("C1", "Siemens", "S7-1200")
            .unwrap()
            .with_namespace("mining")
            .with_faults(FaultProfile::NONE)
            .with_processing(0, 0);
        let source = Arc::new(InMemorySensorSource::with_values([
            ("mining/x", 4.0),
            ("utilities/grid/voltage", 11.0),
        ]));
        let manager = RoutingManager::from_controllers(enabled, vec![config], source).unwrap();
        SensorGateway::new(Arc::new(manager))
    }

    #[tokio::test]
    async fn test_routed_sensor_goes_through_controller() {
        let gateway = gateway(true);
        let reading = gateway.read("mining/x").await.unwrap();
        assert!(reading.is_routed());
        assert_eq!(reading.value(), 4.0);
    }

    #[tokio::test]
    async fn test_unrouted_sensor_reads_direct() {
        let gateway = gateway(true);
        let reading = gateway.read("utilities/grid/voltage").await.unwrap();
        assert!(!reading.is_routed());
        assert_eq!(reading.value(), 11.0);
        assert_eq!(reading.quality(), QualityCode::Good);
    }

    #[tokio::test]
    async fn test_disabled_layer_reads_direct() {
        let gateway = gateway(false);
        let reading = gateway.read("mining/x").await.unwrap();
        assert!(!reading.is_routed());
        assert_eq!(reading.sensor_id(), "mining/x");
        assert_eq!(reading.value(), 4.0);
    }

    #[test]
    fn test_direct_missing_sensor_not_connected() {
        let gateway = gateway(true);
        let reading = gateway.read_direct("utilities/water/flow");
        assert_eq!(reading.quality, QualityCode::BadNotConnected);
        assert_eq!(reading.quality_code, 0x808A_0000);
    }
}
