//! Event feed for push-based consumers
//!
//! Administrative changes and scan anomalies are published on a broadcast
//! channel so a UI feed can re-render without polling diagnostics.

use plc_types::{RawValue, RunMode};
use serde::Serialize;

/// Event emitted by controllers and the routing layer
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum PlcEvent {
    /// A controller changed run mode
    RunModeChanged {
        controller_id: String,
        from: RunMode,
        to: RunMode,
    },

    /// An operator forced a sensor value
    ValueForced {
        controller_id: String,
        sensor_id: String,
        value: RawValue,
    },

    /// An operator released a forced value
    ValueUnforced {
        controller_id: String,
        sensor_id: String,
    },

    /// A scan took longer than its configured cycle
    ScanOverrun {
        controller_id: String,
        sequence: u64,
        elapsed_ms: u64,
        scan_cycle_ms: u64,
    },

    /// Global PLC simulation was switched on or off
    SimulationToggled { enabled: bool },
}

impl PlcEvent {
    /// Controller this event concerns, if any
    pub fn controller_id(&self) -> Option<&str> {
        match self {
            PlcEvent::RunModeChanged { controller_id, .. }
            | PlcEvent::ValueForced { controller_id, .. }
            | PlcEvent::ValueUnforced { controller_id, .. }
            | PlcEvent::ScanOverrun { controller_id, .. } => Some(controller_id),
            PlcEvent::SimulationToggled { .. } => None,
        }
    }

    /// Check if this is an operator action (mode change or forcing)
    pub fn is_operator_action(&self) -> bool {
        matches!(
            self,
            PlcEvent::RunModeChanged { .. }
                | PlcEvent::ValueForced { .. }
                | PlcEvent::ValueUnforced { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_classification() {
        let forced = PlcEvent::ValueForced {
            controller_id: "C1".into(),
            sensor_id: "mining/x".into(),
            value: 0.0,
        };
        assert!(forced.is_operator_action());
        assert_eq!(forced.controller_id(), Some("C1"));

        let overrun = PlcEvent::ScanOverrun {
            controller_id: "C1".into(),
            sequence: 3,
            elapsed_ms: 80,
            scan_cycle_ms: 50,
        };
        assert!(!overrun.is_operator_action());

        let toggled = PlcEvent::SimulationToggled { enabled: false };
        assert_eq!(toggled.controller_id(), None);
    }

    #[test]
    fn test_serializes_with_type_tag() {
        let event = PlcEvent::RunModeChanged {
            controller_id: "C1".into(),
            from: RunMode::Run,
            to: RunMode::Stop,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "RunModeChanged");
        assert_eq!(json["to"], "Stop");
    }
}
