//! Routing manager
//!
//! Owns every configured controller and the namespace index. The controller
//! set and the index are fixed at construction; only run modes, forces,
//! counters and the global switch change at runtime.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use plc_sim::{Controller, DiagnosticsSnapshot, PlcEvent, SensorSource, TagReading};
use plc_types::{ControllerConfig, RawValue, RunMode};
use serde::Serialize;
use tokio::sync::broadcast;
use tracing::{debug, info};

use crate::config::{validate_controller_set, PlcSimConfig};
use crate::error::RoutingError;
use crate::index::NamespaceIndex;

/// Capacity of the shared event channel
const EVENT_CHANNEL_CAPACITY: usize = 1024;

/// Static description of a controller, for listings
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ControllerSummary {
    pub id: String,
    pub vendor: String,
    pub model: String,
    pub rack: u16,
    pub slot: u16,
    pub namespaces: Vec<String>,
    pub enabled: bool,
    pub supports_forcing: bool,
    pub scan_cycle_ms: u64,
}

impl From<&ControllerConfig> for ControllerSummary {
    fn from(config: &ControllerConfig) -> Self {
        Self {
            id: config.id.clone(),
            vendor: config.vendor.clone(),
            model: config.model.clone(),
            rack: config.rack,
            slot: config.slot,
            namespaces: config.namespaces.clone(),
            enabled: config.enabled,
            supports_forcing: config.supports_forcing,
            scan_cycle_ms: config.scan_cycle_ms,
        }
    }
}

/// The routing layer
///
/// One instance serves every protocol surface. Share it behind an `Arc`.
pub struct RoutingManager {
    controllers: Vec<Controller>,
    by_id: HashMap<String, usize>,
    /// Enabled controllers only
    index: NamespaceIndex,
    simulation_enabled: AtomicBool,
    events: broadcast::Sender<PlcEvent>,
    source: Arc<dyn SensorSource>,
}

impl std::fmt::Debug for RoutingManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoutingManager")
            .field("controllers", &self.controllers)
            .field("simulation_enabled", &self.is_simulation_enabled())
            .finish()
    }
}

impl RoutingManager {
    /// Build from a declarative configuration
    ///
    /// Fails if any controller is invalid or two enabled controllers claim
    /// overlapping namespaces.
    pub fn new(config: &PlcSimConfig, source: Arc<dyn SensorSource>) -> Result<Self, RoutingError> {
        let controllers = config.validate()?;
        Self::from_controllers(config.enabled, controllers, source)
    }

    /// Build from already-resolved controller configurations
    pub fn from_controllers(
        simulation_enabled: bool,
        configs: Vec<ControllerConfig>,
        source: Arc<dyn SensorSource>,
    ) -> Result<Self, RoutingError> {
        validate_controller_set(&configs)?;

        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let controllers: Vec<Controller> = configs
            .into_iter()
            .map(|config| Controller::with_events(config, Arc::clone(&source), events.clone()))
            .collect();

        let by_id = controllers
            .iter()
            .enumerate()
            .map(|(position, c)| (c.id().to_string(), position))
            .collect();

        let index = NamespaceIndex::build(
            controllers
                .iter()
                .enumerate()
                .filter(|(_, c)| c.config().enabled)
                .flat_map(|(position, c)| {
                    c.config()
                        .namespaces
                        .iter()
                        .map(move |ns| (ns.as_str(), position))
                }),
        );

        info!(
            "PLC routing layer ready: {} controllers, {} namespaces, simulation {}",
            controllers.len(),
            index.len(),
            if simulation_enabled { "enabled" } else { "disabled" }
        );

        Ok(Self {
            controllers,
            by_id,
            index,
            simulation_enabled: AtomicBool::new(simulation_enabled),
            events,
            source,
        })
    }

    /// Controller that owns `sensor_id`, if it is routed
    ///
    /// Returns `None` when global simulation is off, or when no enabled
    /// controller's namespace contains the sensor.
    pub fn resolve(&self, sensor_id: &str) -> Option<&Controller> {
        if !self.is_simulation_enabled() {
            return None;
        }
        self.index
            .lookup(sensor_id)
            .and_then(|position| self.controllers.get(position))
    }

    fn routed(&self, sensor_id: &str) -> Result<&Controller, RoutingError> {
        self.resolve(sensor_id)
            .ok_or_else(|| RoutingError::NotRouted(sensor_id.to_string()))
    }

    /// Controller by id, enabled or not
    pub fn controller(&self, controller_id: &str) -> Result<&Controller, RoutingError> {
        self.by_id
            .get(controller_id)
            .and_then(|&position| self.controllers.get(position))
            .ok_or_else(|| RoutingError::UnknownController(controller_id.to_string()))
    }

    /// Read a sensor through its owning controller
    pub async fn read(&self, sensor_id: &str) -> Result<TagReading, RoutingError> {
        let controller = self.routed(sensor_id)?;
        Ok(controller.read(sensor_id).await?)
    }

    /// Force a sensor on its owning controller
    pub fn force(&self, sensor_id: &str, value: RawValue) -> Result<(), RoutingError> {
        let controller = self.routed(sensor_id)?;
        Ok(controller.force(sensor_id, value)?)
    }

    /// Release a forced sensor on its owning controller
    pub fn unforce(&self, sensor_id: &str) -> Result<(), RoutingError> {
        let controller = self.routed(sensor_id)?;
        Ok(controller.unforce(sensor_id)?)
    }

    /// Change a controller's run mode
    pub fn set_run_mode(&self, controller_id: &str, mode: RunMode) -> Result<(), RoutingError> {
        self.controller(controller_id)?.set_run_mode(mode);
        Ok(())
    }

    pub fn diagnostics(&self, controller_id: &str) -> Result<DiagnosticsSnapshot, RoutingError> {
        Ok(self.controller(controller_id)?.diagnostics())
    }

    /// Diagnostics of every controller, in configuration order
    pub fn diagnostics_all(&self) -> Vec<DiagnosticsSnapshot> {
        self.controllers.iter().map(Controller::diagnostics).collect()
    }

    pub fn reset_diagnostics(&self, controller_id: &str) -> Result<(), RoutingError> {
        self.controller(controller_id)?.reset_diagnostics();
        Ok(())
    }

    /// Every configured controller, in configuration order
    pub fn list_controllers(&self) -> Vec<ControllerSummary> {
        self.controllers
            .iter()
            .map(|c| ControllerSummary::from(c.config()))
            .collect()
    }

    /// Switch the whole PLC layer on or off
    ///
    /// Controller state (modes, forces, counters) is kept while disabled and
    /// is in effect again once the layer is switched back on.
    pub fn set_simulation_enabled(&self, enabled: bool) {
        let previous = self.simulation_enabled.swap(enabled, Ordering::AcqRel);
        if previous != enabled {
            info!(
                "PLC simulation {}",
                if enabled { "enabled" } else { "disabled" }
            );
            // No subscribers is fine
            let _ = self.events.send(PlcEvent::SimulationToggled { enabled });
        } else {
            debug!("PLC simulation already {}", enabled);
        }
    }

    pub fn is_simulation_enabled(&self) -> bool {
        self.simulation_enabled.load(Ordering::Acquire)
    }

    /// Subscribe to events from every controller and the global switch
    pub fn subscribe(&self) -> broadcast::Receiver<PlcEvent> {
        self.events.subscribe()
    }

    /// The unfiltered sensor source, for reads that bypass the PLC layer
    pub fn source(&self) -> &Arc<dyn SensorSource> {
        &self.source
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use plc_sim::InMemorySensorSource;
    use plc_types::{FaultProfile, QualityCode};

    fn config(id: &str, model: &str, namespace: &str) -> ControllerConfig {
        let vendor = plc_types::Catalog::models()
            .into_iter()
            .find(|m| m.model == model)
            .map(|m| m.vendor)
            .unwrap();
        ControllerConfig::from_catalog(id, &vendor, model)
            .unwrap()
            .with_namespace(namespace)
            .with_faults(FaultProfile::NONE)
            .with_processing(0, 0)
            .with_seed(7)
    }

    fn manager(configs: Vec<ControllerConfig>) -> RoutingManager {
        let source = Arc::new(InMemorySensorSource::with_values([
            ("mining/conveyor/speed", 1.2),
            ("utilities/grid/voltage", 11.0),
            ("oil_gas/well/pressure", 250.0),
        ]));
        RoutingManager::from_controllers(true, configs, source).unwrap()
    }

    #[test]
    fn test_resolve_routes_by_namespace() {
        let manager = manager(vec![
            config("C1", "S7-1200", "mining"),
            config("C2", "LOGO!", "utilities"),
        ]);
        assert_eq!(manager.resolve("mining/conveyor/speed").map(|c| c.id()), Some("C1"));
        assert_eq!(manager.resolve("utilities/grid/voltage").map(|c| c.id()), Some("C2"));
        assert!(manager.resolve("oil_gas/well/pressure").is_none());
    }

    #[test]
    fn test_disabled_controller_not_routed_but_listed() {
        let manager = manager(vec![
            config("C1", "S7-1200", "mining").with_enabled(false),
            config("C2", "LOGO!", "utilities"),
        ]);
        assert!(manager.resolve("mining/conveyor/speed").is_none());
        assert_eq!(manager.list_controllers().len(), 2);
        assert!(!manager.list_controllers()[0].enabled);
        assert!(manager.diagnostics("C1").is_ok());
    }

    #[test]
    fn test_overlap_rejected_at_construction() {
        let source = Arc::new(InMemorySensorSource::new());
        let result = RoutingManager::from_controllers(
            true,
            vec![
                config("C1", "S7-1200", "mining"),
                config("C2", "S7-1500", "mining/north"),
            ],
            source,
        );
        assert!(matches!(result, Err(RoutingError::Configuration(_))));
    }

    #[tokio::test]
    async fn test_unrouted_operations_fail_not_routed() {
        let manager = manager(vec![config("C1", "S7-1200", "mining")]);

        let err = manager.read("oil_gas/well/pressure").await.unwrap_err();
        assert!(err.is_not_routed());
        assert!(manager.force("oil_gas/well/pressure", 1.0).unwrap_err().is_not_routed());
        assert!(manager.unforce("oil_gas/well/pressure").unwrap_err().is_not_routed());
    }

    #[tokio::test]
    async fn test_global_disable_routes_nothing() {
        let manager = manager(vec![config("C1", "S7-1200", "mining")]);
        let mut events = manager.subscribe();

        manager.set_simulation_enabled(false);
        assert!(!manager.is_simulation_enabled());
        assert!(manager.read("mining/conveyor/speed").await.unwrap_err().is_not_routed());
        assert_eq!(
            events.recv().await.unwrap(),
            PlcEvent::SimulationToggled { enabled: false }
        );

        manager.set_simulation_enabled(true);
        assert!(manager.read("mining/conveyor/speed").await.is_ok());
    }

    #[tokio::test]
    async fn test_read_and_force_through_manager() {
        let manager = manager(vec![config("C1", "S7-1200", "mining")]);

        let startup = manager.read("mining/conveyor/speed").await.unwrap();
        assert_eq!(startup.quality, QualityCode::Uncertain);
        assert_eq!(startup.controller_id, "C1");

        manager.force("mining/conveyor/speed", 0.0).unwrap();
        let forced = manager.read("mining/conveyor/speed").await.unwrap();
        assert!(forced.forced);
        assert_eq!(forced.value, 0.0);
        assert_eq!(forced.quality, QualityCode::GoodLocalOverride);

        manager.unforce("mining/conveyor/speed").unwrap();
        assert!(!manager.read("mining/conveyor/speed").await.unwrap().forced);
    }

    #[test]
    fn test_force_unsupported_model() {
        let manager = manager(vec![config("C2", "LOGO!", "utilities")]);
        let err = manager.force("utilities/grid/voltage", 5.0).unwrap_err();
        assert!(err.is_unsupported());
        assert_eq!(manager.diagnostics("C2").unwrap().forced_values_count, 0);
    }

    #[tokio::test]
    async fn test_run_mode_by_controller_id() {
        let manager = manager(vec![config("C1", "S7-1200", "mining")]);
        manager.set_run_mode("C1", RunMode::Stop).unwrap();

        let reading = manager.read("mining/conveyor/speed").await.unwrap();
        assert_eq!(reading.quality, QualityCode::BadOutOfService);
        assert_eq!(reading.run_mode, RunMode::Stop);

        assert!(matches!(
            manager.set_run_mode("C9", RunMode::Run),
            Err(RoutingError::UnknownController(_))
        ));
    }

    #[tokio::test]
    async fn test_diagnostics_all_and_reset() {
        let manager = manager(vec![
            config("C1", "S7-1200", "mining"),
            config("C2", "LOGO!", "utilities"),
        ]);
        manager.read("mining/conveyor/speed").await.unwrap();

        let all = manager.diagnostics_all();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].total_scans, 1);
        assert_eq!(all[1].total_scans, 0);

        manager.reset_diagnostics("C1").unwrap();
        assert_eq!(manager.diagnostics("C1").unwrap().total_scans, 0);
        assert!(manager.reset_diagnostics("nope").is_err());
    }

    #[tokio::test]
    async fn test_events_shared_across_controllers() {
        let manager = manager(vec![
            config("C1", "S7-1200", "mining"),
            config("C3", "S7-1500", "oil_gas"),
        ]);
        let mut events = manager.subscribe();

        manager.set_run_mode("C3", RunMode::Program).unwrap();
        manager.force("mining/conveyor/speed", 3.0).unwrap();

        let first = events.recv().await.unwrap();
        let second = events.recv().await.unwrap();
        assert_eq!(first.controller_id(), Some("C3"));
        assert_eq!(second.controller_id(), Some("C1"));
    }
}
