//! Simulated controller
//!
//! A [`Controller`] owns one PLC's input image, run mode, force table and
//! diagnostic counters. Reads are answered from the image while it is
//! younger than the scan cycle; otherwise the reader performs a scan.
//!
//! # Concurrency
//!
//! The image sits behind an async mutex, so at most one scan runs at a time.
//! A reader that finds a scan in flight waits for the lock, then returns the
//! image that scan produced instead of scanning again, even if the scan
//! overran its cycle. The scan itself runs in a
//! spawned task that owns the lock guard: a caller that gives up on its read
//! cannot cancel a scan that has already started.
//!
//! The force table, run mode and counters are guarded independently of the
//! image, so forcing and diagnostics never wait for a slow scan.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use plc_types::{ControllerConfig, FaultProfile, QualityCode, RawValue, RunMode};
use rand::Rng;
use serde::Serialize;
use tokio::sync::{broadcast, Mutex, OwnedMutexGuard};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::buffer::{ScanBuffer, ScanSnapshot};
use crate::diagnostics::{Counters, DiagnosticsSnapshot};
use crate::error::ControllerError;
use crate::events::PlcEvent;
use crate::quality::{assess, Outcome};
use crate::source::SensorSource;

/// Capacity of the event channel a standalone controller creates for itself
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Result of reading one sensor through a controller
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TagReading {
    pub sensor_id: String,
    pub value: RawValue,
    pub quality: QualityCode,
    /// Numeric form of `quality`, for wire consumers
    pub quality_code: u32,
    pub timestamp_utc_ms: i64,
    /// Sequence number of the scan the value came from
    pub scan_sequence: u64,
    /// True when the value is an operator override
    pub forced: bool,
    pub controller_id: String,
    pub run_mode: RunMode,
}

/// An operator override for one sensor
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ForceEntry {
    pub value: RawValue,
    pub set_at_utc_ms: i64,
}

/// State shared between controller handles and in-flight scan tasks
struct Shared {
    config: ControllerConfig,
    source: Arc<dyn SensorSource>,
    counters: Counters,
    forces: RwLock<HashMap<String, ForceEntry>>,
    run_mode: RwLock<RunMode>,
    /// Sequence of the last completed scan, readable without the image lock
    last_sequence: AtomicU64,
    /// Set when a mode change must force the next read to scan
    image_invalidated: AtomicBool,
    events: broadcast::Sender<PlcEvent>,
}

/// A simulated PLC
///
/// Cloning yields another handle to the same controller.
#[derive(Clone)]
pub struct Controller {
    shared: Arc<Shared>,
    buffer: Arc<Mutex<ScanBuffer>>,
}

impl fmt::Debug for Controller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Controller")
            .field("id", &self.shared.config.id)
            .field("model", &self.shared.config.model)
            .field("run_mode", &self.run_mode())
            .field("buffer", &"<scan buffer>")
            .finish()
    }
}

impl Controller {
    /// Create a controller with its own event channel
    pub fn new(config: ControllerConfig, source: Arc<dyn SensorSource>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self::with_events(config, source, events)
    }

    /// Create a controller that publishes on an existing event channel
    pub fn with_events(
        config: ControllerConfig,
        source: Arc<dyn SensorSource>,
        events: broadcast::Sender<PlcEvent>,
    ) -> Self {
        info!(
            "Created controller {} ({} {}), scan cycle {}ms, namespaces {:?}",
            config.id, config.vendor, config.model, config.scan_cycle_ms, config.namespaces
        );

        let buffer = ScanBuffer::new(config.seed);
        Self {
            shared: Arc::new(Shared {
                config,
                source,
                counters: Counters::default(),
                forces: RwLock::new(HashMap::new()),
                run_mode: RwLock::new(RunMode::Startup),
                last_sequence: AtomicU64::new(0),
                image_invalidated: AtomicBool::new(false),
                events,
            }),
            buffer: Arc::new(Mutex::new(buffer)),
        }
    }

    /// Get the controller's identifier
    pub fn id(&self) -> &str {
        &self.shared.config.id
    }

    /// Get the controller's configuration
    pub fn config(&self) -> &ControllerConfig {
        &self.shared.config
    }

    /// Subscribe to this controller's event channel
    pub fn subscribe(&self) -> broadcast::Receiver<PlcEvent> {
        self.shared.events.subscribe()
    }

    pub fn run_mode(&self) -> RunMode {
        self.shared.run_mode()
    }

    /// Administrative run-mode transition
    ///
    /// Always allowed. A mode change never refreshes the input image; the
    /// next read in `Run` performs a fresh scan.
    pub fn set_run_mode(&self, mode: RunMode) {
        let previous = {
            let mut current = self
                .shared
                .run_mode
                .write()
                .unwrap_or_else(PoisonError::into_inner);
            std::mem::replace(&mut *current, mode)
        };

        if previous != mode {
            self.shared.image_invalidated.store(true, Ordering::Release);
            info!(
                "Controller {} run mode {} -> {}",
                self.shared.config.id, previous, mode
            );
            self.shared.emit(PlcEvent::RunModeChanged {
                controller_id: self.shared.config.id.clone(),
                from: previous,
                to: mode,
            });
        }
    }

    /// Force a sensor to a fixed value
    ///
    /// Takes effect on the very next read, bypassing the scan buffer.
    pub fn force(&self, sensor_id: &str, value: RawValue) -> Result<(), ControllerError> {
        self.ensure_forcing_supported()?;

        let entry = ForceEntry {
            value,
            set_at_utc_ms: now_utc_ms(),
        };
        self.shared
            .forces
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(sensor_id.to_string(), entry);

        info!(
            "Controller {} forced {} = {}",
            self.shared.config.id, sensor_id, value
        );
        self.shared.emit(PlcEvent::ValueForced {
            controller_id: self.shared.config.id.clone(),
            sensor_id: sensor_id.to_string(),
            value,
        });
        Ok(())
    }

    /// Release a forced value
    ///
    /// Releasing a sensor that is not forced succeeds and changes nothing,
    /// including on models that cannot force at all.
    pub fn unforce(&self, sensor_id: &str) -> Result<(), ControllerError> {
        let removed = self
            .shared
            .forces
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(sensor_id);

        if removed.is_some() {
            info!("Controller {} released {}", self.shared.config.id, sensor_id);
            self.shared.emit(PlcEvent::ValueUnforced {
                controller_id: self.shared.config.id.clone(),
                sensor_id: sensor_id.to_string(),
            });
        }
        Ok(())
    }

    /// Active forces, sorted by sensor id
    pub fn forced_values(&self) -> Vec<(String, ForceEntry)> {
        let mut forces: Vec<_> = self
            .shared
            .forces
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(id, entry)| (id.clone(), *entry))
            .collect();
        forces.sort_by(|a, b| a.0.cmp(&b.0));
        forces
    }

    /// Point-in-time copy of the diagnostic counters
    pub fn diagnostics(&self) -> DiagnosticsSnapshot {
        let forced = self
            .shared
            .forces
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len();
        self.shared.counters.snapshot(
            &self.shared.config.id,
            self.run_mode(),
            self.shared.config.scan_cycle_ms,
            forced,
        )
    }

    /// Zero the monotonic counters
    pub fn reset_diagnostics(&self) {
        debug!("Controller {} diagnostics reset", self.shared.config.id);
        self.shared.counters.reset();
    }

    /// Sequence number of the most recent completed scan
    pub fn last_scan_sequence(&self) -> u64 {
        self.shared.last_sequence.load(Ordering::Acquire)
    }

    /// Read a sensor owned by this controller
    pub async fn read(&self, sensor_id: &str) -> Result<TagReading, ControllerError> {
        let mode = self.run_mode();
        if mode.is_scanning() {
            if let Some(entry) = self.shared.force_entry(sensor_id) {
                return Ok(self.shared.forced_reading(sensor_id, entry, mode));
            }
        }

        let seen_sequence = self.last_scan_sequence();
        let buffer = Arc::clone(&self.buffer).lock_owned().await;

        // The mode may have changed while an in-flight scan held the image
        let mode = self.run_mode();
        if let Some(quality) = mode.imposed_quality() {
            return Ok(self.shared.held_reading(&buffer, sensor_id, quality, mode));
        }

        let scanned_while_waiting = buffer.sequence() > seen_sequence;
        let fresh = (scanned_while_waiting || buffer.is_fresh(self.shared.config.scan_cycle()))
            && !self.shared.image_invalidated.load(Ordering::Acquire);
        if mode == RunMode::Run && fresh {
            return Ok(self.shared.image_reading(&buffer, sensor_id, mode));
        }

        let startup = mode == RunMode::Startup;
        let shared = Arc::clone(&self.shared);
        let sensor_id = sensor_id.to_string();
        let task =
            tokio::spawn(async move { shared.scan_and_read(buffer, &sensor_id, startup).await });

        task.await.map_err(|e| ControllerError::ScanAborted {
            controller: self.shared.config.id.clone(),
            reason: e.to_string(),
        })
    }

    fn ensure_forcing_supported(&self) -> Result<(), ControllerError> {
        if self.shared.config.supports_forcing {
            Ok(())
        } else {
            Err(ControllerError::UnsupportedOperation {
                controller: self.shared.config.id.clone(),
                model: format!("{} {}", self.shared.config.vendor, self.shared.config.model),
            })
        }
    }
}

impl Shared {
    fn run_mode(&self) -> RunMode {
        *self.run_mode.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn emit(&self, event: PlcEvent) {
        // No subscribers is not an error
        let _ = self.events.send(event);
    }

    fn force_entry(&self, sensor_id: &str) -> Option<ForceEntry> {
        self.forces
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(sensor_id)
            .copied()
    }

    fn forced_ids(&self) -> HashSet<String> {
        self.forces
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect()
    }

    /// Move from `Startup` to `Run` unless an operator changed the mode meanwhile
    fn finish_startup(&self) -> RunMode {
        let mut mode = self.run_mode.write().unwrap_or_else(PoisonError::into_inner);
        if *mode == RunMode::Startup {
            *mode = RunMode::Run;
            info!("Controller {} entered Run after first scan", self.config.id);
            self.emit(PlcEvent::RunModeChanged {
                controller_id: self.config.id.clone(),
                from: RunMode::Startup,
                to: RunMode::Run,
            });
        }
        *mode
    }

    async fn scan_and_read(
        &self,
        mut buffer: OwnedMutexGuard<ScanBuffer>,
        sensor_id: &str,
        startup: bool,
    ) -> TagReading {
        self.scan(&mut buffer, startup).await;

        let mode = if startup {
            self.finish_startup()
        } else {
            self.run_mode()
        };
        self.image_reading(&buffer, sensor_id, mode)
    }

    /// Perform one scan of every sensor in the controller's namespaces
    ///
    /// The startup scan only establishes the image and skips fault injection.
    async fn scan(&self, buffer: &mut ScanBuffer, startup: bool) {
        self.image_invalidated.store(false, Ordering::Release);
        let captured_at = Instant::now();
        let timestamp_utc_ms = now_utc_ms();

        let mut batch: HashMap<String, RawValue> = HashMap::new();
        for namespace in &self.config.namespaces {
            batch.extend(self.source.current_values(namespace));
        }

        let jitter_ms = if self.config.jitter_ms > 0 {
            buffer.rng.gen_range(0..=self.config.jitter_ms)
        } else {
            0
        };
        let cost = self.config.processing(jitter_ms);
        if !cost.is_zero() {
            tokio::time::sleep(cost).await;
        }
        let overrun = cost > self.config.scan_cycle();

        // Sensors that stopped reporting stay in the image as disconnected.
        // Sorted so a seeded random source gives reproducible scans.
        let ids: BTreeSet<String> = batch
            .keys()
            .chain(buffer.sensor_ids())
            .cloned()
            .collect();
        let forced = self.forced_ids();

        let mut entries = Vec::with_capacity(ids.len());
        let (mut comm_errors, mut sensor_errors) = (0u64, 0u64);
        for id in ids {
            let raw = batch.get(&id).copied();
            let faults = if startup || forced.contains(&id) {
                &FaultProfile::NONE
            } else {
                &self.config.faults
            };

            let assessment = assess(&mut buffer.rng, faults, raw);
            match assessment.outcome {
                Outcome::Healthy => {}
                Outcome::CommError => comm_errors += 1,
                Outcome::SensorError => sensor_errors += 1,
            }

            let value = raw.or_else(|| buffer.last_value(&id)).unwrap_or_default();
            entries.push((id, value, assessment.quality));
        }

        let sensor_count = entries.len();
        let sequence = buffer.commit(entries, captured_at, timestamp_utc_ms, startup);
        self.last_sequence.store(sequence, Ordering::Release);
        self.counters.record_scan(overrun, comm_errors, sensor_errors);

        debug!(
            "Controller {} scan #{} complete: {} sensors in {:?}",
            self.config.id,
            sequence,
            sensor_count,
            captured_at.elapsed()
        );
        if comm_errors > 0 {
            warn!(
                "Controller {} scan #{}: {} sensors lost communication",
                self.config.id, sequence, comm_errors
            );
        }
        if overrun {
            warn!(
                "Controller {} scan #{} overran: {}ms against a {}ms cycle",
                self.config.id,
                sequence,
                cost.as_millis(),
                self.config.scan_cycle_ms
            );
            self.emit(PlcEvent::ScanOverrun {
                controller_id: self.config.id.clone(),
                sequence,
                elapsed_ms: u64::try_from(cost.as_millis()).unwrap_or(u64::MAX),
                scan_cycle_ms: self.config.scan_cycle_ms,
            });
        }
    }

    fn reading(
        &self,
        sensor_id: &str,
        snapshot: ScanSnapshot,
        forced: bool,
        run_mode: RunMode,
    ) -> TagReading {
        TagReading {
            sensor_id: sensor_id.to_string(),
            value: snapshot.value,
            quality: snapshot.quality,
            quality_code: snapshot.quality.code(),
            timestamp_utc_ms: snapshot.timestamp_utc_ms,
            scan_sequence: snapshot.sequence,
            forced,
            controller_id: self.config.id.clone(),
            run_mode,
        }
    }

    fn forced_reading(&self, sensor_id: &str, entry: ForceEntry, mode: RunMode) -> TagReading {
        let snapshot = ScanSnapshot {
            value: entry.value,
            quality: QualityCode::GoodLocalOverride,
            timestamp_utc_ms: now_utc_ms(),
            sequence: self.last_sequence.load(Ordering::Acquire),
        };
        self.reading(sensor_id, snapshot, true, mode)
    }

    /// Reading from the current image without scanning
    ///
    /// Good values from the startup image read as `Uncertain` for as long as
    /// that image is served. A sensor the image has never held reads as
    /// disconnected without counting a comm error, since no scan covered it.
    fn image_reading(&self, buffer: &ScanBuffer, sensor_id: &str, mode: RunMode) -> TagReading {
        let mut snapshot = buffer.get(sensor_id).copied().unwrap_or(ScanSnapshot {
            value: RawValue::default(),
            quality: QualityCode::BadNotConnected,
            timestamp_utc_ms: buffer.timestamp_utc_ms(),
            sequence: buffer.sequence(),
        });
        if buffer.is_startup_image() && snapshot.quality.is_good() {
            snapshot.quality = QualityCode::Uncertain;
        }
        self.reading(sensor_id, snapshot, false, mode)
    }

    /// Last known value under a quality imposed by the run mode
    fn held_reading(
        &self,
        buffer: &ScanBuffer,
        sensor_id: &str,
        quality: QualityCode,
        mode: RunMode,
    ) -> TagReading {
        let (value, timestamp_utc_ms) = match buffer.get(sensor_id) {
            Some(snapshot) => (snapshot.value, snapshot.timestamp_utc_ms),
            None => (RawValue::default(), now_utc_ms()),
        };
        let snapshot = ScanSnapshot {
            value,
            quality,
            timestamp_utc_ms,
            sequence: buffer.sequence(),
        };
        self.reading(sensor_id, snapshot, false, mode)
    }
}

fn now_utc_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
