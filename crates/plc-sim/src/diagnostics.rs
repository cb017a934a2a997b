//! Diagnostic counters
//!
//! Counters are plain atomics so that taking a snapshot never waits for an
//! in-flight scan.

use std::sync::atomic::{AtomicU64, Ordering};

use plc_types::RunMode;
use serde::Serialize;

/// Monotonic per-controller counters
#[derive(Debug, Default)]
pub(crate) struct Counters {
    total_scans: AtomicU64,
    scan_overruns: AtomicU64,
    comm_errors: AtomicU64,
    sensor_errors: AtomicU64,
}

impl Counters {
    pub(crate) fn record_scan(&self, overrun: bool, comm_errors: u64, sensor_errors: u64) {
        self.total_scans.fetch_add(1, Ordering::Relaxed);
        if overrun {
            self.scan_overruns.fetch_add(1, Ordering::Relaxed);
        }
        if comm_errors > 0 {
            self.comm_errors.fetch_add(comm_errors, Ordering::Relaxed);
        }
        if sensor_errors > 0 {
            self.sensor_errors.fetch_add(sensor_errors, Ordering::Relaxed);
        }
    }

    pub(crate) fn reset(&self) {
        self.total_scans.store(0, Ordering::Relaxed);
        self.scan_overruns.store(0, Ordering::Relaxed);
        self.comm_errors.store(0, Ordering::Relaxed);
        self.sensor_errors.store(0, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(
        &self,
        controller_id: &str,
        run_mode: RunMode,
        scan_cycle_ms: u64,
        forced_values_count: usize,
    ) -> DiagnosticsSnapshot {
        DiagnosticsSnapshot {
            controller_id: controller_id.to_string(),
            run_mode,
            scan_cycle_ms,
            total_scans: self.total_scans.load(Ordering::Relaxed),
            scan_overruns: self.scan_overruns.load(Ordering::Relaxed),
            comm_errors: self.comm_errors.load(Ordering::Relaxed),
            sensor_errors: self.sensor_errors.load(Ordering::Relaxed),
            forced_values_count,
        }
    }
}

/// Point-in-time copy of a controller's diagnostics
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiagnosticsSnapshot {
    pub controller_id: String,
    pub run_mode: RunMode,
    pub scan_cycle_ms: u64,
    /// Completed scans
    pub total_scans: u64,
    /// Scans whose processing time exceeded the scan cycle
    pub scan_overruns: u64,
    /// Sensors assigned a communication-error quality
    pub comm_errors: u64,
    /// Sensors assigned a sensor-error quality
    pub sensor_errors: u64,
    /// Active forced values
    pub forced_values_count: usize,
}
