//! Scan buffer (input image)
//!
//! Holds the snapshot of every sensor captured by the most recent scan. A
//! scan replaces the whole image at once, so every snapshot in the buffer
//! shares one sequence number and one timestamp. Age is measured from the
//! moment the raw values were captured, not from the end of processing.

use std::collections::HashMap;
use std::time::Duration;

use plc_types::{QualityCode, RawValue};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use tokio::time::Instant;

/// Cached value of one sensor from one scan
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScanSnapshot {
    pub value: RawValue,
    pub quality: QualityCode,
    pub timestamp_utc_ms: i64,
    pub sequence: u64,
}

/// The controller's input image plus the random source used to fill it
#[derive(Debug)]
pub(crate) struct ScanBuffer {
    snapshots: HashMap<String, ScanSnapshot>,
    captured_at: Option<Instant>,
    sequence: u64,
    /// Image came from the startup scan and is not yet trusted
    startup: bool,
    timestamp_utc_ms: i64,
    pub(crate) rng: StdRng,
}

impl ScanBuffer {
    pub(crate) fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            snapshots: HashMap::new(),
            captured_at: None,
            sequence: 0,
            startup: false,
            timestamp_utc_ms: 0,
            rng,
        }
    }

    /// Whether the current image was captured less than `cycle` ago
    pub(crate) fn is_fresh(&self, cycle: Duration) -> bool {
        self.captured_at
            .is_some_and(|captured| captured.elapsed() < cycle)
    }

    pub(crate) fn is_startup_image(&self) -> bool {
        self.startup
    }

    /// Sequence number of the most recent scan (0 before the first one)
    pub(crate) fn sequence(&self) -> u64 {
        self.sequence
    }

    pub(crate) fn timestamp_utc_ms(&self) -> i64 {
        self.timestamp_utc_ms
    }

    pub(crate) fn get(&self, sensor_id: &str) -> Option<&ScanSnapshot> {
        self.snapshots.get(sensor_id)
    }

    pub(crate) fn last_value(&self, sensor_id: &str) -> Option<RawValue> {
        self.snapshots.get(sensor_id).map(|s| s.value)
    }

    /// Sensors present in the current image
    pub(crate) fn sensor_ids(&self) -> impl Iterator<Item = &String> {
        self.snapshots.keys()
    }

    /// Replace the image with the results of a completed scan
    ///
    /// `captured_at` and `timestamp_utc_ms` describe when the raw batch was
    /// pulled. Returns the new sequence number.
    pub(crate) fn commit(
        &mut self,
        entries: Vec<(String, RawValue, QualityCode)>,
        captured_at: Instant,
        timestamp_utc_ms: i64,
        startup: bool,
    ) -> u64 {
        self.sequence += 1;
        self.timestamp_utc_ms = timestamp_utc_ms;
        self.captured_at = Some(captured_at);
        self.startup = startup;

        let sequence = self.sequence;
        self.snapshots = entries
            .into_iter()
            .map(|(id, value, quality)| {
                let snapshot = ScanSnapshot {
                    value,
                    quality,
                    timestamp_utc_ms,
                    sequence,
                };
                (id, snapshot)
            })
            .collect();
        sequence
    }
}
