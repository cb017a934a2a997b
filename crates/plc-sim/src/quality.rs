//! Quality pipeline
//!
//! Decides the quality of one sensor in one fresh scan. The decision is a
//! pure function of the raw value, the fault profile and the random source
//! handed in, so a seeded generator gives reproducible results.

use plc_types::{FaultProfile, QualityCode, RawValue};
use rand::Rng;

/// Which error path, if any, produced the quality
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Healthy,
    /// Counts toward `comm_errors`
    CommError,
    /// Counts toward `sensor_errors`
    SensorError,
}

/// Result of assessing one sensor in one scan
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Assessment {
    pub quality: QualityCode,
    pub outcome: Outcome,
}

impl Assessment {
    fn new(quality: QualityCode, outcome: Outcome) -> Self {
        Self { quality, outcome }
    }
}

/// Assess a sensor's raw value
///
/// `raw` is `None` when the source did not report the sensor in this scan's
/// batch; that is a lost connection. Otherwise a communication trial runs
/// first, then a sensor trial, and finally a non-finite raw value is treated
/// as a failed sensor.
pub fn assess<R: Rng + ?Sized>(
    rng: &mut R,
    faults: &FaultProfile,
    raw: Option<RawValue>,
) -> Assessment {
    let Some(raw) = raw else {
        return Assessment::new(QualityCode::BadNotConnected, Outcome::CommError);
    };

    if rng.gen_bool(faults.comm_error_probability) {
        let quality = if rng.gen_bool(0.5) {
            QualityCode::BadNotConnected
        } else {
            QualityCode::BadDeviceFailure
        };
        return Assessment::new(quality, Outcome::CommError);
    }

    if rng.gen_bool(faults.quality_error_probability) {
        let quality = if rng.gen_bool(0.5) {
            QualityCode::UncertainSensorNotAccurate
        } else {
            QualityCode::BadSensorFailure
        };
        return Assessment::new(quality, Outcome::SensorError);
    }

    if !raw.is_finite() {
        return Assessment::new(QualityCode::BadSensorFailure, Outcome::SensorError);
    }

    Assessment::new(QualityCode::Good, Outcome::Healthy)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_no_faults_is_good() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..1_000 {
            let a = assess(&mut rng, &FaultProfile::NONE, Some(12.5));
            assert_eq!(a, Assessment::new(QualityCode::Good, Outcome::Healthy));
        }
    }

    #[test]
    fn test_missing_value_is_not_connected() {
        let mut rng = StdRng::seed_from_u64(7);
        let a = assess(&mut rng, &FaultProfile::NONE, None);
        assert_eq!(a.quality, QualityCode::BadNotConnected);
        assert_eq!(a.outcome, Outcome::CommError);
    }

    #[test]
    fn test_faulted_raw_value_is_sensor_failure() {
        let mut rng = StdRng::seed_from_u64(7);
        let a = assess(&mut rng, &FaultProfile::NONE, Some(f64::NAN));
        assert_eq!(a.quality, QualityCode::BadSensorFailure);
        assert_eq!(a.outcome, Outcome::SensorError);
    }

    #[test]
    fn test_certain_comm_error() {
        let mut rng = StdRng::seed_from_u64(1);
        let faults = FaultProfile::new(1.0, 1.0);
        for _ in 0..100 {
            let a = assess(&mut rng, &faults, Some(1.0));
            assert_eq!(a.outcome, Outcome::CommError);
            assert!(matches!(
                a.quality,
                QualityCode::BadNotConnected | QualityCode::BadDeviceFailure
            ));
        }
    }

    #[test]
    fn test_certain_sensor_error() {
        let mut rng = StdRng::seed_from_u64(1);
        let faults = FaultProfile::new(0.0, 1.0);
        let mut seen = std::collections::HashSet::new();
        for _ in 0..200 {
            let a = assess(&mut rng, &faults, Some(1.0));
            assert_eq!(a.outcome, Outcome::SensorError);
            seen.insert(a.quality);
        }
        assert!(seen.contains(&QualityCode::UncertainSensorNotAccurate));
        assert!(seen.contains(&QualityCode::BadSensorFailure));
        assert_eq!(seen.len(), 2);
    }

    #[test]
    fn test_error_rate_tracks_probability() {
        let mut rng = StdRng::seed_from_u64(42);
        let faults = FaultProfile::new(0.1, 0.0);
        let errors = (0..10_000)
            .filter(|_| assess(&mut rng, &faults, Some(1.0)).outcome == Outcome::CommError)
            .count();
        assert!((800..1_200).contains(&errors), "got {errors}");
    }

    proptest! {
        #[test]
        fn same_seed_same_assessments(seed: u64, p_comm in 0.0f64..=1.0, p_quality in 0.0f64..=1.0) {
            let faults = FaultProfile::new(p_comm, p_quality);
            let mut a = StdRng::seed_from_u64(seed);
            let mut b = StdRng::seed_from_u64(seed);
            for _ in 0..32 {
                prop_assert_eq!(
                    assess(&mut a, &faults, Some(3.0)),
                    assess(&mut b, &faults, Some(3.0))
                );
            }
        }

        #[test]
        fn healthy_outcome_is_always_good(seed: u64, raw in -1.0e9f64..1.0e9) {
            let mut rng = StdRng::seed_from_u64(seed);
            let a = assess(&mut rng, &FaultProfile::new(0.01, 0.01), Some(raw));
            match a.outcome {
                Outcome::Healthy => prop_assert_eq!(a.quality, QualityCode::Good),
                Outcome::CommError => prop_assert!(a.quality.is_bad()),
                Outcome::SensorError => prop_assert!(!a.quality.is_good()),
            }
        }
    }
}
