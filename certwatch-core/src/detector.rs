//! Anomaly Detector
//!
//! Single deterministic ratio test: a run is anomalous when
//! `elapsed / baseline >= alert_factor`.

use crate::model::{AnomalyRecord, VerificationRun};

/// Classify `run` against the baseline that was in effect before it.
///
/// No anomaly is possible without a baseline (cold start) or when the
/// baseline is zero.
pub fn classify(
    run: &VerificationRun,
    baseline: Option<f64>,
    alert_factor: f64,
) -> Option<AnomalyRecord> {
    let baseline = baseline.filter(|b| *b > 0.0)?;
    let factor = run.elapsed as f64 / baseline;

    if factor >= alert_factor {
        log::warn!(
            "Anomalous run at {}: elapsed={} baseline={:.3} factor={:.3} (alert at {})",
            run.timestamp,
            run.elapsed,
            baseline,
            factor,
            alert_factor
        );
        Some(AnomalyRecord::for_run(run, factor))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::Timestamp;

    fn run(elapsed: u64) -> VerificationRun {
        let ts = Timestamp::from_epoch_seconds(1_735_689_600).unwrap();
        VerificationRun::new(ts, 10, 10, 0, elapsed)
    }

    #[test]
    fn test_no_baseline_no_anomaly() {
        assert!(classify(&run(1_000), None, 2.0).is_none());
    }

    #[test]
    fn test_zero_baseline_is_not_divided() {
        assert!(classify(&run(50), Some(0.0), 2.0).is_none());
        assert!(classify(&run(50), Some(f64::NAN), 2.0).is_none());
    }

    #[test]
    fn test_below_threshold() {
        assert!(classify(&run(11), Some(10.0), 2.0).is_none());
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let anomaly = classify(&run(20), Some(10.0), 2.0).unwrap();
        assert_eq!(anomaly.factor, 2.0);
        assert_eq!(anomaly.elapsed, 20);
    }

    #[test]
    fn test_anomaly_copies_run_fields() {
        let r = run(50);
        let anomaly = classify(&r, Some(10.5), 2.0).unwrap();
        assert_eq!(anomaly.timestamp, r.timestamp);
        assert_eq!(anomaly.elapsed, 50);
        assert!((anomaly.factor - 50.0 / 10.5).abs() < 1e-12);
    }

    #[test]
    fn test_classify_is_idempotent() {
        let r = run(33);
        assert_eq!(classify(&r, Some(11.0), 2.0), classify(&r, Some(11.0), 2.0));
    }
}
