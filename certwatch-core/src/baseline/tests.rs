use super::{BaselineTracker, BaselineWindow};

#[test]
fn test_empty_window_has_no_baseline() {
    let window = BaselineWindow::new(5);
    assert!(window.is_empty());
    assert_eq!(window.mean(), None);
}

#[test]
fn test_observe_returns_baseline_before_update() {
    let mut tracker = BaselineTracker::new(2);

    assert_eq!(tracker.observe(10), None);
    assert_eq!(tracker.observe(11), Some(10.0));
    assert_eq!(tracker.observe(50), Some(10.5));

    // 10 was evicted, window now holds [11, 50]
    assert_eq!(tracker.baseline(), Some(30.5));
}

#[test]
fn test_window_evicts_oldest_first() {
    let mut tracker = BaselineTracker::new(3);
    for elapsed in [1, 2, 3, 4, 5] {
        tracker.observe(elapsed);
    }

    let samples: Vec<u64> = tracker.window().samples().collect();
    assert_eq!(samples, vec![3, 4, 5]);
    assert!(tracker.window().is_full());
    assert_eq!(tracker.window().len(), 3);
}

#[test]
fn test_partial_window_uses_available_samples() {
    let mut tracker = BaselineTracker::new(5);
    tracker.observe(12);
    tracker.observe(8);
    assert_eq!(tracker.baseline(), Some(10.0));
}

#[test]
fn test_zero_capacity_is_clamped() {
    let window = BaselineWindow::new(0);
    assert_eq!(window.capacity(), 1);

    let mut tracker = BaselineTracker::from_window(window);
    tracker.observe(7);
    assert_eq!(tracker.observe(9), Some(7.0));
    assert_eq!(tracker.into_window().samples().collect::<Vec<_>>(), vec![9]);
}

#[test]
fn test_large_values_do_not_overflow() {
    let mut tracker = BaselineTracker::new(2);
    tracker.observe(u64::MAX);
    tracker.observe(u64::MAX);
    let baseline = tracker.baseline().unwrap();
    assert!(baseline.is_finite());
    assert!(baseline > 1.0e19);
}
