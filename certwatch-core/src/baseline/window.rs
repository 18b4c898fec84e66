use std::collections::VecDeque;

use serde::Serialize;

/// Bounded, oldest-first sequence of recent elapsed values.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BaselineWindow {
    samples: VecDeque<u64>,
    capacity: usize,
}

impl BaselineWindow {
    /// `capacity` is clamped to at least one sample.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.samples.len() >= self.capacity
    }

    pub fn samples(&self) -> impl Iterator<Item = u64> + '_ {
        self.samples.iter().copied()
    }

    /// Arithmetic mean of the contents, `None` when empty
    pub fn mean(&self) -> Option<f64> {
        if self.samples.is_empty() {
            return None;
        }
        let sum: f64 = self.samples.iter().map(|&s| s as f64).sum();
        Some(sum / self.samples.len() as f64)
    }

    /// Only the tracker mutates a window.
    pub(super) fn push(&mut self, elapsed: u64) -> Option<u64> {
        let evicted = if self.is_full() {
            self.samples.pop_front()
        } else {
            None
        };
        self.samples.push_back(elapsed);
        evicted
    }
}
