//! Baseline Module - Rolling Elapsed-Time Baseline
//!
//! Keeps the last `window` elapsed values and reports their mean.
//!
//! # Architecture
//! - `window.rs`: `BaselineWindow`, the bounded sample buffer
//! - `BaselineTracker`: the only writer of a window
//!
//! # Ordering
//! `observe` reports the baseline *before* the new sample is added, so a run
//! is never compared against a mean that already contains itself.

pub mod window;
#[cfg(test)]
mod tests;

pub use window::BaselineWindow;

/// Owns one [`BaselineWindow`] and serializes reads-then-writes on it.
///
/// Not `Sync`-safe by itself: callers sharing a tracker must hold a lock for
/// the whole `observe` call (see `Pipeline`).
#[derive(Debug, Clone)]
pub struct BaselineTracker {
    window: BaselineWindow,
}

impl BaselineTracker {
    pub fn new(capacity: usize) -> Self {
        Self {
            window: BaselineWindow::new(capacity),
        }
    }

    pub fn from_window(window: BaselineWindow) -> Self {
        Self { window }
    }

    /// Current baseline without touching the window
    pub fn baseline(&self) -> Option<f64> {
        self.window.mean()
    }

    /// Return the baseline over the current contents, then record `elapsed`,
    /// evicting the oldest sample if the window is full.
    pub fn observe(&mut self, elapsed: u64) -> Option<f64> {
        let before = self.window.mean();
        if let Some(evicted) = self.window.push(elapsed) {
            log::debug!("Baseline window full, evicted elapsed={}", evicted);
        }
        before
    }

    pub fn window(&self) -> &BaselineWindow {
        &self.window
    }

    pub fn into_window(self) -> BaselineWindow {
        self.window
    }
}
