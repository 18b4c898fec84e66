//! Pipeline configuration

use std::sync::Arc;

use serde::Serialize;

use crate::clock::{Clock, FixedClock, SystemClock, Timestamp};
use crate::constants::{
    DEFAULT_ALERT_FACTOR, DEFAULT_WINDOW, ENV_ALERT_FACTOR, ENV_SOURCE_DATE_EPOCH, ENV_WINDOW,
};
use crate::error::ConfigurationError;

/// Detection settings in effect for a pipeline
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PipelineConfig {
    /// Number of prior runs averaged into the baseline
    pub window: usize,

    /// Elapsed/baseline ratio at or above which a run is anomalous
    pub alert_factor: f64,

    /// Pinned "now" for reproducible output (overrides the wall clock)
    pub reference_instant: Option<Timestamp>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            window: DEFAULT_WINDOW,
            alert_factor: DEFAULT_ALERT_FACTOR,
            reference_instant: None,
        }
    }
}

impl PipelineConfig {
    pub fn new(window: usize, alert_factor: f64) -> Result<Self, ConfigurationError> {
        let config = Self {
            window,
            alert_factor,
            reference_instant: None,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn with_reference_instant(mut self, instant: Timestamp) -> Self {
        self.reference_instant = Some(instant);
        self
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigurationError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    /// Unset or empty keys fall back to defaults; anything else must parse.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigurationError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let mut config = Self::default();

        if let Some(raw) = get(ENV_WINDOW) {
            config.window = match raw.parse::<i64>() {
                Ok(n) if n <= 0 => return Err(not_positive(ENV_WINDOW, &raw)),
                Ok(n) => usize::try_from(n).map_err(|_| unparsable(ENV_WINDOW, &raw))?,
                Err(_) => return Err(unparsable(ENV_WINDOW, &raw)),
            };
        }

        if let Some(raw) = get(ENV_ALERT_FACTOR) {
            config.alert_factor = raw.parse().map_err(|_| unparsable(ENV_ALERT_FACTOR, &raw))?;
        }

        if let Some(raw) = get(ENV_SOURCE_DATE_EPOCH) {
            let secs: i64 = raw.parse().map_err(|_| unparsable(ENV_SOURCE_DATE_EPOCH, &raw))?;
            // 0 keeps the wall clock, like an unset variable
            if secs < 0 {
                return Err(not_positive(ENV_SOURCE_DATE_EPOCH, &raw));
            }
            if secs > 0 {
                let instant = Timestamp::from_epoch_seconds(secs)
                    .ok_or_else(|| unparsable(ENV_SOURCE_DATE_EPOCH, &raw))?;
                config.reference_instant = Some(instant);
            }
        }

        config.validate()?;
        log::info!(
            "Pipeline config: window={}, alert_factor={}, reference_instant={}",
            config.window,
            config.alert_factor,
            config
                .reference_instant
                .map(|t| t.to_string())
                .unwrap_or_else(|| "wall clock".to_string())
        );
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.window == 0 {
            return Err(not_positive("window", "0"));
        }
        if !self.alert_factor.is_finite() || self.alert_factor <= 0.0 {
            return Err(not_positive("alert_factor", &self.alert_factor.to_string()));
        }
        Ok(())
    }

    /// Time source honoring `reference_instant`
    pub fn clock(&self) -> Arc<dyn Clock> {
        match self.reference_instant {
            Some(instant) => Arc::new(FixedClock::new(instant)),
            None => Arc::new(SystemClock),
        }
    }
}

fn not_positive(setting: &'static str, value: &str) -> ConfigurationError {
    ConfigurationError::NotPositive {
        setting,
        value: value.to_string(),
    }
}

fn unparsable(setting: &'static str, value: &str) -> ConfigurationError {
    ConfigurationError::Unparsable {
        setting,
        value: value.to_string(),
    }
}
