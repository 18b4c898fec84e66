//! Configuration module

use std::env;
use std::path::PathBuf;

use certwatch_core::constants::{default_data_dir, ENV_DATA_DIR, ENV_SCHEMA_DIR};
use certwatch_core::{ConfigurationError, PipelineConfig};

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Server port
    pub port: u16,

    /// Directory holding the run log, anomaly log and snapshot
    pub data_dir: PathBuf,

    /// Schema override directory, bundled schemas when unset
    pub schema_dir: Option<PathBuf>,

    /// Window, alert factor and reference instant
    pub pipeline: PipelineConfig,

    /// Environment (development, production)
    pub environment: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigurationError> {
        Ok(Self {
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),

            data_dir: env::var_os(ENV_DATA_DIR)
                .map(PathBuf::from)
                .unwrap_or_else(default_data_dir),

            schema_dir: env::var_os(ENV_SCHEMA_DIR).map(PathBuf::from),

            pipeline: PipelineConfig::from_env()?,

            environment: env::var("ENVIRONMENT")
                .unwrap_or_else(|_| "development".to_string()),
        })
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}
