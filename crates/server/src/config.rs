//! Application environment settings.

use config::{Config, Environment};
use serde::{Deserialize, Deserializer};

use pipeline::{DEFAULT_PENALTY_WEIGHTS, LevelWeightAdjuster};

use crate::error::ConfigError;

/// Process configuration, read once at startup. The core pipeline only ever
/// sees values passed into `run`.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    // R2 / S3 settings
    #[serde(default)]
    pub r2_endpoint_url: String,
    #[serde(default)]
    pub r2_access_key_id: String,
    #[serde(default)]
    pub r2_secret_access_key: String,
    #[serde(default = "default_bucket_name")]
    pub r2_bucket_name: String,

    // Engine settings
    /// `None` disables the level adjuster entirely.
    #[serde(
        default = "default_penalty_weights",
        deserialize_with = "penalty_weights_from_json"
    )]
    pub penalty_weights: Option<Vec<f64>>,
    #[serde(default = "default_top_k")]
    pub default_top_k: usize,

    // Operational settings
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default = "default_callback_timeout")]
    pub callback_timeout_sec: u64,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_bucket_name() -> String {
    "lxp-recflow".to_string()
}

fn default_penalty_weights() -> Option<Vec<f64>> {
    Some(DEFAULT_PENALTY_WEIGHTS.to_vec())
}

fn default_top_k() -> usize {
    10
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_callback_timeout() -> u64 {
    30
}

fn default_port() -> u16 {
    8000
}

/// Environment variables are strings, so the weight vector arrives as a JSON
/// literal: an array of floats, or `null` to disable the adjuster.
fn penalty_weights_from_json<'de, D>(deserializer: D) -> Result<Option<Vec<f64>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    serde_json::from_str(&raw).map_err(serde::de::Error::custom)
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            r2_endpoint_url: String::new(),
            r2_access_key_id: String::new(),
            r2_secret_access_key: String::new(),
            r2_bucket_name: default_bucket_name(),
            penalty_weights: default_penalty_weights(),
            default_top_k: default_top_k(),
            log_level: default_log_level(),
            callback_timeout_sec: default_callback_timeout(),
            port: default_port(),
        }
    }
}

impl Settings {
    /// Read settings from the environment (`R2_ENDPOINT_URL`,
    /// `PENALTY_WEIGHTS`, `DEFAULT_TOP_K`, ...).
    ///
    /// `PENALTY_WEIGHTS` accepts a JSON array of floats; the JSON literal
    /// `null` disables the adjuster. A present-but-invalid value is fatal.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_source(Environment::default().try_parsing(true))
    }

    fn from_source(source: Environment) -> Result<Self, ConfigError> {
        let settings: Settings = Config::builder()
            .add_source(source)
            .build()
            .and_then(|config| config.try_deserialize())
            .map_err(|err| ConfigError::new("environment", err.to_string()))?;

        settings.validate()?;
        Ok(settings)
    }

    /// Validate settings
    fn validate(&self) -> Result<(), ConfigError> {
        if let Some(weights) = &self.penalty_weights {
            // Same validation the adjuster applies; fail at startup rather
            // than on the first request.
            LevelWeightAdjuster::new(weights.clone())
                .map_err(|err| ConfigError::new("PENALTY_WEIGHTS", err.to_string()))?;
        }
        if self.default_top_k == 0 {
            return Err(ConfigError::new("DEFAULT_TOP_K", "must be at least 1"));
        }
        Ok(())
    }
}
