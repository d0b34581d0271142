use config::{Config, Environment, File};

use crate::config::AppConfig;
use crate::error::ConfigError;

impl AppConfig {
    /// Load configuration from `config/default.toml` (optional) with
    /// `COINPULSE__*` environment overrides, e.g.
    /// `COINPULSE__UPSTREAM__API_KEY` for the upstream credential.
    pub fn load() -> Result<Self, ConfigError> {
        let config = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(Environment::with_prefix("COINPULSE").separator("__"))
            .build()
            .map_err(|e| ConfigError(e.to_string()))?;

        config
            .try_deserialize()
            .map_err(|e| ConfigError(e.to_string()))
    }
}
