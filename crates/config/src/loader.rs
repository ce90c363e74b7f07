//! Configuration loading utilities

use crate::settings::{ConfigValidationError, Settings};
use config::{Config, ConfigError, Environment, File};

/// Prefix of environment overrides, e.g. `VAULT_SOLVER__EXECUTION__STATUS_RESET_MS`
pub const ENV_PREFIX: &str = "VAULT_SOLVER";

#[derive(Debug, thiserror::Error)]
pub enum ConfigLoadError {
	#[error("Failed to load configuration: {0}")]
	Config(#[from] ConfigError),

	#[error("Invalid configuration: {0}")]
	Validation(#[from] ConfigValidationError),
}

/// Load `config/config.*` (optional) overlaid by `VAULT_SOLVER__` environment variables
pub fn load_config() -> Result<Settings, ConfigLoadError> {
	load_config_from("config/config")
}

/// Load from an explicit file stem, then validate
pub fn load_config_from(path: &str) -> Result<Settings, ConfigLoadError> {
	let settings: Settings = Config::builder()
		.add_source(File::with_name(path).required(false))
		.add_source(Environment::with_prefix(ENV_PREFIX).separator("__"))
		.build()?
		.try_deserialize()?;

	settings.validate()?;
	Ok(settings)
}
