//! Vault solver configuration
//!
//! Settings loading, validation and startup logging for the solver engine.

pub mod configurable_value;
pub mod loader;
pub mod settings;
pub mod startup_logger;

pub use configurable_value::{ConfigurableValue, ConfigurableValueError, ValueType};
pub use loader::{load_config, load_config_from, ConfigLoadError, ENV_PREFIX};
pub use settings::{
	ConfigValidationError, ExecutionSettings, LogFormat, LoggingSettings, PrioritySettings,
	SecuritySettings, Settings, SolverSettings,
};
pub use startup_logger::{log_engine_info, log_engine_ready};
