//! Configuration settings structures

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;
use std::time::Duration;

use vs_types::{
	BackendConfig, ChainContracts, ContractBook, SecretString, SolverCategory, SolverId,
};

use crate::configurable_value::{ConfigurableValue, ConfigurableValueError};

/// Main engine settings
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Settings {
	/// Keyed by solver id (`aggregator-a` or `aggregator_a`)
	pub solvers: HashMap<String, SolverSettings>,
	pub priorities: PrioritySettings,
	/// Keyed by chain id
	pub contracts: HashMap<String, ChainContracts>,
	pub execution: ExecutionSettings,
	pub logging: LoggingSettings,
	pub security: SecuritySettings,
}

/// One solver backend
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct SolverSettings {
	pub enabled: bool,
	pub endpoint: Option<String>,
	pub timeout_ms: u64,
	pub headers: Option<HashMap<String, String>>,
	pub api_key: Option<ConfigurableValue>,
	/// Overrides `execution.slippage_bps` for this solver
	pub slippage_bps: Option<u32>,
}

impl Default for SolverSettings {
	fn default() -> Self {
		Self {
			enabled: true,
			endpoint: None,
			timeout_ms: BackendConfig::DEFAULT_TIMEOUT_MS,
			headers: None,
			api_key: None,
			slippage_bps: None,
		}
	}
}

/// Fallback order inside the categories with more than one member
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct PrioritySettings {
	pub aggregator: Vec<SolverId>,
	pub settlement: Vec<SolverId>,
}

impl Default for PrioritySettings {
	fn default() -> Self {
		Self {
			aggregator: vec![SolverId::AggregatorA, SolverId::AggregatorB],
			settlement: vec![SolverId::SettlementSwap],
		}
	}
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct ExecutionSettings {
	/// Delay before a terminal transaction status falls back to idle
	pub status_reset_ms: u64,
	pub settlement_poll_interval_ms: u64,
	pub settlement_max_polls: u32,
	pub slippage_bps: u32,
}

impl Default for ExecutionSettings {
	fn default() -> Self {
		Self {
			status_reset_ms: 3_000,
			settlement_poll_interval_ms: 2_000,
			settlement_max_polls: 90,
			slippage_bps: BackendConfig::DEFAULT_SLIPPAGE_BPS,
		}
	}
}

/// Logging configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct LoggingSettings {
	pub level: String,
	pub format: LogFormat,
	pub structured: bool,
}

impl Default for LoggingSettings {
	fn default() -> Self {
		Self {
			level: "info".to_string(),
			format: LogFormat::Pretty,
			structured: false,
		}
	}
}

/// Log format options
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
	Json,
	Pretty,
	Compact,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(default)]
pub struct SecuritySettings {
	/// Key for HMAC request hashes; plain SHA-256 when absent
	pub request_hash_key: Option<ConfigurableValue>,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
	#[error("Unknown solver '{0}' in configuration")]
	UnknownSolver(String),

	#[error("Invalid chain id '{0}' in contracts")]
	InvalidChainId(String),

	#[error("Solver {solver} cannot be listed in the {category} priority list")]
	PriorityCategory {
		solver: SolverId,
		category: &'static str,
	},

	#[error("Solver {0} has a zero timeout")]
	ZeroTimeout(SolverId),

	#[error("Solver {0} is enabled but has no endpoint")]
	MissingEndpoint(SolverId),

	#[error("Slippage of {0} bps exceeds 10000")]
	SlippageOutOfRange(u32),

	#[error("Failed to resolve secret: {0}")]
	Secret(#[from] ConfigurableValueError),
}

fn parse_solver_key(key: &str) -> Result<SolverId, ConfigValidationError> {
	match SolverId::from_str(&key.replace('_', "-")) {
		Ok(SolverId::None) | Err(_) => Err(ConfigValidationError::UnknownSolver(key.to_string())),
		Ok(id) => Ok(id),
	}
}

impl Settings {
	pub fn validate(&self) -> Result<(), ConfigValidationError> {
		for (key, solver) in &self.solvers {
			let id = parse_solver_key(key)?;
			if solver.timeout_ms == 0 {
				return Err(ConfigValidationError::ZeroTimeout(id));
			}
			if solver.enabled && id.is_http_backed() && solver.endpoint.is_none() {
				return Err(ConfigValidationError::MissingEndpoint(id));
			}
			if let Some(bps) = solver.slippage_bps.filter(|bps| *bps > 10_000) {
				return Err(ConfigValidationError::SlippageOutOfRange(bps));
			}
		}

		let lists = [
			(&self.priorities.aggregator, SolverCategory::Aggregator, "aggregator"),
			(&self.priorities.settlement, SolverCategory::Settlement, "settlement"),
		];
		for (list, expected, category) in lists {
			if let Some(solver) = list.iter().find(|id| id.category() != expected) {
				return Err(ConfigValidationError::PriorityCategory {
					solver: *solver,
					category,
				});
			}
		}

		if self.execution.slippage_bps > 10_000 {
			return Err(ConfigValidationError::SlippageOutOfRange(
				self.execution.slippage_bps,
			));
		}

		self.contract_book().map(|_| ())
	}

	/// Backend configuration for every routable solver
	///
	/// Direct solvers are enabled unless configured otherwise; HTTP-backed solvers
	/// need an entry with an endpoint.
	pub fn backend_configs(&self) -> Result<HashMap<SolverId, BackendConfig>, ConfigValidationError> {
		let mut configured = HashMap::new();
		for (key, solver) in &self.solvers {
			configured.insert(parse_solver_key(key)?, solver);
		}

		let mut configs = HashMap::new();
		for id in SolverId::ROUTABLE {
			let mut config = BackendConfig::new(id);
			config.slippage_bps = self.execution.slippage_bps;
			config.poll_interval_ms = self.execution.settlement_poll_interval_ms;
			config.max_polls = self.execution.settlement_max_polls;

			match configured.get(&id) {
				Some(solver) => {
					config.enabled = solver.enabled;
					config.endpoint = solver.endpoint.clone();
					config.timeout_ms = solver.timeout_ms;
					config.headers = solver.headers.clone();
					config.api_key = solver
						.api_key
						.as_ref()
						.map(ConfigurableValue::resolve_secret)
						.transpose()?;
					if let Some(bps) = solver.slippage_bps {
						config.slippage_bps = bps;
					}
				},
				None => config.enabled = !id.is_http_backed(),
			}
			configs.insert(id, config);
		}
		Ok(configs)
	}

	pub fn contract_book(&self) -> Result<ContractBook, ConfigValidationError> {
		let mut book = ContractBook::new();
		for (chain, contracts) in &self.contracts {
			let chain_id = chain
				.parse::<u64>()
				.map_err(|_| ConfigValidationError::InvalidChainId(chain.clone()))?;
			book.insert(chain_id, contracts.clone());
		}
		Ok(book)
	}

	pub fn request_hash_key(&self) -> Result<Option<SecretString>, ConfigurableValueError> {
		self.security
			.request_hash_key
			.as_ref()
			.map(ConfigurableValue::resolve_secret)
			.transpose()
	}

	pub fn status_reset(&self) -> Duration {
		Duration::from_millis(self.execution.status_reset_ms)
	}

	/// Configured solvers that are switched on, in routable order
	pub fn enabled_solvers(&self) -> Vec<SolverId> {
		self.backend_configs()
			.map(|configs| {
				SolverId::ROUTABLE
					.into_iter()
					.filter(|id| configs.get(id).is_some_and(|config| config.enabled))
					.collect()
			})
			.unwrap_or_default()
	}
}
