//! Vault Solver Library
//!
//! Solver orchestration for vault deposits, withdrawals and zaps: concurrent
//! quoting across solver backends with priority fallback, race-free session
//! publication and the approve/execute flow against the published solver.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

// Core domain types - the most commonly used types
pub use vs_types::{
	chrono,
	// External dependencies for convenience
	serde_json,
	BackendConfig,
	ContractBook,
	Quote,
	QuoteNotice,
	SolverBackend,
	SolverCategory,
	SolverError,
	SolverId,
	SolverResult,
	SolverSession,
	SwapRequest,
	SwapRequestBuilder,
	Token,
	TxReceipt,
	TxStatus,
	VaultInfo,
	VaultVersion,
	WalletProvider,
};

// Solver backends
pub use vs_solvers::{AllowanceCache, CategoryPriorities, ClientCache, SolverFactory, SolverRegistry};

// Service layer
pub use vs_service::{
	noop_status_handler, ExecutionCoordinator, QuoteOrchestrator, RequestHasher,
	RequestHasherTrait, StatusHandler,
};

// Config
pub use vs_config::{
	load_config, load_config_from, log_engine_info, log_engine_ready, ConfigLoadError,
	ConfigValidationError, ConfigurableValueError, LogFormat, LoggingSettings, PrioritySettings,
	Settings,
};

// Module aliases for advanced usage
pub mod models {
	pub use vs_types::*;
}

pub mod solvers {
	pub use vs_solvers::*;
}

pub mod service {
	pub use vs_service::*;
}

pub mod config {
	pub use vs_config::*;
}

pub mod mocks;

// Re-export external dependencies for custom backends
pub use alloy_primitives;
pub use async_trait;

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
	#[error("No wallet provider configured")]
	MissingWallet,

	#[error(transparent)]
	Config(#[from] ConfigLoadError),

	#[error("Invalid configuration: {0}")]
	Validation(#[from] ConfigValidationError),

	#[error("Failed to resolve secret: {0}")]
	Secret(#[from] ConfigurableValueError),

	#[error("Failed to build solver registry: {0}")]
	Registry(#[from] SolverError),

	#[error("Failed to initialize tracing: {0}")]
	Tracing(String),
}

/// Produces the backend a session routes through for one solver id
///
/// Called once at build and once per session. Backends keep a single route slot,
/// so returning a shared instance makes every session quote through that one slot.
pub type BackendConstructor = Arc<dyn Fn() -> Arc<dyn SolverBackend> + Send + Sync>;

/// Builder pattern for configuring the solver engine
#[derive(Default)]
pub struct SolverEngineBuilder {
	settings: Option<Settings>,
	wallet: Option<Arc<dyn WalletProvider>>,
	backends: Vec<BackendConstructor>,
	contracts: Option<ContractBook>,
	client_cache: Option<ClientCache>,
	hasher: Option<Arc<dyn RequestHasherTrait>>,
}

impl SolverEngineBuilder {
	pub fn new() -> Self {
		Self::default()
	}

	/// Builder seeded from `.env`, `config/config.*` and `VAULT_SOLVER__` overrides
	pub fn from_config() -> Result<Self, EngineError> {
		dotenvy::dotenv().ok();
		let settings = load_config()?;
		Ok(Self::new().with_settings(settings))
	}

	pub fn with_settings(mut self, settings: Settings) -> Self {
		self.settings = Some(settings);
		self
	}

	pub fn with_wallet(mut self, wallet: Arc<dyn WalletProvider>) -> Self {
		self.wallet = Some(wallet);
		self
	}

	/// Register a custom backend in place of the built-in one with the same id
	pub fn with_backend<F>(mut self, constructor: F) -> Self
	where
		F: Fn() -> Arc<dyn SolverBackend> + Send + Sync + 'static,
	{
		self.backends.push(Arc::new(constructor));
		self
	}

	/// Replace the contract addresses derived from settings
	pub fn with_contracts(mut self, contracts: ContractBook) -> Self {
		self.contracts = Some(contracts);
		self
	}

	pub fn with_client_cache(mut self, client_cache: ClientCache) -> Self {
		self.client_cache = Some(client_cache);
		self
	}

	pub fn with_hasher(mut self, hasher: Arc<dyn RequestHasherTrait>) -> Self {
		self.hasher = Some(hasher);
		self
	}

	pub fn settings(&self) -> Option<&Settings> {
		self.settings.as_ref()
	}

	pub fn build(self) -> Result<SolverEngine, EngineError> {
		let settings = self.settings.unwrap_or_default();
		settings.validate()?;
		let wallet = self.wallet.ok_or(EngineError::MissingWallet)?;

		log_engine_info(&settings);

		let contracts = match self.contracts {
			Some(contracts) => contracts,
			None => settings.contract_book()?,
		};
		let allowances = AllowanceCache::new();
		let factory = SolverFactory::new(
			wallet,
			Arc::new(contracts),
			allowances.clone(),
			self.client_cache
				.unwrap_or_else(vs_solvers::global_client_cache),
		);

		let hasher = match self.hasher {
			Some(hasher) => hasher,
			None => Arc::new(RequestHasher::new(settings.request_hash_key()?)),
		};

		let mut engine = SolverEngine {
			status_reset: settings.status_reset(),
			configs: settings.backend_configs()?,
			priorities: category_priorities(&settings.priorities),
			registry: Arc::new(SolverRegistry::default()),
			custom: self.backends,
			factory,
			allowances,
			hasher,
			settings,
		};
		let registry = engine.build_registry()?;
		info!("Registered {} solver backend(s)", registry.len());
		log_engine_ready(&registry.enabled_solvers());
		engine.registry = Arc::new(registry);

		Ok(engine)
	}
}

impl std::fmt::Debug for SolverEngineBuilder {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("SolverEngineBuilder")
			.field("settings", &self.settings.is_some())
			.field("wallet", &self.wallet.is_some())
			.field("backends", &self.backends.len())
			.finish()
	}
}

fn category_priorities(settings: &PrioritySettings) -> CategoryPriorities {
	CategoryPriorities {
		aggregator: settings.aggregator.clone(),
		settlement: settings.settlement.clone(),
	}
}

/// Shared caches and backend recipes; hands out independent quoting sessions
///
/// Every session gets its own registry of freshly constructed backends. Only the
/// allowance cache, the HTTP client cache and the hasher are shared.
pub struct SolverEngine {
	settings: Settings,
	factory: SolverFactory,
	configs: HashMap<SolverId, BackendConfig>,
	priorities: CategoryPriorities,
	custom: Vec<BackendConstructor>,
	/// Registry built at startup, used for introspection only
	registry: Arc<SolverRegistry>,
	allowances: AllowanceCache,
	hasher: Arc<dyn RequestHasherTrait>,
	status_reset: Duration,
}

impl SolverEngine {
	pub fn builder() -> SolverEngineBuilder {
		SolverEngineBuilder::new()
	}

	fn build_registry(&self) -> Result<SolverRegistry, EngineError> {
		let custom = self.custom.iter().map(|construct| construct()).collect();
		Ok(self
			.factory
			.build_registry(&self.configs, self.priorities.clone(), custom)?)
	}

	/// A fresh orchestrator and the coordinator bound to its published session
	pub fn session(&self) -> Result<(QuoteOrchestrator, ExecutionCoordinator), EngineError> {
		let registry = Arc::new(self.build_registry()?);
		let orchestrator = QuoteOrchestrator::with_hasher(registry.clone(), self.hasher.clone());
		let coordinator = ExecutionCoordinator::new(registry, orchestrator.subscribe())
			.with_status_reset(self.status_reset);
		Ok((orchestrator, coordinator))
	}

	pub fn registry(&self) -> &Arc<SolverRegistry> {
		&self.registry
	}

	pub fn allowances(&self) -> &AllowanceCache {
		&self.allowances
	}

	pub fn settings(&self) -> &Settings {
		&self.settings
	}

	pub fn enabled_solvers(&self) -> Vec<SolverId> {
		self.registry.enabled_solvers()
	}
}

impl std::fmt::Debug for SolverEngine {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("SolverEngine")
			.field("registry", &self.registry)
			.field("status_reset", &self.status_reset)
			.finish()
	}
}

/// Install the global tracing subscriber described by `logging`
///
/// `RUST_LOG` takes precedence over the configured level.
pub fn init_tracing(logging: &LoggingSettings) -> Result<(), EngineError> {
	let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
		.unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&logging.level));

	let result = match logging.format {
		LogFormat::Json => {
			let subscriber = tracing_subscriber::fmt().json().with_env_filter(env_filter);

			if logging.structured {
				subscriber.with_target(true).with_thread_ids(true).try_init()
			} else {
				subscriber.try_init()
			}
		},
		LogFormat::Pretty => {
			let subscriber = tracing_subscriber::fmt()
				.pretty()
				.with_env_filter(env_filter);

			if logging.structured {
				subscriber.with_target(true).with_thread_ids(true).try_init()
			} else {
				subscriber.try_init()
			}
		},
		LogFormat::Compact => {
			let subscriber = tracing_subscriber::fmt()
				.compact()
				.with_env_filter(env_filter);

			if logging.structured {
				subscriber.with_target(true).with_thread_ids(true).try_init()
			} else {
				subscriber.try_init()
			}
		},
	};
	result.map_err(|e| EngineError::Tracing(e.to_string()))?;

	info!(
		"Logging configuration applied: level={}, format={:?}, structured={}",
		logging.level, logging.format, logging.structured
	);
	Ok(())
}
