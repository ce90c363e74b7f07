//! Builds the built-in backends from their configuration

use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

use vs_types::{BackendConfig, ContractBook, SolverBackend, SolverId, SolverResult, WalletProvider};

use crate::aggregator_a::AggregatorAApi;
use crate::aggregator_b::AggregatorBApi;
use crate::allowance_cache::AllowanceCache;
use crate::client_cache::ClientCache;
use crate::context::BackendContext;
use crate::direct::DirectSolver;
use crate::migration::MigrationSolver;
use crate::registry::{CategoryPriorities, SolverRegistry};
use crate::settlement::SettlementSolver;
use crate::staking::{BoosterKind, StakingSolver};
use crate::zap::ZapSolver;

/// Shared dependencies every built-in backend is constructed with
#[derive(Debug, Clone)]
pub struct SolverFactory {
	wallet: Arc<dyn WalletProvider>,
	contracts: Arc<ContractBook>,
	allowances: AllowanceCache,
	clients: ClientCache,
}

impl SolverFactory {
	pub fn new(
		wallet: Arc<dyn WalletProvider>,
		contracts: Arc<ContractBook>,
		allowances: AllowanceCache,
		clients: ClientCache,
	) -> Self {
		Self {
			wallet,
			contracts,
			allowances,
			clients,
		}
	}

	fn context(&self, config: BackendConfig) -> BackendContext {
		BackendContext::new(
			config,
			self.wallet.clone(),
			self.allowances.clone(),
			self.contracts.clone(),
		)
	}

	/// Backend for `config.solver_id`; `None` for the placeholder id
	pub fn create(&self, config: BackendConfig) -> Option<Arc<dyn SolverBackend>> {
		let id = config.solver_id;
		let ctx = self.context(config);
		let backend: Arc<dyn SolverBackend> = match id {
			SolverId::Vanilla => Arc::new(DirectSolver::vanilla(ctx)),
			SolverId::PartnerContract => Arc::new(DirectSolver::partner(ctx)),
			SolverId::InternalMigration => Arc::new(MigrationSolver::new(ctx)),
			SolverId::OptimismBooster
			| SolverId::GaugeStakingBooster
			| SolverId::JuicedStakingBooster
			| SolverId::V3StakingBooster => {
				let kind = BoosterKind::from_solver_id(id)?;
				Arc::new(StakingSolver::new(kind, ctx))
			},
			SolverId::AggregatorA => {
				Arc::new(ZapSolver::with_cache(AggregatorAApi, ctx, self.clients.clone()))
			},
			SolverId::AggregatorB => {
				Arc::new(ZapSolver::with_cache(AggregatorBApi, ctx, self.clients.clone()))
			},
			SolverId::SettlementSwap => {
				Arc::new(SettlementSolver::with_cache(ctx, self.clients.clone()))
			},
			SolverId::None => return None,
		};
		Some(backend)
	}

	/// Registry holding `custom` backends plus a built-in one for every other
	/// routable solver
	///
	/// Solvers missing from `configs` get `BackendConfig::new` defaults.
	pub fn build_registry(
		&self,
		configs: &HashMap<SolverId, BackendConfig>,
		priorities: CategoryPriorities,
		custom: Vec<Arc<dyn SolverBackend>>,
	) -> SolverResult<SolverRegistry> {
		let mut registry = SolverRegistry::new(priorities);
		for backend in custom {
			debug!("Registering custom backend for {}", backend.id());
			registry.register(backend)?;
		}

		for id in SolverId::ROUTABLE {
			if registry.contains(id) {
				continue;
			}
			let config = configs
				.get(&id)
				.cloned()
				.unwrap_or_else(|| BackendConfig::new(id));
			if let Some(backend) = self.create(config) {
				registry.register(backend)?;
			}
		}
		Ok(registry)
	}
}
