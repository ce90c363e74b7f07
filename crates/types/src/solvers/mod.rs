//! Solver identity, categories and per-backend runtime configuration

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::models::SecretString;

pub mod errors;
pub mod traits;

pub use errors::{SolverError, SolverResult};
pub use traits::SolverBackend;

/// Closed set of execution strategies the engine can route through
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SolverId {
	Vanilla,
	PartnerContract,
	InternalMigration,
	OptimismBooster,
	GaugeStakingBooster,
	JuicedStakingBooster,
	V3StakingBooster,
	AggregatorA,
	AggregatorB,
	SettlementSwap,
	/// Placeholder published when no solver produced an executable route
	None,
}

impl SolverId {
	/// Every routable solver, in declaration order (excludes `None`)
	pub const ROUTABLE: [SolverId; 10] = [
		SolverId::Vanilla,
		SolverId::PartnerContract,
		SolverId::InternalMigration,
		SolverId::OptimismBooster,
		SolverId::GaugeStakingBooster,
		SolverId::JuicedStakingBooster,
		SolverId::V3StakingBooster,
		SolverId::AggregatorA,
		SolverId::AggregatorB,
		SolverId::SettlementSwap,
	];

	pub fn as_str(&self) -> &'static str {
		match self {
			SolverId::Vanilla => "vanilla",
			SolverId::PartnerContract => "partner-contract",
			SolverId::InternalMigration => "internal-migration",
			SolverId::OptimismBooster => "optimism-booster",
			SolverId::GaugeStakingBooster => "gauge-staking-booster",
			SolverId::JuicedStakingBooster => "juiced-staking-booster",
			SolverId::V3StakingBooster => "v3-staking-booster",
			SolverId::AggregatorA => "aggregator-a",
			SolverId::AggregatorB => "aggregator-b",
			SolverId::SettlementSwap => "settlement-swap",
			SolverId::None => "none",
		}
	}

	/// Category the solver competes in when the orchestrator builds its candidate list
	pub fn category(&self) -> SolverCategory {
		match self {
			SolverId::AggregatorA | SolverId::AggregatorB => SolverCategory::Aggregator,
			SolverId::SettlementSwap => SolverCategory::Settlement,
			SolverId::None => SolverCategory::Unrouted,
			_ => SolverCategory::Direct,
		}
	}

	/// Whether quotes come from a third-party HTTP service
	pub fn is_http_backed(&self) -> bool {
		matches!(
			self.category(),
			SolverCategory::Aggregator | SolverCategory::Settlement
		)
	}
}

impl fmt::Display for SolverId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for SolverId {
	type Err = SolverError;

	fn from_str(value: &str) -> Result<Self, Self::Err> {
		SolverId::ROUTABLE
			.iter()
			.chain(std::iter::once(&SolverId::None))
			.find(|id| id.as_str().eq_ignore_ascii_case(value))
			.copied()
			.ok_or_else(|| SolverError::UnknownSolver(value.to_string()))
	}
}

/// Groups of solvers that can stand in for one another
///
/// Direct solvers (vault calls, migration, boosters) never fall back: each one is
/// a single-member category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SolverCategory {
	Direct,
	Aggregator,
	Settlement,
	Unrouted,
}

/// Runtime configuration handed to a backend at construction time
#[derive(Debug, Clone, PartialEq)]
pub struct BackendConfig {
	pub solver_id: SolverId,

	/// Administrative switch; a disabled backend never quotes
	pub enabled: bool,

	/// Base URL of the upstream quote service (HTTP backends only)
	pub endpoint: Option<String>,

	/// Per-request HTTP timeout in milliseconds
	pub timeout_ms: u64,

	pub headers: Option<HashMap<String, String>>,

	pub api_key: Option<SecretString>,

	/// Slippage tolerance applied to minimum-out amounts, in basis points
	pub slippage_bps: u32,

	/// Delay between settlement order status polls
	pub poll_interval_ms: u64,

	/// Number of status polls before a settlement order is given up on
	pub max_polls: u32,
}

impl BackendConfig {
	pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;
	pub const DEFAULT_SLIPPAGE_BPS: u32 = 100;

	/// Enabled configuration with defaults and no endpoint
	pub fn new(solver_id: SolverId) -> Self {
		Self {
			solver_id,
			enabled: true,
			endpoint: None,
			timeout_ms: Self::DEFAULT_TIMEOUT_MS,
			headers: None,
			api_key: None,
			slippage_bps: Self::DEFAULT_SLIPPAGE_BPS,
			poll_interval_ms: 2_000,
			max_polls: 90,
		}
	}

	pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
		self.endpoint = Some(endpoint.into());
		self
	}

	pub fn with_api_key(mut self, api_key: SecretString) -> Self {
		self.api_key = Some(api_key);
		self
	}

	pub fn disabled(mut self) -> Self {
		self.enabled = false;
		self
	}

	/// Endpoint with any trailing slash removed
	pub fn endpoint(&self) -> SolverResult<&str> {
		self.endpoint
			.as_deref()
			.map(|e| e.trim_end_matches('/'))
			.ok_or_else(|| SolverError::Configuration {
				solver_id: self.solver_id,
				reason: "missing endpoint".to_string(),
			})
	}
}
