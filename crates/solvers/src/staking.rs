//! Staking boosters: deposit-and-stake zaps and direct staking pools
//!
//! | kind     | input → output          | spender          | withdraw |
//! |----------|-------------------------|------------------|----------|
//! | Optimism | underlying → vault      | staking zap      | no       |
//! | Gauge    | vault share → gauge     | gauge            | redeem   |
//! | Juiced   | vault share → pool      | pool             | withdraw |
//! | V3       | underlying → V3 vault   | staking router   | no       |

use alloy_primitives::{Address, Bytes, U256};
use alloy_sol_types::SolCall;
use async_trait::async_trait;
use tracing::warn;

use vs_types::{
	Quote, SolverBackend, SolverError, SolverId, SolverResult, SwapRequest, TxReceipt, VaultVersion,
};

use crate::abi::{self, IGauge, IStakingRewards, IStakingRouter, IStakingZap};
use crate::context::BackendContext;
use crate::route_memory::RouteMemory;
use crate::vault;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoosterKind {
	Optimism,
	Gauge,
	Juiced,
	V3,
}

impl BoosterKind {
	pub fn solver_id(&self) -> SolverId {
		match self {
			BoosterKind::Optimism => SolverId::OptimismBooster,
			BoosterKind::Gauge => SolverId::GaugeStakingBooster,
			BoosterKind::Juiced => SolverId::JuicedStakingBooster,
			BoosterKind::V3 => SolverId::V3StakingBooster,
		}
	}

	pub fn from_solver_id(id: SolverId) -> Option<Self> {
		match id {
			SolverId::OptimismBooster => Some(BoosterKind::Optimism),
			SolverId::GaugeStakingBooster => Some(BoosterKind::Gauge),
			SolverId::JuicedStakingBooster => Some(BoosterKind::Juiced),
			SolverId::V3StakingBooster => Some(BoosterKind::V3),
			_ => None,
		}
	}

	/// Zap kinds take the underlying and only ever deposit
	fn is_zap(&self) -> bool {
		matches!(self, BoosterKind::Optimism | BoosterKind::V3)
	}
}

#[derive(Debug)]
pub struct StakingSolver {
	kind: BoosterKind,
	ctx: BackendContext,
	routes: RouteMemory<U256>,
}

impl StakingSolver {
	pub fn new(kind: BoosterKind, ctx: BackendContext) -> Self {
		Self {
			kind,
			ctx,
			routes: RouteMemory::new(),
		}
	}

	pub fn kind(&self) -> BoosterKind {
		self.kind
	}

	fn staking_pool(&self, request: &SwapRequest) -> SolverResult<Address> {
		request
			.staking_pool_address
			.filter(|address| !address.is_zero())
			.ok_or_else(|| SolverError::Configuration {
				solver_id: self.kind.solver_id(),
				reason: "request has no staking pool".to_string(),
			})
	}

	fn spender(&self, request: &SwapRequest) -> SolverResult<Address> {
		match self.kind {
			BoosterKind::Optimism => {
				self.ctx
					.contract(request.chain_id, "staking zap", |c| c.optimism_staking_zap)
			},
			BoosterKind::V3 => {
				self.ctx
					.contract(request.chain_id, "staking router", |c| c.v3_staking_router)
			},
			BoosterKind::Gauge | BoosterKind::Juiced => self.staking_pool(request),
		}
	}

	fn supports(&self, request: &SwapRequest) -> bool {
		if self.kind.is_zap() && !request.is_depositing {
			return false;
		}
		if self.kind == BoosterKind::V3 && request.version != VaultVersion::V3 {
			return false;
		}
		self.staking_pool(request).is_ok() && self.spender(request).is_ok()
	}

	async fn quote(&self, request: &SwapRequest) -> SolverResult<U256> {
		let amount = request.input_amount;
		match self.kind {
			BoosterKind::Optimism | BoosterKind::V3 => {
				vault::preview_deposit(
					&self.ctx,
					request.chain_id,
					request.output_token.address,
					request.version,
					amount,
					request.output_token.decimals,
				)
				.await
			},
			BoosterKind::Gauge => {
				let gauge = self.staking_pool(request)?;
				let data = if request.is_depositing {
					IGauge::previewDepositCall { assets: amount }.abi_encode()
				} else {
					IGauge::previewRedeemCall { shares: amount }.abi_encode()
				};
				self.ctx.read_uint(request.chain_id, gauge, data).await
			},
			BoosterKind::Juiced => Ok(rescale(
				amount,
				request.input_token.decimals,
				request.output_token.decimals,
			)),
		}
	}

	fn deposit_transaction(&self, request: &SwapRequest, owner: Address) -> SolverResult<(Address, Bytes)> {
		let amount = request.input_amount;
		let vault = request.vault_address();
		let to = self.spender(request)?;
		let data = match self.kind {
			BoosterKind::Optimism => IStakingZap::zapInCall { vault, amount }.abi_encode(),
			BoosterKind::V3 => IStakingRouter::depositAndStakeCall {
				vault,
				amount,
				receiver: owner,
			}
			.abi_encode(),
			BoosterKind::Gauge => IGauge::depositCall {
				assets: amount,
				receiver: owner,
			}
			.abi_encode(),
			BoosterKind::Juiced => IStakingRewards::stakeCall { amount }.abi_encode(),
		};
		Ok((to, data.into()))
	}
}

/// Move `amount` between decimal precisions
fn rescale(amount: U256, from_decimals: u8, to_decimals: u8) -> U256 {
	if from_decimals == to_decimals {
		amount
	} else if from_decimals < to_decimals {
		amount.saturating_mul(abi::unit(to_decimals - from_decimals))
	} else {
		amount / abi::unit(from_decimals - to_decimals)
	}
}

#[async_trait]
impl SolverBackend for StakingSolver {
	fn id(&self) -> SolverId {
		self.kind.solver_id()
	}

	fn is_enabled(&self) -> bool {
		self.ctx.config.enabled
	}

	async fn init(&self, request: &SwapRequest) -> Option<Quote> {
		if !self.ctx.can_quote(request) || !self.supports(request) {
			return None;
		}

		let ticket = self.routes.issue();
		match self.quote(request).await {
			Ok(raw) => {
				self.routes.store(ticket, request, raw);
				Some(Quote::new(raw, request.output_token.decimals, self.id()))
			},
			Err(e) => {
				warn!("{} quote failed: {}", self.id(), e);
				None
			},
		}
	}

	async fn retrieve_allowance(&self, request: &SwapRequest, force_refetch: bool) -> U256 {
		if !request.is_depositing {
			return U256::MAX;
		}
		match self.spender(request) {
			Ok(spender) => self.ctx.allowance_for(request, spender, force_refetch).await,
			Err(e) => {
				warn!("{} cannot resolve spender: {}", self.id(), e);
				U256::ZERO
			},
		}
	}

	async fn approve(&self, request: &SwapRequest, amount: U256) -> SolverResult<Option<TxReceipt>> {
		if !request.is_depositing {
			return Ok(None);
		}
		let spender = self.spender(request)?;
		self.ctx.approve_spender(request, spender, amount).await
	}

	async fn execute_deposit(&self, request: &SwapRequest) -> SolverResult<TxReceipt> {
		if !request.is_depositing {
			return Err(SolverError::DirectionMismatch);
		}
		self.routes
			.route_for(request)
			.ok_or(SolverError::MissingRoute(self.id()))?;

		let owner = self.ctx.signer().await?;
		let (to, data) = self.deposit_transaction(request, owner)?;
		self.ctx.submit(request, to, data, U256::ZERO).await
	}

	async fn execute_withdraw(&self, request: &SwapRequest) -> SolverResult<TxReceipt> {
		if self.kind.is_zap() {
			return Err(self.ctx.unsupported("withdraw"));
		}
		if request.is_depositing {
			return Err(SolverError::DirectionMismatch);
		}
		self.routes
			.route_for(request)
			.ok_or(SolverError::MissingRoute(self.id()))?;

		let owner = self.ctx.signer().await?;
		let pool = self.staking_pool(request)?;
		let amount = request.input_amount;
		let data = match self.kind {
			BoosterKind::Gauge => IGauge::redeemCall {
				shares: amount,
				receiver: owner,
				owner,
			}
			.abi_encode(),
			_ => IStakingRewards::withdrawCall { amount }.abi_encode(),
		};
		self.ctx.submit(request, pool, data.into(), U256::ZERO).await
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::abi::IVaultV3;
	use crate::allowance_cache::AllowanceCache;
	use alloy_primitives::address;
	use std::sync::Arc;
	use vs_types::test_utils::{
		deposit_request, swap_request, token, MockWallet, TEST_STAKING_POOL, TEST_USER, TEST_VAULT,
	};
	use vs_types::{BackendConfig, ChainContracts, ContractBook};

	const ROUTER: Address = address!("1112dbCF805682e828606f74AB717abf4b4FD8DE");

	fn word(value: u64) -> Vec<u8> {
		U256::from(value).to_be_bytes::<32>().to_vec()
	}

	fn solver(kind: BoosterKind, wallet: Arc<MockWallet>) -> StakingSolver {
		let contracts = ContractBook::new().with_chain(
			1,
			ChainContracts {
				v3_staking_router: Some(ROUTER),
				..Default::default()
			},
		);
		StakingSolver::new(
			kind,
			BackendContext::new(
				BackendConfig::new(kind.solver_id()),
				wallet,
				AllowanceCache::new(),
				Arc::new(contracts),
			),
		)
	}

	#[test]
	fn test_kind_ids_round_trip() {
		for kind in [
			BoosterKind::Optimism,
			BoosterKind::Gauge,
			BoosterKind::Juiced,
			BoosterKind::V3,
		] {
			assert_eq!(BoosterKind::from_solver_id(kind.solver_id()), Some(kind));
		}
		assert_eq!(BoosterKind::from_solver_id(SolverId::Vanilla), None);
	}

	#[test]
	fn test_rescale() {
		assert_eq!(rescale(U256::from(5u64), 6, 18), U256::from(5_000_000_000_000u64));
		assert_eq!(rescale(U256::from(5_000_000_000_000u64), 18, 6), U256::from(5u64));
	}

	#[tokio::test]
	async fn test_v3_router_deposit_and_stake() {
		let wallet = Arc::new(MockWallet::new(TEST_USER));
		wallet.script_read(TEST_VAULT, IVaultV3::previewDepositCall::SELECTOR, word(990));
		let solver = solver(BoosterKind::V3, wallet.clone());

		let mut request = deposit_request(U256::from(1_000u64));
		assert!(solver.init(&request).await.is_none(), "V2 vaults are not routable");

		request.version = VaultVersion::V3;
		assert_eq!(solver.init(&request).await.unwrap().raw, U256::from(990u64));

		solver.approve(&request, U256::from(1_000u64)).await.unwrap();
		solver.execute_deposit(&request).await.unwrap();
		let sent = wallet.sent_transactions();
		assert_eq!(sent[1].to, ROUTER);
		assert_eq!(&sent[1].data[..4], &IStakingRouter::depositAndStakeCall::SELECTOR);
	}

	#[tokio::test]
	async fn test_optimism_zap_needs_configured_contract() {
		let solver = solver(BoosterKind::Optimism, Arc::new(MockWallet::new(TEST_USER)));
		assert!(solver.init(&deposit_request(U256::from(1u64))).await.is_none());
	}

	#[tokio::test]
	async fn test_juiced_stake_and_unstake() {
		let wallet = Arc::new(MockWallet::new(TEST_USER));
		let solver = solver(BoosterKind::Juiced, wallet.clone());

		let stake = swap_request(
			token(TEST_VAULT, 6),
			token(TEST_STAKING_POOL, 6),
			U256::from(300u64),
			true,
		);
		assert_eq!(solver.init(&stake).await.unwrap().raw, U256::from(300u64));
		solver.approve(&stake, U256::from(300u64)).await.unwrap();
		solver.execute_deposit(&stake).await.unwrap();

		let unstake = swap_request(
			token(TEST_STAKING_POOL, 6),
			token(TEST_VAULT, 6),
			U256::from(300u64),
			false,
		);
		assert_eq!(solver.retrieve_allowance(&unstake, false).await, U256::MAX);
		solver.init(&unstake).await.unwrap();
		solver.execute_withdraw(&unstake).await.unwrap();

		let sent = wallet.sent_transactions();
		assert_eq!(sent.len(), 3);
		assert!(sent[1..].iter().all(|tx| tx.to == TEST_STAKING_POOL));
		assert_eq!(&sent[2].data[..4], &IStakingRewards::withdrawCall::SELECTOR);
	}
}
