//! Share migration from a retired vault into its successor through the migrator router

use alloy_primitives::{Address, U256};
use alloy_sol_types::SolCall;
use async_trait::async_trait;
use tracing::warn;

use vs_types::{
	Quote, SolverBackend, SolverError, SolverId, SolverResult, SwapRequest, TxReceipt, VaultVersion,
};

use crate::abi::{self, IVaultMigrator};
use crate::context::BackendContext;
use crate::route_memory::RouteMemory;
use crate::vault;

/// Moves shares of the input vault into the output vault in one transaction
///
/// The retired vault is always priced as a `pricePerShare` vault; the target
/// vault is priced according to the request's version.
#[derive(Debug)]
pub struct MigrationSolver {
	ctx: BackendContext,
	routes: RouteMemory<U256>,
}

impl MigrationSolver {
	pub fn new(ctx: BackendContext) -> Self {
		Self {
			ctx,
			routes: RouteMemory::new(),
		}
	}

	fn migrator(&self, request: &SwapRequest) -> SolverResult<Address> {
		request
			.migrator_address
			.filter(|address| !address.is_zero())
			.ok_or_else(|| SolverError::Configuration {
				solver_id: self.ctx.solver_id(),
				reason: "request has no migrator address".to_string(),
			})
	}

	async fn quote(&self, request: &SwapRequest) -> SolverResult<U256> {
		let assets = vault::preview_withdraw(
			&self.ctx,
			request.chain_id,
			request.input_token.address,
			VaultVersion::V2,
			request.input_amount,
			request.input_token.decimals,
		)
		.await?;

		vault::preview_deposit(
			&self.ctx,
			request.chain_id,
			request.output_token.address,
			request.version,
			assets,
			request.output_token.decimals,
		)
		.await
	}
}

#[async_trait]
impl SolverBackend for MigrationSolver {
	fn id(&self) -> SolverId {
		SolverId::InternalMigration
	}

	fn is_enabled(&self) -> bool {
		self.ctx.config.enabled
	}

	async fn init(&self, request: &SwapRequest) -> Option<Quote> {
		if !request.is_depositing || !self.ctx.can_quote(request) || self.migrator(request).is_err() {
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
		match self.migrator(request) {
			Ok(migrator) => self.ctx.allowance_for(request, migrator, force_refetch).await,
			Err(_) => U256::ZERO,
		}
	}

	async fn approve(&self, request: &SwapRequest, amount: U256) -> SolverResult<Option<TxReceipt>> {
		let migrator = self.migrator(request)?;
		self.ctx.approve_spender(request, migrator, amount).await
	}

	async fn execute_deposit(&self, request: &SwapRequest) -> SolverResult<TxReceipt> {
		if !request.is_depositing {
			return Err(SolverError::DirectionMismatch);
		}
		let expected = self
			.routes
			.route_for(request)
			.ok_or(SolverError::MissingRoute(self.id()))?;
		let migrator = self.migrator(request)?;

		let data = IVaultMigrator::migrateCall {
			fromVault: request.input_token.address,
			toVault: request.output_token.address,
			shares: request.input_amount,
			minAmountOut: abi::apply_slippage(expected, self.ctx.config.slippage_bps),
		}
		.abi_encode();
		self.ctx
			.submit(request, migrator, data.into(), U256::ZERO)
			.await
	}

	async fn execute_withdraw(&self, _request: &SwapRequest) -> SolverResult<TxReceipt> {
		Err(self.ctx.unsupported("withdraw"))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::abi::IVaultV2;
	use crate::allowance_cache::AllowanceCache;
	use alloy_primitives::address;
	use std::sync::Arc;
	use vs_types::test_utils::{swap_request, token, MockWallet, TEST_USER, TEST_VAULT};
	use vs_types::{BackendConfig, ContractBook};

	const OLD_VAULT: Address = address!("5f18C75AbDAe578b483E5F43f12a39cF75b973a9");
	const MIGRATOR: Address = address!("1824df8D751704FA10FA371d62A37f9B8772ab90");

	fn word(value: u64) -> Vec<u8> {
		U256::from(value).to_be_bytes::<32>().to_vec()
	}

	fn migration_request() -> SwapRequest {
		let mut request = swap_request(
			token(OLD_VAULT, 6),
			token(TEST_VAULT, 6),
			U256::from(1_000_000u64),
			true,
		);
		request.migrator_address = Some(MIGRATOR);
		request
	}

	fn solver(wallet: Arc<MockWallet>) -> MigrationSolver {
		MigrationSolver::new(BackendContext::new(
			BackendConfig::new(SolverId::InternalMigration),
			wallet,
			AllowanceCache::new(),
			Arc::new(ContractBook::new()),
		))
	}

	#[tokio::test]
	async fn test_migration_quote_and_execute() {
		let wallet = Arc::new(MockWallet::new(TEST_USER));
		wallet.script_read(OLD_VAULT, IVaultV2::pricePerShareCall::SELECTOR, word(1_200_000));
		wallet.script_read(TEST_VAULT, IVaultV2::pricePerShareCall::SELECTOR, word(1_000_000));
		let solver = solver(wallet.clone());
		let request = migration_request();

		let quote = solver.init(&request).await.unwrap();
		assert_eq!(quote.raw, U256::from(1_200_000u64));

		solver.approve(&request, request.input_amount).await.unwrap();
		solver.execute_deposit(&request).await.unwrap();

		let sent = wallet.sent_transactions();
		assert_eq!(sent.len(), 2);
		assert_eq!(sent[1].to, MIGRATOR);
		let call = IVaultMigrator::migrateCall::abi_decode(&sent[1].data).unwrap();
		assert_eq!(call.minAmountOut, U256::from(1_188_000u64));
	}

	#[tokio::test]
	async fn test_requires_migrator_and_deposit_direction() {
		let solver = solver(Arc::new(MockWallet::new(TEST_USER)));
		let mut request = migration_request();
		request.migrator_address = None;
		assert!(solver.init(&request).await.is_none());

		let mut withdraw = migration_request();
		withdraw.is_depositing = false;
		assert!(solver.init(&withdraw).await.is_none());
		assert!(matches!(
			solver.execute_withdraw(&withdraw).await.unwrap_err(),
			SolverError::UnsupportedOperation { .. }
		));
	}
}
