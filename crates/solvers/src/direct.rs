//! Direct vault deposits and withdrawals, plain or through the partner tracker

use alloy_primitives::{Address, Bytes, U256};
use alloy_sol_types::SolCall;
use async_trait::async_trait;
use tracing::{debug, warn};

use vs_types::{
	Quote, SolverBackend, SolverError, SolverId, SolverResult, SwapRequest, TxReceipt,
};

use crate::abi::IPartnerTracker;
use crate::context::BackendContext;
use crate::route_memory::RouteMemory;
use crate::vault;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectRoute {
	/// Call the vault itself
	Vanilla,
	/// Deposit through the partner tracker so the deposit is attributed
	Partner,
}

#[derive(Debug)]
pub struct DirectSolver {
	route: DirectRoute,
	ctx: BackendContext,
	/// Expected output of the latest quote
	routes: RouteMemory<U256>,
}

impl DirectSolver {
	pub fn vanilla(ctx: BackendContext) -> Self {
		Self::new(DirectRoute::Vanilla, ctx)
	}

	pub fn partner(ctx: BackendContext) -> Self {
		Self::new(DirectRoute::Partner, ctx)
	}

	fn new(route: DirectRoute, ctx: BackendContext) -> Self {
		Self {
			route,
			ctx,
			routes: RouteMemory::new(),
		}
	}

	/// Deposits pull the input token; withdrawals burn the caller's own shares
	fn deposit_spender(&self, request: &SwapRequest) -> SolverResult<Address> {
		match self.route {
			DirectRoute::Vanilla => Ok(request.vault_address()),
			DirectRoute::Partner => {
				self.ctx
					.contract(request.chain_id, "partner contract", |c| c.partner_contract)
			},
		}
	}

	async fn quote(&self, request: &SwapRequest) -> SolverResult<U256> {
		if request.is_depositing {
			vault::preview_deposit(
				&self.ctx,
				request.chain_id,
				request.output_token.address,
				request.version,
				request.input_amount,
				request.output_token.decimals,
			)
			.await
		} else {
			vault::preview_withdraw(
				&self.ctx,
				request.chain_id,
				request.input_token.address,
				request.version,
				request.input_amount,
				request.input_token.decimals,
			)
			.await
		}
	}

	fn deposit_transaction(&self, request: &SwapRequest, owner: Address) -> SolverResult<(Address, Bytes)> {
		let vault_address = request.vault_address();
		match self.route {
			DirectRoute::Vanilla => Ok((
				vault_address,
				vault::deposit_calldata(request.version, request.input_amount, owner),
			)),
			DirectRoute::Partner => {
				let tracker = self.deposit_spender(request)?;
				let partner_id = self
					.ctx
					.contract(request.chain_id, "partner id", |c| c.partner_id)?;
				let data = IPartnerTracker::depositCall {
					vault: vault_address,
					partnerId: partner_id,
					amount: request.input_amount,
				}
				.abi_encode();
				Ok((tracker, data.into()))
			},
		}
	}
}

#[async_trait]
impl SolverBackend for DirectSolver {
	fn id(&self) -> SolverId {
		self.ctx.solver_id()
	}

	fn is_enabled(&self) -> bool {
		self.ctx.config.enabled
	}

	async fn init(&self, request: &SwapRequest) -> Option<Quote> {
		if !self.ctx.can_quote(request) {
			return None;
		}
		if self.route == DirectRoute::Partner && request.is_depositing && self.deposit_spender(request).is_err() {
			debug!("{} has no partner contract on chain {}", self.id(), request.chain_id);
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
		match self.deposit_spender(request) {
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
		let spender = self.deposit_spender(request)?;
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
		if request.is_depositing {
			return Err(SolverError::DirectionMismatch);
		}
		self.routes
			.route_for(request)
			.ok_or(SolverError::MissingRoute(self.id()))?;

		let owner = self.ctx.signer().await?;
		let data = vault::withdraw_calldata(request.version, request.input_amount, owner);
		self.ctx
			.submit(request, request.vault_address(), data, U256::ZERO)
			.await
	}
}
