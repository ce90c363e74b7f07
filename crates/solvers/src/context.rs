//! Dependencies and wallet plumbing shared by every backend

use alloy_primitives::{Address, Bytes, U256};
use std::sync::Arc;
use tracing::{debug, info, warn};

use vs_types::{
	BackendConfig, ContractBook, ContractCall, SolverError, SolverId, SolverResult, SwapRequest,
	TransactionRequest, TxReceipt, WalletProvider,
};

use crate::abi;
use crate::allowance_cache::{AllowanceCache, AllowanceKey};

#[derive(Debug, Clone)]
pub struct BackendContext {
	pub config: BackendConfig,
	pub wallet: Arc<dyn WalletProvider>,
	pub allowances: AllowanceCache,
	pub contracts: Arc<ContractBook>,
}

impl BackendContext {
	pub fn new(
		config: BackendConfig,
		wallet: Arc<dyn WalletProvider>,
		allowances: AllowanceCache,
		contracts: Arc<ContractBook>,
	) -> Self {
		Self {
			config,
			wallet,
			allowances,
			contracts,
		}
	}

	pub fn solver_id(&self) -> SolverId {
		self.config.solver_id
	}

	/// Guard shared by every `init`: enabled, eligible, non-zero amount and addresses
	pub fn can_quote(&self, request: &SwapRequest) -> bool {
		let id = self.solver_id();
		let reason = if !self.config.enabled {
			"disabled"
		} else if !request.is_eligible_for(id) {
			"token does not list this solver"
		} else if request.has_zero_amount() {
			"zero amount"
		} else if request.has_zero_address() {
			"zero address"
		} else {
			return true;
		};
		debug!("{} skipped quote: {}", id, reason);
		false
	}

	/// Connected account that will sign
	pub async fn signer(&self) -> SolverResult<Address> {
		self.wallet.account().await.ok_or(SolverError::MissingSigner)
	}

	/// Contract address from the book, or a configuration error naming `what`
	pub fn contract<F>(&self, chain_id: u64, what: &str, select: F) -> SolverResult<Address>
	where
		F: Fn(&vs_types::ChainContracts) -> Option<Address>,
	{
		self.contracts
			.lookup(chain_id, select)
			.ok_or_else(|| SolverError::Configuration {
				solver_id: self.solver_id(),
				reason: format!("no {} configured for chain {}", what, chain_id),
			})
	}

	pub async fn read_uint(&self, chain_id: u64, to: Address, data: Vec<u8>) -> SolverResult<U256> {
		let response = self
			.wallet
			.read_contract(&ContractCall::new(chain_id, to, data))
			.await?;
		abi::decode_uint(&response)
	}

	fn allowance_key(&self, request: &SwapRequest, spender: Address) -> AllowanceKey {
		AllowanceKey {
			chain_id: request.chain_id,
			owner: request.from,
			token: request.input_token.address,
			spender,
		}
	}

	/// Allowance of the input token towards `spender`; native input needs none
	pub async fn allowance_for(&self, request: &SwapRequest, spender: Address, force_refetch: bool) -> U256 {
		if request.input_token.is_native() {
			return U256::MAX;
		}

		let key = self.allowance_key(request, spender);
		self.allowances
			.get_or_fetch(key, force_refetch, || async {
				let call = abi::allowance_call(key.chain_id, key.token, key.owner, key.spender);
				let response = self.wallet.read_contract(&call).await?;
				abi::decode_uint(&response)
			})
			.await
	}

	/// Approve `amount` for `spender` unless the fresh allowance already covers it
	pub async fn approve_spender(
		&self,
		request: &SwapRequest,
		spender: Address,
		amount: U256,
	) -> SolverResult<Option<TxReceipt>> {
		let current = self.allowance_for(request, spender, true).await;
		if current >= amount {
			debug!("{} allowance {} already covers {}", self.solver_id(), current, amount);
			return Ok(None);
		}

		let receipt = self
			.submit(
				request,
				request.input_token.address,
				abi::approve_calldata(spender, amount),
				U256::ZERO,
			)
			.await?;
		self.allowances
			.insert(self.allowance_key(request, spender), amount);
		Ok(Some(receipt))
	}

	/// Sign, send and confirm a transaction on the request's chain
	pub async fn submit(
		&self,
		request: &SwapRequest,
		to: Address,
		data: Bytes,
		value: U256,
	) -> SolverResult<TxReceipt> {
		let from = self.signer().await?;
		self.wallet.switch_chain(request.chain_id).await?;

		let tx_hash = self
			.wallet
			.send_transaction(TransactionRequest {
				chain_id: request.chain_id,
				from,
				to,
				data,
				value,
			})
			.await?;
		debug!("{} sent transaction {}", self.solver_id(), tx_hash);

		let receipt = self.wallet.wait_for_receipt(tx_hash).await?;
		if !receipt.success {
			warn!("{} transaction {} reverted", self.solver_id(), tx_hash);
			return Err(SolverError::Reverted {
				tx_hash: tx_hash.to_string(),
			});
		}

		info!(
			"{} transaction {} confirmed in block {:?}",
			self.solver_id(),
			tx_hash,
			receipt.block_number
		);
		Ok(receipt)
	}

	pub fn unsupported(&self, operation: &'static str) -> SolverError {
		SolverError::UnsupportedOperation {
			operation,
			solver_id: self.solver_id(),
		}
	}
}
