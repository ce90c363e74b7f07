//! Immutable request snapshots handed to the orchestrator
//!
//! A `SwapRequest` is built once per change of the user's intent and shared as an
//! `Arc` by every backend call of that orchestration cycle.

use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::models::NATIVE_TOKEN_ADDRESS;
use crate::solvers::SolverId;

pub mod builder;
pub mod errors;

pub use builder::SwapRequestBuilder;
pub use errors::{RequestError, RequestResult};

/// Token as described by the external token registry
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Token {
	pub address: Address,
	pub chain_id: u64,
	pub decimals: u8,
	/// Solvers allowed to route this token; read-only capability flags
	pub solve_via: BTreeSet<SolverId>,
}

impl Token {
	pub fn new(address: Address, chain_id: u64, decimals: u8) -> Self {
		Self {
			address,
			chain_id,
			decimals,
			solve_via: BTreeSet::new(),
		}
	}

	pub fn with_solvers(mut self, solvers: impl IntoIterator<Item = SolverId>) -> Self {
		self.solve_via.extend(solvers);
		self
	}

	pub fn supports(&self, solver: SolverId) -> bool {
		self.solve_via.contains(&solver)
	}

	pub fn is_native(&self) -> bool {
		self.address == NATIVE_TOKEN_ADDRESS
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VaultVersion {
	/// `pricePerShare` based vaults
	V2,
	/// ERC-4626 vaults
	V3,
}

/// Vault as described by the external vault registry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VaultInfo {
	pub address: Address,
	pub chain_id: u64,
	pub version: VaultVersion,
	pub decimals: u8,
	/// Solvers allowed to route the vault's share token
	pub solve_via: BTreeSet<SolverId>,
	pub staking_pool_address: Option<Address>,
	pub migrator_address: Option<Address>,
	/// Token the vault accepts for plain deposits
	pub underlying_asset_address: Option<Address>,
}

impl VaultInfo {
	/// The vault's share token
	pub fn share_token(&self) -> Token {
		Token {
			address: self.address,
			chain_id: self.chain_id,
			decimals: self.decimals,
			solve_via: self.solve_via.clone(),
		}
	}
}

/// One deposit, withdrawal or zap intent, immutable once built
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapRequest {
	pub chain_id: u64,
	pub version: VaultVersion,
	/// Connected account, `Address::ZERO` when no wallet is connected
	pub from: Address,
	pub input_token: Token,
	pub output_token: Token,
	/// Amount in the input token's base unit
	pub input_amount: U256,
	pub is_depositing: bool,
	pub staking_pool_address: Option<Address>,
	pub migrator_address: Option<Address>,
	pub underlying_asset_address: Option<Address>,
}

impl SwapRequest {
	pub fn builder() -> SwapRequestBuilder {
		SwapRequestBuilder::new()
	}

	/// Token whose `solve_via` flags gate solver eligibility: the token the user
	/// holds on deposit, the token the user receives on withdrawal
	pub fn relevant_token(&self) -> &Token {
		if self.is_depositing {
			&self.input_token
		} else {
			&self.output_token
		}
	}

	pub fn vault_address(&self) -> Address {
		if self.is_depositing {
			self.output_token.address
		} else {
			self.input_token.address
		}
	}

	pub fn is_eligible_for(&self, solver: SolverId) -> bool {
		self.relevant_token().supports(solver)
	}

	pub fn has_zero_amount(&self) -> bool {
		self.input_amount.is_zero()
	}

	/// True when the sender or either token address is the zero address
	pub fn has_zero_address(&self) -> bool {
		self.from.is_zero() || self.input_token.address.is_zero() || self.output_token.address.is_zero()
	}

	/// Same intent with a different amount
	pub fn with_amount(&self, input_amount: U256) -> Self {
		Self {
			input_amount,
			..self.clone()
		}
	}
}
