//! Per-chain addresses of the contracts solver backends interact with

use alloy_primitives::{address, Address};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Placeholder address aggregators use for the chain's native coin
pub const NATIVE_TOKEN_ADDRESS: Address = address!("EeeeeEeeeEeEeeEeEeEeeEEEeeeeEeeeeeeeEEeE");

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChainContracts {
	/// Deposit proxy that attributes deposits to a partner id
	pub partner_contract: Option<Address>,
	pub partner_id: Option<Address>,
	/// Zap contract depositing into a vault and its staking pool in one call
	pub optimism_staking_zap: Option<Address>,
	/// Router depositing into a V3 vault and staking the shares
	pub v3_staking_router: Option<Address>,
	/// Spender the aggregator A route transactions pull tokens through
	pub aggregator_a_router: Option<Address>,
	pub aggregator_b_router: Option<Address>,
	pub settlement_contract: Option<Address>,
	/// Spender approved for settlement orders
	pub settlement_vault_relayer: Option<Address>,
}

/// Contract addresses keyed by chain id
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContractBook {
	chains: HashMap<u64, ChainContracts>,
}

impl ContractBook {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_chain(mut self, chain_id: u64, contracts: ChainContracts) -> Self {
		self.chains.insert(chain_id, contracts);
		self
	}

	pub fn insert(&mut self, chain_id: u64, contracts: ChainContracts) {
		self.chains.insert(chain_id, contracts);
	}

	pub fn for_chain(&self, chain_id: u64) -> Option<&ChainContracts> {
		self.chains.get(&chain_id)
	}

	/// Resolve one contract address on a chain
	pub fn lookup<F>(&self, chain_id: u64, select: F) -> Option<Address>
	where
		F: Fn(&ChainContracts) -> Option<Address>,
	{
		self.for_chain(chain_id).and_then(select)
	}

	pub fn chain_ids(&self) -> impl Iterator<Item = &u64> {
		self.chains.keys()
	}
}
