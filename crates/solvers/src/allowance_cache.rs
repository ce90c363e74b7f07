//! Session-scoped allowance cache shared by every backend
//!
//! Entries never expire on their own; callers pass `force_refetch` after an
//! approval to repopulate them. Concurrent misses for the same key each perform
//! their own read and the last write wins.

use alloy_primitives::{Address, U256};
use dashmap::DashMap;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, warn};

use vs_types::SolverResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AllowanceKey {
	pub chain_id: u64,
	pub owner: Address,
	pub token: Address,
	pub spender: Address,
}

#[derive(Debug, Clone, Default)]
pub struct AllowanceCache {
	entries: Arc<DashMap<AllowanceKey, U256>>,
}

impl AllowanceCache {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn get(&self, key: &AllowanceKey) -> Option<U256> {
		self.entries.get(key).map(|entry| *entry.value())
	}

	pub fn insert(&self, key: AllowanceKey, amount: U256) {
		self.entries.insert(key, amount);
	}

	pub fn invalidate(&self, key: &AllowanceKey) {
		self.entries.remove(key);
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	/// Cached allowance, or a fresh read when missing or `force_refetch` is set
	///
	/// A failed read yields zero and is not cached, so the approve path is taken
	/// and the next lookup reads again.
	pub async fn get_or_fetch<F, Fut>(&self, key: AllowanceKey, force_refetch: bool, fetch: F) -> U256
	where
		F: FnOnce() -> Fut,
		Fut: Future<Output = SolverResult<U256>>,
	{
		if !force_refetch {
			if let Some(amount) = self.get(&key) {
				debug!("Allowance cache hit for token {} spender {}", key.token, key.spender);
				return amount;
			}
		}

		match fetch().await {
			Ok(amount) => {
				self.insert(key, amount);
				amount
			},
			Err(e) => {
				warn!(
					"Allowance read failed for token {} spender {} on chain {}: {}",
					key.token, key.spender, key.chain_id, e
				);
				U256::ZERO
			},
		}
	}
}
