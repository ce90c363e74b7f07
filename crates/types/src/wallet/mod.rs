//! Wallet and RPC provider adapter consumed by solver backends

use alloy_primitives::{Address, Bytes, B256};
use async_trait::async_trait;
use thiserror::Error;

use crate::transactions::{ContractCall, TransactionRequest, TxReceipt};

pub type WalletResult<T> = Result<T, WalletError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WalletError {
	#[error("No account connected")]
	NotConnected,

	#[error("User rejected the request: {0}")]
	Rejected(String),

	#[error("Could not switch to chain {chain_id}: {reason}")]
	ChainSwitch { chain_id: u64, reason: String },

	#[error("RPC error: {0}")]
	Rpc(String),

	#[error("Could not decode contract response: {0}")]
	Decode(String),
}

/// Connection to the user's wallet and the chain RPC
///
/// Every approve and execute call of every backend goes through this trait.
#[async_trait]
pub trait WalletProvider: Send + Sync + std::fmt::Debug {
	/// Connected account, if any
	async fn account(&self) -> Option<Address>;

	async fn switch_chain(&self, chain_id: u64) -> WalletResult<()>;

	/// `eth_call` returning the raw ABI-encoded result
	async fn read_contract(&self, call: &ContractCall) -> WalletResult<Bytes>;

	async fn send_transaction(&self, tx: TransactionRequest) -> WalletResult<B256>;

	async fn wait_for_receipt(&self, tx_hash: B256) -> WalletResult<TxReceipt>;
}
