//! Transaction payloads, receipts and the per-invocation status machine

use alloy_primitives::{Address, Bytes, B256, U256};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Status of one approve or execute invocation
///
/// `Idle → Pending → Success | Error → Idle`; terminal states carry the time they
/// were entered so the reset can be scheduled from it.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum TxStatus {
	#[default]
	Idle,
	Pending { since: DateTime<Utc> },
	Success { at: DateTime<Utc> },
	Error { at: DateTime<Utc>, reason: String },
}

impl TxStatus {
	pub fn pending() -> Self {
		TxStatus::Pending { since: Utc::now() }
	}

	pub fn success() -> Self {
		TxStatus::Success { at: Utc::now() }
	}

	pub fn error(reason: impl Into<String>) -> Self {
		TxStatus::Error {
			at: Utc::now(),
			reason: reason.into(),
		}
	}

	pub fn is_pending(&self) -> bool {
		matches!(self, TxStatus::Pending { .. })
	}

	pub fn is_terminal(&self) -> bool {
		matches!(self, TxStatus::Success { .. } | TxStatus::Error { .. })
	}

	/// Whether a terminal state has outlived `delay` at `now`
	pub fn reset_due(&self, now: DateTime<Utc>, delay: Duration) -> bool {
		match self {
			TxStatus::Success { at } | TxStatus::Error { at, .. } => now - *at >= delay,
			_ => false,
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxReceipt {
	pub tx_hash: B256,
	pub block_number: Option<u64>,
	pub success: bool,
}

/// Transaction handed to the wallet for signing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRequest {
	pub chain_id: u64,
	pub from: Address,
	pub to: Address,
	pub data: Bytes,
	pub value: U256,
}

/// Read-only contract call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractCall {
	pub chain_id: u64,
	pub to: Address,
	pub data: Bytes,
}

impl ContractCall {
	pub fn new(chain_id: u64, to: Address, data: impl Into<Bytes>) -> Self {
		Self {
			chain_id,
			to,
			data: data.into(),
		}
	}
}
