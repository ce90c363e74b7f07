//! Error types for solver backends and the execution layer

use alloy_primitives::U256;
use thiserror::Error;

use super::SolverId;
use crate::wallet::WalletError;

pub type SolverResult<T> = Result<T, SolverError>;

/// Failures raised by solver backends, the registry and the execution coordinator
///
/// Quoting never surfaces these to the orchestrator: `init` converts them into
/// `None`. Approval and execution paths return them to the caller.
#[derive(Error, Debug)]
pub enum SolverError {
	#[error("Unknown solver: {0}")]
	UnknownSolver(String),

	#[error("Solver {0} is not registered")]
	NotRegistered(SolverId),

	#[error("Solver {0} is already registered")]
	AlreadyRegistered(SolverId),

	#[error("Solver {0} is disabled")]
	Disabled(SolverId),

	#[error("Configuration error for {solver_id}: {reason}")]
	Configuration { solver_id: SolverId, reason: String },

	#[error("HTTP request failed: {0}")]
	Http(#[from] reqwest::Error),

	#[error("HTTP {status_code}: {reason}")]
	HttpStatus { status_code: u16, reason: String },

	#[error("Invalid upstream response: {reason}")]
	InvalidResponse { reason: String },

	#[error("Wallet error: {0}")]
	Wallet(#[from] WalletError),

	#[error("No wallet account is connected")]
	MissingSigner,

	#[error("No quote has been published for this session")]
	NoPublishedRequest,

	#[error("A newer quote is still loading")]
	QuoteInFlight,

	#[error("No cached route for the published request on {0}")]
	MissingRoute(SolverId),

	#[error("Insufficient allowance: required {required}, available {available}")]
	InsufficientAllowance { required: U256, available: U256 },

	#[error("Published request direction does not match the requested operation")]
	DirectionMismatch,

	#[error("Transaction {tx_hash} reverted")]
	Reverted { tx_hash: String },

	#[error("Settlement order {order_uid} ended as {status}")]
	OrderNotFilled { order_uid: String, status: String },

	#[error("Settlement order {order_uid} not filled after {polls} polls")]
	OrderPollExhausted { order_uid: String, polls: u32 },

	#[error("Unsupported operation {operation} for {solver_id}")]
	UnsupportedOperation {
		operation: &'static str,
		solver_id: SolverId,
	},

	#[error("Solver task failed: {0}")]
	TaskFailed(String),
}

impl SolverError {
	/// HTTP status of the upstream failure, when there is one
	pub fn status_code(&self) -> Option<u16> {
		match self {
			SolverError::HttpStatus { status_code, .. } => Some(*status_code),
			SolverError::Http(error) => error.status().map(|status| status.as_u16()),
			_ => None,
		}
	}

	pub fn http_status(status_code: u16, reason: impl Into<String>) -> Self {
		Self::HttpStatus {
			status_code,
			reason: reason.into(),
		}
	}

	pub fn invalid_response(reason: impl Into<String>) -> Self {
		Self::InvalidResponse {
			reason: reason.into(),
		}
	}

	/// True for failures caused by sequencing bugs in the caller rather than by
	/// the chain or an upstream service
	pub fn is_invariant_violation(&self) -> bool {
		matches!(
			self,
			SolverError::MissingSigner
				| SolverError::NoPublishedRequest
				| SolverError::QuoteInFlight
				| SolverError::MissingRoute(_)
				| SolverError::InsufficientAllowance { .. }
				| SolverError::DirectionMismatch
		)
	}
}
