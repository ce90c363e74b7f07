use alloy_primitives::Address;
use thiserror::Error;

pub type RequestResult<T> = Result<T, RequestError>;

/// Failures while turning UI selections into a `SwapRequest`
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RequestError {
	#[error("Missing required field: {0}")]
	MissingField(&'static str),

	#[error("Invalid amount: {0}")]
	InvalidAmount(String),

	#[error("Unit conversion failed: {0}")]
	Units(String),

	#[error("Amount has {given} fractional digits but the token only has {decimals}")]
	ExcessPrecision { decimals: u8, given: usize },

	#[error("Token {token} is on chain {found}, expected chain {expected}")]
	ChainMismatch {
		token: Address,
		expected: u64,
		found: u64,
	},

	#[error("Input and output token are both {0}")]
	SameToken(Address),
}
