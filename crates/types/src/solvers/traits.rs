//! The contract every solver backend implements

use alloy_primitives::U256;
use async_trait::async_trait;
use std::fmt::Debug;

use super::{SolverId, SolverResult};
use crate::quotes::Quote;
use crate::requests::SwapRequest;
use crate::transactions::TxReceipt;

/// One execution strategy capable of quoting and executing a deposit, withdrawal
/// or zap
///
/// Implementations keep a single most-recent route in memory: `init` fills it,
/// `execute_*` consumes it and must refuse to run when the cached route was
/// computed for a different request than the one passed in.
#[async_trait]
pub trait SolverBackend: Send + Sync + Debug {
	fn id(&self) -> SolverId;

	/// Administrative switch mirrored from configuration
	fn is_enabled(&self) -> bool;

	/// Quote the request
	///
	/// Returns `None` instead of an error when the backend is disabled, the
	/// relevant token does not list this solver, the amount is zero, an
	/// address is zero, or the upstream service fails.
	async fn init(&self, request: &SwapRequest) -> Option<Quote>;

	/// Current allowance of the input token towards this backend's spender
	///
	/// Native input yields `U256::MAX`. Read failures yield zero.
	async fn retrieve_allowance(&self, request: &SwapRequest, force_refetch: bool) -> U256;

	/// Approve `amount` of the input token for this backend's spender
	///
	/// Returns `Ok(None)` without a transaction when the allowance already covers
	/// `amount`.
	async fn approve(&self, request: &SwapRequest, amount: U256)
		-> SolverResult<Option<TxReceipt>>;

	async fn execute_deposit(&self, request: &SwapRequest) -> SolverResult<TxReceipt>;

	async fn execute_withdraw(&self, request: &SwapRequest) -> SolverResult<TxReceipt>;

	fn name(&self) -> &'static str {
		self.id().as_str()
	}
}
