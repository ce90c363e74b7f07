//! Approve and execute against whichever solver is currently published

use alloy_primitives::U256;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use vs_solvers::SolverRegistry;
use vs_types::{SolverBackend, SolverError, SolverId, SolverResult, SolverSession, SwapRequest, TxReceipt};

use crate::status::{StatusHandler, TxStatusTracker, DEFAULT_STATUS_RESET};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
	Deposit,
	Withdraw,
}

/// Backend and request of the published session
struct Target {
	solver: SolverId,
	backend: Arc<dyn SolverBackend>,
	request: Arc<SwapRequest>,
}

pub struct ExecutionCoordinator {
	registry: Arc<SolverRegistry>,
	session: watch::Receiver<SolverSession>,
	status_reset: Duration,
}

impl ExecutionCoordinator {
	pub fn new(registry: Arc<SolverRegistry>, session: watch::Receiver<SolverSession>) -> Self {
		Self {
			registry,
			session,
			status_reset: DEFAULT_STATUS_RESET,
		}
	}

	pub fn with_status_reset(mut self, status_reset: Duration) -> Self {
		self.status_reset = status_reset;
		self
	}

	pub fn session(&self) -> SolverSession {
		self.session.borrow().clone()
	}

	fn target(&self) -> SolverResult<Target> {
		let session = self.session();
		if session.is_loading {
			return Err(SolverError::QuoteInFlight);
		}
		let request = session.request.ok_or(SolverError::NoPublishedRequest)?;
		if session.effective_solver == SolverId::None {
			return Err(SolverError::MissingRoute(SolverId::None));
		}
		Ok(Target {
			solver: session.effective_solver,
			backend: self.registry.get(session.effective_solver)?,
			request,
		})
	}

	/// Allowance of the published request's input token towards the published
	/// solver's spender
	pub async fn retrieve_allowance(&self, force_refetch: bool) -> SolverResult<U256> {
		let target = self.target()?;
		Ok(target
			.backend
			.retrieve_allowance(&target.request, force_refetch)
			.await)
	}

	/// Approve `amount` for the published solver, then refresh the cached allowance
	///
	/// When the allowance already covers `amount`, `on_success` runs immediately and
	/// the status handler is never called.
	pub async fn approve<F>(
		&self,
		amount: U256,
		status_handler: StatusHandler,
		on_success: F,
	) -> SolverResult<Option<TxReceipt>>
	where
		F: FnOnce() + Send,
	{
		let tracker = TxStatusTracker::new(status_handler, self.status_reset);
		let target = match self.target() {
			Ok(target) => target,
			Err(e) => return Err(fail(&tracker, e)),
		};

		let current = target.backend.retrieve_allowance(&target.request, false).await;
		if current >= amount {
			debug!("{} allowance {} already covers {}", target.solver, current, amount);
			on_success();
			return Ok(None);
		}

		tracker.pending();
		match target.backend.approve(&target.request, amount).await {
			Ok(receipt) => {
				let allowance = target.backend.retrieve_allowance(&target.request, true).await;
				info!(
					"{} approval settled, allowance now {}",
					target.solver, allowance
				);
				tracker.succeed();
				on_success();
				Ok(receipt)
			},
			Err(e) => Err(fail(&tracker, e)),
		}
	}

	pub async fn execute_deposit<F>(
		&self,
		status_handler: StatusHandler,
		on_success: F,
	) -> SolverResult<TxReceipt>
	where
		F: FnOnce() + Send,
	{
		self.execute(Direction::Deposit, status_handler, on_success)
			.await
	}

	pub async fn execute_withdraw<F>(
		&self,
		status_handler: StatusHandler,
		on_success: F,
	) -> SolverResult<TxReceipt>
	where
		F: FnOnce() + Send,
	{
		self.execute(Direction::Withdraw, status_handler, on_success)
			.await
	}

	async fn execute<F>(
		&self,
		direction: Direction,
		status_handler: StatusHandler,
		on_success: F,
	) -> SolverResult<TxReceipt>
	where
		F: FnOnce() + Send,
	{
		let tracker = TxStatusTracker::new(status_handler, self.status_reset);
		let target = match self.target() {
			Ok(target) => target,
			Err(e) => return Err(fail(&tracker, e)),
		};

		let required = target.request.input_amount;
		let available = target.backend.retrieve_allowance(&target.request, false).await;
		if available < required {
			return Err(fail(
				&tracker,
				SolverError::InsufficientAllowance {
					required,
					available,
				},
			));
		}

		tracker.pending();
		debug!("{} executing {:?}", target.solver, direction);
		let result = match direction {
			Direction::Deposit => target.backend.execute_deposit(&target.request).await,
			Direction::Withdraw => target.backend.execute_withdraw(&target.request).await,
		};

		match result {
			Ok(receipt) => {
				info!("{} {:?} confirmed: {}", target.solver, direction, receipt.tx_hash);
				target.backend.retrieve_allowance(&target.request, true).await;
				tracker.succeed();
				on_success();
				Ok(receipt)
			},
			Err(e) => Err(fail(&tracker, e)),
		}
	}
}

fn fail(tracker: &TxStatusTracker, error: SolverError) -> SolverError {
	warn!("Invocation failed: {}", error);
	tracker.fail(error.to_string());
	error
}

impl std::fmt::Debug for ExecutionCoordinator {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("ExecutionCoordinator")
			.field("status_reset", &self.status_reset)
			.finish()
	}
}
