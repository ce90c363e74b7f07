//! Configurable in-memory solver backend for demos and tests

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use alloy_primitives::{B256, U256};
use async_trait::async_trait;
use vs_solvers::RouteMemory;
use vs_types::{
	Quote, SolverBackend, SolverError, SolverId, SolverResult, SwapRequest, TxReceipt,
};

/// What `init` answers with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockQuote {
	/// `input_amount * numerator / denominator`
	Rate { numerator: u64, denominator: u64 },
	Fixed(U256),
	/// No route (`None`)
	Unavailable,
	/// The quote task panics
	Panic,
}

#[derive(Debug)]
pub struct MockSolver {
	id: SolverId,
	enabled: bool,
	delay: Duration,
	quote: MockQuote,
	fail_execution: bool,
	allowance: Mutex<U256>,
	routes: RouteMemory<U256>,
	init_calls: Mutex<Vec<SwapRequest>>,
	approvals: Mutex<Vec<U256>>,
	executions: Mutex<Vec<SwapRequest>>,
	forced_allowance_reads: AtomicUsize,
}

impl MockSolver {
	/// Enabled solver quoting 1:1 without delay
	pub fn new(id: SolverId) -> Self {
		Self {
			id,
			enabled: true,
			delay: Duration::ZERO,
			quote: MockQuote::Rate {
				numerator: 1,
				denominator: 1,
			},
			fail_execution: false,
			allowance: Mutex::new(U256::ZERO),
			routes: RouteMemory::new(),
			init_calls: Mutex::new(Vec::new()),
			approvals: Mutex::new(Vec::new()),
			executions: Mutex::new(Vec::new()),
			forced_allowance_reads: AtomicUsize::new(0),
		}
	}

	pub fn with_delay(mut self, delay: Duration) -> Self {
		self.delay = delay;
		self
	}

	pub fn with_quote(mut self, quote: MockQuote) -> Self {
		self.quote = quote;
		self
	}

	pub fn with_rate(self, numerator: u64, denominator: u64) -> Self {
		self.with_quote(MockQuote::Rate {
			numerator,
			denominator,
		})
	}

	pub fn unavailable(self) -> Self {
		self.with_quote(MockQuote::Unavailable)
	}

	pub fn disabled(mut self) -> Self {
		self.enabled = false;
		self
	}

	pub fn failing_execution(mut self) -> Self {
		self.fail_execution = true;
		self
	}

	pub fn with_allowance(self, allowance: U256) -> Self {
		*lock(&self.allowance) = allowance;
		self
	}

	pub fn init_calls(&self) -> Vec<SwapRequest> {
		lock(&self.init_calls).clone()
	}

	pub fn init_count(&self) -> usize {
		lock(&self.init_calls).len()
	}

	pub fn approvals(&self) -> Vec<U256> {
		lock(&self.approvals).clone()
	}

	pub fn executions(&self) -> Vec<SwapRequest> {
		lock(&self.executions).clone()
	}

	pub fn forced_allowance_reads(&self) -> usize {
		self.forced_allowance_reads.load(Ordering::SeqCst)
	}

	fn quote_for(&self, request: &SwapRequest) -> Option<U256> {
		match self.quote {
			MockQuote::Rate {
				numerator,
				denominator,
			} => Some(request.input_amount * U256::from(numerator) / U256::from(denominator.max(1))),
			MockQuote::Fixed(raw) => Some(raw),
			MockQuote::Unavailable => None,
			MockQuote::Panic => panic!("{} quote task panicked", self.id),
		}
	}

	fn execute(&self, request: &SwapRequest) -> SolverResult<TxReceipt> {
		if self.routes.route_for(request).is_none() {
			return Err(SolverError::MissingRoute(self.id));
		}
		let mut executions = lock(&self.executions);
		executions.push(request.clone());
		let tx_hash = B256::with_last_byte(executions.len() as u8);
		if self.fail_execution {
			return Err(SolverError::Reverted {
				tx_hash: tx_hash.to_string(),
			});
		}
		Ok(TxReceipt {
			tx_hash,
			block_number: Some(1),
			success: true,
		})
	}
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
	mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[async_trait]
impl SolverBackend for MockSolver {
	fn id(&self) -> SolverId {
		self.id
	}

	fn is_enabled(&self) -> bool {
		self.enabled
	}

	async fn init(&self, request: &SwapRequest) -> Option<Quote> {
		lock(&self.init_calls).push(request.clone());
		let ticket = self.routes.issue();
		if !self.delay.is_zero() {
			tokio::time::sleep(self.delay).await;
		}

		let raw = self.quote_for(request)?;
		self.routes.store(ticket, request, raw);
		Some(Quote::new(raw, request.output_token.decimals, self.id))
	}

	async fn retrieve_allowance(&self, request: &SwapRequest, force_refetch: bool) -> U256 {
		if force_refetch {
			self.forced_allowance_reads.fetch_add(1, Ordering::SeqCst);
		}
		if request.input_token.is_native() {
			return U256::MAX;
		}
		*lock(&self.allowance)
	}

	async fn approve(&self, _request: &SwapRequest, amount: U256) -> SolverResult<Option<TxReceipt>> {
		let mut allowance = lock(&self.allowance);
		if *allowance >= amount {
			return Ok(None);
		}
		*allowance = amount;

		let mut approvals = lock(&self.approvals);
		approvals.push(amount);
		Ok(Some(TxReceipt {
			tx_hash: B256::with_last_byte(approvals.len() as u8),
			block_number: Some(1),
			success: true,
		}))
	}

	async fn execute_deposit(&self, request: &SwapRequest) -> SolverResult<TxReceipt> {
		if !request.is_depositing {
			return Err(SolverError::DirectionMismatch);
		}
		self.execute(request)
	}

	async fn execute_withdraw(&self, request: &SwapRequest) -> SolverResult<TxReceipt> {
		if request.is_depositing {
			return Err(SolverError::DirectionMismatch);
		}
		self.execute(request)
	}
}
