//! Read model published to subscribers of an orchestrator

use std::sync::Arc;

use crate::quotes::Quote;
use crate::requests::SwapRequest;
use crate::solvers::SolverId;

/// Inline notice shown next to the published quote
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuoteNotice {
	/// The user-selected solver was dispatched but produced no executable quote
	SelectedSolverUnavailable {
		selected: SolverId,
		fallback: SolverId,
	},
}

/// State of one deposit/withdraw interaction
#[derive(Debug, Clone, PartialEq)]
pub struct SolverSession {
	/// Solver the user selected
	pub current_solver: SolverId,
	/// Solver whose quote is published and that execution will target
	pub effective_solver: SolverId,
	pub quote: Quote,
	pub request_hash: Option<String>,
	pub is_loading: bool,
	/// Request the published quote belongs to
	pub request: Option<Arc<SwapRequest>>,
	/// Sequence token of the cycle that produced this state
	pub sequence: u64,
	pub notice: Option<QuoteNotice>,
}

impl SolverSession {
	pub fn empty(current_solver: SolverId) -> Self {
		Self {
			current_solver,
			effective_solver: SolverId::None,
			quote: Quote::zero(SolverId::None),
			request_hash: None,
			is_loading: false,
			request: None,
			sequence: 0,
			notice: None,
		}
	}

	/// True when execution has a solver and an executable quote to act on
	pub fn is_executable(&self) -> bool {
		!self.is_loading
			&& self.effective_solver != SolverId::None
			&& self.quote.is_executable()
			&& self.request.is_some()
	}
}

impl Default for SolverSession {
	fn default() -> Self {
		Self::empty(SolverId::None)
	}
}
