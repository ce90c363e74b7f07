//! Quote orchestration with last-request-wins publishing
//!
//! Every `refresh` takes a fresh sequence token, dispatches the request to the
//! eligible candidates of the selected solver's category concurrently, and
//! publishes the best valid quote only if no newer `refresh` or `reset` started in
//! the meantime. Superseded upstream calls are not aborted; their results are
//! dropped when they arrive.

use futures::future::join_all;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use vs_solvers::SolverRegistry;
use vs_types::{
	DigestPayload, Quote, QuoteNotice, QuotedRequest, SolverId, SolverSession, SwapRequest,
};

use crate::hasher::{RequestHasher, RequestHasherTrait};

/// Outcome of one dispatched candidate
#[derive(Debug, Clone)]
struct CandidateOutcome {
	solver: SolverId,
	quote: Option<Quote>,
}

pub struct QuoteOrchestrator {
	registry: Arc<SolverRegistry>,
	hasher: Arc<dyn RequestHasherTrait>,
	sequence: AtomicU64,
	state: watch::Sender<SolverSession>,
}

impl QuoteOrchestrator {
	pub fn new(registry: Arc<SolverRegistry>) -> Self {
		Self::with_hasher(registry, Arc::new(RequestHasher::default()))
	}

	pub fn with_hasher(registry: Arc<SolverRegistry>, hasher: Arc<dyn RequestHasherTrait>) -> Self {
		let (state, _) = watch::channel(SolverSession::default());
		Self {
			registry,
			hasher,
			sequence: AtomicU64::new(0),
			state,
		}
	}

	pub fn subscribe(&self) -> watch::Receiver<SolverSession> {
		self.state.subscribe()
	}

	/// Snapshot of the published session
	pub fn session(&self) -> SolverSession {
		self.state.borrow().clone()
	}

	pub fn current_sequence(&self) -> u64 {
		self.sequence.load(Ordering::SeqCst)
	}

	pub fn registry(&self) -> &Arc<SolverRegistry> {
		&self.registry
	}

	/// Discard any in-flight cycle and publish an empty session
	pub fn reset(&self, selected: SolverId) {
		let sequence = self.sequence.fetch_add(1, Ordering::SeqCst) + 1;
		debug!("Session reset at sequence {}", sequence);
		self.state.send_replace(SolverSession {
			sequence,
			..SolverSession::empty(selected)
		});
	}

	/// Quote `request` for `selected`, falling back within its category
	///
	/// Returns the published session, or `None` when a newer cycle superseded
	/// this one before it finished.
	pub async fn refresh(
		&self,
		request: Arc<SwapRequest>,
		selected: SolverId,
	) -> Option<SolverSession> {
		let sequence = self.sequence.fetch_add(1, Ordering::SeqCst) + 1;

		if request.has_zero_amount() {
			debug!("Sequence {}: zero amount, publishing no route", sequence);
			let session = self.build_session(sequence, &request, selected, SolverId::None, None, None);
			return self.publish(sequence, session);
		}

		self.publish_loading(sequence, selected);

		let dispatched = self.dispatch(sequence, &request, selected).await;
		let winner = dispatched
			.iter()
			.find(|outcome| {
				outcome
					.quote
					.as_ref()
					.is_some_and(|quote| quote.is_executable())
					&& self.registry.is_enabled(outcome.solver)
			})
			.cloned();

		let selected_failed = dispatched
			.iter()
			.any(|outcome| outcome.solver == selected)
			&& winner.as_ref().map(|w| w.solver) != Some(selected);

		let (effective, quote) = match winner {
			Some(outcome) => (outcome.solver, outcome.quote),
			None => (SolverId::None, None),
		};
		let notice = selected_failed.then_some(QuoteNotice::SelectedSolverUnavailable {
			selected,
			fallback: effective,
		});

		let session = self.build_session(sequence, &request, selected, effective, quote, notice);
		self.publish(sequence, session)
	}

	/// Run `init` on every enabled, eligible candidate and collect the outcomes in
	/// candidate order
	async fn dispatch(
		&self,
		sequence: u64,
		request: &Arc<SwapRequest>,
		selected: SolverId,
	) -> Vec<CandidateOutcome> {
		let mut solvers = Vec::new();
		let mut tasks = Vec::new();

		for solver in self.registry.candidates(selected) {
			if solver == SolverId::None {
				continue;
			}
			let backend = match self.registry.get(solver) {
				Ok(backend) => backend,
				Err(e) => {
					debug!("Sequence {}: skipping {}: {}", sequence, solver, e);
					continue;
				},
			};
			if !backend.is_enabled() {
				debug!("Sequence {}: {} is disabled", sequence, solver);
				continue;
			}
			if !request.is_eligible_for(solver) {
				debug!("Sequence {}: token does not list {}", sequence, solver);
				continue;
			}

			debug!("Sequence {}: dispatching {}", sequence, solver);
			let request = Arc::clone(request);
			solvers.push(solver);
			tasks.push(tokio::spawn(async move { backend.init(&request).await }));
		}

		join_all(tasks)
			.await
			.into_iter()
			.zip(solvers)
			.map(|(result, solver)| {
				let quote = match result {
					Ok(quote) => quote,
					Err(e) => {
						warn!("Sequence {}: {} quote task failed: {}", sequence, solver, e);
						None
					},
				};
				CandidateOutcome { solver, quote }
			})
			.collect()
	}

	fn build_session(
		&self,
		sequence: u64,
		request: &Arc<SwapRequest>,
		selected: SolverId,
		effective: SolverId,
		quote: Option<Quote>,
		notice: Option<QuoteNotice>,
	) -> SolverSession {
		let quote = quote.unwrap_or_else(|| Quote::zero(SolverId::None));
		let request_hash = QuotedRequest::new(request, effective, &quote)
			.to_digest_payload()
			.map_err(Into::into)
			.and_then(|payload| self.hasher.hash_payload(&payload));
		let request_hash = match request_hash {
			Ok(hash) => Some(hash),
			Err(e) => {
				warn!("Sequence {}: failed to hash request: {}", sequence, e);
				None
			},
		};

		SolverSession {
			current_solver: selected,
			effective_solver: effective,
			quote,
			request_hash,
			is_loading: false,
			request: Some(Arc::clone(request)),
			sequence,
			notice,
		}
	}

	fn publish_loading(&self, sequence: u64, selected: SolverId) {
		self.state.send_if_modified(|session| {
			if self.sequence.load(Ordering::SeqCst) != sequence {
				return false;
			}
			session.current_solver = selected;
			session.is_loading = true;
			true
		});
	}

	fn publish(&self, sequence: u64, session: SolverSession) -> Option<SolverSession> {
		let published = self.state.send_if_modified(|current| {
			if self.sequence.load(Ordering::SeqCst) != sequence {
				return false;
			}
			*current = session.clone();
			true
		});

		if published {
			info!(
				"Sequence {}: published {} with quote {}",
				sequence, session.effective_solver, session.quote.raw
			);
			Some(session)
		} else {
			debug!(
				"Sequence {} superseded by {}, result discarded",
				sequence,
				self.current_sequence()
			);
			None
		}
	}
}

impl std::fmt::Debug for QuoteOrchestrator {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("QuoteOrchestrator")
			.field("registry", &self.registry)
			.field("sequence", &self.current_sequence())
			.finish()
	}
}
