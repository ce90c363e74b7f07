//! End-to-end quoting through an engine built with mock solvers

use std::sync::Arc;
use std::time::Duration;

use vault_solver::alloy_primitives::U256;
use vault_solver::mocks::{MockQuote, MockSolver};
use vault_solver::models::test_utils::{
	deposit_request, swap_request, token, token_with_solvers, TEST_USDC, TEST_USER, TEST_VAULT,
};
use vault_solver::{noop_status_handler, QuoteNotice, SolverBackend, SolverId};

mod mocks;

use mocks::{builder_with_wallet, engine_with, test_builder, vault_wallet};

fn amount(value: u64) -> U256 {
	U256::from(value)
}

#[tokio::test]
async fn test_falls_back_to_next_aggregator() {
	let a = Arc::new(MockSolver::new(SolverId::AggregatorA).unavailable());
	let b = Arc::new(MockSolver::new(SolverId::AggregatorB).with_rate(2, 1));
	let engine = engine_with(&[a.clone(), b.clone()]);
	let (orchestrator, _) = engine.session().unwrap();

	let session = orchestrator
		.refresh(Arc::new(deposit_request(amount(100))), SolverId::AggregatorA)
		.await
		.unwrap();

	assert_eq!(session.current_solver, SolverId::AggregatorA);
	assert_eq!(session.effective_solver, SolverId::AggregatorB);
	assert_eq!(session.quote.raw, amount(200));
	assert_eq!(session.quote.solver, SolverId::AggregatorB);
	assert!(!session.is_loading);
	assert_eq!(
		session.notice,
		Some(QuoteNotice::SelectedSolverUnavailable {
			selected: SolverId::AggregatorA,
			fallback: SolverId::AggregatorB,
		})
	);
	assert_eq!(a.init_count(), 1);
	assert_eq!(b.init_count(), 1);
}

#[tokio::test]
async fn test_selected_solver_wins_when_it_quotes() {
	let a = Arc::new(MockSolver::new(SolverId::AggregatorA));
	let b = Arc::new(MockSolver::new(SolverId::AggregatorB).with_rate(3, 1));
	let engine = engine_with(&[a, b]);
	let (orchestrator, _) = engine.session().unwrap();

	let session = orchestrator
		.refresh(Arc::new(deposit_request(amount(100))), SolverId::AggregatorA)
		.await
		.unwrap();

	// priority order decides, not the better price
	assert_eq!(session.effective_solver, SolverId::AggregatorA);
	assert_eq!(session.quote.raw, amount(100));
	assert!(session.notice.is_none());
	assert!(session.is_executable());
}

#[tokio::test]
async fn test_zero_amount_publishes_no_route_without_dispatch() {
	let a = Arc::new(MockSolver::new(SolverId::AggregatorA));
	let engine = engine_with(&[a.clone()]);
	let (orchestrator, _) = engine.session().unwrap();

	let session = orchestrator
		.refresh(Arc::new(deposit_request(U256::ZERO)), SolverId::AggregatorA)
		.await
		.unwrap();

	assert_eq!(session.effective_solver, SolverId::None);
	assert!(!session.quote.is_executable());
	assert!(!session.is_loading);
	assert_eq!(a.init_count(), 0);
}

#[tokio::test]
async fn test_token_capabilities_gate_dispatch() {
	let a = Arc::new(MockSolver::new(SolverId::AggregatorA));
	let b = Arc::new(MockSolver::new(SolverId::AggregatorB));
	let engine = engine_with(&[a.clone(), b.clone()]);
	let (orchestrator, _) = engine.session().unwrap();

	let request = swap_request(
		token_with_solvers(TEST_USDC, 6, [SolverId::AggregatorB]),
		token(TEST_VAULT, 6),
		amount(50),
		true,
	);
	let session = orchestrator
		.refresh(Arc::new(request), SolverId::AggregatorA)
		.await
		.unwrap();

	assert_eq!(a.init_count(), 0);
	assert_eq!(b.init_count(), 1);
	assert_eq!(session.effective_solver, SolverId::AggregatorB);
}

#[tokio::test]
async fn test_disabled_solver_is_not_dispatched() {
	let a = Arc::new(MockSolver::new(SolverId::AggregatorA).disabled());
	let b = Arc::new(MockSolver::new(SolverId::AggregatorB));
	let engine = engine_with(&[a.clone(), b]);
	let (orchestrator, _) = engine.session().unwrap();

	let session = orchestrator
		.refresh(Arc::new(deposit_request(amount(10))), SolverId::AggregatorA)
		.await
		.unwrap();

	assert_eq!(a.init_count(), 0);
	assert_eq!(session.effective_solver, SolverId::AggregatorB);
	assert!(!engine.enabled_solvers().contains(&SolverId::AggregatorA));
}

#[tokio::test]
async fn test_panicking_solver_counts_as_no_route() {
	let a = Arc::new(MockSolver::new(SolverId::AggregatorA).with_quote(MockQuote::Panic));
	let b = Arc::new(MockSolver::new(SolverId::AggregatorB));
	let engine = engine_with(&[a, b]);
	let (orchestrator, _) = engine.session().unwrap();

	let session = orchestrator
		.refresh(Arc::new(deposit_request(amount(10))), SolverId::AggregatorA)
		.await
		.unwrap();

	assert_eq!(session.effective_solver, SolverId::AggregatorB);
}

#[tokio::test]
async fn test_all_candidates_failing_publishes_none() {
	let a = Arc::new(MockSolver::new(SolverId::AggregatorA).unavailable());
	let b = Arc::new(MockSolver::new(SolverId::AggregatorB).with_quote(MockQuote::Fixed(U256::ZERO)));
	let engine = engine_with(&[a, b]);
	let (orchestrator, _) = engine.session().unwrap();

	let session = orchestrator
		.refresh(Arc::new(deposit_request(amount(10))), SolverId::AggregatorA)
		.await
		.unwrap();

	assert_eq!(session.effective_solver, SolverId::None);
	assert!(!session.is_executable());
	assert_eq!(
		session.notice,
		Some(QuoteNotice::SelectedSolverUnavailable {
			selected: SolverId::AggregatorA,
			fallback: SolverId::None,
		})
	);
}

/// Aggregator-A-only input token, amount edited from 100 to 200 while the first
/// quote is still in flight
#[tokio::test]
async fn test_only_latest_request_is_published() {
	let a = Arc::new(
		MockSolver::new(SolverId::AggregatorA)
			.with_rate(95, 100)
			.with_delay(Duration::from_millis(50)),
	);
	let b = Arc::new(MockSolver::new(SolverId::AggregatorB));
	let engine = engine_with(&[a.clone(), b.clone()]);
	let (orchestrator, _) = engine.session().unwrap();
	let mut updates = orchestrator.subscribe();

	let request = |value: u64| {
		Arc::new(swap_request(
			token_with_solvers(TEST_USDC, 6, [SolverId::AggregatorA]),
			token(TEST_VAULT, 6),
			amount(value),
			true,
		))
	};

	let first = orchestrator.refresh(request(100), SolverId::AggregatorA);
	let second = async {
		tokio::time::sleep(Duration::from_millis(20)).await;
		orchestrator.refresh(request(200), SolverId::AggregatorA).await
	};
	let (first, second) = tokio::join!(first, second);

	assert!(first.is_none());
	let second = second.unwrap();
	assert_eq!(second.effective_solver, SolverId::AggregatorA);
	assert_eq!(second.quote.raw, amount(190));

	// the slower, older response never reaches subscribers
	tokio::time::sleep(Duration::from_millis(60)).await;
	let published = updates.borrow_and_update().clone();
	assert_eq!(published.quote.raw, amount(190));
	assert_eq!(
		published.request.as_ref().map(|request| request.input_amount),
		Some(amount(200))
	);
	assert_eq!(published.sequence, orchestrator.current_sequence());
	assert_eq!(a.init_count(), 2);
	assert_eq!(b.init_count(), 0);
}

#[tokio::test]
async fn test_loading_flag_is_published_while_quoting() {
	let a = Arc::new(MockSolver::new(SolverId::AggregatorA).with_delay(Duration::from_millis(50)));
	let engine = engine_with(&[a]);
	let (orchestrator, _) = engine.session().unwrap();
	let updates = orchestrator.subscribe();

	let refresh = orchestrator.refresh(Arc::new(deposit_request(amount(5))), SolverId::AggregatorA);
	let observe = async {
		tokio::time::sleep(Duration::from_millis(10)).await;
		updates.borrow().is_loading
	};
	let (session, was_loading) = tokio::join!(refresh, observe);

	assert!(was_loading);
	assert!(!session.unwrap().is_loading);
	assert!(!updates.borrow().is_loading);
}

#[tokio::test]
async fn test_request_hash_tracks_quoted_request() {
	let a = Arc::new(MockSolver::new(SolverId::AggregatorA));
	let engine = engine_with(&[a]);
	let (orchestrator, _) = engine.session().unwrap();

	let request = Arc::new(deposit_request(amount(100)));
	let first = orchestrator
		.refresh(request.clone(), SolverId::AggregatorA)
		.await
		.unwrap();
	let again = orchestrator
		.refresh(request, SolverId::AggregatorA)
		.await
		.unwrap();
	let other = orchestrator
		.refresh(Arc::new(deposit_request(amount(101))), SolverId::AggregatorA)
		.await
		.unwrap();

	assert!(first.request_hash.is_some());
	assert_eq!(first.request_hash, again.request_hash);
	assert_ne!(first.request_hash, other.request_hash);
}

#[tokio::test]
async fn test_sessions_do_not_share_state() {
	let a = Arc::new(MockSolver::new(SolverId::AggregatorA));
	let engine = engine_with(&[a]);
	let (first, _) = engine.session().unwrap();
	let (second, _) = engine.session().unwrap();

	first
		.refresh(Arc::new(deposit_request(amount(7))), SolverId::AggregatorA)
		.await
		.unwrap();

	assert_eq!(first.session().quote.raw, amount(7));
	assert!(second.session().request.is_none());
	assert_eq!(second.current_sequence(), 0);
}

fn fresh_aggregator(delay: Duration) -> Arc<dyn SolverBackend> {
	Arc::new(
		MockSolver::new(SolverId::AggregatorA)
			.with_allowance(U256::MAX)
			.with_delay(delay),
	)
}

#[tokio::test]
async fn test_later_session_keeps_earlier_route_executable() {
	let engine = test_builder()
		.with_backend(|| fresh_aggregator(Duration::ZERO))
		.build()
		.unwrap();
	let (first, first_exec) = engine.session().unwrap();
	let (second, second_exec) = engine.session().unwrap();

	first
		.refresh(Arc::new(deposit_request(amount(100))), SolverId::AggregatorA)
		.await
		.unwrap();
	second
		.refresh(Arc::new(deposit_request(amount(200))), SolverId::AggregatorA)
		.await
		.unwrap();

	let receipt = first_exec
		.execute_deposit(noop_status_handler(), || {})
		.await
		.unwrap();
	assert!(receipt.success);
	second_exec
		.execute_deposit(noop_status_handler(), || {})
		.await
		.unwrap();
}

#[tokio::test]
async fn test_overlapping_sessions_both_publish() {
	let engine = test_builder()
		.with_backend(|| fresh_aggregator(Duration::from_millis(50)))
		.build()
		.unwrap();
	let (first, first_exec) = engine.session().unwrap();
	let (second, second_exec) = engine.session().unwrap();

	let early = first.refresh(Arc::new(deposit_request(amount(100))), SolverId::AggregatorA);
	let late = async {
		tokio::time::sleep(Duration::from_millis(20)).await;
		second
			.refresh(Arc::new(deposit_request(amount(200))), SolverId::AggregatorA)
			.await
	};
	let (early, late) = tokio::join!(early, late);

	assert_eq!(early.unwrap().quote.raw, amount(100));
	assert_eq!(late.unwrap().quote.raw, amount(200));
	first_exec
		.execute_deposit(noop_status_handler(), || {})
		.await
		.unwrap();
	second_exec
		.execute_deposit(noop_status_handler(), || {})
		.await
		.unwrap();
}

#[tokio::test]
async fn test_builtin_backends_are_built_per_session() {
	let wallet = vault_wallet();
	wallet.set_allowance(TEST_USDC, TEST_USER, TEST_VAULT, U256::MAX);
	let engine = builder_with_wallet(wallet.clone()).build().unwrap();
	let (first, first_exec) = engine.session().unwrap();
	let (second, _) = engine.session().unwrap();

	let session = first
		.refresh(Arc::new(deposit_request(amount(1_000))), SolverId::Vanilla)
		.await
		.unwrap();
	assert_eq!(session.effective_solver, SolverId::Vanilla);
	second
		.refresh(Arc::new(deposit_request(amount(2_000))), SolverId::Vanilla)
		.await
		.unwrap();

	let receipt = first_exec
		.execute_deposit(noop_status_handler(), || {})
		.await
		.unwrap();
	assert!(receipt.success);
	assert_eq!(wallet.sent_transactions().len(), 1);
}
