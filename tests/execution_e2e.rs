//! Approve and execute against the published solver

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use vault_solver::alloy_primitives::U256;
use vault_solver::mocks::MockSolver;
use vault_solver::models::test_utils::{deposit_request, swap_request, token, TEST_VAULT};
use vault_solver::models::NATIVE_TOKEN_ADDRESS;
use vault_solver::{noop_status_handler, SolverError, SolverId, TxStatus};

mod mocks;

use mocks::{engine_with, recording_handler};

#[tokio::test]
async fn test_approve_then_deposit() {
	let a = Arc::new(MockSolver::new(SolverId::AggregatorA));
	let engine = engine_with(&[a.clone()]);
	let (orchestrator, coordinator) = engine.session().unwrap();
	let amount = U256::from(1_000u64);

	orchestrator
		.refresh(Arc::new(deposit_request(amount)), SolverId::AggregatorA)
		.await
		.unwrap();
	assert_eq!(coordinator.retrieve_allowance(false).await.unwrap(), U256::ZERO);

	let (handler, seen) = recording_handler();
	let err = coordinator.execute_deposit(handler, || {}).await.unwrap_err();
	assert!(matches!(
		err,
		SolverError::InsufficientAllowance { required, available }
			if required == amount && available == U256::ZERO
	));
	assert!(matches!(seen.lock().unwrap()[0], TxStatus::Error { .. }));
	assert!(a.executions().is_empty());

	let successes = Arc::new(AtomicUsize::new(0));
	let counter = successes.clone();
	let receipt = coordinator
		.approve(amount, noop_status_handler(), move || {
			counter.fetch_add(1, Ordering::SeqCst);
		})
		.await
		.unwrap();
	assert!(receipt.is_some());
	assert_eq!(a.approvals(), vec![amount]);
	assert_eq!(a.forced_allowance_reads(), 1);

	let (handler, seen) = recording_handler();
	let counter = successes.clone();
	let receipt = coordinator
		.execute_deposit(handler, move || {
			counter.fetch_add(1, Ordering::SeqCst);
		})
		.await
		.unwrap();
	assert!(receipt.success);
	assert_eq!(successes.load(Ordering::SeqCst), 2);
	assert_eq!(a.executions().len(), 1);
	assert_eq!(a.forced_allowance_reads(), 2);

	tokio::time::sleep(Duration::from_millis(60)).await;
	let seen = seen.lock().unwrap();
	assert!(seen[0].is_pending());
	assert!(matches!(seen[1], TxStatus::Success { .. }));
	assert_eq!(seen[2], TxStatus::Idle);
}

#[tokio::test]
async fn test_approve_skips_when_allowance_covers_amount() {
	let a = Arc::new(MockSolver::new(SolverId::AggregatorA).with_allowance(U256::MAX));
	let engine = engine_with(&[a.clone()]);
	let (orchestrator, coordinator) = engine.session().unwrap();

	orchestrator
		.refresh(Arc::new(deposit_request(U256::from(5u64))), SolverId::AggregatorA)
		.await
		.unwrap();

	let receipt = coordinator
		.approve(U256::from(5u64), noop_status_handler(), || {})
		.await
		.unwrap();
	assert!(receipt.is_none());
	assert!(a.approvals().is_empty());
}

#[tokio::test]
async fn test_native_input_needs_no_approval() {
	let a = Arc::new(MockSolver::new(SolverId::AggregatorA));
	let engine = engine_with(&[a.clone()]);
	let (orchestrator, coordinator) = engine.session().unwrap();

	let request = swap_request(
		token(NATIVE_TOKEN_ADDRESS, 18),
		token(TEST_VAULT, 6),
		U256::from(10u64).pow(U256::from(18u64)),
		true,
	);
	orchestrator
		.refresh(Arc::new(request), SolverId::AggregatorA)
		.await
		.unwrap();

	assert_eq!(coordinator.retrieve_allowance(false).await.unwrap(), U256::MAX);
	coordinator
		.execute_deposit(noop_status_handler(), || {})
		.await
		.unwrap();
	assert!(a.approvals().is_empty());
	assert_eq!(a.executions().len(), 1);
}

#[tokio::test]
async fn test_execution_rejected_while_quote_in_flight() {
	let a = Arc::new(
		MockSolver::new(SolverId::AggregatorA)
			.with_allowance(U256::MAX)
			.with_delay(Duration::from_millis(50)),
	);
	let engine = engine_with(&[a.clone()]);
	let (orchestrator, coordinator) = engine.session().unwrap();

	let refresh = orchestrator.refresh(
		Arc::new(deposit_request(U256::from(10u64))),
		SolverId::AggregatorA,
	);
	let execute = async {
		tokio::time::sleep(Duration::from_millis(10)).await;
		coordinator.execute_deposit(noop_status_handler(), || {}).await
	};
	let (session, result) = tokio::join!(refresh, execute);

	assert!(session.is_some());
	assert!(matches!(result, Err(SolverError::QuoteInFlight)));
	assert!(a.executions().is_empty());
}

#[tokio::test]
async fn test_direction_mismatch_is_rejected() {
	let a = Arc::new(MockSolver::new(SolverId::AggregatorA).with_allowance(U256::MAX));
	let engine = engine_with(&[a.clone()]);
	let (orchestrator, coordinator) = engine.session().unwrap();

	orchestrator
		.refresh(Arc::new(deposit_request(U256::from(10u64))), SolverId::AggregatorA)
		.await
		.unwrap();

	let err = coordinator
		.execute_withdraw(noop_status_handler(), || {})
		.await
		.unwrap_err();
	assert!(matches!(err, SolverError::DirectionMismatch));
	assert!(a.executions().is_empty());
}

#[tokio::test]
async fn test_reverted_execution_reports_error_then_idle() {
	let a = Arc::new(
		MockSolver::new(SolverId::AggregatorA)
			.with_allowance(U256::MAX)
			.failing_execution(),
	);
	let engine = engine_with(&[a]);
	let (orchestrator, coordinator) = engine.session().unwrap();

	orchestrator
		.refresh(Arc::new(deposit_request(U256::from(10u64))), SolverId::AggregatorA)
		.await
		.unwrap();

	let (handler, seen) = recording_handler();
	let successes = Arc::new(AtomicUsize::new(0));
	let counter = successes.clone();
	let err = coordinator
		.execute_deposit(handler, move || {
			counter.fetch_add(1, Ordering::SeqCst);
		})
		.await
		.unwrap_err();
	assert!(matches!(err, SolverError::Reverted { .. }));
	assert_eq!(successes.load(Ordering::SeqCst), 0);

	tokio::time::sleep(Duration::from_millis(60)).await;
	let seen = seen.lock().unwrap();
	assert!(seen[0].is_pending());
	assert!(matches!(&seen[1], TxStatus::Error { .. }));
	assert_eq!(seen[2], TxStatus::Idle);
}

#[tokio::test]
async fn test_no_route_cannot_be_executed() {
	let a = Arc::new(MockSolver::new(SolverId::AggregatorA).unavailable());
	let b = Arc::new(MockSolver::new(SolverId::AggregatorB).unavailable());
	let engine = engine_with(&[a, b]);
	let (orchestrator, coordinator) = engine.session().unwrap();

	orchestrator
		.refresh(Arc::new(deposit_request(U256::from(10u64))), SolverId::AggregatorA)
		.await
		.unwrap();

	let err = coordinator
		.execute_deposit(noop_status_handler(), || {})
		.await
		.unwrap_err();
	assert!(matches!(err, SolverError::MissingRoute(SolverId::None)));
}
