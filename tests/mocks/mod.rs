//! Shared fixtures for engine-level tests

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use vault_solver::config::{ExecutionSettings, LoggingSettings, Settings};
use vault_solver::alloy_primitives::U256;
use vault_solver::mocks::MockSolver;
use vault_solver::models::test_utils::{MockWallet, TEST_USER, TEST_VAULT};
use vault_solver::{
	ClientCache, LogFormat, SolverBackend, SolverEngine, SolverEngineBuilder, StatusHandler,
	TxStatus,
};

/// Defaults with a short status reset so terminal statuses settle quickly
pub fn test_settings() -> Settings {
	Settings {
		execution: ExecutionSettings {
			status_reset_ms: 20,
			..ExecutionSettings::default()
		},
		logging: LoggingSettings {
			level: "debug".to_string(),
			format: LogFormat::Compact,
			structured: false,
		},
		..Settings::default()
	}
}

pub fn test_builder() -> SolverEngineBuilder {
	builder_with_wallet(Arc::new(MockWallet::new(TEST_USER)))
}

pub fn builder_with_wallet(wallet: Arc<MockWallet>) -> SolverEngineBuilder {
	SolverEngineBuilder::new()
		.with_settings(test_settings())
		.with_wallet(wallet)
		.with_client_cache(ClientCache::new())
}

/// Wallet answering `pricePerShare` of 1.0 for the 6 decimal test vault
pub fn vault_wallet() -> Arc<MockWallet> {
	let wallet = Arc::new(MockWallet::new(TEST_USER));
	wallet.script_read(
		TEST_VAULT,
		[0x99, 0x53, 0x0b, 0x06],
		U256::from(1_000_000u64).to_be_bytes::<32>().to_vec(),
	);
	wallet
}

/// Engine whose listed solvers are replaced by the given mocks, shared by every
/// session so tests can inspect their calls
pub fn engine_with(solvers: &[Arc<MockSolver>]) -> SolverEngine {
	solvers
		.iter()
		.fold(test_builder(), |builder, solver| {
			let solver = solver.clone();
			builder.with_backend(move || solver.clone() as Arc<dyn SolverBackend>)
		})
		.build()
		.unwrap()
}

/// Status handler that records every transition
pub fn recording_handler() -> (StatusHandler, Arc<Mutex<Vec<TxStatus>>>) {
	let seen = Arc::new(Mutex::new(Vec::new()));
	let sink = Arc::clone(&seen);
	let handler: StatusHandler =
		Arc::new(move |status: TxStatus| sink.lock().unwrap().push(status));
	(handler, seen)
}
