//! Startup banner for the solver engine

use std::env;
use tracing::{info, warn};
use vs_types::SolverId;

use crate::Settings;

/// Service name, version, platform and configuration summary
pub fn log_engine_info(settings: &Settings) {
	let service_name = "vault-solver";
	let service_version = env!("CARGO_PKG_VERSION");

	info!("=== Vault Solver Engine Starting ===");
	info!("🚀 Service: {} v{}", service_name, service_version);
	info!("💻 Platform: {} ({})", env::consts::OS, env::consts::ARCH);

	if let Ok(rust_log) = env::var("RUST_LOG") {
		info!("🔧 Log Level: {}", rust_log);
	} else {
		info!("🔧 Log Level: {}", settings.logging.level);
	}

	info!(
		"⏱️ Status reset after {}ms, settlement polling every {}ms (max {})",
		settings.execution.status_reset_ms,
		settings.execution.settlement_poll_interval_ms,
		settings.execution.settlement_max_polls
	);

	for (solver, config) in &settings.solvers {
		if let Some(api_key) = &config.api_key {
			if api_key.is_plain() {
				warn!("🔑 API key for {} is a plain value in configuration", solver);
			}
		}
	}
	match &settings.security.request_hash_key {
		Some(key) => info!("🔐 Request hashes keyed from {}", key.description()),
		None => info!("🔐 Request hashes use plain SHA-256"),
	}

	info!(
		"🕒 Started at: {}",
		chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC")
	);
}

/// Logs the solvers available once the engine is built
pub fn log_engine_ready(enabled: &[SolverId]) {
	let names: Vec<&str> = enabled.iter().map(|id| id.as_str()).collect();
	info!("✅ Vault Solver Engine ready");
	info!("📡 {} solvers enabled: {}", names.len(), names.join(", "));
}
