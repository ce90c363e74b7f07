//! Per-invocation transaction status with automatic reset

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tracing::debug;
use vs_types::TxStatus;

/// Callback receiving every status transition of one invocation
pub type StatusHandler = Arc<dyn Fn(TxStatus) + Send + Sync>;

pub const DEFAULT_STATUS_RESET: Duration = Duration::from_millis(3_000);

pub fn noop_status_handler() -> StatusHandler {
	Arc::new(|_| {})
}

/// Drives `Idle → Pending → Success | Error → Idle` for one approve or execute
///
/// Terminal states fall back to `Idle` after `reset_after` unless the tracker
/// moved on in the meantime.
pub struct TxStatusTracker {
	handler: StatusHandler,
	reset_after: Duration,
	current: Arc<Mutex<TxStatus>>,
}

impl TxStatusTracker {
	pub fn new(handler: StatusHandler, reset_after: Duration) -> Self {
		Self {
			handler,
			reset_after,
			current: Arc::new(Mutex::new(TxStatus::Idle)),
		}
	}

	pub fn status(&self) -> TxStatus {
		self.current
			.lock()
			.map(|status| status.clone())
			.unwrap_or_else(|poisoned| poisoned.into_inner().clone())
	}

	pub fn pending(&self) {
		self.transition(TxStatus::pending());
	}

	pub fn succeed(&self) {
		self.transition(TxStatus::success());
		self.schedule_reset();
	}

	pub fn fail(&self, reason: impl Into<String>) {
		self.transition(TxStatus::error(reason));
		self.schedule_reset();
	}

	fn transition(&self, status: TxStatus) {
		set(&self.current, status.clone());
		(self.handler)(status);
	}

	fn schedule_reset(&self) {
		let expected = self.status();
		let current = Arc::clone(&self.current);
		let handler = Arc::clone(&self.handler);
		let delay = self.reset_after;

		tokio::spawn(async move {
			tokio::time::sleep(delay).await;
			let reset = {
				let mut status = current.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
				if *status == expected {
					*status = TxStatus::Idle;
					true
				} else {
					false
				}
			};
			if reset {
				debug!("Transaction status reset to idle after {:?}", delay);
				handler(TxStatus::Idle);
			}
		});
	}
}

fn set(current: &Mutex<TxStatus>, status: TxStatus) {
	let mut guard = current.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
	*guard = status;
}
