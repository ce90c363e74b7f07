//! Vault solver service layer
//!
//! Quote orchestration across solver backends, the approve/execute coordinator
//! and request hashing.

pub mod coordinator;
pub mod hasher;
pub mod orchestrator;
pub mod status;

pub use coordinator::ExecutionCoordinator;
pub use hasher::{HashError, RequestHasher, RequestHasherTrait};
pub use orchestrator::QuoteOrchestrator;
pub use status::{noop_status_handler, StatusHandler, TxStatusTracker, DEFAULT_STATUS_RESET};
pub use vs_types::DigestPayload;
