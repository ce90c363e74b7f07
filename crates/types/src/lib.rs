//! Vault solver types
//!
//! Shared models and traits for the vault solver engine: solver identity and the
//! backend contract, request snapshots, quotes, the published session read model,
//! transaction status and the wallet adapter.

pub mod digest;
pub mod models;
pub mod quotes;
pub mod requests;
pub mod session;
pub mod solvers;
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
pub mod transactions;
pub mod wallet;

// Re-export chrono and serde_json for convenience
pub use chrono;
pub use serde_json;

pub use digest::{DigestPayload, QuotedRequest};
pub use models::{
	format_units, normalize_amount, parse_units, ChainContracts, ContractBook, SecretString,
	NATIVE_TOKEN_ADDRESS,
};
pub use quotes::Quote;
pub use requests::{
	RequestError, RequestResult, SwapRequest, SwapRequestBuilder, Token, VaultInfo, VaultVersion,
};
pub use session::{QuoteNotice, SolverSession};
pub use solvers::{
	BackendConfig, SolverBackend, SolverCategory, SolverError, SolverId, SolverResult,
};
pub use transactions::{ContractCall, TransactionRequest, TxReceipt, TxStatus};
pub use wallet::{WalletError, WalletProvider, WalletResult};
