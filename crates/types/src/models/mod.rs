//! Shared value types: amounts, contract addresses and secrets

pub mod amounts;
pub mod contracts;
pub mod secret_string;

pub use amounts::{format_units, normalize_amount, parse_units};
pub use contracts::{ChainContracts, ContractBook, NATIVE_TOKEN_ADDRESS};
pub use secret_string::SecretString;
