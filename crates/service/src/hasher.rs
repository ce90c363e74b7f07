//! Request hashing
//!
//! Derives the identifier a published session carries from its
//! `(request, solver, quote)` triple: plain SHA-256 by default, HMAC-SHA256 when
//! a key is configured.

use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};
use thiserror::Error;
use vs_types::{DigestPayload, QuotedRequest, SecretString};

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Error)]
pub enum HashError {
	#[error("Failed to create HMAC: {0}")]
	HmacCreation(String),

	#[error("Failed to serialize payload: {0}")]
	Serialization(#[from] vs_types::serde_json::Error),
}

#[cfg_attr(test, mockall::automock)]
pub trait RequestHasherTrait: Send + Sync {
	/// Hex digest of an already serialized payload
	fn hash_payload(&self, payload: &str) -> Result<String, HashError>;

	/// Constant-time comparison against a previously computed digest
	fn verify_payload(&self, payload: &str, expected: &str) -> Result<bool, HashError>;
}

#[derive(Debug, Clone, Default)]
pub struct RequestHasher {
	key: Option<SecretString>,
}

impl RequestHasher {
	pub fn new(key: Option<SecretString>) -> Self {
		Self {
			key: key.filter(|k| !k.is_empty()),
		}
	}

	pub fn keyed(key: SecretString) -> Self {
		Self::new(Some(key))
	}

	pub fn is_keyed(&self) -> bool {
		self.key.is_some()
	}

	pub fn hash<T: DigestPayload>(&self, data: &T) -> Result<String, HashError> {
		let payload = data.to_digest_payload()?;
		self.hash_payload(&payload)
	}

	/// Identifier of a published `(request, solver, quote)` triple
	pub fn hash_quoted(&self, quoted: &QuotedRequest<'_>) -> Result<String, HashError> {
		self.hash(quoted)
	}

	pub fn verify<T: DigestPayload>(&self, data: &T, expected: &str) -> Result<bool, HashError> {
		let payload = data.to_digest_payload()?;
		self.verify_payload(&payload, expected)
	}
}

impl RequestHasherTrait for RequestHasher {
	fn hash_payload(&self, payload: &str) -> Result<String, HashError> {
		let digest = match &self.key {
			Some(key) => {
				let mut mac = HmacSha256::new_from_slice(key.expose_bytes())
					.map_err(|e| HashError::HmacCreation(e.to_string()))?;
				mac.update(payload.as_bytes());
				mac.finalize().into_bytes().to_vec()
			},
			None => Sha256::digest(payload.as_bytes()).to_vec(),
		};
		Ok(hex::encode(digest))
	}

	fn verify_payload(&self, payload: &str, expected: &str) -> Result<bool, HashError> {
		let calculated = self.hash_payload(payload)?;
		Ok(constant_time_eq(calculated.as_bytes(), expected.as_bytes()))
	}
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
	if a.len() != b.len() {
		return false;
	}

	let mut result = 0u8;
	for (x, y) in a.iter().zip(b.iter()) {
		result |= x ^ y;
	}
	result == 0
}

#[cfg(test)]
mod tests {
	use super::*;
	use alloy_primitives::U256;
	use vs_types::test_utils::{deposit_request, withdraw_request};
	use vs_types::{Quote, SolverId};

	fn quote(raw: u64) -> Quote {
		Quote::new(U256::from(raw), 6, SolverId::AggregatorA)
	}

	#[test]
	fn test_hash_is_deterministic() {
		let hasher = RequestHasher::default();
		let request = deposit_request(U256::from(100u64));
		let quote = quote(95);

		let first = hasher
			.hash_quoted(&QuotedRequest::new(&request, SolverId::AggregatorA, &quote))
			.unwrap();
		let second = hasher
			.hash_quoted(&QuotedRequest::new(
				&request.clone(),
				SolverId::AggregatorA,
				&quote.clone(),
			))
			.unwrap();
		assert_eq!(first, second);
		assert_eq!(first.len(), 64);
	}

	#[test]
	fn test_any_field_change_changes_hash() {
		let hasher = RequestHasher::default();
		let request = deposit_request(U256::from(100u64));
		let base = hasher
			.hash_quoted(&QuotedRequest::new(&request, SolverId::AggregatorA, &quote(95)))
			.unwrap();

		let other_amount = request.with_amount(U256::from(101u64));
		let quote_95 = quote(95);
		let quote_96 = quote(96);
		let variants = [
			QuotedRequest::new(&other_amount, SolverId::AggregatorA, &quote_95),
			QuotedRequest::new(&request, SolverId::AggregatorB, &quote_95),
			QuotedRequest::new(&request, SolverId::AggregatorA, &quote_96),
		];
		for variant in &variants {
			assert_ne!(hasher.hash_quoted(variant).unwrap(), base);
		}

		let withdraw = withdraw_request(U256::from(100u64));
		assert_ne!(
			hasher
				.hash_quoted(&QuotedRequest::new(&withdraw, SolverId::AggregatorA, &quote(95)))
				.unwrap(),
			base
		);
	}

	#[test]
	fn test_keyed_hash_differs_and_verifies() {
		let plain = RequestHasher::default();
		let keyed = RequestHasher::keyed(SecretString::from("hash-key"));
		let request = deposit_request(U256::from(100u64));
		let quote = quote(95);
		let quoted = QuotedRequest::new(&request, SolverId::AggregatorA, &quote);

		let digest = keyed.hash(&quoted).unwrap();
		assert_ne!(digest, plain.hash(&quoted).unwrap());
		assert!(keyed.verify(&quoted, &digest).unwrap());
		assert!(!keyed.verify(&quoted, "deadbeef").unwrap());
	}

	#[test]
	fn test_empty_key_falls_back_to_plain_digest() {
		assert!(!RequestHasher::new(Some(SecretString::from(""))).is_keyed());
		assert!(RequestHasher::keyed(SecretString::from("k")).is_keyed());
	}

	#[test]
	fn test_mock_hasher() {
		let mut mock = MockRequestHasherTrait::new();
		mock.expect_hash_payload()
			.returning(|_| Ok("fixed".to_string()));
		assert_eq!(mock.hash_payload("anything").unwrap(), "fixed");
	}
}
