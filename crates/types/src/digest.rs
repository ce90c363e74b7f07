//! Canonical payloads fed to the request hasher

use serde::Serialize;

use crate::quotes::Quote;
use crate::requests::SwapRequest;
use crate::solvers::SolverId;

/// Types that can be reduced to a stable string for hashing
///
/// Two values produce the same payload iff every field that identifies them is
/// equal.
pub trait DigestPayload {
	fn to_digest_payload(&self) -> Result<String, serde_json::Error>;
}

/// The `(request, solver, quote)` triple a published session is identified by
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuotedRequest<'a> {
	pub request: &'a SwapRequest,
	pub solver: SolverId,
	pub quote: &'a Quote,
}

impl<'a> QuotedRequest<'a> {
	pub fn new(request: &'a SwapRequest, solver: SolverId, quote: &'a Quote) -> Self {
		Self {
			request,
			solver,
			quote,
		}
	}
}

impl DigestPayload for QuotedRequest<'_> {
	/// Struct fields serialize in declaration order and `solve_via` is a
	/// `BTreeSet`, so the JSON form is deterministic
	fn to_digest_payload(&self) -> Result<String, serde_json::Error> {
		serde_json::to_string(self)
	}
}
