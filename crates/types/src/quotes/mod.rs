//! Normalized quote published by the orchestrator

use alloy_primitives::U256;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::normalize_amount;
use crate::solvers::SolverId;

/// Predicted output of a solver, in the output token's units
///
/// A zero `raw` value is the "no executable route" sentinel, not an error.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Quote {
	pub raw: U256,
	pub normalized: Decimal,
	pub solver: SolverId,
}

impl Quote {
	pub fn new(raw: U256, output_decimals: u8, solver: SolverId) -> Self {
		Self {
			raw,
			normalized: normalize_amount(raw, output_decimals),
			solver,
		}
	}

	pub fn zero(solver: SolverId) -> Self {
		Self {
			raw: U256::ZERO,
			normalized: Decimal::ZERO,
			solver,
		}
	}

	pub fn is_executable(&self) -> bool {
		!self.raw.is_zero()
	}
}

impl Default for Quote {
	fn default() -> Self {
		Self::zero(SolverId::None)
	}
}
