//! Conversions between raw base-unit amounts and human-readable values

use alloy_primitives::{utils as units, U256};
use rust_decimal::Decimal;

use crate::requests::RequestError;

/// Largest scale `Decimal` can carry
const MAX_DECIMAL_SCALE: u32 = 28;

/// Parse a human amount such as `"1.5"` into base units
///
/// Rejects negative values, exponents, hex, and more fractional digits than
/// `decimals`; alloy would otherwise truncate the excess silently.
pub fn parse_units(display: &str, decimals: u8) -> Result<U256, RequestError> {
	let trimmed = display.trim();
	let (whole, fraction) = trimmed.split_once('.').unwrap_or((trimmed, ""));
	let all_digits = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
	if !all_digits(whole) || !all_digits(fraction) || (whole.is_empty() && fraction.is_empty()) {
		return Err(RequestError::InvalidAmount(display.to_string()));
	}
	if fraction.len() > decimals as usize {
		return Err(RequestError::ExcessPrecision {
			decimals,
			given: fraction.len(),
		});
	}

	let normalized = match (whole, fraction) {
		(whole, "") => whole.to_string(),
		("", fraction) => format!("0.{}", fraction),
		(whole, fraction) => format!("{}.{}", whole, fraction),
	};
	units::parse_units(&normalized, decimals)
		.map(|parsed| parsed.get_absolute())
		.map_err(|e| RequestError::Units(e.to_string()))
}

/// Render base units as a decimal string without trailing zeros
pub fn format_units(raw: U256, decimals: u8) -> Result<String, RequestError> {
	let formatted =
		units::format_units(raw, decimals).map_err(|e| RequestError::Units(e.to_string()))?;
	if !formatted.contains('.') {
		return Ok(formatted);
	}
	Ok(formatted
		.trim_end_matches('0')
		.trim_end_matches('.')
		.to_string())
}

/// Convert base units to a `Decimal`, dropping the least significant digits
/// when the value does not fit the 96-bit mantissa
pub fn normalize_amount(raw: U256, decimals: u8) -> Decimal {
	let max_mantissa = U256::from((1u128 << 96) - 1);
	let ten = U256::from(10u8);
	let mut value = raw;
	let mut scale = decimals as u32;

	while value > max_mantissa || scale > MAX_DECIMAL_SCALE {
		if scale == 0 {
			return Decimal::MAX;
		}
		value /= ten;
		scale -= 1;
	}

	let mantissa: u128 = value.to::<u128>();
	Decimal::try_from_i128_with_scale(mantissa as i128, scale).unwrap_or(Decimal::MAX)
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::str::FromStr;

	#[test]
	fn test_parse_units() {
		assert_eq!(
			parse_units("1.5", 18).unwrap(),
			U256::from(1_500_000_000_000_000_000u128)
		);
		assert_eq!(parse_units("100", 6).unwrap(), U256::from(100_000_000u64));
		assert_eq!(parse_units(".25", 2).unwrap(), U256::from(25u64));
		assert_eq!(parse_units("0.000", 6).unwrap(), U256::ZERO);
	}

	#[test]
	fn test_parse_units_rejects_bad_input() {
		assert!(matches!(
			parse_units("1.1234567", 6),
			Err(RequestError::ExcessPrecision {
				decimals: 6,
				given: 7
			})
		));
		assert!(parse_units("-1", 18).is_err());
		assert!(parse_units("1e18", 18).is_err());
		assert!(parse_units("", 18).is_err());
		assert!(parse_units(".", 18).is_err());
		assert!(parse_units("0x10", 18).is_err());
	}

	#[test]
	fn test_format_units() {
		assert_eq!(format_units(U256::from(1_500_000u64), 6).unwrap(), "1.5");
		assert_eq!(format_units(U256::from(42u64), 6).unwrap(), "0.000042");
		assert_eq!(format_units(U256::from(7_000_000u64), 6).unwrap(), "7");
		assert_eq!(format_units(U256::from(120u64), 0).unwrap(), "120");
		assert_eq!(
			format_units(U256::from(10u64).pow(U256::from(18u64)), 18).unwrap(),
			"1"
		);
	}

	#[test]
	fn test_normalize_amount() {
		assert_eq!(
			normalize_amount(U256::from(95_000_000u64), 6),
			Decimal::from_str("95").unwrap()
		);
		assert_eq!(
			normalize_amount(U256::from(1u64), 18),
			Decimal::from_str("0.000000000000000001").unwrap()
		);
	}

	#[test]
	fn test_normalize_amount_truncates_large_values() {
		let raw = U256::from_str("123456789012345678901234567890123456789").unwrap();
		let normalized = normalize_amount(raw, 18);
		assert_eq!(normalized.trunc(), Decimal::from_str("123456789012345678901").unwrap());

		assert_eq!(normalize_amount(U256::MAX, 0), Decimal::MAX);
	}
}
