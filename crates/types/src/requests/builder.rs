//! Normalizes UI selections into a `SwapRequest`

use alloy_primitives::{Address, U256};

use super::{RequestError, RequestResult, SwapRequest, Token, VaultInfo, VaultVersion};
use crate::models::parse_units;

#[derive(Debug, Clone, Default)]
enum Amount {
	#[default]
	Unset,
	Raw(U256),
	/// Human-readable amount, converted with the input token's decimals at build time
	Display(String),
}

/// Builder for `SwapRequest`
///
/// `for_vault` derives token orientation from the direction; every other field
/// can be set individually.
#[derive(Debug, Clone, Default)]
pub struct SwapRequestBuilder {
	chain_id: Option<u64>,
	version: Option<VaultVersion>,
	from: Option<Address>,
	input_token: Option<Token>,
	output_token: Option<Token>,
	amount: Amount,
	is_depositing: Option<bool>,
	staking_pool_address: Option<Address>,
	migrator_address: Option<Address>,
	underlying_asset_address: Option<Address>,
}

impl SwapRequestBuilder {
	pub fn new() -> Self {
		Self::default()
	}

	/// Deposit `user_token` into the vault, or withdraw from the vault into it
	pub fn for_vault(vault: &VaultInfo, user_token: Token, is_depositing: bool) -> Self {
		let share = vault.share_token();
		let (input_token, output_token) = if is_depositing {
			(user_token, share)
		} else {
			(share, user_token)
		};

		Self {
			chain_id: Some(vault.chain_id),
			version: Some(vault.version),
			input_token: Some(input_token),
			output_token: Some(output_token),
			is_depositing: Some(is_depositing),
			staking_pool_address: vault.staking_pool_address,
			migrator_address: vault.migrator_address,
			underlying_asset_address: vault.underlying_asset_address,
			..Self::default()
		}
	}

	pub fn chain_id(mut self, chain_id: u64) -> Self {
		self.chain_id = Some(chain_id);
		self
	}

	pub fn version(mut self, version: VaultVersion) -> Self {
		self.version = Some(version);
		self
	}

	pub fn sender(mut self, from: Address) -> Self {
		self.from = Some(from);
		self
	}

	pub fn input_token(mut self, token: Token) -> Self {
		self.input_token = Some(token);
		self
	}

	pub fn output_token(mut self, token: Token) -> Self {
		self.output_token = Some(token);
		self
	}

	pub fn input_amount(mut self, amount: U256) -> Self {
		self.amount = Amount::Raw(amount);
		self
	}

	pub fn with_display_amount(mut self, amount: impl Into<String>) -> Self {
		self.amount = Amount::Display(amount.into());
		self
	}

	pub fn depositing(mut self, is_depositing: bool) -> Self {
		self.is_depositing = Some(is_depositing);
		self
	}

	pub fn staking_pool(mut self, address: Address) -> Self {
		self.staking_pool_address = Some(address);
		self
	}

	pub fn migrator(mut self, address: Address) -> Self {
		self.migrator_address = Some(address);
		self
	}

	pub fn underlying_asset(mut self, address: Address) -> Self {
		self.underlying_asset_address = Some(address);
		self
	}

	pub fn build(self) -> RequestResult<SwapRequest> {
		let input_token = self.input_token.ok_or(RequestError::MissingField("input_token"))?;
		let output_token = self
			.output_token
			.ok_or(RequestError::MissingField("output_token"))?;
		let chain_id = self.chain_id.unwrap_or(input_token.chain_id);

		for token in [&input_token, &output_token] {
			if token.chain_id != chain_id {
				return Err(RequestError::ChainMismatch {
					token: token.address,
					expected: chain_id,
					found: token.chain_id,
				});
			}
		}
		if input_token.address == output_token.address {
			return Err(RequestError::SameToken(input_token.address));
		}

		let input_amount = match self.amount {
			Amount::Unset => U256::ZERO,
			Amount::Raw(amount) => amount,
			Amount::Display(display) => parse_units(&display, input_token.decimals)?,
		};

		Ok(SwapRequest {
			chain_id,
			version: self.version.unwrap_or(VaultVersion::V2),
			from: self.from.unwrap_or(Address::ZERO),
			input_token,
			output_token,
			input_amount,
			is_depositing: self
				.is_depositing
				.ok_or(RequestError::MissingField("is_depositing"))?,
			staking_pool_address: self.staking_pool_address,
			migrator_address: self.migrator_address,
			underlying_asset_address: self.underlying_asset_address,
		})
	}
}
