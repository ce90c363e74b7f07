//! Share price previews and calldata for both vault generations

use alloy_primitives::{Address, Bytes, U256};
use alloy_sol_types::SolCall;

use vs_types::{SolverResult, VaultVersion};

use crate::abi::{self, IVaultV2, IVaultV3};
use crate::context::BackendContext;

/// Loss tolerated on vault withdrawals, in basis points
pub const MAX_LOSS_BPS: u64 = 1;

async fn price_per_share(ctx: &BackendContext, chain_id: u64, vault: Address) -> SolverResult<U256> {
	ctx.read_uint(chain_id, vault, IVaultV2::pricePerShareCall {}.abi_encode())
		.await
}

/// Shares minted for depositing `assets`
pub async fn preview_deposit(
	ctx: &BackendContext,
	chain_id: u64,
	vault: Address,
	version: VaultVersion,
	assets: U256,
	vault_decimals: u8,
) -> SolverResult<U256> {
	match version {
		VaultVersion::V2 => {
			let pps = price_per_share(ctx, chain_id, vault).await?;
			Ok(abi::mul_div(assets, abi::unit(vault_decimals), pps))
		},
		VaultVersion::V3 => {
			ctx.read_uint(
				chain_id,
				vault,
				IVaultV3::previewDepositCall { assets }.abi_encode(),
			)
			.await
		},
	}
}

/// Assets returned for burning `shares`
pub async fn preview_withdraw(
	ctx: &BackendContext,
	chain_id: u64,
	vault: Address,
	version: VaultVersion,
	shares: U256,
	vault_decimals: u8,
) -> SolverResult<U256> {
	match version {
		VaultVersion::V2 => {
			let pps = price_per_share(ctx, chain_id, vault).await?;
			Ok(abi::mul_div(shares, pps, abi::unit(vault_decimals)))
		},
		VaultVersion::V3 => {
			ctx.read_uint(
				chain_id,
				vault,
				IVaultV3::previewRedeemCall { shares }.abi_encode(),
			)
			.await
		},
	}
}

pub fn deposit_calldata(version: VaultVersion, assets: U256, receiver: Address) -> Bytes {
	match version {
		VaultVersion::V2 => IVaultV2::depositCall {
			amount: assets,
			recipient: receiver,
		}
		.abi_encode()
		.into(),
		VaultVersion::V3 => IVaultV3::depositCall { assets, receiver }.abi_encode().into(),
	}
}

pub fn withdraw_calldata(version: VaultVersion, shares: U256, owner: Address) -> Bytes {
	let max_loss = U256::from(MAX_LOSS_BPS);
	match version {
		VaultVersion::V2 => IVaultV2::withdrawCall {
			maxShares: shares,
			recipient: owner,
			maxLoss: max_loss,
		}
		.abi_encode()
		.into(),
		VaultVersion::V3 => IVaultV3::redeemCall {
			shares,
			receiver: owner,
			owner,
			maxLoss: max_loss,
		}
		.abi_encode()
		.into(),
	}
}
