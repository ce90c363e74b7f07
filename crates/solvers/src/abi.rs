//! Contract interfaces the backends encode calls against

use alloy_primitives::{Address, Bytes, U256};
use alloy_sol_types::{sol, SolCall};

use vs_types::{ContractCall, SolverError, SolverResult};

sol! {
	interface IERC20 {
		function allowance(address owner, address spender) external view returns (uint256);
		function approve(address spender, uint256 amount) external returns (bool);
	}

	/// `pricePerShare` vaults
	interface IVaultV2 {
		function pricePerShare() external view returns (uint256);
		function deposit(uint256 amount, address recipient) external returns (uint256);
		function withdraw(uint256 maxShares, address recipient, uint256 maxLoss) external returns (uint256);
	}

	/// ERC-4626 vaults with a loss-bounded redeem
	interface IVaultV3 {
		function previewDeposit(uint256 assets) external view returns (uint256);
		function previewRedeem(uint256 shares) external view returns (uint256);
		function deposit(uint256 assets, address receiver) external returns (uint256);
		function redeem(uint256 shares, address receiver, address owner, uint256 maxLoss) external returns (uint256);
	}

	interface IPartnerTracker {
		function deposit(address vault, address partnerId, uint256 amount) external returns (uint256);
	}

	interface IVaultMigrator {
		function migrate(address fromVault, address toVault, uint256 shares, uint256 minAmountOut) external returns (uint256);
	}

	interface IStakingZap {
		function zapIn(address vault, uint256 amount) external returns (uint256);
	}

	/// ERC-4626 staking gauge
	interface IGauge {
		function previewDeposit(uint256 assets) external view returns (uint256);
		function previewRedeem(uint256 shares) external view returns (uint256);
		function deposit(uint256 assets, address receiver) external returns (uint256);
		function redeem(uint256 shares, address receiver, address owner) external returns (uint256);
	}

	/// One-to-one staking rewards pool
	interface IStakingRewards {
		function stake(uint256 amount) external;
		function withdraw(uint256 amount) external;
	}

	interface IStakingRouter {
		function depositAndStake(address vault, uint256 amount, address receiver) external returns (uint256);
	}

	interface ISettlement {
		function setPreSignature(bytes orderUid, bool signed) external;
	}
}

pub fn allowance_call(chain_id: u64, token: Address, owner: Address, spender: Address) -> ContractCall {
	ContractCall::new(
		chain_id,
		token,
		IERC20::allowanceCall { owner, spender }.abi_encode(),
	)
}

pub fn approve_calldata(spender: Address, amount: U256) -> Bytes {
	IERC20::approveCall { spender, amount }.abi_encode().into()
}

/// Decode a single `uint256` return word
pub fn decode_uint(data: &[u8]) -> SolverResult<U256> {
	IVaultV2::pricePerShareCall::abi_decode_returns(data)
		.map_err(|e| SolverError::invalid_response(format!("undecodable uint256 return: {}", e)))
}

/// `amount * numerator / denominator`, zero when the denominator is zero
pub fn mul_div(amount: U256, numerator: U256, denominator: U256) -> U256 {
	if denominator.is_zero() {
		return U256::ZERO;
	}
	amount.saturating_mul(numerator) / denominator
}

/// `10^decimals`
pub fn unit(decimals: u8) -> U256 {
	U256::from(10u8).pow(U256::from(decimals))
}

/// Reduce `amount` by `bps` basis points
pub fn apply_slippage(amount: U256, bps: u32) -> U256 {
	let bps = bps.min(10_000);
	mul_div(amount, U256::from(10_000 - bps), U256::from(10_000u32))
}
