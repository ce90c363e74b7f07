//! Fixtures shared by the test suites of every crate in the workspace
//!
//! Token and request constructors with realistic mainnet addresses, plus a
//! scripted in-memory `WalletProvider`.

use alloy_primitives::{address, Address, Bytes, B256, U256};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::requests::{SwapRequest, Token, VaultInfo, VaultVersion};
use crate::solvers::SolverId;
use crate::transactions::{ContractCall, TransactionRequest, TxReceipt};
use crate::wallet::{WalletError, WalletProvider, WalletResult};

pub const TEST_CHAIN_ID: u64 = 1;
pub const TEST_USER: Address = address!("f39Fd6e51aad88F6F4ce6aB8827279cffFb92266");
pub const TEST_USDC: Address = address!("A0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48");
pub const TEST_DAI: Address = address!("6B175474E89094C44Da98b954EedeAC495271d0F");
pub const TEST_VAULT: Address = address!("a354F35829Ae975e850e23e9615b11Da1B3dC4DE");
pub const TEST_STAKING_POOL: Address = address!("622fA41799406B120f9a40dA843D358b7b2CFEE3");

/// `allowance(address,address)`
pub const ALLOWANCE_SELECTOR: [u8; 4] = [0xdd, 0x62, 0xed, 0x3e];
/// `approve(address,uint256)`
pub const APPROVE_SELECTOR: [u8; 4] = [0x09, 0x5e, 0xa7, 0xb3];

/// Token routable by every solver
pub fn token(address: Address, decimals: u8) -> Token {
	Token::new(address, TEST_CHAIN_ID, decimals).with_solvers(SolverId::ROUTABLE)
}

pub fn token_with_solvers(
	address: Address,
	decimals: u8,
	solvers: impl IntoIterator<Item = SolverId>,
) -> Token {
	Token::new(address, TEST_CHAIN_ID, decimals).with_solvers(solvers)
}

pub fn test_vault(version: VaultVersion) -> VaultInfo {
	VaultInfo {
		address: TEST_VAULT,
		chain_id: TEST_CHAIN_ID,
		version,
		decimals: 6,
		solve_via: SolverId::ROUTABLE.into_iter().collect(),
		staking_pool_address: Some(TEST_STAKING_POOL),
		migrator_address: None,
		underlying_asset_address: Some(TEST_USDC),
	}
}

/// Request between two arbitrary tokens
pub fn swap_request(
	input_token: Token,
	output_token: Token,
	amount: U256,
	is_depositing: bool,
) -> SwapRequest {
	SwapRequest {
		chain_id: TEST_CHAIN_ID,
		version: VaultVersion::V2,
		from: TEST_USER,
		input_token,
		output_token,
		input_amount: amount,
		is_depositing,
		staking_pool_address: Some(TEST_STAKING_POOL),
		migrator_address: None,
		underlying_asset_address: Some(TEST_USDC),
	}
}

/// USDC into the test vault
pub fn deposit_request(amount: U256) -> SwapRequest {
	swap_request(token(TEST_USDC, 6), token(TEST_VAULT, 6), amount, true)
}

/// Test vault shares out to USDC
pub fn withdraw_request(amount: U256) -> SwapRequest {
	swap_request(token(TEST_VAULT, 6), token(TEST_USDC, 6), amount, false)
}

/// DAI zapped into the USDC test vault
pub fn zap_request(amount: U256) -> SwapRequest {
	swap_request(token(TEST_DAI, 18), token(TEST_VAULT, 6), amount, true)
}

fn word_address(data: &[u8], word: usize) -> Option<Address> {
	let start = 4 + word * 32 + 12;
	data.get(start..start + 20).map(Address::from_slice)
}

fn word_u256(data: &[u8], word: usize) -> Option<U256> {
	let start = 4 + word * 32;
	data.get(start..start + 32).map(U256::from_be_slice)
}

/// In-memory wallet with ERC-20 allowance bookkeeping and scripted reads
///
/// `allowance` reads are answered from the internal table and `approve`
/// transactions update it once mined. Any other read must be scripted with
/// `script_read`.
#[derive(Debug, Default)]
pub struct MockWallet {
	account: Mutex<Option<Address>>,
	/// (token, owner, spender) -> allowance
	allowances: Mutex<HashMap<(Address, Address, Address), U256>>,
	scripted_reads: Mutex<HashMap<(Address, [u8; 4]), Bytes>>,
	sent: Mutex<Vec<TransactionRequest>>,
	switched_chains: Mutex<Vec<u64>>,
	read_count: AtomicUsize,
	fail_reads: AtomicBool,
	reject_transactions: AtomicBool,
	revert_transactions: AtomicBool,
}

impl MockWallet {
	pub fn new(account: Address) -> Self {
		let wallet = Self::default();
		*wallet.account.lock().unwrap() = Some(account);
		wallet
	}

	pub fn disconnected() -> Self {
		Self::default()
	}

	pub fn set_allowance(&self, token: Address, owner: Address, spender: Address, amount: U256) {
		self.allowances
			.lock()
			.unwrap()
			.insert((token, owner, spender), amount);
	}

	pub fn allowance(&self, token: Address, owner: Address, spender: Address) -> U256 {
		self.allowances
			.lock()
			.unwrap()
			.get(&(token, owner, spender))
			.copied()
			.unwrap_or(U256::ZERO)
	}

	pub fn script_read(&self, to: Address, selector: [u8; 4], response: impl Into<Bytes>) {
		self.scripted_reads
			.lock()
			.unwrap()
			.insert((to, selector), response.into());
	}

	pub fn set_fail_reads(&self, fail: bool) {
		self.fail_reads.store(fail, Ordering::SeqCst);
	}

	pub fn set_reject_transactions(&self, reject: bool) {
		self.reject_transactions.store(reject, Ordering::SeqCst);
	}

	pub fn set_revert_transactions(&self, revert: bool) {
		self.revert_transactions.store(revert, Ordering::SeqCst);
	}

	pub fn sent_transactions(&self) -> Vec<TransactionRequest> {
		self.sent.lock().unwrap().clone()
	}

	pub fn switched_chains(&self) -> Vec<u64> {
		self.switched_chains.lock().unwrap().clone()
	}

	pub fn read_count(&self) -> usize {
		self.read_count.load(Ordering::SeqCst)
	}
}

#[async_trait]
impl WalletProvider for MockWallet {
	async fn account(&self) -> Option<Address> {
		*self.account.lock().unwrap()
	}

	async fn switch_chain(&self, chain_id: u64) -> WalletResult<()> {
		self.switched_chains.lock().unwrap().push(chain_id);
		Ok(())
	}

	async fn read_contract(&self, call: &ContractCall) -> WalletResult<Bytes> {
		self.read_count.fetch_add(1, Ordering::SeqCst);
		if self.fail_reads.load(Ordering::SeqCst) {
			return Err(WalletError::Rpc("execution reverted".to_string()));
		}

		let selector: [u8; 4] = call
			.data
			.get(..4)
			.and_then(|s| s.try_into().ok())
			.ok_or_else(|| WalletError::Decode("calldata shorter than a selector".to_string()))?;

		if selector == ALLOWANCE_SELECTOR {
			let owner = word_address(&call.data, 0);
			let spender = word_address(&call.data, 1);
			if let (Some(owner), Some(spender)) = (owner, spender) {
				let amount = self.allowance(call.to, owner, spender);
				return Ok(Bytes::from(amount.to_be_bytes::<32>().to_vec()));
			}
		}

		self.scripted_reads
			.lock()
			.unwrap()
			.get(&(call.to, selector))
			.cloned()
			.ok_or_else(|| WalletError::Rpc(format!("unscripted call to {}", call.to)))
	}

	async fn send_transaction(&self, tx: TransactionRequest) -> WalletResult<B256> {
		if self.reject_transactions.load(Ordering::SeqCst) {
			return Err(WalletError::Rejected("User denied transaction signature".to_string()));
		}

		let is_approve = tx.data.get(..4) == Some(&APPROVE_SELECTOR[..]);
		if is_approve && !self.revert_transactions.load(Ordering::SeqCst) {
			if let (Some(spender), Some(amount)) = (word_address(&tx.data, 0), word_u256(&tx.data, 1)) {
				self.set_allowance(tx.to, tx.from, spender, amount);
			}
		}

		let mut sent = self.sent.lock().unwrap();
		sent.push(tx);
		Ok(B256::with_last_byte(sent.len() as u8))
	}

	async fn wait_for_receipt(&self, tx_hash: B256) -> WalletResult<TxReceipt> {
		Ok(TxReceipt {
			tx_hash,
			block_number: Some(19_000_000),
			success: !self.revert_transactions.load(Ordering::SeqCst),
		})
	}
}
