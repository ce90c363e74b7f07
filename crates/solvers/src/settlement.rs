//! Settlement-protocol swaps: off-chain order book with on-chain pre-signature
//!
//! Quote → order submission (presign scheme) → `setPreSignature` transaction →
//! polling the order until it is filled, expired or cancelled.

use alloy_primitives::{hex, Address, Bytes, U256};
use alloy_sol_types::SolCall;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use vs_types::{
	Quote, SolverBackend, SolverError, SolverId, SolverResult, SwapRequest, TxReceipt,
};

use crate::abi::{self, ISettlement};
use crate::client_cache::{global_client_cache, AuthConfig, ClientCache};
use crate::context::BackendContext;
use crate::route_memory::RouteMemory;
use crate::zap::{ensure_success, parse_amount};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct QuoteRequestBody {
	sell_token: Address,
	buy_token: Address,
	from: Address,
	receiver: Address,
	sell_amount_before_fee: String,
	kind: &'static str,
	signing_scheme: &'static str,
}

/// Order parameters as priced by the protocol
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderParameters {
	pub sell_token: Address,
	pub buy_token: Address,
	pub receiver: Option<Address>,
	pub sell_amount: String,
	pub buy_amount: String,
	pub valid_to: u64,
	pub app_data: String,
	pub fee_amount: String,
	pub kind: String,
	pub partially_fillable: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuoteResponseBody {
	quote: OrderParameters,
	id: Option<u64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct OrderCreation<'a> {
	#[serde(flatten)]
	parameters: &'a OrderParameters,
	from: Address,
	signing_scheme: &'static str,
	/// The owner address for presign orders
	signature: String,
	quote_id: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct OrderStatus {
	status: String,
}

/// Cached priced order for the latest request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettlementRoute {
	pub parameters: OrderParameters,
	pub quote_id: Option<u64>,
	pub buy_amount: U256,
}

#[derive(Debug)]
pub struct SettlementSolver {
	ctx: BackendContext,
	routes: RouteMemory<SettlementRoute>,
	cache: ClientCache,
}

impl SettlementSolver {
	pub fn new(ctx: BackendContext) -> Self {
		Self::with_cache(ctx, global_client_cache())
	}

	pub fn with_cache(ctx: BackendContext, cache: ClientCache) -> Self {
		Self {
			ctx,
			routes: RouteMemory::new(),
			cache,
		}
	}

	fn client(&self) -> SolverResult<Arc<Client>> {
		self.cache.get_client_with_auth(
			&self.ctx.config,
			&AuthConfig::api_key("x-api-key", self.ctx.config.api_key.as_ref()),
		)
	}

	fn vault_relayer(&self, chain_id: u64) -> SolverResult<Address> {
		self.ctx
			.contract(chain_id, "settlement vault relayer", |c| c.settlement_vault_relayer)
	}

	async fn fetch_quote(&self, request: &SwapRequest) -> SolverResult<SettlementRoute> {
		let url = format!("{}/api/v1/quote", self.ctx.config.endpoint()?);
		let body = QuoteRequestBody {
			sell_token: request.input_token.address,
			buy_token: request.output_token.address,
			from: request.from,
			receiver: request.from,
			sell_amount_before_fee: request.input_amount.to_string(),
			kind: "sell",
			signing_scheme: "presign",
		};
		debug!("Requesting settlement quote from {}", url);

		let response = self.client()?.post(&url).json(&body).send().await?;
		let response = ensure_success(response, SolverId::SettlementSwap).await?;
		let body: QuoteResponseBody = response.json().await.map_err(|e| {
			SolverError::invalid_response(format!("failed to parse settlement quote: {}", e))
		})?;

		Ok(SettlementRoute {
			buy_amount: parse_amount(&body.quote.buy_amount, "buyAmount")?,
			parameters: body.quote,
			quote_id: body.id,
		})
	}

	/// Submit the order with the slippage-adjusted buy amount; returns its uid
	async fn submit_order(&self, route: &SettlementRoute, owner: Address) -> SolverResult<String> {
		let url = format!("{}/api/v1/orders", self.ctx.config.endpoint()?);
		let mut parameters = route.parameters.clone();
		parameters.buy_amount =
			abi::apply_slippage(route.buy_amount, self.ctx.config.slippage_bps).to_string();

		let order = OrderCreation {
			parameters: &parameters,
			from: owner,
			signing_scheme: "presign",
			signature: owner.to_string(),
			quote_id: route.quote_id,
		};
		let response = self.client()?.post(&url).json(&order).send().await?;
		let response = ensure_success(response, SolverId::SettlementSwap).await?;
		response.json::<String>().await.map_err(|e| {
			SolverError::invalid_response(format!("failed to parse order uid: {}", e))
		})
	}

	/// Poll the order until it leaves the open states
	async fn wait_for_fill(&self, order_uid: &str) -> SolverResult<()> {
		let url = format!("{}/api/v1/orders/{}", self.ctx.config.endpoint()?, order_uid);
		let interval = Duration::from_millis(self.ctx.config.poll_interval_ms);

		for poll in 1..=self.ctx.config.max_polls {
			let response = self.client()?.get(&url).send().await?;
			let response = ensure_success(response, SolverId::SettlementSwap).await?;
			let status: OrderStatus = response.json().await.map_err(|e| {
				SolverError::invalid_response(format!("failed to parse order status: {}", e))
			})?;

			match status.status.as_str() {
				"fulfilled" => {
					info!("Settlement order {} filled after {} polls", order_uid, poll);
					return Ok(());
				},
				"expired" | "cancelled" => {
					return Err(SolverError::OrderNotFilled {
						order_uid: order_uid.to_string(),
						status: status.status,
					});
				},
				other => debug!("Settlement order {} is {} (poll {})", order_uid, other, poll),
			}
			tokio::time::sleep(interval).await;
		}

		Err(SolverError::OrderPollExhausted {
			order_uid: order_uid.to_string(),
			polls: self.ctx.config.max_polls,
		})
	}

	async fn execute(&self, request: &SwapRequest) -> SolverResult<TxReceipt> {
		let route = self
			.routes
			.route_for(request)
			.ok_or(SolverError::MissingRoute(SolverId::SettlementSwap))?;
		let owner = self.ctx.signer().await?;
		let settlement = self
			.ctx
			.contract(request.chain_id, "settlement contract", |c| c.settlement_contract)?;

		let order_uid = self.submit_order(&route, owner).await?;
		let uid_bytes = hex::decode(&order_uid).map_err(|e| {
			SolverError::invalid_response(format!("order uid is not hex: {}", e))
		})?;

		let data = ISettlement::setPreSignatureCall {
			orderUid: Bytes::from(uid_bytes),
			signed: true,
		}
		.abi_encode();
		let receipt = self
			.ctx
			.submit(request, settlement, data.into(), U256::ZERO)
			.await?;

		self.wait_for_fill(&order_uid).await?;
		Ok(receipt)
	}
}

#[async_trait]
impl SolverBackend for SettlementSolver {
	fn id(&self) -> SolverId {
		SolverId::SettlementSwap
	}

	fn is_enabled(&self) -> bool {
		self.ctx.config.enabled
	}

	async fn init(&self, request: &SwapRequest) -> Option<Quote> {
		if !self.ctx.can_quote(request) {
			return None;
		}
		if request.input_token.is_native() {
			debug!("Settlement swaps cannot sell the native coin");
			return None;
		}

		let ticket = self.routes.issue();
		match self.fetch_quote(request).await {
			Ok(route) => {
				let quote = Quote::new(route.buy_amount, request.output_token.decimals, self.id());
				self.routes.store(ticket, request, route);
				Some(quote)
			},
			Err(e) => {
				warn!("Settlement quote failed: {}", e);
				None
			},
		}
	}

	async fn retrieve_allowance(&self, request: &SwapRequest, force_refetch: bool) -> U256 {
		match self.vault_relayer(request.chain_id) {
			Ok(relayer) => self.ctx.allowance_for(request, relayer, force_refetch).await,
			Err(e) => {
				warn!("Settlement allowance unavailable: {}", e);
				U256::ZERO
			},
		}
	}

	async fn approve(&self, request: &SwapRequest, amount: U256) -> SolverResult<Option<TxReceipt>> {
		let relayer = self.vault_relayer(request.chain_id)?;
		self.ctx.approve_spender(request, relayer, amount).await
	}

	async fn execute_deposit(&self, request: &SwapRequest) -> SolverResult<TxReceipt> {
		if !request.is_depositing {
			return Err(SolverError::DirectionMismatch);
		}
		self.execute(request).await
	}

	async fn execute_withdraw(&self, request: &SwapRequest) -> SolverResult<TxReceipt> {
		if request.is_depositing {
			return Err(SolverError::DirectionMismatch);
		}
		self.execute(request).await
	}
}
