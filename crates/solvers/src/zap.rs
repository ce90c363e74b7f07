//! Generic zap backend over a swap aggregator HTTP API
//!
//! The aggregator-specific part (`ZapApi`) only turns a request into a ready to
//! send transaction; caching, allowance handling and execution live here.

use alloy_primitives::{Address, Bytes, U256};
use async_trait::async_trait;
use reqwest::Client;
use std::fmt::Debug;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, warn};

use vs_types::{
	BackendConfig, ChainContracts, Quote, SolverBackend, SolverError, SolverId, SolverResult,
	SwapRequest, TxReceipt,
};

use crate::client_cache::{AuthConfig, ClientCache, ClientConfig};
use crate::context::BackendContext;
use crate::route_memory::RouteMemory;

/// Transaction an aggregator computed for one request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZapRoute {
	pub amount_out: U256,
	pub min_amount_out: Option<U256>,
	pub to: Address,
	pub data: Bytes,
	pub value: U256,
	/// Approval target reported by the aggregator, when it reports one
	pub spender: Option<Address>,
}

#[async_trait]
pub trait ZapApi: Send + Sync + Debug {
	fn solver_id(&self) -> SolverId;

	fn auth(&self, config: &BackendConfig) -> AuthConfig;

	/// Spender from the contract book, preferred over the one in a route
	fn configured_spender(&self, contracts: &ChainContracts) -> Option<Address>;

	async fn fetch_route(
		&self,
		client: &Client,
		config: &BackendConfig,
		request: &SwapRequest,
	) -> SolverResult<ZapRoute>;
}

#[derive(Debug)]
enum ClientStrategy {
	Cached(ClientCache),
	OnDemand,
}

#[derive(Debug)]
pub struct ZapSolver<A: ZapApi> {
	api: A,
	ctx: BackendContext,
	routes: RouteMemory<ZapRoute>,
	client_strategy: ClientStrategy,
}

impl<A: ZapApi> ZapSolver<A> {
	pub fn new(api: A, ctx: BackendContext) -> Self {
		Self::with_cache(api, ctx, crate::client_cache::global_client_cache())
	}

	pub fn with_cache(api: A, ctx: BackendContext, cache: ClientCache) -> Self {
		Self {
			api,
			ctx,
			routes: RouteMemory::new(),
			client_strategy: ClientStrategy::Cached(cache),
		}
	}

	pub fn without_cache(api: A, ctx: BackendContext) -> Self {
		Self {
			api,
			ctx,
			routes: RouteMemory::new(),
			client_strategy: ClientStrategy::OnDemand,
		}
	}

	fn client(&self) -> SolverResult<Arc<Client>> {
		let auth = self.api.auth(&self.ctx.config);
		match &self.client_strategy {
			ClientStrategy::Cached(cache) => cache.get_client_with_auth(&self.ctx.config, &auth),
			ClientStrategy::OnDemand => {
				ClientCache::build_client(&ClientConfig::with_auth(&self.ctx.config, &auth))
					.map(Arc::new)
			},
		}
	}

	fn spender(&self, request: &SwapRequest) -> Option<Address> {
		self.ctx
			.contracts
			.for_chain(request.chain_id)
			.and_then(|contracts| self.api.configured_spender(contracts))
			.or_else(|| {
				self.routes
					.route_for(request)
					.and_then(|route| route.spender.or(Some(route.to)))
			})
	}

	async fn execute(&self, request: &SwapRequest) -> SolverResult<TxReceipt> {
		let route = self
			.routes
			.route_for(request)
			.ok_or(SolverError::MissingRoute(self.id()))?;
		debug!(
			"{} executing route to {} for {} -> {}",
			self.id(),
			route.to,
			request.input_token.address,
			request.output_token.address
		);
		self.ctx
			.submit(request, route.to, route.data, route.value)
			.await
	}
}

#[async_trait]
impl<A: ZapApi> SolverBackend for ZapSolver<A> {
	fn id(&self) -> SolverId {
		self.api.solver_id()
	}

	fn is_enabled(&self) -> bool {
		self.ctx.config.enabled
	}

	async fn init(&self, request: &SwapRequest) -> Option<Quote> {
		if !self.ctx.can_quote(request) {
			return None;
		}

		let ticket = self.routes.issue();
		let client = match self.client() {
			Ok(client) => client,
			Err(e) => {
				warn!("{} has no usable HTTP client: {}", self.id(), e);
				return None;
			},
		};

		match self.api.fetch_route(&client, &self.ctx.config, request).await {
			Ok(route) => {
				let quote = Quote::new(route.amount_out, request.output_token.decimals, self.id());
				if !self.routes.store(ticket, request, route) {
					debug!("{} route for superseded request dropped", self.id());
				}
				Some(quote)
			},
			Err(e) => {
				warn!("{} route request failed: {}", self.id(), e);
				None
			},
		}
	}

	async fn retrieve_allowance(&self, request: &SwapRequest, force_refetch: bool) -> U256 {
		if request.input_token.is_native() {
			return U256::MAX;
		}
		match self.spender(request) {
			Some(spender) => self.ctx.allowance_for(request, spender, force_refetch).await,
			None => {
				warn!("{} has no spender for chain {}", self.id(), request.chain_id);
				U256::ZERO
			},
		}
	}

	async fn approve(&self, request: &SwapRequest, amount: U256) -> SolverResult<Option<TxReceipt>> {
		if request.input_token.is_native() {
			return Ok(None);
		}
		let spender = self.spender(request).ok_or_else(|| SolverError::Configuration {
			solver_id: self.id(),
			reason: format!("no spender known for chain {}", request.chain_id),
		})?;
		self.ctx.approve_spender(request, spender, amount).await
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

/// Parse a decimal or `0x` amount string from an upstream payload
pub fn parse_amount(value: &str, field: &str) -> SolverResult<U256> {
	U256::from_str(value.trim())
		.map_err(|e| SolverError::invalid_response(format!("invalid {} '{}': {}", field, value, e)))
}

/// Turn a non-success HTTP response into an error carrying its status and body
pub async fn ensure_success(response: reqwest::Response, solver_id: SolverId) -> SolverResult<reqwest::Response> {
	let status = response.status();
	if status.is_success() {
		return Ok(response);
	}
	let body = response.text().await.unwrap_or_default();
	Err(SolverError::http_status(
		status.as_u16(),
		format!("{} returned {}: {}", solver_id, status, body),
	))
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_parse_amount() {
		assert_eq!(parse_amount("95000000", "amountOut").unwrap(), U256::from(95_000_000u64));
		assert_eq!(parse_amount("0x10", "value").unwrap(), U256::from(16u64));
		assert!(matches!(
			parse_amount("1.5", "amountOut"),
			Err(SolverError::InvalidResponse { .. })
		));
	}
}
