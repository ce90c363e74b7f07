//! Aggregator B: shortcut route endpoint keyed by chain id, slippage in basis points

use alloy_primitives::{Address, Bytes};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use vs_types::{BackendConfig, ChainContracts, SolverError, SolverId, SolverResult, SwapRequest};

use crate::client_cache::AuthConfig;
use crate::zap::{ensure_success, parse_amount, ZapApi, ZapRoute};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ShortcutRoute {
	amount_out: String,
	tx: ShortcutTransaction,
}

#[derive(Debug, Deserialize)]
struct ShortcutTransaction {
	to: Address,
	data: Bytes,
	#[serde(default)]
	value: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct AggregatorBApi;

#[async_trait]
impl ZapApi for AggregatorBApi {
	fn solver_id(&self) -> SolverId {
		SolverId::AggregatorB
	}

	fn auth(&self, config: &BackendConfig) -> AuthConfig {
		AuthConfig::api_key("x-api-key", config.api_key.as_ref())
	}

	fn configured_spender(&self, contracts: &ChainContracts) -> Option<Address> {
		contracts.aggregator_b_router
	}

	async fn fetch_route(
		&self,
		client: &Client,
		config: &BackendConfig,
		request: &SwapRequest,
	) -> SolverResult<ZapRoute> {
		let url = format!("{}/api/v1/shortcuts/route", config.endpoint()?);
		debug!(
			"Fetching aggregator B route from {} on chain {}",
			url, request.chain_id
		);

		let response = client
			.get(&url)
			.query(&[
				("chainId", request.chain_id.to_string()),
				("fromAddress", request.from.to_string()),
				("receiver", request.from.to_string()),
				("spender", request.from.to_string()),
				("tokenIn", request.input_token.address.to_string()),
				("tokenOut", request.output_token.address.to_string()),
				("amountIn", request.input_amount.to_string()),
				("slippage", config.slippage_bps.to_string()),
				("routingStrategy", "router".to_string()),
			])
			.send()
			.await?;
		let response = ensure_success(response, SolverId::AggregatorB).await?;

		let body: ShortcutRoute = response.json().await.map_err(|e| {
			SolverError::invalid_response(format!("failed to parse aggregator B route: {}", e))
		})?;

		Ok(ZapRoute {
			amount_out: parse_amount(&body.amount_out, "amountOut")?,
			min_amount_out: None,
			to: body.tx.to,
			data: body.tx.data,
			value: match body.tx.value.as_deref() {
				Some(value) => parse_amount(value, "value")?,
				None => Default::default(),
			},
			spender: None,
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::allowance_cache::AllowanceCache;
	use crate::client_cache::ClientCache;
	use crate::context::BackendContext;
	use crate::zap::ZapSolver;
	use alloy_primitives::{address, U256};
	use serde_json::json;
	use std::sync::Arc;
	use vs_types::test_utils::{withdraw_request, zap_request, MockWallet, TEST_DAI, TEST_USER};
	use vs_types::{ContractBook, SecretString, SolverBackend};
	use wiremock::matchers::{header, method, path, query_param};
	use wiremock::{Mock, MockServer, ResponseTemplate};

	const ROUTER: Address = address!("80EbA3855878739F4710233A8a19d89Bdd2ffB8E");

	fn solver(server: &MockServer, wallet: Arc<MockWallet>) -> ZapSolver<AggregatorBApi> {
		let config = BackendConfig::new(SolverId::AggregatorB)
			.with_endpoint(format!("{}/", server.uri()))
			.with_api_key(SecretString::from("shortcut-key"));
		let contracts = ContractBook::new().with_chain(
			1,
			ChainContracts {
				aggregator_b_router: Some(ROUTER),
				..Default::default()
			},
		);
		ZapSolver::with_cache(
			AggregatorBApi,
			BackendContext::new(config, wallet, AllowanceCache::new(), Arc::new(contracts)),
			ClientCache::new(),
		)
	}

	#[tokio::test]
	async fn test_route_request_and_configured_spender() {
		let server = MockServer::start().await;
		Mock::given(method("GET"))
			.and(path("/api/v1/shortcuts/route"))
			.and(query_param("chainId", "1"))
			.and(query_param("slippage", "100"))
			.and(header("x-api-key", "shortcut-key"))
			.respond_with(ResponseTemplate::new(200).set_body_json(json!({
				"amountOut": "2500000",
				"tx": { "to": ROUTER.to_string(), "data": "0x01", "value": "0" }
			})))
			.mount(&server)
			.await;

		let wallet = Arc::new(MockWallet::new(TEST_USER));
		let solver = solver(&server, wallet.clone());
		let request = zap_request(U256::from(2_500_000_000_000_000_000u128));

		assert_eq!(solver.retrieve_allowance(&request, false).await, U256::ZERO);
		let quote = solver.init(&request).await.unwrap();
		assert_eq!(quote.raw, U256::from(2_500_000u64));

		solver.approve(&request, request.input_amount).await.unwrap();
		assert_eq!(
			wallet.allowance(TEST_DAI, TEST_USER, ROUTER),
			request.input_amount
		);
		assert_eq!(
			solver.retrieve_allowance(&request, false).await,
			request.input_amount
		);
	}

	#[tokio::test]
	async fn test_withdraw_route_executes_as_withdraw_only() {
		let server = MockServer::start().await;
		Mock::given(method("GET"))
			.and(path("/api/v1/shortcuts/route"))
			.respond_with(ResponseTemplate::new(200).set_body_json(json!({
				"amountOut": "7",
				"tx": { "to": ROUTER.to_string(), "data": "0x02" }
			})))
			.mount(&server)
			.await;

		let wallet = Arc::new(MockWallet::new(TEST_USER));
		let solver = solver(&server, wallet.clone());
		let request = withdraw_request(U256::from(7u64));
		solver.init(&request).await.unwrap();

		assert!(matches!(
			solver.execute_deposit(&request).await.unwrap_err(),
			SolverError::DirectionMismatch
		));
		solver.execute_withdraw(&request).await.unwrap();
		assert_eq!(wallet.sent_transactions()[0].value, U256::ZERO);
	}

	#[tokio::test]
	async fn test_malformed_body_yields_no_quote() {
		let server = MockServer::start().await;
		Mock::given(method("GET"))
			.respond_with(ResponseTemplate::new(200).set_body_json(json!({ "amountOut": "1" })))
			.mount(&server)
			.await;

		let solver = solver(&server, Arc::new(MockWallet::new(TEST_USER)));
		assert!(solver.init(&zap_request(U256::from(1u64))).await.is_none());
	}
}
