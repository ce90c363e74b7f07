//! Aggregator A: single GET returning the output amount and a ready transaction
//!
//! Tokens are addressed as `network:address` pairs, slippage is a percentage.

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
struct PortalResponse {
	context: PortalContext,
	tx: PortalTransaction,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PortalContext {
	output_amount: String,
	min_output_amount: Option<String>,
	/// Contract the input token must be approved for
	target: Option<Address>,
}

#[derive(Debug, Deserialize)]
struct PortalTransaction {
	to: Address,
	data: Bytes,
	#[serde(default)]
	value: Option<String>,
}

/// Network slug the API uses for a chain id
pub fn network_name(chain_id: u64) -> Option<&'static str> {
	match chain_id {
		1 => Some("ethereum"),
		10 => Some("optimism"),
		100 => Some("gnosis"),
		137 => Some("polygon"),
		250 => Some("fantom"),
		8453 => Some("base"),
		42161 => Some("arbitrum"),
		_ => None,
	}
}

#[derive(Debug, Clone, Default)]
pub struct AggregatorAApi;

#[async_trait]
impl ZapApi for AggregatorAApi {
	fn solver_id(&self) -> SolverId {
		SolverId::AggregatorA
	}

	fn auth(&self, config: &BackendConfig) -> AuthConfig {
		AuthConfig::bearer(config.api_key.as_ref())
	}

	fn configured_spender(&self, contracts: &ChainContracts) -> Option<Address> {
		contracts.aggregator_a_router
	}

	async fn fetch_route(
		&self,
		client: &Client,
		config: &BackendConfig,
		request: &SwapRequest,
	) -> SolverResult<ZapRoute> {
		let network = network_name(request.chain_id).ok_or_else(|| SolverError::Configuration {
			solver_id: SolverId::AggregatorA,
			reason: format!("unsupported chain {}", request.chain_id),
		})?;
		let url = format!("{}/v2/portal", config.endpoint()?);
		let slippage_percent = format!("{:.2}", config.slippage_bps as f64 / 100.0);

		debug!(
			"Fetching aggregator A route from {} for {} {} -> {}",
			url, request.input_amount, request.input_token.address, request.output_token.address
		);

		let response = client
			.get(&url)
			.query(&[
				("sender", request.from.to_string()),
				(
					"inputToken",
					format!("{}:{}", network, request.input_token.address),
				),
				("inputAmount", request.input_amount.to_string()),
				(
					"outputToken",
					format!("{}:{}", network, request.output_token.address),
				),
				("slippageTolerancePercentage", slippage_percent),
				("validate", "false".to_string()),
			])
			.send()
			.await?;
		let response = ensure_success(response, SolverId::AggregatorA).await?;

		let body: PortalResponse = response.json().await.map_err(|e| {
			SolverError::invalid_response(format!("failed to parse aggregator A route: {}", e))
		})?;

		Ok(ZapRoute {
			amount_out: parse_amount(&body.context.output_amount, "outputAmount")?,
			min_amount_out: body
				.context
				.min_output_amount
				.as_deref()
				.map(|v| parse_amount(v, "minOutputAmount"))
				.transpose()?,
			to: body.tx.to,
			data: body.tx.data,
			value: match body.tx.value.as_deref() {
				Some(value) => parse_amount(value, "value")?,
				None => Default::default(),
			},
			spender: body.context.target,
		})
	}
}
