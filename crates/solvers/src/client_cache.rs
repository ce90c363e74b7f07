//! Pooled HTTP clients for the upstream quote services
//!
//! One `reqwest::Client` per (endpoint, solver, timeout, headers) combination,
//! recreated after a TTL so rotated keys and DNS changes are picked up.

use dashmap::{mapref::entry::Entry, DashMap};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, ClientBuilder};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

use vs_types::{BackendConfig, SecretString, SolverError, SolverId, SolverResult};

const USER_AGENT: &str = "vault-solver/0.1";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClientConfig {
	pub base_url: String,
	pub solver_id: SolverId,
	pub timeout_ms: u64,
	pub max_idle_per_host: usize,
	pub keep_alive_timeout_ms: u64,
	/// Sorted so equal header sets share a client
	pub headers: Vec<(String, String)>,
}

impl From<&BackendConfig> for ClientConfig {
	fn from(config: &BackendConfig) -> Self {
		let mut headers = vec![
			("Accept".to_string(), "application/json".to_string()),
			("User-Agent".to_string(), USER_AGENT.to_string()),
		];
		if let Some(extra) = &config.headers {
			headers.extend(extra.iter().map(|(k, v)| (k.clone(), v.clone())));
		}
		headers.sort();

		Self {
			base_url: config.endpoint.clone().unwrap_or_default(),
			solver_id: config.solver_id,
			timeout_ms: config.timeout_ms,
			max_idle_per_host: 10,
			keep_alive_timeout_ms: 90_000,
			headers,
		}
	}
}

impl ClientConfig {
	pub fn with_auth(backend: &BackendConfig, auth: &AuthConfig) -> Self {
		let mut config = Self::from(backend);
		match auth {
			AuthConfig::None => {},
			AuthConfig::Bearer { token } => config.headers.push((
				"Authorization".to_string(),
				format!("Bearer {}", token.expose_secret()),
			)),
			AuthConfig::ApiKey { header, key } => config
				.headers
				.push((header.clone(), key.expose_secret().to_string())),
		}
		config.headers.sort();
		config
	}
}

/// How a backend authenticates against its upstream service
#[derive(Debug, Clone)]
pub enum AuthConfig {
	None,
	Bearer { token: SecretString },
	ApiKey { header: String, key: SecretString },
}

impl AuthConfig {
	pub fn bearer(token: Option<&SecretString>) -> Self {
		match token {
			Some(token) => Self::Bearer {
				token: token.clone(),
			},
			None => Self::None,
		}
	}

	pub fn api_key(header: &str, key: Option<&SecretString>) -> Self {
		match key {
			Some(key) => Self::ApiKey {
				header: header.to_string(),
				key: key.clone(),
			},
			None => Self::None,
		}
	}
}

#[derive(Debug, Clone)]
struct CachedClient {
	client: Arc<Client>,
	created_at: Instant,
}

impl CachedClient {
	fn is_expired(&self, ttl: Duration) -> bool {
		self.created_at.elapsed() > ttl
	}
}

#[derive(Clone, Debug)]
pub struct ClientCache {
	clients: Arc<DashMap<ClientConfig, CachedClient>>,
	ttl: Duration,
}

impl ClientCache {
	/// Cache with a 30 minute TTL
	pub fn new() -> Self {
		Self::with_ttl(Duration::from_secs(30 * 60))
	}

	pub fn with_ttl(ttl: Duration) -> Self {
		Self {
			clients: Arc::new(DashMap::new()),
			ttl,
		}
	}

	pub fn get_client(&self, config: &ClientConfig) -> SolverResult<Arc<Client>> {
		self.clients
			.remove_if(config, |_, cached| cached.is_expired(self.ttl));

		if let Some(cached) = self.clients.get(config) {
			return Ok(cached.client.clone());
		}

		debug!("Creating HTTP client for {} ({})", config.base_url, config.solver_id);
		let client = Arc::new(Self::build_client(config)?);

		match self.clients.entry(config.clone()) {
			Entry::Occupied(entry) => Ok(entry.get().client.clone()),
			Entry::Vacant(entry) => {
				entry.insert(CachedClient {
					client: client.clone(),
					created_at: Instant::now(),
				});
				Ok(client)
			},
		}
	}

	pub fn get_client_with_auth(
		&self,
		backend: &BackendConfig,
		auth: &AuthConfig,
	) -> SolverResult<Arc<Client>> {
		self.get_client(&ClientConfig::with_auth(backend, auth))
	}

	/// Build an uncached client
	pub fn build_client(config: &ClientConfig) -> SolverResult<Client> {
		let mut header_map = HeaderMap::new();
		for (key, value) in &config.headers {
			if let (Ok(name), Ok(value)) = (
				HeaderName::from_bytes(key.as_bytes()),
				HeaderValue::from_str(value),
			) {
				header_map.insert(name, value);
			}
		}

		ClientBuilder::new()
			.timeout(Duration::from_millis(config.timeout_ms))
			.pool_max_idle_per_host(config.max_idle_per_host)
			.pool_idle_timeout(Duration::from_millis(config.keep_alive_timeout_ms))
			.tcp_keepalive(Duration::from_secs(60))
			.default_headers(header_map)
			.build()
			.map_err(SolverError::Http)
	}

	/// Drop expired clients, returning how many were removed
	pub fn cleanup_expired(&self) -> usize {
		let before = self.clients.len();
		self.clients.retain(|_, cached| !cached.is_expired(self.ttl));
		before.saturating_sub(self.clients.len())
	}

	pub fn clear(&self) {
		self.clients.clear();
	}

	pub fn ttl(&self) -> Duration {
		self.ttl
	}

	pub fn len(&self) -> usize {
		self.clients.len()
	}

	pub fn is_empty(&self) -> bool {
		self.clients.is_empty()
	}
}

impl Default for ClientCache {
	fn default() -> Self {
		Self::new()
	}
}

lazy_static::lazy_static! {
	static ref GLOBAL_CLIENT_CACHE: ClientCache = ClientCache::new();
}

/// Process-wide cache shared by backends built without an explicit cache
pub fn global_client_cache() -> ClientCache {
	GLOBAL_CLIENT_CACHE.clone()
}

#[cfg(test)]
mod tests {
	use super::*;

	fn backend() -> BackendConfig {
		BackendConfig::new(SolverId::AggregatorA).with_endpoint("https://route.test")
	}

	#[test]
	fn test_client_config_from_backend() {
		let mut config = backend();
		config.timeout_ms = 2_500;
		config.headers = Some([("X-Partner".to_string(), "vaults".to_string())].into());

		let client_config = ClientConfig::from(&config);
		assert_eq!(client_config.base_url, "https://route.test");
		assert_eq!(client_config.timeout_ms, 2_500);
		assert!(client_config
			.headers
			.contains(&("X-Partner".to_string(), "vaults".to_string())));
	}

	#[tokio::test]
	async fn test_clients_are_reused_until_expired() {
		let cache = ClientCache::with_ttl(Duration::from_millis(50));
		let config = ClientConfig::from(&backend());

		let first = cache.get_client(&config).unwrap();
		let second = cache.get_client(&config).unwrap();
		assert!(Arc::ptr_eq(&first, &second));

		tokio::time::sleep(Duration::from_millis(80)).await;
		let third = cache.get_client(&config).unwrap();
		assert!(!Arc::ptr_eq(&first, &third));
	}

	#[tokio::test]
	async fn test_auth_separates_clients() {
		let cache = ClientCache::new();
		let key = SecretString::from("key-1");
		let other_key = SecretString::from("key-2");

		let plain = cache
			.get_client_with_auth(&backend(), &AuthConfig::None)
			.unwrap();
		let keyed = cache
			.get_client_with_auth(&backend(), &AuthConfig::api_key("x-api-key", Some(&key)))
			.unwrap();
		let keyed_again = cache
			.get_client_with_auth(&backend(), &AuthConfig::api_key("x-api-key", Some(&key)))
			.unwrap();
		let other = cache
			.get_client_with_auth(&backend(), &AuthConfig::bearer(Some(&other_key)))
			.unwrap();

		assert!(!Arc::ptr_eq(&plain, &keyed));
		assert!(Arc::ptr_eq(&keyed, &keyed_again));
		assert!(!Arc::ptr_eq(&keyed, &other));
		assert_eq!(cache.len(), 3);
	}

	#[tokio::test]
	async fn test_cleanup_expired() {
		let cache = ClientCache::with_ttl(Duration::from_millis(10));
		cache.get_client(&ClientConfig::from(&backend())).unwrap();
		tokio::time::sleep(Duration::from_millis(30)).await;

		assert_eq!(cache.cleanup_expired(), 1);
		assert!(cache.is_empty());
	}
}
