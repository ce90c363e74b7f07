//! Solver backends for the vault solver engine
//!
//! Every execution strategy implements [`vs_types::SolverBackend`]. On-chain
//! strategies (direct vault calls, migration, staking boosters) quote through
//! contract reads; the aggregator zaps and the settlement swap quote through
//! their upstream HTTP services.

pub mod abi;
pub mod aggregator_a;
pub mod aggregator_b;
pub mod allowance_cache;
pub mod client_cache;
pub mod context;
pub mod direct;
pub mod factory;
pub mod migration;
pub mod registry;
pub mod route_memory;
pub mod settlement;
pub mod staking;
pub mod vault;
pub mod zap;

pub use aggregator_a::AggregatorAApi;
pub use aggregator_b::AggregatorBApi;
pub use allowance_cache::{AllowanceCache, AllowanceKey};
pub use client_cache::{global_client_cache, AuthConfig, ClientCache, ClientConfig};
pub use context::BackendContext;
pub use direct::{DirectRoute, DirectSolver};
pub use factory::SolverFactory;
pub use migration::MigrationSolver;
pub use registry::{CategoryPriorities, SolverRegistry};
pub use route_memory::{DispatchTicket, RouteMemory};
pub use settlement::SettlementSolver;
pub use staking::{BoosterKind, StakingSolver};
pub use zap::{ZapApi, ZapRoute, ZapSolver};
