//! Agent Pool Coordinator
//!
//! Owns the set of trading agents, staggers their activation, and routes
//! deposit/withdraw dispatch requests to an eligible agent.

pub mod config;
pub mod pool;

pub use config::PoolConfig;
pub use pool::{AgentPool, WithdrawGroup, WithdrawGroupResult};
