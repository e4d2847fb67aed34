//! Pool Configuration

use serde::{Deserialize, Serialize};

/// Configuration for the agent pool
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Delay between consecutive agent activations (seconds). A deliberate
    /// cooperative throttle against the platform's anti-automation limits.
    pub activation_delay_secs: u64,
    /// Per-account inventory ceiling; agents at or above it are not
    /// eligible for deposit dispatch.
    pub capacity_ceiling: u32,
    /// Default deadline for finding an eligible agent (ms).
    pub select_timeout_ms: u64,
    /// Initial retry backoff while waiting for an eligible agent (ms).
    pub select_backoff_initial_ms: u64,
    /// Backoff ceiling (ms).
    pub select_backoff_max_ms: u64,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            activation_delay_secs: 5,
            capacity_ceiling: 1000,
            select_timeout_ms: 10_000,
            select_backoff_initial_ms: 250,
            select_backoff_max_ms: 2_000,
        }
    }
}
