//! Agent pool: owns the live agent set and routes dispatch requests.
//!
//! Activation is intentionally serialized with a fixed delay rather than
//! parallelized; the platform throttles accounts that log in en masse.
//! Selection never busy-spins: it retries with capped backoff and fails
//! with `NoAgentAvailable` once the caller's deadline expires.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::{error, info, warn};

use crate::agent::TradingAgent;
use crate::config::AccountConfig;
use crate::domain::{DispatchResponse, TradeItem};
use crate::error::{PoolError, Result};
use crate::platform::{InventoryProvider, PlatformClient};
use crate::reconciler::OfferReconciler;

use super::config::PoolConfig;

/// One withdraw batch entry: items that must leave a specific agent.
#[derive(Debug, Clone)]
pub struct WithdrawGroup {
    pub agent_name: String,
    pub items: Vec<TradeItem>,
}

/// Per-group outcome of a withdraw batch.
#[derive(Debug, Clone)]
pub struct WithdrawGroupResult {
    pub agent_name: String,
    pub response: DispatchResponse,
}

pub struct AgentPool {
    agents: RwLock<Vec<Arc<TradingAgent>>>,
    client: Arc<dyn PlatformClient>,
    inventory: Arc<dyn InventoryProvider>,
    reconciler: Arc<OfferReconciler>,
    config: PoolConfig,
}

impl AgentPool {
    pub fn new(
        client: Arc<dyn PlatformClient>,
        inventory: Arc<dyn InventoryProvider>,
        reconciler: Arc<OfferReconciler>,
        config: PoolConfig,
    ) -> Self {
        Self {
            agents: RwLock::new(Vec::new()),
            client,
            inventory,
            reconciler,
            config,
        }
    }

    /// Builds the live agent set from the configured accounts, one at a
    /// time with the configured inter-activation delay. A failed account is
    /// logged and skipped; the rest still come up.
    pub async fn activate(&self, accounts: &[AccountConfig]) {
        for account in accounts.iter().filter(|a| a.active) {
            tokio::time::sleep(Duration::from_secs(self.config.activation_delay_secs)).await;

            match TradingAgent::establish(
                account,
                Arc::clone(&self.client),
                Arc::clone(&self.inventory),
            )
            .await
            {
                Ok((agent, offer_events)) => {
                    self.reconciler.watch_agent(agent.identity(), offer_events);
                    info!(agent = %agent.name(), "agent activated");
                    self.agents.write().await.push(agent);
                }
                Err(e) => {
                    error!(
                        account = %account.account_name,
                        error = %e,
                        "agent activation failed, skipping account"
                    );
                }
            }
        }
        info!(agents = self.agent_count().await, "agent pool ready");
    }

    pub async fn agent_count(&self) -> usize {
        self.agents.read().await.len()
    }

    async fn find_eligible(&self) -> Option<Arc<TradingAgent>> {
        self.agents
            .read()
            .await
            .iter()
            .find(|agent| agent.is_running() && agent.held_items() < self.config.capacity_ceiling)
            .cloned()
    }

    /// First running agent with inventory headroom. Retries with capped
    /// backoff until `deadline` (defaults from config) expires, then fails
    /// with `NoAgentAvailable`.
    pub async fn select_for_deposit(
        &self,
        deadline: Option<Duration>,
    ) -> Result<Arc<TradingAgent>> {
        let deadline = deadline.unwrap_or(Duration::from_millis(self.config.select_timeout_ms));
        let started = Instant::now();
        let mut backoff = Duration::from_millis(self.config.select_backoff_initial_ms.max(1));

        loop {
            if let Some(agent) = self.find_eligible().await {
                return Ok(agent);
            }

            let elapsed = started.elapsed();
            let Some(remaining) = deadline.checked_sub(elapsed) else {
                return Err(PoolError::NoAgentAvailable {
                    waited_ms: elapsed.as_millis() as u64,
                });
            };
            if remaining.is_zero() {
                return Err(PoolError::NoAgentAvailable {
                    waited_ms: elapsed.as_millis() as u64,
                });
            }

            let jitter = {
                use rand::Rng;
                Duration::from_millis(
                    rand::thread_rng().gen_range(0..=backoff.as_millis() as u64 / 4 + 1),
                )
            };
            tokio::time::sleep((backoff + jitter).min(remaining)).await;
            backoff = (backoff * 2).min(Duration::from_millis(self.config.select_backoff_max_ms));
        }
    }

    /// The uniquely named running agent. Withdrawals are account-scoped:
    /// the offer must come from the agent that holds the item.
    pub async fn select_for_withdraw(&self, agent_name: &str) -> Result<Arc<TradingAgent>> {
        self.agents
            .read()
            .await
            .iter()
            .find(|agent| agent.is_running() && agent.name() == agent_name)
            .cloned()
            .ok_or_else(|| PoolError::AgentNotFound(agent_name.to_string()))
    }

    /// Deposit dispatch: any eligible agent requests the user's items.
    /// Selection failure comes back as a structured response, never an
    /// error.
    pub async fn dispatch_deposit(
        &self,
        match_token: &str,
        trade_url: &str,
        items: Vec<TradeItem>,
        deadline: Option<Duration>,
    ) -> DispatchResponse {
        match self.select_for_deposit(deadline).await {
            Ok(agent) => agent.send_deposit_offer(match_token, trade_url, items).await,
            Err(e) => {
                warn!(error = %e, "no agent available for deposit dispatch");
                DispatchResponse::failure("Bot not available to send offer")
            }
        }
    }

    /// Withdraw dispatch: each group goes out through its named agent and
    /// resolves independently, so one failed group never aborts the rest.
    pub async fn dispatch_withdraw_batch(
        &self,
        match_token: &str,
        trade_url: &str,
        groups: Vec<WithdrawGroup>,
    ) -> Vec<WithdrawGroupResult> {
        let mut results = Vec::with_capacity(groups.len());
        for group in groups {
            let response = match self.select_for_withdraw(&group.agent_name).await {
                Ok(agent) => {
                    agent
                        .send_withdraw_offer(match_token, trade_url, group.items)
                        .await
                }
                Err(e) => {
                    warn!(
                        agent = %group.agent_name,
                        error = %e,
                        "no agent available for withdraw group"
                    );
                    DispatchResponse::failure("Bot not available to send offer for this item")
                }
            };
            results.push(WithdrawGroupResult {
                agent_name: group.agent_name,
                response,
            });
        }
        results
    }
}
