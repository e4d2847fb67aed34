//! Trading agent: one authenticated platform session.
//!
//! The agent owns its running flag and capacity counter. The capacity
//! counter is seeded once from the platform's authoritative inventory count
//! at establishment; the running flag is flipped only by the agent's own
//! session-event loop (poll failure suspends dispatch, poll success resumes
//! it). Nothing in the loop can take the process down: session errors are
//! absorbed and retried here, never surfaced to dispatch callers.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::config::AccountConfig;
use crate::domain::{DispatchResponse, OfferStateChange, SendStatus, TradeItem};
use crate::error::Result;
use crate::platform::{
    AccountCredentials, InventoryProvider, OfferDraft, PlatformClient, SessionEvent,
};

/// Attribution carried into listings and logs, plus the login account name
/// that keys platform calls. `name` is the display label and never reaches
/// the platform.
#[derive(Debug, Clone)]
pub struct AgentIdentity {
    pub id: String,
    pub name: String,
    pub account_name: String,
}

pub struct TradingAgent {
    id: String,
    name: String,
    platform_id: String,
    identity_secret: String,
    credentials: AccountCredentials,
    client: Arc<dyn PlatformClient>,
    running: AtomicBool,
    held_items: AtomicU32,
}

impl TradingAgent {
    /// Opens the session, seeds the capacity counter from the platform's
    /// inventory count, and spawns the session-event loop. Returns the agent
    /// together with its offer-event stream for the reconciler.
    pub async fn establish(
        config: &AccountConfig,
        client: Arc<dyn PlatformClient>,
        inventory: Arc<dyn InventoryProvider>,
    ) -> Result<(Arc<Self>, mpsc::Receiver<OfferStateChange>)> {
        let credentials = config.credentials();
        let handle = client.connect(&credentials).await?;
        let held = inventory.total_count(&config.platform_id).await?;

        let agent = Arc::new(Self {
            id: config.id.clone(),
            name: config.display().to_string(),
            platform_id: config.platform_id.clone(),
            identity_secret: config.identity_secret.clone(),
            credentials,
            client,
            running: AtomicBool::new(true),
            held_items: AtomicU32::new(held),
        });

        Arc::clone(&agent).spawn_session_loop(handle.session_events);
        info!(
            agent = %agent.name,
            platform_id = %agent.platform_id,
            held_items = held,
            "agent session established"
        );

        Ok((agent, handle.offer_events))
    }

    fn spawn_session_loop(self: Arc<Self>, mut events: mpsc::Receiver<SessionEvent>) {
        tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                match event {
                    SessionEvent::LoggedOn => {
                        debug!(agent = %self.name, "session logged on");
                    }
                    SessionEvent::SessionExpired => {
                        warn!(agent = %self.name, "session expired, re-authenticating");
                        if let Err(e) = self.client.relogin(&self.credentials).await {
                            error!(agent = %self.name, error = %e, "re-login failed");
                        }
                    }
                    SessionEvent::WebSessionRenewed { cookies } => {
                        if let Err(e) = self
                            .client
                            .adopt_web_session(&self.credentials.account_name, &cookies)
                            .await
                        {
                            warn!(agent = %self.name, error = %e, "cookie propagation failed");
                        }
                    }
                    SessionEvent::TransportError(reason) => {
                        error!(agent = %self.name, %reason, "platform transport error");
                    }
                    SessionEvent::PollFailure => {
                        self.running.store(false, Ordering::SeqCst);
                        warn!(agent = %self.name, "poll failure, dispatch suspended");
                    }
                    SessionEvent::PollSuccess => {
                        self.running.store(true, Ordering::SeqCst);
                    }
                }
            }
            warn!(agent = %self.name, "session event stream closed");
        });
    }

    /// Sends an offer requesting the counterpart's items (deposit flow).
    /// All failures come back as a structured response.
    pub async fn send_deposit_offer(
        &self,
        match_token: &str,
        trade_url: &str,
        items: Vec<TradeItem>,
    ) -> DispatchResponse {
        let draft = OfferDraft {
            counterpart_address: trade_url.to_string(),
            message: format!(
                "Sell your items on the marketplace. Match code {match_token}"
            ),
            give: Vec::new(),
            take: items,
        };

        match self
            .client
            .send_offer(&self.credentials.account_name, draft)
            .await
        {
            Ok(submission) => {
                info!(
                    agent = %self.name,
                    offer = %submission.offer_id,
                    status = ?submission.status,
                    "deposit offer sent"
                );
                DispatchResponse::delivered(submission.status, submission.offer_id, self.id.clone())
            }
            Err(e) => {
                error!(agent = %self.name, error = %e, "deposit offer send failed");
                DispatchResponse::failure("Failed to send offer")
            }
        }
    }

    /// Sends an offer giving the agent's own items (withdraw flow). A
    /// `pending` send requires mobile confirmation, which is signed here
    /// with the agent's identity secret; a confirmation failure is logged
    /// and the offer is left to expire through the declined path.
    pub async fn send_withdraw_offer(
        &self,
        match_token: &str,
        trade_url: &str,
        items: Vec<TradeItem>,
    ) -> DispatchResponse {
        let draft = OfferDraft {
            counterpart_address: trade_url.to_string(),
            message: format!("Your withdrawal from the marketplace. Match code: {match_token}"),
            give: items,
            take: Vec::new(),
        };

        let submission = match self
            .client
            .send_offer(&self.credentials.account_name, draft)
            .await
        {
            Ok(submission) => submission,
            Err(e) => {
                error!(agent = %self.name, error = %e, "withdraw offer send failed");
                return DispatchResponse::failure("Failed to send offer");
            }
        };

        if submission.status == SendStatus::Pending {
            match self
                .client
                .confirm_offer(
                    &self.credentials.account_name,
                    &self.identity_secret,
                    &submission.offer_id,
                )
                .await
            {
                Ok(()) => {
                    info!(agent = %self.name, offer = %submission.offer_id, "offer confirmed");
                }
                Err(e) => {
                    error!(
                        agent = %self.name,
                        offer = %submission.offer_id,
                        error = %e,
                        "offer confirmation failed"
                    );
                }
            }
        }

        info!(
            agent = %self.name,
            offer = %submission.offer_id,
            status = ?submission.status,
            "withdraw offer sent"
        );
        DispatchResponse::delivered(submission.status, submission.offer_id, self.id.clone())
    }

    pub fn identity(&self) -> AgentIdentity {
        AgentIdentity {
            id: self.id.clone(),
            name: self.name.clone(),
            account_name: self.credentials.account_name.clone(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn platform_id(&self) -> &str {
        &self.platform_id
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Items currently held, refreshed once at establishment.
    pub fn held_items(&self) -> u32 {
        self.held_items.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::DispatchStatus;
    use crate::testkit::{account, item, FakeInventory, FakePlatform, ScriptedSend};

    async fn established_agent(
        platform: &Arc<FakePlatform>,
        held: u32,
    ) -> (Arc<TradingAgent>, mpsc::Receiver<OfferStateChange>) {
        let inventory = Arc::new(FakeInventory::with_default(held));
        TradingAgent::establish(
            &account("bot-1", "marketbot01"),
            Arc::clone(platform) as Arc<dyn PlatformClient>,
            inventory,
        )
        .await
        .expect("establish agent")
    }

    #[tokio::test]
    async fn establish_seeds_capacity_and_running_flag() {
        let platform = Arc::new(FakePlatform::new());
        let (agent, _offers) = established_agent(&platform, 412).await;

        assert!(agent.is_running());
        assert_eq!(agent.held_items(), 412);
        assert_eq!(agent.name(), "marketbot01");
    }

    #[tokio::test]
    async fn poll_failure_suspends_dispatch_until_next_success() {
        let platform = Arc::new(FakePlatform::new());
        let (agent, _offers) = established_agent(&platform, 0).await;

        platform
            .session_sender("marketbot01")
            .send(SessionEvent::PollFailure)
            .await
            .expect("send event");
        while agent.is_running() {
            tokio::task::yield_now().await;
        }

        platform
            .session_sender("marketbot01")
            .send(SessionEvent::PollSuccess)
            .await
            .expect("send event");
        while !agent.is_running() {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn renewed_web_cookies_are_propagated() {
        let platform = Arc::new(FakePlatform::new());
        let (_agent, _offers) = established_agent(&platform, 0).await;

        platform
            .session_sender("marketbot01")
            .send(SessionEvent::WebSessionRenewed {
                cookies: vec!["sessionid=abc123".into(), "steamLogin=tok".into()],
            })
            .await
            .expect("send event");
        while platform.adopted_cookies().is_empty() {
            tokio::task::yield_now().await;
        }

        let adopted = platform.adopted_cookies();
        assert_eq!(adopted.len(), 1);
        assert_eq!(adopted[0].0, "marketbot01");
        assert_eq!(
            adopted[0].1,
            vec!["sessionid=abc123".to_string(), "steamLogin=tok".to_string()]
        );
    }

    #[tokio::test]
    async fn platform_calls_are_keyed_by_the_login_account() {
        let platform = Arc::new(FakePlatform::new());
        platform.push_send_result(ScriptedSend::Deliver(SendStatus::Pending));

        let mut config = account("bot-1", "marketbot01");
        config.display_name = Some("Backup Bot".into());
        let inventory = Arc::new(FakeInventory::with_default(0));
        let (agent, _offers) = TradingAgent::establish(
            &config,
            Arc::clone(&platform) as Arc<dyn PlatformClient>,
            inventory,
        )
        .await
        .expect("establish agent");

        // Display label is attribution only.
        assert_eq!(agent.name(), "Backup Bot");

        let response = agent
            .send_withdraw_offer("MATCH46", "https://trade.example/u1", vec![item("a1", "Knife")])
            .await;
        assert!(response.ok);

        // Sends and confirmations go out under the login account name.
        assert_eq!(platform.sent_drafts()[0].0, "marketbot01");
        assert_eq!(platform.confirmations()[0].0, "marketbot01");
        assert_eq!(agent.identity().account_name, "marketbot01");
        assert_eq!(agent.identity().name, "Backup Bot");
    }

    #[tokio::test]
    async fn session_expiry_triggers_relogin() {
        let platform = Arc::new(FakePlatform::new());
        let (_agent, _offers) = established_agent(&platform, 0).await;

        platform
            .session_sender("marketbot01")
            .send(SessionEvent::SessionExpired)
            .await
            .expect("send event");
        while platform.relogins().is_empty() {
            tokio::task::yield_now().await;
        }
        assert_eq!(platform.relogins(), vec!["marketbot01".to_string()]);
    }

    #[tokio::test]
    async fn deposit_offer_requests_counterpart_items() {
        let platform = Arc::new(FakePlatform::new());
        let (agent, _offers) = established_agent(&platform, 0).await;

        let response = agent
            .send_deposit_offer("MATCH42", "https://trade.example/u1", vec![item("a1", "Knife")])
            .await;

        assert!(response.ok);
        assert_eq!(response.status, DispatchStatus::Sent);
        assert_eq!(response.agent_id.as_deref(), Some("bot-1"));

        let drafts = platform.sent_drafts();
        assert_eq!(drafts.len(), 1);
        let (_, draft) = &drafts[0];
        assert!(draft.give.is_empty());
        assert_eq!(draft.take.len(), 1);
        assert!(draft.message.contains("MATCH42"));
        // No confirmation for an offer that requests items only.
        assert!(platform.confirmations().is_empty());
    }

    #[tokio::test]
    async fn pending_withdraw_offer_is_confirmed_with_identity_secret() {
        let platform = Arc::new(FakePlatform::new());
        platform.push_send_result(ScriptedSend::Deliver(SendStatus::Pending));
        let (agent, _offers) = established_agent(&platform, 0).await;

        let response = agent
            .send_withdraw_offer("MATCH43", "https://trade.example/u1", vec![item("a2", "Rifle")])
            .await;

        assert!(response.ok);
        assert_eq!(response.status, DispatchStatus::Pending);

        let confirmations = platform.confirmations();
        assert_eq!(confirmations.len(), 1);
        assert_eq!(confirmations[0].0, "marketbot01");
        let drafts = platform.sent_drafts();
        assert_eq!(drafts[0].1.give.len(), 1);
        assert!(drafts[0].1.take.is_empty());
    }

    #[tokio::test]
    async fn confirmation_failure_still_reports_a_delivered_offer() {
        let platform = Arc::new(FakePlatform::new());
        platform.push_send_result(ScriptedSend::Deliver(SendStatus::Pending));
        platform.fail_next_confirmation();
        let (agent, _offers) = established_agent(&platform, 0).await;

        let response = agent
            .send_withdraw_offer("MATCH44", "https://trade.example/u1", vec![item("a3", "Glove")])
            .await;

        assert!(response.ok);
        assert_eq!(response.status, DispatchStatus::Pending);
    }

    #[tokio::test]
    async fn send_failure_becomes_a_structured_response() {
        let platform = Arc::new(FakePlatform::new());
        platform.push_send_result(ScriptedSend::Fail("escrow hold".into()));
        let (agent, _offers) = established_agent(&platform, 0).await;

        let response = agent
            .send_withdraw_offer("MATCH45", "https://trade.example/u1", vec![item("a4", "Case")])
            .await;

        assert!(!response.ok);
        assert_eq!(response.status, DispatchStatus::Err);
        assert_eq!(response.detail.state, 0);
    }
}
