use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::domain::{ExchangeDetails, OfferStateChange, SendStatus, TradeItem};
use crate::error::Result;

/// Login material for one managed account.
#[derive(Debug, Clone)]
pub struct AccountCredentials {
    pub account_name: String,
    pub password: String,
    /// TOTP seed used to mint one-time login codes.
    pub two_factor_secret: String,
}

/// Events emitted by an authenticated platform session.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    LoggedOn,
    /// Session cookies went stale; the agent re-authenticates.
    SessionExpired,
    /// Fresh web cookies to propagate to dependent sub-clients.
    WebSessionRenewed { cookies: Vec<String> },
    /// Transport-level error. Logged, never fatal.
    TransportError(String),
    /// The platform stopped answering polls; dispatch must be suspended.
    PollFailure,
    /// A poll cycle succeeded; dispatch may resume.
    PollSuccess,
}

/// Event streams owned by one live session.
pub struct SessionHandle {
    pub session_events: mpsc::Receiver<SessionEvent>,
    pub offer_events: mpsc::Receiver<OfferStateChange>,
}

/// A trade offer ready to send.
#[derive(Debug, Clone)]
pub struct OfferDraft {
    /// Counterpart trade address (trade URL).
    pub counterpart_address: String,
    /// Human-readable message carrying the match token.
    pub message: String,
    /// Items the agent gives away.
    pub give: Vec<TradeItem>,
    /// Items requested from the counterpart.
    pub take: Vec<TradeItem>,
}

/// Handle to an offer the platform accepted for delivery.
#[derive(Debug, Clone)]
pub struct OfferSubmission {
    pub offer_id: String,
    pub status: SendStatus,
}

/// Capability boundary to the external trading platform. The wire protocol
/// behind it (authentication, polling, confirmations) is not this crate's
/// concern.
#[async_trait]
pub trait PlatformClient: Send + Sync {
    /// Opens an authenticated session and returns its event streams.
    async fn connect(&self, credentials: &AccountCredentials) -> Result<SessionHandle>;

    /// Re-authenticates an existing session after expiry. Events keep
    /// flowing on the original streams.
    async fn relogin(&self, credentials: &AccountCredentials) -> Result<()>;

    /// Propagates renewed web cookies to the session's sub-clients.
    async fn adopt_web_session(&self, account_name: &str, cookies: &[String]) -> Result<()>;

    async fn send_offer(&self, account_name: &str, draft: OfferDraft) -> Result<OfferSubmission>;

    /// Signs the mobile confirmation for a pending offer.
    async fn confirm_offer(
        &self,
        account_name: &str,
        identity_secret: &str,
        offer_id: &str,
    ) -> Result<()>;

    /// Confirmed post-settlement quantities and asset ids for an accepted
    /// offer. These can differ from the pre-offer item set.
    async fn exchange_details(&self, account_name: &str, offer_id: &str)
        -> Result<ExchangeDetails>;
}
