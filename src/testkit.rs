//! Scripted fakes and builders shared by unit and integration tests.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Mutex;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::config::AccountConfig;
use crate::domain::{
    ExchangeDetails, OfferStateChange, RecordStatus, RequestedItem, SendStatus, TradeItem,
    TradeRecord, TradeType,
};
use crate::error::{PoolError, Result};
use crate::platform::{
    AccountCredentials, InventoryProvider, OfferDraft, OfferSubmission, PlatformClient,
    SessionEvent, SessionHandle,
};

pub fn account(id: &str, name: &str) -> AccountConfig {
    AccountConfig {
        id: id.to_string(),
        account_name: name.to_string(),
        display_name: None,
        password: "hunter2".to_string(),
        shared_secret: "c2hhcmVk".to_string(),
        identity_secret: "aWRlbnRpdHk=".to_string(),
        platform_id: format!("id-{name}"),
        active: true,
    }
}

pub fn item(asset_id: &str, name: &str) -> TradeItem {
    TradeItem {
        asset_id: asset_id.to_string(),
        new_asset_id: None,
        class_id: format!("class-{asset_id}"),
        name: name.to_string(),
        market_hash_name: name.to_string(),
        icon_url: format!("https://icons.example/{asset_id}.png"),
        kind: "Weapon".to_string(),
        tags: Vec::new(),
        descriptions: Vec::new(),
        inspect_links: Vec::new(),
        sell_price: None,
        commission: None,
    }
}

pub fn pending_record(offer_id: &str, trade_type: TradeType, user_id: &str) -> TradeRecord {
    TradeRecord {
        id: Uuid::new_v4(),
        offer_id: Some(offer_id.to_string()),
        trade_type,
        user_id: user_id.to_string(),
        items: Vec::new(),
        sell_price: None,
        commission: None,
        status: RecordStatus::Pending,
        accepted: false,
        created_at: Utc::now(),
    }
}

pub fn requested(asset_id: &str) -> RequestedItem {
    RequestedItem {
        asset_id: asset_id.to_string(),
        sell_price: None,
        commission: None,
    }
}

/// Scripted outcome for the next `send_offer` call.
pub enum ScriptedSend {
    Deliver(SendStatus),
    Fail(String),
}

struct SessionPorts {
    session_tx: mpsc::Sender<SessionEvent>,
    offer_tx: mpsc::Sender<OfferStateChange>,
}

/// Scripted platform client. Sessions hand their event senders back to the
/// test; offer sends default to `sent` unless a scripted result is queued.
#[derive(Default)]
pub struct FakePlatform {
    sessions: Mutex<HashMap<String, SessionPorts>>,
    send_script: Mutex<Vec<ScriptedSend>>,
    sent_drafts: Mutex<Vec<(String, OfferDraft)>>,
    confirmations: Mutex<Vec<(String, String)>>,
    relogins: Mutex<Vec<String>>,
    adopted_cookies: Mutex<Vec<(String, Vec<String>)>>,
    details: Mutex<HashMap<String, ExchangeDetails>>,
    failing_details: Mutex<HashSet<String>>,
    connect_failures: AtomicUsize,
    fail_confirm: AtomicBool,
    offer_seq: AtomicU64,
}

impl FakePlatform {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_next_connect(&self) {
        self.connect_failures.fetch_add(1, Ordering::SeqCst);
    }

    pub fn push_send_result(&self, result: ScriptedSend) {
        self.send_script.lock().expect("script lock").push(result);
    }

    pub fn fail_next_confirmation(&self) {
        self.fail_confirm.store(true, Ordering::SeqCst);
    }

    pub fn set_exchange_details(&self, offer_id: &str, details: ExchangeDetails) {
        self.details
            .lock()
            .expect("details lock")
            .insert(offer_id.to_string(), details);
    }

    pub fn fail_exchange_details(&self, offer_id: &str) {
        self.failing_details
            .lock()
            .expect("details lock")
            .insert(offer_id.to_string());
    }

    pub fn session_sender(&self, account_name: &str) -> mpsc::Sender<SessionEvent> {
        self.sessions
            .lock()
            .expect("sessions lock")
            .get(account_name)
            .expect("no session for account")
            .session_tx
            .clone()
    }

    pub fn offer_sender(&self, account_name: &str) -> mpsc::Sender<OfferStateChange> {
        self.sessions
            .lock()
            .expect("sessions lock")
            .get(account_name)
            .expect("no session for account")
            .offer_tx
            .clone()
    }

    pub fn sent_drafts(&self) -> Vec<(String, OfferDraft)> {
        self.sent_drafts.lock().expect("drafts lock").clone()
    }

    pub fn confirmations(&self) -> Vec<(String, String)> {
        self.confirmations.lock().expect("confirm lock").clone()
    }

    pub fn relogins(&self) -> Vec<String> {
        self.relogins.lock().expect("relogin lock").clone()
    }

    pub fn adopted_cookies(&self) -> Vec<(String, Vec<String>)> {
        self.adopted_cookies.lock().expect("cookies lock").clone()
    }
}

#[async_trait]
impl PlatformClient for FakePlatform {
    async fn connect(&self, credentials: &AccountCredentials) -> Result<SessionHandle> {
        if self.connect_failures.load(Ordering::SeqCst) > 0 {
            self.connect_failures.fetch_sub(1, Ordering::SeqCst);
            return Err(PoolError::SessionFailure("scripted connect failure".into()));
        }

        let (session_tx, session_events) = mpsc::channel(64);
        let (offer_tx, offer_events) = mpsc::channel(64);
        self.sessions.lock().expect("sessions lock").insert(
            credentials.account_name.clone(),
            SessionPorts {
                session_tx,
                offer_tx,
            },
        );
        Ok(SessionHandle {
            session_events,
            offer_events,
        })
    }

    async fn relogin(&self, credentials: &AccountCredentials) -> Result<()> {
        self.relogins
            .lock()
            .expect("relogin lock")
            .push(credentials.account_name.clone());
        Ok(())
    }

    async fn adopt_web_session(&self, account_name: &str, cookies: &[String]) -> Result<()> {
        self.adopted_cookies
            .lock()
            .expect("cookies lock")
            .push((account_name.to_string(), cookies.to_vec()));
        Ok(())
    }

    async fn send_offer(&self, account_name: &str, draft: OfferDraft) -> Result<OfferSubmission> {
        let scripted = self.send_script.lock().expect("script lock").pop();
        match scripted {
            Some(ScriptedSend::Fail(reason)) => Err(PoolError::OfferSendFailure(reason)),
            Some(ScriptedSend::Deliver(status)) => {
                self.sent_drafts
                    .lock()
                    .expect("drafts lock")
                    .push((account_name.to_string(), draft));
                let n = self.offer_seq.fetch_add(1, Ordering::SeqCst) + 1;
                Ok(OfferSubmission {
                    offer_id: format!("offer-{n}"),
                    status,
                })
            }
            None => {
                self.sent_drafts
                    .lock()
                    .expect("drafts lock")
                    .push((account_name.to_string(), draft));
                let n = self.offer_seq.fetch_add(1, Ordering::SeqCst) + 1;
                Ok(OfferSubmission {
                    offer_id: format!("offer-{n}"),
                    status: SendStatus::Sent,
                })
            }
        }
    }

    async fn confirm_offer(
        &self,
        account_name: &str,
        _identity_secret: &str,
        offer_id: &str,
    ) -> Result<()> {
        if self.fail_confirm.swap(false, Ordering::SeqCst) {
            return Err(PoolError::ConfirmationFailure {
                offer_id: offer_id.to_string(),
                reason: "scripted confirmation failure".into(),
            });
        }
        self.confirmations
            .lock()
            .expect("confirm lock")
            .push((account_name.to_string(), offer_id.to_string()));
        Ok(())
    }

    async fn exchange_details(
        &self,
        _account_name: &str,
        offer_id: &str,
    ) -> Result<ExchangeDetails> {
        if self
            .failing_details
            .lock()
            .expect("details lock")
            .contains(offer_id)
        {
            return Err(PoolError::Internal("scripted exchange details failure".into()));
        }
        Ok(self
            .details
            .lock()
            .expect("details lock")
            .get(offer_id)
            .cloned()
            .unwrap_or_default())
    }
}

/// Fixed inventory counts keyed by platform id.
#[derive(Default)]
pub struct FakeInventory {
    default_count: u32,
    counts: Mutex<HashMap<String, u32>>,
}

impl FakeInventory {
    pub fn with_default(default_count: u32) -> Self {
        Self {
            default_count,
            counts: Mutex::new(HashMap::new()),
        }
    }

    pub fn set_count(&self, platform_id: &str, count: u32) {
        self.counts
            .lock()
            .expect("counts lock")
            .insert(platform_id.to_string(), count);
    }
}

#[async_trait]
impl InventoryProvider for FakeInventory {
    async fn total_count(&self, platform_id: &str) -> Result<u32> {
        Ok(self
            .counts
            .lock()
            .expect("counts lock")
            .get(platform_id)
            .copied()
            .unwrap_or(self.default_count))
    }
}
