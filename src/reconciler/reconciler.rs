//! Offer reconciler: maps terminal offer events onto persisted records.
//!
//! Each watched agent gets a router task reading its offer-event stream.
//! Slow settlement work (price lookups, persistence writes) never runs on
//! the router: events are handed to a per-offer worker task, so events for
//! one offer id are processed strictly in arrival order while different
//! offers settle concurrently. Idempotence comes from the gateway's
//! compare-and-set status transitions: a replayed terminal event finds the
//! record already terminal and stops there.

use dashmap::DashMap;
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::agent::AgentIdentity;
use crate::domain::{
    ActivityEntry, ActivityKind, MarketplaceListing, OfferCategory, OfferStateChange, TradeItem,
    TradeRecord,
};
use crate::error::PoolError;
use crate::persistence::PersistenceGateway;
use crate::platform::PlatformClient;

use super::inspect::ItemInspector;
use super::settlement::{
    classify, SettlementPlan, PLACEHOLDER_COMMISSION, PLACEHOLDER_SELL_PRICE,
};

/// How long an idle worker waits for its next event before retiring. Offers
/// the platform never reports a terminal state for would otherwise pin a
/// task and a registry entry forever.
const WORKER_IDLE_TIMEOUT: Duration = Duration::from_secs(300);

struct OfferJob {
    agent: AgentIdentity,
    change: OfferStateChange,
}

pub struct OfferReconciler {
    gateway: Arc<dyn PersistenceGateway>,
    platform: Arc<dyn PlatformClient>,
    inspector: Arc<dyn ItemInspector>,
    workers: DashMap<String, mpsc::Sender<OfferJob>>,
}

impl OfferReconciler {
    pub fn new(
        gateway: Arc<dyn PersistenceGateway>,
        platform: Arc<dyn PlatformClient>,
        inspector: Arc<dyn ItemInspector>,
    ) -> Arc<Self> {
        Arc::new(Self {
            gateway,
            platform,
            inspector,
            workers: DashMap::new(),
        })
    }

    /// Subscribes to one agent's offer-event stream.
    pub fn watch_agent(
        self: &Arc<Self>,
        agent: AgentIdentity,
        mut events: mpsc::Receiver<OfferStateChange>,
    ) {
        let reconciler = Arc::clone(self);
        tokio::spawn(async move {
            while let Some(change) = events.recv().await {
                reconciler.route(agent.clone(), change).await;
            }
            debug!(agent = %agent.name, "offer event stream closed");
        });
    }

    /// Hands the event to the offer's worker, spawning one if needed. A
    /// worker may retire between lookup and send; the job bounces back and
    /// a fresh worker picks it up.
    async fn route(self: &Arc<Self>, agent: AgentIdentity, change: OfferStateChange) {
        let mut job = OfferJob { agent, change };
        loop {
            let tx = match self.workers.get(&job.change.offer_id) {
                Some(entry) => entry.value().clone(),
                None => self.spawn_worker(job.change.offer_id.clone()),
            };
            match tx.send(job).await {
                Ok(()) => return,
                Err(mpsc::error::SendError(bounced)) => {
                    self.workers
                        .remove_if(&bounced.change.offer_id, |_, sender| {
                            sender.same_channel(&tx)
                        });
                    job = bounced;
                }
            }
        }
    }

    fn spawn_worker(self: &Arc<Self>, offer_id: String) -> mpsc::Sender<OfferJob> {
        let (tx, mut rx) = mpsc::channel::<OfferJob>(16);
        self.workers.insert(offer_id.clone(), tx.clone());

        let reconciler = Arc::clone(self);
        let identity = tx.clone();
        tokio::spawn(async move {
            loop {
                let job = match tokio::time::timeout(WORKER_IDLE_TIMEOUT, rx.recv()).await {
                    Ok(Some(job)) => job,
                    Ok(None) => break,
                    Err(_) => {
                        debug!(offer = %offer_id, "offer worker idle, retiring");
                        break;
                    }
                };
                let terminal = job.change.state.is_terminal();
                reconciler.handle_change(&job.agent, job.change).await;
                if terminal {
                    break;
                }
            }
            reconciler
                .workers
                .remove_if(&offer_id, |_, sender| sender.same_channel(&identity));
            // Anything still buffered is a replay of the terminal event.
            while let Ok(job) = rx.try_recv() {
                reconciler.handle_change(&job.agent, job.change).await;
            }
        });

        tx
    }

    async fn handle_change(&self, agent: &AgentIdentity, change: OfferStateChange) {
        match change.state.category() {
            OfferCategory::Active => {
                debug!(offer = %change.offer_id, state = ?change.state, "offer still active");
            }
            OfferCategory::Declined => self.handle_declined(change).await,
            OfferCategory::Accepted => self.handle_accepted(agent, &change.offer_id).await,
        }
    }

    async fn handle_declined(&self, change: OfferStateChange) {
        if !change.has_items() {
            debug!(offer = %change.offer_id, "declined offer carried no items, nothing to do");
            return;
        }
        match self.gateway.mark_record_declined(&change.offer_id).await {
            Ok(true) => {
                info!(offer = %change.offer_id, state = ?change.state, "trade record declined");
            }
            Ok(false) => {
                debug!(offer = %change.offer_id, "no pending record to decline");
            }
            Err(e) => {
                error!(offer = %change.offer_id, error = %e, "failed to decline trade record");
            }
        }
    }

    async fn handle_accepted(&self, agent: &AgentIdentity, offer_id: &str) {
        let record = match self.gateway.record_by_offer(offer_id).await {
            Ok(Some(record)) => record,
            Ok(None) => {
                // Offers this pool did not originate have no record.
                debug!(offer = %offer_id, "accepted offer has no trade record");
                return;
            }
            Err(e) => {
                error!(offer = %offer_id, error = %e, "trade record lookup failed");
                return;
            }
        };

        // Idempotence gate: only the call that performs the transition may
        // apply settlement side effects.
        match self.gateway.mark_record_confirmed(offer_id).await {
            Ok(true) => {}
            Ok(false) => {
                debug!(offer = %offer_id, "record already settled, duplicate accepted event");
                return;
            }
            Err(e) => {
                error!(offer = %offer_id, error = %e, "failed to confirm trade record");
                return;
            }
        }

        let details = match self
            .platform
            .exchange_details(&agent.account_name, offer_id)
            .await
        {
            Ok(details) => details,
            Err(e) => {
                let anomaly =
                    PoolError::ReconciliationAnomaly(format!("exchange details unavailable: {e}"));
                warn!(offer = %offer_id, error = %anomaly, "settlement skipped");
                return;
            }
        };

        match classify(&details, record.trade_type) {
            SettlementPlan::MarketListing { items } => {
                self.settle_received(agent, &record, items, true).await;
            }
            SettlementPlan::InventoryImport { items } => {
                self.settle_received(agent, &record, items, false).await;
            }
            SettlementPlan::Delist { items } => {
                self.settle_sent(&record, items).await;
            }
            SettlementPlan::Anomaly(reason) => {
                let anomaly = PoolError::ReconciliationAnomaly(reason);
                warn!(
                    offer = %offer_id,
                    trade_type = %record.trade_type,
                    error = %anomaly,
                    "settlement anomaly, skipped"
                );
            }
        }
    }

    async fn settle_received(
        &self,
        agent: &AgentIdentity,
        record: &TradeRecord,
        items: &[TradeItem],
        list_on_market: bool,
    ) {
        for item in items {
            if let Err(e) = self
                .list_received_item(agent, record, item, list_on_market)
                .await
            {
                error!(
                    offer = ?record.offer_id,
                    asset = %item.asset_id,
                    error = %e,
                    "failed to settle received item"
                );
            }
        }
    }

    async fn list_received_item(
        &self,
        agent: &AgentIdentity,
        record: &TradeRecord,
        item: &TradeItem,
        list_on_market: bool,
    ) -> crate::error::Result<()> {
        let price = self
            .gateway
            .reference_price(&item.market_hash_name)
            .await?
            .unwrap_or(Decimal::ZERO);

        let requested = record.requested_item(&item.asset_id);
        let requested_sell = requested.and_then(|r| r.sell_price);
        let requested_commission = requested.and_then(|r| r.commission);

        let (sell_price, commission) = if list_on_market {
            (
                requested_sell.unwrap_or(PLACEHOLDER_SELL_PRICE),
                requested_commission.unwrap_or(PLACEHOLDER_COMMISSION),
            )
        } else {
            // Imports fall back to the record-level terms, then zero.
            (
                requested_sell.or(record.sell_price).unwrap_or(Decimal::ZERO),
                requested_commission
                    .or(record.commission)
                    .unwrap_or(Decimal::ZERO),
            )
        };

        let listing = MarketplaceListing {
            id: Uuid::new_v4(),
            user_id: record.user_id.clone(),
            owner_id: record.user_id.clone(),
            asset_id: item.settled_asset_id().to_string(),
            class_id: item.class_id.clone(),
            name: item.name.clone(),
            market_hash_name: item.market_hash_name.clone(),
            sold: false,
            listing: list_on_market,
            price,
            sell_price,
            commission,
            icon_url: item.icon_url.clone(),
            kind: item.kind.clone(),
            tradable: false,
            bargain: false,
            tags: item.tags.clone(),
            descriptions: item.descriptions.clone(),
            wear_value: self.inspector.wear_value(item),
            inspect_links: item.inspect_links.clone(),
            agent_name: agent.name.clone(),
            agent_id: agent.id.clone(),
            stickers: self.inspector.stickers(item),
            unique_points: self.inspector.unique_points(item),
            deleted: false,
            created_at: chrono::Utc::now(),
        };
        self.gateway.insert_listing(&listing).await?;

        self.gateway
            .append_activity(&ActivityEntry {
                kind: if list_on_market {
                    ActivityKind::MarketListing
                } else {
                    ActivityKind::InventoryImport
                },
                user_id: record.user_id.clone(),
                asset_id: item.asset_id.clone(),
                name: item.name.clone(),
                market_hash_name: item.market_hash_name.clone(),
                icon_url: item.icon_url.clone(),
                price,
                sell_price: requested_sell.unwrap_or(Decimal::ZERO),
                commission: requested_commission.unwrap_or(Decimal::ZERO),
                at: chrono::Utc::now(),
            })
            .await?;

        info!(
            offer = ?record.offer_id,
            user = %record.user_id,
            asset = %item.asset_id,
            listed = list_on_market,
            "received item settled"
        );
        Ok(())
    }

    async fn settle_sent(&self, record: &TradeRecord, items: &[TradeItem]) {
        for item in items {
            match self
                .gateway
                .delist_item(&record.user_id, &item.asset_id)
                .await
            {
                Ok(true) => {}
                Ok(false) => {
                    warn!(
                        user = %record.user_id,
                        asset = %item.asset_id,
                        "no matching listing to delist"
                    );
                }
                Err(e) => {
                    error!(
                        user = %record.user_id,
                        asset = %item.asset_id,
                        error = %e,
                        "failed to delist item"
                    );
                    continue;
                }
            }

            let price = match self.gateway.live_price(&item.market_hash_name).await {
                Ok(price) => price.unwrap_or(Decimal::ZERO),
                Err(e) => {
                    warn!(
                        asset = %item.asset_id,
                        error = %e,
                        "live price lookup failed, logging zero"
                    );
                    Decimal::ZERO
                }
            };

            if let Err(e) = self
                .gateway
                .append_activity(&ActivityEntry {
                    kind: ActivityKind::Withdrawal,
                    user_id: record.user_id.clone(),
                    asset_id: item.asset_id.clone(),
                    name: item.name.clone(),
                    market_hash_name: item.market_hash_name.clone(),
                    icon_url: item.icon_url.clone(),
                    price,
                    sell_price: record.sell_price.unwrap_or(Decimal::ZERO),
                    commission: record.commission.unwrap_or(Decimal::ZERO),
                    at: chrono::Utc::now(),
                })
                .await
            {
                error!(asset = %item.asset_id, error = %e, "failed to append withdraw activity");
            }

            info!(
                offer = ?record.offer_id,
                user = %record.user_id,
                asset = %item.asset_id,
                "sent item settled"
            );
        }
    }
}
