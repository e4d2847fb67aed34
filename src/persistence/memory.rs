use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Mutex;

use crate::domain::{ActivityEntry, MarketplaceListing, RecordStatus, TradeRecord};
use crate::error::Result;

use super::PersistenceGateway;

/// In-memory gateway with the same compare-and-set semantics as the
/// PostgreSQL implementation. Used by the test suite and offline runs.
#[derive(Default)]
pub struct InMemoryGateway {
    records: Mutex<HashMap<String, TradeRecord>>,
    listings: Mutex<Vec<MarketplaceListing>>,
    reference_prices: Mutex<HashMap<String, Decimal>>,
    live_prices: Mutex<HashMap<String, Decimal>>,
    activity: Mutex<Vec<ActivityEntry>>,
}

impl InMemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a record under its offer id. Records without an offer id are
    /// not reachable by the reconciler and are rejected here.
    pub fn insert_record(&self, record: TradeRecord) {
        let offer_id = record
            .offer_id
            .clone()
            .expect("seeded record needs an offer id");
        self.records
            .lock()
            .expect("records lock")
            .insert(offer_id, record);
    }

    pub fn set_reference_price(&self, market_hash_name: &str, price: Decimal) {
        self.reference_prices
            .lock()
            .expect("price lock")
            .insert(market_hash_name.to_string(), price);
    }

    pub fn set_live_price(&self, market_hash_name: &str, price: Decimal) {
        self.live_prices
            .lock()
            .expect("price lock")
            .insert(market_hash_name.to_string(), price);
    }

    pub fn push_listing(&self, listing: MarketplaceListing) {
        self.listings.lock().expect("listings lock").push(listing);
    }

    pub fn record(&self, offer_id: &str) -> Option<TradeRecord> {
        self.records
            .lock()
            .expect("records lock")
            .get(offer_id)
            .cloned()
    }

    pub fn listings(&self) -> Vec<MarketplaceListing> {
        self.listings.lock().expect("listings lock").clone()
    }

    pub fn activity(&self) -> Vec<ActivityEntry> {
        self.activity.lock().expect("activity lock").clone()
    }

    fn transition(&self, offer_id: &str, to: RecordStatus, accepted: bool) -> bool {
        let mut records = self.records.lock().expect("records lock");
        match records.get_mut(offer_id) {
            Some(record) if record.status == RecordStatus::Pending => {
                record.status = to;
                record.accepted = accepted;
                true
            }
            _ => false,
        }
    }
}

#[async_trait]
impl PersistenceGateway for InMemoryGateway {
    async fn record_by_offer(&self, offer_id: &str) -> Result<Option<TradeRecord>> {
        Ok(self.record(offer_id))
    }

    async fn mark_record_declined(&self, offer_id: &str) -> Result<bool> {
        Ok(self.transition(offer_id, RecordStatus::Declined, false))
    }

    async fn mark_record_confirmed(&self, offer_id: &str) -> Result<bool> {
        Ok(self.transition(offer_id, RecordStatus::Confirm, true))
    }

    async fn insert_listing(&self, listing: &MarketplaceListing) -> Result<()> {
        self.listings
            .lock()
            .expect("listings lock")
            .push(listing.clone());
        Ok(())
    }

    async fn delist_item(&self, user_id: &str, asset_id: &str) -> Result<bool> {
        let mut listings = self.listings.lock().expect("listings lock");
        match listings
            .iter_mut()
            .find(|l| l.user_id == user_id && l.asset_id == asset_id && !l.deleted)
        {
            Some(listing) => {
                listing.deleted = true;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn reference_price(&self, market_hash_name: &str) -> Result<Option<Decimal>> {
        Ok(self
            .reference_prices
            .lock()
            .expect("price lock")
            .get(market_hash_name)
            .copied())
    }

    async fn live_price(&self, market_hash_name: &str) -> Result<Option<Decimal>> {
        Ok(self
            .live_prices
            .lock()
            .expect("price lock")
            .get(market_hash_name)
            .copied())
    }

    async fn append_activity(&self, entry: &ActivityEntry) -> Result<()> {
        self.activity.lock().expect("activity lock").push(entry.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::TradeType;
    use chrono::Utc;
    use uuid::Uuid;

    fn pending_record(offer_id: &str) -> TradeRecord {
        TradeRecord {
            id: Uuid::new_v4(),
            offer_id: Some(offer_id.to_string()),
            trade_type: TradeType::Deposit,
            user_id: "user-1".into(),
            items: Vec::new(),
            sell_price: None,
            commission: None,
            status: RecordStatus::Pending,
            accepted: false,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn status_moves_forward_only() {
        let gateway = InMemoryGateway::new();
        gateway.insert_record(pending_record("offer-1"));

        assert!(gateway.mark_record_confirmed("offer-1").await.unwrap());
        // A confirmed record cannot be declined or re-confirmed.
        assert!(!gateway.mark_record_declined("offer-1").await.unwrap());
        assert!(!gateway.mark_record_confirmed("offer-1").await.unwrap());

        let record = gateway.record("offer-1").expect("record");
        assert_eq!(record.status, RecordStatus::Confirm);
        assert!(record.accepted);
    }

    #[tokio::test]
    async fn declining_an_unknown_offer_is_a_no_op() {
        let gateway = InMemoryGateway::new();
        assert!(!gateway.mark_record_declined("missing").await.unwrap());
    }

    #[tokio::test]
    async fn delist_only_touches_live_rows() {
        let gateway = InMemoryGateway::new();
        let listing = MarketplaceListing {
            id: Uuid::new_v4(),
            user_id: "user-1".into(),
            owner_id: "user-1".into(),
            asset_id: "asset-1".into(),
            class_id: "c".into(),
            name: "Item".into(),
            market_hash_name: "Item".into(),
            sold: false,
            listing: true,
            price: Decimal::ZERO,
            sell_price: Decimal::ZERO,
            commission: Decimal::ZERO,
            icon_url: String::new(),
            kind: String::new(),
            tradable: false,
            bargain: false,
            tags: Vec::new(),
            descriptions: Vec::new(),
            wear_value: None,
            inspect_links: Vec::new(),
            agent_name: "bot".into(),
            agent_id: "bot-1".into(),
            stickers: Vec::new(),
            unique_points: None,
            deleted: false,
            created_at: Utc::now(),
        };
        gateway.push_listing(listing);

        assert!(gateway.delist_item("user-1", "asset-1").await.unwrap());
        // Already soft-deleted; a second pass matches nothing.
        assert!(!gateway.delist_item("user-1", "asset-1").await.unwrap());
        assert!(!gateway.delist_item("user-2", "asset-1").await.unwrap());
    }
}
